//! Variable Builder (spec §4.3): the four decision-variable families plus
//! their exactly-one and start→occupancy linking constraints. Impossible
//! slots are pruned up front — an absent map entry means "implicitly zero",
//! the same convention the teacher's `is_assignment_possible` prefilter
//! uses for its single `x_crt` variable, generalized here to the four
//! separate families the spec requires.

use crate::entity_store::Instance;
use crate::model::entities::{Day, GlobalSlot, GroupIdx, RoomIdx, SessionIdx, SlotOffset, TeacherIdx};
use good_lp::{variable, Constraint, Expression, ProblemVariables, Variable};
use std::collections::HashMap;

pub struct Variables {
    pub start: HashMap<(SessionIdx, GlobalSlot), Variable>,
    pub occ: HashMap<(SessionIdx, GlobalSlot), Variable>,
    pub room: HashMap<(SessionIdx, RoomIdx), Variable>,
    pub teach: HashMap<(SessionIdx, TeacherIdx), Variable>,
    /// Every legal `(day, offset)` start per session, day-ordered, cached so
    /// the constraint compiler doesn't recompute it per family.
    pub starts_by_session: Vec<Vec<(Day, SlotOffset, GlobalSlot)>>,
}

impl Variables {
    pub fn start_var(&self, session: SessionIdx, slot: GlobalSlot) -> Option<Variable> {
        self.start.get(&(session, slot)).copied()
    }

    pub fn occ_var(&self, session: SessionIdx, slot: GlobalSlot) -> Option<Variable> {
        self.occ.get(&(session, slot)).copied()
    }

    pub fn room_var(&self, session: SessionIdx, room: RoomIdx) -> Option<Variable> {
        self.room.get(&(session, room)).copied()
    }

    pub fn teach_var(&self, session: SessionIdx, teacher: TeacherIdx) -> Option<Variable> {
        self.teach.get(&(session, teacher)).copied()
    }

    /// Sessions (and their covering start) active at global slot `t`.
    pub fn occupants_at(&self, session: SessionIdx, t: GlobalSlot) -> Option<Variable> {
        self.occ_var(session, t)
    }
}

/// Every legal start `(day, offset)` for a session of the given `duration`:
/// fits within the day (F9 implicit bound) and never spans a lunch offset
/// (F9). Mirrors `diagnostic::has_valid_start`'s enumeration exactly.
pub fn valid_starts(instance: &Instance, duration: u32) -> Vec<(Day, SlotOffset, GlobalSlot)> {
    let mut out = Vec::new();
    if duration == 0 || duration > instance.slots_per_day {
        return out;
    }
    for day in 0..instance.days {
        for offset in 0..=(instance.slots_per_day - duration) {
            let spans_lunch = (offset..offset + duration).any(|o| instance.lunch_window.contains(&o));
            if spans_lunch {
                continue;
            }
            out.push((day, offset, instance.global_slot(day, offset)));
        }
    }
    out
}

pub fn build(instance: &Instance, vars: &mut ProblemVariables) -> Variables {
    let mut start = HashMap::new();
    let mut room = HashMap::new();
    let mut teach = HashMap::new();
    let mut starts_by_session = Vec::with_capacity(instance.sessions.len());

    for (ci, session) in instance.sessions.iter().enumerate() {
        let si = SessionIdx(ci);
        let starts = valid_starts(instance, session.duration);
        for &(_, _, slot) in &starts {
            start.insert((si, slot), vars.add(variable().binary()));
        }
        starts_by_session.push(starts);

        for &r in &session.allowed_rooms {
            room.insert((si, r), vars.add(variable().binary()));
        }
        for &p in &session.allowed_teachers {
            teach.insert((si, p), vars.add(variable().binary()));
        }
    }

    let mut occ = HashMap::new();
    for (ci, session) in instance.sessions.iter().enumerate() {
        let si = SessionIdx(ci);
        for &(day, _offset, _slot) in &starts_by_session[ci] {
            for covered_offset in _offset.._offset + session.duration {
                let t = instance.global_slot(day, covered_offset);
                occ.entry((si, t)).or_insert_with(|| vars.add(variable().binary()));
            }
        }
    }

    Variables { start, occ, room, teach, starts_by_session }
}

/// Foundational linking constraints owned by the Variable Builder (spec
/// §4.3): exactly-one start/room/teacher, and start→occupancy linking. These
/// are always on — they are not part of the selectively-disableable F1..F11
/// family set, since without them the model has no meaning at all.
pub fn base_constraints(instance: &Instance, v: &Variables) -> Vec<Constraint> {
    use good_lp::constraint;
    let mut out = Vec::new();

    for (ci, session) in instance.sessions.iter().enumerate() {
        let si = SessionIdx(ci);

        let start_sum: Expression = v
            .starts_by_session[ci]
            .iter()
            .filter_map(|&(_, _, slot)| v.start_var(si, slot))
            .sum();
        out.push(constraint!(start_sum == 1));

        let room_sum: Expression = session.allowed_rooms.iter().filter_map(|&r| v.room_var(si, r)).sum();
        out.push(constraint!(room_sum == 1));

        let teach_sum: Expression = session.allowed_teachers.iter().filter_map(|&p| v.teach_var(si, p)).sum();
        out.push(constraint!(teach_sum == 1));

        for offset_t in 0..instance.slots_per_day {
            for day in 0..instance.days {
                let t = instance.global_slot(day, offset_t);
                let Some(occ_var) = v.occ_var(si, t) else { continue };
                let covering_sum: Expression = v
                    .starts_by_session[ci]
                    .iter()
                    .filter(|&&(d, o, _)| d == day && o <= offset_t && offset_t < o + session.duration)
                    .filter_map(|&(_, _, s)| v.start_var(si, s))
                    .sum();
                out.push(constraint!(occ_var == covering_sum));
            }
        }
    }

    out
}

/// Auxiliary boolean modeling `z = x AND y` as three linear constraints,
/// the standard MIP linearization of CP-SAT's `AddBoolAnd`/reification (spec
/// §4.5 "Solver backend note").
pub fn reify_and(z: Variable, x: Variable, y: Variable) -> [Constraint; 3] {
    use good_lp::constraint;
    [constraint!(z <= x), constraint!(z <= y), constraint!(z >= x + y - 1)]
}

/// `x => y`, i.e. `¬x ∨ y`, as a single linear constraint.
pub fn reify_implies(x: Variable, y: Variable) -> Constraint {
    use good_lp::constraint;
    constraint!(y >= x)
}

/// `¬x ∨ ¬y`, i.e. at most one of `x`, `y` holds.
pub fn reify_not_both(x: Variable, y: Variable) -> Constraint {
    use good_lp::constraint;
    constraint!(x + y <= 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::raw::{RawGroup, RawInput, RawSession, RawTeacher, SessionKind};
    use good_lp::ProblemVariables;
    use std::collections::{BTreeMap, BTreeSet};

    fn raw_instance(duration: i64, lunch: &[u32]) -> Instance {
        let raw = RawInput {
            week_id: "w1".into(),
            days: Some(1),
            slots_per_day: Some(8),
            lunch_window: Some(lunch.iter().copied().collect::<BTreeSet<_>>()),
            sessions: vec![RawSession {
                id: "s1".into(),
                kind: SessionKind::Cm,
                subject: "M".into(),
                duration_slots: duration,
                group_ids: vec!["G1".into()],
                allowed_teacher_ids: vec!["t1".into()],
                allowed_room_ids: None,
            }],
            rooms: BTreeMap::from([("R1".to_string(), 30)]),
            teachers: vec![RawTeacher { id: "t1".into(), display_name: "A".into() }],
            groups: vec![RawGroup { id: "G1".into(), name: "G1".into(), parent_id: None, student_count: 25 }],
            teacher_availability: vec![],
            room_availability: vec![],
            group_availability: vec![],
            session_obligations: vec![],
        };
        crate::entity_store::load(raw, &Config::default()).unwrap()
    }

    #[test]
    fn valid_starts_excludes_lunch_spanning_and_overflow() {
        let instance = raw_instance(3, &[4, 5]);
        let starts = valid_starts(&instance, 3);
        // day has 8 slots, duration 3: candidate offsets 0..=5, excluding any
        // that touch {4,5}: offsets 0,1,2 (covers up to 4 which is lunch for
        // offset>=2) -> 2,3,4,5 excluded, 0 and 1 remain? check explicitly:
        // offset 0 -> {0,1,2} ok; offset 1 -> {1,2,3} ok; offset 2 -> {2,3,4} bad;
        // offset 3 -> {3,4,5} bad; offset 4 -> {4,5,6} bad; offset 5 -> {5,6,7} bad.
        assert_eq!(starts.iter().map(|&(_, o, _)| o).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn occupancy_created_only_where_some_start_covers_it() {
        let instance = raw_instance(2, &[]);
        let mut pvars = ProblemVariables::new();
        let vars = build(&instance, &mut pvars);
        let si = SessionIdx(0);
        // slot 0 and 1 can be covered (start at 0 covers 0,1; start at ... etc)
        assert!(vars.occ_var(si, 0).is_some());
        // last slot (offset 7) can only be covered by a start at offset 6,
        // which is legal since duration 2 fits within 8 slots.
        assert!(vars.occ_var(si, 7).is_some());
    }

    #[test]
    fn base_constraints_include_one_exactly_one_per_session() {
        let instance = raw_instance(2, &[]);
        let mut pvars = ProblemVariables::new();
        let vars = build(&instance, &mut pvars);
        let constraints = base_constraints(&instance, &vars);
        assert!(constraints.len() >= 3);
    }
}
