//! Constraint Compiler (spec §4.4): emits the eleven hard families F1..F11
//! plus the soft-penalty families (capacity, late-ending, medium-priority
//! availability). Every hard family is collected under its own name so the
//! Solver Driver can selectively disable it during infeasibility diagnosis
//! (spec §4.5 "Infeasibility diagnostic mode").
//!
//! F1/F2 need a reified AND of an occupancy and a room/teacher boolean
//! (`variables::reify_and`); F3/F4 sum occupancy directly since there is no
//! second boolean to conjoin; F5..F8/F10 are single linear constraints per
//! violating pair. Grounded on the teacher's room/instructor overlap loops
//! (F1/F2 direct ancestors) and on
//! `original_source/bouton/constraint_integration.py` for the availability
//! families F5/F6/F7.

use crate::entity_store::Instance;
use crate::model::entities::{GlobalSlot, GroupIdx, RoomIdx, SessionIdx, TeacherIdx};
use crate::variables::{reify_and, reify_implies, reify_not_both, Variables};
use good_lp::{constraint, Constraint, Expression, ProblemVariables, Variable};
use std::collections::HashMap;

/// Every hard family name, in the order the spec lists them. F9 is implicit
/// in variable construction and has no entry here.
pub const HARD_FAMILIES: &[&str] = &["F1", "F2", "F3", "F4", "F5", "F6", "F7", "F8", "F10"];

#[derive(Default)]
pub struct CompiledConstraints {
    /// Hard constraints grouped by family name, in emission order.
    pub families: Vec<(&'static str, Vec<Constraint>)>,
    /// F11: one penalty variable per (session, room) pair whose capacity is
    /// inadequate for the session's group size; `1` iff that room is chosen.
    pub capacity_penalty: HashMap<(SessionIdx, RoomIdx), Variable>,
    /// Late-ending soft family: one penalty variable per (session, start)
    /// whose end offset exceeds `late_threshold_offset`.
    pub late_penalty: HashMap<(SessionIdx, GlobalSlot), Variable>,
    /// Medium-priority availability soft family (spec §4.4, §9 redesign
    /// guidance): one penalty variable per (session, start) that violates a
    /// Medium-priority window for any of the session's owners.
    pub medium_penalty: HashMap<(SessionIdx, GlobalSlot), Variable>,
    /// `start => penalty` implications linking the soft-penalty variables
    /// above to their triggering start. Always on: these aren't a hard
    /// family a diagnostic run would ever want to disable, they just say
    /// what the penalty variables mean.
    pub linking: Vec<Constraint>,
}

impl CompiledConstraints {
    /// All hard constraints from every *enabled* family, plus the always-on
    /// penalty-linking constraints, flattened. Used to assemble the model;
    /// `disabled` names are skipped entirely (spec §4.5 infeasibility
    /// diagnostic mode).
    pub fn enabled_constraints(&self, disabled: &[&str]) -> Vec<Constraint> {
        self.families
            .iter()
            .filter(|(name, _)| !disabled.contains(name))
            .flat_map(|(_, cs)| cs.iter().cloned())
            .chain(self.linking.iter().cloned())
            .collect()
    }
}

pub fn build(instance: &Instance, vars: &Variables, pvars: &mut ProblemVariables, late_threshold_offset: u32) -> CompiledConstraints {
    let mut out = CompiledConstraints::default();

    out.families.push(("F1", f1_room_exclusion(instance, vars, pvars)));
    out.families.push(("F2", f2_teacher_exclusion(instance, vars, pvars)));
    out.families.push(("F3", f3_same_group_exclusion(instance, vars)));
    out.families.push(("F4", f4_hierarchical_exclusion(instance, vars)));
    out.families.push(("F5", f5_teacher_availability(instance, vars)));
    out.families.push(("F6", f6_room_availability(instance, vars)));
    out.families.push(("F7", f7_group_availability(instance, vars)));
    out.families.push(("F8", f8_session_obligations(instance, vars)));
    out.families.push(("F10", f10_pedagogical_ordering(instance, vars)));

    out.capacity_penalty = f11_capacity_penalty(instance, vars);

    let (late_penalty, late_linking) = late_ending_penalty(instance, vars, pvars, late_threshold_offset);
    out.late_penalty = late_penalty;
    out.linking.extend(late_linking);

    let (medium_penalty, medium_linking) = medium_availability_penalty(instance, vars, pvars);
    out.medium_penalty = medium_penalty;
    out.linking.extend(medium_linking);

    out
}

/// F1 — Room exclusion: `Σ_c (occ[c,t] ∧ room[c,r]) ≤ 1` for every `(t, r)`.
fn f1_room_exclusion(instance: &Instance, v: &Variables, pvars: &mut ProblemVariables) -> Vec<Constraint> {
    let mut out = Vec::new();
    for r in 0..instance.rooms.len() {
        let r = RoomIdx(r);
        for t in 0..instance.total_slots() {
            let mut sum = Expression::from(0.0);
            let mut any = false;
            for (ci, session) in instance.sessions.iter().enumerate() {
                if !session.allowed_rooms.contains(&r) {
                    continue;
                }
                let si = SessionIdx(ci);
                let (Some(occ), Some(room)) = (v.occ_var(si, t), v.room_var(si, r)) else {
                    continue;
                };
                let z = pvars.add(good_lp::variable().binary());
                out.extend(reify_and(z, occ, room));
                sum = sum + z;
                any = true;
            }
            if any {
                out.push(constraint!(sum <= 1));
            }
        }
    }
    out
}

/// F2 — Teacher exclusion: `Σ_c (occ[c,t] ∧ teach[c,p]) ≤ 1` for every `(t, p)`.
fn f2_teacher_exclusion(instance: &Instance, v: &Variables, pvars: &mut ProblemVariables) -> Vec<Constraint> {
    let mut out = Vec::new();
    for p in 0..instance.teachers.len() {
        let p = TeacherIdx(p);
        for t in 0..instance.total_slots() {
            let mut sum = Expression::from(0.0);
            let mut any = false;
            for (ci, session) in instance.sessions.iter().enumerate() {
                if !session.allowed_teachers.contains(&p) {
                    continue;
                }
                let si = SessionIdx(ci);
                let (Some(occ), Some(teach)) = (v.occ_var(si, t), v.teach_var(si, p)) else {
                    continue;
                };
                let z = pvars.add(good_lp::variable().binary());
                out.extend(reify_and(z, occ, teach));
                sum = sum + z;
                any = true;
            }
            if any {
                out.push(constraint!(sum <= 1));
            }
        }
    }
    out
}

/// F3 — Same-group exclusion: `Σ_{c: g ∈ affected(c)} occ[c,t] ≤ 1` for every
/// group `g` and slot `t`. No reification needed: `occ` already carries the
/// session's own presence, so summing it directly over the sessions
/// concerning `g` is the constraint.
fn f3_same_group_exclusion(instance: &Instance, v: &Variables) -> Vec<Constraint> {
    let mut out = Vec::new();
    for g in 0..instance.groups.len() {
        let g = GroupIdx(g);
        let concerning: Vec<SessionIdx> = instance
            .sessions
            .iter()
            .enumerate()
            .filter(|(_, s)| s.groups.contains(&g))
            .map(|(i, _)| SessionIdx(i))
            .collect();
        if concerning.is_empty() {
            continue;
        }
        for t in 0..instance.total_slots() {
            let sum: Expression = concerning.iter().filter_map(|&c| v.occ_var(c, t)).sum();
            out.push(constraint!(sum <= 1));
        }
    }
    out
}

/// F4 — Hierarchical group exclusion: for each (sub, parent) edge and slot
/// `t`, at most one session across the union of sessions directly
/// concerning either group may be active. Sessions concerning both (e.g. a
/// session attached to both ids explicitly) are only counted once, which the
/// `HashSet`-style union below already guarantees.
fn f4_hierarchical_exclusion(instance: &Instance, v: &Variables) -> Vec<Constraint> {
    let mut out = Vec::new();
    for &(sub, parent) in &instance.hierarchy_edges {
        let union: Vec<SessionIdx> = instance
            .sessions
            .iter()
            .enumerate()
            .filter(|(_, s)| s.groups.contains(&sub) || s.groups.contains(&parent))
            .map(|(i, _)| SessionIdx(i))
            .collect();
        if union.is_empty() {
            continue;
        }
        for t in 0..instance.total_slots() {
            let sum: Expression = union.iter().filter_map(|&c| v.occ_var(c, t)).sum();
            out.push(constraint!(sum <= 1));
        }
    }
    out
}

/// F5 — Teacher availability: a `(start, teacher)` pair is forbidden when
/// the teacher has no available interval fully covering the session's span
/// on that start's day.
fn f5_teacher_availability(instance: &Instance, v: &Variables) -> Vec<Constraint> {
    let mut out = Vec::new();
    for (ci, session) in instance.sessions.iter().enumerate() {
        let si = SessionIdx(ci);
        for &(day, offset, slot) in &v.starts_by_session[ci] {
            let Some(start) = v.start_var(si, slot) else { continue };
            for &p in &session.allowed_teachers {
                let covered = instance.teacher_availability.covers_span(
                    p,
                    day,
                    &instance.week_id,
                    offset,
                    offset + session.duration,
                    instance.empty_day_means_unavailable,
                );
                if covered {
                    continue;
                }
                let Some(teach) = v.teach_var(si, p) else { continue };
                out.push(reify_not_both(start, teach));
            }
        }
    }
    out
}

/// F6 — Room availability: analogous to F5 on `room[c, r]`.
fn f6_room_availability(instance: &Instance, v: &Variables) -> Vec<Constraint> {
    let mut out = Vec::new();
    for (ci, session) in instance.sessions.iter().enumerate() {
        let si = SessionIdx(ci);
        for &(day, offset, slot) in &v.starts_by_session[ci] {
            let Some(start) = v.start_var(si, slot) else { continue };
            for &r in &session.allowed_rooms {
                let covered = instance.room_availability.covers_span(
                    r,
                    day,
                    &instance.week_id,
                    offset,
                    offset + session.duration,
                    instance.empty_day_means_unavailable,
                );
                if covered {
                    continue;
                }
                let Some(room) = v.room_var(si, r) else { continue };
                out.push(reify_not_both(start, room));
            }
        }
    }
    out
}

/// F7 — Group availability: a start is forbidden outright (not just paired
/// with a particular teacher/room) when any group concerned by the session
/// is unavailable across its full span.
fn f7_group_availability(instance: &Instance, v: &Variables) -> Vec<Constraint> {
    let mut out = Vec::new();
    for (ci, session) in instance.sessions.iter().enumerate() {
        let si = SessionIdx(ci);
        for &(day, offset, slot) in &v.starts_by_session[ci] {
            let Some(start) = v.start_var(si, slot) else { continue };
            let blocked = session.groups.iter().any(|&g| {
                !instance.group_availability.covers_span(
                    g,
                    day,
                    &instance.week_id,
                    offset,
                    offset + session.duration,
                    instance.empty_day_means_unavailable,
                )
            });
            if blocked {
                out.push(constraint!(start <= 0));
            }
        }
    }
    out
}

/// F8 — Session-slot obligations: every start not matching a listed
/// obligation is fixed to zero.
fn f8_session_obligations(instance: &Instance, v: &Variables) -> Vec<Constraint> {
    let mut out = Vec::new();
    for (ci, session) in instance.sessions.iter().enumerate() {
        if session.obligations.is_empty() {
            continue;
        }
        let si = SessionIdx(ci);
        for &(day, offset, slot) in &v.starts_by_session[ci] {
            if session.obligations.contains(&(day, offset)) {
                continue;
            }
            if let Some(start) = v.start_var(si, slot) {
                out.push(constraint!(start <= 0));
            }
        }
    }
    out
}

/// F10 — Pedagogical ordering: `end(before) ≤ start(after)` on the global
/// slot axis, for every derived `OrderingRule`.
fn f10_pedagogical_ordering(instance: &Instance, v: &Variables) -> Vec<Constraint> {
    let mut out = Vec::new();
    for rule in &instance.ordering_rules {
        let before = rule.before;
        let after = rule.after;
        for &(_, _, s1) in &v.starts_by_session[before.index()] {
            let Some(before_var) = v.start_var(before, s1) else { continue };
            for &(_, _, s2) in &v.starts_by_session[after.index()] {
                if s1 < s2 {
                    continue;
                }
                let Some(after_var) = v.start_var(after, s2) else { continue };
                out.push(reify_not_both(before_var, after_var));
            }
        }
    }
    out
}

/// F11 — Capacity (soft): a penalty variable mirroring `room[c, r]` for
/// every `(session, room)` pair whose room capacity is too small for the
/// session's group size.
fn f11_capacity_penalty(instance: &Instance, v: &Variables) -> HashMap<(SessionIdx, RoomIdx), Variable> {
    let mut out = HashMap::new();
    for (ci, session) in instance.sessions.iter().enumerate() {
        let si = SessionIdx(ci);
        let required = session.group_size(&instance.groups);
        for &r in &session.allowed_rooms {
            if instance.rooms[r.index()].capacity >= required {
                continue;
            }
            if let Some(room) = v.room_var(si, r) {
                out.insert((si, r), room);
            }
        }
    }
    out
}

/// Late-ending soft family: `start[c,s] ⇒ p_late[c,s]` whenever the start's
/// end offset exceeds `late_threshold_offset`.
fn late_ending_penalty(
    instance: &Instance,
    v: &Variables,
    pvars: &mut ProblemVariables,
    late_threshold_offset: u32,
) -> (HashMap<(SessionIdx, GlobalSlot), Variable>, Vec<Constraint>) {
    let mut out = HashMap::new();
    let mut linking = Vec::new();
    for (ci, session) in instance.sessions.iter().enumerate() {
        let si = SessionIdx(ci);
        for &(_, offset, slot) in &v.starts_by_session[ci] {
            if offset + session.duration <= late_threshold_offset {
                continue;
            }
            let Some(start) = v.start_var(si, slot) else { continue };
            let penalty = pvars.add(good_lp::variable().binary());
            linking.push(reify_implies(start, penalty));
            out.insert((si, slot), penalty);
        }
    }
    (out, linking)
}

/// Medium-priority availability soft family (spec §4.4): a penalty per
/// `(session, start)` that violates a Medium window for any owner the
/// session touches (any assigned teacher, any allowed room, or any of its
/// groups). Unlike F5/F6/F7, this never excludes a start outright — it only
/// ever feeds the objective.
fn medium_availability_penalty(
    instance: &Instance,
    v: &Variables,
    pvars: &mut ProblemVariables,
) -> (HashMap<(SessionIdx, GlobalSlot), Variable>, Vec<Constraint>) {
    let mut out = HashMap::new();
    let mut linking = Vec::new();
    for (ci, session) in instance.sessions.iter().enumerate() {
        let si = SessionIdx(ci);
        for &(day, offset, slot) in &v.starts_by_session[ci] {
            let hi = offset + session.duration;
            let group_violates = session.groups.iter().any(|&g| {
                !instance.group_medium.covers_span(g, day, &instance.week_id, offset, hi, false)
            });
            let teacher_violates = session.allowed_teachers.iter().any(|&p| {
                !instance.teacher_medium.covers_span(p, day, &instance.week_id, offset, hi, false)
            });
            let room_violates = session.allowed_rooms.iter().any(|&r| {
                !instance.room_medium.covers_span(r, day, &instance.week_id, offset, hi, false)
            });
            if !group_violates && !teacher_violates && !room_violates {
                continue;
            }
            let Some(start) = v.start_var(si, slot) else { continue };
            let penalty = pvars.add(good_lp::variable().binary());
            linking.push(reify_implies(start, penalty));
            out.insert((si, slot), penalty);
        }
    }
    (out, linking)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::raw::{
        AvailabilityPriority, RawAvailabilityWindow, RawGroup, RawInput, RawSession, RawTeacher, SessionKind,
    };
    use std::collections::BTreeMap;

    fn two_session_instance() -> Instance {
        let raw = RawInput {
            week_id: "w1".into(),
            days: Some(1),
            slots_per_day: Some(8),
            lunch_window: Some([3, 4].into_iter().collect()),
            sessions: vec![
                RawSession {
                    id: "s1".into(),
                    kind: SessionKind::Cm,
                    subject: "M".into(),
                    duration_slots: 2,
                    group_ids: vec!["G1".into()],
                    allowed_teacher_ids: vec!["t1".into()],
                    allowed_room_ids: None,
                },
                RawSession {
                    id: "s2".into(),
                    kind: SessionKind::Cm,
                    subject: "P".into(),
                    duration_slots: 2,
                    group_ids: vec!["G1".into()],
                    allowed_teacher_ids: vec!["t1".into()],
                    allowed_room_ids: None,
                },
            ],
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
    fn f1_and_f2_produce_one_constraint_per_occupied_slot() {
        let instance = two_session_instance();
        let mut pvars = ProblemVariables::new();
        let vars = crate::variables::build(&instance, &mut pvars);
        let compiled = build(&instance, &vars, &mut pvars, 20);
        let f1 = compiled.families.iter().find(|(n, _)| *n == "F1").unwrap();
        let f2 = compiled.families.iter().find(|(n, _)| *n == "F2").unwrap();
        assert!(!f1.1.is_empty());
        assert!(!f2.1.is_empty());
    }

    #[test]
    fn f8_obligation_restricts_to_single_start() {
        let raw = RawInput {
            week_id: "w1".into(),
            days: Some(2),
            slots_per_day: Some(8),
            lunch_window: Some([3, 4].into_iter().collect()),
            sessions: vec![RawSession {
                id: "s1".into(),
                kind: SessionKind::Exam,
                subject: "M".into(),
                duration_slots: 2,
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
            session_obligations: vec![crate::model::raw::RawObligation {
                session_id: "s1".into(),
                day: 1,
                start_offset: 6,
            }],
        };
        let instance = crate::entity_store::load(raw, &Config::default()).unwrap();
        let mut pvars = ProblemVariables::new();
        let vars = crate::variables::build(&instance, &mut pvars);
        let compiled = build(&instance, &vars, &mut pvars, 20);
        let f8 = &compiled.families.iter().find(|(n, _)| *n == "F8").unwrap().1;
        // Every legal start except (day=1, offset=6) should be fixed to 0:
        // total starts per session minus the one surviving obligation.
        let total_starts = vars.starts_by_session[0].len();
        assert_eq!(f8.len(), total_starts - 1);
    }

    #[test]
    fn f10_orders_cm_before_td_same_subject() {
        let raw = RawInput {
            week_id: "w1".into(),
            days: Some(1),
            slots_per_day: Some(10),
            lunch_window: Some([4, 5].into_iter().collect()),
            sessions: vec![
                RawSession {
                    id: "cm".into(),
                    kind: SessionKind::Cm,
                    subject: "M".into(),
                    duration_slots: 2,
                    group_ids: vec!["G1".into()],
                    allowed_teacher_ids: vec!["t1".into()],
                    allowed_room_ids: None,
                },
                RawSession {
                    id: "td".into(),
                    kind: SessionKind::Td,
                    subject: "M".into(),
                    duration_slots: 2,
                    group_ids: vec!["G1".into()],
                    allowed_teacher_ids: vec!["t1".into()],
                    allowed_room_ids: None,
                },
            ],
            rooms: BTreeMap::from([("R1".to_string(), 30)]),
            teachers: vec![RawTeacher { id: "t1".into(), display_name: "A".into() }],
            groups: vec![RawGroup { id: "G1".into(), name: "G1".into(), parent_id: None, student_count: 25 }],
            teacher_availability: vec![],
            room_availability: vec![],
            group_availability: vec![],
            session_obligations: vec![],
        };
        let instance = crate::entity_store::load(raw, &Config::default()).unwrap();
        let mut pvars = ProblemVariables::new();
        let vars = crate::variables::build(&instance, &mut pvars);
        let compiled = build(&instance, &vars, &mut pvars, 20);
        let f10 = &compiled.families.iter().find(|(n, _)| *n == "F10").unwrap().1;
        assert!(!f10.is_empty());
    }

    #[test]
    fn f11_capacity_penalty_uses_the_summed_group_size_not_the_max() {
        // Two 25-student groups attend the same session: required size is 50
        // (the sum), so a 40-seat room must be penalized even though it
        // comfortably seats either group alone (the max).
        let raw = RawInput {
            week_id: "w1".into(),
            days: Some(1),
            slots_per_day: Some(4),
            lunch_window: Some(Default::default()),
            sessions: vec![RawSession {
                id: "s1".into(),
                kind: SessionKind::Cm,
                subject: "M".into(),
                duration_slots: 2,
                group_ids: vec!["G1".into(), "G2".into()],
                allowed_teacher_ids: vec!["t1".into()],
                allowed_room_ids: None,
            }],
            rooms: BTreeMap::from([("R1".to_string(), 40)]),
            teachers: vec![RawTeacher { id: "t1".into(), display_name: "A".into() }],
            groups: vec![
                RawGroup { id: "G1".into(), name: "G1".into(), parent_id: None, student_count: 25 },
                RawGroup { id: "G2".into(), name: "G2".into(), parent_id: None, student_count: 25 },
            ],
            teacher_availability: vec![],
            room_availability: vec![],
            group_availability: vec![],
            session_obligations: vec![],
        };
        let instance = crate::entity_store::load(raw, &Config::default()).unwrap();
        let mut pvars = ProblemVariables::new();
        let vars = crate::variables::build(&instance, &mut pvars);
        let compiled = build(&instance, &vars, &mut pvars, 20);
        assert_eq!(compiled.capacity_penalty.len(), 1);
        assert!(compiled.capacity_penalty.contains_key(&(SessionIdx(0), RoomIdx(0))));
    }

    #[test]
    fn late_ending_penalty_variables_are_linked_not_free() {
        let instance = two_session_instance();
        let mut pvars = ProblemVariables::new();
        let vars = crate::variables::build(&instance, &mut pvars);
        // Threshold of 0 makes every start "late", so every session contributes
        // at least one penalty variable, each backed by a linking constraint.
        let compiled = build(&instance, &vars, &mut pvars, 0);
        assert!(!compiled.late_penalty.is_empty());
        assert!(compiled.linking.len() >= compiled.late_penalty.len());
    }

    #[test]
    fn disabling_a_family_removes_its_constraints() {
        let instance = two_session_instance();
        let mut pvars = ProblemVariables::new();
        let vars = crate::variables::build(&instance, &mut pvars);
        let compiled = build(&instance, &vars, &mut pvars, 20);
        let with_f1 = compiled.enabled_constraints(&[]).len();
        let without_f1 = compiled.enabled_constraints(&["F1"]).len();
        assert!(without_f1 < with_f1);
    }
}
