//! Entity Store (spec §4.1): normalizes a `RawInput` into dense-indexed,
//! value-typed `Instance`. No mutation after load; safe to share by
//! reference across the rest of the pipeline. Grounded on
//! `original_source/data_provider_id.py`, which performs the equivalent
//! id→index normalization against the untyped source dicts.

use crate::config::Config;
use crate::error::DataError;
use crate::model::availability::AvailabilityTable;
use crate::model::entities::*;
use crate::model::raw::{AvailabilityPriority, RawAvailabilityWindow, RawInput};
use crate::model::{hierarchy, ordering};
use std::collections::{BTreeSet, HashMap};

pub struct Instance {
    pub week_id: String,
    pub days: u32,
    pub slots_per_day: u32,
    pub lunch_window: BTreeSet<SlotOffset>,
    /// Offsets not inside the lunch window, sorted ascending.
    pub usable_offsets: Vec<SlotOffset>,

    pub sessions: Vec<Session>,
    pub rooms: Vec<Room>,
    pub teachers: Vec<Teacher>,
    pub groups: Vec<Group>,

    pub ordering_rules: Vec<OrderingRule>,
    pub group_session_index: HashMap<GroupIdx, Vec<SessionIdx>>,
    pub hierarchy_edges: Vec<(GroupIdx, GroupIdx)>,

    pub teacher_availability: AvailabilityTable<TeacherIdx>,
    pub room_availability: AvailabilityTable<RoomIdx>,
    pub group_availability: AvailabilityTable<GroupIdx>,

    /// Medium-priority windows kept separately, since they feed the
    /// objective rather than a hard exclusion (spec §4.4).
    pub teacher_medium: AvailabilityTable<TeacherIdx>,
    pub room_medium: AvailabilityTable<RoomIdx>,
    pub group_medium: AvailabilityTable<GroupIdx>,

    pub empty_day_means_unavailable: bool,
}

impl Instance {
    pub fn total_slots(&self) -> u32 {
        self.days * self.slots_per_day
    }

    pub fn global_slot(&self, day: Day, offset: SlotOffset) -> GlobalSlot {
        global_slot(day, offset, self.slots_per_day)
    }

    pub fn day_offset(&self, slot: GlobalSlot) -> (Day, SlotOffset) {
        day_offset(slot, self.slots_per_day)
    }

    pub fn usable_slots_total(&self) -> u32 {
        self.usable_offsets.len() as u32 * self.days
    }

    pub fn session_idx(&self, id: &str) -> Option<SessionIdx> {
        self.sessions.iter().position(|s| s.id == id).map(SessionIdx)
    }
}

/// Loads and normalizes a `RawInput` into an `Instance`, applying `config`
/// defaults for any grid dimension the adapter left unspecified.
pub fn load(raw: RawInput, config: &Config) -> Result<Instance, DataError> {
    let days = raw.days.unwrap_or(config.days);
    let slots_per_day = raw.slots_per_day.unwrap_or(config.slots_per_day);
    let lunch_window: BTreeSet<SlotOffset> = raw
        .lunch_window
        .clone()
        .unwrap_or_else(|| config.lunch_window.clone());

    if days == 0 || slots_per_day == 0 {
        return Err(DataError::InvalidGridDimensions(days as i64, slots_per_day as i64));
    }
    for &offset in &lunch_window {
        if offset >= slots_per_day {
            return Err(DataError::LunchWindowOutOfRange(offset as i64));
        }
    }

    let room_ids: Vec<&String> = raw.rooms.keys().collect();
    let room_index: HashMap<&str, RoomIdx> = room_ids
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), RoomIdx(i)))
        .collect();
    let rooms: Vec<Room> = room_ids
        .iter()
        .map(|id| Room {
            id: (*id).clone(),
            capacity: raw.rooms[*id],
        })
        .collect();
    for room in &rooms {
        if room.capacity <= 0 {
            return Err(DataError::NonPositiveCapacity(room.id.clone(), room.capacity));
        }
    }

    let teacher_index: HashMap<&str, TeacherIdx> = raw
        .teachers
        .iter()
        .enumerate()
        .map(|(i, t)| (t.id.as_str(), TeacherIdx(i)))
        .collect();
    let teachers: Vec<Teacher> = raw
        .teachers
        .iter()
        .map(|t| Teacher {
            id: t.id.clone(),
            display_name: t.display_name.clone(),
        })
        .collect();

    // Groups must be resolved in two passes since `parent_id` may refer to a
    // group defined later in the source list.
    let group_index: HashMap<&str, GroupIdx> = raw
        .groups
        .iter()
        .enumerate()
        .map(|(i, g)| (g.id.as_str(), GroupIdx(i)))
        .collect();
    let mut groups = Vec::with_capacity(raw.groups.len());
    for g in &raw.groups {
        let parent = match &g.parent_id {
            None => None,
            Some(pid) => Some(*group_index.get(pid.as_str()).ok_or_else(|| DataError::DanglingReference {
                kind: "group",
                id: pid.clone(),
                referrer: g.id.clone(),
            })?),
        };
        groups.push(Group {
            id: g.id.clone(),
            name: g.name.clone(),
            parent,
            student_count: g.student_count,
        });
    }

    let mut sessions = Vec::with_capacity(raw.sessions.len());
    for s in &raw.sessions {
        if s.duration_slots <= 0 {
            return Err(DataError::NonPositiveDuration(s.id.clone(), s.duration_slots));
        }
        if s.group_ids.is_empty() {
            return Err(DataError::MissingField(s.id.clone(), "group_ids"));
        }
        if s.allowed_teacher_ids.is_empty() {
            return Err(DataError::NoLegalTeacher(s.id.clone()));
        }

        let session_groups: Vec<GroupIdx> = s
            .group_ids
            .iter()
            .map(|gid| {
                group_index.get(gid.as_str()).copied().ok_or_else(|| DataError::DanglingReference {
                    kind: "group",
                    id: gid.clone(),
                    referrer: s.id.clone(),
                })
            })
            .collect::<Result<_, _>>()?;

        let allowed_teachers: Vec<TeacherIdx> = s
            .allowed_teacher_ids
            .iter()
            .map(|tid| {
                teacher_index.get(tid.as_str()).copied().ok_or_else(|| DataError::DanglingReference {
                    kind: "teacher",
                    id: tid.clone(),
                    referrer: s.id.clone(),
                })
            })
            .collect::<Result<_, _>>()?;

        // Capacity is not a hard filter here: a room too small for the group
        // is still an allowed (merely discouraged) assignment, penalized by
        // F11 in the constraint compiler. Whether *any* room is ever
        // adequate is the Feasibility Diagnostic's concern (spec §4.2 check
        // 2), not a load-time data error.
        let allowed_rooms: Vec<RoomIdx> = match &s.allowed_room_ids {
            None => (0..rooms.len()).map(RoomIdx).collect(),
            Some(explicit) => explicit
                .iter()
                .map(|rid| {
                    room_index.get(rid.as_str()).copied().ok_or_else(|| DataError::DanglingReference {
                        kind: "room",
                        id: rid.clone(),
                        referrer: s.id.clone(),
                    })
                })
                .collect::<Result<_, _>>()?,
        };
        if allowed_rooms.is_empty() {
            return Err(DataError::NoAdequateRoom(s.id.clone()));
        }

        let obligations: Vec<(Day, SlotOffset)> = raw
            .session_obligations
            .iter()
            .filter(|o| o.session_id == s.id)
            .map(|o| (o.day, o.start_offset))
            .collect();

        sessions.push(Session {
            id: s.id.clone(),
            kind: s.kind,
            subject: s.subject.clone(),
            duration: s.duration_slots as u32,
            groups: session_groups,
            allowed_teachers,
            allowed_rooms,
            obligations,
        });
    }

    let ordering_rules = ordering::derive_ordering_rules(&sessions);
    let group_session_index = hierarchy::group_session_index(&sessions, &groups);
    let hierarchy_edges = hierarchy::hierarchy_edges(&groups);

    let mut teacher_availability = AvailabilityTable::new();
    let mut teacher_medium = AvailabilityTable::new();
    fill_table(
        &raw.teacher_availability,
        &teacher_index,
        &mut teacher_availability,
        &mut teacher_medium,
        "teacher",
    )?;

    let mut room_availability = AvailabilityTable::new();
    let mut room_medium = AvailabilityTable::new();
    fill_table(&raw.room_availability, &room_index, &mut room_availability, &mut room_medium, "room")?;

    let mut group_availability = AvailabilityTable::new();
    let mut group_medium = AvailabilityTable::new();
    fill_table(&raw.group_availability, &group_index, &mut group_availability, &mut group_medium, "group")?;

    let usable_offsets: Vec<SlotOffset> = (0..slots_per_day).filter(|o| !lunch_window.contains(o)).collect();

    Ok(Instance {
        week_id: raw.week_id,
        days,
        slots_per_day,
        lunch_window,
        usable_offsets,
        sessions,
        rooms,
        teachers,
        groups,
        ordering_rules,
        group_session_index,
        hierarchy_edges,
        teacher_availability,
        room_availability,
        group_availability,
        teacher_medium,
        room_medium,
        group_medium,
        empty_day_means_unavailable: config.empty_day_means_unavailable,
    })
}

fn fill_table<K: Eq + std::hash::Hash + Copy>(
    windows: &[RawAvailabilityWindow],
    index: &HashMap<&str, K>,
    hard: &mut AvailabilityTable<K>,
    medium: &mut AvailabilityTable<K>,
    kind: &'static str,
) -> Result<(), DataError> {
    for w in windows {
        let owner = *index.get(w.owner_id.as_str()).ok_or_else(|| DataError::DanglingReference {
            kind,
            id: w.owner_id.clone(),
            referrer: "availability window".to_string(),
        })?;
        let interval = Interval::new(w.start_offset, w.end_offset);
        let table = match w.priority {
            AvailabilityPriority::Hard => &mut *hard,
            AvailabilityPriority::Medium => &mut *medium,
            // Soft windows are parsed (and would round-trip through
            // serialization) but deliberately drive no constraint or
            // objective term yet (DESIGN.md Open Question 4).
            AvailabilityPriority::Soft => continue,
        };
        match &w.week_id {
            None => table.add_permanent(owner, w.day, interval),
            Some(week) => table.add_weekly(owner, w.day, week, interval),
        }
    }
    Ok(())
}
