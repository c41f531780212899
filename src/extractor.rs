//! Assignment Extractor (spec §4.6): decodes a feasible solver state into the
//! canonical `(session → slot, room, teacher)` mapping consumed by the
//! Visualizer/Persistence adapters. Grounded on the teacher's post-solve
//! assignment collection loop in `solver.rs` (`solution.value(*var) > 0.9`).

use crate::entity_store::Instance;
use crate::model::entities::{Day, GlobalSlot, RoomIdx, SessionIdx, SlotOffset, TeacherIdx};
use crate::variables::Variables;
use good_lp::Solution;
use serde::Serialize;
use std::collections::HashMap;

/// A solved `(session, slot, room, teacher)` triple, the spec §6 output shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub session_id: String,
    pub day_index: Day,
    pub start_offset: SlotOffset,
    pub duration_slots: u32,
    pub room_id: String,
    pub teacher_id: String,
}

/// One entry in the per-slot occupancy table: which session, in which room,
/// taught by which teacher, is active at a given global slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occupant {
    pub session: SessionIdx,
    pub room: RoomIdx,
    pub teacher: TeacherIdx,
}

pub struct ExtractedSolution {
    pub assignments: Vec<Assignment>,
    pub occupancy: HashMap<GlobalSlot, Vec<Occupant>>,
}

/// Decodes a feasible solution: the solver's own thresholding convention
/// (`> 0.5`, matching the teacher's `> 0.9` for the same purpose but loosened
/// since this solver doesn't need a wide integrality margin) is applied once,
/// here, rather than scattered across callers.
pub fn extract(instance: &Instance, vars: &Variables, solution: &impl Solution) -> ExtractedSolution {
    let mut assignments = Vec::with_capacity(instance.sessions.len());
    let mut occupancy: HashMap<GlobalSlot, Vec<Occupant>> = HashMap::new();

    for (ci, session) in instance.sessions.iter().enumerate() {
        let si = SessionIdx(ci);

        let chosen_start = vars.starts_by_session[ci]
            .iter()
            .find(|&&(_, _, slot)| vars.start_var(si, slot).map(|v| solution.value(v) > 0.5).unwrap_or(false));

        let Some(&(day, offset, _)) = chosen_start else {
            continue;
        };

        let room = session
            .allowed_rooms
            .iter()
            .copied()
            .find(|&r| vars.room_var(si, r).map(|v| solution.value(v) > 0.5).unwrap_or(false));
        let teacher = session
            .allowed_teachers
            .iter()
            .copied()
            .find(|&p| vars.teach_var(si, p).map(|v| solution.value(v) > 0.5).unwrap_or(false));

        let (Some(room), Some(teacher)) = (room, teacher) else {
            continue;
        };

        assignments.push(Assignment {
            session_id: session.id.clone(),
            day_index: day,
            start_offset: offset,
            duration_slots: session.duration,
            room_id: instance.rooms[room.index()].id.clone(),
            teacher_id: instance.teachers[teacher.index()].id.clone(),
        });

        for covered_offset in offset..offset + session.duration {
            let t = instance.global_slot(day, covered_offset);
            occupancy.entry(t).or_default().push(Occupant { session: si, room, teacher });
        }
    }

    assignments.sort_by(|a, b| a.session_id.cmp(&b.session_id));
    ExtractedSolution { assignments, occupancy }
}
