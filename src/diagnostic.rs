//! Feasibility Diagnostic (spec §4.2): fast static checks that localize an
//! infeasibility cause before any solver invocation. A 1:1 translation of
//! `original_source/diagnose.py`'s `DiagnosticEmploiDuTemps` three checks,
//! expressed over the dense `Instance` instead of untyped dicts.

use crate::entity_store::Instance;
use crate::model::entities::SessionIdx;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoValidStart {
    pub session: SessionIdx,
    pub session_id: String,
    pub duration: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoAdequateRoom {
    pub session: SessionIdx,
    pub session_id: String,
    pub required_size: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupOverbooked {
    pub group_id: String,
    pub required_slots: u32,
    pub usable_slots: u32,
}

#[derive(Debug, Clone, Default)]
pub struct DiagnosticReport {
    pub no_valid_start: Vec<NoValidStart>,
    pub no_adequate_room: Vec<NoAdequateRoom>,
    pub group_overbooked: Vec<GroupOverbooked>,
}

impl DiagnosticReport {
    pub fn is_clean(&self) -> bool {
        self.no_valid_start.is_empty() && self.no_adequate_room.is_empty() && self.group_overbooked.is_empty()
    }

    pub fn issue_count(&self) -> usize {
        self.no_valid_start.len() + self.no_adequate_room.len() + self.group_overbooked.len()
    }
}

/// Whether `session` has at least one legal `(day, offset)` start: fits
/// within the day and never covers a lunch-window offset.
fn has_valid_start(instance: &Instance, duration: u32) -> bool {
    if duration > instance.slots_per_day {
        return false;
    }
    (0..=instance.slots_per_day - duration).any(|offset| {
        (offset..offset + duration).all(|o| !instance.lunch_window.contains(&o))
    })
}

pub fn run(instance: &Instance) -> DiagnosticReport {
    let mut report = DiagnosticReport::default();

    for (i, session) in instance.sessions.iter().enumerate() {
        if !has_valid_start(instance, session.duration) {
            report.no_valid_start.push(NoValidStart {
                session: SessionIdx(i),
                session_id: session.id.clone(),
                duration: session.duration,
            });
        }
        let required_size = session.group_size(&instance.groups);
        if !instance.rooms.iter().any(|r| r.capacity >= required_size) {
            report.no_adequate_room.push(NoAdequateRoom {
                session: SessionIdx(i),
                session_id: session.id.clone(),
                required_size,
            });
        }
    }

    let usable = instance.usable_slots_total();
    for (gi, group) in instance.groups.iter().enumerate() {
        let group_idx = crate::model::entities::GroupIdx(gi);
        let Some(session_ids) = instance.group_session_index.get(&group_idx) else {
            continue;
        };
        let required: u32 = session_ids.iter().map(|s| instance.sessions[s.index()].duration).sum();
        if required > usable {
            report.group_overbooked.push(GroupOverbooked {
                group_id: group.id.clone(),
                required_slots: required,
                usable_slots: usable,
            });
        }
    }

    report
}
