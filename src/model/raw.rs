//! The `RawInput` wire structure: the external Data Adapter's contract (spec §6).
//! Ingestion from a database is out of scope; this module only defines the
//! shape the adapter is expected to hand us, plus the typed normalization of
//! the source's string-encoded identifiers into explicit record fields (see
//! "String-encoded session identifiers" in SPEC_FULL §9).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Pedagogical session type; carries the CM ≺ TD ≺ TP ordering discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionKind {
    Cm,
    Td,
    Tp,
    Sae,
    Exam,
    Other,
}

/// Three-level availability priority (spec §9 redesign guidance): only Hard
/// is emitted as a hard exclusion; Medium is routed to the objective at 10x
/// the Soft weight; Soft currently contributes no term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityPriority {
    Hard,
    Medium,
    Soft,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSession {
    pub id: String,
    pub kind: SessionKind,
    pub subject: String,
    pub duration_slots: i64,
    pub group_ids: Vec<String>,
    pub allowed_teacher_ids: Vec<String>,
    /// `None` means "derive from room capacity vs. group size" (spec §3);
    /// `Some` restricts to an explicit room subset (e.g. a reserved
    /// amphitheater) in addition to the capacity filter.
    pub allowed_room_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTeacher {
    pub id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGroup {
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
    pub student_count: i64,
}

/// A half-open `[start_offset, end_offset)` availability interval for one
/// owner on one day, permanent or scoped to a specific week (spec §3: a
/// week-scoped interval of the same owner/day supersedes the permanent one).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAvailabilityWindow {
    pub owner_id: String,
    pub day: u32,
    pub start_offset: u32,
    pub end_offset: u32,
    pub priority: AvailabilityPriority,
    pub week_id: Option<String>,
}

/// A fixed required start (day, offset) for a particular session (F8).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawObligation {
    pub session_id: String,
    pub day: u32,
    pub start_offset: u32,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInput {
    pub week_id: String,
    /// `None` falls back to the corresponding `Config` default (spec §6 notes
    /// the same knobs appear both in the adapter payload and as environment
    /// defaults; a data adapter that omits the grid shape gets the run's
    /// configured default instead of a hard failure).
    pub days: Option<u32>,
    pub slots_per_day: Option<u32>,
    pub lunch_window: Option<BTreeSet<u32>>,
    pub sessions: Vec<RawSession>,
    pub rooms: BTreeMap<String, i64>,
    pub teachers: Vec<RawTeacher>,
    pub groups: Vec<RawGroup>,
    pub teacher_availability: Vec<RawAvailabilityWindow>,
    pub room_availability: Vec<RawAvailabilityWindow>,
    pub group_availability: Vec<RawAvailabilityWindow>,
    pub session_obligations: Vec<RawObligation>,
}
