//! Per-day availability resolution (spec §3, §4.1, §9 Open Question 1).
//!
//! Grounded on `original_source/bouton/constraint_integration.py::_find_blocked_slots`
//! and `constraint_validator.py`, which resolve a teacher/room/group's blocked
//! ranges per day from an untyped dict-of-lists; here the same resolution is
//! expressed over a typed, dense-indexed table.

use crate::model::entities::{Day, Interval};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Availability windows for one class of owner (teachers, rooms, or groups),
/// split into permanent (week-null) and week-scoped sets.
#[derive(Debug, Clone)]
pub struct AvailabilityTable<K: Eq + Hash + Copy> {
    permanent: HashMap<(K, Day), Vec<Interval>>,
    weekly: HashMap<(K, Day, String), Vec<Interval>>,
    /// Owners that appear *anywhere* in the table, including on days with no
    /// explicit entry. An owner absent from this set is always fully
    /// available (spec §8 boundary behavior).
    present_owners: HashSet<K>,
}

impl<K: Eq + Hash + Copy> Default for AvailabilityTable<K> {
    fn default() -> Self {
        Self {
            permanent: HashMap::new(),
            weekly: HashMap::new(),
            present_owners: HashSet::new(),
        }
    }
}

impl<K: Eq + Hash + Copy> AvailabilityTable<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_permanent(&mut self, owner: K, day: Day, interval: Interval) {
        self.present_owners.insert(owner);
        self.permanent.entry((owner, day)).or_default().push(interval);
    }

    pub fn add_weekly(&mut self, owner: K, day: Day, week_id: &str, interval: Interval) {
        self.present_owners.insert(owner);
        self.weekly
            .entry((owner, day, week_id.to_string()))
            .or_default()
            .push(interval);
    }

    /// Resolves the owner's available intervals on `day` for `week_id`.
    ///
    /// Returns `None` when the owner is unconstrained that day (fully
    /// available). Returns `Some(intervals)` — possibly empty, meaning fully
    /// unavailable — when a constraint applies.
    pub fn resolve_day(
        &self,
        owner: K,
        day: Day,
        week_id: &str,
        empty_day_means_unavailable: bool,
    ) -> Option<Vec<Interval>> {
        if !self.present_owners.contains(&owner) {
            return None;
        }
        if let Some(intervals) = self.weekly.get(&(owner, day, week_id.to_string())) {
            return Some(intervals.clone());
        }
        if let Some(intervals) = self.permanent.get(&(owner, day)) {
            return Some(intervals.clone());
        }
        if empty_day_means_unavailable {
            Some(Vec::new())
        } else {
            None
        }
    }

    /// Whether `[lo, hi)` on `day` is fully covered by one available
    /// interval (used by F5/F6: a session needs one contiguous window, not a
    /// union of fragments).
    pub fn covers_span(
        &self,
        owner: K,
        day: Day,
        week_id: &str,
        lo: u32,
        hi: u32,
        empty_day_means_unavailable: bool,
    ) -> bool {
        match self.resolve_day(owner, day, week_id, empty_day_means_unavailable) {
            None => true,
            Some(intervals) => intervals.iter().any(|iv| iv.contains_span(lo, hi)),
        }
    }
}
