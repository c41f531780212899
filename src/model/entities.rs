//! Dense-indexed entity records (spec §3). Every downstream component after
//! `entity_store` works in index space, not by string id: the hot constraint
//! loops iterate contiguous slices instead of hashing.

pub use crate::model::raw::SessionKind;

/// Day index, `0..days`, Monday-first.
pub type Day = u32;
/// Offset within a day, `0..slots_per_day`.
pub type SlotOffset = u32;
/// Linearized `(day, offset)` index over the whole week: `day * slots_per_day + offset`.
pub type GlobalSlot = u32;

macro_rules! dense_index {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub usize);

        impl $name {
            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

dense_index!(SessionIdx);
dense_index!(RoomIdx);
dense_index!(TeacherIdx);
dense_index!(GroupIdx);

/// A half-open `[start, end)` interval on the slot-offset grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: SlotOffset,
    pub end: SlotOffset,
}

impl Interval {
    pub fn new(start: SlotOffset, end: SlotOffset) -> Self {
        Self { start, end }
    }

    /// Whether this interval fully contains `[lo, hi)`.
    pub fn contains_span(&self, lo: SlotOffset, hi: SlotOffset) -> bool {
        self.start <= lo && hi <= self.end
    }

    pub fn contains_offset(&self, offset: SlotOffset) -> bool {
        self.start <= offset && offset < self.end
    }
}

#[derive(Debug, Clone)]
pub struct Room {
    pub id: String,
    pub capacity: i64,
}

#[derive(Debug, Clone)]
pub struct Teacher {
    pub id: String,
    pub display_name: String,
}

#[derive(Debug, Clone)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub parent: Option<GroupIdx>,
    pub student_count: i64,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub kind: SessionKind,
    pub subject: String,
    pub duration: u32,
    pub groups: Vec<GroupIdx>,
    pub allowed_teachers: Vec<TeacherIdx>,
    pub allowed_rooms: Vec<RoomIdx>,
    /// Required `(day, offset)` starts (F8). Empty means unconstrained.
    pub obligations: Vec<(Day, SlotOffset)>,
}

impl Session {
    /// Required room capacity: the session's groups attend together in one
    /// room (GLOSSARY "Affected groups"), so this is the *sum* of their
    /// `student_count`, not the largest single group.
    pub fn group_size(&self, groups: &[Group]) -> i64 {
        self.groups.iter().map(|g| groups[g.index()].student_count).sum()
    }
}

/// Precedence pair derived from the pedagogical ordering discipline (F10):
/// `end(before) <= start(after)` on the global-slot axis.
#[derive(Debug, Clone, Copy)]
pub struct OrderingRule {
    pub before: SessionIdx,
    pub after: SessionIdx,
}

pub fn global_slot(day: Day, offset: SlotOffset, slots_per_day: u32) -> GlobalSlot {
    day * slots_per_day + offset
}

pub fn day_offset(slot: GlobalSlot, slots_per_day: u32) -> (Day, SlotOffset) {
    (slot / slots_per_day, slot % slots_per_day)
}
