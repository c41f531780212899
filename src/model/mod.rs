pub mod availability;
pub mod entities;
pub mod hierarchy;
pub mod ordering;
pub mod raw;

pub use entities::*;
pub use raw::{AvailabilityPriority, RawAvailabilityWindow, RawGroup, RawInput, RawObligation, RawSession, RawTeacher};
