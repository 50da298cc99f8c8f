//! Task record.
//!
//! # Invariants
//! - `id` is unique among live tasks and never reused within one database.
//! - Callers never construct ids for new tasks; the store hands them out.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Store-assigned task identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(i64);

impl TaskId {
    /// Wraps a raw row id. Used by storage code and by hosts that echo ids
    /// back from a rendered list.
    pub fn from_raw(value: i64) -> Self {
        Self(value)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One row of the task list.
///
/// The store does not validate `description`; the blank-input policy lives
/// in the task list controller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub description: String,
    pub complete: bool,
}

/// Returns whether a submitted description carries any visible text.
pub fn is_blank_description(description: &str) -> bool {
    description.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::is_blank_description;

    #[test]
    fn blank_detection_covers_whitespace_only_input() {
        assert!(is_blank_description(""));
        assert!(is_blank_description("   "));
        assert!(is_blank_description("\t\n"));
        assert!(!is_blank_description(" Buy milk "));
    }
}
