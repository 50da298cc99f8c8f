//! Domain model for the task list and the theme preference.
//!
//! # Invariants
//! - Task identity is assigned by the task store only.
//! - Exactly one theme preference is active at a time.

pub mod task;
pub mod theme;
