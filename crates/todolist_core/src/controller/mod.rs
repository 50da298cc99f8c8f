//! Controllers owning presentation-facing state.
//!
//! # Responsibility
//! - Expose observable task list and theme values to the UI layer.
//! - Accept user intents and route them to repositories/stores.
//!
//! # Invariants
//! - Blank task submissions are dropped silently.
//! - Published state only ever reflects committed store content.

pub mod task_list;
pub mod theme;
