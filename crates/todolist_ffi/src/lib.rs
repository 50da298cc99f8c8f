//! Flutter-facing bindings for the todolist core.

pub mod api;
