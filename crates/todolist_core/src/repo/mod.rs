//! Repository layer between controllers and stores.
//!
//! # Responsibility
//! - Translate domain intents (add, delete, toggle, observe) into store calls.
//! - Keep the controller independent of the storage technology.

pub mod task_repo;
