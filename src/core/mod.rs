//! Core business logic modules.

pub mod conflict;
pub mod deletion;
pub mod destination;
pub mod executor;
pub mod naming;
pub mod planner;
pub mod progress;
pub mod rollback;
pub mod scanner;
pub mod staging;
pub mod transform;
