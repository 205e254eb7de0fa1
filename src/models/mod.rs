//! Data models.

pub mod config;
pub mod item;
pub mod journal;
pub mod outcome;
pub mod plan;
pub mod rules;
