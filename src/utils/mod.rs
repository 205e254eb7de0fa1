//! Utility helpers.

pub mod format;
pub mod fs;
pub mod hash;
