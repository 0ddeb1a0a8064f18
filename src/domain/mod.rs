//! Matching and attendance rules. No I/O lives here.

pub mod matcher;
pub mod rules;
