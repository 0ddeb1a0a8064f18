//! SQL access for the `faces` and `attendance` tables.

pub mod attendance;
pub mod faces;
