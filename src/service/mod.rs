pub mod registry;
pub mod reports;
pub mod scan;
