pub mod clock;
pub mod descriptor_cache;
pub mod sql_filter;
pub mod time_fmt;
