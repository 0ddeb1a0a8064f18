use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};

/// Source of "now" for attendance decisions.
#[derive(Debug, Clone, Copy)]
pub enum Clock {
    /// Local wall-clock time of the server.
    System,
    Fixed(NaiveDateTime),
}

impl Clock {
    /// Current local time truncated to whole seconds.
    pub fn now(&self) -> NaiveDateTime {
        let now = match self {
            Clock::System => Local::now().naive_local(),
            Clock::Fixed(at) => *at,
        };
        now.with_nanosecond(0).unwrap_or(now)
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date()
    }
}
