use chrono::{Duration, NaiveTime, Timelike};
use serde::Serialize;

use crate::model::attendance::{AttendanceRecord, AttendanceStatus};

/// Office-hour thresholds driving attendance status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OfficeHours {
    pub start: NaiveTime,
    pub grace_minutes: u32,
    pub end: NaiveTime,
    pub absent_after: NaiveTime,
    pub min_work_hours: u32,
}

impl Default for OfficeHours {
    fn default() -> Self {
        Self {
            start: hm(9, 30),
            grace_minutes: 10,
            end: hm(18, 10),
            absent_after: hm(11, 0),
            min_work_hours: 8,
        }
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

fn minutes_since_midnight(t: NaiveTime) -> u32 {
    t.hour() * 60 + t.minute()
}

impl OfficeHours {
    /// Last minute that still counts as on time.
    pub fn late_after(&self) -> NaiveTime {
        self.start + Duration::minutes(i64::from(self.grace_minutes))
    }

    /// Status for a first check-in at `at`, evaluated at minute resolution.
    pub fn check_in_status(&self, at: NaiveTime) -> AttendanceStatus {
        let minutes = minutes_since_midnight(at);

        if minutes >= minutes_since_midnight(self.absent_after) {
            AttendanceStatus::Absent
        } else if minutes > minutes_since_midnight(self.late_after()) {
            AttendanceStatus::Late
        } else {
            AttendanceStatus::Present
        }
    }

    /// A late arrival still owes a full workday, but never leaves before office end.
    /// A workday running past midnight is capped at the last second of the day.
    pub fn expected_checkout(&self, time_in: NaiveTime) -> NaiveTime {
        let (full_day, wrapped) =
            time_in.overflowing_add_signed(Duration::hours(i64::from(self.min_work_hours)));
        if wrapped != 0 {
            return NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(self.end);
        }
        full_day.max(self.end)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckInDecision<'a> {
    /// A record already exists for the day; nothing is written.
    AlreadyCheckedIn(&'a AttendanceRecord),
    Record {
        status: AttendanceStatus,
        expected_checkout: Option<NaiveTime>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutDecision<'a> {
    NotCheckedIn,
    AlreadyCheckedOut(&'a AttendanceRecord),
    Record {
        record: &'a AttendanceRecord,
        status: AttendanceStatus,
        early: bool,
    },
}

pub fn decide_check_in<'a>(
    hours: &OfficeHours,
    today: Option<&'a AttendanceRecord>,
    now: NaiveTime,
) -> CheckInDecision<'a> {
    if let Some(existing) = today {
        return CheckInDecision::AlreadyCheckedIn(existing);
    }

    let status = hours.check_in_status(now);
    let expected_checkout = match status {
        AttendanceStatus::Late => Some(hours.expected_checkout(now)),
        _ => None,
    };

    CheckInDecision::Record {
        status,
        expected_checkout,
    }
}

pub fn decide_check_out<'a>(
    hours: &OfficeHours,
    today: Option<&'a AttendanceRecord>,
    now: NaiveTime,
) -> CheckOutDecision<'a> {
    let Some(record) = today else {
        return CheckOutDecision::NotCheckedIn;
    };

    if record.time_out.is_some() {
        return CheckOutDecision::AlreadyCheckedOut(record);
    }

    if now < hours.end {
        let status = match record.status {
            AttendanceStatus::Late => AttendanceStatus::LateEarlyLeave,
            _ => AttendanceStatus::EarlyLeave,
        };
        CheckOutDecision::Record {
            record,
            status,
            early: true,
        }
    } else {
        CheckOutDecision::Record {
            record,
            status: record.status,
            early: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn record(status: AttendanceStatus, time_out: Option<NaiveTime>) -> AttendanceRecord {
        AttendanceRecord {
            id: 1,
            face_id: 1,
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            time_in: t(9, 41),
            time_out,
            expected_checkout: Some(t(18, 10)),
            status,
        }
    }

    #[test]
    fn test_default_thresholds() {
        let hours = OfficeHours::default();
        assert_eq!(hours.late_after(), t(9, 40));
        assert_eq!(hours.end, t(18, 10));
        assert_eq!(hours.absent_after, t(11, 0));
    }

    #[test]
    fn test_check_in_status_boundaries() {
        let hours = OfficeHours::default();
        assert_eq!(hours.check_in_status(t(8, 0)), AttendanceStatus::Present);
        assert_eq!(hours.check_in_status(t(9, 39)), AttendanceStatus::Present);
        assert_eq!(
            hours.check_in_status(NaiveTime::from_hms_opt(9, 40, 59).unwrap()),
            AttendanceStatus::Present
        );
        assert_eq!(hours.check_in_status(t(9, 41)), AttendanceStatus::Late);
        assert_eq!(hours.check_in_status(t(10, 59)), AttendanceStatus::Late);
        assert_eq!(hours.check_in_status(t(11, 0)), AttendanceStatus::Absent);
        assert_eq!(hours.check_in_status(t(11, 5)), AttendanceStatus::Absent);
    }

    #[test]
    fn test_late_check_in_gets_expected_checkout() {
        let hours = OfficeHours::default();

        assert_eq!(
            decide_check_in(&hours, None, t(9, 41)),
            CheckInDecision::Record {
                status: AttendanceStatus::Late,
                expected_checkout: Some(t(18, 10)),
            }
        );
        assert_eq!(
            decide_check_in(&hours, None, t(10, 30)),
            CheckInDecision::Record {
                status: AttendanceStatus::Late,
                expected_checkout: Some(t(18, 30)),
            }
        );
    }

    #[test]
    fn test_expected_checkout_does_not_wrap_past_midnight() {
        let hours = OfficeHours {
            absent_after: t(17, 0),
            ..OfficeHours::default()
        };
        assert_eq!(
            hours.expected_checkout(t(16, 30)),
            NaiveTime::from_hms_opt(23, 59, 59).unwrap()
        );
        assert_eq!(hours.expected_checkout(t(15, 0)), t(23, 0));
    }

    #[test]
    fn test_on_time_and_absent_have_no_expected_checkout() {
        let hours = OfficeHours::default();
        assert_eq!(
            decide_check_in(&hours, None, t(9, 39)),
            CheckInDecision::Record {
                status: AttendanceStatus::Present,
                expected_checkout: None,
            }
        );
        assert_eq!(
            decide_check_in(&hours, None, t(11, 5)),
            CheckInDecision::Record {
                status: AttendanceStatus::Absent,
                expected_checkout: None,
            }
        );
    }

    #[test]
    fn test_second_check_in_is_reported() {
        let hours = OfficeHours::default();
        let existing = record(AttendanceStatus::Late, None);
        assert_eq!(
            decide_check_in(&hours, Some(&existing), t(9, 50)),
            CheckInDecision::AlreadyCheckedIn(&existing)
        );
    }

    #[test]
    fn test_early_check_out() {
        let hours = OfficeHours::default();

        let late = record(AttendanceStatus::Late, None);
        assert_eq!(
            decide_check_out(&hours, Some(&late), t(18, 5)),
            CheckOutDecision::Record {
                record: &late,
                status: AttendanceStatus::LateEarlyLeave,
                early: true,
            }
        );

        let present = record(AttendanceStatus::Present, None);
        assert_eq!(
            decide_check_out(&hours, Some(&present), t(17, 0)),
            CheckOutDecision::Record {
                record: &present,
                status: AttendanceStatus::EarlyLeave,
                early: true,
            }
        );
    }

    #[test]
    fn test_regular_check_out_keeps_status() {
        let hours = OfficeHours::default();
        let late = record(AttendanceStatus::Late, None);
        assert_eq!(
            decide_check_out(&hours, Some(&late), t(18, 30)),
            CheckOutDecision::Record {
                record: &late,
                status: AttendanceStatus::Late,
                early: false,
            }
        );
        assert_eq!(
            decide_check_out(&hours, Some(&late), t(18, 10)),
            CheckOutDecision::Record {
                record: &late,
                status: AttendanceStatus::Late,
                early: false,
            }
        );
    }

    #[test]
    fn test_check_out_without_record_or_twice() {
        let hours = OfficeHours::default();
        assert_eq!(
            decide_check_out(&hours, None, t(18, 30)),
            CheckOutDecision::NotCheckedIn
        );

        let done = record(AttendanceStatus::Present, Some(t(18, 20)));
        assert_eq!(
            decide_check_out(&hours, Some(&done), t(18, 40)),
            CheckOutDecision::AlreadyCheckedOut(&done)
        );
    }
}
