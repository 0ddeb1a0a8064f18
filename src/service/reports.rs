use chrono::NaiveDate;
use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::error::AppResult;
use crate::model::attendance::{AttendanceEntry, AttendanceStatus};
use crate::store::attendance::{self, HistoryFilter};
use crate::store::faces;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[schema(example = json!({
    "registered": 12,
    "marked": 9,
    "not_marked": 3,
    "checked_out": 4,
    "present": 6,
    "late": 2,
    "early_leave": 0,
    "late_early_leave": 1,
    "absent": 0
}))]
pub struct StatusCounts {
    pub registered: i64,
    /// Identities with a record for the day.
    pub marked: i64,
    pub not_marked: i64,
    pub checked_out: i64,
    pub present: i64,
    pub late: i64,
    pub early_leave: i64,
    pub late_early_leave: i64,
    pub absent: i64,
}

pub fn count_statuses(entries: &[AttendanceEntry], registered: i64) -> StatusCounts {
    let mut counts = StatusCounts {
        registered,
        marked: entries.len() as i64,
        ..Default::default()
    };

    for entry in entries {
        let slot = match entry.status {
            AttendanceStatus::Present => &mut counts.present,
            AttendanceStatus::Late => &mut counts.late,
            AttendanceStatus::EarlyLeave => &mut counts.early_leave,
            AttendanceStatus::LateEarlyLeave => &mut counts.late_early_leave,
            AttendanceStatus::Absent => &mut counts.absent,
        };
        *slot += 1;

        if entry.time_out.is_some() {
            counts.checked_out += 1;
        }
    }

    counts.not_marked = (registered - counts.marked).max(0);
    counts
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DayReport {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub counts: StatusCounts,
    pub records: Vec<AttendanceEntry>,
}

pub async fn day_report(pool: &SqlitePool, date: NaiveDate) -> AppResult<DayReport> {
    let records = attendance::entries_for_day(pool, date).await?;
    let registered = faces::count(pool).await?;

    Ok(DayReport {
        date,
        counts: count_statuses(&records, registered),
        records,
    })
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HistoryReport {
    pub records: Vec<AttendanceEntry>,
    pub count: usize,
    /// Sum of `work_minutes` over checked-out records.
    pub total_work_minutes: i64,
}

pub fn summarize_history(records: Vec<AttendanceEntry>) -> HistoryReport {
    let total_work_minutes = records.iter().filter_map(|r| r.work_minutes).sum();
    HistoryReport {
        count: records.len(),
        total_work_minutes,
        records,
    }
}

pub async fn history_report(pool: &SqlitePool, filter: &HistoryFilter) -> AppResult<HistoryReport> {
    let records = attendance::history(pool, filter).await?;
    Ok(summarize_history(records))
}
