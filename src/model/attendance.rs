use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Late,
    EarlyLeave,
    LateEarlyLeave,
    Absent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceRecord {
    pub id: i64,
    pub face_id: i64,
    pub date: NaiveDate,
    pub time_in: NaiveTime,
    pub time_out: Option<NaiveTime>,
    pub expected_checkout: Option<NaiveTime>,
    pub status: AttendanceStatus,
}

#[derive(Debug, sqlx::FromRow)]
pub struct AttendanceRow {
    pub id: i64,
    pub face_id: i64,
    pub date: NaiveDate,
    pub time_in: NaiveTime,
    pub time_out: Option<NaiveTime>,
    pub expected_checkout: Option<NaiveTime>,
    pub status: String,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = strum::ParseError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        Ok(AttendanceRecord {
            id: row.id,
            face_id: row.face_id,
            date: row.date,
            time_in: row.time_in,
            time_out: row.time_out,
            expected_checkout: row.expected_checkout,
            status: row.status.parse()?,
        })
    }
}

/// Attendance row joined with the owning template, as read by reports.
#[derive(Debug, sqlx::FromRow)]
pub struct AttendanceEntryRow {
    pub id: i64,
    pub face_id: i64,
    pub label: String,
    pub employee_id: Option<String>,
    pub department: Option<String>,
    pub date: NaiveDate,
    pub time_in: NaiveTime,
    pub time_out: Option<NaiveTime>,
    pub expected_checkout: Option<NaiveTime>,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[schema(example = json!({
    "id": 7,
    "face_id": 1,
    "label": "Ana Silva",
    "employee_id": "EMP-001",
    "department": "Engineering",
    "date": "2026-03-02",
    "time_in": "09:41:00",
    "time_out": "18:30:00",
    "expected_checkout": "18:10:00",
    "status": "late",
    "work_minutes": 529
}))]
pub struct AttendanceEntry {
    pub id: i64,
    pub face_id: i64,
    pub label: String,
    pub employee_id: Option<String>,
    pub department: Option<String>,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = String)]
    pub time_in: NaiveTime,
    #[schema(value_type = Option<String>)]
    pub time_out: Option<NaiveTime>,
    #[schema(value_type = Option<String>)]
    pub expected_checkout: Option<NaiveTime>,
    pub status: AttendanceStatus,
    /// Minutes between time-in and time-out, once checked out.
    pub work_minutes: Option<i64>,
}

impl TryFrom<AttendanceEntryRow> for AttendanceEntry {
    type Error = strum::ParseError;

    fn try_from(row: AttendanceEntryRow) -> Result<Self, Self::Error> {
        let work_minutes = work_minutes(row.time_in, row.time_out);
        Ok(AttendanceEntry {
            id: row.id,
            face_id: row.face_id,
            label: row.label,
            employee_id: row.employee_id,
            department: row.department,
            date: row.date,
            time_in: row.time_in,
            time_out: row.time_out,
            expected_checkout: row.expected_checkout,
            status: row.status.parse()?,
            work_minutes,
        })
    }
}

pub fn work_minutes(time_in: NaiveTime, time_out: Option<NaiveTime>) -> Option<i64> {
    time_out.map(|out| (out - time_in).num_minutes())
}
