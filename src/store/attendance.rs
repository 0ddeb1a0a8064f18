use chrono::{NaiveDate, NaiveTime};
use sqlx::SqlitePool;

use crate::error::{AppError, AppResult};
use crate::model::attendance::{
    AttendanceEntry, AttendanceEntryRow, AttendanceRecord, AttendanceRow, AttendanceStatus,
};
use crate::utils::sql_filter::{SqlFilter, SqlValue, like_pattern};

/// Filters for the historical listing; every field is optional.
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub status: Option<AttendanceStatus>,
    pub department: Option<String>,
    pub name: Option<String>,
}

impl HistoryFilter {
    fn to_sql(&self) -> SqlFilter {
        let mut filter = SqlFilter::new();
        filter
            .push_opt("a.date >= ?", self.from, SqlValue::Date)
            .push_opt("a.date <= ?", self.to, SqlValue::Date)
            .push_opt("a.status = ?", self.status, |s| {
                SqlValue::Text(s.as_ref().to_string())
            })
            .push_opt("f.department = ?", self.department.clone(), SqlValue::Text)
            .push_opt(
                "f.label LIKE ? ESCAPE '\\'",
                self.name.as_deref(),
                |n| SqlValue::Text(like_pattern(n)),
            );
        filter
    }
}

const ENTRY_SELECT: &str = r#"
    SELECT a.id, a.face_id, f.label, f.employee_id, f.department,
           a.date, a.time_in, a.time_out, a.expected_checkout, a.status
    FROM attendance a
    JOIN faces f ON f.id = a.face_id
"#;

fn to_record(row: AttendanceRow) -> AppResult<AttendanceRecord> {
    let id = row.id;
    AttendanceRecord::try_from(row)
        .map_err(|e| AppError::Internal(format!("attendance {id} has an unknown status: {e}")))
}

fn to_entries(rows: Vec<AttendanceEntryRow>) -> AppResult<Vec<AttendanceEntry>> {
    rows.into_iter()
        .map(|row| {
            let id = row.id;
            AttendanceEntry::try_from(row).map_err(|e| {
                AppError::Internal(format!("attendance {id} has an unknown status: {e}"))
            })
        })
        .collect()
}

pub async fn find_for_day(
    pool: &SqlitePool,
    face_id: i64,
    date: NaiveDate,
) -> AppResult<Option<AttendanceRecord>> {
    let row = sqlx::query_as::<_, AttendanceRow>(
        r#"
        SELECT id, face_id, date, time_in, time_out, expected_checkout, status
        FROM attendance
        WHERE face_id = ? AND date = ?
        "#,
    )
    .bind(face_id)
    .bind(date)
    .fetch_optional(pool)
    .await?;

    row.map(to_record).transpose()
}

#[cfg(test)]
pub async fn for_face(pool: &SqlitePool, face_id: i64) -> AppResult<Vec<AttendanceRecord>> {
    let rows = sqlx::query_as::<_, AttendanceRow>(
        r#"
        SELECT id, face_id, date, time_in, time_out, expected_checkout, status
        FROM attendance
        WHERE face_id = ?
        ORDER BY date DESC
        "#,
    )
    .bind(face_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(to_record).collect()
}

/// First check-in of the day. A concurrent duplicate trips `UNIQUE(face_id, date)`
/// and comes back as a storage error.
pub async fn insert_check_in(
    pool: &SqlitePool,
    face_id: i64,
    date: NaiveDate,
    time_in: NaiveTime,
    status: AttendanceStatus,
    expected_checkout: Option<NaiveTime>,
) -> AppResult<AttendanceRecord> {
    let result = sqlx::query(
        r#"
        INSERT INTO attendance (face_id, date, time_in, expected_checkout, status)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(face_id)
    .bind(date)
    .bind(time_in)
    .bind(expected_checkout)
    .bind(status.as_ref())
    .execute(pool)
    .await?;

    Ok(AttendanceRecord {
        id: result.last_insert_rowid(),
        face_id,
        date,
        time_in,
        time_out: None,
        expected_checkout,
        status,
    })
}

/// Returns false when the record was already checked out.
pub async fn record_check_out(
    pool: &SqlitePool,
    record_id: i64,
    time_out: NaiveTime,
    status: AttendanceStatus,
) -> AppResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE attendance
        SET time_out = ?, status = ?
        WHERE id = ?
        AND time_out IS NULL
        "#,
    )
    .bind(time_out)
    .bind(status.as_ref())
    .bind(record_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn entries_for_day(pool: &SqlitePool, date: NaiveDate) -> AppResult<Vec<AttendanceEntry>> {
    let sql = format!("{ENTRY_SELECT} WHERE a.date = ? ORDER BY a.time_in ASC");
    let rows = sqlx::query_as::<_, AttendanceEntryRow>(&sql)
        .bind(date)
        .fetch_all(pool)
        .await?;

    to_entries(rows)
}

pub async fn history(pool: &SqlitePool, filter: &HistoryFilter) -> AppResult<Vec<AttendanceEntry>> {
    let where_sql = filter.to_sql();
    let sql = format!(
        "{ENTRY_SELECT} {} ORDER BY a.date DESC, a.time_in ASC",
        where_sql.where_clause()
    );
    tracing::debug!(sql = %sql, values = ?where_sql.values(), "Fetching attendance history");

    let query = where_sql.bind_to(sqlx::query_as::<_, AttendanceEntryRow>(&sql));
    let rows = query.fetch_all(pool).await?;

    to_entries(rows)
}
