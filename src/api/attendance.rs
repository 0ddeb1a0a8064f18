use std::str::FromStr;

use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::SqlitePool;
use utoipa::{IntoParams, ToSchema};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::model::attendance::AttendanceStatus;
use crate::service::reports;
use crate::service::scan;
use crate::store::attendance::HistoryFilter;
use crate::utils::clock::Clock;
use crate::utils::descriptor_cache::DescriptorCache;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ScanRequest {
    /// Descriptor of the face currently in front of the camera.
    #[schema(example = json!([0.012, -0.094, 0.131]))]
    pub descriptor: Option<Vec<f32>>,
}

impl ScanRequest {
    fn into_descriptor(self) -> AppResult<Vec<f32>> {
        super::require_descriptor(self.descriptor, "descriptor required")
    }
}

/// Query-string filters; blank values are ignored so plain HTML forms can submit them.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// First day, inclusive (YYYY-MM-DD)
    pub from: Option<String>,
    /// Last day, inclusive (YYYY-MM-DD)
    pub to: Option<String>,
    /// present, late, early_leave, late_early_leave or absent
    pub status: Option<String>,
    pub department: Option<String>,
    /// Case-insensitive fragment of the label
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DayQuery {
    /// Day to report on (YYYY-MM-DD), defaults to today
    pub date: Option<String>,
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_date(field: &str, value: Option<String>) -> AppResult<Option<NaiveDate>> {
    blank_to_none(value)
        .map(|raw| {
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
                AppError::BadRequest(format!("{field} must be a date (YYYY-MM-DD), got {raw:?}"))
            })
        })
        .transpose()
}

impl HistoryQuery {
    pub fn into_filter(self) -> AppResult<HistoryFilter> {
        let from = parse_date("from", self.from)?;
        let to = parse_date("to", self.to)?;
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(AppError::BadRequest("from must not be after to".into()));
            }
        }

        let status = blank_to_none(self.status)
            .map(|raw| {
                AttendanceStatus::from_str(&raw)
                    .map_err(|_| AppError::BadRequest(format!("unknown status {raw:?}")))
            })
            .transpose()?;

        Ok(HistoryFilter {
            from,
            to,
            status,
            department: blank_to_none(self.department),
            name: blank_to_none(self.name),
        })
    }
}

/// Identify a face without touching attendance
#[utoipa::path(
    post,
    path = "/api/recognize",
    request_body = ScanRequest,
    responses(
        (status = 200, description = "Match result; `recognized` is false when nothing is within threshold", body = crate::service::scan::ScanResponse),
        (status = 400, description = "Missing descriptor", body = Object, example = json!({
            "error": "descriptor required"
        })),
        (status = 429, description = "Too many requests")
    ),
    tag = "Attendance"
)]
pub async fn recognize(
    pool: web::Data<SqlitePool>,
    cache: web::Data<DescriptorCache>,
    payload: web::Json<ScanRequest>,
) -> AppResult<HttpResponse> {
    let descriptor = payload.into_inner().into_descriptor()?;
    let response = scan::recognize(pool.get_ref(), cache.get_ref(), &descriptor).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Check in the recognized face
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    request_body = ScanRequest,
    responses(
        (status = 200, description = "Checked in, already checked in, or not recognized (see `outcome`)", body = crate::service::scan::ScanResponse),
        (status = 400, description = "Missing descriptor", body = Object, example = json!({
            "error": "descriptor required"
        })),
        (status = 429, description = "Too many requests"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    pool: web::Data<SqlitePool>,
    cache: web::Data<DescriptorCache>,
    config: web::Data<Config>,
    clock: web::Data<Clock>,
    payload: web::Json<ScanRequest>,
) -> AppResult<HttpResponse> {
    let descriptor = payload.into_inner().into_descriptor()?;
    let response = scan::check_in(
        pool.get_ref(),
        cache.get_ref(),
        &config.office_hours,
        &descriptor,
        clock.now(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Check out the recognized face
#[utoipa::path(
    post,
    path = "/api/attendance/check-out",
    request_body = ScanRequest,
    responses(
        (status = 200, description = "Checked out, already checked out, not checked in, or not recognized (see `outcome`)", body = crate::service::scan::ScanResponse),
        (status = 400, description = "Missing descriptor", body = Object, example = json!({
            "error": "descriptor required"
        })),
        (status = 429, description = "Too many requests"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    pool: web::Data<SqlitePool>,
    cache: web::Data<DescriptorCache>,
    config: web::Data<Config>,
    clock: web::Data<Clock>,
    payload: web::Json<ScanRequest>,
) -> AppResult<HttpResponse> {
    let descriptor = payload.into_inner().into_descriptor()?;
    let response = scan::check_out(
        pool.get_ref(),
        cache.get_ref(),
        &config.office_hours,
        &descriptor,
        clock.now(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Today's attendance with per-status counts
#[utoipa::path(
    get,
    path = "/api/attendance/today",
    responses(
        (status = 200, description = "Records for the current day, earliest check-in first", body = crate::service::reports::DayReport),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn today(
    pool: web::Data<SqlitePool>,
    clock: web::Data<Clock>,
) -> AppResult<HttpResponse> {
    let report = reports::day_report(pool.get_ref(), clock.today()).await?;
    Ok(HttpResponse::Ok().json(report))
}

/// Per-status counts for a day
#[utoipa::path(
    get,
    path = "/api/attendance/stats",
    params(DayQuery),
    responses(
        (status = 200, description = "Counts for the requested day", body = crate::service::reports::StatusCounts),
        (status = 400, description = "Malformed date"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn stats(
    pool: web::Data<SqlitePool>,
    clock: web::Data<Clock>,
    query: web::Query<DayQuery>,
) -> AppResult<HttpResponse> {
    let date = parse_date("date", query.into_inner().date)?.unwrap_or_else(|| clock.today());
    let report = reports::day_report(pool.get_ref(), date).await?;
    Ok(HttpResponse::Ok().json(report.counts))
}

/// Filtered attendance history
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Matching records, newest day first", body = crate::service::reports::HistoryReport),
        (status = 400, description = "Malformed filter", body = Object, example = json!({
            "error": "unknown status \"sick\""
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn history(
    pool: web::Data<SqlitePool>,
    query: web::Query<HistoryQuery>,
) -> AppResult<HttpResponse> {
    let filter = query.into_inner().into_filter()?;
    let report = reports::history_report(pool.get_ref(), &filter).await?;
    Ok(HttpResponse::Ok().json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::date;

    fn query(from: &str, to: &str, status: &str) -> HistoryQuery {
        HistoryQuery {
            from: Some(from.into()),
            to: Some(to.into()),
            status: Some(status.into()),
            department: Some("".into()),
            name: Some(" ana ".into()),
        }
    }

    #[test]
    fn blank_fields_are_ignored() {
        let filter = query("", " ", "").into_filter().unwrap();
        assert_eq!(filter.from, None);
        assert_eq!(filter.to, None);
        assert_eq!(filter.status, None);
        assert_eq!(filter.department, None);
        assert_eq!(filter.name.as_deref(), Some("ana"));
    }

    #[test]
    fn parses_dates_and_status() {
        let filter = query("2026-03-01", "2026-03-31", "late_early_leave")
            .into_filter()
            .unwrap();
        assert_eq!(filter.from, Some(date(2026, 3, 1)));
        assert_eq!(filter.to, Some(date(2026, 3, 31)));
        assert_eq!(filter.status, Some(AttendanceStatus::LateEarlyLeave));
    }

    #[test]
    fn rejects_bad_filters() {
        assert!(matches!(
            query("2026-03-31", "2026-03-01", "").into_filter(),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            query("03/01/2026", "", "").into_filter(),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            query("", "", "sick").into_filter(),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn scan_request_needs_descriptor() {
        let empty = ScanRequest {
            descriptor: Some(vec![]),
        };
        assert!(matches!(empty.into_descriptor(), Err(AppError::BadRequest(_))));
        assert!(matches!(
            ScanRequest { descriptor: None }.into_descriptor(),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn scan_request_rejects_non_finite_values() {
        let overflow = ScanRequest {
            descriptor: Some(vec![0.0, f32::INFINITY, 0.0]),
        };
        let err = overflow.into_descriptor().unwrap_err();
        assert_eq!(err.to_string(), "descriptor values must be finite numbers");
    }
}
