//! Server-rendered HTML shells.
//!
//! Handlers build plain view structs and hand them to minijinja; the browser
//! script in `static/app.js` does the camera work and talks to the JSON API.

use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, mime, web};
use chrono::{NaiveDateTime, NaiveTime};
use minijinja::{Environment, context};
use serde::Serialize;
use sqlx::SqlitePool;
use strum::IntoEnumIterator;

use crate::api::attendance::HistoryQuery;
use crate::config::Config;
use crate::domain::matcher::MATCH_THRESHOLD;
use crate::domain::rules::OfficeHours;
use crate::error::{AppError, AppResult};
use crate::model::attendance::{AttendanceEntry, AttendanceStatus};
use crate::model::face::FaceSummary;
use crate::service::reports::{self, StatusCounts};
use crate::store::faces;
use crate::utils::clock::Clock;
use crate::utils::time_fmt::{format_minutes, time_ago};

const APP_JS: &str = include_str!("../static/app.js");

pub struct Pages {
    env: Environment<'static>,
}

impl Pages {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template("base.html", include_str!("../templates/base.html"))?;
        env.add_template("dashboard.html", include_str!("../templates/dashboard.html"))?;
        env.add_template("register.html", include_str!("../templates/register.html"))?;
        env.add_template("records.html", include_str!("../templates/records.html"))?;
        Ok(Self { env })
    }

    fn render<S: Serialize>(&self, name: &str, ctx: S) -> AppResult<HttpResponse> {
        let html = self
            .env
            .get_template(name)
            .and_then(|t| t.render(ctx))
            .map_err(|e| {
                tracing::error!(error = %e, template = name, "Failed to render page");
                AppError::Internal(e.to_string())
            })?;

        Ok(HttpResponse::Ok().content_type(ContentType::html()).body(html))
    }
}

/// Settings the browser script needs, embedded as JSON in every page.
#[derive(Serialize)]
struct ClientConfig<'a> {
    api_prefix: &'a str,
    threshold: f32,
    register_samples: u32,
    office_hours: OfficeHoursView,
}

#[derive(Serialize)]
struct OfficeHoursView {
    start: String,
    late_after: String,
    end: String,
    absent_after: String,
}

fn hhmm(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

impl From<&OfficeHours> for OfficeHoursView {
    fn from(hours: &OfficeHours) -> Self {
        Self {
            start: hhmm(hours.start),
            late_after: hhmm(hours.late_after()),
            end: hhmm(hours.end),
            absent_after: hhmm(hours.absent_after),
        }
    }
}

fn client_config(config: &Config) -> ClientConfig<'_> {
    ClientConfig {
        api_prefix: &config.api_prefix,
        threshold: MATCH_THRESHOLD,
        register_samples: config.register_samples.max(1),
        office_hours: OfficeHoursView::from(&config.office_hours),
    }
}

#[derive(Serialize)]
struct FaceView {
    id: i64,
    label: String,
    employee_id: Option<String>,
    department: Option<String>,
    quality: Option<String>,
    registered: String,
    registered_ago: String,
}

impl FaceView {
    fn new(face: FaceSummary, now: NaiveDateTime) -> Self {
        Self {
            id: face.id,
            registered: face.registered_at.format("%Y-%m-%d %H:%M").to_string(),
            registered_ago: time_ago(face.registered_at, now),
            quality: face.quality.map(|q| format!("{:.0}%", q * 100.0)),
            label: face.label,
            employee_id: face.employee_id,
            department: face.department,
        }
    }
}

fn status_label(status: AttendanceStatus) -> &'static str {
    match status {
        AttendanceStatus::Present => "Present",
        AttendanceStatus::Late => "Late",
        AttendanceStatus::EarlyLeave => "Early leave",
        AttendanceStatus::LateEarlyLeave => "Late, early leave",
        AttendanceStatus::Absent => "Absent",
    }
}

#[derive(Serialize)]
struct EntryView {
    label: String,
    employee_id: Option<String>,
    department: Option<String>,
    date: String,
    time_in: String,
    time_out: Option<String>,
    expected_checkout: Option<String>,
    status: String,
    status_label: &'static str,
    worked: Option<String>,
}

impl From<AttendanceEntry> for EntryView {
    fn from(entry: AttendanceEntry) -> Self {
        Self {
            date: entry.date.format("%Y-%m-%d").to_string(),
            time_in: hhmm(entry.time_in),
            time_out: entry.time_out.map(hhmm),
            expected_checkout: entry.expected_checkout.map(hhmm),
            status: entry.status.to_string(),
            status_label: status_label(entry.status),
            worked: entry.work_minutes.map(format_minutes),
            label: entry.label,
            employee_id: entry.employee_id,
            department: entry.department,
        }
    }
}

#[derive(Serialize)]
struct CountView {
    label: &'static str,
    value: i64,
    class: &'static str,
}

fn count_views(counts: &StatusCounts) -> Vec<CountView> {
    let view = |label, value, class| CountView {
        label,
        value,
        class,
    };
    vec![
        view("Registered", counts.registered, "neutral"),
        view("Checked in", counts.marked, "neutral"),
        view("Not marked", counts.not_marked, "muted"),
        view("Present", counts.present, "present"),
        view("Late", counts.late, "late"),
        view("Early leave", counts.early_leave + counts.late_early_leave, "early_leave"),
        view("Absent", counts.absent, "absent"),
        view("Checked out", counts.checked_out, "neutral"),
    ]
}

#[derive(Serialize)]
struct StatusOption {
    value: String,
    label: &'static str,
}

fn status_options() -> Vec<StatusOption> {
    AttendanceStatus::iter()
        .map(|s| StatusOption {
            value: s.to_string(),
            label: status_label(s),
        })
        .collect()
}

pub async fn dashboard(
    pages: web::Data<Pages>,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
    clock: web::Data<Clock>,
) -> AppResult<HttpResponse> {
    let now = clock.now();
    let report = reports::day_report(pool.get_ref(), now.date()).await?;

    pages.render(
        "dashboard.html",
        context! {
            page => "dashboard",
            client => client_config(&config),
            today => report.date.format("%A, %d %B %Y").to_string(),
            counts => count_views(&report.counts),
            records => report.records.into_iter().map(EntryView::from).collect::<Vec<_>>(),
        },
    )
}

pub async fn register(
    pages: web::Data<Pages>,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
    clock: web::Data<Clock>,
) -> AppResult<HttpResponse> {
    let now = clock.now();
    let faces = faces::list_summaries(pool.get_ref()).await?;
    let departments = faces::departments(pool.get_ref()).await?;

    pages.render(
        "register.html",
        context! {
            page => "register",
            client => client_config(&config),
            samples => config.register_samples.max(1),
            departments => departments,
            faces => faces.into_iter().map(|f| FaceView::new(f, now)).collect::<Vec<_>>(),
        },
    )
}

#[derive(Serialize, Default)]
struct FilterView {
    from: String,
    to: String,
    status: String,
    department: String,
    name: String,
}

pub async fn records(
    pages: web::Data<Pages>,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
    query: web::Query<HistoryQuery>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    let filter_view = FilterView {
        from: query.from.clone().unwrap_or_default(),
        to: query.to.clone().unwrap_or_default(),
        status: query.status.clone().unwrap_or_default(),
        department: query.department.clone().unwrap_or_default(),
        name: query.name.clone().unwrap_or_default(),
    };
    let departments = faces::departments(pool.get_ref()).await?;

    // bad filters are shown on the page instead of failing the request
    let (error, records, total) = match query.into_filter() {
        Ok(filter) => {
            let report = reports::history_report(pool.get_ref(), &filter).await?;
            let total = format_minutes(report.total_work_minutes);
            let records: Vec<EntryView> = report.records.into_iter().map(EntryView::from).collect();
            (None, records, total)
        }
        Err(AppError::BadRequest(message)) => (Some(message), Vec::new(), format_minutes(0)),
        Err(e) => return Err(e),
    };

    pages.render(
        "records.html",
        context! {
            page => "records",
            client => client_config(&config),
            filter => filter_view,
            statuses => status_options(),
            departments => departments,
            error => error,
            count => records.len(),
            total_worked => total,
            records => records,
        },
    )
}

pub async fn app_js() -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType(mime::APPLICATION_JAVASCRIPT_UTF_8))
        .body(APP_JS)
}
