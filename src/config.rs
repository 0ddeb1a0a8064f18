use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, ensure};
use chrono::NaiveTime;
use dotenvy::dotenv;

use crate::domain::rules::OfficeHours;

pub const DEFAULT_FACEAPI_URL: &str = "https://unpkg.com/face-api.js@0.22.2/dist/face-api.min.js";
pub const DEFAULT_MODEL_BASE_URL: &str =
    "https://raw.githubusercontent.com/justadudewhohacks/face-api.js/master/weights/";

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: String,
    pub database_url: String,
    pub api_prefix: String,

    pub public_dir: PathBuf,
    pub log_dir: PathBuf,
    pub download_assets: bool,
    pub faceapi_url: String,
    pub model_base_url: String,

    // Rate limiting, 0 disables
    pub rate_api_per_min: u32,
    pub rate_scan_per_min: u32,

    pub descriptor_cache_ttl_secs: u64,
    /// Samples the browser averages into one descriptor on registration.
    pub register_samples: u32,

    pub office_hours: OfficeHours,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:3000".to_string(),
            database_url: "sqlite://face_attendance.db".to_string(),
            api_prefix: "/api".to_string(),
            public_dir: PathBuf::from("public"),
            log_dir: PathBuf::from("logs"),
            download_assets: true,
            faceapi_url: DEFAULT_FACEAPI_URL.to_string(),
            model_base_url: DEFAULT_MODEL_BASE_URL.to_string(),
            rate_api_per_min: 1000,
            rate_scan_per_min: 120,
            descriptor_cache_ttl_secs: 300,
            register_samples: 5,
            office_hours: OfficeHours::default(),
        }
    }
}

fn var_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}

fn time_or(key: &str, default: NaiveTime) -> Result<NaiveTime> {
    match env::var(key) {
        Ok(raw) => NaiveTime::parse_from_str(raw.trim(), "%H:%M")
            .with_context(|| format!("{key} must be HH:MM, got {raw:?}")),
        Err(_) => Ok(default),
    }
}

/// Office hours must run in order within one day.
fn check_office_hours(hours: &OfficeHours) -> Result<()> {
    let late_after = hours.late_after();
    ensure!(
        hours.start <= late_after,
        "GRACE_MINUTES pushes the late threshold past midnight"
    );
    ensure!(
        late_after < hours.absent_after,
        "ABSENT_AFTER ({}) must be later than OFFICE_START plus GRACE_MINUTES ({})",
        hours.absent_after.format("%H:%M"),
        late_after.format("%H:%M")
    );
    ensure!(
        hours.absent_after < hours.end,
        "ABSENT_AFTER ({}) must be earlier than OFFICE_END ({})",
        hours.absent_after.format("%H:%M"),
        hours.end.format("%H:%M")
    );
    ensure!(
        hours.min_work_hours <= 24,
        "MIN_WORK_HOURS must be at most 24, got {}",
        hours.min_work_hours
    );
    Ok(())
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let defaults = Self::default();
        let hours = defaults.office_hours;

        let office_hours = OfficeHours {
            start: time_or("OFFICE_START", hours.start)?,
            grace_minutes: var_or("GRACE_MINUTES", hours.grace_minutes)?,
            end: time_or("OFFICE_END", hours.end)?,
            absent_after: time_or("ABSENT_AFTER", hours.absent_after)?,
            min_work_hours: var_or("MIN_WORK_HOURS", hours.min_work_hours)?,
        };
        check_office_hours(&office_hours)?;

        Ok(Self {
            server_addr: var_or("SERVER_ADDR", defaults.server_addr)?,
            database_url: var_or("DATABASE_URL", defaults.database_url)?,
            api_prefix: var_or("API_PREFIX", defaults.api_prefix)?,

            public_dir: var_or("PUBLIC_DIR", defaults.public_dir)?,
            log_dir: var_or("LOG_DIR", defaults.log_dir)?,
            download_assets: var_or("DOWNLOAD_ASSETS", defaults.download_assets)?,
            faceapi_url: var_or("FACEAPI_URL", defaults.faceapi_url)?,
            model_base_url: var_or("MODEL_BASE_URL", defaults.model_base_url)?,

            rate_api_per_min: var_or("RATE_API_PER_MIN", defaults.rate_api_per_min)?,
            rate_scan_per_min: var_or("RATE_SCAN_PER_MIN", defaults.rate_scan_per_min)?,

            descriptor_cache_ttl_secs: var_or(
                "DESCRIPTOR_CACHE_TTL_SECS",
                defaults.descriptor_cache_ttl_secs,
            )?,
            register_samples: var_or("REGISTER_SAMPLES", defaults.register_samples)?,

            office_hours,
        })
    }
}
