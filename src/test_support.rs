//! Builders shared by the unit and HTTP tests.

use actix_web::web::Data;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db::init_db;
use crate::model::face::NewFace;
use crate::pages::Pages;
use crate::utils::clock::Clock;
use crate::utils::descriptor_cache::DescriptorCache;

pub async fn test_pool() -> SqlitePool {
    init_db("sqlite::memory:").await.unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
    date(y, mo, d).and_time(time(h, mi))
}

pub fn new_face(label: &str, descriptor: Vec<f32>) -> NewFace {
    NewFace {
        label: label.to_string(),
        employee_id: None,
        department: None,
        descriptor,
        quality: None,
    }
}

/// Config with limiters off and no asset downloads.
pub fn test_config() -> Config {
    Config {
        rate_api_per_min: 0,
        rate_scan_per_min: 0,
        download_assets: false,
        ..Config::default()
    }
}

/// Everything the handlers pull out of app data, sharing one in-memory pool.
pub struct TestState {
    pub config: Config,
    pub pool: SqlitePool,
    pub cache: Data<DescriptorCache>,
    pub clock: Data<Clock>,
    pub pages: Data<Pages>,
}

impl TestState {
    pub async fn at(now: NaiveDateTime) -> Self {
        let config = test_config();
        let pool = test_pool().await;
        TestState {
            cache: Data::new(DescriptorCache::new(config.descriptor_cache_ttl_secs)),
            clock: Data::new(Clock::Fixed(now)),
            pages: Data::new(Pages::new().unwrap()),
            config,
            pool,
        }
    }
}
