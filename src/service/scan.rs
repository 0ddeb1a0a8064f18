use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::domain::matcher::{self, MatchResult, Nearest};
use crate::domain::rules::{CheckInDecision, CheckOutDecision, OfficeHours, decide_check_in, decide_check_out};
use crate::error::AppResult;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::face::{FaceSummary, FaceTemplate};
use crate::store::attendance;
use crate::utils::descriptor_cache::DescriptorCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScanOutcome {
    Recognized,
    NotRecognized,
    CheckedIn,
    AlreadyCheckedIn,
    CheckedOut,
    AlreadyCheckedOut,
    NotCheckedIn,
}

/// Answer to a submitted descriptor. Attendance fields are filled only when a record is involved.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[schema(example = json!({
    "recognized": true,
    "outcome": "checked_in",
    "message": "Ana Silva checked in (late)",
    "face": {"id": 1, "label": "Ana Silva", "employee_id": "EMP-001", "department": "Engineering", "quality": 0.93, "registered_at": "2026-01-05T09:12:44"},
    "distance": 0.3124,
    "confidence": 47.9,
    "date": "2026-03-02",
    "status": "late",
    "time_in": "09:41:00",
    "time_out": null,
    "expected_checkout": "18:10:00",
    "early": null
}))]
pub struct ScanResponse {
    pub recognized: bool,
    pub outcome: ScanOutcome,
    pub message: String,
    pub face: Option<FaceSummary>,
    /// Distance to the nearest template, present whenever the gallery had a candidate.
    pub distance: Option<f32>,
    /// 0..=100, only for recognized faces.
    pub confidence: Option<f32>,
    #[schema(value_type = Option<String>, format = "date")]
    pub date: Option<NaiveDate>,
    pub status: Option<AttendanceStatus>,
    #[schema(value_type = Option<String>)]
    pub time_in: Option<NaiveTime>,
    #[schema(value_type = Option<String>)]
    pub time_out: Option<NaiveTime>,
    #[schema(value_type = Option<String>)]
    pub expected_checkout: Option<NaiveTime>,
    pub early: Option<bool>,
}

impl ScanResponse {
    fn not_recognized(nearest_distance: Option<f32>) -> Self {
        Self {
            recognized: false,
            outcome: ScanOutcome::NotRecognized,
            message: "Face not recognized".to_string(),
            face: None,
            distance: nearest_distance,
            confidence: None,
            date: None,
            status: None,
            time_in: None,
            time_out: None,
            expected_checkout: None,
            early: None,
        }
    }

    fn matched(nearest: &Nearest<'_>, outcome: ScanOutcome, message: String) -> Self {
        Self {
            recognized: true,
            outcome,
            message,
            face: Some(FaceSummary::from(nearest.face)),
            distance: Some(nearest.distance),
            confidence: Some(matcher::confidence(nearest.distance)),
            ..Self::not_recognized(None)
        }
    }

    fn with_record(mut self, record: &AttendanceRecord) -> Self {
        self.date = Some(record.date);
        self.status = Some(record.status);
        self.time_in = Some(record.time_in);
        self.time_out = record.time_out;
        self.expected_checkout = record.expected_checkout;
        self
    }
}

/// Identify only; attendance is untouched.
pub async fn recognize(
    pool: &SqlitePool,
    cache: &DescriptorCache,
    descriptor: &[f32],
) -> AppResult<ScanResponse> {
    let gallery = cache.templates(pool).await?;

    Ok(match matcher::match_face(descriptor, &gallery) {
        MatchResult::Recognized(n) => {
            let message = format!("Recognized {}", n.face.label);
            ScanResponse::matched(&n, ScanOutcome::Recognized, message)
        }
        MatchResult::NotRecognized { nearest_distance } => {
            ScanResponse::not_recognized(nearest_distance)
        }
    })
}

pub async fn check_in(
    pool: &SqlitePool,
    cache: &DescriptorCache,
    hours: &OfficeHours,
    descriptor: &[f32],
    now: NaiveDateTime,
) -> AppResult<ScanResponse> {
    let gallery = cache.templates(pool).await?;
    let nearest = match matcher::match_face(descriptor, &gallery) {
        MatchResult::Recognized(n) => n,
        MatchResult::NotRecognized { nearest_distance } => {
            return Ok(ScanResponse::not_recognized(nearest_distance));
        }
    };

    let face: &FaceTemplate = nearest.face;
    let today = now.date();
    let existing = attendance::find_for_day(pool, face.id, today).await?;

    match decide_check_in(hours, existing.as_ref(), now.time()) {
        CheckInDecision::AlreadyCheckedIn(record) => {
            let message = format!("{} already checked in at {}", face.label, record.time_in);
            Ok(ScanResponse::matched(&nearest, ScanOutcome::AlreadyCheckedIn, message)
                .with_record(record))
        }
        CheckInDecision::Record {
            status,
            expected_checkout,
        } => {
            let record = attendance::insert_check_in(
                pool,
                face.id,
                today,
                now.time(),
                status,
                expected_checkout,
            )
            .await?;

            tracing::info!(face_id = face.id, status = %status, "Checked in");
            let message = format!("{} checked in ({})", face.label, status);
            Ok(ScanResponse::matched(&nearest, ScanOutcome::CheckedIn, message).with_record(&record))
        }
    }
}

pub async fn check_out(
    pool: &SqlitePool,
    cache: &DescriptorCache,
    hours: &OfficeHours,
    descriptor: &[f32],
    now: NaiveDateTime,
) -> AppResult<ScanResponse> {
    let gallery = cache.templates(pool).await?;
    let nearest = match matcher::match_face(descriptor, &gallery) {
        MatchResult::Recognized(n) => n,
        MatchResult::NotRecognized { nearest_distance } => {
            return Ok(ScanResponse::not_recognized(nearest_distance));
        }
    };

    let face = nearest.face;
    let today = now.date();
    let existing = attendance::find_for_day(pool, face.id, today).await?;

    match decide_check_out(hours, existing.as_ref(), now.time()) {
        CheckOutDecision::NotCheckedIn => {
            let message = format!("{} has not checked in today", face.label);
            Ok(ScanResponse::matched(&nearest, ScanOutcome::NotCheckedIn, message))
        }
        CheckOutDecision::AlreadyCheckedOut(record) => Ok(already_checked_out(&nearest, record)),
        CheckOutDecision::Record {
            record,
            status,
            early,
        } => {
            let written = attendance::record_check_out(pool, record.id, now.time(), status).await?;
            if !written {
                // another request checked out in between
                let current = attendance::find_for_day(pool, face.id, today).await?;
                let current = current.as_ref().unwrap_or(record);
                return Ok(already_checked_out(&nearest, current));
            }

            tracing::info!(face_id = face.id, status = %status, early, "Checked out");
            let updated = AttendanceRecord {
                time_out: Some(now.time()),
                status,
                ..record.clone()
            };
            let message = if early {
                format!("{} checked out early ({})", face.label, status)
            } else {
                format!("{} checked out", face.label)
            };

            let mut response =
                ScanResponse::matched(&nearest, ScanOutcome::CheckedOut, message).with_record(&updated);
            response.early = Some(early);
            Ok(response)
        }
    }
}

fn already_checked_out(nearest: &Nearest<'_>, record: &AttendanceRecord) -> ScanResponse {
    let at = record
        .time_out
        .map(|t| t.to_string())
        .unwrap_or_else(|| "an earlier scan".to_string());
    let message = format!("{} already checked out at {}", nearest.face.label, at);
    ScanResponse::matched(nearest, ScanOutcome::AlreadyCheckedOut, message).with_record(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::faces;
    use crate::test_support::{new_face, test_pool, time, ts};

    async fn setup() -> (SqlitePool, DescriptorCache) {
        let pool = test_pool().await;
        faces::insert(&pool, &new_face("Ana", vec![0.0, 0.0, 0.0]), ts(2026, 3, 1, 8, 0))
            .await
            .unwrap();
        faces::insert(&pool, &new_face("Bo", vec![1.0, 1.0, 1.0]), ts(2026, 3, 1, 8, 0))
            .await
            .unwrap();
        (pool, DescriptorCache::new(300))
    }

    const ANA: [f32; 3] = [0.05, 0.0, 0.0];

    #[actix_web::test]
    async fn recognize_has_no_side_effects() {
        let (pool, cache) = setup().await;
        let res = recognize(&pool, &cache, &ANA).await.unwrap();
        assert!(res.recognized);
        assert_eq!(res.outcome, ScanOutcome::Recognized);
        assert_eq!(res.face.unwrap().label, "Ana");
        assert!(res.confidence.unwrap() > 90.0);

        let ana_id = faces::load_templates(&pool).await.unwrap()[0].id;
        assert!(attendance::for_face(&pool, ana_id).await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn unknown_face_is_not_an_error() {
        let (pool, cache) = setup().await;
        let res = check_in(&pool, &cache, &OfficeHours::default(), &[0.5, 0.5, 0.5], ts(2026, 3, 2, 9, 0))
            .await
            .unwrap();
        assert!(!res.recognized);
        assert_eq!(res.outcome, ScanOutcome::NotRecognized);
        assert!(res.distance.unwrap() >= matcher::MATCH_THRESHOLD);
    }

    #[actix_web::test]
    async fn empty_gallery_is_not_recognized() {
        let pool = test_pool().await;
        let cache = DescriptorCache::new(300);
        let res = check_in(&pool, &cache, &OfficeHours::default(), &ANA, ts(2026, 3, 2, 9, 0))
            .await
            .unwrap();
        assert_eq!(res.outcome, ScanOutcome::NotRecognized);
        assert_eq!(res.distance, None);
    }

    #[actix_web::test]
    async fn check_in_statuses_by_time() {
        let hours = OfficeHours::default();
        for (h, m, expected) in [
            (9, 39, AttendanceStatus::Present),
            (9, 41, AttendanceStatus::Late),
            (11, 5, AttendanceStatus::Absent),
        ] {
            let (pool, cache) = setup().await;
            let res = check_in(&pool, &cache, &hours, &ANA, ts(2026, 3, 2, h, m)).await.unwrap();
            assert_eq!(res.outcome, ScanOutcome::CheckedIn);
            assert_eq!(res.status, Some(expected));
            assert_eq!(res.time_in, Some(time(h, m)));
            assert_eq!(
                res.expected_checkout.is_some(),
                expected == AttendanceStatus::Late
            );
        }
    }

    #[actix_web::test]
    async fn second_check_in_returns_original() {
        let (pool, cache) = setup().await;
        let hours = OfficeHours::default();

        check_in(&pool, &cache, &hours, &ANA, ts(2026, 3, 2, 9, 41)).await.unwrap();
        let again = check_in(&pool, &cache, &hours, &ANA, ts(2026, 3, 2, 9, 20)).await.unwrap();

        assert_eq!(again.outcome, ScanOutcome::AlreadyCheckedIn);
        assert_eq!(again.time_in, Some(time(9, 41)));
        assert_eq!(again.status, Some(AttendanceStatus::Late));

        let ana_id = again.face.unwrap().id;
        assert_eq!(attendance::for_face(&pool, ana_id).await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn late_then_early_checkout() {
        let (pool, cache) = setup().await;
        let hours = OfficeHours::default();

        check_in(&pool, &cache, &hours, &ANA, ts(2026, 3, 2, 9, 41)).await.unwrap();
        let out = check_out(&pool, &cache, &hours, &ANA, ts(2026, 3, 2, 18, 5)).await.unwrap();

        assert_eq!(out.outcome, ScanOutcome::CheckedOut);
        assert_eq!(out.status, Some(AttendanceStatus::LateEarlyLeave));
        assert_eq!(out.early, Some(true));
        assert_eq!(out.time_out, Some(time(18, 5)));

        let again = check_out(&pool, &cache, &hours, &ANA, ts(2026, 3, 2, 18, 30)).await.unwrap();
        assert_eq!(again.outcome, ScanOutcome::AlreadyCheckedOut);
        assert_eq!(again.time_out, Some(time(18, 5)));
    }

    #[actix_web::test]
    async fn regular_checkout_keeps_status() {
        let (pool, cache) = setup().await;
        let hours = OfficeHours::default();

        check_in(&pool, &cache, &hours, &ANA, ts(2026, 3, 2, 9, 41)).await.unwrap();
        let out = check_out(&pool, &cache, &hours, &ANA, ts(2026, 3, 2, 18, 30)).await.unwrap();
        assert_eq!(out.status, Some(AttendanceStatus::Late));
        assert_eq!(out.early, Some(false));
    }

    #[actix_web::test]
    async fn checkout_without_check_in() {
        let (pool, cache) = setup().await;
        let out = check_out(&pool, &cache, &OfficeHours::default(), &ANA, ts(2026, 3, 2, 18, 30))
            .await
            .unwrap();
        assert!(out.recognized);
        assert_eq!(out.outcome, ScanOutcome::NotCheckedIn);
        assert_eq!(out.status, None);
    }
}
