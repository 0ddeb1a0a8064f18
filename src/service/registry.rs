use chrono::NaiveDateTime;
use sqlx::SqlitePool;

use crate::error::{AppError, AppResult};
use crate::model::face::{FaceSummary, NewFace};
use crate::store::faces;
use crate::utils::descriptor_cache::DescriptorCache;

/// Store a new template and drop the cached gallery so the next scan sees it.
pub async fn register(
    pool: &SqlitePool,
    cache: &DescriptorCache,
    face: &NewFace,
    now: NaiveDateTime,
) -> AppResult<FaceSummary> {
    let saved = faces::insert(pool, face, now).await?;
    cache.invalidate().await;

    tracing::info!(face_id = saved.id, label = %saved.label, "Registered face");
    Ok(saved)
}

/// Remove a template together with its attendance history.
pub async fn remove(pool: &SqlitePool, cache: &DescriptorCache, face_id: i64) -> AppResult<()> {
    if !faces::delete(pool, face_id).await? {
        return Err(AppError::NotFound("Face not found".to_string()));
    }
    cache.invalidate().await;

    tracing::info!(face_id, "Deleted face");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rules::OfficeHours;
    use crate::service::scan::{self, ScanOutcome};
    use crate::test_support::{new_face, test_pool, ts};

    #[actix_web::test]
    async fn registered_face_is_matchable_immediately() {
        let pool = test_pool().await;
        let cache = DescriptorCache::new(300);
        cache.warmup(&pool).await.unwrap();

        register(&pool, &cache, &new_face("Ana", vec![0.2, 0.2]), ts(2026, 3, 2, 8, 0))
            .await
            .unwrap();

        let res = scan::recognize(&pool, &cache, &[0.2, 0.25]).await.unwrap();
        assert_eq!(res.outcome, ScanOutcome::Recognized);
    }

    #[actix_web::test]
    async fn removed_face_stops_matching() {
        let pool = test_pool().await;
        let cache = DescriptorCache::new(300);
        let ana = register(&pool, &cache, &new_face("Ana", vec![0.2, 0.2]), ts(2026, 3, 2, 8, 0))
            .await
            .unwrap();
        scan::check_in(&pool, &cache, &OfficeHours::default(), &[0.2, 0.2], ts(2026, 3, 2, 9, 0))
            .await
            .unwrap();

        remove(&pool, &cache, ana.id).await.unwrap();

        let res = scan::recognize(&pool, &cache, &[0.2, 0.2]).await.unwrap();
        assert_eq!(res.outcome, ScanOutcome::NotRecognized);
        assert!(matches!(
            remove(&pool, &cache, ana.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
