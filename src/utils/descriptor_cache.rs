use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::future::Cache;
use sqlx::SqlitePool;

use crate::error::AppResult;
use crate::model::face::FaceTemplate;
use crate::store::faces;

const GALLERY_KEY: &str = "gallery";

/// Snapshot of every stored template, shared by all scan requests.
///
/// Writers call [`DescriptorCache::invalidate`] after touching the `faces` table;
/// the TTL bounds staleness if a write happens out of band.
///
/// Every invalidation bumps `generation`. A snapshot read before a bump is never
/// left in the cache afterwards, however the reader and writer interleave.
pub struct DescriptorCache {
    inner: Cache<&'static str, Arc<Vec<FaceTemplate>>>,
    generation: AtomicU64,
}

impl DescriptorCache {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            inner: Cache::builder()
                .time_to_live(Duration::from_secs(ttl_secs.max(1)))
                .build(),
            generation: AtomicU64::new(0),
        }
    }

    /// Cached gallery, loading it from storage on a miss.
    pub async fn templates(&self, pool: &SqlitePool) -> AppResult<Arc<Vec<FaceTemplate>>> {
        if let Some(gallery) = self.inner.get(&GALLERY_KEY).await {
            return Ok(gallery);
        }

        let seen = self.generation.load(Ordering::SeqCst);
        let gallery = Arc::new(faces::load_templates(pool).await?);
        self.publish(seen, gallery.clone()).await;
        Ok(gallery)
    }

    /// Cache a snapshot loaded while the generation was `seen`.
    async fn publish(&self, seen: u64, gallery: Arc<Vec<FaceTemplate>>) {
        self.inner.insert(GALLERY_KEY, gallery).await;
        // a writer bumped after our read; its own invalidate may already have run
        if self.generation.load(Ordering::SeqCst) != seen {
            self.inner.invalidate(&GALLERY_KEY).await;
        }
    }

    pub async fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.invalidate(&GALLERY_KEY).await;
    }

    /// Load the gallery ahead of the first scan.
    pub async fn warmup(&self, pool: &SqlitePool) -> anyhow::Result<()> {
        let gallery = self
            .templates(pool)
            .await
            .map_err(|e| anyhow::anyhow!("descriptor cache warmup failed: {e:?}"))?;

        log::info!("Descriptor cache warmup complete: {} templates", gallery.len());
        Ok(())
    }
}
