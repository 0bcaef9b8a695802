//! Single-flight metadata cache.
//!
//! The shared store doubles as cache and lock service. A miss takes an
//! advisory lock at `<key>.lock` (set-if-absent with expiry), computes the
//! metadata, writes it into the lock slot and renames the slot onto `<key>`,
//! so readers never see a partial entry. Callers that lose the race poll for
//! the committed entry.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use metrics::counter;
use tracing::{debug, info, instrument, warn, Instrument};

use mapdrop_common::{MapdropError, MapdropResult, RasterMetadata};

use crate::store::KeyValueStore;

/// Lock expiry, so a crashed holder cannot block a key forever.
pub const LOCK_TTL: Duration = Duration::from_secs(10);

pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

pub const POLL_ATTEMPTS: u32 = 5;

/// Timing of the lock and of the wait for another caller's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    pub lock_ttl: Duration,
    pub poll_interval: Duration,
    pub poll_attempts: u32,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            lock_ttl: LOCK_TTL,
            poll_interval: POLL_INTERVAL,
            poll_attempts: POLL_ATTEMPTS,
        }
    }
}

/// Key of the lock guarding `key`.
pub fn lock_key(key: &str) -> String {
    format!("{}.lock", key)
}

/// Metadata cache coordinating concurrent computations through a shared store.
#[derive(Clone)]
pub struct MetadataCache {
    store: Arc<dyn KeyValueStore>,
    settings: CacheSettings,
}

impl MetadataCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_settings(store, CacheSettings::default())
    }

    pub fn with_settings(store: Arc<dyn KeyValueStore>, settings: CacheSettings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// Return the cached metadata for `key`, computing it at most once across
    /// all callers sharing the store.
    ///
    /// The lock holder computes and commits on a spawned task, so the entry is
    /// still written when the calling request is dropped. A failed computation
    /// releases the lock and caches nothing. Callers that find the lock taken
    /// wait for the entry and fail with [`MapdropError::LockTimeout`] when it
    /// does not appear in time.
    #[instrument(skip(self, compute))]
    pub async fn get_metadata<F, Fut>(&self, key: &str, compute: F) -> MapdropResult<RasterMetadata>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = MapdropResult<RasterMetadata>> + Send + 'static,
    {
        if let Some(cached) = self.store.get(key).await? {
            counter!("mapdrop_metadata_cache_hits_total").increment(1);
            debug!("Metadata cache hit");
            return Ok(RasterMetadata::from_json(&cached)?);
        }
        counter!("mapdrop_metadata_cache_misses_total").increment(1);

        let lock = lock_key(key);
        let stamp = Utc::now().to_rfc3339();
        if self
            .store
            .set_nx_ex(&lock, &stamp, self.settings.lock_ttl)
            .await?
        {
            debug!(lock = %lock, "Acquired metadata lock");
            let task = tokio::spawn(
                compute_and_commit(self.store.clone(), key.to_string(), lock, compute())
                    .in_current_span(),
            );
            return match task.await {
                Ok(result) => result,
                Err(e) => Err(MapdropError::Internal(format!(
                    "metadata task failed: {}",
                    e
                ))),
            };
        }

        debug!(lock = %lock, "Metadata lock held elsewhere, waiting");
        self.wait_for(key).await
    }

    async fn wait_for(&self, key: &str) -> MapdropResult<RasterMetadata> {
        for attempt in 1..=self.settings.poll_attempts {
            tokio::time::sleep(self.settings.poll_interval).await;
            if let Some(cached) = self.store.get(key).await? {
                debug!(attempt, "Metadata appeared while waiting");
                return Ok(RasterMetadata::from_json(&cached)?);
            }
        }

        counter!("mapdrop_metadata_lock_timeouts_total").increment(1);
        warn!(
            attempts = self.settings.poll_attempts,
            "Timed out waiting for metadata"
        );
        Err(MapdropError::LockTimeout(key.to_string()))
    }
}

async fn compute_and_commit<Fut>(
    store: Arc<dyn KeyValueStore>,
    key: String,
    lock: String,
    computation: Fut,
) -> MapdropResult<RasterMetadata>
where
    Fut: Future<Output = MapdropResult<RasterMetadata>>,
{
    let result = match computation.await {
        Ok(metadata) => commit(store.as_ref(), &key, &lock, &metadata)
            .await
            .map(|_| metadata),
        Err(e) => Err(e),
    };

    if let Err(e) = &result {
        warn!(error = %e, "Metadata computation failed, releasing lock");
        if let Err(del) = store.delete(&lock).await {
            warn!(error = %del, lock = %lock, "Failed to release metadata lock");
        }
    }
    result
}

async fn commit(
    store: &dyn KeyValueStore,
    key: &str,
    lock: &str,
    metadata: &RasterMetadata,
) -> MapdropResult<()> {
    let json = metadata.to_json()?;
    store.set(lock, &json).await?;
    store.rename(lock, key).await?;
    info!(bytes = json.len(), "Cached raster metadata");
    Ok(())
}
