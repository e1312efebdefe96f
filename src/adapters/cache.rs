//! Time-bounded memo in front of a record source.

use crate::domain::model::Record;
use crate::domain::ports::RecordSource;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
struct CacheEntry {
    records: Vec<Record>,
    expires_at: Instant,
}

/// Serves the last successful fetch until it expires.
///
/// The fetch takes no parameters, so a single slot is the whole key space.
/// A zero TTL disables caching. Failed fetches are never cached.
pub struct CachedSource<S> {
    inner: S,
    ttl: Duration,
    entry: Arc<RwLock<Option<CacheEntry>>>,
}

impl<S: RecordSource> CachedSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entry: Arc::new(RwLock::new(None)),
        }
    }

    pub fn with_default_ttl(inner: S) -> Self {
        Self::new(inner, DEFAULT_TTL)
    }

    pub async fn invalidate(&self) {
        *self.entry.write().await = None;
    }

    pub fn is_disabled(&self) -> bool {
        self.ttl == Duration::ZERO
    }

    async fn cached(&self) -> Option<Vec<Record>> {
        let entry = self.entry.read().await;
        entry
            .as_ref()
            .filter(|e| Instant::now() <= e.expires_at)
            .map(|e| e.records.clone())
    }
}

#[async_trait]
impl<S: RecordSource> RecordSource for CachedSource<S> {
    async fn fetch_all(&self) -> Result<Vec<Record>> {
        if self.is_disabled() {
            return self.inner.fetch_all().await;
        }

        if let Some(records) = self.cached().await {
            tracing::debug!("Serving {} protocol record(s) from cache", records.len());
            return Ok(records);
        }

        // Held across the fetch so concurrent views share one upstream call.
        let mut entry = self.entry.write().await;
        if let Some(fresh) = entry.as_ref().filter(|e| Instant::now() <= e.expires_at) {
            return Ok(fresh.records.clone());
        }

        let records = self.inner.fetch_all().await?;
        *entry = Some(CacheEntry {
            records: records.clone(),
            expires_at: Instant::now() + self.ttl,
        });
        Ok(records)
    }
}
