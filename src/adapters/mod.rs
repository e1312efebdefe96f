// Adapters layer: concrete record sources and storage backends.

pub mod cache;
pub mod file;
pub mod llama;
pub mod storage;

use crate::domain::ports::RecordSource;
use std::sync::Arc;
use std::time::Duration;

pub use cache::CachedSource;
pub use file::FileSource;
pub use llama::LlamaSource;
pub use storage::LocalStorage;

#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub endpoint: String,
    /// Read this file instead of calling `endpoint`.
    pub input_file: Option<String>,
    pub timeout: Option<Duration>,
    pub cache_ttl: Duration,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            endpoint: llama::DEFAULT_ENDPOINT.to_string(),
            input_file: None,
            timeout: None,
            cache_ttl: cache::DEFAULT_TTL,
        }
    }
}

/// Builds the configured source behind a TTL cache, shareable across views.
pub fn build_source(settings: &SourceSettings) -> Arc<dyn RecordSource> {
    match &settings.input_file {
        Some(path) => {
            tracing::info!("Using protocol file: {}", path);
            Arc::new(CachedSource::new(FileSource::new(path), settings.cache_ttl))
        }
        None => {
            tracing::info!("Using data provider: {}", settings.endpoint);
            let mut source = LlamaSource::new(settings.endpoint.clone());
            if let Some(timeout) = settings.timeout {
                source = source.with_timeout(timeout);
            }
            Arc::new(CachedSource::new(source, settings.cache_ttl))
        }
    }
}
