use crate::adapters::llama::parse_protocols;
use crate::domain::model::Record;
use crate::domain::ports::RecordSource;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// Reads a saved `/protocols` payload from disk, for offline runs.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RecordSource for FileSource {
    async fn fetch_all(&self) -> Result<Vec<Record>> {
        tracing::debug!("Reading protocols from: {}", self.path.display());
        let bytes = tokio::fs::read(&self.path).await?;
        let payload: serde_json::Value = serde_json::from_slice(&bytes)?;
        parse_protocols(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::LensError;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_reads_protocol_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("protocols.json");
        std::fs::write(
            &path,
            r#"[{"name": "Curve", "tvl": 2e9, "mcap": 6e8, "chain": "Multi-Chain"}]"#,
        )
        .unwrap();

        let records = FileSource::new(&path).fetch_all().await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let result = FileSource::new(dir.path().join("absent.json"))
            .fetch_all()
            .await;
        assert!(matches!(result, Err(LensError::IoError(_))));
    }
}
