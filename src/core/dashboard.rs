use crate::core::aggregate::rank_groups;
use crate::core::export::{self, BUNDLE_FILE};
use crate::core::normalize::{chain_options, filter_chains, normalize_and_filter};
use crate::domain::model::{DashboardView, Record};
use crate::domain::ports::{ConfigProvider, Pipeline, RecordSource, Storage};
use crate::utils::error::Result;

/// Fetches protocols, builds one dashboard view and stores its bundle.
pub struct DashboardPipeline<R: RecordSource, S: Storage, C: ConfigProvider> {
    source: R,
    storage: S,
    config: C,
}

impl<R: RecordSource, S: Storage, C: ConfigProvider> DashboardPipeline<R, S, C> {
    pub fn new(source: R, storage: S, config: C) -> Self {
        Self {
            source,
            storage,
            config,
        }
    }

    /// The synchronous part of a run: normalize, select chains, group and rank.
    pub fn build_view(&self, data: &[Record]) -> DashboardView {
        let normalized = normalize_and_filter(data, &self.config.thresholds());

        let (chains, selection) = match self.config.chains() {
            Some(chains) => (chains.to_vec(), filter_chains(&normalized.records, chains)),
            None => (Vec::new(), normalized.records.clone()),
        };

        let group_spec = self.config.group_spec();
        let ranked = rank_groups(&selection, &group_spec, &self.config.ranks());

        DashboardView {
            generated_at: chrono::Utc::now(),
            group_spec,
            chains,
            chain_options: chain_options(&normalized.records),
            table: normalized.records,
            selection,
            ranked,
            diagnostics: normalized.diagnostics,
        }
    }
}

#[async_trait::async_trait]
impl<R: RecordSource, S: Storage, C: ConfigProvider> Pipeline for DashboardPipeline<R, S, C> {
    async fn extract(&self) -> Result<Vec<Record>> {
        self.source.fetch_all().await
    }

    async fn transform(&self, data: Vec<Record>) -> Result<DashboardView> {
        let view = self.build_view(&data);
        tracing::info!(
            "{} of {} protocols kept ({} malformed, {} unvalued, {} below thresholds)",
            view.diagnostics.retained,
            view.diagnostics.input,
            view.diagnostics.malformed,
            view.diagnostics.non_positive,
            view.diagnostics.below_threshold
        );
        Ok(view)
    }

    async fn load(&self, view: DashboardView) -> Result<String> {
        let bundle = export::bundle(&view)?;
        tracing::debug!("Writing {} ({} bytes)", BUNDLE_FILE, bundle.len());
        self.storage.write_file(BUNDLE_FILE, &bundle).await?;
        Ok(format!("{}/{}", self.config.output_path(), BUNDLE_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{GroupSpec, Ranks, Thresholds};
    use crate::utils::error::LensError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                LensError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct StaticSource(serde_json::Value);

    #[async_trait]
    impl RecordSource for StaticSource {
        async fn fetch_all(&self) -> Result<Vec<Record>> {
            crate::adapters::llama::parse_protocols(self.0.clone())
        }
    }

    struct MockConfig {
        chains: Option<Vec<String>>,
        top_n: usize,
    }

    impl ConfigProvider for MockConfig {
        fn output_path(&self) -> &str {
            "test_output"
        }

        fn thresholds(&self) -> Thresholds {
            Thresholds::default()
        }

        fn group_spec(&self) -> GroupSpec {
            GroupSpec::chain_category()
        }

        fn ranks(&self) -> Ranks {
            Ranks::top(self.top_n)
        }

        fn chains(&self) -> Option<&[String]> {
            self.chains.as_deref()
        }
    }

    fn protocols() -> serde_json::Value {
        json!([
            {"name": "Lido", "slug": "lido", "tvl": 3e10, "mcap": 2e9, "chain": "Ethereum", "category": "Liquid Staking"},
            {"name": "Aave", "slug": "aave", "tvl": 1e10, "mcap": 4e9, "chain": "Ethereum", "category": "Lending"},
            {"name": "Spark", "slug": "spark", "tvl": 5e9, "mcap": 1e9, "chain": "Ethereum", "category": "Lending"},
            {"name": "Jito", "slug": "jito", "tvl": 2e9, "mcap": 3e8, "chain": "Solana", "category": "Liquid Staking"},
            {"name": "Osmosis", "slug": "osmosis", "tvl": 1e8, "mcap": 5e8, "chain": "Osmosis", "category": "Dexes"},
            {"name": "Broken", "slug": "broken", "tvl": "N/A", "mcap": 1e9, "chain": "Ethereum", "category": "Dexes"}
        ])
    }

    #[tokio::test]
    async fn test_transform_builds_view() {
        let config = MockConfig {
            chains: Some(vec!["Ethereum".to_string(), "Solana".to_string()]),
            top_n: 1,
        };
        let pipeline =
            DashboardPipeline::new(StaticSource(protocols()), MockStorage::new(), config);

        let raw = pipeline.extract().await.unwrap();
        let view = pipeline.transform(raw).await.unwrap();

        assert_eq!(view.table.len(), 5);
        assert_eq!(view.table[0].name, "Aave");
        assert_eq!(view.selection.len(), 4);
        // the picker offers every retained chain, not just the selected ones
        assert_eq!(view.chain_options, vec!["Ethereum", "Osmosis", "Solana"]);
        assert_eq!(view.diagnostics.malformed, 1);

        let ranked: Vec<&str> = view.ranked.iter().map(|e| e.record.name.as_str()).collect();
        assert_eq!(ranked, vec!["Aave", "Lido", "Jito"]);
    }

    #[tokio::test]
    async fn test_all_chains_when_unselected() {
        let config = MockConfig {
            chains: None,
            top_n: 20,
        };
        let pipeline =
            DashboardPipeline::new(StaticSource(protocols()), MockStorage::new(), config);

        let raw = pipeline.extract().await.unwrap();
        let view = pipeline.transform(raw).await.unwrap();

        assert!(view.chains.is_empty());
        assert_eq!(view.selection, view.table);
        assert_eq!(view.ranked.len(), 5);
    }

    #[tokio::test]
    async fn test_load_writes_bundle() {
        let storage = MockStorage::new();
        let config = MockConfig {
            chains: None,
            top_n: 3,
        };
        let pipeline = DashboardPipeline::new(StaticSource(protocols()), storage.clone(), config);

        let raw = pipeline.extract().await.unwrap();
        let view = pipeline.transform(raw).await.unwrap();
        let path = pipeline.load(view).await.unwrap();

        assert_eq!(path, "test_output/dashboard.zip");
        assert!(!storage.read_file(BUNDLE_FILE).await.unwrap().is_empty());
    }
}
