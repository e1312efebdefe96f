use crate::domain::model::{DashboardView, GroupSpec, Ranks, Record, Thresholds};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Supplies the full list of raw protocol records.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<Record>>;
}

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn output_path(&self) -> &str;
    fn thresholds(&self) -> Thresholds;
    fn group_spec(&self) -> GroupSpec;
    fn ranks(&self) -> Ranks;
    /// `None` keeps every chain.
    fn chains(&self) -> Option<&[String]>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<Record>>;
    async fn transform(&self, data: Vec<Record>) -> Result<DashboardView>;
    async fn load(&self, view: DashboardView) -> Result<String>;
}

#[async_trait]
impl<T: RecordSource + ?Sized> RecordSource for std::sync::Arc<T> {
    async fn fetch_all(&self) -> Result<Vec<Record>> {
        (**self).fetch_all().await
    }
}
