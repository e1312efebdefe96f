use crate::domain::model::DashboardView;
use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

pub struct DashboardEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> DashboardEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    /// Extract and transform only; hands the view to an in-process renderer.
    pub async fn preview(&self) -> Result<DashboardView> {
        let started = Instant::now();

        tracing::info!("Extracting protocols...");
        let raw_data = self.pipeline.extract().await?;
        tracing::info!("Extracted {} records", raw_data.len());

        tracing::info!("Building dashboard view...");
        let view = self.pipeline.transform(raw_data).await?;
        tracing::info!(
            "View ready: {} table rows, {} ranked entries ({:?})",
            view.table.len(),
            view.ranked.len(),
            started.elapsed()
        );

        Ok(view)
    }

    pub async fn run(&self) -> Result<String> {
        let view = self.preview().await?;

        tracing::info!("Loading outputs...");
        let output_path = self.pipeline.load(view).await?;
        tracing::info!("Output saved to: {}", output_path);

        Ok(output_path)
    }
}
