use crate::core::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    /// Runs extract, transform and load in order; the first error ends the run.
    pub async fn run(&self) -> Result<String> {
        let started = Instant::now();
        tracing::info!("Starting warranty lookup");

        let assets = self.pipeline.extract().await?;
        tracing::debug!("Extracted {} assets", assets.len());

        let rows = self.pipeline.transform(assets).await?;
        tracing::info!("Flattened into {} entitlement rows", rows.len());

        let output_path = self.pipeline.load(rows).await?;
        tracing::debug!("Finished in {:?}", started.elapsed());

        Ok(output_path)
    }
}
