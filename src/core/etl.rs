use crate::core::{Pipeline, RunOutput, RunSummary};
use crate::utils::error::Result;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    /// Runs the stages, then shuts the pipeline down whatever the outcome.
    /// A stage error wins over a shutdown error.
    pub async fn run(mut self) -> Result<RunSummary> {
        let result = self.run_stages().await;

        if let Err(e) = self.pipeline.shutdown().await {
            tracing::warn!("Pipeline shutdown failed: {}", e);
            if result.is_ok() {
                return Err(e);
            }
        }

        result
    }

    async fn run_stages(&mut self) -> Result<RunSummary> {
        tracing::info!("Starting ETL process");

        let extraction = self.pipeline.extract().await?;
        let outcomes = extraction.outcomes;

        if extraction.records.is_empty() {
            tracing::info!("No records extracted, skipping output");
            return Ok(RunSummary {
                output: RunOutput::NoData,
                outcomes,
            });
        }

        println!("\nMerging {} records...", extraction.records.len());
        let table = self.pipeline.transform(extraction.records).await?;
        let rows = table.rows.len();

        let path = self.pipeline.load(table).await?;
        tracing::info!("Output saved to: {}", path.display());

        Ok(RunSummary {
            output: RunOutput::Written { path, rows },
            outcomes,
        })
    }
}
