use crate::core::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

/// 驅動 extract → transform → load 的小引擎
pub struct EnrichEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EnrichEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        let started = Instant::now();
        tracing::info!("▶️ Starting prospect enrichment...");

        tracing::info!("📄 Extracting records...");
        let batch = self.pipeline.extract().await?;
        tracing::info!("📄 Extracted {} records", batch.records.len());

        tracing::info!("✨ Enriching records...");
        let enriched = self.pipeline.transform(batch).await?;
        tracing::info!("✨ Enriched {} records", enriched.rows.len());

        tracing::info!("💾 Writing output...");
        let output_path = self.pipeline.load(enriched).await?;
        tracing::info!(
            "💾 Output saved to: {} ({:.1}s total)",
            output_path,
            started.elapsed().as_secs_f64()
        );

        Ok(output_path)
    }
}
