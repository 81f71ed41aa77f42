use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::{PhaseMonitor, PhaseStats};

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: PhaseMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: PhaseMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub fn phases(&self) -> &[PhaseStats] {
        self.monitor.phases()
    }

    pub async fn run(&mut self) -> Result<String> {
        tracing::info!("Starting word cloud ETL process");

        self.monitor.start_phase("extract");
        let extracted = self.pipeline.extract().await?;
        self.monitor.finish_phase();
        tracing::info!(
            "Extracted {} posts from {} file(s)",
            extracted.posts.len(),
            extracted.sources.len()
        );

        self.monitor.start_phase("transform");
        let transformed = self.pipeline.transform(extracted).await?;
        self.monitor.finish_phase();
        tracing::info!(
            "Counted {} words, {} distinct, {} kept",
            transformed.total_words,
            transformed.distinct_words,
            transformed.frequencies.len()
        );

        self.monitor.start_phase("load");
        let output_path = self.pipeline.load(transformed).await?;
        self.monitor.finish_phase();
        tracing::info!("Output saved to: {}", output_path);

        self.monitor.log_final_stats();
        Ok(output_path)
    }
}
