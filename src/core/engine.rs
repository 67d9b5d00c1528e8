use crate::adapters::report::write_report;
use crate::core::orchestrator::DockOrchestrator;
use crate::domain::model::{
    Chunk, DockParams, OrchestrationReport, ReportSettings, RunStatus, SplitRequest,
    CHUNK_EXTENSION,
};
use crate::domain::ports::{ConfigProvider, Invocation, ProcessRunner};
use crate::utils::error::{DockError, Result};
use crate::utils::monitor::SystemMonitor;
use std::sync::Arc;

/// dry run 時會執行的指令
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub split: Invocation,
    /// 以第一個 chunk 為例的對接指令
    pub first_dock: Invocation,
    pub worker_count: usize,
}

pub struct SplitDockEngine<R: ProcessRunner> {
    orchestrator: DockOrchestrator<R>,
    request: SplitRequest,
    params: DockParams,
    worker_count: usize,
    report: Option<ReportSettings>,
    monitor: SystemMonitor,
}

impl<R: ProcessRunner + 'static> SplitDockEngine<R> {
    pub fn new<C: ConfigProvider>(runner: Arc<R>, config: &C) -> Self {
        Self::new_with_monitoring(runner, config, false)
    }

    pub fn new_with_monitoring<C: ConfigProvider>(
        runner: Arc<R>,
        config: &C,
        monitor_enabled: bool,
    ) -> Self {
        Self {
            orchestrator: DockOrchestrator::new(runner, &config.tools()),
            request: config.split_request(),
            params: config.dock_params(),
            worker_count: config.worker_count(),
            report: config.report_settings(),
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn plan(&self) -> RunPlan {
        let first_chunk = Chunk {
            source_file: self.request.input.clone(),
            sequence_index: 1,
            path: self.request.work_dir.join(format!(
                "{}1.{}",
                self.request.chunk_prefix, CHUNK_EXTENSION
            )),
        };

        RunPlan {
            split: self.orchestrator.splitter().invocation(&self.request),
            first_dock: self
                .orchestrator
                .invoker()
                .invocation(&first_chunk, &self.params),
            worker_count: self.worker_count,
        }
    }

    pub async fn run(&self) -> Result<OrchestrationReport> {
        tracing::info!("Starting split-and-dock run");
        self.monitor.log_stats("Startup");

        // Split
        let chunks = self.orchestrator.split(&self.request).await?;
        self.monitor.log_stats("Split");

        // Dock
        let report = self
            .orchestrator
            .dock_all(&chunks, self.params.clone(), self.worker_count)
            .await;
        self.monitor.log_stats("Dock");

        match report.status() {
            RunStatus::AllDocked => {
                tracing::info!("All {} chunks docked", report.len());
            }
            RunStatus::PartiallyFailed { failed, total } => {
                tracing::warn!("{} of {} chunks failed", failed, total);
            }
            RunStatus::AllFailed => {
                tracing::error!("Every chunk failed to dock");
            }
        }

        self.monitor.log_final_stats();

        // Report
        if let Some(settings) = &self.report {
            if let Err(e) = write_report(&report, &settings.path, settings.format).await {
                tracing::error!(
                    "❌ Failed to write report to {}: {}",
                    settings.path.display(),
                    e
                );
                return Err(DockError::ReportWriteFailed {
                    path: settings.path.clone(),
                    reason: e.to_string(),
                    report: Box::new(report),
                });
            }
            tracing::info!("📁 Report saved to: {}", settings.path.display());
        }

        Ok(report)
    }
}
