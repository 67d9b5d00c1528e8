use crate::domain::model::{DockOutcome, OrchestrationReport, ReportFormat};
use crate::utils::error::{DockError, Result};
use serde::Serialize;
use std::path::Path;

/// CSV 報告中每個 chunk 一列
#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    index: usize,
    sequence_index: u64,
    chunk: String,
    status: &'static str,
    output: String,
    error_kind: String,
    exit_code: Option<i32>,
    message: &'a str,
}

pub fn render_json(report: &OrchestrationReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

pub fn render_csv(report: &OrchestrationReport) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    for (index, result) in report.results.iter().enumerate() {
        let row = match &result.outcome {
            DockOutcome::Docked { output } => ReportRow {
                index,
                sequence_index: result.chunk.sequence_index,
                chunk: result.chunk.path.display().to_string(),
                status: "docked",
                output: output.display().to_string(),
                error_kind: String::new(),
                exit_code: None,
                message: "",
            },
            DockOutcome::Failed(failure) => ReportRow {
                index,
                sequence_index: result.chunk.sequence_index,
                chunk: result.chunk.path.display().to_string(),
                status: "failed",
                output: String::new(),
                error_kind: format!("{:?}", failure.kind),
                exit_code: failure.exit_code,
                message: &failure.message,
            },
        };
        writer.serialize(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| DockError::IoError(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| DockError::ConfigError {
        message: format!("CSV report is not valid UTF-8: {}", e),
    })
}

pub async fn write_report(
    report: &OrchestrationReport,
    path: &Path,
    format: ReportFormat,
) -> Result<()> {
    let content = match format {
        ReportFormat::Json => render_json(report)?,
        ReportFormat::Csv => render_csv(report)?,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    tokio::fs::write(path, content).await?;
    tracing::debug!("Report written to {}", path.display());
    Ok(())
}
