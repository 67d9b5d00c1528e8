use crate::domain::model::OrchestrationReport;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DockError {
    #[error("Split process failed (exit code {exit_code:?}): {diagnostic}")]
    SplitProcessFailed {
        exit_code: Option<i32>,
        diagnostic: String,
    },

    #[error("Chunk discovery failed for {path}: {reason}")]
    ChunkDiscoveryFailed { path: PathBuf, reason: String },

    #[error("No chunk files matched {pattern}")]
    NoChunksProduced { pattern: String },

    #[error("Dock process failed for {chunk} (exit code {exit_code:?}): {diagnostic}")]
    DockProcessFailed {
        chunk: PathBuf,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
        diagnostic: String,
    },

    #[error("Dock process for {chunk} timed out after {timeout:?}")]
    DockTimeout { chunk: PathBuf, timeout: Duration },

    #[error("Dock process exited successfully but {path} was not written")]
    OutputMissing { path: PathBuf },

    #[error("Invalid input {path}: {reason}")]
    InvalidInput { path: PathBuf, reason: String },

    #[error("Worker lost before reporting chunk {index}: {reason}")]
    WorkerLost { index: usize, reason: String },

    /// 對接已完成，只有報告寫入失敗；保留完整結果給呼叫端
    #[error("Docking finished but the report could not be written to {path}: {reason}")]
    ReportWriteFailed {
        path: PathBuf,
        reason: String,
        report: Box<OrchestrationReport>,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV report error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

/// 報告中使用的錯誤種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    SplitProcessFailed,
    ChunkDiscoveryFailed,
    NoChunksProduced,
    DockProcessFailed,
    DockTimeout,
    OutputMissing,
    InvalidInput,
    WorkerLost,
    ReportWriteFailed,
    Io,
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Split,
    Dock,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DockError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DockError::SplitProcessFailed { .. } => ErrorKind::SplitProcessFailed,
            DockError::ChunkDiscoveryFailed { .. } => ErrorKind::ChunkDiscoveryFailed,
            DockError::NoChunksProduced { .. } => ErrorKind::NoChunksProduced,
            DockError::DockProcessFailed { .. } => ErrorKind::DockProcessFailed,
            DockError::DockTimeout { .. } => ErrorKind::DockTimeout,
            DockError::OutputMissing { .. } => ErrorKind::OutputMissing,
            DockError::InvalidInput { .. } => ErrorKind::InvalidInput,
            DockError::WorkerLost { .. } => ErrorKind::WorkerLost,
            DockError::ReportWriteFailed { .. } => ErrorKind::ReportWriteFailed,
            DockError::IoError(_)
            | DockError::SerializationError(_)
            | DockError::CsvError(_) => ErrorKind::Io,
            DockError::ConfigError { .. }
            | DockError::ConfigValidationError { .. }
            | DockError::InvalidConfigValueError { .. } => ErrorKind::Config,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self.kind() {
            ErrorKind::SplitProcessFailed
            | ErrorKind::ChunkDiscoveryFailed
            | ErrorKind::NoChunksProduced
            | ErrorKind::InvalidInput => ErrorCategory::Split,
            ErrorKind::DockProcessFailed
            | ErrorKind::DockTimeout
            | ErrorKind::OutputMissing
            | ErrorKind::WorkerLost => ErrorCategory::Dock,
            ErrorKind::Config => ErrorCategory::Configuration,
            ErrorKind::ReportWriteFailed | ErrorKind::Io => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.kind() {
            ErrorKind::DockTimeout
            | ErrorKind::DockProcessFailed
            | ErrorKind::OutputMissing
            | ErrorKind::ReportWriteFailed => ErrorSeverity::Medium,
            ErrorKind::SplitProcessFailed
            | ErrorKind::ChunkDiscoveryFailed
            | ErrorKind::NoChunksProduced
            | ErrorKind::InvalidInput
            | ErrorKind::Config => ErrorSeverity::High,
            ErrorKind::WorkerLost | ErrorKind::Io => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.kind() {
            ErrorKind::SplitProcessFailed => {
                "Check that the split executable is installed, on PATH, and accepts the input file"
            }
            ErrorKind::ChunkDiscoveryFailed => {
                "Use an empty work directory or a chunk prefix no other file in it starts with"
            }
            ErrorKind::NoChunksProduced => {
                "Verify the split executable writes <prefix><N>.sd files into the work directory"
            }
            ErrorKind::DockProcessFailed => {
                "Inspect the captured stderr and check the receptor and protocol files"
            }
            ErrorKind::DockTimeout => "Raise the per-job timeout or reduce the chunk size",
            ErrorKind::OutputMissing => {
                "Check the output suffix and that the dock executable can write to the work directory"
            }
            ErrorKind::InvalidInput => "Point the input path at an existing, non-empty file",
            ErrorKind::WorkerLost => "Re-run the affected chunks; a worker task panicked",
            ErrorKind::ReportWriteFailed => {
                "Dock outputs are intact; choose a writable report path and re-run only if the report is needed"
            }
            ErrorKind::Io => "Check file permissions and free disk space",
            ErrorKind::Config => "Review the configuration file or command-line arguments",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            DockError::SplitProcessFailed { exit_code, .. } => match exit_code {
                Some(code) => format!("Splitting the input failed (exit code {})", code),
                None => "Splitting the input failed: the split executable could not be run"
                    .to_string(),
            },
            DockError::NoChunksProduced { pattern } => {
                format!("The split step produced no chunks matching {}", pattern)
            }
            DockError::DockTimeout { chunk, timeout } => format!(
                "Docking {} did not finish within {}s",
                chunk.display(),
                timeout.as_secs()
            ),
            DockError::ReportWriteFailed { path, report, .. } => format!(
                "Docked {} chunks but could not write the report to {}",
                report.len(),
                path.display()
            ),
            other => other.to_string(),
        }
    }

    /// 錯誤發生時對接是否已經跑完
    pub fn docking_completed(&self) -> bool {
        matches!(self, DockError::ReportWriteFailed { .. })
    }
}

pub type Result<T> = std::result::Result<T, DockError>;
