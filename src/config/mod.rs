pub mod toml_config;

use crate::domain::model::{
    DockParams, SplitRequest, CHUNK_EXTENSION, RECOGNIZED_INPUT_EXTENSIONS,
};
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_file_extensions, validate_flag_name, validate_non_empty_string, validate_path,
    validate_positive_number,
};

#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::domain::model::{DockFlags, ReportFormat, ReportSettings, ToolPaths};
#[cfg(feature = "cli")]
use crate::utils::validation::Validate;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;

/// 兩種設定來源共用的檢查
pub fn validate_run_settings(
    request: &SplitRequest,
    params: &DockParams,
    worker_count: usize,
) -> Result<()> {
    let input = request.input.to_string_lossy().into_owned();
    validate_path("split.input", &input)?;
    validate_file_extensions("split.input", &[input], RECOGNIZED_INPUT_EXTENSIONS)?;
    validate_path("split.work_dir", &request.work_dir.to_string_lossy())?;
    validate_positive_number("split.chunk_size", request.chunk_size, 1)?;
    validate_path("dock.receptor_param", &params.receptor_param.to_string_lossy())?;
    validate_path("dock.protocol", &params.dock_param.to_string_lossy())?;
    validate_positive_number("dock.worker_count", worker_count, 1)?;

    // 空後綴會讓輸出檔覆蓋 chunk 本身
    validate_non_empty_string("dock.output_suffix", &params.output_suffix)?;
    if params.output_suffix.ends_with(&format!(".{}", CHUNK_EXTENSION)) {
        return Err(crate::utils::error::DockError::InvalidConfigValueError {
            field: "dock.output_suffix".to_string(),
            value: params.output_suffix.clone(),
            reason: "The extension is appended by the dock executable".to_string(),
        });
    }

    for flag in params.flags.iter() {
        validate_flag_name("dock.flags", &flag.name)?;
    }
    Ok(())
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "splitdock")]
#[command(about = "Split a ligand library into chunks and dock them in parallel")]
pub struct CliConfig {
    /// Multi-record ligand file to split
    #[arg(short, long)]
    pub input: PathBuf,

    /// Receptor parameter file passed to the dock executable (-r)
    #[arg(short, long)]
    pub receptor: PathBuf,

    #[arg(long, default_value = SplitRequest::DEFAULT_WORK_DIR)]
    pub work_dir: PathBuf,

    #[arg(long, default_value = SplitRequest::DEFAULT_CHUNK_PREFIX)]
    pub chunk_prefix: String,

    /// Records per chunk
    #[arg(short = 'n', long, default_value_t = SplitRequest::DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    #[arg(long, default_value = DockParams::DEFAULT_OUTPUT_SUFFIX)]
    pub output_suffix: String,

    /// Docking protocol file passed to the dock executable (-p)
    #[arg(short, long, default_value = DockParams::DEFAULT_DOCK_PARAM)]
    pub protocol: PathBuf,

    #[arg(short, long, default_value_t = crate::core::pool::DEFAULT_WORKER_COUNT)]
    pub workers: usize,

    /// Per-chunk timeout; the dock process is killed when it expires
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Extra dock flag as name=value, or bare name for a switch (repeatable, order kept)
    #[arg(long = "flag")]
    pub flags: Vec<String>,

    #[arg(long, default_value = ToolPaths::DEFAULT_SPLIT_EXECUTABLE)]
    pub split_executable: PathBuf,

    #[arg(long, default_value = ToolPaths::DEFAULT_DOCK_EXECUTABLE)]
    pub dock_executable: PathBuf,

    /// Write the per-chunk report to this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    #[arg(long, default_value = "json")]
    pub report_format: String,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU/memory usage per phase")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    /// Print the commands that would run without spawning anything
    #[arg(long)]
    pub dry_run: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn tools(&self) -> ToolPaths {
        ToolPaths {
            split_executable: self.split_executable.clone(),
            dock_executable: self.dock_executable.clone(),
        }
    }

    fn split_request(&self) -> SplitRequest {
        SplitRequest::new(&self.input)
            .with_work_dir(&self.work_dir)
            .with_chunk_prefix(&self.chunk_prefix)
            .with_chunk_size(self.chunk_size)
    }

    fn dock_params(&self) -> DockParams {
        DockParams::new(&self.receptor)
            .with_output_suffix(&self.output_suffix)
            .with_dock_param(&self.protocol)
            .with_flags(DockFlags::parse_cli(&self.flags))
            .with_timeout(self.timeout_secs.map(std::time::Duration::from_secs))
    }

    fn worker_count(&self) -> usize {
        self.workers
    }

    fn report_settings(&self) -> Option<ReportSettings> {
        self.report.as_ref().map(|path| ReportSettings {
            path: path.clone(),
            format: self.report_format.parse().unwrap_or_default(),
        })
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_run_settings(&self.split_request(), &self.dock_params(), self.workers)?;
        self.report_format.parse::<ReportFormat>()?;
        if self.timeout_secs == Some(0) {
            validate_positive_number("dock.timeout_secs", 0, 1)?;
        }
        Ok(())
    }
}
