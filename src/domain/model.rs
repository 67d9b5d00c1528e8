use crate::utils::error::{DockError, ErrorKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// 切分程式輸出的檔案副檔名，也是對接輸出的副檔名
pub const CHUNK_EXTENSION: &str = "sd";

/// 可從 chunk 檔名剝除的輸入副檔名
pub const RECOGNIZED_INPUT_EXTENSIONS: &[&str] = &["sd", "sdf"];

/// SD 檔中每筆記錄的結束行
pub const RECORD_TERMINATOR: &str = "$$$$";

/// 外部程式路徑；預設從 PATH 尋找
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolPaths {
    pub split_executable: PathBuf,
    pub dock_executable: PathBuf,
}

impl ToolPaths {
    pub const DEFAULT_SPLIT_EXECUTABLE: &'static str = "sdsplit";
    pub const DEFAULT_DOCK_EXECUTABLE: &'static str = "rbdock";
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            split_executable: PathBuf::from(Self::DEFAULT_SPLIT_EXECUTABLE),
            dock_executable: PathBuf::from(Self::DEFAULT_DOCK_EXECUTABLE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitRequest {
    pub input: PathBuf,
    pub work_dir: PathBuf,
    pub chunk_prefix: String,
    /// 每個 chunk 最多的記錄數
    pub chunk_size: usize,
}

impl SplitRequest {
    pub const DEFAULT_WORK_DIR: &'static str = "tmp";
    pub const DEFAULT_CHUNK_PREFIX: &'static str = "tmp_";
    pub const DEFAULT_CHUNK_SIZE: usize = 30;

    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            work_dir: PathBuf::from(Self::DEFAULT_WORK_DIR),
            chunk_prefix: Self::DEFAULT_CHUNK_PREFIX.to_string(),
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    pub fn with_chunk_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.chunk_prefix = prefix.into();
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Json,
    Csv,
}

impl std::str::FromStr for ReportFormat {
    type Err = DockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "csv" => Ok(ReportFormat::Csv),
            other => Err(DockError::InvalidConfigValueError {
                field: "report.format".to_string(),
                value: other.to_string(),
                reason: "Unsupported format. Valid formats: json, csv".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSettings {
    pub path: PathBuf,
    pub format: ReportFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub source_file: PathBuf,
    /// 1 起算，來自檔名中的數字後綴
    pub sequence_index: u64,
    pub path: PathBuf,
}

impl Chunk {
    /// 計算 chunk 內的記錄數 (僅供報告參考，不做格式驗證)
    pub fn record_count(&self) -> std::io::Result<usize> {
        count_records(&self.path)
    }
}

pub fn count_records(path: &Path) -> std::io::Result<usize> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .filter(|line| line.trim_end() == RECORD_TERMINATOR)
        .count())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockFlag {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

impl DockFlag {
    pub fn is_switch(&self) -> bool {
        self.value.is_empty()
    }
}

/// Ordered `-name value` flags; an empty value is emitted as a bare `-name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DockFlags(Vec<DockFlag>);

impl DockFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    pub fn switch(self, name: impl Into<String>) -> Self {
        self.flag(name, "")
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push(DockFlag {
            name: name.into(),
            value: value.into(),
        });
    }

    /// 解析命令列形式 `name=value` 或單獨的 `name`
    pub fn parse_cli(entries: &[String]) -> Self {
        let mut flags = Self::new();
        for entry in entries {
            match entry.split_once('=') {
                Some((name, value)) => flags.push(name.trim(), value.trim()),
                None => flags.push(entry.trim(), ""),
            }
        }
        flags
    }

    pub fn iter(&self) -> impl Iterator<Item = &DockFlag> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 依序展開成命令列參數
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.0.len() * 2);
        for flag in &self.0 {
            args.push(format!("-{}", flag.name));
            if !flag.is_switch() {
                args.push(flag.value.clone());
            }
        }
        args
    }
}

impl FromIterator<(String, String)> for DockFlags {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut flags = Self::new();
        for (name, value) in iter {
            flags.push(name, value);
        }
        flags
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockParams {
    pub receptor_param: PathBuf,
    pub output_suffix: String,
    pub dock_param: PathBuf,
    pub flags: DockFlags,
    /// 單一 job 的逾時；`None` 表示無限等待
    pub timeout: Option<Duration>,
}

impl DockParams {
    pub const DEFAULT_OUTPUT_SUFFIX: &'static str = "_out";
    pub const DEFAULT_DOCK_PARAM: &'static str = "dock.prm";

    pub fn new(receptor_param: impl Into<PathBuf>) -> Self {
        Self {
            receptor_param: receptor_param.into(),
            output_suffix: Self::DEFAULT_OUTPUT_SUFFIX.to_string(),
            dock_param: PathBuf::from(Self::DEFAULT_DOCK_PARAM),
            flags: DockFlags::new(),
            timeout: None,
        }
    }

    pub fn with_output_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.output_suffix = suffix.into();
        self
    }

    pub fn with_dock_param(mut self, dock_param: impl Into<PathBuf>) -> Self {
        self.dock_param = dock_param.into();
        self
    }

    pub fn with_flags(mut self, flags: DockFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Clone)]
pub struct DockJob {
    /// Chunk 在輸入序列中的位置 (0 起算)
    pub index: usize,
    pub chunk: Chunk,
    pub params: Arc<DockParams>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockFailure {
    pub kind: ErrorKind,
    pub exit_code: Option<i32>,
    pub message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stderr: String,
}

impl From<&DockError> for DockFailure {
    fn from(err: &DockError) -> Self {
        let (exit_code, stdout, stderr) = match err {
            DockError::DockProcessFailed {
                exit_code,
                stdout,
                stderr,
                ..
            } => (*exit_code, stdout.clone(), stderr.clone()),
            _ => (None, String::new(), String::new()),
        };

        Self {
            kind: err.kind(),
            exit_code,
            message: err.to_string(),
            stdout,
            stderr,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DockOutcome {
    Docked { output: PathBuf },
    Failed(DockFailure),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockResult {
    pub chunk: Chunk,
    #[serde(flatten)]
    pub outcome: DockOutcome,
}

impl DockResult {
    pub fn docked(chunk: Chunk, output: PathBuf) -> Self {
        Self {
            chunk,
            outcome: DockOutcome::Docked { output },
        }
    }

    pub fn failed(chunk: Chunk, err: &DockError) -> Self {
        Self {
            chunk,
            outcome: DockOutcome::Failed(DockFailure::from(err)),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, DockOutcome::Docked { .. })
    }

    pub fn output(&self) -> Option<&Path> {
        match &self.outcome {
            DockOutcome::Docked { output } => Some(output),
            DockOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&DockFailure> {
        match &self.outcome {
            DockOutcome::Docked { .. } => None,
            DockOutcome::Failed(failure) => Some(failure),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    AllDocked,
    PartiallyFailed { failed: usize, total: usize },
    AllFailed,
}

/// Results index-aligned with the chunk sequence that produced them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationReport {
    pub results: Vec<DockResult>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl OrchestrationReport {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn status(&self) -> RunStatus {
        let total = self.results.len();
        let failed = self.results.iter().filter(|r| !r.is_success()).count();
        match failed {
            0 => RunStatus::AllDocked,
            n if n == total => RunStatus::AllFailed,
            n => RunStatus::PartiallyFailed { failed: n, total },
        }
    }

    pub fn outputs(&self) -> Vec<&Path> {
        self.results.iter().filter_map(DockResult::output).collect()
    }

    pub fn failures(&self) -> Vec<(&Chunk, &DockFailure)> {
        self.results
            .iter()
            .filter_map(|r| r.failure().map(|f| (&r.chunk, f)))
            .collect()
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
