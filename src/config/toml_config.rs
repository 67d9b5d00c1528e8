use crate::config::validate_run_settings;
use crate::core::ConfigProvider;
use crate::domain::model::{
    DockFlag, DockFlags, DockParams, ReportFormat, ReportSettings, SplitRequest, ToolPaths,
};
use crate::utils::error::{DockError, Result};
use crate::utils::validation::{validate_path, validate_positive_number, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub tools: Option<ToolsConfig>,
    pub split: SplitConfig,
    pub dock: DockConfig,
    pub report: Option<ReportConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    pub split_executable: Option<String>,
    pub dock_executable: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    pub input: String,
    pub work_dir: Option<String>,
    pub chunk_prefix: Option<String>,
    pub chunk_size: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DockConfig {
    pub receptor_param: String,
    pub protocol: Option<String>,
    pub output_suffix: Option<String>,
    pub worker_count: Option<usize>,
    pub timeout_seconds: Option<u64>,
    /// 依宣告順序傳給對接程式
    pub flags: Option<Vec<DockFlag>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub path: String,
    pub format: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_format: Option<String>, // "compact" 或 "json"
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(DockError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| DockError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${LIGAND_LIBRARY})，未定義的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| DockError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_run_settings(&self.split_request(), &self.dock_params(), self.worker_count())?;

        if let Some(timeout) = self.dock.timeout_seconds {
            validate_positive_number("dock.timeout_seconds", timeout as usize, 1)?;
        }

        if let Some(report) = &self.report {
            validate_path("report.path", &report.path)?;
            if let Some(format) = &report.format {
                format.parse::<ReportFormat>()?;
            }
        }

        if let Some(tools) = &self.tools {
            if let Some(exe) = &tools.split_executable {
                validate_path("tools.split_executable", exe)?;
            }
            if let Some(exe) = &tools.dock_executable {
                validate_path("tools.dock_executable", exe)?;
            }
        }

        Ok(())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.log_format.as_deref())
            .is_some_and(|f| f.eq_ignore_ascii_case("json"))
    }
}

impl ConfigProvider for TomlConfig {
    fn tools(&self) -> ToolPaths {
        let defaults = ToolPaths::default();
        let Some(tools) = &self.tools else {
            return defaults;
        };
        ToolPaths {
            split_executable: tools
                .split_executable
                .as_ref()
                .map(PathBuf::from)
                .unwrap_or(defaults.split_executable),
            dock_executable: tools
                .dock_executable
                .as_ref()
                .map(PathBuf::from)
                .unwrap_or(defaults.dock_executable),
        }
    }

    fn split_request(&self) -> SplitRequest {
        let mut request = SplitRequest::new(&self.split.input);
        if let Some(work_dir) = &self.split.work_dir {
            request = request.with_work_dir(work_dir);
        }
        if let Some(prefix) = &self.split.chunk_prefix {
            request = request.with_chunk_prefix(prefix);
        }
        if let Some(size) = self.split.chunk_size {
            request = request.with_chunk_size(size);
        }
        request
    }

    fn dock_params(&self) -> DockParams {
        let mut params = DockParams::new(&self.dock.receptor_param)
            .with_timeout(self.dock.timeout_seconds.map(Duration::from_secs));
        if let Some(protocol) = &self.dock.protocol {
            params = params.with_dock_param(protocol);
        }
        if let Some(suffix) = &self.dock.output_suffix {
            params = params.with_output_suffix(suffix);
        }
        if let Some(flags) = &self.dock.flags {
            params = params.with_flags(
                flags
                    .iter()
                    .map(|f| (f.name.clone(), f.value.clone()))
                    .collect::<DockFlags>(),
            );
        }
        params
    }

    fn worker_count(&self) -> usize {
        self.dock
            .worker_count
            .unwrap_or(crate::core::pool::DEFAULT_WORKER_COUNT)
    }

    fn report_settings(&self) -> Option<ReportSettings> {
        self.report.as_ref().map(|report| ReportSettings {
            path: PathBuf::from(&report.path),
            format: report
                .format
                .as_deref()
                .and_then(|f| f.parse().ok())
                .unwrap_or_default(),
        })
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
