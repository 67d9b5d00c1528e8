use crate::domain::model::{DockParams, ReportSettings, SplitRequest, ToolPaths};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// 一次外部程式呼叫 (程式路徑加上依序的參數)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// 給日誌與 dry run 使用的可讀形式
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                parts.push(format!("'{}'", arg));
            } else {
                parts.push(arg.clone());
            }
        }
        parts.join(" ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// stderr 優先，其次 stdout，用於錯誤訊息
    pub fn diagnostic(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        self.stdout.trim().to_string()
    }
}

/// Runs one external process to completion.
///
/// Spawn failures (missing executable, permissions) are returned as `Err`;
/// a process that ran and exited non-zero is an `Ok` output with its code.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput>;
}

pub trait ConfigProvider: Send + Sync {
    fn tools(&self) -> ToolPaths;
    fn split_request(&self) -> SplitRequest;
    fn dock_params(&self) -> DockParams;
    fn worker_count(&self) -> usize;
    fn report_settings(&self) -> Option<ReportSettings>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_quotes_whitespace_args() {
        let inv = Invocation::new("sdsplit").args(["-30", "-o tmp/tmp_", "ligands.sd"]);
        assert_eq!(inv.display(), "sdsplit -30 '-o tmp/tmp_' ligands.sd");
    }

    #[test]
    fn test_diagnostic_prefers_stderr() {
        let output = ProcessOutput {
            exit_code: Some(1),
            stdout: "progress".to_string(),
            stderr: "  fatal: receptor missing \n".to_string(),
        };
        assert!(!output.success());
        assert_eq!(output.diagnostic(), "fatal: receptor missing");

        let quiet = ProcessOutput {
            exit_code: Some(2),
            stdout: "only stdout".to_string(),
            stderr: String::new(),
        };
        assert_eq!(quiet.diagnostic(), "only stdout");
    }
}
