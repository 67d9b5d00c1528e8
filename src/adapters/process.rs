use crate::domain::ports::{Invocation, ProcessOutput, ProcessRunner};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

/// 以 `tokio::process` 執行真正的外部程式
#[derive(Debug, Clone, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        tracing::debug!("Spawning: {}", invocation.display());

        // 被 drop (例如逾時) 時一併終止子行程
        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        let result = ProcessOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        tracing::debug!(
            "{} exited with {:?}",
            invocation.program.display(),
            result.exit_code
        );
        Ok(result)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::utils::error::ErrorKind;

    #[tokio::test]
    async fn test_captures_exit_code_and_streams() {
        let inv = Invocation::new("sh").args(["-c", "echo out; echo err >&2; exit 3"]);
        let output = SystemRunner::new().run(&inv).await.unwrap();

        assert_eq!(output.exit_code, Some(3));
        assert!(!output.success());
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }

    #[tokio::test]
    async fn test_missing_executable_is_io_error() {
        let inv = Invocation::new("/definitely/not/a/real/sdsplit");
        let err = SystemRunner::new().run(&inv).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
