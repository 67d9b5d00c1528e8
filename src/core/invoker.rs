use crate::domain::model::{
    Chunk, DockJob, DockParams, DockResult, CHUNK_EXTENSION, RECOGNIZED_INPUT_EXTENSIONS,
};
use crate::domain::ports::{Invocation, ProcessRunner};
use crate::utils::error::{DockError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// 對單一 chunk 執行外部對接程式
pub struct DockInvoker<R: ProcessRunner> {
    runner: Arc<R>,
    executable: PathBuf,
}

impl<R: ProcessRunner> Clone for DockInvoker<R> {
    fn clone(&self) -> Self {
        Self {
            runner: Arc::clone(&self.runner),
            executable: self.executable.clone(),
        }
    }
}

impl<R: ProcessRunner> DockInvoker<R> {
    pub fn new(runner: Arc<R>, executable: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            executable: executable.into(),
        }
    }

    /// `rbdock -i <chunk> -o <output_base> -r <receptor> -p <protocol> [-flag [value]]...`
    pub fn invocation(&self, chunk: &Chunk, params: &DockParams) -> Invocation {
        let output_base = output_base(&chunk.path, &params.output_suffix);
        Invocation::new(&self.executable)
            .arg("-i")
            .arg(chunk.path.display().to_string())
            .arg("-o")
            .arg(output_base.display().to_string())
            .arg("-r")
            .arg(params.receptor_param.display().to_string())
            .arg("-p")
            .arg(params.dock_param.display().to_string())
            .args(params.flags.to_args())
    }

    pub async fn dock(&self, chunk: &Chunk, params: &DockParams) -> DockResult {
        match self.try_dock(chunk, params).await {
            Ok(output) => {
                tracing::info!(
                    "✅ Chunk {} docked -> {}",
                    chunk.sequence_index,
                    output.display()
                );
                DockResult::docked(chunk.clone(), output)
            }
            Err(e) => {
                tracing::warn!("❌ Chunk {} failed: {}", chunk.sequence_index, e);
                DockResult::failed(chunk.clone(), &e)
            }
        }
    }

    pub async fn dock_job(&self, job: &DockJob) -> DockResult {
        self.dock(&job.chunk, &job.params).await
    }

    async fn try_dock(&self, chunk: &Chunk, params: &DockParams) -> Result<PathBuf> {
        let expected = std::path::absolute(expected_output_path(
            &chunk.path,
            &params.output_suffix,
        ))?;
        let invocation = self.invocation(chunk, params);
        tracing::debug!("Dock command: {}", invocation.display());

        let run = self.runner.run(&invocation);
        let outcome = match params.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, run).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    return Err(DockError::DockTimeout {
                        chunk: chunk.path.clone(),
                        timeout,
                    });
                }
            },
            None => run.await,
        };

        let output = outcome.map_err(|e| DockError::DockProcessFailed {
            chunk: chunk.path.clone(),
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            diagnostic: format!("could not run {}: {}", self.executable.display(), e),
        })?;

        if !output.success() {
            let diagnostic = output.diagnostic();
            return Err(DockError::DockProcessFailed {
                chunk: chunk.path.clone(),
                exit_code: output.exit_code,
                stdout: output.stdout,
                stderr: output.stderr,
                diagnostic,
            });
        }

        // 結束碼為 0 不代表輸出檔真的存在
        if !tokio::fs::try_exists(&expected).await.unwrap_or(false) {
            return Err(DockError::OutputMissing { path: expected });
        }

        Ok(expected)
    }
}

fn base_name(chunk_path: &Path) -> String {
    let recognized = chunk_path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| RECOGNIZED_INPUT_EXTENSIONS.contains(&ext));

    let name = if recognized {
        chunk_path.file_stem()
    } else {
        chunk_path.file_name()
    };
    name.map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Path handed to the dock executable via `-o`; it appends the extension itself.
pub fn output_base(chunk_path: &Path, output_suffix: &str) -> PathBuf {
    let file_name = format!("{}{}", base_name(chunk_path), output_suffix);
    match chunk_path.parent() {
        Some(parent) => parent.join(file_name),
        None => PathBuf::from(file_name),
    }
}

pub fn expected_output_path(chunk_path: &Path, output_suffix: &str) -> PathBuf {
    let file_name = format!(
        "{}{}.{}",
        base_name(chunk_path),
        output_suffix,
        CHUNK_EXTENSION
    );
    match chunk_path.parent() {
        Some(parent) => parent.join(file_name),
        None => PathBuf::from(file_name),
    }
}
