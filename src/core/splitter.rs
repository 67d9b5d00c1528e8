use crate::domain::model::{Chunk, SplitRequest, CHUNK_EXTENSION};
use crate::domain::ports::{Invocation, ProcessRunner};
use crate::utils::error::{DockError, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// 呼叫外部切分程式，把一個大的分子集合檔切成多個 chunk 檔
pub struct ChunkSplitter<R: ProcessRunner> {
    runner: Arc<R>,
    executable: PathBuf,
}

impl<R: ProcessRunner> Clone for ChunkSplitter<R> {
    fn clone(&self) -> Self {
        Self {
            runner: Arc::clone(&self.runner),
            executable: self.executable.clone(),
        }
    }
}

impl<R: ProcessRunner> ChunkSplitter<R> {
    pub fn new(runner: Arc<R>, executable: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            executable: executable.into(),
        }
    }

    /// `sdsplit -<n> '-o <dir>/<prefix>' <input>`
    pub fn invocation(&self, request: &SplitRequest) -> Invocation {
        let output_root = request.work_dir.join(&request.chunk_prefix);
        Invocation::new(&self.executable)
            .arg(format!("-{}", request.chunk_size))
            .arg(format!("-o {}", output_root.display()))
            .arg(request.input.display().to_string())
    }

    pub async fn split(&self, request: &SplitRequest) -> Result<Vec<Chunk>> {
        if request.chunk_size == 0 {
            return Err(DockError::InvalidConfigValueError {
                field: "split.chunk_size".to_string(),
                value: "0".to_string(),
                reason: "Chunk size must be at least 1".to_string(),
            });
        }
        check_input(&request.input).await?;

        tokio::fs::create_dir_all(&request.work_dir).await?;
        ensure_no_existing_chunks(&request.work_dir, &request.chunk_prefix).await?;

        let invocation = self.invocation(request);
        tracing::info!(
            "✂️ Splitting {} into chunks of {} records",
            request.input.display(),
            request.chunk_size
        );
        tracing::debug!("Split command: {}", invocation.display());

        let output = self.runner.run(&invocation).await.map_err(|e| {
            DockError::SplitProcessFailed {
                exit_code: None,
                diagnostic: format!("could not run {}: {}", self.executable.display(), e),
            }
        })?;

        if !output.success() {
            return Err(DockError::SplitProcessFailed {
                exit_code: output.exit_code,
                diagnostic: output.diagnostic(),
            });
        }

        let chunks =
            discover_chunks(&request.work_dir, &request.chunk_prefix, &request.input).await?;
        tracing::info!("✂️ Split produced {} chunks", chunks.len());
        Ok(chunks)
    }
}

async fn check_input(input: &Path) -> Result<()> {
    let metadata = match tokio::fs::metadata(input).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(DockError::InvalidInput {
                path: input.to_path_buf(),
                reason: "file does not exist".to_string(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    if !metadata.is_file() {
        return Err(DockError::InvalidInput {
            path: input.to_path_buf(),
            reason: "not a regular file".to_string(),
        });
    }
    if metadata.len() == 0 {
        return Err(DockError::InvalidInput {
            path: input.to_path_buf(),
            reason: "file is empty".to_string(),
        });
    }
    Ok(())
}

/// 目錄中已有同前綴的 `.sd` 檔時，切分後無法分辨哪些 chunk 屬於這次輸入
async fn ensure_no_existing_chunks(work_dir: &Path, prefix: &str) -> Result<()> {
    let dotted_ext = format!(".{}", CHUNK_EXTENSION);

    let mut entries = tokio::fs::read_dir(work_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        if name.starts_with(prefix)
            && name.ends_with(&dotted_ext)
            && entry.file_type().await?.is_file()
        {
            return Err(DockError::ChunkDiscoveryFailed {
                path: entry.path(),
                reason: format!(
                    "work directory already holds '{}*{}' files from an earlier run",
                    prefix, dotted_ext
                ),
            });
        }
    }
    Ok(())
}

/// Finds `{prefix}<N>.sd` files in `work_dir`, ordered by `N` numerically.
///
/// Any other `{prefix}*.sd` file makes the set ambiguous and is rejected.
pub async fn discover_chunks(work_dir: &Path, prefix: &str, source: &Path) -> Result<Vec<Chunk>> {
    let mut chunks = Vec::new();
    let mut seen = HashSet::new();
    let dotted_ext = format!(".{}", CHUNK_EXTENSION);

    let mut entries = tokio::fs::read_dir(work_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        if !name.starts_with(prefix) || !name.ends_with(&dotted_ext) {
            continue;
        }
        if !entry.file_type().await?.is_file() {
            continue;
        }

        let path = entry.path();
        let sequence_index = parse_sequence_index(&name, prefix, &dotted_ext).ok_or_else(|| {
            DockError::ChunkDiscoveryFailed {
                path: path.clone(),
                reason: format!("no numeric suffix after prefix '{}'", prefix),
            }
        })?;

        if !seen.insert(sequence_index) {
            return Err(DockError::ChunkDiscoveryFailed {
                path,
                reason: format!("duplicate chunk number {}", sequence_index),
            });
        }

        chunks.push(Chunk {
            source_file: source.to_path_buf(),
            sequence_index,
            path,
        });
    }

    if chunks.is_empty() {
        return Err(DockError::NoChunksProduced {
            pattern: format!("{}/{}*{}", work_dir.display(), prefix, dotted_ext),
        });
    }

    chunks.sort_by_key(|chunk| chunk.sequence_index);
    Ok(chunks)
}

fn parse_sequence_index(name: &str, prefix: &str, dotted_ext: &str) -> Option<u64> {
    let digits = name.strip_prefix(prefix)?.strip_suffix(dotted_ext)?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
