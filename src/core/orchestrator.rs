use crate::core::invoker::DockInvoker;
use crate::core::pool::WorkerPool;
use crate::core::splitter::ChunkSplitter;
use crate::domain::model::{Chunk, DockParams, OrchestrationReport, SplitRequest, ToolPaths};
use crate::domain::ports::ProcessRunner;
use crate::utils::error::Result;
use std::sync::Arc;

/// 先切分、再平行對接；切分失敗時不會啟動任何對接
pub struct DockOrchestrator<R: ProcessRunner> {
    splitter: ChunkSplitter<R>,
    pool: WorkerPool<R>,
}

impl<R: ProcessRunner + 'static> DockOrchestrator<R> {
    pub fn new(runner: Arc<R>, tools: &ToolPaths) -> Self {
        let splitter = ChunkSplitter::new(Arc::clone(&runner), &tools.split_executable);
        let invoker = DockInvoker::new(runner, &tools.dock_executable);
        Self {
            splitter,
            pool: WorkerPool::new(invoker),
        }
    }

    pub fn splitter(&self) -> &ChunkSplitter<R> {
        &self.splitter
    }

    pub fn invoker(&self) -> &DockInvoker<R> {
        self.pool.invoker()
    }

    pub async fn split(&self, request: &SplitRequest) -> Result<Vec<Chunk>> {
        self.splitter.split(request).await
    }

    pub async fn dock_all(
        &self,
        chunks: &[Chunk],
        params: DockParams,
        worker_count: usize,
    ) -> OrchestrationReport {
        self.pool.dock_all(chunks, params, worker_count).await
    }

    pub async fn split_and_dock_all(
        &self,
        request: &SplitRequest,
        params: DockParams,
        worker_count: usize,
    ) -> Result<OrchestrationReport> {
        // 所有 chunk 檔寫完並被找到之後才開始對接
        let chunks = self.splitter.split(request).await?;
        Ok(self.pool.dock_all(&chunks, params, worker_count).await)
    }
}
