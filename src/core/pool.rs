use crate::core::invoker::DockInvoker;
use crate::domain::model::{Chunk, DockJob, DockParams, DockResult, OrchestrationReport};
use crate::domain::ports::ProcessRunner;
use crate::utils::error::DockError;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

pub const DEFAULT_WORKER_COUNT: usize = 2;

/// Runs dock jobs with at most `worker_count` external processes in flight.
///
/// Workers pull jobs from a shared queue in chunk order; results are written
/// into a slot per chunk so the report order never depends on completion order.
/// A failed job never cancels its siblings and is not retried.
pub struct WorkerPool<R: ProcessRunner> {
    invoker: DockInvoker<R>,
}

impl<R: ProcessRunner> Clone for WorkerPool<R> {
    fn clone(&self) -> Self {
        Self {
            invoker: self.invoker.clone(),
        }
    }
}

impl<R: ProcessRunner + 'static> WorkerPool<R> {
    pub fn new(invoker: DockInvoker<R>) -> Self {
        Self { invoker }
    }

    pub fn invoker(&self) -> &DockInvoker<R> {
        &self.invoker
    }

    pub async fn dock_all(
        &self,
        chunks: &[Chunk],
        params: DockParams,
        worker_count: usize,
    ) -> OrchestrationReport {
        let started_at = Utc::now();
        let total = chunks.len();

        if worker_count == 0 {
            tracing::warn!("Worker count 0 is not valid, running with 1 worker");
        }
        let workers = worker_count.max(1).min(total.max(1));

        let params = Arc::new(params);
        let queue: VecDeque<DockJob> = chunks
            .iter()
            .enumerate()
            .map(|(index, chunk)| DockJob {
                index,
                chunk: chunk.clone(),
                params: Arc::clone(&params),
            })
            .collect();
        let queue = Arc::new(Mutex::new(queue));

        tracing::info!("🚀 Docking {} chunks with {} workers", total, workers);

        let (tx, mut rx) = mpsc::unbounded_channel::<(usize, DockResult)>();
        let mut tasks = JoinSet::new();

        for worker_id in 0..workers {
            let queue = Arc::clone(&queue);
            let tx = tx.clone();
            let invoker = self.invoker.clone();

            tasks.spawn(async move {
                loop {
                    // 鎖只在取出 job 時持有，不跨越外部程式的等待
                    let next = queue.lock().await.pop_front();
                    let Some(job) = next else {
                        break;
                    };

                    tracing::debug!(
                        "Worker {} picked chunk {} ({})",
                        worker_id,
                        job.chunk.sequence_index,
                        job.chunk.path.display()
                    );
                    let result = invoker.dock_job(&job).await;
                    if tx.send((job.index, result)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);

        let mut slots: Vec<Option<DockResult>> = (0..total).map(|_| None).collect();
        let mut completed = 0usize;
        while let Some((index, result)) = rx.recv().await {
            completed += 1;
            tracing::debug!("Chunk slot {} reported ({}/{})", index, completed, total);
            slots[index] = Some(result);
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Dock worker terminated abnormally: {}", e);
            }
        }

        let results = slots
            .into_iter()
            .zip(chunks)
            .enumerate()
            .map(|(index, (slot, chunk))| {
                slot.unwrap_or_else(|| {
                    let err = DockError::WorkerLost {
                        index,
                        reason: "worker exited before reporting a result".to_string(),
                    };
                    DockResult::failed(chunk.clone(), &err)
                })
            })
            .collect();

        let report = OrchestrationReport {
            results,
            started_at,
            finished_at: Utc::now(),
        };

        tracing::info!(
            "🏁 Docking finished: {} succeeded, {} failed",
            report.outputs().len(),
            report.failures().len()
        );
        report
    }
}
