mod common;

use common::{chunk_number, tools, write_library, FakeRunner};
use splitdock::{
    Chunk, DockFlags, DockOrchestrator, DockParams, ErrorKind, RunStatus, SplitRequest,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

async fn split_library(
    temp_dir: &TempDir,
    records: usize,
    chunk_size: usize,
) -> Vec<Chunk> {
    let input = temp_dir.path().join("ligands.sd");
    write_library(&input, records);
    let orchestrator = DockOrchestrator::new(Arc::new(FakeRunner::new()), &tools());
    let request = SplitRequest::new(&input)
        .with_work_dir(temp_dir.path().join("tmp"))
        .with_chunk_size(chunk_size);
    orchestrator.split(&request).await.unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_report_order_ignores_completion_order() {
    let temp_dir = TempDir::new().unwrap();
    let chunks = split_library(&temp_dir, 5, 1).await;

    // 第一個 chunk 最慢，最後一個最快
    let mut runner = FakeRunner::new();
    for chunk in &chunks {
        let delay = Duration::from_millis(40 * (6 - chunk.sequence_index));
        runner = runner.delay(chunk.sequence_index, delay);
    }
    let runner = Arc::new(runner);
    let orchestrator = DockOrchestrator::new(Arc::clone(&runner), &tools());

    let report = orchestrator
        .dock_all(&chunks, DockParams::new("receptor.prm"), 5)
        .await;

    let mut by_finish = runner.dock_calls();
    by_finish.sort_by_key(|c| c.finished);
    let finish_order: Vec<u64> = by_finish
        .iter()
        .map(|c| chunk_number(c.arg_after("-i").unwrap()))
        .collect();
    assert_ne!(finish_order, vec![1, 2, 3, 4, 5]);

    assert_eq!(report.len(), chunks.len());
    for (result, chunk) in report.results.iter().zip(&chunks) {
        assert_eq!(&result.chunk, chunk);
        assert!(result.output().unwrap().ends_with(format!(
            "tmp_{}_out.sd",
            chunk.sequence_index
        )));
    }
}

#[tokio::test]
async fn test_single_failure_is_isolated() {
    let temp_dir = TempDir::new().unwrap();
    let chunks = split_library(&temp_dir, 9, 3).await;

    let runner = Arc::new(FakeRunner::new().failing_chunk(2));
    let orchestrator = DockOrchestrator::new(Arc::clone(&runner), &tools());

    let report = orchestrator
        .dock_all(&chunks, DockParams::new("receptor.prm"), 2)
        .await;

    assert_eq!(
        report.status(),
        RunStatus::PartiallyFailed {
            failed: 1,
            total: 3
        }
    );
    assert!(report.results[0].is_success());
    assert!(report.results[2].is_success());

    let failure = report.results[1].failure().unwrap();
    assert_eq!(failure.kind, ErrorKind::DockProcessFailed);
    assert_eq!(failure.exit_code, Some(1));
    assert!(failure.stderr.contains("RBT_FILE_PARSE_ERROR"));

    // 失敗的 job 不會重試
    assert_eq!(runner.dock_calls().len(), 3);
}

#[tokio::test]
async fn test_zero_exit_without_output_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let chunks = split_library(&temp_dir, 4, 2).await;

    let runner = Arc::new(FakeRunner::new().silent_chunk(1));
    let orchestrator = DockOrchestrator::new(runner, &tools());
    let report = orchestrator
        .dock_all(&chunks, DockParams::new("receptor.prm"), 2)
        .await;

    assert_eq!(
        report.results[0].failure().unwrap().kind,
        ErrorKind::OutputMissing
    );
    assert!(report.results[1].is_success());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_single_worker_runs_sequentially() {
    let temp_dir = TempDir::new().unwrap();
    let chunks = split_library(&temp_dir, 4, 1).await;

    let runner = Arc::new(FakeRunner::new().default_delay(Duration::from_millis(20)));
    let orchestrator = DockOrchestrator::new(Arc::clone(&runner), &tools());
    let report = orchestrator
        .dock_all(&chunks, DockParams::new("receptor.prm"), 1)
        .await;
    assert_eq!(report.status(), RunStatus::AllDocked);

    let mut calls = runner.dock_calls();
    calls.sort_by_key(|c| c.started);
    assert_eq!(calls.len(), 4);
    for pair in calls.windows(2) {
        assert!(pair[0].finished <= pair[1].started, "dock processes overlapped");
    }

    // 單一 worker 依 chunk 順序取出 job
    let started_order: Vec<u64> = calls
        .iter()
        .map(|c| chunk_number(c.arg_after("-i").unwrap()))
        .collect();
    assert_eq!(started_order, vec![1, 2, 3, 4]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_each_chunk_docked_exactly_once() {
    let temp_dir = TempDir::new().unwrap();
    let chunks = split_library(&temp_dir, 20, 2).await;

    let runner = Arc::new(FakeRunner::new().default_delay(Duration::from_millis(5)));
    let orchestrator = DockOrchestrator::new(Arc::clone(&runner), &tools());
    let report = orchestrator
        .dock_all(&chunks, DockParams::new("receptor.prm"), 3)
        .await;

    assert_eq!(report.len(), 10);
    let docked: Vec<String> = runner
        .dock_calls()
        .iter()
        .map(|c| c.arg_after("-i").unwrap().to_string())
        .collect();
    let unique: HashSet<&String> = docked.iter().collect();
    assert_eq!(docked.len(), 10);
    assert_eq!(unique.len(), 10);
}

#[tokio::test]
async fn test_dock_arguments_and_flag_order() {
    let temp_dir = TempDir::new().unwrap();
    let chunks = split_library(&temp_dir, 2, 2).await;

    let runner = Arc::new(FakeRunner::new());
    let orchestrator = DockOrchestrator::new(Arc::clone(&runner), &tools());
    let params = DockParams::new("receptor.prm")
        .with_dock_param("dock_solv.prm")
        .with_output_suffix("_docked")
        .with_flags(DockFlags::new().flag("n", "10").switch("allH").flag("seed", "1"));

    let report = orchestrator.dock_all(&chunks, params, 2).await;
    assert_eq!(report.status(), RunStatus::AllDocked);

    let call = &runner.dock_calls()[0];
    let chunk_path = chunks[0].path.display().to_string();
    let output_base = temp_dir.path().join("tmp/tmp_1_docked").display().to_string();
    assert_eq!(
        call.args,
        vec![
            "-i",
            chunk_path.as_str(),
            "-o",
            output_base.as_str(),
            "-r",
            "receptor.prm",
            "-p",
            "dock_solv.prm",
            "-n",
            "10",
            "-allH",
            "-seed",
            "1",
        ]
    );
}
