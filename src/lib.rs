pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::process::SystemRunner;
pub use core::{
    engine::SplitDockEngine, invoker::DockInvoker, orchestrator::DockOrchestrator,
    pool::WorkerPool, splitter::ChunkSplitter,
};
pub use domain::model::{
    Chunk, DockFlags, DockOutcome, DockParams, DockResult, OrchestrationReport, RunStatus,
    SplitRequest, ToolPaths,
};
pub use utils::error::{DockError, ErrorKind, Result};
