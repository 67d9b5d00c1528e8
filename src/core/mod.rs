pub mod engine;
pub mod invoker;
pub mod orchestrator;
pub mod pool;
pub mod splitter;

pub use crate::domain::model::{Chunk, DockParams, DockResult, OrchestrationReport};
pub use crate::domain::ports::{ConfigProvider, ProcessRunner};
pub use crate::utils::error::Result;
