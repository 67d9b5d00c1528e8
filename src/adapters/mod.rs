// Adapters layer: concrete implementations for external systems (processes, report files).

pub mod process;
pub mod report;
