// Data processing pipeline: ingestion, processing, orchestration and storage

pub mod ingestion;
pub mod orchestrator;
pub mod processing;
pub mod storage;
pub mod tasks;

pub use orchestrator::{Orchestrator, OrchestratorSettings};
pub use tasks::{run_refresh, RefreshParams, RefreshReport, RefreshStatus};
