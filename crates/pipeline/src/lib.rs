pub mod checkpoints;
pub mod config;
pub mod orchestrator;

pub use checkpoints::{AlwaysProceed, Checkpoint, Checkpoints, TerminalCheckpoints};
pub use config::{ConfigError, PipelineConfig};
pub use orchestrator::{Pipeline, PipelineSettings, RunReport, VectorIndexState};
