//! Research Pilot
//!
//! Multi-phase research workflow orchestrator: plan generation, task
//! selection, deep research, report synthesis and optional infographic
//! rendering, over interchangeable model backends.
//!
//! Layering:
//! - `research-pilot-core`: errors and the progress-reporting seam
//! - `research-pilot-llm`: backend adapters behind `ResearchProvider`
//! - this crate: task parsing, the pipeline state machine, and the CLI

pub mod cli;
pub mod config;
pub mod driver;
pub mod parser;

pub use config::{build_provider, BackendSettings, ProviderKind};
pub use driver::{PhaseFailure, PipelineDriver, PipelinePhase, PipelineSession, PipelineStage};
pub use parser::{parse_tasks, Task};
