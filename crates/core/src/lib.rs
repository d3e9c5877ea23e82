//! Research Pilot Core
//!
//! Foundational error types and the presentation boundary for the Research
//! Pilot workspace. This crate has zero dependencies on application-level
//! code (CLI, HTTP clients, LLM providers).
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `progress` - Presentation boundary (`ProgressReporter`, `NullProgress`)
//!
//! ## Design Principles
//!
//! 1. **Zero external dependencies beyond serde_json/thiserror** - keeps build times minimal
//! 2. **Trait-based abstractions** - the pipeline reports progress through a
//!    trait so it stays testable without any presentation layer
//! 3. **Unidirectional dependency** - this crate depends on nothing else in the workspace

pub mod error;
pub mod progress;

pub use error::{CoreError, CoreResult};
pub use progress::{NullProgress, ProgressReporter};
