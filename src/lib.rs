//! Buildpage core library.
//!
//! Classifies captured build and test output into a closed set of outcomes,
//! extracts compiler errors, warnings and test failures, enriches them with
//! blame data and renders an HTML-safe report grouped by source file.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective settings resolution.
//! - `grammar`: The text grammars recognized in raw output.
//! - `extract`: Raw text to typed records, with build-phase priority.
//! - `traceback`: File/line resolution inside traceback blocks.
//! - `group`: Order-preserving grouping of records by file.
//! - `blame`: Blame facility seam and best-effort enrichment.
//! - `render`: Escaping and per-record report sections.
//! - `classify`: The `Engine` and the two-phase outcome decision.
//! - `models`: Records, outcomes and results.
//! - `output`: Human/JSON printers.
pub mod blame;
pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod grammar;
pub mod group;
pub mod models;
pub mod output;
pub mod render;
pub mod traceback;

pub use classify::Engine;
pub use config::Settings;
pub use error::EngineError;
pub use models::{Outcome, PipelineResult, ProcessOutput, Record};
