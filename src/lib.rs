//! # llm-context-builder
//!
//! Exports a project directory into a single annotated text document sized
//! for a large-language-model context window.
//!
//! ## Features
//!
//! - Extension allow-lists and glob-based folder/file exclusions
//! - Pruning of excluded folders before descent
//! - Per-file size limits with truncation notices
//! - Project stack detection that picks a filtering preset
//!
//! ## Quick Start
//!
//! ```no_run
//! use llm_context_builder::{Config, Pipeline, ProjectDetector};
//!
//! # fn main() -> anyhow::Result<()> {
//! let preset = ProjectDetector::new("./my-project").suggest_preset();
//!
//! let config = Config::builder()
//!     .root_dir("./my-project")
//!     .preset(preset)
//!     .output_file("context.txt")
//!     .build()?;
//!
//! let result = Pipeline::new(config)?.run()?;
//! println!("{} files, {} bytes", result.files_processed, result.total_size);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! 1. **Detector**: classifies the stack from a shallow directory snapshot
//! 2. **Rules**: defaults, preset and overrides merged into one rule set
//! 3. **Scanner**: walks the tree and reads the files the rules admit
//! 4. **Document**: wraps each file in header/footer markers plus a summary
//! 5. **Writer**: persists the document atomically

#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

mod config;
mod detector;
mod document;
mod error;
mod file;
mod pipeline;
mod scanner;
mod token;
mod writer;

pub mod preset;
pub mod rules;

pub use config::{Config, ConfigBuilder};
pub use detector::{ProjectDetector, ProjectInfo, ProjectSignature, ProjectType};
pub use document::{DocumentAssembler, Summary};
pub use error::{Error, Result};
pub use file::FileRecord;
pub use pipeline::{Pipeline, ScanResult};
pub use preset::{Preset, PresetKind};
pub use rules::{ExclusionReason, RuleSet};
pub use scanner::{ScanEntry, ScanOutcome, SkipReason};
pub use token::{ContextFit, SimpleTokenizer, TokenEstimator};
pub use writer::default_output_path;

/// Runs a complete export with the given configuration.
///
/// # Errors
///
/// Returns an error if the walk aborts or the document cannot be written.
///
/// # Examples
///
/// ```no_run
/// use llm_context_builder::{Config, run};
///
/// # fn main() -> anyhow::Result<()> {
/// let config = Config::builder().root_dir(".").build()?;
/// run(config)?;
/// # Ok(())
/// # }
/// ```
pub fn run(config: Config) -> Result<ScanResult> {
    Pipeline::new(config)?.run()
}
