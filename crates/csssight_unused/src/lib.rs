//! Unused selector detection for a whole project.
//!
//! This crate walks a project, routes every stylesheet, HTML, script and
//! JSX/TSX file to the matching extractor from `csssight_core`, and reports
//! each occurrence of a selector that is declared but never used. With
//! `fix` set it also removes those rules from the stylesheets.
//!
//! # Examples
//!
//! ## Basic Usage
//!
//! ```no_run
//! use csssight_unused::{Config, run_unused_check};
//! use std::io::{BufWriter, Write};
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut cfg = Config {
//!     root: Some(std::path::PathBuf::from("/path/to/project")),
//!     exclude: vec!["dist/**".to_string()],
//!     ..Default::default()
//! };
//!
//! let result = run_unused_check(cfg.clone())?;
//!
//! if !result.findings.is_empty() {
//!     cfg.initialize()?;
//!     let mut stdout = BufWriter::new(std::io::stdout());
//!     csssight_unused::print_findings_tree(&mut stdout, &result.findings, &cfg)?;
//!     stdout.flush()?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Repeated passes
//!
//! [`PassScheduler`] runs [`analyze`] on a worker thread. Requests that
//! arrive while a pass is running cancel it and coalesce into one
//! follow-up pass. [`serve_passes`] drives it from a line-oriented input,
//! which is what `csssight unused --listen` uses.

mod checker;
mod collector;
mod config;
mod fixer;
mod reporter;
mod scheduler;
mod types;

// Re-export public API
pub use checker::{Analysis, ParsedStylesheet, analyze, run_unused_check, serve_passes};
pub use collector::collect_files;
pub use config::{Config, OutputFormat, find_git_root};
pub use fixer::apply_fixes;
pub use reporter::{
    print_findings_tree, print_fix_summary, print_json, print_no_unused_message, print_skipped,
};
pub use scheduler::{CancelToken, PassScheduler};
pub use types::{CheckResult, Finding, FixSummary, SkippedFile, SourceFile};
