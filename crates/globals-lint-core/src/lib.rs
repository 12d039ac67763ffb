//! # globals-lint-core
//!
//! Core engine for reporting risky package-level declarations in Go source
//! trees: mutable global variables and `init` functions.
//!
//! The crate is organized around three pieces:
//!
//! - [`UnitManager`] groups a directory's files into semantic units (the
//!   primary package and the separate external test package), resolves a
//!   shared type environment per unit, and caches that work;
//! - [`classify`] walks one file's top-level declarations and applies the
//!   suppression filters (blank identifiers, `go:embed` bindings,
//!   error-typed and regexp-handle globals, generated files);
//! - [`Scanner`] orchestrates a whole-tree scan and streams [`Finding`]s
//!   to a [`FindingSink`] such as the stderr [`Reporter`].
//!
//! ## Example
//!
//! ```ignore
//! use globals_lint_core::{Options, Reporter, Scanner};
//!
//! let mut scanner = Scanner::builder()
//!     .root("./src")
//!     .options(Options::default())
//!     .build();
//! let mut reporter = Reporter::new(std::io::stderr(), std::env::current_dir()?);
//! let summary = scanner.scan(&mut reporter)?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod classify;
mod generated;
mod options;
mod report;
mod scanner;
mod types;

/// Go declaration parsing.
pub mod parse;
/// Per-unit type environments.
pub mod typecheck;
/// Semantic units and the directory cache.
pub mod unit;

pub use classify::classify;
pub use generated::is_generated;
pub use options::Options;
pub use report::Reporter;
pub use scanner::{ScanError, Scanner, ScannerBuilder};
pub use typecheck::{is_regexp_handle, TypeEnv};
pub use types::{Finding, FindingKind, FindingSink, ScanSummary};
pub use unit::{FileView, SemanticUnit, UnitError, UnitKind, UnitManager};
