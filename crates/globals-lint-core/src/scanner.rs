//! Scan orchestration.
//!
//! Walks the source tree in sorted order, resolves each file's semantic
//! unit through the [`UnitManager`], classifies surviving files and streams
//! findings to the caller's sink as each file completes. Output for an
//! unchanged tree is byte-identical across runs.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::classify::classify;
use crate::options::Options;
use crate::parse::{is_go_file, is_test_file};
use crate::types::{FindingSink, ScanSummary};
use crate::unit::{UnitError, UnitManager};

/// Directory names pruned entirely from traversal.
const PRUNED_DIRS: &[&str] = &["vendor", "testdata"];

/// Errors that abort a scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The root path does not exist.
    #[error("no such path: {0}")]
    MissingRoot(PathBuf),

    /// Traversal failed (unreadable directory).
    #[error("walking source tree: {0}")]
    Walk(#[from] walkdir::Error),

    /// A directory's unit could not be built.
    #[error(transparent)]
    Unit(#[from] UnitError),
}

/// Builder for configuring a [`Scanner`].
#[derive(Debug, Default)]
pub struct ScannerBuilder {
    root: Option<PathBuf>,
    options: Options,
    continue_on_error: bool,
}

impl ScannerBuilder {
    /// Creates a builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the root path (directory or single file) to scan.
    #[must_use]
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    /// Sets the scan options.
    #[must_use]
    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// When set, a directory whose unit fails to build is reported and
    /// skipped instead of aborting the run (default: abort).
    #[must_use]
    pub fn continue_on_error(mut self, on: bool) -> Self {
        self.continue_on_error = on;
        self
    }

    /// Builds the scanner.
    #[must_use]
    pub fn build(self) -> Scanner {
        let options = self.options;
        Scanner {
            root: self.root.unwrap_or_else(|| PathBuf::from(".")),
            options,
            continue_on_error: self.continue_on_error,
            units: UnitManager::new(options.analyze_tests),
        }
    }
}

/// Walks a tree and classifies every analyzable Go file.
#[derive(Debug)]
pub struct Scanner {
    root: PathBuf,
    options: Options,
    continue_on_error: bool,
    units: UnitManager,
}

impl Scanner {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> ScannerBuilder {
        ScannerBuilder::new()
    }

    /// The root path being scanned.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scans the tree, streaming findings to `sink` in traversal order
    /// across files and declaration order within each file.
    ///
    /// # Errors
    ///
    /// Fails when the root is missing, a directory is unreadable, or a
    /// unit fails to build (unless `continue_on_error` is set).
    pub fn scan(&mut self, sink: &mut dyn FindingSink) -> Result<ScanSummary, ScanError> {
        if !self.root.exists() {
            return Err(ScanError::MissingRoot(self.root.clone()));
        }

        info!("scanning {}", self.root.display());
        let mut summary = ScanSummary::default();

        if self.root.is_file() {
            let root = self.root.clone();
            self.scan_file(&root, sink, &mut summary)?;
            return Ok(summary);
        }

        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                let pruned = entry.file_type().is_dir()
                    && entry
                        .file_name()
                        .to_str()
                        .is_some_and(|name| PRUNED_DIRS.contains(&name));
                if pruned {
                    debug!("pruning {}", entry.path().display());
                }
                !pruned
            });

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.into_path();
            self.scan_file(&path, sink, &mut summary)?;
        }

        info!(
            "scan complete: {} finding(s) in {} file(s) across {} directories",
            summary.findings,
            summary.files_checked,
            self.units.directories_resolved()
        );
        Ok(summary)
    }

    fn scan_file(
        &mut self,
        path: &Path,
        sink: &mut dyn FindingSink,
        summary: &mut ScanSummary,
    ) -> Result<(), ScanError> {
        if !is_go_file(path) {
            return Ok(());
        }
        if !self.options.analyze_tests && is_test_file(path) {
            return Ok(());
        }

        let view = match self.units.resolve(path) {
            Ok(Some(view)) => view,
            Ok(None) => return Ok(()),
            // The cause was already reported when the directory failed.
            Err(UnitError::Poisoned { .. }) if self.continue_on_error => {
                debug!("skipping {}: directory already failed", path.display());
                return Ok(());
            }
            Err(err) if self.continue_on_error => {
                warn!("skipping {}: {err}", path.display());
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        summary.files_checked += 1;
        if view.is_generated {
            debug!("skipping generated file {}", path.display());
            return Ok(());
        }

        for finding in classify(view.file, view.env, &self.options) {
            summary.findings += 1;
            sink.emit(&finding);
        }
        Ok(())
    }
}
