//! Semantic units and the per-directory unit cache.
//!
//! All files sharing one declared package name within a directory must be
//! resolved together: cross-file references only type-check against the
//! whole set, and re-parsing the directory per file would be quadratic. A
//! directory yields up to two units: the primary package (non-test files
//! plus same-package test files) and the external test package (test files
//! declared under the `_test`-suffixed package name, an import-only view of
//! the primary package). Units are immutable once built and cached for the
//! life of the process.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::parse::{self, ParseError, SourceFile};
use crate::typecheck::TypeEnv;

/// Which of a directory's two units a file or error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    /// Non-test files plus same-package test files.
    Primary,
    /// Test files declared under the `_test`-suffixed package name.
    ExternalTest,
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primary => write!(f, "package unit"),
            Self::ExternalTest => write!(f, "external test unit"),
        }
    }
}

/// Errors from building a directory's units.
#[derive(Debug, Error)]
pub enum UnitError {
    /// The directory could not be enumerated.
    #[error("reading directory {path}: {source}")]
    ReadDir {
        /// Directory that failed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// A source file could not be read.
    #[error("reading {path}: {source}")]
    ReadFile {
        /// File that failed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// A file of the unit failed to parse, poisoning the whole unit.
    #[error("{unit}: {source}")]
    Parse {
        /// Unit the failing file belongs to.
        unit: UnitKind,
        /// Underlying parse error (carries path and line).
        #[source]
        source: ParseError,
    },

    /// The directory's units already failed to build earlier in the run.
    /// The first failure carried the cause; repeats short-circuit.
    #[error("units for {path} previously failed to build")]
    Poisoned {
        /// Directory whose earlier build failed.
        path: PathBuf,
    },
}

/// One logically coherent group of files resolved together.
#[derive(Debug)]
pub struct SemanticUnit {
    /// Which unit of its directory this is.
    pub kind: UnitKind,
    /// The unit's files, in directory order.
    pub files: Vec<SourceFile>,
    /// Type environment resolved from all files together.
    pub env: TypeEnv,
}

impl SemanticUnit {
    fn build(kind: UnitKind, files: Vec<SourceFile>) -> Option<Self> {
        if files.is_empty() {
            return None;
        }
        let env = TypeEnv::build(&files);
        Some(Self { kind, files, env })
    }
}

/// A directory's unit pair. `None` is the explicit no-unit sentinel so that
/// repeated lookups short-circuit without re-scanning the directory.
#[derive(Debug, Default)]
pub struct DirUnits {
    /// The primary package unit, if the directory has one.
    pub primary: Option<SemanticUnit>,
    /// The external test unit, if the directory has one.
    pub external: Option<SemanticUnit>,
}

impl DirUnits {
    fn view_of(&self, path: &Path) -> Option<FileView<'_>> {
        // Unit files were enumerated from the queried file's own directory,
        // so the file name identifies the entry even when the spellings
        // differ ("lone.go" vs "./lone.go").
        let name = path.file_name()?;
        for unit in [&self.primary, &self.external].into_iter().flatten() {
            if let Some(file) = unit.files.iter().find(|f| f.path.file_name() == Some(name)) {
                return Some(FileView {
                    file,
                    env: &unit.env,
                    unit: unit.kind,
                    is_generated: file.is_generated,
                });
            }
        }
        None
    }
}

/// Borrowed view of one file inside its resolved unit.
#[derive(Debug, Clone, Copy)]
pub struct FileView<'a> {
    /// The file's declaration tree.
    pub file: &'a SourceFile,
    /// The owning unit's type environment.
    pub env: &'a TypeEnv,
    /// Which unit the file landed in.
    pub unit: UnitKind,
    /// Whether the originally requested file is itself generated. Callers
    /// use this to skip classification without skipping unit construction.
    pub is_generated: bool,
}

/// Outcome of a directory's one and only build attempt.
#[derive(Debug)]
enum CacheEntry {
    Built(DirUnits),
    Poisoned,
}

/// Lazily builds and caches the unit pair for each directory.
///
/// Single-threaded by design; the scan visits files sequentially, so the
/// cache needs no locking. Failed builds are cached too: a directory is
/// enumerated and parsed at most once per run, whatever the outcome.
#[derive(Debug, Default)]
pub struct UnitManager {
    cache: HashMap<PathBuf, CacheEntry>,
    analyze_tests: bool,
}

impl UnitManager {
    /// Creates a manager. When `analyze_tests` is false, `_test.go` files
    /// are left out of unit construction entirely.
    #[must_use]
    pub fn new(analyze_tests: bool) -> Self {
        Self {
            cache: HashMap::new(),
            analyze_tests,
        }
    }

    /// Number of directories resolved so far.
    #[must_use]
    pub fn directories_resolved(&self) -> usize {
        self.cache.len()
    }

    /// Resolves the unit a file belongs to, building and caching its
    /// directory's unit pair on first encounter.
    ///
    /// Returns `Ok(None)` when the file is not part of any unit (for
    /// example a test file while tests are disabled).
    ///
    /// # Errors
    ///
    /// Fails when the directory cannot be read or any file of the
    /// directory fails to parse; a broken file invalidates resolution for
    /// every file of its unit. The first failure carries the cause;
    /// repeated lookups of the same directory fail with
    /// [`UnitError::Poisoned`] without touching the filesystem again.
    pub fn resolve(&mut self, file: &Path) -> Result<Option<FileView<'_>>, UnitError> {
        // A bare one-component path has `Some("")` as its parent.
        let dir = match file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        if !self.cache.contains_key(dir) {
            debug!("building semantic units for {}", dir.display());
            match build_dir_units(dir, self.analyze_tests) {
                Ok(units) => {
                    self.cache.insert(dir.to_path_buf(), CacheEntry::Built(units));
                }
                Err(err) => {
                    self.cache.insert(dir.to_path_buf(), CacheEntry::Poisoned);
                    return Err(err);
                }
            }
        }
        match self.cache.get(dir) {
            Some(CacheEntry::Built(units)) => Ok(units.view_of(file)),
            Some(CacheEntry::Poisoned) => Err(UnitError::Poisoned {
                path: dir.to_path_buf(),
            }),
            None => Ok(None),
        }
    }
}

/// Enumerates a directory (non-recursively; subdirectories are separate
/// packages), parses every source file, and partitions the files into the
/// primary and external test sets.
fn build_dir_units(dir: &Path, analyze_tests: bool) -> Result<DirUnits, UnitError> {
    let entries = fs::read_dir(dir).map_err(|source| UnitError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| UnitError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() || !parse::is_go_file(&path) {
            continue;
        }
        if !analyze_tests && parse::is_test_file(&path) {
            continue;
        }
        paths.push(path);
    }
    paths.sort();

    let mut primary = Vec::new();
    let mut external = Vec::new();
    for path in paths {
        let source = fs::read_to_string(&path).map_err(|source| UnitError::ReadFile {
            path: path.clone(),
            source,
        })?;
        let parsed = parse::parse_source(&path, &source).map_err(|e| UnitError::Parse {
            unit: failing_unit_kind(&path, &source),
            source: e,
        })?;
        // Only _test.go files can form the external test package.
        if parsed.is_external_test && parse::is_test_file(&path) {
            external.push(parsed);
        } else {
            primary.push(parsed);
        }
    }

    debug!(
        "{}: {} primary file(s), {} external test file(s)",
        dir.display(),
        primary.len(),
        external.len()
    );

    Ok(DirUnits {
        primary: SemanticUnit::build(UnitKind::Primary, primary),
        external: SemanticUnit::build(UnitKind::ExternalTest, external),
    })
}

/// Attributes a parse failure to the unit the broken file would have
/// joined, from a raw-text package clause scan.
fn failing_unit_kind(path: &Path, source: &str) -> UnitKind {
    let external = parse::is_test_file(path)
        && parse::quick_package_name(source).is_some_and(|p| p.ends_with("_test"));
    if external {
        UnitKind::ExternalTest
    } else {
        UnitKind::Primary
    }
}
