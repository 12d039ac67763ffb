//! Finding and summary types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Category of a reported declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingKind {
    /// A package-level `var` binding.
    Var,
    /// A `func init()` declaration.
    Init,
}

/// One reported occurrence of a flagged declaration.
///
/// Findings are a transient output stream: they are emitted as soon as the
/// owning file has been classified and carry no persisted identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Source file the declaration lives in.
    pub file: PathBuf,
    /// 1-indexed line of the flagged identifier.
    pub line: usize,
    /// Finding category.
    pub kind: FindingKind,
    /// Identifier name (`init` for init-function findings).
    pub name: String,
}

impl Finding {
    /// Creates a global-variable finding.
    #[must_use]
    pub fn var(file: PathBuf, line: usize, name: impl Into<String>) -> Self {
        Self {
            file,
            line,
            kind: FindingKind::Var,
            name: name.into(),
        }
    }

    /// Creates an init-function finding.
    #[must_use]
    pub fn init(file: PathBuf, line: usize) -> Self {
        Self {
            file,
            line,
            kind: FindingKind::Init,
            name: "init".to_string(),
        }
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            FindingKind::Var => {
                write!(f, "{}:{}: var {}", self.file.display(), self.line, self.name)
            }
            FindingKind::Init => {
                write!(
                    f,
                    "{}:{}: {} function",
                    self.file.display(),
                    self.line,
                    self.name
                )
            }
        }
    }
}

/// Receives findings as they are produced, in declaration order per file.
pub trait FindingSink {
    /// Consumes one finding. Fire-and-forget: no result is reported back.
    fn emit(&mut self, finding: &Finding);
}

impl FindingSink for Vec<Finding> {
    fn emit(&mut self, finding: &Finding) {
        self.push(finding.clone());
    }
}

/// Aggregate counters for one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Number of files whose unit resolved and that were considered.
    pub files_checked: usize,
    /// Number of findings emitted.
    pub findings: usize,
}
