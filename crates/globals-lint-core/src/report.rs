//! Diagnostic line formatting.
//!
//! One line per finding, `path:line: var NAME` or `path:line: init
//! function`, written to the sink as findings arrive. Fire-and-forget:
//! write failures are dropped, matching the tool's stream-to-stderr
//! contract.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::types::{Finding, FindingKind, FindingSink};

/// Formats findings to a writer, preferring working-directory-relative
/// paths.
#[derive(Debug)]
pub struct Reporter<W: Write> {
    out: W,
    working_dir: PathBuf,
}

impl<W: Write> Reporter<W> {
    /// Creates a reporter. `working_dir` is the invocation's working
    /// directory; paths beneath it are printed relative to it.
    pub fn new(out: W, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            out,
            working_dir: working_dir.into(),
        }
    }

    /// Returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// The path as printed: relative to the working directory when the
    /// relative form does not escape upward out of it, the original path
    /// otherwise. An already relative path loses its redundant leading
    /// `./` (a scan rooted at `.` yields `./pkg/a.go` spellings).
    fn display_path<'a>(&self, path: &'a Path) -> &'a Path {
        match path.strip_prefix(&self.working_dir) {
            Ok(rel) if !rel.as_os_str().is_empty() => rel,
            _ => path.strip_prefix(".").unwrap_or(path),
        }
    }
}

impl<W: Write> FindingSink for Reporter<W> {
    fn emit(&mut self, finding: &Finding) {
        let path = self.display_path(&finding.file);
        let _ = match finding.kind {
            FindingKind::Var => writeln!(
                self.out,
                "{}:{}: var {}",
                path.display(),
                finding.line,
                finding.name
            ),
            FindingKind::Init => writeln!(
                self.out,
                "{}:{}: {} function",
                path.display(),
                finding.line,
                finding.name
            ),
        };
    }
}
