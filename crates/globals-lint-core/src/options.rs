//! Scan configuration.

/// Immutable configuration for one scan, built once at startup and threaded
/// explicitly into every component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Report package-level `var` declarations.
    pub vars: bool,
    /// Report `func init()` declarations.
    pub inits: bool,
    /// Report globals whose type satisfies the `error` interface
    /// (suppressed by default).
    pub include_errors: bool,
    /// Report globals of type `*regexp.Regexp` (suppressed by default).
    pub include_regexp: bool,
    /// Analyze `_test.go` files (skipped by default).
    pub analyze_tests: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            vars: true,
            inits: true,
            include_errors: false,
            include_regexp: false,
            analyze_tests: false,
        }
    }
}

impl Options {
    /// Creates the default option set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether global variables are reported.
    #[must_use]
    pub fn vars(mut self, on: bool) -> Self {
        self.vars = on;
        self
    }

    /// Sets whether init functions are reported.
    #[must_use]
    pub fn inits(mut self, on: bool) -> Self {
        self.inits = on;
        self
    }

    /// Sets whether error-typed globals are reported.
    #[must_use]
    pub fn include_errors(mut self, on: bool) -> Self {
        self.include_errors = on;
        self
    }

    /// Sets whether `*regexp.Regexp` globals are reported.
    #[must_use]
    pub fn include_regexp(mut self, on: bool) -> Self {
        self.include_regexp = on;
        self
    }

    /// Sets whether test files are analyzed.
    #[must_use]
    pub fn analyze_tests(mut self, on: bool) -> Self {
        self.analyze_tests = on;
        self
    }
}
