//! Detection of machine-generated Go files.
//!
//! Generated files carry a conventional marker comment near the top of the
//! file (see <https://github.com/golang/go/issues/13560>) and are excluded
//! from classification, although their declarations still participate in
//! unit construction.

use regex::Regex;
use std::sync::OnceLock;

/// Number of leading lines scanned for the marker. The convention places it
/// at the very top, so scanning the whole file would be wasted work.
const MARKER_LINE_BUDGET: usize = 10;

fn marker_regex() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| {
        // Marker wording fixed by https://go-review.googlesource.com/c/go/+/283633
        #[allow(clippy::expect_used)]
        Regex::new(r"^// Code generated .* DO NOT EDIT\.$").expect("valid marker regex")
    })
}

/// Returns true if the source carries the `Code generated ... DO NOT EDIT.`
/// marker within its first ten lines.
#[must_use]
pub fn is_generated(source: &str) -> bool {
    source
        .lines()
        .take(MARKER_LINE_BUDGET)
        .any(|line| marker_regex().is_match(line))
}
