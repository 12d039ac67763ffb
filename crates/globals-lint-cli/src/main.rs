//! globals-lint CLI tool.
//!
//! Usage:
//! ```bash
//! globals-lint [OPTIONS] [PATH]
//! ```
//!
//! Scans a Go source tree and reports package-level `var` declarations and
//! `init` functions, one line per finding on stderr. Findings are not
//! process failures: the exit code is 0 for a clean scan, 2 for usage
//! errors, and 1 for scan errors (unreadable directories, malformed
//! source).

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use globals_lint_core::{Finding, Options, Reporter, ScanError, Scanner};
use tracing_subscriber::EnvFilter;

/// Reports global variables and init functions in Go source trees.
#[derive(Parser)]
#[command(name = "globals-lint")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to analyze (directory or single .go file)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Report global variable declarations
    #[arg(long, default_value_t = true, action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    vars: bool,

    /// Report init function declarations
    #[arg(long, alias = "only-init", default_value_t = true, action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    inits: bool,

    /// Omit global variables whose type satisfies the error interface
    #[arg(long, default_value_t = true, action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    skip_errors: bool,

    /// Omit global variables of type *regexp.Regexp
    #[arg(long, default_value_t = true, action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    skip_regexp: bool,

    /// Omit analyzing _test.go files
    #[arg(long, default_value_t = true, action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    skip_tests: bool,

    /// Report directories that fail to parse and continue instead of aborting
    #[arg(long)]
    keep_going: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Output format for findings.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    /// One `path:line: ...` line per finding on stderr.
    #[default]
    Text,
    /// A JSON array of findings on stdout.
    Json,
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli) {
        eprintln!("{err:#}");
        let code = match err.downcast_ref::<ScanError>() {
            Some(ScanError::MissingRoot(_)) => 2,
            _ => 1,
        };
        std::process::exit(code);
    }
}

fn run(cli: Cli) -> Result<()> {
    let options = Options::new()
        .vars(cli.vars)
        .inits(cli.inits)
        .include_errors(!cli.skip_errors)
        .include_regexp(!cli.skip_regexp)
        .analyze_tests(!cli.skip_tests);

    let working_dir = std::env::current_dir().context("resolving working directory")?;

    // `./...` is a common habit from Go tooling; treat it as the tree root.
    let root = if cli.path.as_os_str() == "./..." {
        PathBuf::from(".")
    } else {
        cli.path
    };

    let mut scanner = Scanner::builder()
        .root(root)
        .options(options)
        .continue_on_error(cli.keep_going)
        .build();

    tracing::debug!("scanning {} from {}", scanner.root().display(), working_dir.display());

    match cli.format {
        OutputFormat::Text => {
            let stderr = std::io::stderr();
            let mut reporter = Reporter::new(stderr.lock(), &working_dir);
            let summary = scanner.scan(&mut reporter)?;
            tracing::debug!(
                "{} finding(s) in {} file(s)",
                summary.findings,
                summary.files_checked
            );
        }
        OutputFormat::Json => {
            let mut findings: Vec<Finding> = Vec::new();
            scanner.scan(&mut findings)?;
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            serde_json::to_writer_pretty(&mut out, &findings)
                .context("serializing findings")?;
            writeln!(out).context("writing output")?;
        }
    }

    Ok(())
}
