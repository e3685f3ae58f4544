//! Command-line interface definitions.
//!
//! All arguments, subcommands, and options use the clap derive API, with
//! global options (verbosity, color) and one subcommand per disposition.
//!
//! # Example
//!
//! ```bash
//! # Report duplicate sets without touching anything
//! dupescan scan ~/Downloads
//!
//! # Delete redundant copies, keeping one file per set
//! dupescan remove ~/Downloads --min-size 1MiB
//!
//! # Replace redundant copies with hard links, skipping the prompt
//! dupescan link /srv/media -y
//!
//! # Machine-readable report
//! dupescan scan ~/Downloads --output json
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Find byte-identical files and reclaim the wasted space.
///
/// dupescan buckets files by size, confirms duplicates with two-phase BLAKE3
/// content hashing, and can delete redundant copies or replace them with
/// hard links to a surviving copy.
#[derive(Debug, Parser)]
#[command(name = "dupescan")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress and log output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Find duplicate files and report them without touching anything
    Scan(ScanArgs),
    /// Find duplicate files and delete every redundant copy
    Remove(DispositionArgs),
    /// Find duplicate files and replace redundant copies with hard links
    Link(DispositionArgs),
}

/// Arguments shared by every subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directory to scan for duplicates
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Minimum file size to consider (e.g. 1024, 4KiB, 1MB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(
        long,
        value_name = "SIZE",
        default_value = "1024",
        value_parser = parse_size,
        env = "DUPESCAN_MIN_SIZE"
    )]
    pub min_size: u64,

    /// Worker threads per hashing pass (default: all cores, 1 = sequential)
    #[arg(short = 'j', long, value_name = "N")]
    pub workers: Option<usize>,

    /// Glob patterns to ignore (can be specified multiple times)
    ///
    /// These patterns are added to any .gitignore found at the scan root.
    #[arg(short = 'i', long = "ignore", value_name = "PATTERN")]
    pub ignore_patterns: Vec<String>,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Follow symbolic links during scan
    ///
    /// Warning: May cause infinite loops if symlinks form cycles.
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Output format for the duplicate report
    #[arg(short, long, value_enum, default_value = "human")]
    pub output: OutputFormat,
}

/// Arguments for the subcommands that modify the filesystem.
#[derive(Debug, Args)]
pub struct DispositionArgs {
    #[command(flatten)]
    pub scan: ScanArgs,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

/// Output format for the duplicate report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Grouped report with per-set survivors and a summary
    Human,
    /// Only the redundant file paths, one per line (for piping)
    Flat,
    /// JSON report for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Human => write!(f, "human"),
            OutputFormat::Flat => write!(f, "flat"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Plain integers are bytes; SI and IEC suffixes are accepted.
fn parse_size(s: &str) -> Result<u64, String> {
    s.parse::<bytesize::ByteSize>()
        .map(|b| b.as_u64())
        .map_err(|e| format!("invalid size '{s}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_size_plain_bytes() {
        assert_eq!(parse_size("1024").unwrap(), 1024);
        assert_eq!(parse_size("0").unwrap(), 0);
    }

    #[test]
    fn parse_size_suffixes() {
        assert_eq!(parse_size("1KiB").unwrap(), 1024);
        assert_eq!(parse_size("1KB").unwrap(), 1000);
        assert_eq!(parse_size("2MiB").unwrap(), 2 * 1024 * 1024);
    }

    #[test]
    fn parse_size_rejects_garbage() {
        assert!(parse_size("not-a-size").is_err());
    }

    #[test]
    fn scan_defaults() {
        let cli = Cli::parse_from(["dupescan", "scan", "/tmp"]);
        match cli.command {
            Commands::Scan(args) => {
                assert_eq!(args.min_size, 1024);
                assert_eq!(args.workers, None);
                assert_eq!(args.output, OutputFormat::Human);
                assert!(!args.skip_hidden);
            }
            _ => panic!("expected scan subcommand"),
        }
    }

    #[test]
    fn remove_accepts_yes_flag() {
        let cli = Cli::parse_from(["dupescan", "remove", "/tmp", "-y", "--min-size", "1MiB"]);
        match cli.command {
            Commands::Remove(args) => {
                assert!(args.yes);
                assert_eq!(args.scan.min_size, 1024 * 1024);
            }
            _ => panic!("expected remove subcommand"),
        }
    }

    #[test]
    fn workers_flag_parses() {
        let cli = Cli::parse_from(["dupescan", "link", "/tmp", "-j", "1"]);
        match cli.command {
            Commands::Link(args) => assert_eq!(args.scan.workers, Some(1)),
            _ => panic!("expected link subcommand"),
        }
    }
}
