//! dupescan - Duplicate File Finder and Space Reclaimer
//!
//! A cross-platform CLI that identifies sets of byte-identical files under a
//! directory tree and resolves the duplication by deleting redundant copies
//! or replacing them with hard links.
//!
//! Detection buckets files by exact size, then confirms duplicates with
//! two-phase BLAKE3 content hashing: a cheap prefix digest first, a full
//! digest only for files whose prefixes collide.

pub mod actions;
pub mod cli;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod progress;
pub mod scanner;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Context;
use bytesize::ByteSize;
use serde::Serialize;
use yansi::Paint;

use crate::actions::{link_duplicates, remove_duplicates};
use crate::cli::{Cli, Commands, DispositionArgs, OutputFormat, ScanArgs};
use crate::duplicates::{
    default_workers, group_by_size, resolve, DuplicateSet, EngineConfig, HashEngine, ResolveStats,
};
use crate::error::ExitCode;
use crate::progress::{Progress, ProgressSink};
use crate::scanner::{Walker, WalkerConfig};

/// Run the application logic for parsed CLI arguments.
///
/// Returns the exit code the process should terminate with; errors carry the
/// failure context (including partial disposition totals) for the caller to
/// print.
///
/// # Errors
///
/// Returns an error when the scan root is unusable or when a disposition
/// stops at a filesystem failure.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    match cli.command {
        Commands::Scan(args) => run_scan(&args, cli.quiet),
        Commands::Remove(args) => run_remove(&args, cli.quiet),
        Commands::Link(args) => run_link(&args, cli.quiet),
    }
}

/// Outcome of the detection pipeline, ready for reporting or disposition.
struct Detection {
    sets: Vec<DuplicateSet>,
    stats: ResolveStats,
}

/// Run the full detection pipeline: collect, partition, hash, resolve.
fn detect(args: &ScanArgs, quiet: bool) -> anyhow::Result<Detection> {
    let config = WalkerConfig {
        min_size: args.min_size,
        skip_hidden: args.skip_hidden,
        follow_symlinks: args.follow_symlinks,
        ignore_patterns: args.ignore_patterns.clone(),
    };

    log::info!("Scanning {} for file metadata", args.path.display());
    let files = Walker::new(&args.path, config)
        .collect()
        .with_context(|| format!("failed to scan {}", args.path.display()))?;
    log::info!("Found {} file(s) of minimum size or larger", files.len());

    let (groups, _grouping) = group_by_size(files);

    let workers = args.workers.unwrap_or_else(default_workers);
    let mut engine_config = EngineConfig::default().with_workers(workers);
    if !quiet {
        let sink: Arc<dyn ProgressSink> = Arc::new(Progress::new(false));
        engine_config = engine_config.with_progress(sink);
    }

    let (buckets, _engine_stats) = HashEngine::new(engine_config).run(groups);
    let (sets, stats) = resolve(buckets);

    Ok(Detection { sets, stats })
}

fn run_scan(args: &ScanArgs, quiet: bool) -> anyhow::Result<ExitCode> {
    let detection = detect(args, quiet)?;
    report(&detection, args.output)?;

    Ok(if detection.sets.is_empty() {
        ExitCode::NoDuplicates
    } else {
        ExitCode::Success
    })
}

fn run_remove(args: &DispositionArgs, quiet: bool) -> anyhow::Result<ExitCode> {
    let detection = detect(&args.scan, quiet)?;
    report(&detection, args.scan.output)?;

    if detection.sets.is_empty() {
        return Ok(ExitCode::NoDuplicates);
    }

    if !args.yes {
        let prompt = format!(
            "Delete {} redundant file(s), reclaiming {}?",
            detection.stats.redundant_count,
            ByteSize::b(detection.stats.reclaimable_bytes)
        );
        if !confirm(&prompt)? {
            println!("Aborted; nothing was deleted.");
            return Ok(ExitCode::Success);
        }
    }

    let disposed = remove_duplicates(&detection.sets)?;
    println!(
        "Removed {} file(s) with a total size of {}.",
        disposed.files,
        ByteSize::b(disposed.bytes).to_string().green()
    );
    Ok(ExitCode::Success)
}

fn run_link(args: &DispositionArgs, quiet: bool) -> anyhow::Result<ExitCode> {
    let detection = detect(&args.scan, quiet)?;
    report(&detection, args.scan.output)?;

    if detection.sets.is_empty() {
        return Ok(ExitCode::NoDuplicates);
    }

    if !args.yes {
        let prompt = format!(
            "Replace {} redundant file(s) with hard links, reclaiming {}?",
            detection.stats.redundant_count,
            ByteSize::b(detection.stats.reclaimable_bytes)
        );
        if !confirm(&prompt)? {
            println!("Aborted; nothing was linked.");
            return Ok(ExitCode::Success);
        }
    }

    let disposed = link_duplicates(&detection.sets)?;
    println!(
        "Converted {} file(s) into hard links, reclaiming {}.",
        disposed.files,
        ByteSize::b(disposed.bytes).to_string().green()
    );
    Ok(ExitCode::Success)
}

/// JSON report shape for `--output json`.
#[derive(Serialize)]
struct JsonReport<'a> {
    summary: &'a ResolveStats,
    sets: &'a [DuplicateSet],
}

fn report(detection: &Detection, output: OutputFormat) -> anyhow::Result<()> {
    match output {
        OutputFormat::Human => {
            report_human(detection);
            Ok(())
        }
        OutputFormat::Flat => {
            for set in &detection.sets {
                for file in set.redundant() {
                    println!("{}", file.path.display());
                }
            }
            Ok(())
        }
        OutputFormat::Json => {
            let report = JsonReport {
                summary: &detection.stats,
                sets: &detection.sets,
            };
            serde_json::to_writer_pretty(io::stdout().lock(), &report)
                .context("failed to serialize report")?;
            println!();
            Ok(())
        }
    }
}

fn report_human(detection: &Detection) {
    if detection.sets.is_empty() {
        println!("No duplicate files found.");
        return;
    }

    for set in &detection.sets {
        println!(
            "{} ({} each)",
            set.survivor().path.display().to_string().bold(),
            ByteSize::b(set.size)
        );
        for file in set.redundant() {
            println!("  {}", file.path.display());
        }
    }

    let stats = &detection.stats;
    println!(
        "{} duplicate set(s), {} redundant file(s), {} reclaimable",
        stats.set_count,
        stats.redundant_count,
        ByteSize::b(stats.reclaimable_bytes).to_string().green().bold()
    );
}

/// Ask for a yes/no confirmation on stdin. Defaults to no.
fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush().context("failed to flush stdout")?;

    let mut answer = String::new();
    io::stdin()
        .read_line(&mut answer)
        .context("failed to read confirmation")?;
    let answer = answer.trim();

    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}
