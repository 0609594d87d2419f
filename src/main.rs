// ghostsweep CLI
// Thin presentation layer over the scan/delete pipelines: it supplies the
// root and filter file, drains the event streams, and formats the output.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::SystemTime;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};

use ghostsweep::delete::{DeleteOutcome, DeleteTarget, DeleteWorker};
use ghostsweep::events::{DeleteEvent, RunStatus, ScanEvent};
use ghostsweep::rules::parse_filter_file;
use ghostsweep::scan::{ScanPayload, ScanStats, ScanWorker};
use ghostsweep::CancelToken;

#[derive(Parser)]
#[command(
    name = "ghostsweep",
    version,
    about = "Find and remove ghost files matched by a gitignore-style filter file"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a directory tree and list the ghost files it contains
    Scan {
        /// Root directory to scan
        root: PathBuf,
        /// Filter file with `- pattern` / `+ pattern` rules
        #[arg(short, long)]
        filter: PathBuf,
        /// Match patterns case-insensitively
        #[arg(long)]
        ignore_case: bool,
        /// Print every visited file, not just ghosts
        #[arg(long)]
        all: bool,
        /// Emit one JSON object instead of human-readable output
        #[arg(long)]
        json: bool,
    },
    /// Scan, then delete the ghost files after confirmation
    Sweep {
        root: PathBuf,
        #[arg(short, long)]
        filter: PathBuf,
        #[arg(long)]
        ignore_case: bool,
        /// List what would be deleted without deleting anything
        #[arg(long)]
        dry_run: bool,
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Scan {
            root,
            filter,
            ignore_case,
            all,
            json,
        } => cmd_scan(&root, &filter, ignore_case, all, json),
        Command::Sweep {
            root,
            filter,
            ignore_case,
            dry_run,
            yes,
        } => cmd_sweep(&root, &filter, ignore_case, dry_run, yes),
    }
}

/// Run a scan to completion, collecting every payload. The progress spinner
/// is fed from the worker's periodic stats snapshots.
fn run_scan(
    root: &PathBuf,
    filter: &PathBuf,
    ignore_case: bool,
    quiet: bool,
) -> Result<(Vec<ScanPayload>, ScanStats)> {
    let rules = parse_filter_file(filter).context("loading filter file")?;
    let worker = ScanWorker::new(root, rules, !ignore_case, CancelToken::new())
        .context("compiling filter rules")?;

    let pb = if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg}")
                .unwrap(),
        );
        pb.set_message("Scanning...");
        pb
    };

    let (receiver, handle) = worker.spawn();
    let mut payloads = Vec::new();
    let mut final_stats = ScanStats::default();
    let mut failure = None;

    for event in receiver {
        match event {
            ScanEvent::Entry(payload) => payloads.push(payload),
            ScanEvent::Progress(stats) => {
                pb.set_message(format!(
                    "Scanning... {} files, {} ghosts ({})",
                    stats.files_visited,
                    stats.files_matched,
                    format_size(stats.bytes_reclaimable, BINARY)
                ));
                pb.tick();
            }
            ScanEvent::Finished { stats, status } => {
                final_stats = stats;
                if let RunStatus::Failed(reason) = status {
                    failure = Some(reason);
                }
            }
        }
    }

    pb.finish_and_clear();
    let _ = handle.join();
    if let Some(reason) = failure {
        bail!("scan failed: {}", reason);
    }
    Ok((payloads, final_stats))
}

fn cmd_scan(
    root: &PathBuf,
    filter: &PathBuf,
    ignore_case: bool,
    all: bool,
    json: bool,
) -> Result<()> {
    let (payloads, stats) = run_scan(root, filter, ignore_case, json)?;

    if json {
        #[derive(serde::Serialize)]
        struct Report<'a> {
            root: &'a PathBuf,
            ghosts: Vec<&'a ScanPayload>,
            stats: &'a ScanStats,
        }
        let report = Report {
            root,
            ghosts: payloads.iter().filter(|p| p.is_ghost()).collect(),
            stats: &stats,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for payload in &payloads {
        if payload.is_ghost() {
            println!(
                "{}  {:>10}  {}  {}",
                "ghost".red().bold(),
                format_size(payload.size, BINARY),
                format_mtime(payload.mtime),
                payload.rel_path
            );
        } else if all {
            println!(
                "{}  {:>10}  {}  {}",
                "  ok ".green(),
                format_size(payload.size, BINARY),
                format_mtime(payload.mtime),
                payload.rel_path
            );
        }
    }

    print_scan_summary(&stats);
    Ok(())
}

fn cmd_sweep(
    root: &PathBuf,
    filter: &PathBuf,
    ignore_case: bool,
    dry_run: bool,
    yes: bool,
) -> Result<()> {
    let (payloads, stats) = run_scan(root, filter, ignore_case, false)?;

    let targets: Vec<DeleteTarget> = payloads
        .iter()
        .filter(|p| p.is_ghost())
        .map(|p| DeleteTarget {
            path: p.path.clone(),
            size: p.size,
        })
        .collect();

    for payload in payloads.iter().filter(|p| p.is_ghost()) {
        println!(
            "{}  {:>10}  {}",
            "ghost".red().bold(),
            format_size(payload.size, BINARY),
            payload.rel_path
        );
    }
    print_scan_summary(&stats);

    if targets.is_empty() {
        println!("Nothing to delete.");
        return Ok(());
    }
    if dry_run {
        println!(
            "Dry run: {} files ({}) would be deleted.",
            targets.len(),
            format_size(stats.bytes_reclaimable, BINARY)
        );
        return Ok(());
    }
    if !yes && !confirm(targets.len())? {
        println!("Aborted.");
        return Ok(());
    }

    let worker = DeleteWorker::new(targets, CancelToken::new());
    let (receiver, handle) = worker.spawn();
    let mut result = None;

    for event in receiver {
        match event {
            DeleteEvent::Entry(entry) => {
                if let DeleteOutcome::Failed(reason) = &entry.outcome {
                    eprintln!(
                        "{} {}: {}",
                        "failed".yellow().bold(),
                        entry.path.display(),
                        reason
                    );
                }
            }
            DeleteEvent::Finished(r) => result = Some(r),
        }
    }
    let _ = handle.join();

    let result = result.context("delete worker ended without a result")?;
    println!(
        "\nDeleted {} files ({} freed), {} failed.",
        result.succeeded.to_string().green().bold(),
        format_size(result.bytes_freed, BINARY),
        if result.failed > 0 {
            result.failed.to_string().red().bold()
        } else {
            result.failed.to_string().normal()
        }
    );
    Ok(())
}

fn confirm(count: usize) -> Result<bool> {
    print!("Delete {} files? [y/N] ", count);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}

fn print_scan_summary(stats: &ScanStats) {
    println!(
        "\n{} files visited, {} dirs, {} ghosts ({} reclaimable), {} errors{}",
        stats.files_visited,
        stats.dirs_visited,
        stats.files_matched.to_string().red().bold(),
        format_size(stats.bytes_reclaimable, BINARY),
        stats.errors,
        if stats.dirs_skipped > 0 {
            format!(", {} cyclic dirs skipped", stats.dirs_skipped)
        } else {
            String::new()
        }
    );
}

fn format_mtime(mtime: Option<SystemTime>) -> String {
    match mtime {
        Some(t) => chrono::DateTime::<chrono::Local>::from(t)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        None => "----------- --:--".to_string(),
    }
}
