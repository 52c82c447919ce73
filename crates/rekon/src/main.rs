use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

use rekon_core::{AuditReport, ConflictPolicy, ImportCandidate, ImportStatus, ImportSummary};
use rekon_lib::commands::{self, ImportOptions, ImportOutcome, Session};
use rekon_lib::config::AppConfig;
use rekon_lib::logging::init_logging;

/// Reconcile a broadcast song inventory with the files it points at
#[derive(Parser, Debug)]
#[command(name = "rekon", version, about)]
struct Cli {
    /// Configuration file (overrides REKON_CONFIG and the user config)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Inventory database, overriding the configured one
    #[arg(long, global = true, env = "REKON_DATABASE")]
    database: Option<PathBuf>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create or upgrade the inventory database
    Init,

    /// Classify files as new, duplicate or conflict without importing
    Preview {
        /// Audio files or directories
        #[arg(required = true)]
        paths: Vec<String>,

        /// Write the candidates as JSON for a later `import --candidates`
        #[arg(long)]
        save: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// Import files into the inventory
    Import {
        /// Audio files or directories
        #[arg(required_unless_present = "candidates")]
        paths: Vec<String>,

        /// Decision for conflicts without one
        #[arg(long, value_enum, default_value_t = ConflictArg::Skip)]
        on_conflict: ConflictArg,

        /// Show what would be written
        #[arg(long)]
        dry_run: bool,

        /// Candidates saved by `preview --save`
        #[arg(long, conflicts_with = "paths")]
        candidates: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// Check every record's file: found, virtual, moved or missing
    Audit {
        #[arg(long)]
        json: bool,
    },

    /// List library files no record points at
    Untracked {
        #[arg(long)]
        json: bool,
    },

    /// Scan folders for tags and write a metadata snapshot
    Snapshot {
        #[arg(required = true)]
        folders: Vec<String>,

        /// Output file (defaults to the configured metadata_snapshot)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Worker threads
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Manage the genre table
    Genre {
        #[command(subcommand)]
        action: GenreCommand,
    },
}

#[derive(Subcommand, Debug)]
enum GenreCommand {
    /// Add a genre unless it exists
    Add { name: String },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum ConflictArg {
    Skip,
    Merge,
    Import,
}

impl From<ConflictArg> for ConflictPolicy {
    fn from(arg: ConflictArg) -> Self {
        match arg {
            ConflictArg::Skip => ConflictPolicy::Skip,
            ConflictArg::Merge => ConflictPolicy::Merge,
            ConflictArg::Import => ConflictPolicy::Import,
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let (mut config, source) = AppConfig::load(cli.config.as_deref())?;
    info!("Configuration: {:?}", source);
    if let Some(database) = cli.database {
        config.database = database;
    }

    match cli.command {
        Command::Snapshot {
            folders,
            out,
            workers,
        } => {
            let Some(out) = out.or_else(|| config.metadata_snapshot.clone()) else {
                bail!("No output file: pass --out or set metadata_snapshot in the config");
            };
            let count = commands::snapshot(&folders, &out, workers.or(config.snapshot_workers))?;
            println!("{} files written to {}", count, out.display());
            Ok(ExitCode::SUCCESS)
        }
        command => run(command, Session::open(config)?),
    }
}

fn run(command: Command, mut session: Session) -> Result<ExitCode> {
    match command {
        Command::Init => {
            let report = commands::init(&session)?;
            println!(
                "{}: {} songs, {} artists, {} genres, {} decades",
                report.database, report.songs, report.artists, report.genres, report.decades
            );
        }
        Command::Preview { paths, save, json } => {
            let candidates = commands::preview(&session, &paths)?;
            if let Some(file) = save {
                commands::save_candidates(&file, &candidates)?;
            }
            if json {
                print_json(&candidates)?;
            } else {
                print_candidates(&candidates);
            }
        }
        Command::Import {
            paths,
            on_conflict,
            dry_run,
            candidates,
            json,
        } => {
            let options = ImportOptions {
                paths,
                on_conflict: on_conflict.into(),
                dry_run,
                candidates,
            };
            let outcome = commands::import(&session, &options)?;
            if json {
                print_json(&outcome)?;
            } else if let ImportOutcome::Executed { summary } = &outcome {
                print_summary(summary);
            } else if let ImportOutcome::DryRun { plan } = &outcome {
                for item in plan {
                    let action = match (&item.record, item.merge_into) {
                        (Some(_), _) => "create".to_string(),
                        (None, Some(id)) => format!("merge into {}", id),
                        (None, None) => "skip".to_string(),
                    };
                    println!("{:<10} {:<14} {}", label(item.status), action, item.file_path);
                }
            }
            if let ImportOutcome::Executed { summary } = &outcome {
                if summary.has_errors() {
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Command::Audit { json } => {
            let report = commands::audit(&session)?;
            if json {
                print_json(&report)?;
            } else {
                print_audit(&report);
            }
        }
        Command::Untracked { json } => {
            let files = commands::untracked(&session)?;
            if json {
                print_json(&files)?;
            } else {
                for file in &files {
                    println!("{}", file);
                }
                println!("{} untracked files", files.len());
            }
        }
        Command::Genre {
            action: GenreCommand::Add { name },
        } => {
            let id = commands::genre_add(&mut session, &name)?;
            println!("{} -> {}", name.trim(), id);
        }
        Command::Snapshot { .. } => bail!("snapshot does not use the inventory"),
    }
    Ok(ExitCode::SUCCESS)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to encode output")?
    );
    Ok(())
}

fn label(status: ImportStatus) -> &'static str {
    match status {
        ImportStatus::New => "new",
        ImportStatus::Duplicate => "duplicate",
        ImportStatus::Conflict => "conflict",
    }
}

fn print_candidates(candidates: &[ImportCandidate]) {
    for c in candidates {
        let mut line = format!(
            "{:<10} {} - {}  ({})",
            label(c.status),
            c.metadata.artist,
            c.metadata.title,
            c.file_path
        );
        if let Some(existing) = &c.existing_path {
            line.push_str(&format!("  [existing: {}]", existing));
        }
        println!("{}", line);
        for diff in &c.diff {
            println!("           {}: {} -> {}", diff.field, diff.old, diff.new);
        }
    }
    let count = |s| candidates.iter().filter(|c| c.status == s).count();
    println!(
        "{} files: {} new, {} duplicate, {} conflict",
        candidates.len(),
        count(ImportStatus::New),
        count(ImportStatus::Duplicate),
        count(ImportStatus::Conflict)
    );
}

fn print_summary(summary: &ImportSummary) {
    for result in summary.results.iter().filter(|r| !r.success) {
        println!(
            "{:?}: {} ({})",
            result.action,
            result.file_path,
            result.error.as_deref().unwrap_or("")
        );
    }
    println!(
        "{} total: {} imported, {} skipped, {} errors, {} artists created, {} conflicts resolved",
        summary.total,
        summary.successful,
        summary.skipped,
        summary.errors,
        summary.artists_created,
        summary.conflicts_resolved
    );
}

fn print_audit(report: &AuditReport) {
    for entry in &report.moved {
        println!("MOVED   #{} {} - {}  {}", entry.id, entry.artist, entry.title, entry.db_path);
        for candidate in &entry.candidates {
            println!("        -> {}", candidate);
        }
    }
    for entry in &report.missing {
        println!("MISSING #{} {} - {}  {}", entry.id, entry.artist, entry.title, entry.db_path);
    }
    println!(
        "{} records: {} found, {} virtual, {} moved, {} missing, {} without path",
        report.total,
        report.found,
        report.virtual_present,
        report.moved.len(),
        report.missing.len(),
        report.no_path
    );
}
