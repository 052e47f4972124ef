//! CLI definition and command dispatch for the atlas pipeline.
//!
//! This module defines the command-line interface using `clap` and provides
//! the `run()` function that dispatches commands to the engine.
//!
//! ## Entry selection for `run`
//!
//! Explicit ids win. With none given, `--all` takes the archive catalog
//! listing, `--known` the structures already in the database, and otherwise
//! the `pdbs` list from the configuration is used. `--after-date`,
//! `--before-date` and `--exclude` then filter the resulting list.

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use rma_core::{planner, Config, Context, Executor, PipelineError};
use rma_db::Store;
use rma_utils::{ArchiveCatalog, FileCatalog, RetryingCatalog};

// ============================================================================
// CLI Definition
// ============================================================================

/// RNA 3D Motif Atlas update pipeline
#[derive(Parser, Debug)]
#[command(name = "rma")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, global = true, env = "RMA_CONFIG", default_value = "conf/motifatlas.yaml")]
    pub config: PathBuf,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, env = "RMA_VERBOSE")]
    pub verbose: bool,

    /// Suppress informational messages
    #[arg(short, long, global = true, env = "RMA_QUIET")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a stage or stage container
    #[command(after_help = r#"EXAMPLES:
    # Load unit information for two structures
    rma run units.info 1S72 1J5E

    # Run the whole update for everything in the archive catalog
    rma run update --all

    # Rerun one stage without its dependencies, recomputing its data
    rma run loops.extractor 1S72 --skip-dependencies --recalculate loops.extractor

    # Plan-only pass: log what would happen, write nothing
    rma run update --all --dry-run
"#)]
    Run(RunArgs),

    /// Populate a testing database from the configured entry list
    #[command(after_help = r#"EXAMPLES:
    # Seed the database named in the config; requires a `pdbs` list there
    rma bootstrap
"#)]
    Bootstrap,

    /// Commands dealing with 2D diagrams
    Ss {
        #[command(subcommand)]
        command: SsCommand,
    },
}

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Stage or stage container to run
    pub name: String,

    /// Entry ids to process; resolved from flags or config when omitted
    pub ids: Vec<String>,

    /// Alter nothing while running
    #[arg(long)]
    pub dry_run: bool,

    /// Run only the named stage, skipping its dependencies
    #[arg(long)]
    pub skip_dependencies: bool,

    /// Stage to skip (repeatable)
    #[arg(long = "skip-stage")]
    pub skip_stage: Vec<String>,

    /// Recalculate data for the given stage(s)
    #[arg(long)]
    pub recalculate: Vec<String>,

    /// Seed the random source used for handle allocation
    #[arg(long)]
    pub seed: Option<u64>,

    /// Use every structure in the archive catalog
    #[arg(long)]
    pub all: bool,

    /// Use only structures already known to the database
    #[arg(long)]
    pub known: bool,

    /// Keep only entries the archive released after this date
    #[arg(long)]
    pub after_date: Option<NaiveDate>,

    /// Keep only entries the archive released before this date
    #[arg(long)]
    pub before_date: Option<NaiveDate>,

    /// Excluded entry id(s) (repeatable)
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Ignore time gaps when deciding whether to rerun
    #[arg(long)]
    pub ignore_time: bool,
}

/// 2D diagram commands.
#[derive(Subcommand, Debug)]
pub enum SsCommand {
    /// Stage a 2D diagram for the next release commit
    Import {
        /// Diagram file to stage
        filename: PathBuf,

        /// Name to stage the diagram under (defaults to the file stem)
        #[arg(long)]
        ss_name: Option<String>,
    },
}

// ============================================================================
// Entry point
// ============================================================================

/// Parse arguments, set up logging and dispatch.
///
/// Returns `ExitCode::SUCCESS` on success, or `ExitCode::FAILURE` on any
/// stage failure or configuration error.
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    let filter = format!(
        "rma_core={log_level},rma_db={log_level},rma_utils={log_level},rma_cli={log_level}"
    );
    tracing_subscriber::fmt()
        .with_env_filter(&filter)
        .with_target(false)
        .init();

    let config = match Config::from_path(&cli.config) {
        Ok(config) => Arc::new(config),
        Err(err) => {
            eprintln!("Failed to load config {}: {err}", cli.config.display());
            return ExitCode::FAILURE;
        }
    };

    let store = match Store::open(&config.db.path) {
        Ok(store) => store,
        Err(err) => {
            eprintln!(
                "Failed to open database {}: {err}",
                config.db.path.display()
            );
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Command::Run(args) => handle_run(config, store, args),
        Command::Bootstrap => handle_bootstrap(config, store),
        Command::Ss { command } => handle_ss(config, command),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            eprintln!("Pipeline failed: {err}");
            ExitCode::FAILURE
        }
    }
}

// ============================================================================
// Command handlers
// ============================================================================

fn handle_run(config: Arc<Config>, store: Store, args: RunArgs) -> Result<(), PipelineError> {
    let entries = resolve_entries(&config, &store, &args)?;

    let mut ctx = Context::with_seed(config, store, args.seed);
    ctx.dry_run = args.dry_run;
    ctx.ignore_time = args.ignore_time;
    ctx.recalculate = args.recalculate.iter().cloned().collect();

    let exclude: BTreeSet<String> = args.skip_stage.iter().cloned().collect();
    let plan = planner::plan(&args.name, &exclude, args.skip_dependencies)?;

    Executor::new(&ctx).run(&plan, &entries)
}

fn handle_bootstrap(config: Arc<Config>, store: Store) -> Result<(), PipelineError> {
    if config.pdbs.is_empty() {
        return Err(PipelineError::InvalidConfiguration {
            message: "bootstrap needs a `pdbs` list in the config".into(),
            hint: "Add the structure codes to seed the database with".into(),
        });
    }
    let entries: Vec<String> = config.pdbs.iter().map(|pdb| pdb.to_uppercase()).collect();

    // Bootstrap runs are deterministic so test databases are comparable.
    let mut ctx = Context::with_seed(config, store, Some(1));
    ctx.recalculate = BTreeSet::new();

    let plan = planner::plan("update", &BTreeSet::new(), false)?;
    Executor::new(&ctx).run(&plan, &entries)
}

fn handle_ss(config: Arc<Config>, command: SsCommand) -> Result<(), PipelineError> {
    match command {
        SsCommand::Import { filename, ss_name } => {
            if !filename.is_file() {
                return Err(PipelineError::invalid_state(format!(
                    "Diagram {} does not exist",
                    filename.display()
                )));
            }
            let name = match &ss_name {
                Some(name) => name.clone(),
                None => filename
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .ok_or_else(|| {
                        PipelineError::invalid_state("Diagram file has no usable name")
                    })?,
            };
            let destination = config.locations.diagram_source.join(format!("{name}.png"));
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&filename, &destination)?;
            tracing::info!(
                "Staged diagram {} as {}",
                filename.display(),
                destination.display()
            );
            Ok(())
        }
    }
}

// ============================================================================
// Entry resolution
// ============================================================================

fn resolve_entries(
    config: &Config,
    store: &Store,
    args: &RunArgs,
) -> Result<Vec<String>, PipelineError> {
    let mut entries: Vec<String> = if !args.ids.is_empty() {
        args.ids.iter().map(|id| id.to_uppercase()).collect()
    } else if args.all {
        let catalog = RetryingCatalog::new(FileCatalog::new(&config.locations.catalog));
        catalog.current_entries()?
    } else if args.known {
        store.with_session(|session| session.pdb_ids())?
    } else {
        config.pdbs.iter().map(|pdb| pdb.to_uppercase()).collect()
    };

    if args.after_date.is_some() || args.before_date.is_some() {
        let catalog = RetryingCatalog::new(FileCatalog::new(&config.locations.catalog));
        entries = filter_by_date(&catalog, entries, args.after_date, args.before_date)?;
    }

    let excluded: BTreeSet<String> = args.exclude.iter().map(|id| id.to_uppercase()).collect();
    entries.retain(|entry| !excluded.contains(entry));

    Ok(entries)
}

/// Keep only entries whose archive release date falls inside the window.
/// Entries without a parseable date are dropped while a window is active.
fn filter_by_date(
    catalog: &impl ArchiveCatalog,
    entries: Vec<String>,
    after: Option<NaiveDate>,
    before: Option<NaiveDate>,
) -> Result<Vec<String>, PipelineError> {
    let mut kept = Vec::with_capacity(entries.len());
    for entry in entries {
        let record = catalog.entry_info(&entry)?;
        let date = record
            .release_date
            .as_deref()
            .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok());
        let Some(date) = date else {
            tracing::warn!(entry = %entry, "No release date in catalog, dropping from window");
            continue;
        };
        if let Some(after) = after {
            if date <= after {
                continue;
            }
        }
        if let Some(before) = before {
            if date >= before {
                continue;
            }
        }
        kept.push(entry);
    }
    Ok(kept)
}
