mod catalog;
mod reports;
mod storage;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};

use catalog::CatalogSource;
use reports::{StatusReport, write_console_overview, write_console_status, write_json};
use storage::FileStorage;
use waystone_game::{DEFAULT_REGION_ID, Persisted, ProgressTracker, TrackerConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human readable, colored output
    Console,
    /// Pretty-printed JSON
    Json,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Show the current region, step and progress
    Status,
    /// List every region with its completion figures
    Regions,
    /// Complete a step in the current region
    Complete {
        /// Step id within the current region
        step_id: u32,
    },
    /// Switch to a region by id
    Select {
        /// Region id, e.g. west-limgrave
        region_id: String,
    },
    /// Switch to the region after the current one
    NextRegion,
    /// Switch to the region before the current one
    PreviousRegion,
    /// Mark every step incomplete
    Reset,
    /// Remove all saved progress and selection
    Clear,
}

#[derive(Debug, Parser)]
#[command(name = "waystone", version)]
#[command(about = "Track completion progress through game regions and their steps")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// File holding saved progress
    #[arg(long, default_value = ".waystone/progress.json")]
    state_file: PathBuf,

    /// Region catalog JSON; the bundled catalog is used when omitted
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Region selected when no saved selection is usable
    #[arg(long, default_value = DEFAULT_REGION_ID)]
    default_region: String,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

type Tracker = ProgressTracker<CatalogSource, FileStorage>;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut tracker = ProgressTracker::open(
        CatalogSource::from_arg(args.catalog.clone()),
        FileStorage::new(&args.state_file),
        TrackerConfig {
            default_region_id: args.default_region.clone(),
        },
    );
    log::debug!(
        "Opened {} regions from {}",
        tracker.regions().len(),
        args.state_file.display()
    );

    let command = args.command.clone().unwrap_or(Command::Status);
    let persisted = run_command(&mut tracker, &command);

    let mut out = open_output(args.output.as_deref())?;
    write_report(&mut out, &args, &tracker, &command, persisted)?;
    out.flush()?;
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn run_command(tracker: &mut Tracker, command: &Command) -> Option<Persisted> {
    match command {
        Command::Status | Command::Regions => None,
        Command::Complete { step_id } => Some(tracker.complete_step(*step_id)),
        Command::Select { region_id } => Some(tracker.select_region(region_id)),
        Command::NextRegion => Some(tracker.switch_to_next_region()),
        Command::PreviousRegion => Some(tracker.switch_to_previous_region()),
        Command::Reset => Some(tracker.reset_progress()),
        Command::Clear => Some(tracker.clear_storage()),
    }
}

fn write_report(
    out: &mut dyn Write,
    args: &Args,
    tracker: &Tracker,
    command: &Command,
    persisted: Option<Persisted>,
) -> Result<()> {
    if matches!(command, Command::Regions) {
        let overview = tracker.overview();
        return match args.report {
            ReportFormat::Json => write_json(out, &overview),
            ReportFormat::Console => {
                write_console_overview(out, &overview, &tracker.state().current_region_id)
            }
        };
    }

    let report = StatusReport::capture(tracker, persisted);
    match args.report {
        ReportFormat::Json => write_json(out, &report),
        ReportFormat::Console => write_console_status(out, &report),
    }
}

/// Buffered report sink: the `--output` file when given, stdout otherwise.
fn open_output(path: Option<&Path>) -> Result<BufWriter<Box<dyn Write>>> {
    let sink: Box<dyn Write> = match path {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        ),
        None => Box::new(stdout()),
    };
    Ok(BufWriter::new(sink))
}
