//! Pedestrian CLI - Command-line interface for the step history engine
//!
//! Commands:
//! - ingest: Merge raw samples into a record store file
//! - streak: Print the current and longest goal streaks
//! - summary: Print step, distance and floor totals
//! - validate: Check raw samples for invalid ranges and distances
//! - doctor: Diagnose store and settings files

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use pedestrian_core::calendar::day_bounds;
use pedestrian_core::pipeline::{parse_samples_array, parse_samples_ndjson, StepProcessor};
use pedestrian_core::summary::{summarize_between, summarize_records, ActivitySummary};
use pedestrian_core::types::{DailyRecord, DistanceUnit, RawSample};
use pedestrian_core::{
    MemoryRecordStore, PedestrianError, RecordStore, Settings, StreakCalculator,
    PEDESTRIAN_VERSION, PRODUCER_NAME,
};

/// Pedestrian - step history engine
#[derive(Parser)]
#[command(name = "pedestrian")]
#[command(version = PEDESTRIAN_VERSION)]
#[command(about = "Merge pedometer samples and compute goal streaks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge raw samples into the record store
    Ingest {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Record store file (created if missing)
        #[arg(short, long)]
        store: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format for the merged records
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Settings file (JSON)
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Daily step goal (overrides the settings file)
        #[arg(long)]
        goal: Option<u32>,
    },

    /// Print current and longest goal streaks
    Streak {
        /// Record store file
        #[arg(short, long)]
        store: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print totals and averages over the stored history
    Summary {
        /// Record store file
        #[arg(short, long)]
        store: PathBuf,

        /// First day to include (YYYY-MM-DD, UTC)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last day to include (YYYY-MM-DD, UTC)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Distance unit (overrides the settings file)
        #[arg(long)]
        unit: Option<UnitArg>,

        /// Settings file (JSON)
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate raw samples
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose store and settings files
    Doctor {
        /// Check record store file
        #[arg(long)]
        store: Option<PathBuf>,

        /// Check settings file
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one sample per line)
    Ndjson,
    /// JSON array of samples
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// JSON array of records
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, Copy, ValueEnum)]
enum UnitArg {
    Miles,
    Kilometers,
}

impl From<UnitArg> for DistanceUnit {
    fn from(unit: UnitArg) -> Self {
        match unit {
            UnitArg::Miles => DistanceUnit::Miles,
            UnitArg::Kilometers => DistanceUnit::Kilometers,
        }
    }
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr, filtered by `PEDESTRIAN_LOG` (default: warn)
fn init_logging() {
    let filter = EnvFilter::try_from_env("PEDESTRIAN_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), PedestrianCliError> {
    match cli.command {
        Commands::Ingest {
            input,
            store,
            input_format,
            output_format,
            settings,
            goal,
        } => cmd_ingest(
            &input,
            &store,
            input_format,
            output_format,
            settings.as_deref(),
            goal,
        ),

        Commands::Streak { store, json } => cmd_streak(&store, json),

        Commands::Summary {
            store,
            from,
            to,
            unit,
            settings,
            json,
        } => cmd_summary(&store, from, to, unit, settings.as_deref(), json),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Doctor {
            store,
            settings,
            json,
        } => cmd_doctor(store.as_deref(), settings.as_deref(), json),
    }
}

fn cmd_ingest(
    input: &Path,
    store_path: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    settings_path: Option<&Path>,
    goal: Option<u32>,
) -> Result<(), PedestrianCliError> {
    let mut settings = load_settings(settings_path)?;
    if let Some(goal) = goal {
        settings.daily_step_goal = goal;
        settings.validate()?;
    }

    let samples = read_samples(input, &input_format)?;
    if samples.is_empty() {
        return Err(PedestrianCliError::NoSamples);
    }

    let mut processor = StepProcessor::with_store(load_store(store_path)?);
    let merged = processor.ingest(&samples, &settings)?;

    write_store(store_path, &processor.save_records()?)?;
    tracing::info!(
        store = %store_path.display(),
        records = processor.store().len(),
        "Saved record store"
    );

    print!("{}", format_output(&merged, &output_format)?);
    Ok(())
}

fn cmd_streak(store_path: &Path, json: bool) -> Result<(), PedestrianCliError> {
    let store = read_store(store_path)?;
    let streak = StreakCalculator::from_store(&store)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&streak)?);
    } else {
        println!("Current streak: {}", pluralize_days(streak.current));
        println!("Longest streak: {}", pluralize_days(streak.longest));
        if let (Some(start), Some(end)) = (streak.range_start, streak.range_end) {
            println!(
                "Current run:    {} to {}",
                start.format("%Y-%m-%d"),
                end.format("%Y-%m-%d")
            );
        }
    }

    Ok(())
}

fn cmd_summary(
    store_path: &Path,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    unit: Option<UnitArg>,
    settings_path: Option<&Path>,
    json: bool,
) -> Result<(), PedestrianCliError> {
    let settings = load_settings(settings_path)?;
    let unit = unit.map(DistanceUnit::from).unwrap_or(settings.distance_unit);

    let store = read_store(store_path)?;
    let records = store.all().map_err(PedestrianError::store)?;
    let summary = summarize_window(&records, from, to)?;

    if json {
        let report = SummaryReport {
            summary: summary.clone(),
            average_steps: summary.average_steps(),
            average_distance_meters: summary.average_distance_meters(),
            distance: summary.distance_in(unit),
            distance_unit: unit,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Activity Summary");
        println!("================");
        println!("Days:             {}", summary.days);
        println!("Goal days:        {}", summary.goal_days);
        println!("Total steps:      {}", summary.total_steps);
        println!(
            "Total distance:   {:.2} {}",
            summary.distance_in(unit),
            unit.label()
        );
        println!("Floors ascended:  {}", summary.total_floors_ascended);
        println!("Floors descended: {}", summary.total_floors_descended);
        if let Some(avg) = summary.average_steps() {
            println!("Average steps:    {:.0}", avg);
        }
    }

    Ok(())
}

fn summarize_window(
    records: &[DailyRecord],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<ActivitySummary, PedestrianCliError> {
    if from.is_none() && to.is_none() {
        return Ok(summarize_records(records));
    }

    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err(PedestrianError::InvalidDate(format!(
                "--from {} is after --to {}",
                from, to
            ))
            .into());
        }
    }

    let lower = match from {
        Some(date) => day_bounds(date, &Utc)?.0,
        None => chrono::DateTime::<Utc>::MIN_UTC,
    };
    let upper = match to {
        Some(date) => day_bounds(date, &Utc)?.1,
        None => chrono::DateTime::<Utc>::MAX_UTC,
    };

    Ok(summarize_between(records, lower, upper))
}

fn cmd_validate(
    input: &Path,
    input_format: InputFormat,
    json: bool,
) -> Result<(), PedestrianCliError> {
    let samples = read_samples(input, &input_format)?;

    let errors: Vec<ValidationErrorDetail> = samples
        .iter()
        .enumerate()
        .filter_map(|(index, sample)| {
            sample.validate().err().map(|e| ValidationErrorDetail {
                index,
                error: e.to_string(),
            })
        })
        .collect();

    let report = ValidationReport {
        total_samples: samples.len(),
        valid_samples: samples.len() - errors.len(),
        invalid_samples: errors.len(),
        errors,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total samples:   {}", report.total_samples);
        println!("Valid samples:   {}", report.valid_samples);
        println!("Invalid samples: {}", report.invalid_samples);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - Sample {}: {}", err.index, err.error);
            }
        }
    }

    if report.invalid_samples > 0 {
        Err(PedestrianCliError::ValidationFailed(report.invalid_samples))
    } else {
        Ok(())
    }
}

fn cmd_doctor(
    store: Option<&Path>,
    settings: Option<&Path>,
    json: bool,
) -> Result<(), PedestrianCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("{} {}", PRODUCER_NAME, PEDESTRIAN_VERSION),
    });

    if let Some(store_path) = store {
        checks.push(check_file(store_path, "store", |content| {
            let store = MemoryRecordStore::from_json(content)?;
            let streak = StreakCalculator::from_store(&store)?;
            Ok(format!(
                "Record store valid ({} days, current streak {})",
                store.len(),
                streak.current
            ))
        }));
    }

    if let Some(settings_path) = settings {
        checks.push(check_file(settings_path, "settings", |content| {
            let settings = Settings::from_json(content)?;
            Ok(format!(
                "Settings valid (goal {} steps, {})",
                settings.daily_step_goal,
                settings.distance_unit.as_str()
            ))
        }));
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (ready for `ingest --input -`)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: PEDESTRIAN_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Pedestrian Doctor Report");
        println!("========================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(PedestrianCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn check_file(
    path: &Path,
    name: &str,
    inspect: impl FnOnce(&str) -> Result<String, PedestrianError>,
) -> DoctorCheck {
    if !path.exists() {
        return DoctorCheck {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: format!("{} does not exist", path.display()),
        };
    }

    let (status, message) = match fs::read_to_string(path) {
        Ok(content) => match inspect(&content) {
            Ok(message) => (CheckStatus::Ok, message),
            Err(e) => (CheckStatus::Error, format!("Invalid {} file: {}", name, e)),
        },
        Err(e) => (CheckStatus::Error, format!("Cannot read {} file: {}", name, e)),
    };

    DoctorCheck {
        name: name.to_string(),
        status,
        message,
    }
}

// Helper functions

fn read_input(input: &Path) -> Result<String, PedestrianCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn read_samples(input: &Path, format: &InputFormat) -> Result<Vec<RawSample>, PedestrianCliError> {
    let data = read_input(input)?;
    let samples = match format {
        InputFormat::Ndjson => parse_samples_ndjson(&data)?,
        InputFormat::Json => parse_samples_array(&data)?,
    };
    Ok(samples)
}

/// Replace the store file via a sibling temp file so an interrupted write
/// leaves the previous snapshot intact
fn write_store(path: &Path, json: &str) -> Result<(), PedestrianCliError> {
    let mut tmp_name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| "records.json".into());
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    fs::write(&tmp_path, json)?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}

/// Load a store snapshot, starting empty when the file does not exist yet
fn load_store(path: &Path) -> Result<MemoryRecordStore, PedestrianCliError> {
    if !path.exists() {
        tracing::info!(store = %path.display(), "Record store not found, starting empty");
        return Ok(MemoryRecordStore::new());
    }
    read_store(path)
}

fn read_store(path: &Path) -> Result<MemoryRecordStore, PedestrianCliError> {
    let json = fs::read_to_string(path)?;
    Ok(MemoryRecordStore::from_json(&json)?)
}

fn load_settings(path: Option<&Path>) -> Result<Settings, PedestrianCliError> {
    match path {
        Some(path) => Ok(Settings::from_json(&fs::read_to_string(path)?)?),
        None => Ok(Settings::default()),
    }
}

fn format_output(records: &[DailyRecord], format: &OutputFormat) -> Result<String, PedestrianCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for record in records {
                lines.push(serde_json::to_string(record)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(records)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(records)?),
    }
}

fn pluralize_days(count: u32) -> String {
    if count == 1 {
        "1 day".to_string()
    } else {
        format!("{} days", count)
    }
}

// Error types

#[derive(Debug)]
enum PedestrianCliError {
    Io(io::Error),
    Engine(PedestrianError),
    Json(serde_json::Error),
    NoSamples,
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for PedestrianCliError {
    fn from(e: io::Error) -> Self {
        PedestrianCliError::Io(e)
    }
}

impl From<PedestrianError> for PedestrianCliError {
    fn from(e: PedestrianError) -> Self {
        PedestrianCliError::Engine(e)
    }
}

impl From<serde_json::Error> for PedestrianCliError {
    fn from(e: serde_json::Error) -> Self {
        PedestrianCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<PedestrianCliError> for CliError {
    fn from(e: PedestrianCliError) -> Self {
        match e {
            PedestrianCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            PedestrianCliError::Engine(e) => {
                let (code, hint) = match &e {
                    PedestrianError::InvalidRange { .. } => {
                        ("INVALID_RANGE", "Run 'pedestrian validate' for details")
                    }
                    PedestrianError::InvalidSample(_) => {
                        ("INVALID_SAMPLE", "Run 'pedestrian validate' for details")
                    }
                    PedestrianError::InvalidGoal(_) => {
                        ("INVALID_GOAL", "Use a daily step goal greater than zero")
                    }
                    PedestrianError::InvalidDate(_) => ("INVALID_DATE", "Use YYYY-MM-DD dates"),
                    PedestrianError::Store(_) => {
                        ("STORE_ERROR", "Check the record store file")
                    }
                    _ => ("PARSE_ERROR", "Ensure input contains raw sample JSON"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            PedestrianCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            PedestrianCliError::NoSamples => CliError {
                code: "NO_SAMPLES".to_string(),
                message: "No samples found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            PedestrianCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} samples failed validation", count),
                hint: Some("Fix sample ranges so end is after start".to_string()),
            },
            PedestrianCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct SummaryReport {
    #[serde(flatten)]
    summary: ActivitySummary,
    average_steps: Option<f64>,
    average_distance_meters: Option<f64>,
    distance: f64,
    distance_unit: DistanceUnit,
}

#[derive(serde::Serialize)]
struct ValidationReport {
    total_samples: usize,
    valid_samples: usize,
    invalid_samples: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    error: String,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
