//! Liftflux CLI - Command-line interface for Liftflux
//!
//! Commands:
//! - ingest: Replace the dataset with an uploaded workout log
//! - exercises: List logged exercises
//! - anatomy: Volume per muscle group
//! - predict: Forecast and rank one exercise
//! - add: Log a single set
//! - settings: Read or update the bodyweight
//! - doctor: Diagnose dataset and configuration health

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::NaiveDate;
use liftflux::adapters::{CsvAdapter, JsonRowsAdapter, TabularAdapter};
use liftflux::store::{CsvStore, WorkoutStore};
use liftflux::types::NewEntry;
use liftflux::{ComputeError, LiftProcessor, UserConfig, LIFTFLUX_VERSION, PRODUCER_NAME};
use serde::Serialize;

/// Liftflux - Workout log analytics and strength forecasting
#[derive(Parser)]
#[command(name = "liftflux")]
#[command(author = "Liftflux Contributors")]
#[command(version = LIFTFLUX_VERSION)]
#[command(about = "Clean workout logs, forecast one-rep maxes, rank strength", long_about = None)]
struct Cli {
    /// Workout dataset (CSV)
    #[arg(long, global = true, default_value = "gym_data_clean.csv")]
    data: PathBuf,

    /// User settings (JSON)
    #[arg(long, global = true, default_value = "user_config.json")]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace the dataset with an uploaded workout log
    Ingest {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "csv")]
        input_format: InputFormat,

        /// Field delimiter for CSV input
        #[arg(long, default_value = ",")]
        delimiter: char,
    },

    /// List logged exercises
    Exercises,

    /// Total volume per muscle group
    Anatomy,

    /// Forecast and rank one exercise
    Predict {
        /// Exercise name, exactly as logged
        exercise: String,

        /// Project from this date instead of today (YYYY-MM-DD)
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Log a single set
    Add {
        /// Date of the set (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        /// Exercise name
        #[arg(long)]
        exercise: String,

        /// Load lifted
        #[arg(long)]
        weight: f64,

        /// Repetitions
        #[arg(long)]
        reps: u32,
    },

    /// Read or update user settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Diagnose dataset and configuration health
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the current settings
    Get,
    /// Update the bodyweight
    Set {
        #[arg(long)]
        bodyweight: f64,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Delimited text with a header row
    Csv,
    /// JSON array of row objects
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(io::stderr)
        .init();

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

fn run(cli: Cli) -> Result<(), LiftCliError> {
    match cli.command {
        Commands::Ingest {
            input,
            input_format,
            delimiter,
        } => cmd_ingest(&cli.data, &cli.config, &input, input_format, delimiter),
        Commands::Exercises => {
            let processor = open_processor(&cli.data, &cli.config)?;
            print_json(&processor.exercises()?, false)
        }
        Commands::Anatomy => {
            let processor = open_processor(&cli.data, &cli.config)?;
            print_json(&processor.anatomy()?, false)
        }
        Commands::Predict {
            exercise,
            today,
            pretty,
        } => {
            let processor = open_processor(&cli.data, &cli.config)?;
            let insight = match today {
                Some(today) => processor.predict_as_of(&exercise, today)?,
                None => processor.predict(&exercise)?,
            };
            print_json(&insight, pretty)
        }
        Commands::Add {
            date,
            exercise,
            weight,
            reps,
        } => {
            let processor = open_processor(&cli.data, &cli.config)?;
            let report = processor.add_entry(&NewEntry {
                date,
                exercise,
                weight,
                reps,
            })?;
            print_json(&report, false)
        }
        Commands::Settings { action } => cmd_settings(&cli.config, action),
        Commands::Doctor { json } => cmd_doctor(&cli.data, &cli.config, json),
    }
}

fn open_processor(data: &Path, config: &Path) -> Result<LiftProcessor<CsvStore>, LiftCliError> {
    let config = UserConfig::load_with_env(config)?;
    Ok(LiftProcessor::with_config(CsvStore::new(data), config))
}

fn cmd_ingest(
    data: &Path,
    config: &Path,
    input: &Path,
    input_format: InputFormat,
    delimiter: char,
) -> Result<(), LiftCliError> {
    let input_data = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    if input_data.trim().is_empty() {
        return Err(LiftCliError::EmptyInput);
    }

    let adapter: Box<dyn TabularAdapter> = match input_format {
        InputFormat::Csv => {
            let delimiter = u8::try_from(delimiter).map_err(|_| {
                LiftCliError::InvalidArgument(format!("delimiter '{}' is not ASCII", delimiter))
            })?;
            Box::new(CsvAdapter::with_delimiter(delimiter))
        }
        InputFormat::Json => Box::new(JsonRowsAdapter),
    };

    let processor = open_processor(data, config)?;
    let report = processor.upload_with(adapter.as_ref(), &input_data)?;
    print_json(&report, true)
}

fn cmd_settings(config_path: &Path, action: SettingsAction) -> Result<(), LiftCliError> {
    match action {
        SettingsAction::Get => {
            let config = UserConfig::load_with_env(config_path)?;
            print_json(&config, false)
        }
        SettingsAction::Set { bodyweight } => {
            let config = UserConfig::with_bodyweight(bodyweight)?;
            config.save(config_path)?;
            print_json(&config, false)
        }
    }
}

fn cmd_doctor(data: &Path, config: &Path, json: bool) -> Result<(), LiftCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "liftflux_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Liftflux version {}", LIFTFLUX_VERSION),
    });

    checks.push(check_dataset(data));
    checks.push(check_config(config));

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (pass a file to ingest)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (ingest --input - ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: LIFTFLUX_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Liftflux Doctor Report");
        println!("======================");
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
        Err(LiftCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn check_dataset(data: &Path) -> DoctorCheck {
    let (status, message) = if !data.exists() {
        (
            CheckStatus::Warning,
            format!("{} does not exist yet, run ingest first", data.display()),
        )
    } else {
        match CsvStore::new(data).read() {
            Ok(sets) if sets.is_empty() => (
                CheckStatus::Warning,
                "Dataset has no usable workout rows".to_string(),
            ),
            Ok(sets) => (
                CheckStatus::Ok,
                format!("Dataset valid ({} sets)", sets.len()),
            ),
            Err(e) => (CheckStatus::Error, format!("Cannot read dataset: {}", e)),
        }
    };

    DoctorCheck {
        name: "dataset".to_string(),
        status,
        message,
    }
}

fn check_config(config: &Path) -> DoctorCheck {
    let (status, message) = if !config.exists() {
        (
            CheckStatus::Warning,
            format!("{} does not exist, using defaults", config.display()),
        )
    } else {
        match UserConfig::load_with_env(config) {
            Ok(config) => (
                CheckStatus::Ok,
                format!("Bodyweight {}", config.bodyweight),
            ),
            Err(e) => (CheckStatus::Error, format!("Invalid config: {}", e)),
        }
    };

    DoctorCheck {
        name: "config".to_string(),
        status,
        message,
    }
}

// Helper functions

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<(), LiftCliError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}

// Error types

#[derive(Debug)]
enum LiftCliError {
    Io(io::Error),
    Compute(ComputeError),
    Json(serde_json::Error),
    EmptyInput,
    InvalidArgument(String),
    DoctorFailed,
}

impl From<io::Error> for LiftCliError {
    fn from(e: io::Error) -> Self {
        LiftCliError::Io(e)
    }
}

impl From<ComputeError> for LiftCliError {
    fn from(e: ComputeError) -> Self {
        LiftCliError::Compute(e)
    }
}

impl From<serde_json::Error> for LiftCliError {
    fn from(e: serde_json::Error) -> Self {
        LiftCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<LiftCliError> for CliError {
    fn from(e: LiftCliError) -> Self {
        match e {
            LiftCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            LiftCliError::Compute(e) => compute_error(e),
            LiftCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            LiftCliError::EmptyInput => CliError {
                code: "EMPTY_INPUT".to_string(),
                message: "Input is empty".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            LiftCliError::InvalidArgument(msg) => CliError {
                code: "INVALID_ARGUMENT".to_string(),
                message: msg,
                hint: None,
            },
            LiftCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

fn compute_error(e: ComputeError) -> CliError {
    let (code, hint) = match &e {
        ComputeError::FormatRejected { .. } => (
            "FORMAT_REJECTED",
            Some("Input needs exercise, date, weight and reps columns (Hevy exports work as-is)"),
        ),
        ComputeError::NoValidRows { .. } => (
            "NO_VALID_ROWS",
            Some("Sets must be dated 2024 or later with positive weight and reps"),
        ),
        ComputeError::EmptyDataset => ("EMPTY_DATASET", Some("Run 'liftflux ingest' first")),
        ComputeError::InsufficientData { .. } => (
            "INSUFFICIENT_DATA",
            Some("Log the exercise on at least two sets"),
        ),
        ComputeError::DateOutOfRange(_) => ("DATE_OUT_OF_RANGE", Some("Pass an earlier --today")),
        ComputeError::InvalidEntry(_) => ("INVALID_ENTRY", None),
        ComputeError::InvalidBodyweight(_) => {
            ("INVALID_BODYWEIGHT", Some("Bodyweight must be a positive number"))
        }
        ComputeError::ParseError(_) | ComputeError::CsvError(_) => {
            ("PARSE_ERROR", Some("Check input format"))
        }
        ComputeError::JsonError(_) => ("JSON_ERROR", Some("Check JSON syntax")),
        ComputeError::IoError(_) => ("IO_ERROR", Some("Check file paths and permissions")),
        ComputeError::StoreError(_) => ("STORE_ERROR", None),
    };

    CliError {
        code: code.to_string(),
        message: e.to_string(),
        hint: hint.map(str::to_string),
    }
}

// Report types

#[derive(Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
