//! Vitals CLI - Command-line interface for the UrCare vitals engine
//!
//! Commands:
//! - classify: Classify a single measurement or blood pressure pair
//! - bmi: Compute and classify BMI
//! - score: Score a health profile
//! - trend: Analyze a reading series
//! - streak: Record a habit day against a persisted streak file
//! - tables: Print the loaded band tables
//! - doctor: Diagnose configuration files

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use urcare_vitals::pipeline::{parse_date, parse_readings_json, parse_readings_ndjson, VitalsProcessor};
use urcare_vitals::report::ReportEncoder;
use urcare_vitals::score::{round_half_up, HealthProfile, StandardWeights, WeightTable};
use urcare_vitals::tables::standard_tables;
use urcare_vitals::trend::{sort_newest_first, DEFAULT_TREND_WINDOW};
use urcare_vitals::{
    compute_bmi, Reading, ReadingKind, RangeClassifier, StreakBook, VitalsError, PRODUCER_NAME,
    VITALS_VERSION,
};

/// Vitals - classification, scoring, trend and streak engine for wellness trackers
#[derive(Parser)]
#[command(name = "vitals")]
#[command(author = "UrCare Engineering")]
#[command(version = VITALS_VERSION)]
#[command(about = "Classify vitals, score profiles and track streaks", long_about = None)]
struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "json")]
    output_format: OutputFormat,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a measurement against its band table
    Classify {
        /// Reading kind (e.g. bmi, glucose.fasting, symptom:headache)
        #[arg(long, requires = "value", conflicts_with_all = ["systolic", "diastolic"])]
        kind: Option<String>,

        /// Measured value
        #[arg(long, requires = "kind")]
        value: Option<f64>,

        /// Systolic pressure (mmHg)
        #[arg(long, requires = "diastolic")]
        systolic: Option<f64>,

        /// Diastolic pressure (mmHg)
        #[arg(long, requires = "systolic")]
        diastolic: Option<f64>,

        /// Band tables overlaid onto the built-in ones
        #[arg(long)]
        tables: Option<PathBuf>,
    },

    /// Compute BMI and its category
    Bmi {
        /// Weight in kilograms
        #[arg(long)]
        weight_kg: f64,

        /// Height in centimeters
        #[arg(long)]
        height_cm: f64,
    },

    /// Score a health profile
    Score {
        /// Profile JSON file (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Built-in weight table
        #[arg(long, default_value = "wellness")]
        scale: ScaleArg,

        /// Custom weight table file (overrides --scale)
        #[arg(long)]
        weights: Option<PathBuf>,
    },

    /// Analyze a series of readings of one kind
    Trend {
        /// Readings file (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Moving-average window
        #[arg(long, default_value_t = DEFAULT_TREND_WINDOW)]
        window: usize,

        /// Input is ordered oldest-first
        #[arg(long)]
        oldest_first: bool,
    },

    /// Record a habit day in a streak state file
    Streak {
        /// Streak state file (created if missing)
        #[arg(long)]
        state: PathBuf,

        /// Habit key
        #[arg(long)]
        habit: String,

        /// Date completed (YYYY-MM-DD)
        #[arg(long, conflicts_with = "miss", required_unless_present = "miss")]
        complete: Option<String>,

        /// Date missed (YYYY-MM-DD)
        #[arg(long)]
        miss: Option<String>,
    },

    /// Print the loaded band tables
    Tables {
        /// Band tables overlaid onto the built-in ones
        #[arg(long)]
        tables: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration files
    Doctor {
        /// Check band tables file
        #[arg(long)]
        tables: Option<PathBuf>,

        /// Check weight table file
        #[arg(long)]
        weights: Option<PathBuf>,

        /// Check streak state file
        #[arg(long)]
        streaks: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one reading per line)
    Ndjson,
    /// JSON array of readings
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, Copy, ValueEnum)]
enum ScaleArg {
    /// Wellness index (0-10)
    Wellness,
    /// Health score (0-100)
    Health,
}

impl From<ScaleArg> for StandardWeights {
    fn from(s: ScaleArg) -> Self {
        match s {
            ScaleArg::Wellness => StandardWeights::WellnessIndex,
            ScaleArg::Health => StandardWeights::HealthScore,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string()));
            ExitCode::FAILURE
        }
    }
}

/// Initialize tracing/logging. Logs go to stderr so stdout stays machine-readable.
fn init_tracing(json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "vitals=info".into());

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if json {
        subscriber
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }
}

fn run(cli: Cli) -> Result<(), VitalsCliError> {
    let format = cli.output_format;

    match cli.command {
        Commands::Classify {
            kind,
            value,
            systolic,
            diastolic,
            tables,
        } => cmd_classify(kind, value, systolic.zip(diastolic), tables.as_deref(), &format),

        Commands::Bmi { weight_kg, height_cm } => cmd_bmi(weight_kg, height_cm, &format),

        Commands::Score { input, scale, weights } => cmd_score(&input, scale, weights.as_deref(), &format),

        Commands::Trend {
            input,
            input_format,
            window,
            oldest_first,
        } => cmd_trend(&input, input_format, window, oldest_first, &format),

        Commands::Streak {
            state,
            habit,
            complete,
            miss,
        } => cmd_streak(&state, &habit, complete, miss, &format),

        Commands::Tables { tables, json } => cmd_tables(tables.as_deref(), json),

        Commands::Doctor {
            tables,
            weights,
            streaks,
            json,
        } => cmd_doctor(tables.as_deref(), weights.as_deref(), streaks.as_deref(), json),
    }
}

fn cmd_classify(
    kind: Option<String>,
    value: Option<f64>,
    pressure: Option<(f64, f64)>,
    tables: Option<&Path>,
    format: &OutputFormat,
) -> Result<(), VitalsCliError> {
    let processor = load_processor(tables)?;
    let now = chrono::Utc::now();

    let reading = match (kind, value, pressure) {
        (Some(kind), Some(value), _) => Reading::scalar(ReadingKind::from(kind), value, now),
        (_, _, Some((systolic, diastolic))) => Reading::blood_pressure(systolic, diastolic, None, now),
        _ => return Err(VitalsCliError::MissingMeasurement),
    };

    debug!(kind = %reading.kind, "classifying reading");
    let assessment = processor.assess(&reading)?;
    if assessment.needs_attention {
        warn!(
            kind = %reading.kind,
            label = %assessment.category.label,
            alert = assessment.category.alert_level.as_str(),
            "reading needs attention"
        );
    }

    print_report(&assessment, format)
}

fn cmd_bmi(weight_kg: f64, height_cm: f64, format: &OutputFormat) -> Result<(), VitalsCliError> {
    let bmi = round_half_up(compute_bmi(weight_kg, height_cm)?, 1);
    let category = RangeClassifier::standard().classify(bmi, &ReadingKind::Bmi)?;

    #[derive(Serialize)]
    struct BmiOutput {
        bmi: f64,
        category: urcare_vitals::Category,
    }

    print_report(&BmiOutput { bmi, category }, format)
}

fn cmd_score(
    input: &Path,
    scale: ScaleArg,
    weights: Option<&Path>,
    format: &OutputFormat,
) -> Result<(), VitalsCliError> {
    let profile: HealthProfile = serde_json::from_str(&read_input(input)?)?;
    let processor = VitalsProcessor::new();

    let score = match weights {
        Some(path) => {
            let table = WeightTable::from_json(&fs::read_to_string(path)?)?;
            info!(table = table.name(), "using custom weight table");
            processor.score_with(&profile, &table)?
        }
        None => processor.score_profile(&profile, scale.into())?,
    };

    debug!(value = score.score.value, factors = score.score.contributions.len(), "profile scored");
    print_report(&score, format)
}

fn cmd_trend(
    input: &Path,
    input_format: InputFormat,
    window: usize,
    oldest_first: bool,
    format: &OutputFormat,
) -> Result<(), VitalsCliError> {
    let input_data = read_input(input)?;

    let mut readings = match input_format {
        InputFormat::Ndjson => parse_readings_ndjson(&input_data)?,
        InputFormat::Json => parse_readings_json(&input_data)?,
    };

    if oldest_first {
        sort_newest_first(&mut readings);
    }

    info!(count = readings.len(), window, "analyzing series");
    let analysis = VitalsProcessor::new().analyze_series(&readings, window)?;
    print_report(&analysis, format)
}

fn cmd_streak(
    state: &Path,
    habit: &str,
    complete: Option<String>,
    miss: Option<String>,
    format: &OutputFormat,
) -> Result<(), VitalsCliError> {
    let mut processor = VitalsProcessor::new();

    if state.exists() {
        processor.load_streaks(&fs::read_to_string(state)?)?;
    } else {
        info!(path = %state.display(), "starting new streak state");
    }

    let update = match (complete, miss) {
        (Some(date), _) => processor.record_completion(habit, parse_date(&date)?)?,
        (None, Some(date)) => processor.record_miss(habit, parse_date(&date)?)?,
        (None, None) => return Err(VitalsCliError::MissingMeasurement),
    };

    if let Some(milestone) = &update.milestone {
        info!(habit, days = milestone.days, title = %milestone.title, "milestone reached");
    }

    fs::write(state, processor.save_streaks()?)?;
    print_report(&update, format)
}

fn cmd_tables(tables: Option<&Path>, json: bool) -> Result<(), VitalsCliError> {
    let processor = load_processor(tables)?;
    let classifier = processor.classifier();

    if json {
        println!("{}", serde_json::to_string_pretty(classifier)?);
        return Ok(());
    }

    for name in classifier.table_names() {
        let table = classifier.table(&ReadingKind::from(name.to_string()))?;
        println!("{}", name);

        let mut lower = table.floor();
        for band in table.bands() {
            let from = lower.map_or("-inf".to_string(), |v| v.to_string());
            let to = band.upper.map_or("inf".to_string(), |v| v.to_string());
            println!("  [{}, {})  {:<24} {}", from, to, band.label, band.alert_level.as_str());
            lower = band.upper;
        }
    }

    Ok(())
}

fn cmd_doctor(
    tables: Option<&Path>,
    weights: Option<&Path>,
    streaks: Option<&Path>,
    json: bool,
) -> Result<(), VitalsCliError> {
    let mut checks = Vec::new();

    // Built-in tables
    let invalid: Vec<&str> = standard_tables()
        .iter()
        .filter(|(_, table)| table.validate().is_err())
        .map(|(name, _)| *name)
        .collect();
    checks.push(if invalid.is_empty() {
        DoctorCheck {
            name: "builtin_tables".to_string(),
            status: CheckStatus::Ok,
            message: format!("{} built-in band tables valid", standard_tables().len()),
        }
    } else {
        DoctorCheck {
            name: "builtin_tables".to_string(),
            status: CheckStatus::Error,
            message: format!("Invalid built-in tables: {}", invalid.join(", ")),
        }
    });

    if let Some(path) = tables {
        checks.push(check_file("tables", path, |content| {
            let classifier = RangeClassifier::from_json(content)?;
            Ok(format!("{} band tables loaded", classifier.table_names().count()))
        }));
    }

    if let Some(path) = weights {
        checks.push(check_file("weights", path, |content| {
            let table = WeightTable::from_json(content)?;
            Ok(format!("Weight table '{}' with {} factors", table.name(), table.factors().len()))
        }));
    }

    if let Some(path) = streaks {
        checks.push(check_file("streaks", path, |content| {
            let book = StreakBook::from_json(content)?;
            Ok(format!("{} habits tracked", book.len()))
        }));
    }

    // Check stdin is available (for piping readings)
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
            message: "stdin is a pipe (readings can be piped with --input -)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: VITALS_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Vitals Doctor Report");
        println!("====================");
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

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(VitalsCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn check_file<F>(name: &str, path: &Path, parse: F) -> DoctorCheck
where
    F: FnOnce(&str) -> Result<String, VitalsError>,
{
    if !path.exists() {
        return DoctorCheck {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: format!("{} does not exist", path.display()),
        };
    }

    match fs::read_to_string(path) {
        Ok(content) => match parse(&content) {
            Ok(message) => DoctorCheck {
                name: name.to_string(),
                status: CheckStatus::Ok,
                message,
            },
            Err(e) => DoctorCheck {
                name: name.to_string(),
                status: CheckStatus::Error,
                message: e.to_string(),
            },
        },
        Err(e) => DoctorCheck {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: format!("Cannot read {}: {}", path.display(), e),
        },
    }
}

fn load_processor(tables: Option<&Path>) -> Result<VitalsProcessor, VitalsCliError> {
    let mut processor = VitalsProcessor::new();
    if let Some(path) = tables {
        processor.load_tables(&fs::read_to_string(path)?)?;
        debug!(path = %path.display(), "loaded band tables");
    }
    Ok(processor)
}

fn read_input(input: &Path) -> Result<String, VitalsCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn print_report<T: Serialize>(body: &T, format: &OutputFormat) -> Result<(), VitalsCliError> {
    let report = ReportEncoder::new().encode(body);
    let output = match format {
        OutputFormat::Json => serde_json::to_string(&report)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&report)?,
    };
    println!("{}", output);
    Ok(())
}

// Error types

#[derive(Debug)]
enum VitalsCliError {
    Io(io::Error),
    Engine(VitalsError),
    Json(serde_json::Error),
    MissingMeasurement,
    DoctorFailed,
}

impl From<io::Error> for VitalsCliError {
    fn from(e: io::Error) -> Self {
        VitalsCliError::Io(e)
    }
}

impl From<VitalsError> for VitalsCliError {
    fn from(e: VitalsError) -> Self {
        VitalsCliError::Engine(e)
    }
}

impl From<serde_json::Error> for VitalsCliError {
    fn from(e: serde_json::Error) -> Self {
        VitalsCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<VitalsCliError> for CliError {
    fn from(e: VitalsCliError) -> Self {
        match e {
            VitalsCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            VitalsCliError::Engine(e) => {
                let hint = match &e {
                    VitalsError::InvalidReading(_) => "Values must be finite and within the measurement's range",
                    VitalsError::Configuration(_) => "Run 'vitals doctor' to check table files",
                    VitalsError::OutOfOrder { .. } => "Streak dates must not go backwards",
                    VitalsError::JsonError(_) => "Check JSON syntax",
                    VitalsError::StoreError(_) => "Check the entry store",
                };
                CliError {
                    code: e.code().to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            VitalsCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            VitalsCliError::MissingMeasurement => CliError {
                code: "MISSING_MEASUREMENT".to_string(),
                message: "No measurement given".to_string(),
                hint: Some("Pass --kind with --value, or --systolic with --diastolic".to_string()),
            },
            VitalsCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
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
