//! Fixtures CLI - Command-line interface for the demo fixture engine
//!
//! Commands:
//! - activities: List generated activities in a date range
//! - wellness: List daily wellness rows in a date range
//! - streams: Print the sensor streams of one activity
//! - intervals: Print the interval analysis of one activity
//! - doctor: Check dataset invariants and environment

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

use demo_fixtures::error::parse_date;
use demo_fixtures::{
    DateRange, FixtureConfig, FixtureError, FixtureRepository, FIXTURES_VERSION, PRODUCER_NAME,
};

/// Fixtures - deterministic synthetic training data for demo mode
#[derive(Parser)]
#[command(name = "fixtures")]
#[command(author = "Veloq Contributors")]
#[command(version = FIXTURES_VERSION)]
#[command(about = "Generate demo activities, wellness and streams", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Last day of the dataset (YYYY-MM-DD, default today)
    #[arg(long, global = true)]
    reference_date: Option<String>,

    /// Fixture configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "json-pretty")]
    output_format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List activities, newest first
    Activities {
        /// First day to include (YYYY-MM-DD)
        #[arg(long)]
        oldest: Option<String>,

        /// Last day to include (YYYY-MM-DD)
        #[arg(long)]
        newest: Option<String>,
    },

    /// List wellness rows, oldest first
    Wellness {
        /// First day to include (YYYY-MM-DD)
        #[arg(long)]
        oldest: Option<String>,

        /// Last day to include (YYYY-MM-DD)
        #[arg(long)]
        newest: Option<String>,
    },

    /// Print the streams of one activity
    Streams {
        /// Activity id (demo-YYYYMMDD-N)
        #[arg(long)]
        id: String,
    },

    /// Print the interval analysis of one activity
    Intervals {
        /// Activity id (demo-YYYYMMDD-N)
        #[arg(long)]
        id: String,
    },

    /// Check dataset invariants and environment
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
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

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let error = CliError::from(e);
            eprintln!(
                "{}",
                serde_json::to_string(&error).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr; `-v` overrides `RUST_LOG`
fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .init();
}

fn run(cli: Cli) -> Result<(), FixturesCliError> {
    let repository = load_repository(cli.reference_date.as_deref(), cli.config.as_deref())?;

    match cli.command {
        Commands::Activities { oldest, newest } => {
            let range = parse_range(oldest.as_deref(), newest.as_deref())?;
            print!("{}", format_output(&repository.get_activities(&range), &cli.output_format)?);
        }

        Commands::Wellness { oldest, newest } => {
            let range = parse_range(oldest.as_deref(), newest.as_deref())?;
            print!("{}", format_output(&repository.get_wellness(&range), &cli.output_format)?);
        }

        Commands::Streams { id } => {
            let streams = repository
                .get_activity_streams(&id)
                .ok_or(FixtureError::UnknownActivity(id))?;
            print!("{}", format_output(&streams.to_api_streams(), &cli.output_format)?);
        }

        Commands::Intervals { id } => {
            let report = repository
                .get_activity_intervals(&id)
                .ok_or(FixtureError::UnknownActivity(id))?;
            print!("{}", format_output(&report.icu_intervals, &cli.output_format)?);
        }

        Commands::Doctor { json } => cmd_doctor(&repository, json)?,
    }

    Ok(())
}

fn load_repository(
    reference_date: Option<&str>,
    config: Option<&Path>,
) -> Result<FixtureRepository, FixturesCliError> {
    let reference_date = match reference_date {
        Some(value) => parse_date(value)?,
        None => chrono::Local::now().date_naive(),
    };

    let config = match config {
        Some(path) => FixtureConfig::from_json(&fs::read_to_string(path)?)?,
        None => FixtureConfig::default(),
    };

    info!(%reference_date, days = config.days, "building dataset");
    Ok(FixtureRepository::with_config(reference_date, config))
}

fn parse_range(oldest: Option<&str>, newest: Option<&str>) -> Result<DateRange, FixturesCliError> {
    let oldest = oldest.map(parse_date).transpose()?;
    let newest = newest.map(parse_date).transpose()?;
    Ok(DateRange::new(oldest, newest))
}

fn cmd_doctor(repository: &FixtureRepository, json: bool) -> Result<(), FixturesCliError> {
    let all = DateRange::default();
    let activities = repository.get_activities(&all);
    let wellness = repository.get_wellness(&all);
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("{} {}", PRODUCER_NAME, FIXTURES_VERSION),
    });

    checks.push(if activities.is_empty() {
        DoctorCheck {
            name: "activities".to_string(),
            status: CheckStatus::Warning,
            message: "dataset has no activities (is `days` zero?)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "activities".to_string(),
            status: CheckStatus::Ok,
            message: format!("{} activities over {} days", activities.len(), wellness.len()),
        }
    });

    // Training load never goes negative
    let negative = wellness.iter().filter(|w| w.ctl < 0.0 || w.atl < 0.0).count();
    checks.push(DoctorCheck::from_count(
        "load_non_negative",
        negative,
        format!("{} wellness rows checked", wellness.len()),
    ));

    // One wellness row per calendar day, no gaps
    let gaps = wellness
        .windows(2)
        .filter(|pair| pair[1].id.signed_duration_since(pair[0].id).num_days() != 1)
        .count();
    checks.push(DoctorCheck::from_count(
        "wellness_contiguous",
        gaps,
        format!(
            "{} .. {}",
            wellness.first().map(|w| w.id.to_string()).unwrap_or_default(),
            wellness.last().map(|w| w.id.to_string()).unwrap_or_default()
        ),
    ));

    // Zone times add up to moving time
    let unbalanced = activities
        .iter()
        .filter(|a| {
            let hr_ok = a
                .icu_hr_zone_times
                .as_ref()
                .map_or(true, |z| z.iter().sum::<u32>() == a.moving_time);
            let power_ok = a
                .icu_zone_times
                .as_ref()
                .map_or(true, |z| z.iter().map(|t| t.secs).sum::<u32>() == a.moving_time);
            !(hr_ok && power_ok)
        })
        .count();
    checks.push(DoctorCheck::from_count(
        "zone_conservation",
        unbalanced,
        format!("{} activities checked", activities.len()),
    ));

    // Streams are aligned and end at the declared distance
    let mut misaligned = 0;
    let mut off_distance = 0;
    for activity in &activities {
        let Some(streams) = repository.get_activity_streams(&activity.id) else {
            misaligned += 1;
            continue;
        };
        if !streams.is_aligned() || streams.stream_types() != activity.stream_types {
            misaligned += 1;
        }
        if let Some(last) = streams.distance.as_ref().and_then(|d| d.last()) {
            if (last - activity.distance).abs() > 1.0 {
                off_distance += 1;
            }
        }
    }
    checks.push(DoctorCheck::from_count(
        "stream_alignment",
        misaligned,
        "every channel matches the time axis".to_string(),
    ));
    checks.push(DoctorCheck::from_count(
        "distance_exactness",
        off_distance,
        "stream distance ends at activity distance".to_string(),
    ));

    // Consecutive activities never reuse a route
    let repeats = activities
        .windows(2)
        .filter(|pair| pair[0].route_id.is_some() && pair[0].route_id == pair[1].route_id)
        .count();
    checks.push(DoctorCheck::from_count(
        "route_anti_repetition",
        repeats,
        "no route used on consecutive activities".to_string(),
    ));

    // Skyline payloads are standard base64
    let bad_skylines = activities
        .iter()
        .filter_map(|a| a.skyline_chart_bytes.as_deref())
        .filter(|payload| STANDARD.decode(payload).map_or(true, |bytes| bytes.is_empty()))
        .count();
    checks.push(DoctorCheck::from_count(
        "skyline_payloads",
        bad_skylines,
        "skyline payloads decode".to_string(),
    ));

    // Rebuilding from the same inputs yields the same data
    let rebuilt =
        FixtureRepository::with_config(repository.reference_date(), repository.config().clone());
    let deterministic =
        rebuilt.get_activities(&all) == activities && rebuilt.get_wellness(&all) == wellness;
    checks.push(DoctorCheck {
        name: "determinism".to_string(),
        status: if deterministic { CheckStatus::Ok } else { CheckStatus::Error },
        message: "rebuilt dataset compared".to_string(),
    });

    let stdout_check = if atty::is(atty::Stream::Stdout) {
        DoctorCheck {
            name: "stdout".to_string(),
            status: CheckStatus::Ok,
            message: "stdout is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdout".to_string(),
            status: CheckStatus::Ok,
            message: "stdout is a pipe (JSON output ready)".to_string(),
        }
    };
    checks.push(stdout_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: FIXTURES_VERSION.to_string(),
        reference_date: repository.reference_date().to_string(),
        activities: activities.len(),
        days: wellness.len(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Fixtures Doctor Report");
        println!("======================");
        println!("Producer:       {}", report.producer);
        println!("Version:        {}", report.version);
        println!("Reference date: {}", report.reference_date);
        println!("Days:           {}", report.days);
        println!("Activities:     {}", report.activities);
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
        Err(FixturesCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn format_output<T: Serialize>(
    records: &[T],
    format: &OutputFormat,
) -> Result<String, FixturesCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for record in records {
                lines.push(serde_json::to_string(record)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(records)? + "\n"),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(records)? + "\n"),
    }
}

// Error types

#[derive(Debug)]
enum FixturesCliError {
    Io(io::Error),
    Fixture(FixtureError),
    Json(serde_json::Error),
    DoctorFailed,
}

impl From<io::Error> for FixturesCliError {
    fn from(e: io::Error) -> Self {
        FixturesCliError::Io(e)
    }
}

impl From<FixtureError> for FixturesCliError {
    fn from(e: FixtureError) -> Self {
        FixturesCliError::Fixture(e)
    }
}

impl From<serde_json::Error> for FixturesCliError {
    fn from(e: serde_json::Error) -> Self {
        FixturesCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<FixturesCliError> for CliError {
    fn from(e: FixturesCliError) -> Self {
        match e {
            FixturesCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            FixturesCliError::Fixture(e) => {
                let hint = match &e {
                    FixtureError::InvalidDate(_) => "Dates use the YYYY-MM-DD format",
                    FixtureError::UnknownActivity(_) => "Run 'fixtures activities' to list ids",
                    FixtureError::Config(_) | FixtureError::JsonError(_) => {
                        "Check the configuration file"
                    }
                    FixtureError::Storage(_) => "Check the preference store",
                };
                CliError {
                    code: "FIXTURE_ERROR".to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            FixturesCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            FixturesCliError::DoctorFailed => CliError {
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
    reference_date: String,
    activities: usize,
    days: usize,
    checks: Vec<DoctorCheck>,
}

#[derive(Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

impl DoctorCheck {
    /// Ok when nothing failed, otherwise an error naming the failure count
    fn from_count(name: &str, failures: usize, detail: String) -> Self {
        if failures == 0 {
            DoctorCheck {
                name: name.to_string(),
                status: CheckStatus::Ok,
                message: detail,
            }
        } else {
            DoctorCheck {
                name: name.to_string(),
                status: CheckStatus::Error,
                message: format!("{failures} failures ({detail})"),
            }
        }
    }
}

#[derive(Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
