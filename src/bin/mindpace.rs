//! Mindpace CLI - Command-line interface for the behavioral analysis engine
//!
//! Commands:
//! - extract: Fold an event log into a learning identity (batch mode)
//! - score: Score understanding for one slide visit
//! - validate: Validate event JSON against the boundary requirements

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use mindpace::event::{parse_array, parse_ndjson, sort_by_timestamp, Event};
use mindpace::{
    AnalysisConfig, IdentityExtractor, LearningIdentity, ENGINE_VERSION, PRODUCER_NAME,
};

/// Mindpace - Behavioral analysis engine for adaptive learning
#[derive(Parser)]
#[command(name = "mindpace")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Turn learner events into identity and understanding signals", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fold an event log into a learning identity (batch mode)
    Extract {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Prior identity JSON file to blend with
        #[arg(long)]
        prior: Option<PathBuf>,

        /// Analysis configuration JSON file (defaults used when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Pretty-print output (defaults to on when stdout is a TTY)
        #[arg(long)]
        pretty: bool,
    },

    /// Score understanding for one slide visit
    Score {
        /// Seconds actually spent on the slide
        #[arg(long)]
        time_spent: u32,

        /// Expected seconds for the slide
        #[arg(long)]
        expected: u32,

        /// Average focus score over the visit (0-1)
        #[arg(long, default_value = "1.0")]
        avg_focus: f64,

        /// Pretty-print output
        #[arg(long)]
        pretty: bool,
    },

    /// Validate event JSON against the boundary requirements
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// JSON array of events
    Json,
    /// Newline-delimited JSON (one event per line)
    Ndjson,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliErrorEnvelope::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Extract {
            input,
            input_format,
            prior,
            config,
            pretty,
        } => cmd_extract(&input, input_format, prior.as_deref(), config.as_deref(), pretty),

        Commands::Score {
            time_spent,
            expected,
            avg_focus,
            pretty,
        } => cmd_score(time_spent, expected, avg_focus, pretty),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),
    }
}

fn cmd_extract(
    input: &PathBuf,
    input_format: InputFormat,
    prior: Option<&std::path::Path>,
    config: Option<&std::path::Path>,
    pretty: bool,
) -> Result<(), CliError> {
    let mut events = read_events(input, input_format)?;
    sort_by_timestamp(&mut events);

    let prior_identity: Option<LearningIdentity> = match prior {
        Some(path) => Some(serde_json::from_str(&fs::read_to_string(path)?)?),
        None => None,
    };

    let analysis_config = match config {
        Some(path) => AnalysisConfig::from_json(&fs::read_to_string(path)?)?,
        None => AnalysisConfig::default(),
    };

    let extractor = IdentityExtractor::new(analysis_config);
    let identity = extractor.extract(&events, prior_identity.as_ref());

    print_json(&identity, pretty)?;
    Ok(())
}

fn cmd_score(time_spent: u32, expected: u32, avg_focus: f64, pretty: bool) -> Result<(), CliError> {
    let assessment = mindpace::score_understanding(time_spent, expected, avg_focus);
    print_json(&assessment, pretty)?;
    Ok(())
}

fn cmd_validate(input: &PathBuf, input_format: InputFormat, json: bool) -> Result<(), CliError> {
    let events = read_events(input, input_format)?;

    let errors: Vec<ValidationErrorDetail> = events
        .iter()
        .enumerate()
        .filter_map(|(index, event)| {
            event.validate().err().map(|e| ValidationErrorDetail {
                index,
                event_type: event.event_type.as_str().to_string(),
                error: e.to_string(),
            })
        })
        .collect();

    let report = ValidationReport {
        producer: PRODUCER_NAME.to_string(),
        version: ENGINE_VERSION.to_string(),
        total_events: events.len(),
        invalid_events: errors.len(),
        errors,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total events:   {}", report.total_events);
        println!(
            "Valid events:   {}",
            report.total_events - report.invalid_events
        );
        println!("Invalid events: {}", report.invalid_events);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - Event {} ({}): {}", err.index, err.event_type, err.error);
            }
        }
    }

    if report.invalid_events > 0 {
        Err(CliError::ValidationFailed(report.invalid_events))
    } else {
        Ok(())
    }
}

// Helper functions

fn read_events(input: &PathBuf, format: InputFormat) -> Result<Vec<Event>, CliError> {
    let data = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let events = match format {
        InputFormat::Json => parse_array(&data)?,
        InputFormat::Ndjson => parse_ndjson(&data)?,
    };

    if events.is_empty() {
        return Err(CliError::NoEvents);
    }

    Ok(events)
}

fn print_json<T: serde::Serialize>(value: &T, pretty_flag: bool) -> Result<(), CliError> {
    let pretty = pretty_flag || atty::is(atty::Stream::Stdout);
    if pretty {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", serde_json::to_string(value)?);
    }
    Ok(())
}

// Error types

#[derive(Debug)]
enum CliError {
    Io(io::Error),
    Engine(mindpace::EngineError),
    Json(serde_json::Error),
    NoEvents,
    ValidationFailed(usize),
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}

impl From<mindpace::EngineError> for CliError {
    fn from(e: mindpace::EngineError) -> Self {
        CliError::Engine(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliErrorEnvelope {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<CliError> for CliErrorEnvelope {
    fn from(e: CliError) -> Self {
        match e {
            CliError::Io(e) => CliErrorEnvelope {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            CliError::Engine(e) => CliErrorEnvelope {
                code: "ENGINE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Ensure input matches the event schema".to_string()),
            },
            CliError::Json(e) => CliErrorEnvelope {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            CliError::NoEvents => CliErrorEnvelope {
                code: "NO_EVENTS".to_string(),
                message: "No events found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            CliError::ValidationFailed(count) => CliErrorEnvelope {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} events failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    producer: String,
    version: String,
    total_events: usize,
    invalid_events: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    event_type: String,
    error: String,
}
