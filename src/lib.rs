//! labelconf: parse, validate and export labeling-interface configs.
//!
//! A labeling config is a small XML document describing an annotation UI:
//! *object* tags show data (`<Image>`, `<Text>`...) and *control* tags produce
//! results about it (`<RectangleLabels>`, `<Choices>`...). labelconf parses a
//! config into a linked [`LabelInterface`], validates configs and the
//! annotation results produced against them, and derives secondary artifacts
//! (a normalized schema dict, JSON Schema, sample tasks).
//!
//! # Modules
//!
//! - [`tags`]: Control and object tag types and result value shapes
//! - [`config`]: Config parsing, reference linking and the normalized dict
//! - [`validation`]: Config grammar/name checks and result validation
//! - [`region`]: Result regions and relations
//! - [`sample`]: Sample task and prediction generation
//! - [`error`]: Error types for labelconf operations

pub mod config;
pub mod error;
pub mod region;
pub mod sample;
mod schema;
pub mod tags;
pub mod validation;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};

pub use config::LabelInterface;
pub use error::LabelConfigError;
pub use region::{Direction, Region};
pub use sample::SampleMode;
pub use tags::{ControlKind, ControlTag, ObjectKind, ObjectTag, TagRegistry};
pub use validation::ValidationReport;

/// The labelconf CLI application.
#[derive(Parser)]
#[command(name = "labelconf")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Validate a labeling config and report every problem found.
    Validate(ValidateArgs),
    /// Print the JSON Schema of a config's controls.
    Schema(SchemaArgs),
    /// Print example task data (or a sample prediction) for a config.
    Sample(SampleArgs),
    /// Print the normalized schema dict of a config.
    Parse(ParseArgs),
    /// Check predictions or annotations against a config.
    Check(CheckArgs),
}

/// Report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Sample mode as accepted on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SampleModeArg {
    Upload,
    EditorPreview,
}

impl From<SampleModeArg> for SampleMode {
    fn from(arg: SampleModeArg) -> Self {
        match arg {
            SampleModeArg::Upload => SampleMode::Upload,
            SampleModeArg::EditorPreview => SampleMode::EditorPreview,
        }
    }
}

/// Arguments for the validate subcommand.
#[derive(clap::Args)]
struct ValidateArgs {
    /// Labeling config (XML) to validate.
    config: PathBuf,

    /// Treat warnings as errors (exit non-zero if any warnings).
    #[arg(long)]
    strict: bool,

    /// Output format for the report.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

/// Arguments for the schema subcommand.
#[derive(clap::Args)]
struct SchemaArgs {
    /// Labeling config (XML).
    config: PathBuf,

    /// Only print the schema of this control.
    #[arg(long)]
    control: Option<String>,
}

/// Arguments for the sample subcommand.
#[derive(clap::Args)]
struct SampleArgs {
    /// Labeling config (XML).
    config: PathBuf,

    /// Where the sample will be shown.
    #[arg(long, value_enum, default_value_t = SampleModeArg::Upload)]
    mode: SampleModeArg,

    /// Use URL-shaped values for text and hypertext.
    #[arg(long)]
    secure: bool,

    /// Print a sample prediction instead of task data.
    #[arg(long)]
    prediction: bool,
}

/// Arguments for the parse subcommand.
#[derive(clap::Args)]
struct ParseArgs {
    /// Labeling config (XML).
    config: PathBuf,
}

/// Arguments for the check subcommand.
#[derive(clap::Args)]
struct CheckArgs {
    /// Labeling config (XML).
    config: PathBuf,

    /// JSON file holding one prediction/annotation, a list of them, or a bare
    /// result list.
    predictions: PathBuf,

    /// Output format for the report.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

/// Run the labelconf CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), LabelConfigError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Validate(args)) => run_validate(args),
        Some(Commands::Schema(args)) => run_schema(args),
        Some(Commands::Sample(args)) => run_sample(args),
        Some(Commands::Parse(args)) => run_parse(args),
        Some(Commands::Check(args)) => run_check(args),
        None => {
            println!("labelconf {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Parse, validate and export labeling-interface configs.");
            println!();
            println!("Run 'labelconf --help' for usage information.");
            Ok(())
        }
    }
}

fn read_interface(path: &Path) -> Result<LabelInterface, LabelConfigError> {
    let config = fs::read_to_string(path)?;
    LabelInterface::parse(&config)
}

fn read_json(path: &Path) -> Result<Value, LabelConfigError> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|source| LabelConfigError::JsonParse {
        path: path.to_path_buf(),
        source,
    })
}

fn print_json(value: &Value) -> Result<(), LabelConfigError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn report_json(report: &ValidationReport) -> Value {
    json!({
        "error_count": report.error_count(),
        "warning_count": report.warning_count(),
        "issues": report.issues,
    })
}

/// Execute the validate subcommand.
fn run_validate(args: ValidateArgs) -> Result<(), LabelConfigError> {
    let config = fs::read_to_string(&args.config)?;
    let report = validation::validate_config_report(&config)?;

    match args.output {
        OutputFormat::Json => print_json(&report_json(&report))?,
        OutputFormat::Text => print!("{}", report),
    }

    let has_errors = report.error_count() > 0;
    let has_warnings = report.warning_count() > 0;

    if has_errors || (args.strict && has_warnings) {
        Err(LabelConfigError::ValidationFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        })
    } else {
        Ok(())
    }
}

/// Execute the schema subcommand.
fn run_schema(args: SchemaArgs) -> Result<(), LabelConfigError> {
    let li = read_interface(&args.config)?;
    let schema = match args.control.as_deref() {
        Some(name) => li.control_json_schema(name)?,
        None => li.to_json_schema()?,
    };
    print_json(&schema)
}

/// Execute the sample subcommand.
fn run_sample(args: SampleArgs) -> Result<(), LabelConfigError> {
    let li = read_interface(&args.config)?;
    let output = if args.prediction {
        li.generate_sample_prediction()?
    } else {
        Value::Object(li.generate_sample_task(args.mode.into(), args.secure)?)
    };
    print_json(&output)
}

/// Execute the parse subcommand.
fn run_parse(args: ParseArgs) -> Result<(), LabelConfigError> {
    let li = read_interface(&args.config)?;
    print_json(&serde_json::to_value(li.parsed_config())?)
}

/// Execute the check subcommand.
fn run_check(args: CheckArgs) -> Result<(), LabelConfigError> {
    let li = read_interface(&args.config)?;
    let payload = read_json(&args.predictions)?;

    // A list whose items all carry `result` is a batch; anything else is a
    // single payload.
    let payloads: Vec<&Value> = match &payload {
        Value::Array(items)
            if !items.is_empty() && items.iter().all(|item| item.get("result").is_some()) =>
        {
            items.iter().collect()
        }
        single => vec![single],
    };

    let reports: Vec<ValidationReport> = payloads
        .iter()
        .map(|payload| li.check_prediction(payload))
        .collect();

    match args.output {
        OutputFormat::Json => {
            let entries: Vec<Value> = reports
                .iter()
                .enumerate()
                .map(|(index, report)| {
                    let mut entry = report_json(report);
                    entry["index"] = json!(index);
                    entry["valid"] = json!(report.is_ok());
                    entry
                })
                .collect();
            print_json(&Value::Array(entries))?;
        }
        OutputFormat::Text => {
            for (index, report) in reports.iter().enumerate() {
                if report.is_clean() {
                    println!("prediction[{}]: ok", index);
                } else {
                    println!("prediction[{}]:", index);
                    print!("{}", report);
                }
            }
        }
    }

    let mut merged = ValidationReport::new();
    for report in reports {
        merged.merge(report);
    }
    if merged.is_ok() {
        Ok(())
    } else {
        Err(LabelConfigError::ValidationFailed {
            error_count: merged.error_count(),
            warning_count: merged.warning_count(),
            report: merged,
        })
    }
}
