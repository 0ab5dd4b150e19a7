use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use octofhir_hl7validator::{Context, Validator, ValidatorConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "validate-hl7")]
#[command(about = "Validate an HL7 v2 message against a rule-language profile")]
#[command(version)]
struct Cli {
    /// Path to the rules file
    rules: PathBuf,
    /// Path to the message file
    message: PathBuf,
    /// Print nothing, only set the exit code
    #[arg(short, long)]
    quiet: bool,
    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,
    /// Register a pkg:// namespace root (NAMESPACE=DIR), may be repeated
    #[arg(short, long = "package", value_name = "NAMESPACE=DIR", value_parser = parse_package)]
    packages: Vec<(String, PathBuf)>,
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Log compilation and validation progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn parse_package(value: &str) -> std::result::Result<(String, PathBuf), String> {
    match value.split_once('=') {
        Some((namespace, dir)) if !namespace.is_empty() && !dir.is_empty() => {
            Ok((namespace.to_string(), PathBuf::from(dir)))
        }
        _ => Err(format!("expected NAMESPACE=DIR, got '{value}'")),
    }
}

const EXIT_VALID: u8 = 0;
const EXIT_INVALID: u8 = 1;
const EXIT_FAILURE: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(context) => ExitCode::from(report(&cli, &context)),
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn run(cli: &Cli) -> std::result::Result<Context, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => ValidatorConfig::from_json_file(path)?,
        None => ValidatorConfig::default(),
    };
    if config.import_base_dir.is_none() {
        config.import_base_dir = cli.rules.parent().map(Path::to_path_buf);
    }
    for (namespace, dir) in &cli.packages {
        config = config.with_package(namespace.clone(), dir.clone());
    }

    let rules = std::fs::read_to_string(&cli.rules)?;
    let message = std::fs::read(&cli.message)?;

    let context = Validator::new(rules)
        .with_config(config)
        .validate_bytes(&message)?;
    Ok(context)
}

fn exit_status(context: &Context) -> u8 {
    if context.is_valid() {
        EXIT_VALID
    } else {
        EXIT_INVALID
    }
}

fn render_text(context: &Context) -> String {
    if context.is_valid() {
        return "Message is valid.\n".to_string();
    }
    let mut out = String::from("Message is invalid:\n");
    for outcome in context.errors() {
        out.push_str(&format!(" * {outcome}\n"));
    }
    out
}

fn report(cli: &Cli, context: &Context) -> u8 {
    let status = exit_status(context);
    if cli.quiet {
        return status;
    }

    match cli.format {
        Format::Json => match serde_json::to_string_pretty(&context.report()) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("Error: {err}");
                return EXIT_FAILURE;
            }
        },
        Format::Text => print!("{}", render_text(context)),
    }
    status
}
