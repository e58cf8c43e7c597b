use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;

use anyhow::Result;
use chrono::Utc;
use clap::{ArgAction, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use hstat::command::{self, CommandBuilder, QuoteStyle};
use hstat::display;
use hstat::errors::HstatError;
use hstat::runner::ShellRunner;
use hstat::sample;
use hstat::settings::{self, CliOverrides};
use hstat::types::OutputFormat;

/// Exit code when the transfer tool is not installed, as a shell would report.
const EXIT_TOOL_NOT_FOUND: i32 = 127;

const INSTALL_HINTS: [&str; 2] = ["ubuntu: apt install curl", "alpine: apk add curl"];

#[derive(Parser)]
#[command(name = "hstat", version, about = "Measure web page speed")]
struct Cli {
    /// URL to measure
    url: String,

    /// Number of iterations
    #[arg(short, long)]
    iterations: Option<u32>,

    /// Pause in ms between iterations
    #[arg(short, long, value_name = "MS")]
    pause: Option<u64>,

    /// Show average
    #[arg(short, long)]
    average: bool,

    /// Show median
    #[arg(short, long)]
    median: bool,

    /// Show min
    #[arg(long)]
    min: bool,

    /// Show max
    #[arg(long)]
    max: bool,

    /// Arguments to pass to curl
    #[arg(short = 'r', long, allow_hyphen_values = true)]
    arguments: Option<String>,

    /// Hide iterations, leaving only summary rows
    #[arg(long)]
    hide_iterations: bool,

    /// Hide the total column
    #[arg(long)]
    hide_total: bool,

    #[arg(long, default_value = "table")]
    format: OutputFormat,

    /// Shorthand for --format json
    #[arg(long)]
    json: bool,

    /// Transfer tool to run
    #[arg(long)]
    tool: Option<String>,

    /// Settings file (default: <config dir>/hstat/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// More diagnostics (-v command lines and raw output, -vv everything)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Errors only
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "hstat=error",
        (false, 0) => "hstat=warn",
        (false, 1) => "hstat=debug",
        (false, _) => "hstat=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<()> {
    let file = settings::load(cli.config.as_deref())?;

    let config = settings::resolve(
        CliOverrides {
            url: cli.url,
            iterations: cli.iterations,
            pause: cli.pause,
            arguments: cli.arguments,
            tool: cli.tool,
            average: cli.average,
            median: cli.median,
            min: cli.min,
            max: cli.max,
            hide_iterations: cli.hide_iterations,
            hide_total: cli.hide_total,
            format: if cli.json { OutputFormat::Json } else { cli.format },
        },
        file,
    )?;

    let found = command::locate_tool(&config.tool)?;
    debug!("{} command found at {}", config.tool, found.display());

    let started_at = Utc::now();
    let builder = CommandBuilder::new(config.tool.as_str(), QuoteStyle::host());
    let series = sample::collect(&config, &builder, &ShellRunner)?;
    let report = display::build_report(&config, &series);

    match config.format {
        OutputFormat::Table => print!("{}", display::format_table(&report, config.hide_iterations)),
        OutputFormat::Json => println!(
            "{}",
            display::format_json(&config, &series, &report, started_at)
        ),
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if let Err(err) = run(cli) {
        eprintln!("{}", err);
        if let Some(HstatError::ToolNotFound { .. }) = err.downcast_ref::<HstatError>() {
            for hint in INSTALL_HINTS {
                eprintln!("{}", hint);
            }
            process::exit(EXIT_TOOL_NOT_FOUND);
        }
        process::exit(1);
    }
}
