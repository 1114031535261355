mod cli;
mod core;

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cli::html::Zoom;
use crate::cli::output::{detect_color, OutputFormat, OutputOptions};
use crate::core::config::AppConfig;
use crate::core::models::request::{parse_date_arg, ReportKind, ReportOptions};
use crate::core::state::UiState;

#[derive(Parser)]
#[command(name = "ccview", about = "Viewer for ccusage token and cost reports", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Only include usage on or after this date (YYYY-MM-DD or YYYYMMDD)
    #[arg(long, global = true, value_parser = parse_date_arg)]
    since: Option<NaiveDate>,

    /// Only include usage on or before this date (YYYY-MM-DD or YYYYMMDD)
    #[arg(long, global = true, value_parser = parse_date_arg)]
    until: Option<NaiveDate>,

    /// Ask ccusage for JSON and render structured tables
    #[arg(short = 'j', long = "json", global = true)]
    json: bool,

    /// Show per-model breakdown rows
    #[arg(short, long, global = true)]
    breakdown: bool,

    /// Output format (html|text)
    #[arg(short, long, global = true)]
    format: Option<String>,

    /// Write the rendered output to a file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Font scale of HTML output in percent (50-200)
    #[arg(long, global = true)]
    zoom: Option<u16>,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    /// Verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Usage grouped by day
    Daily,
    /// Usage grouped by month
    Monthly,
    /// Usage grouped by conversation session
    Session,
    /// Usage grouped by 5-hour billing block
    Blocks,
    /// Poll the active billing block until Ctrl-C
    Live,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Generate default config file
    Init,
    /// Validate config file and locate the ccusage launcher
    Check,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ccview={}", default_level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "using default config");
            AppConfig::default()
        }
    };

    let format_name = cli
        .format
        .as_deref()
        .unwrap_or(config.settings.default_format.as_str());
    let Some(format) = OutputFormat::from_name(format_name) else {
        anyhow::bail!("Unknown format '{}' (expected html or text)", format_name);
    };

    let output_opts = OutputOptions {
        format,
        use_color: detect_color(!cli.no_color, &config.settings.color),
        zoom: Zoom::new(cli.zoom.unwrap_or(config.settings.zoom)),
        output: cli.output,
    };

    let options = ReportOptions {
        since: cli.since,
        until: cli.until,
        json: cli.json,
        breakdown: cli.breakdown,
    };

    let view = match cli.command {
        Commands::Daily => ReportKind::Daily,
        Commands::Monthly => ReportKind::Monthly,
        Commands::Session => ReportKind::Session,
        Commands::Blocks => ReportKind::Blocks,
        Commands::Live => ReportKind::BlocksLive,
        Commands::Config { action } => {
            return match action {
                ConfigAction::Init => cli::config_cmd::init(),
                ConfigAction::Check => cli::config_cmd::check(),
            };
        }
    };

    let mut state = UiState::new(view);
    if view.is_live() {
        cli::live_cmd::run(&mut state, &options, &config, &output_opts).await
    } else {
        cli::report_cmd::run(&mut state, &options, &config, &output_opts).await
    }
}
