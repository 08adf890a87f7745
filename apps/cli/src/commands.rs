//! CLI command definitions, routing, and tracing setup.

use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use dealscout_core::{
    ContactPipeline, ContactReport, ContactRequest, PassReport, ProgressReporter, ReportMode,
};
use dealscout_shared::{AppConfig, PipelineConfig, init_config, load_config, resolve_api_keys};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// DealScout: find the people worth talking to.
#[derive(Parser)]
#[command(
    name = "dealscout",
    version,
    about = "Discover marketing and leadership contacts at a company.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Result output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Find contacts at a company.
    Contacts {
        /// Company name as it appears on profiles.
        company: String,

        /// Named contact to surface first.
        #[arg(long)]
        champion: Option<String>,

        /// Output format.
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Skip link liveness checks and repair.
        #[arg(long)]
        no_validate: bool,

        /// Override the bucket size that stops escalation.
        #[arg(long)]
        min_bucket_size: Option<usize>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr so stdout stays
/// clean for results.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "dealscout=info",
        1 => "dealscout=debug",
        _ => "dealscout=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Contacts {
            company,
            champion,
            format,
            no_validate,
            min_bucket_size,
        } => {
            cmd_contacts(
                &company,
                champion.as_deref(),
                format,
                no_validate,
                min_bucket_size,
            )
            .await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_contacts(
    company: &str,
    champion: Option<&str>,
    format: OutputFormat,
    no_validate: bool,
    min_bucket_size: Option<usize>,
) -> Result<()> {
    let config = load_config()?;
    let keys = resolve_api_keys(&config)?;

    let mut pipeline_config = PipelineConfig::from(&config);
    if no_validate {
        pipeline_config.validate_links = false;
    }
    if let Some(size) = min_bucket_size {
        if size == 0 {
            return Err(eyre!("--min-bucket-size must be at least 1"));
        }
        pipeline_config.min_bucket_size = size;
    }

    info!(
        company,
        champion = champion.unwrap_or("-"),
        validate = pipeline_config.validate_links,
        "discovering contacts"
    );

    let pipeline = ContactPipeline::from_config(&config, pipeline_config, &keys)?;
    let request = ContactRequest {
        company: company.to_string(),
        champion: champion.map(str::to_string),
    };

    let reporter = CliProgress::new();
    let report = pipeline.run(&request, &reporter).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_report(&report),
    }
    Ok(())
}

fn print_report(report: &ContactReport) {
    println!("{}", report.text);

    let executed = report.passes.iter().filter(|p| p.executed).count();
    let mode = match report.mode {
        ReportMode::Bucketed => "bucketed",
        ReportMode::GroundedSweep => "grounded sweep",
        ReportMode::ManualResearch => "manual research",
    };

    eprintln!();
    eprintln!("  Company:   {}", report.company);
    eprintln!("  Contacts:  {}", report.links.len());
    eprintln!("  Mode:      {mode}");
    eprintln!("  Passes:    {executed}/{} executed", report.passes.len());
    eprintln!(
        "  Links:     {} valid, {} repaired, {} removed, {} unverified",
        report.validation.valid,
        report.validation.repaired,
        report.validation.removed,
        report.validation.kept_unverified
    );
    eprintln!("  Run:       {}", report.run_id);
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Spinner showing the current phase and pass.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn pass_finished(&self, report: &PassReport) {
        let status = if report.executed {
            format!("+{} new", report.added)
        } else {
            "skipped".to_string()
        };
        self.spinner
            .set_message(format!("{} [{}] {status}", report.name, report.bucket));
    }

    fn done(&self, _report: &ContactReport) {
        self.spinner.finish_and_clear();
    }
}
