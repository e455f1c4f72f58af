//! ImpactScore - before/after impact scoring for volunteering surveys
//!
//! A CLI tool that loads a survey dataset, aggregates initial and final
//! answers per question, and reports the weighted average change.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad arguments, unreadable dataset, unknown opportunity, etc.)

mod analysis;
mod cli;
mod config;
mod models;
mod pipeline;
mod report;
mod source;

use anyhow::{Context, Result};
use cli::{Args, Command, OutputFormat};
use config::{Config, CONFIG_FILE};
use models::OpportunityReport;
use report::MarkdownOptions;
use source::Dataset;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(&args, &config);

    info!("ImpactScore v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args, config).await {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .impactscore.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to set the dataset path, output format and precision.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so reports written to stdout stay clean.
fn init_logging(args: &Args, config: &Config) {
    let level = if config.general.verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load configuration from file or use defaults, then apply CLI overrides.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = match args.config {
        // An explicit config path must load.
        Some(ref config_path) => Config::load(config_path)?,
        None => match Config::load_default() {
            Ok(Some(config)) => config,
            Ok(None) => Config::default(),
            Err(e) => {
                eprintln!("⚠️  Ignoring {}: {:#}", CONFIG_FILE, e);
                Config::default()
            }
        },
    };

    config.merge_with_args(args);
    config.validate()?;
    Ok(config)
}

/// Run the selected command.
async fn run(args: Args, config: Config) -> Result<()> {
    let command = args
        .command()
        .context("No command selected")?;

    let data_path = PathBuf::from(&config.data.path);
    let dataset = Dataset::load(&data_path).await?;
    let label = data_path.display().to_string();

    let output = execute(&dataset, command, args.entities.as_deref(), &config, &label)?;

    write_output(&output, config.general.output.as_deref())
}

/// Execute a command against a loaded dataset and render its output.
fn execute(
    dataset: &Dataset,
    command: Command,
    entities: Option<&[u64]>,
    config: &Config,
    label: &str,
) -> Result<String> {
    let format = config.report.format;

    match command {
        Command::Analyze(id) => {
            let report = pipeline::analyze_opportunity(dataset, id, label)?;
            render_reports(&[report], ReportShape::Single, config)
        }
        Command::AnalyzeAll => {
            let opportunities = pipeline::filter_opportunities(dataset, entities);
            info!("Analyzing {} opportunities", opportunities.len());

            let mut reports = Vec::with_capacity(opportunities.len());
            for opportunity in opportunities {
                reports.push(pipeline::analyze_opportunity(dataset, opportunity.id, label)?);
            }
            render_reports(&reports, ReportShape::Batch, config)
        }
        Command::List => {
            let listing = pipeline::list_opportunities(dataset, entities)?;
            match format {
                OutputFormat::Json => report::generate_json(&listing),
                OutputFormat::Markdown => Ok(report::generate_markdown_listing(&listing)),
            }
        }
        Command::Responses(id) => {
            let responses = pipeline::survey_responses(dataset, id)?;
            match format {
                OutputFormat::Json => report::generate_json(&responses),
                OutputFormat::Markdown => Ok(report::generate_markdown_responses(id, &responses)),
            }
        }
    }
}

/// JSON layout of analysis output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReportShape {
    /// `--opportunity`: the bare row array the surrounding system serves.
    Single,
    /// `--all`: an array of full reports, whatever the match count.
    Batch,
}

/// Render opportunity reports in the configured format.
fn render_reports(
    reports: &[OpportunityReport],
    shape: ReportShape,
    config: &Config,
) -> Result<String> {
    match config.report.format {
        OutputFormat::Json => match (shape, reports) {
            (ReportShape::Single, [report]) => report::generate_json(&report.rows),
            _ => report::generate_json(reports),
        },
        OutputFormat::Markdown => {
            let options = MarkdownOptions {
                precision: config.report.precision,
                highlight_count: config.report.highlight_count,
            };
            Ok(report::generate_markdown_report(reports, options))
        }
    }
}

/// Write to the output file, or stdout when none is configured.
fn write_output(output: &str, path: Option<&str>) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, output)
                .with_context(|| format!("Failed to write report to {}", path))?;
            println!("✅ Report saved to: {}", path);
        }
        None => {
            if output.is_empty() {
                warn!("Nothing to write");
            }
            println!("{}", output);
        }
    }

    Ok(())
}
