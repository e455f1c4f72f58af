//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// ImpactScore - before/after impact scoring for volunteering surveys
///
/// Aggregates initial and final survey answers per question and reports
/// the weighted average change for each opportunity.
///
/// Examples:
///   impactscore --data survey.json --opportunity 42
///   impactscore --data survey.json --all --entities 1,2 --format json
///   impactscore --data survey.json --list
///   impactscore --data survey.json --responses 42
///   impactscore --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to the JSON survey dataset
    ///
    /// Defaults to the `[data] path` setting, or impactscore.json.
    #[arg(short, long, value_name = "FILE", env = "IMPACTSCORE_DATA")]
    pub data: Option<PathBuf>,

    /// Analyze a single opportunity
    #[arg(long, value_name = "ID")]
    pub opportunity: Option<u64>,

    /// Analyze every opportunity (respects --entities)
    #[arg(long)]
    pub all: bool,

    /// List opportunities with their response counts
    #[arg(long)]
    pub list: bool,

    /// List the response bundles of an opportunity
    #[arg(long, value_name = "ID")]
    pub responses: Option<u64>,

    /// Restrict to opportunities hosted by these offices (comma-separated)
    ///
    /// Member committee ids include all of their local committees.
    #[arg(long, value_name = "IDS", value_delimiter = ',')]
    pub entities: Option<Vec<u64>>,

    /// Output file path for the report (stdout when omitted)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Decimal places for scores in Markdown output
    #[arg(long, value_name = "N")]
    pub precision: Option<usize>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .impactscore.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .impactscore.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for reports.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// What the tool was asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Analyze(u64),
    AnalyzeAll,
    List,
    Responses(u64),
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The selected command, if exactly one was given.
    pub fn command(&self) -> Option<Command> {
        let mut selected = Vec::new();

        if let Some(id) = self.opportunity {
            selected.push(Command::Analyze(id));
        }
        if self.all {
            selected.push(Command::AnalyzeAll);
        }
        if self.list {
            selected.push(Command::List);
        }
        if let Some(id) = self.responses {
            selected.push(Command::Responses(id));
        }

        match selected.as_slice() {
            [command] => Some(*command),
            _ => None,
        }
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.command().is_none() {
            return Err(
                "Specify exactly one of --opportunity, --all, --list or --responses".to_string(),
            );
        }

        if self.entities.is_some() && !(self.all || self.list) {
            return Err("--entities only applies to --all and --list".to_string());
        }

        if let Some(precision) = self.precision {
            if precision > crate::config::MAX_PRECISION {
                return Err(format!(
                    "Precision must be at most {}",
                    crate::config::MAX_PRECISION
                ));
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
