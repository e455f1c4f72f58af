//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.impactscore.toml` files.

use crate::cli::OutputFormat;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".impactscore.toml";

/// Largest accepted number of decimal places in Markdown output.
pub const MAX_PRECISION: usize = 10;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Dataset settings.
    #[serde(default)]
    pub data: DataConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path. Reports go to stdout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Dataset location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path to the JSON dataset.
    #[serde(default = "default_data_path")]
    pub path: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
        }
    }
}

fn default_data_path() -> String {
    "impactscore.json".to_string()
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Decimal places for scores in Markdown tables.
    #[serde(default = "default_precision")]
    pub precision: usize,

    /// Number of largest changes to highlight.
    #[serde(default = "default_highlight_count")]
    pub highlight_count: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            precision: default_precision(),
            highlight_count: default_highlight_count(),
        }
    }
}

fn default_precision() -> usize {
    2
}

fn default_highlight_count() -> usize {
    5
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.impactscore.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(CONFIG_FILE);

        if path.exists() {
            Ok(Some(Self::load(&path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref data) = args.data {
            self.data.path = data.display().to_string();
        }

        if let Some(ref output) = args.output {
            self.general.output = Some(output.display().to_string());
        }

        if let Some(format) = args.format {
            self.report.format = format;
        }

        if let Some(precision) = args.precision {
            self.report.precision = precision;
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check settings that the file format alone cannot constrain.
    pub fn validate(&self) -> Result<()> {
        if self.report.precision > MAX_PRECISION {
            bail!(
                "report.precision must be at most {} (got {})",
                MAX_PRECISION,
                self.report.precision
            );
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::tests::make_args;
    use std::path::PathBuf;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.data.path, "impactscore.json");
        assert_eq!(config.report.precision, 2);
        assert_eq!(config.report.format, OutputFormat::Markdown);
        assert!(config.general.output.is_none());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "impact.md"
verbose = true

[data]
path = "exports/survey.json"

[report]
format = "json"
precision = 3
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output.as_deref(), Some("impact.md"));
        assert!(config.general.verbose);
        assert_eq!(config.data.path, "exports/survey.json");
        assert_eq!(config.report.format, OutputFormat::Json);
        assert_eq!(config.report.precision, 3);
        assert_eq!(config.report.highlight_count, 5);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[data]"));
        assert!(toml_str.contains("[report]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.report.precision, 2);
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        std::fs::write(dir.path().join(CONFIG_FILE), "[report]\nprecision = 4\n").unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.report.precision, 4);

        std::fs::write(dir.path().join(CONFIG_FILE), "[report\n").unwrap();
        assert!(Config::load_from_dir(dir.path()).is_err());
    }

    #[test]
    fn test_merge_with_args() {
        let mut config = Config::default();
        config.report.precision = 4;

        let mut args = make_args();
        args.data = Some(PathBuf::from("other.json"));
        args.format = Some(OutputFormat::Json);
        config.merge_with_args(&args);

        assert_eq!(config.data.path, "other.json");
        assert_eq!(config.report.format, OutputFormat::Json);
        // Not given on the command line, so the file value stays.
        assert_eq!(config.report.precision, 4);
        assert!(config.general.output.is_none());
    }

    #[test]
    fn test_validate_precision_from_file() {
        assert!(Config::default().validate().is_ok());

        let config: Config = toml::from_str("[report]\nprecision = 11\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("at most 10"));

        let config: Config = toml::from_str("[report]\nprecision = 10\n").unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_after_merge() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[report]\nprecision = 50\n").unwrap();
        let mut config = Config::load_from_dir(dir.path()).unwrap().unwrap();

        config.merge_with_args(&make_args());
        assert!(config.validate().is_err());

        let mut args = make_args();
        args.precision = Some(3);
        config.merge_with_args(&args);
        assert!(config.validate().is_ok());
    }
}
