//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `hubkit.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use hubkit_domain::schema::{DEFAULT_NUMERIC_DOMAINS, SchemaOptions};

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the hub metadata comes from.
    pub source: SourceConfig,
    /// Where and how the model is written.
    pub output: OutputConfig,
    /// Schema assembly knobs.
    pub schema: SchemaConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Metadata source configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Snapshot file with states and the service catalog.
    pub snapshot: PathBuf,
}

/// Output configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// File the rendered model is written to.
    pub path: PathBuf,
    pub format: OutputFormat,
}

/// Rendering of the generated model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Rust,
    Json,
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rust" => Ok(Self::Rust),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unknown output format {other:?}, expected \"rust\" or \"json\""
            ))),
        }
    }
}

/// Schema assembly configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Domains whose entities are numeric even without a unit.
    pub numeric_domains: Vec<String>,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `hubkit.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("hubkit.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("HUBKIT_SNAPSHOT") {
            self.source.snapshot = PathBuf::from(val);
        }
        if let Some(val) = lookup("HUBKIT_OUTPUT") {
            self.output.path = PathBuf::from(val);
        }
        if let Some(val) = lookup("HUBKIT_FORMAT") {
            self.output.format = val.parse()?;
        }
        if let Some(val) = lookup("HUBKIT_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = lookup("RUST_LOG") {
            self.logging.filter = val;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.source.snapshot.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "source.snapshot must not be empty".to_string(),
            ));
        }
        if self.output.path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "output.path must not be empty".to_string(),
            ));
        }
        if let Some(domain) = self
            .schema
            .numeric_domains
            .iter()
            .find(|domain| domain.is_empty() || domain.contains('.'))
        {
            return Err(ConfigError::Validation(format!(
                "invalid numeric domain {domain:?}"
            )));
        }
        Ok(())
    }

    /// Schema options for the model service.
    #[must_use]
    pub fn schema_options(&self) -> SchemaOptions {
        SchemaOptions {
            numeric_domains: self.schema.numeric_domains.iter().cloned().collect(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            snapshot: PathBuf::from("snapshot.json"),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("hubkit_model.rs"),
            format: OutputFormat::default(),
        }
    }
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            numeric_domains: DEFAULT_NUMERIC_DOMAINS
                .iter()
                .map(|d| (*d).to_string())
                .collect(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "hubkit=info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.source.snapshot, PathBuf::from("snapshot.json"));
        assert_eq!(config.output.path, PathBuf::from("hubkit_model.rs"));
        assert_eq!(config.output.format, OutputFormat::Rust);
        assert_eq!(config.schema.numeric_domains, vec!["input_number"]);
        assert_eq!(config.logging.filter, "hubkit=info");
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [source]
            snapshot = 'fixtures/home.json'

            [output]
            path = 'src/model.rs'
            format = 'json'

            [schema]
            numeric_domains = ['input_number', 'counter']

            [logging]
            filter = 'debug'
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.source.snapshot, PathBuf::from("fixtures/home.json"));
        assert_eq!(config.output.path, PathBuf::from("src/model.rs"));
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.schema.numeric_domains, vec!["input_number", "counter"]);
        assert_eq!(config.logging.filter, "debug");
    }

    #[test]
    fn should_parse_partial_toml_with_defaults() {
        let config: Config = toml::from_str("[output]\nformat = 'json'").unwrap();
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.output.path, PathBuf::from("hubkit_model.rs"));
        assert_eq!(config.source.snapshot, PathBuf::from("snapshot.json"));
    }

    #[test]
    fn should_report_parse_error_for_unknown_format() {
        let result: Result<Config, _> = toml::from_str("[output]\nformat = 'yaml'");
        assert!(result.is_err());
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.output.format, OutputFormat::Rust);
    }

    #[test]
    fn should_override_file_values_with_env() {
        let mut config = Config::default();
        config
            .apply_overrides(env(&[
                ("HUBKIT_SNAPSHOT", "/tmp/snapshot.json"),
                ("HUBKIT_OUTPUT", "/tmp/model.json"),
                ("HUBKIT_FORMAT", "JSON"),
                ("HUBKIT_LOG", "hubkit=debug"),
            ]))
            .unwrap();
        assert_eq!(config.source.snapshot, PathBuf::from("/tmp/snapshot.json"));
        assert_eq!(config.output.path, PathBuf::from("/tmp/model.json"));
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.logging.filter, "hubkit=debug");
    }

    #[test]
    fn should_prefer_rust_log_over_hubkit_log() {
        let mut config = Config::default();
        config
            .apply_overrides(env(&[("HUBKIT_LOG", "info"), ("RUST_LOG", "trace")]))
            .unwrap();
        assert_eq!(config.logging.filter, "trace");
    }

    #[test]
    fn should_reject_unknown_format_from_env() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(env(&[("HUBKIT_FORMAT", "yaml")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn should_reject_empty_output_path() {
        let mut config = Config::default();
        config.output.path = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_qualified_numeric_domain() {
        let mut config = Config::default();
        config.schema.numeric_domains = vec!["sensor.power".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_accept_defaults() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn should_build_schema_options_from_numeric_domains() {
        let mut config = Config::default();
        config.schema.numeric_domains = vec!["counter".to_string(), "counter".to_string()];
        let options = config.schema_options();
        assert_eq!(options.numeric_domains.len(), 1);
        assert!(options.numeric_domains.contains("counter"));
    }
}
