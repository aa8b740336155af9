//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `rulehub.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Engine settings.
    pub engine: EngineConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Rule-engine configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Workspace (tenant) the engine runs for.
    pub workspace: String,
    /// Persona that posted tasks are attributed to.
    pub persona: String,
    /// Optional JSON file of automation definitions, loaded at startup
    /// through the management surface so they are validated on the way in.
    pub automations_file: Option<String>,
    /// Change-event bus capacity.
    pub bus_capacity: usize,
    /// Tables automations may watch. `None` allows any table.
    pub allowed_tables: Option<Vec<String>>,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `rulehub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("rulehub.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("RULEHUB_WORKSPACE") {
            self.engine.workspace = val;
        }
        if let Ok(val) = std::env::var("RULEHUB_PERSONA") {
            self.engine.persona = val;
        }
        if let Ok(val) = std::env::var("RULEHUB_AUTOMATIONS") {
            self.engine.automations_file = Some(val);
        }
        if let Ok(val) = std::env::var("RULEHUB_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.workspace.is_empty() {
            return Err(ConfigError::Validation(
                "workspace must not be empty".to_string(),
            ));
        }
        if self.engine.persona.is_empty() {
            return Err(ConfigError::Validation(
                "persona must not be empty".to_string(),
            ));
        }
        if self.engine.bus_capacity == 0 {
            return Err(ConfigError::Validation(
                "bus_capacity must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workspace: "demo".to_string(),
            persona: "sales-assistant".to_string(),
            automations_file: None,
            bus_capacity: 256,
            allowed_tables: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "rulehubd=info,rulehub=info".to_string(),
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
