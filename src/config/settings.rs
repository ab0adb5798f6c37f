//! TOML-based configuration for asksql.
//!
//! Supports a config file (asksql.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [store]
//! path = "${HOME}/data/talk2data.db"
//!
//! [model]
//! command = "llm"
//! args = ["--model", "gemini-2.5-flash"]
//! timeout_secs = 60
//!
//! [limits]
//! row_limit = 10000
//! time_limit_ms = 5000   # 0 disables the time ceiling
//! max_categories = 50
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::chart::{ChartPolicy, DEFAULT_MAX_CATEGORIES};
use crate::pipeline::PipelineConfig;
use crate::store::{ExecutionLimits, DEFAULT_ROW_LIMIT, DEFAULT_TIME_LIMIT};
use crate::translate::{CommandModel, DEFAULT_TIMEOUT_SECS};

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "ASKSQL_CONFIG";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type SettingsResult<T> = Result<T, SettingsError>;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub store: StoreSettings,
    pub model: ModelSettings,
    pub limits: LimitsSettings,
}

/// Store configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreSettings {
    /// SQLite database file (supports ${ENV_VAR} expansion).
    pub path: Option<String>,
}

impl StoreSettings {
    /// Get the database path with environment variables expanded.
    pub fn resolved_path(&self) -> SettingsResult<Option<PathBuf>> {
        self.path
            .as_deref()
            .map(|p| expand_env_vars(p).map(PathBuf::from))
            .transpose()
    }
}

/// Language model command configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Program that reads a prompt on stdin and writes a completion.
    pub command: String,

    /// Arguments (each supports ${ENV_VAR} expansion).
    pub args: Vec<String>,

    /// Upper bound on one completion, in seconds.
    pub timeout_secs: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            command: "llm".to_string(),
            args: Vec::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ModelSettings {
    /// Build the configured command model.
    pub fn command_model(&self) -> SettingsResult<CommandModel> {
        if self.command.trim().is_empty() {
            return Err(SettingsError::InvalidConfig(
                "model.command must not be empty".to_string(),
            ));
        }
        let args = self
            .args
            .iter()
            .map(|a| expand_env_vars(a))
            .collect::<SettingsResult<Vec<_>>>()?;
        Ok(CommandModel::new(self.command.clone(), args))
    }
}

/// Execution and presentation ceilings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsSettings {
    pub row_limit: usize,

    /// Wall-clock ceiling in milliseconds; zero disables it.
    pub time_limit_ms: u64,

    pub max_categories: usize,
}

impl Default for LimitsSettings {
    fn default() -> Self {
        Self {
            row_limit: DEFAULT_ROW_LIMIT,
            time_limit_ms: DEFAULT_TIME_LIMIT.as_millis() as u64,
            max_categories: DEFAULT_MAX_CATEGORIES,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> SettingsResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse settings from TOML text.
    pub fn from_toml(content: &str) -> SettingsResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `ASKSQL_CONFIG`
    /// 2. `./asksql.toml`
    /// 3. `~/.config/asksql/config.toml`
    pub fn load() -> SettingsResult<Self> {
        if let Ok(path) = env::var(CONFIG_ENV) {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("asksql.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("asksql").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Check limits before they reach the pipeline.
    pub fn validate(&self) -> SettingsResult<()> {
        if self.limits.row_limit == 0 {
            return Err(SettingsError::InvalidConfig(
                "limits.row_limit must be at least 1".to_string(),
            ));
        }
        if self.limits.max_categories < 2 {
            return Err(SettingsError::InvalidConfig(
                "limits.max_categories must be at least 2".to_string(),
            ));
        }
        if self.model.timeout_secs == 0 {
            return Err(SettingsError::InvalidConfig(
                "model.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The explicit configuration handed to the pipeline.
    pub fn pipeline_config(&self) -> SettingsResult<PipelineConfig> {
        self.validate()?;
        let time_limit = match self.limits.time_limit_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };
        Ok(PipelineConfig {
            limits: ExecutionLimits {
                row_limit: self.limits.row_limit,
                time_limit,
            },
            chart: ChartPolicy {
                max_categories: self.limits.max_categories,
            },
            translate_timeout: Duration::from_secs(self.model.timeout_secs),
        })
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax. A `${` without its closing `}`
/// is an [`SettingsError::InvalidConfig`].
pub fn expand_env_vars(s: &str) -> SettingsResult<String> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let var_name: String = if chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            let mut name = String::new();
            let mut closed = false;
            for ch in chars.by_ref() {
                if ch == '}' {
                    closed = true;
                    break;
                }
                name.push(ch);
            }
            if !closed {
                return Err(SettingsError::InvalidConfig(format!(
                    "unclosed '${{{}' in {:?}",
                    name, s
                )));
            }
            name
        } else {
            let mut name = String::new();
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                name.push(ch);
            }
            if name.is_empty() {
                // Lone $
                result.push('$');
                continue;
            }
            name
        };

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
