//! Configuration module for asksql.
//!
//! Handles the settings file, environment variables, and conversion into
//! the pipeline's explicit configuration.

mod settings;

pub use settings::{
    expand_env_vars, LimitsSettings, ModelSettings, Settings, SettingsError, SettingsResult,
    StoreSettings, CONFIG_ENV,
};
