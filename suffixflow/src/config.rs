//! Runner configuration.
//!
//! A [`RunnerConfig`] describes the starting context of a chain run. It can
//! be built in code, parsed from JSON, or read from `SUFFIXFLOW_*`
//! environment variables.

use crate::context::{PipelineContext, DEFAULT_WORKER_BUDGET};
use crate::errors::SuffixflowError;
use crate::observability::{self, LogFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable holding the base folder.
pub const ENV_BASE: &str = "SUFFIXFLOW_BASE";
/// Environment variable holding the stage label.
pub const ENV_STAGE: &str = "SUFFIXFLOW_STAGE";
/// Environment variable holding the starting suffix.
pub const ENV_SUFFIX: &str = "SUFFIXFLOW_SUFFIX";
/// Environment variable enabling force mode.
pub const ENV_FORCE: &str = "SUFFIXFLOW_FORCE";
/// Environment variable holding the worker budget.
pub const ENV_WORKERS: &str = "SUFFIXFLOW_WORKERS";

/// Starting point of a chain run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Root directory for all artifacts.
    #[serde(default = "default_base_folder")]
    pub base_folder: String,
    /// Initial stage label.
    #[serde(default = "default_stage_label")]
    pub stage_label: String,
    /// Initial suffix.
    #[serde(default)]
    pub suffix: String,
    /// Disable skip-caching for the whole run.
    #[serde(default)]
    pub force: bool,
    /// Maximum concurrent workers per stage.
    #[serde(default = "default_worker_budget")]
    pub worker_budget: usize,
    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_base_folder() -> String {
    "data".to_string()
}

fn default_stage_label() -> String {
    "tmp".to_string()
}

fn default_worker_budget() -> usize {
    DEFAULT_WORKER_BUDGET
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            base_folder: default_base_folder(),
            stage_label: default_stage_label(),
            suffix: String::new(),
            force: false,
            worker_budget: default_worker_budget(),
            log_format: LogFormat::default(),
        }
    }
}

impl RunnerConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base folder.
    #[must_use]
    pub fn with_base_folder(mut self, base: impl Into<String>) -> Self {
        self.base_folder = base.into();
        self
    }

    /// Sets the stage label.
    #[must_use]
    pub fn with_stage_label(mut self, stage: impl Into<String>) -> Self {
        self.stage_label = stage.into();
        self
    }

    /// Sets the worker budget.
    #[must_use]
    pub fn with_worker_budget(mut self, workers: usize) -> Self {
        self.worker_budget = workers;
        self
    }

    /// Sets force mode.
    #[must_use]
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, SuffixflowError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SuffixflowError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Builds a configuration from defaults overridden by `SUFFIXFLOW_*`
    /// environment variables.
    pub fn from_env() -> Result<Self, SuffixflowError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`RunnerConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SuffixflowError> {
        let mut config = Self::default();
        if let Some(base) = lookup(ENV_BASE) {
            config.base_folder = base;
        }
        if let Some(stage) = lookup(ENV_STAGE) {
            config.stage_label = stage;
        }
        if let Some(suffix) = lookup(ENV_SUFFIX) {
            config.suffix = suffix;
        }
        if let Some(force) = lookup(ENV_FORCE) {
            config.force = parse_flag(&force).ok_or_else(|| {
                SuffixflowError::Config(format!("{ENV_FORCE} must be a boolean, got '{force}'"))
            })?;
        }
        if let Some(workers) = lookup(ENV_WORKERS) {
            config.worker_budget = workers.trim().parse().map_err(|_| {
                SuffixflowError::Config(format!("{ENV_WORKERS} must be an integer, got '{workers}'"))
            })?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration for values the engine cannot run with.
    pub fn validate(&self) -> Result<(), SuffixflowError> {
        if self.worker_budget == 0 {
            return Err(SuffixflowError::Config(
                "worker_budget must be at least 1".to_string(),
            ));
        }
        if self.base_folder.is_empty() {
            return Err(SuffixflowError::Config(
                "base_folder must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Installs the global log subscriber in the configured format.
    pub fn init_logging(&self) -> Result<(), SuffixflowError> {
        observability::init_logging(self.log_format)
    }

    /// Builds the starting context.
    #[must_use]
    pub fn into_context(self) -> PipelineContext {
        PipelineContext::new(self.base_folder, self.stage_label)
            .with_suffix(self.suffix)
            .with_force(self.force)
            .with_worker_budget(self.worker_budget)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
