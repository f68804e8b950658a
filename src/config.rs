//! Application configuration
//!
//! Built-in defaults, optionally overridden by a JSON file, then by the
//! environment. The API key only ever comes from the environment.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::policy::{DeductionSplit, DEFAULT_DEDUCTIBLE_SHARE};
use crate::summarizer::SummarizerConfig;
use crate::tax::TaxRates;

/// Environment variable pointing at a JSON config file
pub const CONFIG_PATH_ENV: &str = "CALC_TOOLS_CONFIG";

/// Environment variables checked, in order, for the summarizer API key
pub const API_KEY_ENVS: [&str; 2] = ["API_KEY", "GEMINI_API_KEY"];

/// Environment variable overriding the summarizer model
pub const MODEL_ENV: &str = "CALC_TOOLS_MODEL";

fn default_deductible_share() -> f64 {
    DEFAULT_DEDUCTIBLE_SHARE
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{name} must be a finite rate between 0 and 1, got {value}")]
    InvalidRate { name: &'static str, value: f64 },
}

/// Everything the calculators and the summarizer can be configured with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub tax: TaxRates,

    /// Deductible share for passenger car expenses
    #[serde(default = "default_deductible_share")]
    pub deductible_share: f64,

    #[serde(default)]
    pub summarizer: SummarizerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tax: TaxRates::default(),
            deductible_share: DEFAULT_DEDUCTIBLE_SHARE,
            summarizer: SummarizerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Resolve the configuration: explicit path, else `CALC_TOOLS_CONFIG`,
    /// else defaults; then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(env_path) {
            Some(p) => Self::from_file(&p)?,
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file (no environment overrides)
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Pick up the API key and model from the environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| env::var(name).ok());
    }

    fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let key = API_KEY_ENVS
            .iter()
            .filter_map(|name| lookup(name))
            .find(|value| !value.is_empty());
        if key.is_some() {
            self.summarizer.api_key = key;
        }

        if let Some(model) = lookup(MODEL_ENV).filter(|m| !m.is_empty()) {
            self.summarizer.model = model;
        }
    }

    /// Every rate must be a finite fraction
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rates = [
            ("tax.sct_rate", self.tax.sct_rate),
            ("tax.vat_rate", self.tax.vat_rate),
            ("deductible_share", self.deductible_share),
        ];
        for (name, value) in rates {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidRate { name, value });
            }
        }
        Ok(())
    }

    pub fn deduction_split(&self) -> DeductionSplit {
        DeductionSplit::new(self.deductible_share)
    }
}
