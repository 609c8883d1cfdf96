//! TOML run file: strategy, data source, ranges and walk-forward settings.
//!
//! ```toml
//! strategy = "sma_cross"
//! data = "bars.csv"
//!
//! [params]
//! slow_period = 40
//!
//! [[ranges]]
//! name = "fast_period"
//! min = 5
//! max = 20
//! step = 5
//!
//! [walk_forward]
//! optimization_window = 400
//! test_window = 100
//! step_size = 100
//!
//! [walk_forward.backtest]
//! initial_capital = 25000
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use wfalab_core::domain::ParameterSet;
use wfalab_core::strategy::{strategy_by_name, Strategy, STRATEGY_NAMES};

use crate::grid::ParameterRange;
use crate::walk_forward::WalkForwardConfig;

/// Errors from loading a run file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse run file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unknown strategy '{name}' (known: {known})")]
    UnknownStrategy { name: String, known: String },
}

/// A complete, reproducible walk-forward run description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFile {
    pub strategy: String,
    /// CSV bar file, relative to the run file's directory.
    #[serde(default)]
    pub data: Option<PathBuf>,
    /// Fixed parameter values layered over the strategy defaults.
    #[serde(default)]
    pub params: ParameterSet,
    #[serde(default)]
    pub ranges: Vec<ParameterRange>,
    #[serde(default)]
    pub walk_forward: WalkForwardConfig,
}

impl RunFile {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let run: RunFile = toml::from_str(content)?;
        run.strategy()?;
        Ok(run)
    }

    /// Load a run file. A relative `data` path is resolved against the
    /// run file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut run = Self::from_toml(&content)?;
        if let (Some(data), Some(dir)) = (&run.data, path.parent()) {
            if data.is_relative() {
                run.data = Some(dir.join(data));
            }
        }
        Ok(run)
    }

    /// Resolve the named strategy.
    pub fn strategy(&self) -> Result<Box<dyn Strategy>, ConfigError> {
        strategy_by_name(&self.strategy).ok_or_else(|| ConfigError::UnknownStrategy {
            name: self.strategy.clone(),
            known: STRATEGY_NAMES.join(", "),
        })
    }
}
