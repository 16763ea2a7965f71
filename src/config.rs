use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DataError, Result};

// ---------------------------------------------------------------------------
// Config – the JSON experiment file
// ---------------------------------------------------------------------------

/// Data section of an experiment configuration.
///
/// The same JSON file usually carries model hyper-parameters as well; keys
/// that are not listed here are ignored.
///
/// ```json
/// {
///   "data_paths": ["data/nasdaq100_padding.csv"],
///   "sep": ",",
///   "drop_cols": [],
///   "target_cols": ["NDX"],
///   "T": 10,
///   "batch_size": 128,
///   "train_ratio": 0.8
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Source files, in the order their samples are emitted.
    pub data_paths: Vec<PathBuf>,
    /// Field delimiter of the delimited-text sources.
    #[serde(default = "default_sep")]
    pub sep: String,
    /// Columns excluded from both features and targets.
    #[serde(default)]
    pub drop_cols: Vec<String>,
    /// Target columns, in output order.
    pub target_cols: Vec<String>,
    /// Window length.
    #[serde(rename = "T")]
    pub window_len: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Fraction of samples assigned to the training partition.
    #[serde(default = "default_train_ratio")]
    pub train_ratio: f64,
}

fn default_sep() -> String {
    ",".to_string()
}

fn default_batch_size() -> usize {
    128
}

fn default_train_ratio() -> f64 {
    0.8
}

impl Config {
    /// Parse and validate a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file.
    ///
    /// Relative `data_paths` are kept as written, i.e. resolved against the
    /// working directory rather than the config file location.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Check the invariants the builder relies on.
    pub fn validate(&self) -> Result<()> {
        if self.data_paths.is_empty() {
            return Err(invalid("data_paths must list at least one file"));
        }
        if self.window_len == 0 {
            return Err(invalid("T must be a positive integer"));
        }
        if self.batch_size == 0 {
            return Err(invalid("batch_size must be a positive integer"));
        }
        if !(self.train_ratio > 0.0 && self.train_ratio < 1.0) {
            return Err(invalid(format!(
                "train_ratio must lie in (0, 1), got {}",
                self.train_ratio
            )));
        }
        if self.target_cols.is_empty() {
            return Err(invalid("target_cols must name at least one column"));
        }
        if let Some(col) = self.target_cols.iter().find(|c| self.drop_cols.contains(c)) {
            return Err(invalid(format!(
                "column '{col}' is listed in both target_cols and drop_cols"
            )));
        }
        self.delimiter()?;
        Ok(())
    }

    /// The separator as the single byte the CSV reader expects.
    pub fn delimiter(&self) -> Result<u8> {
        match self.sep.as_bytes() {
            [b] if b.is_ascii() => Ok(*b),
            _ => Err(invalid(format!(
                "sep must be a single ASCII character, got {:?}",
                self.sep
            ))),
        }
    }
}

fn invalid(msg: impl Into<String>) -> DataError {
    DataError::InvalidConfig(msg.into())
}
