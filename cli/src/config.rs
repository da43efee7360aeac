use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use outline::ExtractOptions;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "featurefile.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file at {config_path}: {source}")]
    Read {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file at {config_path}: {source}")]
    Parse {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub extract: ExtractConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractConfig {
    /// Level-2 headings that open a feature region.
    pub feature_headings: Vec<String>,
    pub background_heading: String,
    pub scenarios_heading: String,
    /// Bullet table header when none can be inferred from the step.
    pub default_table_header: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        let defaults = ExtractOptions::default();
        ExtractConfig {
            feature_headings: defaults.feature_headings,
            background_heading: defaults.background_heading,
            scenarios_heading: defaults.scenarios_heading,
            default_table_header: defaults.default_table_header,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub align_tables: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig { align_tables: true }
    }
}

impl Config {
    /// Load the config at `config_path`. A missing file is not an error.
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
            config_path: config_path.to_path_buf(),
            source,
        })?;

        let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            config_path: config_path.to_path_buf(),
            source,
        })?;

        Ok(Some(config))
    }

    /// Load an explicitly requested config (which must exist), or the default
    /// file if present, or fall back to built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => match Self::load_from_path(path)? {
                Some(config) => Ok(config),
                None => Err(ConfigError::Read {
                    config_path: path.to_path_buf(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
                }),
            },
            None => Ok(Self::load_from_path(DEFAULT_CONFIG_FILE)?.unwrap_or_default()),
        }
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            feature_headings: self.extract.feature_headings.clone(),
            background_heading: self.extract.background_heading.clone(),
            scenarios_heading: self.extract.scenarios_heading.clone(),
            default_table_header: self.extract.default_table_header.clone(),
        }
    }
}
