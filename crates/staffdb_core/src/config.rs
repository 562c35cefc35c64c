//! Run configuration.
//!
//! # Responsibility
//! - Describe storage, audit, logging, export and seed settings as one explicit
//!   value handed to the orchestrator.
//! - Load that value from a TOML file.
//!
//! # Invariants
//! - Every section and key is optional; defaults reproduce a local
//!   single-file setup in the working directory.
//! - `logging.dir`, when set, is an absolute path.

use crate::audit::AuditWriteMode;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "staffdb.toml";
const DEFAULT_DATABASE_FILE: &str = "staffdb.sqlite3";
const DEFAULT_AUDIT_FILE: &str = "operation_log.csv";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "cannot parse config `{}`: {source}", path.display())
            }
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Invalid(_) => None,
        }
    }
}

/// Top-level configuration for one run.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub storage: StorageConfig,
    pub audit: AuditConfig,
    pub logging: LoggingConfig,
    pub export: ExportConfig,
    pub seed: SeedConfig,
}

/// Connection parameters for the SQLite store.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub database: PathBuf,
    /// When `false`, a missing database file is a connection failure.
    pub create_if_missing: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DATABASE_FILE),
            create_if_missing: true,
        }
    }
}

/// `[audit]` section.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct AuditConfig {
    pub file: PathBuf,
    pub mode: AuditWriteMode,
    /// Optional one-cell `Success`/`Failure` file rewritten every run.
    pub result_marker: Option<PathBuf>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from(DEFAULT_AUDIT_FILE),
            mode: AuditWriteMode::Append,
            result_marker: None,
        }
    }
}

/// `[logging]` section. File logging is off while `dir` is unset.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub dir: Option<PathBuf>,
}

/// `[export]` section used by the bulk-read flow.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    pub file: Option<PathBuf>,
}

/// `[seed]` section.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SeedConfig {
    /// When `false`, runs never write seed rows.
    pub enabled: bool,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl RunConfig {
    /// Loads and validates a TOML config file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        Ok(config)
    }

    /// Loads `path` when it exists, otherwise returns defaults.
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.storage.database.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "storage.database cannot be empty".to_string(),
            ));
        }
        if self.audit.file.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("audit.file cannot be empty".to_string()));
        }
        if let Some(dir) = &self.logging.dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "logging.dir must be an absolute path, got `{}`",
                    dir.display()
                )));
            }
        }
        Ok(())
    }
}
