//! Runtime configuration for storage and logging.
//!
//! # Responsibility
//! - Resolve storage backend, roster path and logging settings from the
//!   environment.
//! - Build the configured repository behind one trait object.
//!
//! # Invariants
//! - Blank values count as unset and fall back to defaults.
//! - An unknown storage backend is an error, never silently defaulted.

use crate::logging::default_log_level;
use crate::repo::json_file_repo::JsonFileParticipantRepository;
use crate::repo::participant_repo::{ParticipantRepository, RepoError, SqliteParticipantRepository};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

pub const STORAGE_ENV: &str = "SECRETGIFT_STORAGE";
pub const DATA_PATH_ENV: &str = "SECRETGIFT_DATA_PATH";
pub const LOG_LEVEL_ENV: &str = "SECRETGIFT_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "SECRETGIFT_LOG_DIR";

const DEFAULT_SQLITE_FILE_NAME: &str = "secretgift.sqlite3";
const DEFAULT_JSON_FILE_NAME: &str = "participants.json";

/// Repository selected at runtime.
pub type DynParticipantRepository = Box<dyn ParticipantRepository + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Json,
}

impl StorageBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Json => "json",
        }
    }

    fn default_file_name(self) -> &'static str {
        match self {
            Self::Sqlite => DEFAULT_SQLITE_FILE_NAME,
            Self::Json => DEFAULT_JSON_FILE_NAME,
        }
    }
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::UnknownStorage(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnknownStorage(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownStorage(value) => {
                write!(f, "unknown storage backend `{value}`; expected sqlite|json")
            }
        }
    }
}

impl Error for ConfigError {}

/// Resolved core settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub storage: StorageBackend,
    pub data_path: PathBuf,
    pub log_level: String,
    /// Logging stays off when unset.
    pub log_dir: Option<PathBuf>,
}

impl CoreConfig {
    /// Resolves settings from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves settings through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|trimmed| !trimmed.is_empty())
        };

        let storage = match value(STORAGE_ENV) {
            Some(raw) => raw.parse()?,
            None => StorageBackend::default(),
        };
        let data_path = value(DATA_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| default_data_path(storage));

        Ok(Self {
            storage,
            data_path,
            log_level: value(LOG_LEVEL_ENV).unwrap_or_else(|| default_log_level().to_string()),
            log_dir: value(LOG_DIR_ENV).map(PathBuf::from),
        })
    }

    /// Opens the configured storage backend.
    pub fn open_repository(&self) -> Result<DynParticipantRepository, RepoError> {
        let repo: DynParticipantRepository = match self.storage {
            StorageBackend::Sqlite => Box::new(SqliteParticipantRepository::open(&self.data_path)?),
            StorageBackend::Json => Box::new(JsonFileParticipantRepository::new(&self.data_path)),
        };
        Ok(repo)
    }
}

/// Default roster location for `storage` in the OS temp directory.
pub fn default_data_path(storage: StorageBackend) -> PathBuf {
    std::env::temp_dir().join(storage.default_file_name())
}
