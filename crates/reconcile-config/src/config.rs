// crates/reconcile-config/src/config.rs
// ============================================================================
// Module: Schema Reconcile Configuration
// Description: Configuration loading and validation for schema reconciliation.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: reconcile-core, reconcile-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every section is validated after parsing, and the declared schema is built
//! eagerly so a bad declaration is rejected before any store is opened.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use reconcile_core::BatchSize;
use reconcile_core::BatchSizePolicy;
use reconcile_core::DEFAULT_BACKUP_SUFFIX;
use reconcile_core::DEFAULT_BASELINE_ROWS;
use reconcile_core::SchemaDeclaration;
use reconcile_core::SchemaVersion;
use reconcile_core::TableSpec;
use reconcile_core::schema::validate_backup_suffix;
use reconcile_store_sqlite::ReconcileOptions;
use reconcile_store_sqlite::Reconciler;
use reconcile_store_sqlite::SqliteStoreConfig;
use reconcile_store_sqlite::SqliteStoreMode;
use reconcile_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use thiserror::Error;

use crate::memory::detect_memory_ceiling_mb;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "reconcile.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "RECONCILE_CONFIG";
/// Maximum configuration file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default busy timeout for store connections (ms).
const DEFAULT_STORE_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Default log level directive.
const DEFAULT_LOG_LEVEL: &str = "info";
/// Accepted log level directives.
const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Schema reconciliation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconcileConfig {
    /// Store location and connection pragmas.
    pub store: StoreConfig,
    /// Declared target schema.
    pub schema: SchemaConfig,
    /// Repopulation batch sizing.
    #[serde(default)]
    pub batch: BatchConfig,
    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Path the configuration was loaded from (not deserialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl ReconcileConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// Resolution order: `path`, then `RECONCILE_CONFIG`, then
    /// `reconcile.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config = Self::from_toml(content)?;
        config.source_path = Some(resolved);
        Ok(config)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        if config.batch.memory_ceiling_mb.is_none() && config.batch.tiered {
            config.batch.detected_ceiling_mb = detect_memory_ceiling_mb();
        }
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.store.validate()?;
        self.schema.validate()?;
        self.batch.validate()?;
        self.logging.validate()
    }

    /// Builds the validated schema declaration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the declaration is rejected.
    pub fn declaration(&self) -> Result<SchemaDeclaration, ConfigError> {
        self.schema.declaration()
    }

    /// Returns the store connection settings.
    #[must_use]
    pub fn store_config(&self) -> SqliteStoreConfig {
        self.store.sqlite_config()
    }

    /// Returns the backup suffix and resolved batch size.
    #[must_use]
    pub fn options(&self) -> ReconcileOptions {
        ReconcileOptions {
            backup_suffix: self.schema.backup_suffix.clone(),
            batch_size: self.batch.resolve(),
        }
    }

    /// Builds a reconciler for the declared schema.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the declaration or options are
    /// rejected.
    pub fn reconciler(&self) -> Result<Reconciler, ConfigError> {
        Reconciler::new(self.declaration()?, self.options())
            .map_err(|err| ConfigError::Invalid(err.to_string()))
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Store location and connection pragmas.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// `SQLite` database path.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_store_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl StoreConfig {
    /// Validates store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("store.path", &self.path.to_string_lossy())
    }

    /// Converts to the store's connection settings.
    fn sqlite_config(&self) -> SqliteStoreConfig {
        SqliteStoreConfig {
            path: self.path.clone(),
            busy_timeout_ms: self.busy_timeout_ms,
            journal_mode: self.journal_mode,
            sync_mode: self.sync_mode,
        }
    }
}

/// Returns the default busy timeout for store connections.
const fn default_store_busy_timeout_ms() -> u64 {
    DEFAULT_STORE_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Schema
// ============================================================================

/// Declared target schema.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaConfig {
    /// Target schema version (at least 1).
    pub version: u32,
    /// Suffix forming backup table names.
    #[serde(default = "default_backup_suffix")]
    pub backup_suffix: String,
    /// Tables dropped unconditionally before recreation.
    #[serde(default)]
    pub removed_tables: Vec<String>,
    /// Declared tables in creation order.
    #[serde(default)]
    pub tables: Vec<TableConfig>,
}

/// One declared table.
#[derive(Debug, Clone, Deserialize)]
pub struct TableConfig {
    /// Table name.
    pub name: String,
    /// Idempotent `CREATE TABLE IF NOT EXISTS` statement.
    pub create: String,
}

impl SchemaConfig {
    /// Validates the declaration and backup suffix.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_backup_suffix(&self.backup_suffix)
            .map_err(|err| ConfigError::Invalid(format!("schema.backup_suffix: {err}")))?;
        self.declaration().map(|_| ())
    }

    /// Builds the validated schema declaration.
    fn declaration(&self) -> Result<SchemaDeclaration, ConfigError> {
        let version = SchemaVersion::new(self.version)
            .map_err(|err| ConfigError::Invalid(format!("schema.version: {err}")))?;
        let tables = self
            .tables
            .iter()
            .map(|table| TableSpec::new(table.name.clone(), table.create.clone()))
            .collect();
        SchemaDeclaration::new(version, tables, self.removed_tables.clone())
            .map_err(|err| ConfigError::Invalid(format!("schema: {err}")))
    }
}

/// Returns the default backup suffix.
fn default_backup_suffix() -> String {
    DEFAULT_BACKUP_SUFFIX.to_string()
}

// ============================================================================
// SECTION: Batch
// ============================================================================

/// Repopulation batch sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BatchConfig {
    /// Rows per batch when memory is not constrained.
    #[serde(default = "default_baseline_rows")]
    pub baseline_rows: usize,
    /// Memory ceiling in MiB; detected from the host when unset.
    #[serde(default)]
    pub memory_ceiling_mb: Option<u64>,
    /// Shrink batches on low-memory hosts.
    #[serde(default = "default_tiered")]
    pub tiered: bool,
    /// Host ceiling in MiB detected at load time (not deserialized).
    #[serde(skip)]
    pub detected_ceiling_mb: Option<u64>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            baseline_rows: DEFAULT_BASELINE_ROWS,
            memory_ceiling_mb: None,
            tiered: true,
            detected_ceiling_mb: None,
        }
    }
}

impl BatchConfig {
    /// Validates batch sizing.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.baseline_rows == 0 {
            return Err(ConfigError::Invalid(
                "batch.baseline_rows must be greater than zero".to_string(),
            ));
        }
        if self.memory_ceiling_mb == Some(0) {
            return Err(ConfigError::Invalid(
                "batch.memory_ceiling_mb must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the batch policy described by this section.
    #[must_use]
    pub const fn policy(&self) -> BatchSizePolicy {
        BatchSizePolicy {
            baseline_rows: self.baseline_rows,
            tiered: self.tiered,
        }
    }

    /// Returns the configured ceiling, falling back to the detected one.
    #[must_use]
    pub const fn effective_ceiling_mb(&self) -> Option<u64> {
        match self.memory_ceiling_mb {
            Some(ceiling) => Some(ceiling),
            None => self.detected_ceiling_mb,
        }
    }

    /// Resolves the batch size for the effective memory ceiling.
    #[must_use]
    pub const fn resolve(&self) -> BatchSize {
        self.policy().resolve(self.effective_ceiling_mb())
    }
}

/// Returns the default baseline rows per batch.
const fn default_baseline_rows() -> usize {
    DEFAULT_BASELINE_ROWS
}

/// Returns the default tiering flag.
const fn default_tiered() -> bool {
    true
}

// ============================================================================
// SECTION: Logging
// ============================================================================

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default level directive; `RUST_LOG` overrides it at runtime.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl LoggingConfig {
    /// Validates the level directive.
    fn validate(&self) -> Result<(), ConfigError> {
        let level = self.level.trim().to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "logging.level must be one of {}",
                LOG_LEVELS.join(", ")
            )));
        }
        Ok(())
    }
}

/// Returns the default log level directive.
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}
