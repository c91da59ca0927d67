//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Metadata store backend.
    #[serde(default)]
    pub metadata: MetadataConfig,
    /// External ledger service.
    pub ledger: LedgerConfig,
    /// Reconciliation sweep settings.
    #[serde(default)]
    pub sync: SyncConfig,
}

impl AppConfig {
    /// Create a test configuration with dummy ledger credentials.
    ///
    /// **For testing only.** Points at a local address no test should dial.
    pub fn for_testing() -> Self {
        Self {
            metadata: MetadataConfig::default(),
            ledger: LedgerConfig {
                base_url: "http://127.0.0.1:9099".to_string(),
                api_key: "test-api-key".to_string(),
                institution_code: default_institution_code(),
                fintech_app_no: default_fintech_app_no(),
                timeout_ms: default_ledger_timeout_ms(),
                utc_offset_hours: default_utc_offset_hours(),
            },
            sync: SyncConfig::default(),
        }
    }
}

/// Metadata store backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MetadataConfig {
    /// SQLite store.
    Sqlite {
        /// Database file path.
        path: PathBuf,
        /// Advisory query timeout in seconds.
        #[serde(default)]
        query_timeout_secs: Option<u64>,
    },
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: PathBuf::from("data/moneypot.db"),
            query_timeout_secs: None,
        }
    }
}

/// External ledger service configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Base URL of the ledger API.
    pub base_url: String,
    /// Institution API key sent in every request header.
    pub api_key: String,
    /// Institution code for the request header.
    #[serde(default = "default_institution_code")]
    pub institution_code: String,
    /// Fintech app number for the request header.
    #[serde(default = "default_fintech_app_no")]
    pub fintech_app_no: String,
    /// Per-request timeout in milliseconds. Requests past this deadline
    /// are aborted and reported as transient failures.
    #[serde(default = "default_ledger_timeout_ms")]
    pub timeout_ms: u64,
    /// UTC offset (hours) of the ledger's business timezone. Transmission
    /// stamps and "today" for expiry checks use this offset.
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i8,
}

impl LedgerConfig {
    /// Get the request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validate the configuration. Returns warnings for suspicious but
    /// workable settings; errors for settings that cannot work.
    pub fn validate(&self) -> Result<Vec<String>, String> {
        let mut warnings = Vec::new();
        if self.base_url.is_empty() {
            return Err("ledger.base_url must not be empty".to_string());
        }
        if self.api_key.is_empty() {
            return Err("ledger.api_key must not be empty".to_string());
        }
        if self.timeout_ms == 0 {
            return Err("ledger.timeout_ms must be greater than zero".to_string());
        }
        if self.timeout_ms > 60_000 {
            warnings.push(format!(
                "ledger.timeout_ms is {} ms; sweeps will stall badly on a slow ledger",
                self.timeout_ms
            ));
        }
        if !(-12..=14).contains(&self.utc_offset_hours) {
            return Err(format!(
                "ledger.utc_offset_hours {} is not a valid UTC offset",
                self.utc_offset_hours
            ));
        }
        Ok(warnings)
    }
}

/// Reconciliation sweep configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Number of buckets reconciled concurrently per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
    /// Delay between batches in milliseconds, to respect the ledger's
    /// rate limits.
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
    /// Interval between scheduled sweeps in seconds.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Run one sweep immediately at startup before entering the interval
    /// loop.
    #[serde(default)]
    pub run_on_startup: bool,
}

impl SyncConfig {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Validate the configuration, returning warnings for risky values.
    pub fn validate(&self) -> Result<Vec<String>, String> {
        let mut warnings = Vec::new();
        if self.batch_size == 0 {
            return Err("sync.batch_size must be at least 1".to_string());
        }
        if self.interval_secs == 0 {
            return Err("sync.interval_secs must be greater than zero".to_string());
        }
        if self.batch_size > 10 {
            warnings.push(format!(
                "sync.batch_size is {}; large batches risk ledger rate limiting",
                self.batch_size
            ));
        }
        if self.batch_delay_ms == 0 {
            warnings.push("sync.batch_delay_ms is 0; batches will run back to back".to_string());
        }
        Ok(warnings)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            interval_secs: default_interval_secs(),
            run_on_startup: false,
        }
    }
}

fn default_institution_code() -> String {
    "00100".to_string()
}

fn default_fintech_app_no() -> String {
    "001".to_string()
}

fn default_ledger_timeout_ms() -> u64 {
    crate::DEFAULT_LEDGER_TIMEOUT_MS
}

fn default_utc_offset_hours() -> i8 {
    9 // the ledger operates on KST
}

fn default_batch_size() -> u32 {
    crate::DEFAULT_BATCH_SIZE
}

fn default_batch_delay_ms() -> u64 {
    crate::DEFAULT_BATCH_DELAY_MS
}

fn default_interval_secs() -> u64 {
    86_400 // daily
}
