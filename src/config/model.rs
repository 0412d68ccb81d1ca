use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::http_probe::transport::ProbeSettings;
use crate::runner::{DEFAULT_BATCH_SIZE, RunSettings};

/// Longest probe timeout accepted.
pub const MAX_TIMEOUT_SECONDS: f64 = 3600.0;

/// A real browser signature, so servers do not turn the probe away for being a script.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Settings of a stress-test run, as read from the YAML config file.
/// Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressConfig {
    /// CSV corpus of labeled URLs.
    #[serde(default = "default_dataset_file")]
    pub dataset_file: PathBuf,

    /// Name of the CSV column holding the URL.
    #[serde(default = "default_url_column")]
    pub url_column: String,

    /// Name of the CSV column holding the ground-truth label.
    #[serde(default = "default_label_column")]
    pub label_column: String,

    /// Maximum number of probes in flight.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Number of shuffled batches to send.
    #[serde(default = "default_loops")]
    pub loops: usize,

    /// Maximum number of targets per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Applied to the TCP handshake and to every read of the response.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: f64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Name servers to query. Empty means the system configuration.
    #[serde(default)]
    pub dns_hosts: Vec<String>,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_dataset_file() -> PathBuf {
    PathBuf::from("traffic_urls.csv")
}

fn default_url_column() -> String {
    "original_url".to_string()
}

fn default_label_column() -> String {
    "label".to_string()
}

fn default_concurrency() -> usize {
    10
}

fn default_loops() -> usize {
    1
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_timeout_seconds() -> f64 {
    3.0
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            dataset_file: default_dataset_file(),
            url_column: default_url_column(),
            label_column: default_label_column(),
            concurrency: default_concurrency(),
            loops: default_loops(),
            batch_size: default_batch_size(),
            timeout_seconds: default_timeout_seconds(),
            user_agent: default_user_agent(),
            dns_hosts: Vec::new(),
            log_level: default_log_level(),
        }
    }
}

impl StressConfig {
    pub fn run_settings(&self) -> Result<RunSettings> {
        RunSettings::new(self.concurrency, self.loops, self.batch_size)
    }

    pub fn probe_settings(&self) -> Result<ProbeSettings> {
        let invalid = || {
            Error::InvalidParameter(format!(
                "timeout must be more than 0 and at most {MAX_TIMEOUT_SECONDS} seconds, got {}",
                self.timeout_seconds
            ))
        };
        if !(self.timeout_seconds > 0.0 && self.timeout_seconds <= MAX_TIMEOUT_SECONDS) {
            return Err(invalid());
        }
        let timeout = Duration::try_from_secs_f64(self.timeout_seconds).map_err(|_| invalid())?;
        if timeout.is_zero() {
            return Err(invalid());
        }
        Ok(ProbeSettings {
            timeout,
            user_agent: self.user_agent.clone(),
        })
    }
}
