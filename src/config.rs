use std::path::PathBuf;
use std::time::Duration;

use tracing::trace;

use crate::util::{get_directory_url, get_smtp_port, get_smtp_server};

/// How often a status notification is sent independently of alerts
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCadence {
    /// Every n-th successful sample (0 disables status updates)
    Cycles(u32),

    /// Once the given number of seconds has passed since the last status (0 disables)
    Seconds(u64),
}

impl Default for StatusCadence {
    fn default() -> Self {
        StatusCadence::Cycles(60)
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct SmtpConfig {
    #[serde(default = "default_smtp_host")]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// Sender address, falls back to the SMTP login
    pub from: Option<String>,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            from: None,
        }
    }
}

fn default_smtp_host() -> String {
    String::from("smtp.gmail.com")
}

fn default_smtp_port() -> u16 {
    465
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    #[serde(default = "default_protocol")]
    pub protocol: String,

    #[serde(default = "default_metric_api")]
    pub metric_api: String,

    /// Endpoint serving the recipient list
    pub directory_url: Option<String>,

    /// Whether the first entry of the recipient list is a header row
    #[serde(default = "default_skip_header")]
    pub skip_header: bool,

    /// Seconds between two monitoring cycles
    #[serde(default = "default_interval")]
    pub interval: u64,

    /// Relative change (in percent) that triggers an alert
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    #[serde(default)]
    pub status_cadence: StatusCadence,

    /// Seconds before an external call is given up
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    pub log_file: Option<PathBuf>,

    #[serde(default)]
    pub smtp: SmtpConfig,
}

fn default_protocol() -> String {
    String::from("base-bridge")
}

fn default_metric_api() -> String {
    String::from("https://api.llama.fi")
}

fn default_skip_header() -> bool {
    true
}

fn default_interval() -> u64 {
    60
}

fn default_threshold() -> f64 {
    3.0
}

fn default_timeout() -> u64 {
    10
}

fn default_state_file() -> PathBuf {
    PathBuf::from("state.json")
}

impl Config {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Apply overrides from the environment. Endpoints and relay
    /// settings are treated like credentials and may live in `.env`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(url) = get_directory_url() {
            self.directory_url = Some(url);
        }
        if let Some(host) = get_smtp_server() {
            self.smtp.host = host;
        }
        if let Some(port) = get_smtp_port() {
            self.smtp.port = port;
        }
        self
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            anyhow::bail!("threshold must be a non-negative number, got {}", self.threshold);
        }
        if self.interval == 0 {
            anyhow::bail!("interval must be at least one second");
        }
        if self.timeout == 0 {
            anyhow::bail!("timeout must be at least one second");
        }
        if self.protocol.trim().is_empty() {
            anyhow::bail!("protocol must not be empty");
        }
        if self.directory_url.as_deref().is_none_or(str::is_empty) {
            anyhow::bail!("no recipient directory configured (set directory_url or APPS_SCRIPT_API_URL)");
        }
        Ok(())
    }
}

pub fn parse_config(content: &str) -> anyhow::Result<Config> {
    serde_json::from_str(content)
        .map_err(|e| anyhow::anyhow!("Invalid configuration file provided: {e}"))
        .inspect(|config| trace!("loaded config: {config:?}"))
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)?;
    parse_config(&file_content)
}
