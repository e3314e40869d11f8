//! Persisted monitoring state and the sample type fed into the engine

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The single persisted record of the monitor.
///
/// Only the previous sample is retained; the monitor answers "did TVL
/// move a lot since last time?", it does not keep a history.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorState {
    /// Last successfully observed value, `None` before the first sample
    pub last_value: Option<f64>,

    /// Alert threshold in percent, copied from the configuration
    pub threshold: f64,

    /// Set once a crossing has been notified, cleared when the change falls back under the threshold
    pub alert_sent: bool,

    /// Time of the last successful sample
    pub last_checked_at: Option<DateTime<Utc>>,

    /// While an alert is latched, the value the change is measured against
    /// (the last value seen before the crossing)
    #[serde(default)]
    pub alert_reference: Option<f64>,

    /// Time of the last status (or baseline) notification
    #[serde(default)]
    pub last_status_at: Option<DateTime<Utc>>,

    /// Successful samples since the last status (or baseline) notification
    #[serde(default)]
    pub samples_since_status: u32,
}

/// A validated metric observation: finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample(f64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidSample(pub f64);

impl fmt::Display for InvalidSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "metric value must be finite and non-negative, got {}", self.0)
    }
}

impl std::error::Error for InvalidSample {}

impl Sample {
    pub fn new(value: f64) -> Result<Self, InvalidSample> {
        if value.is_finite() && value >= 0.0 {
            Ok(Self(value))
        } else {
            Err(InvalidSample(value))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}
