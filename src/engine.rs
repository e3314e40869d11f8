//! Decision core of the monitor
//!
//! [`MonitorEngine::evaluate`] turns one sample and the prior state into
//! a new state and zero or more notification requests. It performs no
//! I/O and reads no clock, so the same inputs always give the same
//! output.
//!
//! ## Alert latch
//!
//! ```text
//! |change| <  threshold:
//!   alert_sent == false  → ChangeEvaluation::Stable (no alert)
//!   alert_sent == true   → ChangeEvaluation::BackInBand (latch cleared, no alert)
//!
//! |change| >= threshold:
//!   alert_sent == false  → ChangeEvaluation::StartsToExceed (send alert, latch set)
//!   alert_sent == true   → ChangeEvaluation::Exceeding (no alert)
//! ```
//!
//! While the latch is set, the change is measured against the last value
//! seen before the crossing, so a move that keeps drifting away in small
//! steps stays latched instead of re-arming on every step.
//!
//! Status notifications follow their own cadence and never touch the latch.

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use crate::{
    config::StatusCadence,
    notify::message::{self, NotificationRequest},
    sources::FetchError,
    state::{MonitorState, Sample},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvaluation {
    /// The sample could not be fetched; nothing was decided
    Unavailable,
    /// First sample ever; recorded as baseline
    Baseline,
    /// The previous value was zero, no relative change exists
    Undefined,
    Stable,
    BackInBand,
    StartsToExceed,
    Exceeding,
}

impl ChangeEvaluation {
    pub fn evaluate(pct_change: f64, threshold: f64, alert_sent: bool) -> ChangeEvaluation {
        if pct_change.abs() < threshold {
            if alert_sent {
                return ChangeEvaluation::BackInBand;
            }
            return ChangeEvaluation::Stable;
        }

        if alert_sent {
            return ChangeEvaluation::Exceeding;
        }

        ChangeEvaluation::StartsToExceed
    }
}

/// Relative change in percent, `None` when the previous value is zero
pub fn percent_change(previous: f64, current: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    Some((current - previous) / previous * 100.0)
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub protocol: String,
    pub threshold: f64,
    pub status_cadence: StatusCadence,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub state: MonitorState,
    pub notifications: Vec<NotificationRequest>,
    pub change: ChangeEvaluation,
}

impl Evaluation {
    /// Whether the cycle produced a sample and the state has to be saved
    pub fn has_sample(&self) -> bool {
        self.change != ChangeEvaluation::Unavailable
    }
}

#[derive(Debug, Clone)]
pub struct MonitorEngine {
    config: EngineConfig,
}

impl MonitorEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn evaluate(
        &self,
        sample: Result<Sample, &FetchError>,
        prior: &MonitorState,
        now: DateTime<Utc>,
    ) -> Evaluation {
        let EngineConfig {
            protocol,
            threshold,
            status_cadence,
        } = &self.config;
        let threshold = *threshold;

        // a failed fetch must not be mistaken for a drop to zero
        let sample = match sample {
            Ok(sample) => sample,
            Err(e) => {
                trace!("{protocol}: no sample ({e}), keeping state");
                return Evaluation {
                    state: prior.clone(),
                    notifications: vec![],
                    change: ChangeEvaluation::Unavailable,
                };
            }
        };

        let current = sample.value();
        let mut state = MonitorState {
            last_value: Some(current),
            threshold,
            last_checked_at: Some(now),
            ..prior.clone()
        };

        let Some(previous) = prior.last_value else {
            debug!("{protocol}: recording baseline {current}");
            state.alert_sent = false;
            state.alert_reference = None;
            state.last_status_at = Some(now);
            state.samples_since_status = 0;
            return Evaluation {
                state,
                notifications: vec![message::baseline(protocol, current)],
                change: ChangeEvaluation::Baseline,
            };
        };

        let mut notifications = vec![];

        // a latched alert keeps measuring against the value before the crossing
        let reference = match prior.alert_reference {
            Some(reference) if prior.alert_sent => reference,
            _ => previous,
        };

        // no decision without a relative change to the previous sample;
        // the latch and its reference are carried over as they are
        let decision = if previous == 0.0 {
            None
        } else {
            percent_change(reference, current)
        };

        let change = match decision {
            None => ChangeEvaluation::Undefined,
            Some(pct) => {
                let change = ChangeEvaluation::evaluate(pct, threshold, prior.alert_sent);
                match change {
                    ChangeEvaluation::StartsToExceed => {
                        debug!("{protocol}: change of {pct:.2}% crosses threshold {threshold}%");
                        state.alert_sent = true;
                        state.alert_reference = Some(reference);
                        notifications.push(message::alert(protocol, pct, reference, current));
                    }
                    ChangeEvaluation::Exceeding => {
                        state.alert_sent = true;
                        state.alert_reference = Some(reference);
                    }
                    ChangeEvaluation::BackInBand => {
                        debug!("{protocol}: change of {pct:.2}% is back within threshold");
                        state.alert_sent = false;
                        state.alert_reference = None;
                    }
                    _ => {
                        state.alert_sent = false;
                        state.alert_reference = None;
                    }
                }
                change
            }
        };

        let pct_change = percent_change(previous, current);
        if status_due(*status_cadence, prior, now) {
            notifications.push(message::status(
                protocol, pct_change, threshold, previous, current,
            ));
            state.last_status_at = Some(now);
            state.samples_since_status = 0;
        } else {
            state.samples_since_status = prior.samples_since_status.saturating_add(1);
        }

        trace!(
            "{protocol}: {previous} -> {current} ({pct_change:?}%) -> {change:?} ({} notifications)",
            notifications.len()
        );

        Evaluation {
            state,
            notifications,
            change,
        }
    }
}

fn status_due(cadence: StatusCadence, prior: &MonitorState, now: DateTime<Utc>) -> bool {
    match cadence {
        StatusCadence::Cycles(0) | StatusCadence::Seconds(0) => false,
        StatusCadence::Cycles(cycles) => prior.samples_since_status.saturating_add(1) >= cycles,
        StatusCadence::Seconds(seconds) => {
            let seconds = i64::try_from(seconds).unwrap_or(i64::MAX);
            prior
                .last_status_at
                .is_none_or(|at| now.signed_duration_since(at).num_seconds() >= seconds)
        }
    }
}
