//! Helper functions and fakes for integration tests

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tvl_monitor::{
    config::StatusCadence,
    cycle::Monitor,
    dispatch::Dispatcher,
    engine::{EngineConfig, MonitorEngine},
    notify::{DeliveryReport, Notifier, NotifyError, NotifyResult},
    sources::{FetchError, FetchResult, MetricSource, RecipientDirectory},
    state::Sample,
    storage::StateStore,
};

pub const PROTOCOL: &str = "base-bridge";

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
}

pub fn minutes(n: i64) -> DateTime<Utc> {
    start_time() + chrono::Duration::minutes(n)
}

pub fn recipients(addresses: &[&str]) -> Vec<String> {
    addresses.iter().map(|a| a.to_string()).collect()
}

/// Metric source answering from a script; the last answer repeats
pub struct ScriptedSource {
    answers: Mutex<VecDeque<FetchResult<f64>>>,
    delay: Option<Duration>,
    pub calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(answers: Vec<FetchResult<f64>>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn values(values: &[f64]) -> Self {
        Self::new(values.iter().copied().map(Ok).collect())
    }

    pub fn slow(value: f64, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::values(&[value])
        }
    }
}

#[async_trait]
impl MetricSource for ScriptedSource {
    async fn fetch(&self, protocol: &str) -> FetchResult<Sample> {
        assert_eq!(protocol, PROTOCOL);
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let answer = {
            let mut answers = self.answers.lock().unwrap();
            if answers.len() > 1 {
                answers.pop_front().unwrap()
            } else {
                answers.front().cloned().unwrap()
            }
        };

        answer.and_then(|value| Ok(Sample::new(value)?))
    }
}

/// Directory answering from a script; the last answer repeats
pub struct ScriptedDirectory {
    answers: Mutex<VecDeque<FetchResult<Vec<String>>>>,
    pub calls: AtomicUsize,
}

impl ScriptedDirectory {
    pub fn new(answers: Vec<FetchResult<Vec<String>>>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn fixed(addresses: &[&str]) -> Self {
        Self::new(vec![Ok(recipients(addresses))])
    }

    pub fn failing() -> Self {
        Self::new(vec![Err(FetchError::Status(500))])
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecipientDirectory for ScriptedDirectory {
    async fn fetch(&self) -> FetchResult<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut answers = self.answers.lock().unwrap();
        if answers.len() > 1 {
            answers.pop_front().unwrap()
        } else {
            answers.front().cloned().unwrap()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Notifier recording every message; selected addresses or the whole
/// transport can be made to fail
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<SentMessage>>,
    pub failing_addresses: HashSet<String>,
    pub transport_down: bool,
    /// Time spent on every single address
    pub per_address_delay: Option<Duration>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(addresses: &[&str]) -> Self {
        Self {
            failing_addresses: addresses.iter().map(|a| a.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn down() -> Self {
        Self {
            transport_down: true,
            ..Self::default()
        }
    }

    pub fn slow(per_address_delay: Duration) -> Self {
        Self {
            per_address_delay: Some(per_address_delay),
            ..Self::default()
        }
    }

    pub fn subjects(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|m| m.subject.clone())
            .collect()
    }

    pub fn messages(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(
        &self,
        addresses: &[String],
        subject: &str,
        body: &str,
    ) -> NotifyResult<DeliveryReport> {
        if self.transport_down {
            return Err(NotifyError::Transport("connection refused".to_string()));
        }

        let mut report = DeliveryReport::default();
        let mut delivered = vec![];
        for address in addresses {
            if let Some(delay) = self.per_address_delay {
                tokio::time::sleep(delay).await;
            }
            if self.failing_addresses.contains(address) {
                report.failed.push((
                    address.clone(),
                    NotifyError::Transport("mailbox unavailable".to_string()),
                ));
            } else {
                delivered.push(address.clone());
                report.delivered.push(address.clone());
            }
        }

        self.sent.lock().unwrap().push(SentMessage {
            to: delivered,
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(report)
    }
}

pub fn engine(threshold: f64, cadence: StatusCadence) -> MonitorEngine {
    MonitorEngine::new(EngineConfig {
        protocol: PROTOCOL.to_string(),
        threshold,
        status_cadence: cadence,
    })
}

/// Monitor with a 3% threshold and status updates disabled
pub fn create_test_monitor(
    source: Arc<dyn MetricSource>,
    store: Arc<dyn StateStore>,
    directory: Arc<dyn RecipientDirectory>,
    notifier: Arc<dyn Notifier>,
) -> Monitor {
    create_test_monitor_with(
        engine(3.0, StatusCadence::Cycles(0)),
        source,
        store,
        directory,
        notifier,
    )
}

pub fn create_test_monitor_with(
    engine: MonitorEngine,
    source: Arc<dyn MetricSource>,
    store: Arc<dyn StateStore>,
    directory: Arc<dyn RecipientDirectory>,
    notifier: Arc<dyn Notifier>,
) -> Monitor {
    let timeout = Duration::from_millis(500);
    Monitor::new(
        engine,
        source,
        store,
        Dispatcher::new(directory, notifier, timeout),
        timeout,
    )
}

pub fn protocol_body(tvl: f64) -> serde_json::Value {
    serde_json::json!({
        "id": "3016",
        "name": "Base Bridge",
        "tvl": [
            { "date": 1717200000, "totalLiquidityUSD": tvl * 0.9 },
            { "date": 1717286400, "totalLiquidityUSD": tvl }
        ]
    })
}
