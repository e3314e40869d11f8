//! One monitoring cycle: load → fetch → evaluate → save → notify

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    dispatch::{DispatchOutcome, Dispatcher},
    engine::{ChangeEvaluation, MonitorEngine},
    sources::{FetchError, FetchResult, MetricSource},
    state::{MonitorState, Sample},
    storage::StateStore,
};

/// What happened during a single cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub change: ChangeEvaluation,
    pub state: MonitorState,
    /// The sample could not be fetched (soft failure)
    pub fetch_error: Option<FetchError>,
    /// The new state reached the store
    pub persisted: bool,
    pub deliveries: Vec<DispatchOutcome>,
}

pub struct Monitor {
    engine: MonitorEngine,
    source: Arc<dyn MetricSource>,
    store: Arc<dyn StateStore>,
    dispatcher: Dispatcher,
    timeout: Duration,

    /// State of a cycle whose save failed; preferred over the stored record
    unsaved: Option<MonitorState>,
}

impl Monitor {
    pub fn new(
        engine: MonitorEngine,
        source: Arc<dyn MetricSource>,
        store: Arc<dyn StateStore>,
        dispatcher: Dispatcher,
        timeout: Duration,
    ) -> Self {
        Self {
            engine,
            source,
            store,
            dispatcher,
            timeout,
            unsaved: None,
        }
    }

    pub fn protocol(&self) -> &str {
        &self.engine.config().protocol
    }

    async fn fetch_sample(&self) -> FetchResult<Sample> {
        timeout(self.timeout, self.source.fetch(self.protocol())).await?
    }

    /// Run a full cycle. Never fails: every error is logged and reflected
    /// in the report, the next cycle starts from the best state available.
    #[instrument(skip(self), fields(protocol = %self.protocol()))]
    pub async fn run_cycle(&mut self, now: DateTime<Utc>) -> CycleReport {
        let unsaved = self.unsaved.take();
        let resumed = unsaved.is_some();
        let prior = match unsaved {
            Some(state) => {
                debug!("continuing from state that was not saved");
                state
            }
            None => self.store.load().await,
        };

        let sample = self.fetch_sample().await;
        if let Err(e) = &sample {
            warn!("failed to fetch TVL: {e}");
        }

        let evaluation = self.engine.evaluate(sample.as_ref().copied(), &prior, now);

        let persisted = if evaluation.has_sample() {
            match self.store.save(&evaluation.state).await {
                Ok(()) => true,
                Err(e) => {
                    error!("failed to save monitor state: {e}");
                    self.unsaved = Some(evaluation.state.clone());
                    false
                }
            }
        } else {
            if resumed {
                self.unsaved = Some(prior);
            }
            false
        };

        if let Some(value) = evaluation.state.last_value
            && evaluation.has_sample()
        {
            info!("TVL {value} -> {:?}", evaluation.change);
        }

        let deliveries = self.dispatcher.dispatch_all(&evaluation.notifications).await;

        CycleReport {
            change: evaluation.change,
            state: evaluation.state,
            fetch_error: sample.err(),
            persisted,
            deliveries,
        }
    }
}
