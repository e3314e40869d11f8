use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, instrument, warn};

use crate::cycle::{CycleReport, Monitor};

use super::messages::MonitorCommand;

/// Actor that runs monitoring cycles at a fixed interval
pub struct MonitorActor {
    monitor: Monitor,

    /// Command receiver for control messages
    command_rx: mpsc::Receiver<MonitorCommand>,

    interval_duration: Duration,
}

impl MonitorActor {
    pub fn new(
        monitor: Monitor,
        command_rx: mpsc::Receiver<MonitorCommand>,
        interval_duration: Duration,
    ) -> Self {
        Self {
            monitor,
            command_rx,
            interval_duration,
        }
    }

    /// Run the actor's main loop
    ///
    /// The first cycle starts immediately. The loop runs until:
    /// - A Shutdown command is received
    /// - The command channel is closed
    #[instrument(skip(self), fields(protocol = %self.monitor.protocol()))]
    pub async fn run(mut self) {
        debug!("starting monitor actor");

        let mut ticker = interval(self.interval_duration);
        // a slow cycle delays the schedule instead of causing a burst
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.cycle().await;
                    info!("cycle completed, waiting for the next one");
                }

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(MonitorCommand::CheckNow { respond_to }) => {
                            debug!("received CheckNow command");
                            let report = self.cycle().await;
                            let _ = respond_to.send(report);
                        }

                        Some(MonitorCommand::Shutdown) => {
                            debug!("received shutdown command");
                            break;
                        }

                        None => {
                            warn!("command channel closed, shutting down");
                            break;
                        }
                    }
                }
            }
        }

        debug!("monitor actor stopped");
    }

    async fn cycle(&mut self) -> CycleReport {
        self.monitor.run_cycle(Utc::now()).await
    }
}

/// Handle for controlling a MonitorActor
pub struct MonitorHandle {
    sender: mpsc::Sender<MonitorCommand>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Spawn a new monitor actor
    pub fn spawn(monitor: Monitor, interval_duration: Duration) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let actor = MonitorActor::new(monitor, cmd_rx, interval_duration);

        let task = tokio::spawn(actor.run());

        Self {
            sender: cmd_tx,
            task,
        }
    }

    /// Run a cycle right away and wait for its report
    pub async fn check_now(&self) -> Result<CycleReport> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(MonitorCommand::CheckNow { respond_to: tx })
            .await?;

        Ok(rx.await?)
    }

    /// Shut down the monitor, waiting for a running cycle to finish
    pub async fn shutdown(self) -> Result<()> {
        let _ = self.sender.send(MonitorCommand::Shutdown).await;
        self.task.await?;
        Ok(())
    }
}
