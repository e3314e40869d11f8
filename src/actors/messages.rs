//! Message types for controlling the monitor actor

use tokio::sync::oneshot;

use crate::cycle::CycleReport;

/// Commands that can be sent to a MonitorActor
#[derive(Debug)]
pub enum MonitorCommand {
    /// Run a cycle immediately (bypassing the interval timer)
    ///
    /// Used for testing and manual checks.
    CheckNow {
        /// Channel to send the cycle report back
        respond_to: oneshot::Sender<CycleReport>,
    },

    /// Gracefully shut down the monitor
    ///
    /// A cycle that is already running is finished first.
    Shutdown,
}
