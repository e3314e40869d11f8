//! Outbound notifications
//!
//! The engine produces [`NotificationRequest`]s; a [`Notifier`] delivers
//! them to a list of addresses. Delivery is best-effort: failures are
//! reported per address and never feed back into the monitoring state.

pub mod email;
pub mod error;
pub mod message;

use async_trait::async_trait;

pub use error::{NotifyError, NotifyResult};
pub use message::{NotificationKind, NotificationRequest};

/// Outcome of one delivery attempt to a set of addresses
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeliveryReport {
    pub delivered: Vec<String>,
    pub failed: Vec<(String, NotifyError)>,
}

impl DeliveryReport {
    /// Every address was delivered successfully
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a message to every address. A failure for one address must
    /// not prevent delivery to the others.
    async fn send(
        &self,
        addresses: &[String],
        subject: &str,
        body: &str,
    ) -> NotifyResult<DeliveryReport>;
}
