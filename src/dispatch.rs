//! Delivery of engine notifications to the current recipients
//!
//! Every request fetches the recipient list anew; the directory may
//! change between (and within) cycles. Failures are logged and reported
//! but never retried here: the next cycle is the retry.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{error, info, instrument, warn};

use crate::{
    notify::{DeliveryReport, NotificationKind, NotificationRequest, Notifier, NotifyError},
    sources::{FetchError, RecipientDirectory},
};

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// The notifier was invoked; the report says which addresses got it
    Delivered {
        kind: NotificationKind,
        report: DeliveryReport,
    },

    /// The directory returned no addresses
    NoRecipients { kind: NotificationKind },

    /// The recipient list could not be fetched
    DirectoryUnavailable {
        kind: NotificationKind,
        error: FetchError,
    },

    /// The notifier failed as a whole
    DeliveryFailed {
        kind: NotificationKind,
        error: NotifyError,
    },
}

impl DispatchOutcome {
    /// At least one address did not receive the notification
    pub fn is_failure(&self) -> bool {
        match self {
            DispatchOutcome::Delivered { report, .. } => !report.is_complete(),
            DispatchOutcome::NoRecipients { .. } => false,
            DispatchOutcome::DirectoryUnavailable { .. }
            | DispatchOutcome::DeliveryFailed { .. } => true,
        }
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    directory: Arc<dyn RecipientDirectory>,
    notifier: Arc<dyn Notifier>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        directory: Arc<dyn RecipientDirectory>,
        notifier: Arc<dyn Notifier>,
        timeout: Duration,
    ) -> Self {
        Self {
            directory,
            notifier,
            timeout,
        }
    }

    /// Deliver all requests one after another
    pub async fn dispatch_all(&self, requests: &[NotificationRequest]) -> Vec<DispatchOutcome> {
        let mut outcomes = Vec::with_capacity(requests.len());
        for request in requests {
            outcomes.push(self.dispatch(request).await);
        }
        outcomes
    }

    #[instrument(skip_all, fields(kind = ?request.kind))]
    pub async fn dispatch(&self, request: &NotificationRequest) -> DispatchOutcome {
        let kind = request.kind;

        let recipients = match timeout(self.timeout, self.directory.fetch()).await {
            Ok(Ok(recipients)) => recipients,
            Ok(Err(error)) => {
                warn!("could not fetch recipients, skipping notification: {error}");
                return DispatchOutcome::DirectoryUnavailable { kind, error };
            }
            Err(elapsed) => {
                let error = FetchError::from(elapsed);
                warn!("could not fetch recipients, skipping notification: {error}");
                return DispatchOutcome::DirectoryUnavailable { kind, error };
            }
        };

        if recipients.is_empty() {
            warn!("no recipients found, skipping notification");
            return DispatchOutcome::NoRecipients { kind };
        }

        // the notifier works through the addresses one by one
        let budget = self
            .timeout
            .saturating_mul(u32::try_from(recipients.len()).unwrap_or(u32::MAX));
        let sent = timeout(
            budget,
            self.notifier
                .send(&recipients, &request.subject, &request.body),
        )
        .await
        .map_err(NotifyError::from)
        .and_then(|result| result);

        match sent {
            Ok(report) => {
                if report.is_complete() {
                    info!("notification delivered to {} recipients", report.delivered.len());
                } else {
                    error!(
                        "notification failed for {} of {} recipients",
                        report.failed.len(),
                        recipients.len()
                    );
                }
                DispatchOutcome::Delivered { kind, report }
            }
            Err(error) => {
                error!("failed to deliver notification: {error}");
                DispatchOutcome::DeliveryFailed { kind, error }
            }
        }
    }
}
