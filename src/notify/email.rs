//! Email delivery over SMTP

use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use tokio::time::timeout;
use tracing::{error, info, instrument};

use crate::config::SmtpConfig;

use super::{DeliveryReport, Notifier, NotifyResult};

/// Port on which the relay speaks implicit TLS; every other port uses STARTTLS
const SMTPS_PORT: u16 = 465;

#[derive(Clone, Debug)]
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    /// Upper bound for the delivery to a single address
    timeout: Duration,
}

impl SmtpNotifier {
    pub fn new(
        config: &SmtpConfig,
        (user, password): (String, String),
        timeout: Duration,
    ) -> NotifyResult<Self> {
        let from: Mailbox = config.from.as_deref().unwrap_or(user.as_str()).parse()?;

        let builder = if config.port == SMTPS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
        };

        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(user, password))
            .timeout(Some(timeout))
            .build();

        Ok(Self {
            transport,
            from,
            timeout,
        })
    }

    fn message(&self, to: &str, subject: &str, body: &str) -> NotifyResult<Message> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;
        Ok(message)
    }

    async fn send_one(&self, to: &str, subject: &str, body: &str) -> NotifyResult<()> {
        let message = self.message(to, subject, body)?;
        timeout(self.timeout, self.transport.send(message)).await??;
        Ok(())
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    #[instrument(skip(self, addresses, body))]
    async fn send(
        &self,
        addresses: &[String],
        subject: &str,
        body: &str,
    ) -> NotifyResult<DeliveryReport> {
        let mut report = DeliveryReport::default();

        for address in addresses {
            match self.send_one(address, subject, body).await {
                Ok(()) => report.delivered.push(address.clone()),
                Err(e) => {
                    error!("failed to send email to {address}: {e}");
                    report.failed.push((address.clone(), e));
                }
            }
        }

        info!(
            "email sent to {}/{} recipients",
            report.delivered.len(),
            addresses.len()
        );
        Ok(report)
    }
}
