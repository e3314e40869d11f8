pub mod actors;
pub mod config;
pub mod cycle;
pub mod dispatch;
pub mod engine;
pub mod notify;
pub mod sources;
pub mod state;
pub mod storage;
pub mod util;

use std::sync::Arc;

use anyhow::Context;

use crate::{
    config::Config,
    cycle::Monitor,
    dispatch::Dispatcher,
    engine::{EngineConfig, MonitorEngine},
    notify::email::SmtpNotifier,
    sources::{defillama::DefiLlamaSource, directory::HttpDirectory, http_client},
    storage::FileStore,
    util::get_smtp_credentials,
};

/// Wire up a monitor from a validated configuration
pub fn build_monitor(config: &Config) -> anyhow::Result<Monitor> {
    let client = http_client(config.timeout()).context("failed to build HTTP client")?;

    let directory_url = config
        .directory_url
        .clone()
        .context("no recipient directory configured")?;

    let credentials =
        get_smtp_credentials().context("SMTP_EMAIL and SMTP_PASSWORD must be set")?;
    let notifier = SmtpNotifier::new(&config.smtp, credentials, config.timeout())
        .context("invalid SMTP configuration")?;

    let engine = MonitorEngine::new(EngineConfig {
        protocol: config.protocol.clone(),
        threshold: config.threshold,
        status_cadence: config.status_cadence,
    });

    let dispatcher = Dispatcher::new(
        Arc::new(HttpDirectory::new(
            client.clone(),
            directory_url,
            config.skip_header,
        )),
        Arc::new(notifier),
        config.timeout(),
    );

    Ok(Monitor::new(
        engine,
        Arc::new(DefiLlamaSource::new(client, config.metric_api.clone())),
        Arc::new(FileStore::new(config.state_file.clone())),
        dispatcher,
        config.timeout(),
    ))
}
