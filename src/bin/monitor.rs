use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::{info, level_filters::LevelFilter, trace};
use tracing_subscriber::{Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};
use tvl_monitor::{actors::monitor::MonitorHandle, build_monitor, config::read_config_file};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file
    #[arg(short)]
    file: String,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,
}

fn init(log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = filter::Targets::new().with_target("tvl_monitor", LevelFilter::DEBUG);

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_filter(filter.clone()),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false)
                .with_filter(filter),
        )
        .with(file_layer)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let config = read_config_file(&args.file)?.with_env_overrides();
    init(config.log_file.as_deref())?;
    trace!("started with args: {args:?}");

    config.validate()?;
    let mut monitor = build_monitor(&config)?;

    if args.once {
        let report = monitor.run_cycle(Utc::now()).await;
        trace!("cycle report: {report:?}");
        return Ok(());
    }

    info!(
        "monitoring {} every {}s (threshold {}%)",
        config.protocol, config.interval, config.threshold
    );
    let handle = MonitorHandle::spawn(monitor, config.interval());

    tokio::signal::ctrl_c().await?;
    info!("TVL monitoring stopped by the user");
    handle.shutdown().await?;

    Ok(())
}
