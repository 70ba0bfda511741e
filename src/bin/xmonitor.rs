use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{debug, info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};
use xmonitor::{
    actors::supervisor::MonitorSupervisor,
    alerts::EmailNotifier,
    config::read_config_file,
    sources::HttpMetricSource,
    util::{get_config_path, get_smtp_authorization},
};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file (defaults to $XMONITOR_CONFIG or ./xmonitor.toml)
    #[arg(short)]
    file: Option<PathBuf>,

    /// Log every poll
    #[arg(short, long)]
    verbose: bool,
}

fn init(verbose: bool) {
    dotenv::dotenv().ok();

    let level = if verbose {
        LevelFilter::TRACE
    } else {
        LevelFilter::INFO
    };
    let filter = filter::Targets::new().with_targets(vec![("xmonitor", level)]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init(args.verbose);
    trace!("started with args: {args:?}");

    let path = args.file.unwrap_or_else(get_config_path);
    let mut config = read_config_file(&path)?;
    if let Some(authorization) = get_smtp_authorization() {
        debug!("using SMTP authorization from environment");
        config.email.authorization = Some(authorization);
    }
    info!("loaded configuration from {}", path.display());

    let source = HttpMetricSource::new()?;
    let notifier = EmailNotifier::new(&config.email)?;

    let supervisor = MonitorSupervisor::new(&config, Arc::new(source), Arc::new(notifier));
    let cancel = supervisor.cancellation_token();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received Ctrl-C, shutting down");
            cancel.cancel();
        }
    });

    supervisor.run().await;

    Ok(())
}
