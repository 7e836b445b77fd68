use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tracing::{error, info, warn};
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use stock_watcher::plugins::notifiers::{DiscordNotifier, LogNotifier};
use stock_watcher::plugins::Notifier;
use stock_watcher::web::{self, AppState};
use stock_watcher::{
    AppConfig, PageFetcher, StatusExtractor, StockChecker, SweepScheduler, SweepTiming, TrackingStore,
    WebScraper,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the control plane and the sweep loop (default)
    Serve,
    /// Fetch one product page and print the detected status
    Check { url: String },
    /// Print tracked items from the state file
    List,
}

fn init_logging(directory: Option<&Path>) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,stock_watcher=debug"));

    // Optional daily-rotated file next to stdout
    let file_layer = directory.map(|dir| {
        fmt::layer()
            .with_writer(rolling::daily(dir, "stock-watcher.log"))
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stdout))
        .with(file_layer)
        .init();
}

fn install_metrics(config: &AppConfig) -> Result<()> {
    if !config.metrics.enabled {
        return Ok(());
    }

    let addr: std::net::SocketAddr = format!("{}:{}", config.server.host, config.metrics.port)
        .parse()
        .context("invalid metrics listen address")?;
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("failed to install Prometheus exporter")?;

    info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

fn build_notifier(config: &AppConfig) -> Result<Arc<dyn Notifier>> {
    let notifier: Arc<dyn Notifier> = match config.notifications.transport.as_str() {
        "log" => Arc::new(LogNotifier::new()),
        _ => Arc::new(DiscordNotifier::new(config.notifications.username.clone())?),
    };
    Ok(notifier)
}

fn build_checker(config: &AppConfig) -> Result<Arc<StockChecker>> {
    let fetcher: Arc<dyn PageFetcher> = Arc::new(WebScraper::new(&config.scraper)?);
    Ok(Arc::new(StockChecker::new(
        fetcher,
        StatusExtractor::new(),
        build_notifier(config)?,
    )))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::from_env().context("failed to load configuration")?;
    init_logging(config.logging.directory.as_deref());

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Check { url } => check(config, &url).await,
        Command::List => list(config).await,
    }
}

async fn serve(config: AppConfig) -> Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "Starting Stock Watcher");
    install_metrics(&config)?;

    let store = Arc::new(
        TrackingStore::open(
            &config.monitor.state_file,
            config.scraper.allowed_hosts.clone(),
            config.monitor.min_interval_secs,
        )
        .await,
    );
    if let Some(sink) = &config.notifications.default_alert_sink {
        store.apply_default_alert_sink(sink).await;
    }
    if store.alert_sink().await.is_none() {
        warn!("No alert sink configured, changes will only be logged");
    }

    let checker = build_checker(&config)?;
    let (ready_tx, ready_rx) = oneshot::channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scheduler = SweepScheduler::new(store.clone(), checker.clone(), SweepTiming::from(&config.monitor));
    let scheduler_shutdown = shutdown_rx.clone();
    let scheduler_handle = tokio::spawn(async move { scheduler.run(ready_rx, scheduler_shutdown).await });

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
        }
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    let state = AppState::new(store.clone(), checker);
    let served = web::serve(&config.server, state, ready_tx, shutdown_rx).await;

    if let Err(e) = scheduler_handle.await {
        error!(error = %e, "Scheduler task failed");
    }
    if let Err(e) = store.save().await {
        warn!(error = %e, "Final state save failed");
    }

    info!("Stock Watcher stopped");
    served
}

async fn check(config: AppConfig, url: &str) -> Result<()> {
    let checker = build_checker(&config)?;
    let (observation, fetched) = checker.observe(url).await;

    println!("url:     {}", url);
    println!("fetched: {}", fetched);
    println!("status:  {}", observation.status);
    println!("title:   {}", observation.title.as_deref().unwrap_or("-"));
    Ok(())
}

async fn list(config: AppConfig) -> Result<()> {
    let state = TrackingStore::load(&config.monitor.state_file).await;

    println!("interval: {} min", state.interval_seconds / 60);
    if state.items.is_empty() {
        println!("No items tracked.");
        return Ok(());
    }

    for item in state.items.values() {
        let status = item.last_status.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string());
        match &item.nickname {
            Some(nickname) => println!("{} [{}] {}", status, nickname, item.url),
            None => println!("{} {}", status, item.url),
        }
    }
    Ok(())
}
