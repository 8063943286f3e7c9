#![forbid(unsafe_code)]
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sentry::integrations::anyhow::capture_anyhow;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, event, info, warn};
use upsapp::config::{self, DEFAULT_SETTINGS_FILE, UpsAppConfig, load_configuration_from};
use upsapp::datamodel::metric_descriptor::MetricRegistry;
use upsapp::http::server::run_http_server;
use upsapp::http::state::HttpServerState;
use upsapp::nut::NutClient;
use upsapp::telemetry::scheduler::spawn_refresh_tasks;
use upsapp::telemetry::setup::{register_metric_views, setup_telemetry};
use upsapp::telemetry::{TelemetryCache, TelemetryError};

#[derive(Parser)]
#[command(name = "upsapp")]
#[command(about = "Serve live UPS telemetry read from a NUT daemon")]
#[command(version)]
struct Cli {
    /// Settings file, environment variables take precedence over it
    #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
    settings: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// Read the UPS once, print its variables and exit
    Check,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")?;

    runtime.block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .init();

    // Load configuration
    load_configuration_from(&cli.settings).context("Failed to load configuration")?;
    let config = config::get().context("Failed to get configuration")?;

    // Initialize Sentry if DSN is provided
    let _sentry = config.sentry_dsn.as_ref().map(|dsn| {
        sentry::init((
            dsn.clone(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let client = Arc::new(
        NutClient::new(config.nut_host.clone(), config.nut_port)
            .with_timeout(config.nut_timeout()),
    );
    info!("Using NUT server at {}", client.address());

    let telemetry = setup_telemetry(
        client.clone(),
        config.ups_name(),
        config.min_refresh_interval(),
    )
    .await;

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Check => check(telemetry).await,
        Commands::Serve => serve(&config, telemetry).await,
    };

    client.close().await;
    result
}

async fn check(telemetry: Result<Arc<TelemetryCache>, TelemetryError>) -> Result<()> {
    let telemetry = telemetry.context("UPS integration unavailable")?;
    let snapshot = telemetry.current_snapshot().await;
    println!(
        "{}",
        serde_json::to_string_pretty(&*snapshot).context("Failed to serialize snapshot")?
    );
    Ok(())
}

async fn serve(
    config: &UpsAppConfig,
    telemetry: Result<Arc<TelemetryCache>, TelemetryError>,
) -> Result<()> {
    let (telemetry, metrics) = match telemetry {
        Ok(cache) => {
            let mut registry = MetricRegistry::default();
            let views = register_metric_views(&cache, &mut registry, &config.resources()).await;
            info!("Exposing {} UPS metrics", views.len());
            (Some(cache), views)
        }
        Err(err) => {
            // The process keeps running, readiness reports the outage
            capture_anyhow(&anyhow::Error::new(err));
            warn!("UPS integration unavailable, serving without metrics");
            (None, Vec::new())
        }
    };

    // Exit the program if a panic occurs
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        default_panic(info);
        std::process::exit(1);
    }));

    let refresh_tasks = spawn_refresh_tasks(&metrics, config.scan_interval());

    let address = SocketAddr::from((config.endpoint, config.port));
    info!("Starting HTTP server on {}", address);
    let result = run_http_server(
        HttpServerState {
            name: Arc::new("UpsApp".to_string()),
            telemetry,
            metrics: Arc::new(metrics),
        },
        address,
        config.http_server_timeout_seconds,
    )
    .await;

    for task in refresh_tasks {
        task.abort();
    }

    match result {
        Ok(_) => {
            event!(Level::INFO, "HTTP server stopped gracefully");
            Ok(())
        }
        Err(err) => {
            event!(Level::ERROR, "HTTP server failed: {}", err);
            Err(err)
        }
    }
}
