//! Linkwatch binary entry point.
//!
//! Two subcommands, two independent processes: `linkwatch sample`
//! collects ping sessions into the data directory, `linkwatch serve`
//! exposes that directory over HTTP. They share nothing but the
//! filesystem.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use linkwatch::config::{
    self, ConfigError, SamplerConfig, ServerConfig, DEFAULT_DATA_DIR, DEFAULT_SOURCE,
};
use linkwatch::sampler::Sampler;
use linkwatch::server::{create_router, AppState, StatusProxy, DEFAULT_ENDPOINT};
use linkwatch::store::SourceMap;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Linkwatch - Connection Quality Monitor
#[derive(Parser, Debug)]
#[command(name = "linkwatch", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the ping sampler.
    Sample(SampleArgs),
    /// Run the viewer web server.
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
struct SampleArgs {
    /// Probe target address.
    #[arg(long, default_value = config::DEFAULT_TARGET, env = "LINKWATCH_TARGET")]
    target: String,

    /// Egress interface for probes.
    #[arg(short = 'I', long, env = "LINKWATCH_INTERFACE")]
    interface: Option<String>,

    /// Probes per session document.
    #[arg(long, default_value_t = config::DEFAULT_PINGS_PER_FILE, env = "LINKWATCH_PINGS_PER_FILE")]
    pings_per_file: usize,

    /// Interval between probe starts (e.g. "1s", "500ms", "0").
    #[arg(long, default_value = "1s", value_parser = config::parse_duration, env = "LINKWATCH_INTERVAL")]
    interval: Duration,

    /// Per-probe timeout.
    #[arg(long, default_value = "1s", value_parser = config::parse_duration, env = "LINKWATCH_TIMEOUT")]
    timeout: Duration,

    /// Directory session documents are written to.
    #[arg(long, default_value = DEFAULT_DATA_DIR, env = "LINKWATCH_DATA_DIR")]
    data_dir: PathBuf,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Server bind address.
    #[arg(long, default_value = "0.0.0.0", env = "LINKWATCH_BIND")]
    bind: String,

    /// Server port.
    #[arg(long, default_value_t = 8000, env = "LINKWATCH_PORT")]
    port: u16,

    /// Source mappings as name:path pairs. Defaults to a single
    /// source named "starlink" over the default data directory.
    #[arg(value_name = "NAME:PATH")]
    sources: Vec<String>,

    /// Document root for static assets.
    #[arg(long, default_value = "static", env = "LINKWATCH_STATIC_ROOT")]
    static_root: PathBuf,

    /// Device-management endpoint for the live-status proxy.
    #[arg(long, default_value = DEFAULT_ENDPOINT, env = "LINKWATCH_DEVICE_ENDPOINT")]
    device_endpoint: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,linkwatch=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Sample(args) => run_sampler(args).await,
        Command::Serve(args) => run_server(args).await,
    }
}

async fn run_sampler(args: SampleArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = SamplerConfig::new(args.target)
        .with_pings_per_file(args.pings_per_file)
        .with_interval(args.interval)
        .with_timeout(args.timeout)
        .with_data_dir(args.data_dir);
    if let Some(iface) = args.interface {
        config = config.with_interface(iface);
    }
    config.validate()?;

    tracing::info!(
        target_host = %config.target,
        interface = ?config.interface,
        "Starting sampler"
    );

    let sampler = Sampler::from_config(&config)?;

    tokio::select! {
        _ = sampler.run() => {}
        _ = shutdown_signal() => {
            tracing::info!("Shutting down; in-progress session discarded");
        }
    }
    Ok(())
}

async fn run_server(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig {
        bind: args.bind,
        port: args.port,
        static_root: args.static_root,
        device_endpoint: args.device_endpoint,
    };
    config.validate()?;

    let pairs = if args.sources.is_empty() {
        vec![(DEFAULT_SOURCE.to_string(), PathBuf::from(DEFAULT_DATA_DIR))]
    } else {
        args.sources
            .iter()
            .map(|pair| config::parse_mapping(pair))
            .collect::<Result<Vec<_>, ConfigError>>()?
    };
    let sources = SourceMap::new(pairs);
    tracing::info!(sources = ?sources.names(), "Serving sources");

    let state = AppState {
        sources,
        proxy: StatusProxy::new(&config.device_endpoint),
        static_root: config.static_root.clone(),
    };
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.bind, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening at http://{}/", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal");
        }
    }
}
