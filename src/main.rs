//! Two-stage HTTP relay.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client            invoker (hop 1)                     greeting (hop 2)
//!   ──────▶  GET /  ──▶ InvokerHandler ──▶ GET <downstream> ──▶ GreetingHandler
//!                          │   span hop-1                          │   span hop-2
//!                          │                                       │   (masked fault)
//!   ◀──────  Envelope ◀────┘◀──── JSON body, verbatim ◀────────────┘
//!
//!                 Cross-cutting: config · diagnostics (logs + spans) · metrics
//! ```
//!
//! Each process serves one role. The instrumentation backend (none,
//! open-standard, vendor, or several) is chosen by configuration only.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use lambda_relay::http::HttpServer;
use lambda_relay::lifecycle::startup::resolve_config;
use lambda_relay::lifecycle::Shutdown;
use lambda_relay::observability::{logging, metrics, Diagnostics};
use lambda_relay::{instrumentation, Role};

#[derive(Parser)]
#[command(name = "lambda-relay")]
#[command(about = "Two-stage HTTP relay with swappable instrumentation", long_about = None)]
struct Cli {
    /// Which hop this process serves.
    #[arg(short, long, value_enum)]
    role: Role,

    /// Optional TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = resolve_config(cli.config.as_deref(), std::env::vars())?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);
    tracing::info!(role = %cli.role, "lambda-relay v0.1.0 starting");

    let instrumentation = instrumentation::from_config(&config);
    let diagnostics = Diagnostics::new(instrumentation);

    tracing::info!(
        environment = %config.environment_name,
        downstream = ?config.downstream.address,
        downstream_timeout_ms = config.downstream.timeout_ms,
        invocation_timeout_secs = config.timeouts.invocation_secs,
        instrumentation = diagnostics.backend_name(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(&config, cli.role, diagnostics)?;
    let shutdown = Shutdown::new();
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
