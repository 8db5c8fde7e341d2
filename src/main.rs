//! Page Router (v1)
//!
//! An HTTP server that dispatches requests to page handlers.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌────────────────────────────────────────────────────────────┐
//!                  │                        PAGE ROUTER                          │
//!                  │                                                             │
//!  Client Request  │  ┌────────┐   ┌──────────────┐   ┌─────────────┐            │
//!  ────────────────┼─▶│  http  │──▶│  dispatcher  │──▶│ route cache │── hit ──┐  │
//!                  │  │ server │   │ (middleware) │   └──────┬──────┘         │  │
//!                  │  └────────┘   └──────┬───────┘      miss│                │  │
//!                  │                      │                 ▼                ▼  │
//!                  │              no match│          ┌────────────┐   ┌─────────┐│
//!                  │                      ▼          │ route table│──▶│  page   ││
//!                  │               ┌────────────┐    │   (scan)   │   │ (task)  ││
//!                  │               │ next/host  │    └────────────┘   └────┬────┘│
//!                  │               │  handler   │                          │     │
//!                  │               └────────────┘     ┌──────────────────┐ │     │
//!                  │                                  │instance registry │◀┘     │
//!  Client Response │                                  │ (session, route) │       │
//!  ◀───────────────┼──────────── single-fire response writer ◀───────────┘       │
//!                  └────────────────────────────────────────────────────────────┘
//! ```

mod demo;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use page_router::config::{load_config, RouterConfig};
use page_router::http::{AttachOptions, Dispatcher, PageServer};
use page_router::lifecycle::{wait_for_signal, Shutdown};
use page_router::observability::{logging, metrics};
use page_router::page::{AttachError, PageSource};

#[derive(Parser)]
#[command(name = "page-router")]
#[command(about = "Serve pages with cached route resolution", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RouterConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);
    tracing::info!("page-router v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        pages_directory = ?config.pages.directory,
        cache_ttl_secs = config.cache.ttl_secs,
        "Configuration loaded"
    );

    let dispatcher = Arc::new(Dispatcher::attach(attach_options(&config)?)?);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = PageServer::new(config, dispatcher);
    let server_shutdown = shutdown.subscribe();

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        signal_shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn attach_options(config: &RouterConfig) -> Result<AttachOptions, AttachError> {
    let catalog = demo::catalog()?;

    let not_found = match &config.pages.not_found {
        Some(name) => Some(
            catalog
                .get(name)
                .cloned()
                .ok_or_else(|| AttachError::UnknownHandler(name.clone()))?,
        ),
        None => catalog.get("missing").cloned(),
    };

    let pages = match &config.pages.directory {
        Some(dir) => PageSource::directory(dir, catalog),
        None => PageSource::List(demo::pages()),
    };

    let mut options = AttachOptions::new()
        .pages(pages)
        .engine(Arc::new(demo::LogEngine))
        .cache_ttl(config.cache.ttl())
        .session_cookie(config.session.cookie_name.clone());
    if let Some(page) = not_found {
        options = options.not_found(page);
    }
    Ok(options)
}
