//!  Wanderlust Booking Agent
//!
//!  Copyright (C) 2026  Mamy Ratsimbazafy
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! # Booking API Server
//!
//! Serves search, booking, the booking assistant and live chat over HTTP.
//!
//! ```bash
//! wanderlust-server --catalog data/catalog.json --port 5000 \
//!     --frontend-url http://localhost:5173
//! ```
//!
//! Every flag can also be set through the environment, see `--help`.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use wanderlust_booking_agent::{AppConfig, AppState, app, rate_limit, shutdown_signal};

#[derive(Parser, Debug)]
#[command(name = "wanderlust-server")]
#[command(author, version, about = "Hotel and restaurant booking API")]
struct Args {
    #[arg(long, env = "WANDERLUST_HOST", default_value = "0.0.0.0")]
    host: String,
    #[arg(long, env = "WANDERLUST_PORT", default_value = "5000")]
    port: u16,
    #[arg(long, env = "WANDERLUST_CATALOG", default_value = "data/catalog.json")]
    catalog: PathBuf,
    #[arg(
        long,
        env = "WANDERLUST_CHECKOUT_URL",
        help = "Payment session endpoint (in-process when unset)"
    )]
    checkout_url: Option<String>,
    #[arg(
        long,
        env = "FRONTEND_URL",
        help = "Origin allowed by CORS (any when unset)"
    )]
    frontend_url: Option<String>,
    #[arg(long, env = "WANDERLUST_MAX_CONCURRENCY", default_value = "256")]
    max_concurrency: usize,
    #[arg(long, default_value = "10")]
    checkout_timeout: u64,
    #[arg(
        long,
        env = "WANDERLUST_SESSION_IDLE_SECS",
        default_value = "1800",
        help = "Drop assistant conversations idle this long"
    )]
    session_idle: u64,
    #[arg(long, env = "WANDERLUST_MAX_SESSIONS", default_value = "10000")]
    max_sessions: usize,
    #[arg(
        long,
        env = "WANDERLUST_RATE_LIMIT",
        default_value = "100",
        help = "Requests allowed per client IP per window"
    )]
    rate_limit: u32,
    #[arg(long, env = "WANDERLUST_RATE_LIMIT_WINDOW_SECS", default_value = "900")]
    rate_limit_window: u64,
}

impl From<Args> for AppConfig {
    fn from(args: Args) -> Self {
        AppConfig {
            host: args.host,
            port: args.port,
            catalog_path: args.catalog,
            checkout_url: args.checkout_url,
            frontend_url: args.frontend_url,
            max_concurrency: args.max_concurrency,
            checkout_timeout_secs: args.checkout_timeout,
            session_idle_secs: args.session_idle,
            max_sessions: args.max_sessions,
            rate_limit_requests: args.rate_limit,
            rate_limit_window_secs: args.rate_limit_window,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".to_string().into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_timer(tracing_subscriber::fmt::time::ChronoUtc::rfc_3339())
                .with_writer(std::io::stderr),
        )
        .init();

    let config = AppConfig::from(Args::parse());
    config.validate().context("Invalid configuration")?;
    let addr = config.socket_addr()?;

    let state = Arc::new(AppState::from_config(&config).await?);
    let shutdown = state.shutdown.clone();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            tracing::info!("Shutdown requested");
            shutdown.cancel();
        }
    });

    tokio::spawn(state.clone().sweep_sessions(config.session_sweep_period()));

    let limits = rate_limit(
        config.rate_limit_requests,
        Duration::from_secs(config.rate_limit_window_secs),
    )?;
    tokio::spawn({
        let limiter = limits.limiter().clone();
        let shutdown = shutdown.clone();
        async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = interval.tick() => {
                        limiter.retain_recent();
                        tracing::debug!("Rate limiter tracks {} clients", limiter.len());
                    }
                }
            }
        }
    });

    let router = app(
        state,
        config.frontend_url.as_deref(),
        config.max_concurrency,
        limits,
    );
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("HTTP server error")?;
    tracing::info!("Server stopped");
    Ok(())
}
