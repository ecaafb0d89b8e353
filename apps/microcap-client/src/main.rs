//! Microcap Client Binary
//!
//! Signs in, prints today's picks and streams their live prices.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin microcap-client
//! ```
//!
//! # Environment Variables
//!
//! - `MICROCAP_LOGIN_EMAIL`: identifier used to sign in (required on first run)
//! - `MICROCAP_ENV`: development | production (default: development)
//! - `MICROCAP_API_BASE_URL`: backend origin override
//! - `MICROCAP_REALTIME_URL`: quote stream endpoint override
//! - `RUST_LOG`: Log level (default: `microcap_client=info`)

use std::sync::Arc;

use anyhow::{Context, bail};
use microcap_client::infrastructure::telemetry;
use microcap_client::{AppContainer, ClientConfig, FeedEvent, InMemoryVault, StockIdea};
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;

    load_dotenv();
    telemetry::init();

    tracing::info!("Starting Microcap Client");

    let config = ClientConfig::from_env().context("invalid configuration")?;
    let container = AppContainer::new(&config, Arc::new(InMemoryVault::new()))
        .context("failed to build client")?;
    let listener = container.start();

    if !container.session().is_authenticated() {
        let Some(email) = config.login_email.as_deref() else {
            bail!("no stored session and MICROCAP_LOGIN_EMAIL is not set");
        };
        if !container.auth().login(email).await {
            bail!("login failed");
        }
    }

    let picks = container
        .api()
        .fetch_daily_picks()
        .await
        .context("failed to fetch daily picks")?;
    print_picks(&picks);

    let feed = container.feed();
    let mut events = feed.subscribe_events();
    let tickers: Vec<&str> = picks.iter().map(|p| p.ticker.as_str()).collect();
    feed.subscribe(tickers.as_slice());

    if let Err(e) = feed.connect().await {
        tracing::error!(error = %e, "Live prices unavailable");
    }

    let shutdown = await_shutdown();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => break,
            event = events.recv() => match event {
                Ok(FeedEvent::PriceUpdated { ticker, price }) => {
                    tracing::info!(ticker = %ticker, price, "Live price");
                }
                Ok(FeedEvent::StatusChanged(status)) => {
                    tracing::info!(status = status.as_str(), "Feed status");
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Dropped feed events");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    container.shutdown();
    listener.abort();
    tracing::info!("Microcap Client stopped");
    Ok(())
}

fn print_picks(picks: &[StockIdea]) {
    for idea in picks {
        let upside = idea
            .potential_upside()
            .map_or_else(|| "n/a".to_string(), |u| format!("{:+.1}%", u * 100.0));
        println!(
            "{:<6} {:<11} upside {:>8}  {}",
            idea.ticker,
            idea.risk_level.as_str(),
            upside,
            idea.company_name
        );
    }
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
async fn await_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}
