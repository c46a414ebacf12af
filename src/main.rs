// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! TalentHub API Server
//!
//! REST backend for the TalentHub job portal.

use std::sync::Arc;
use std::time::Duration;
use talenthub::{config::Config, db::FirestoreDb, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often stale magic-link cooldown entries are dropped.
const PRUNE_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting TalentHub API");
    let db = FirestoreDb::new(&config.gcp_project_id).await?;

    let port = config.port;
    let state = Arc::new(AppState::new(config, db));
    if !state.email.is_configured() {
        tracing::warn!("Mail relay not configured; magic links will only be logged");
    }

    let prune_state = state.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PRUNE_INTERVAL);
        loop {
            ticker.tick().await;
            prune_state.magic_link_throttle.prune();
            let dropped = prune_state.db.prune_locks();
            if dropped > 0 {
                tracing::debug!(dropped, "Pruned idle record locks");
            }
        }
    });

    let app = talenthub::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("talenthub=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
