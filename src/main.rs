// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use platform_device_server::api;
use platform_device_server::auth::TokenService;
use platform_device_server::bootstrap::{bootstrap_superuser, seed_demo_data};
use platform_device_server::config::{Config, LOG_FORMAT_ENV};
use platform_device_server::state::AppState;
use platform_device_server::storage::Store;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = Config::from_env().expect("Failed to load configuration");

    let store = Store::open(&config.data_dir.join("identity.redb"))
        .expect("Failed to open identity store");
    let store = Arc::new(store);

    if let Some((email, password)) = &config.bootstrap_admin {
        bootstrap_superuser(&store, email, password).expect("Failed to bootstrap superuser");
    }
    if config.seed_demo_data {
        seed_demo_data(&store).expect("Failed to seed demo data");
    }

    let tokens = TokenService::with_lifetimes(
        config.token_signing_key.as_bytes(),
        config.access_ttl_secs,
        config.refresh_ttl_secs,
    );
    let app = api::router(AppState::new(store, tokens));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Failed to parse bind address");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");

    tracing::info!(%addr, "platform device server listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server failed");
}

fn init_tracing() {
    let filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("shutdown signal received");
}
