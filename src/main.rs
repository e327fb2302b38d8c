// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Broker server binary.

use pushgate::{AppState, BrokerConfig, LifecycleController, UpstreamClient, shutdown_signal};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = BrokerConfig::from_env()?;
    let upstream = UpstreamClient::new(
        config.upstream_base_url(),
        config.upstream_key().map(str::to_string),
    )?;
    let state = AppState::new(config.clone(), upstream);
    let lifecycle = LifecycleController::new(state.registry().clone());

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port())).await?;
    tracing::info!(
        port = config.port(),
        upstream = config.upstream_base_url(),
        "pushgate listening"
    );

    let drain_on_signal = {
        let lifecycle = lifecycle.clone();
        async move {
            shutdown_signal().await;
            tracing::info!("Termination signal received");
            lifecycle.shutdown();
        }
    };

    axum::serve(listener, pushgate::router(state))
        .with_graceful_shutdown(drain_on_signal)
        .await?;

    // Normal-exit hook; a no-op when the signal path already drained.
    lifecycle.shutdown();

    // Give the log writer a moment before the process ends.
    tokio::time::sleep(config.shutdown_grace()).await;
    Ok(())
}
