// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Process lifecycle: draining held connections on the way out.

use std::sync::Arc;

use crate::broker::SubscriberRegistry;

/// Owns the shutdown path for a broker instance.
///
/// On termination every held connection is resolved with the empty
/// terminal response so no device is left hanging on a dead process.
/// Draining is idempotent: repeated signals find an empty registry and do
/// nothing.
#[derive(Debug, Clone)]
pub struct LifecycleController {
    registry: Arc<SubscriberRegistry>,
}

impl LifecycleController {
    /// Creates a controller over the given registry.
    #[must_use]
    pub fn new(registry: Arc<SubscriberRegistry>) -> Self {
        Self { registry }
    }

    /// Releases every held connection with an empty response.
    ///
    /// Returns how many connections were released.
    pub fn shutdown(&self) -> usize {
        let drained = self.registry.drain_all();
        let released = drained.len();
        for (device, connection) in drained {
            tracing::debug!(device = %device, connection = %connection.id(), "Releasing held connection");
            connection.resolve(None);
        }
        if released > 0 {
            tracing::info!(released, "Drained held connections for shutdown");
        }
        released
    }
}

/// Completes when the process receives SIGINT or, on unix, SIGTERM.
///
/// # Panics
///
/// Panics if the signal handlers cannot be installed, which only happens
/// when the runtime is shutting down already.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
