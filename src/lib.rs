// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `pushgate` - a long-poll push broker between IoT devices and an
//! upstream data store.
//!
//! A device asks for the current value of an identifier. When fresh data
//! exists the broker answers immediately; otherwise the connection is held
//! open until a publisher signals that new data is available, at which
//! point the value is pushed to every held connection and the connections
//! close. Devices reconnect for the next round.
//!
//! # What the broker guarantees
//!
//! - **Exactly-once resolution**: a held connection is answered by exactly
//!   one of delivery, timeout, peer close, or shutdown.
//! - **Broadcast per identifier**: every connection held at the moment a
//!   real payload arrives receives that payload.
//! - **Bounded holds**: a configurable per-connection timeout (default ten
//!   minutes) releases subscribers the publisher forgot about.
//! - **Clean drain**: process termination answers every held connection
//!   with an empty response before exit.
//!
//! # Quick Start
//!
//! ```no_run
//! use pushgate::{AppState, BrokerConfig, LifecycleController, UpstreamClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BrokerConfig::from_env()?;
//!     let upstream = UpstreamClient::new(
//!         config.upstream_base_url(),
//!         config.upstream_key().map(str::to_string),
//!     )?;
//!     let state = AppState::new(config.clone(), upstream);
//!     let lifecycle = LifecycleController::new(state.registry().clone());
//!
//!     let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port())).await?;
//!     axum::serve(listener, pushgate::server::router(state))
//!         .with_graceful_shutdown(async move {
//!             pushgate::shutdown_signal().await;
//!             lifecycle.shutdown();
//!         })
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod broker;
pub mod config;
pub mod error;
pub mod server;
pub mod shutdown;
pub mod upstream;

pub use broker::{
    CloseGuard, ConnectionId, DeliveryEngine, DeliveryOutcome, DeviceId, EmptyDeviceId, Freshness,
    HeldConnection, Resolution, SubscriberRegistry,
};
pub use config::{BrokerConfig, ConfigError};
pub use error::{ApiError, Result, UpstreamError};
pub use server::{AppState, router};
pub use shutdown::{LifecycleController, shutdown_signal};
pub use upstream::UpstreamClient;
