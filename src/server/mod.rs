// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP front: request routing, access control, response policy.
//!
//! Two endpoints make up the wire protocol:
//!
//! - `GET|POST /subscribe?device=<id>&code=<key>` — long-poll for the next
//!   value of a device. Answers immediately when fresh data exists,
//!   otherwise holds the connection until delivery, timeout, or close.
//! - `POST /publish?device=<id>&code=<key>` — signal that new data may
//!   exist; the broker fetches and broadcasts only if someone is waiting.
//!
//! A `ping` query parameter on either endpoint short-circuits with a
//! liveness acknowledgement. `OPTIONS` preflights get an empty body, and
//! every response carries an open-origin CORS header so browser-hosted
//! dashboards can talk to the broker directly.

mod auth;
mod routes;

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};

use crate::broker::{DeliveryEngine, SubscriberRegistry};
use crate::config::BrokerConfig;
use crate::error::ApiError;
use crate::upstream::UpstreamClient;

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub(crate) config: Arc<BrokerConfig>,
    pub(crate) registry: Arc<SubscriberRegistry>,
    pub(crate) engine: DeliveryEngine,
    pub(crate) upstream: UpstreamClient,
}

impl AppState {
    /// Creates the state for a broker instance, wiring a fresh registry
    /// into the delivery engine.
    #[must_use]
    pub fn new(config: BrokerConfig, upstream: UpstreamClient) -> Self {
        let registry = Arc::new(SubscriberRegistry::new());
        Self {
            config: Arc::new(config),
            engine: DeliveryEngine::new(registry.clone()),
            registry,
            upstream,
        }
    }

    /// Returns the registry backing this broker.
    ///
    /// Shutdown holds onto this to drain held connections.
    #[must_use]
    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        &self.registry
    }
}

/// Builds the broker's router.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/subscribe",
            get(routes::subscribe_get)
                .post(routes::subscribe_post)
                .options(routes::preflight),
        )
        .route(
            "/publish",
            post(routes::publish).options(routes::preflight),
        )
        .fallback(routes::not_found)
        .layer(axum::middleware::map_response(open_origin))
        .with_state(state)
}

/// Stamps the open-origin CORS header onto every response.
async fn open_origin(mut response: Response) -> Response {
    response.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    response
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::MissingDevice | ApiError::InvalidKey => {
                tracing::debug!(error = %self, "Rejected request");
                let status = if matches!(self, ApiError::MissingDevice) {
                    StatusCode::BAD_REQUEST
                } else {
                    StatusCode::FORBIDDEN
                };
                (
                    status,
                    Json(serde_json::json!({ "error": self.to_string() })),
                )
                    .into_response()
            }
            ApiError::Upstream(err) => {
                tracing::warn!(error = %err, "Upstream fetch failed");
                (
                    StatusCode::BAD_GATEWAY,
                    Json(serde_json::json!({ "error": "upstream fetch failed" })),
                )
                    .into_response()
            }
            ApiError::Internal => {
                tracing::error!("Internal error while handling request");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
