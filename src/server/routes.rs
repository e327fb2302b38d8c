// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Endpoint handlers.
//!
//! Each handler is a linear pipeline: validate, fetch from the upstream
//! store, classify, then either answer immediately or park the connection
//! and await delivery. Parking arms exactly two release mechanisms besides
//! delivery itself: the subscriber timeout (the `timeout` wrapping the
//! receiver await, disarmed structurally when delivery wins) and the close
//! guard (dropped with the handler future when the peer disconnects).

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;

use super::AppState;
use super::auth::authorize;
use crate::broker::{CloseGuard, DeliveryOutcome, DeviceId, Freshness, HeldConnection};
use crate::error::ApiError;

/// Query parameters shared by both endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct RequestParams {
    device: Option<String>,
    code: Option<String>,
    ping: Option<String>,
}

/// Long-poll for the next value of a device.
pub(crate) async fn subscribe_get(
    State(state): State<AppState>,
    Query(params): Query<RequestParams>,
) -> Result<Response, ApiError> {
    if params.ping.is_some() {
        return Ok(liveness());
    }
    let device = authorize(
        params.device.as_deref(),
        params.code.as_deref(),
        state.config.subscriber_key(),
    )?;

    let payload = state.upstream.fetch(&device).await?;
    park_or_respond(&state, device, payload).await
}

/// Write a value through to the store, then long-poll on the result.
///
/// An empty request body turns this into a pure read, identical to the GET
/// variant.
pub(crate) async fn subscribe_post(
    State(state): State<AppState>,
    Query(params): Query<RequestParams>,
    body: String,
) -> Result<Response, ApiError> {
    if params.ping.is_some() {
        return Ok(liveness());
    }
    let device = authorize(
        params.device.as_deref(),
        params.code.as_deref(),
        state.config.subscriber_key(),
    )?;

    let payload = if Freshness::classify(&body).is_empty() {
        state.upstream.fetch(&device).await?
    } else {
        state.upstream.fetch_and_set(&device, body).await?
    };
    park_or_respond(&state, device, payload).await
}

/// Signal that new data may exist for a device.
///
/// The upstream store is only consulted when at least one connection is
/// waiting; a signal into an empty room is acknowledged without a fetch.
/// An upstream failure here is recovered locally: subscribers stay parked
/// for the next signal or their own timeout.
pub(crate) async fn publish(
    State(state): State<AppState>,
    Query(params): Query<RequestParams>,
) -> Result<Response, ApiError> {
    if params.ping.is_some() {
        return Ok(liveness());
    }
    let device = authorize(
        params.device.as_deref(),
        params.code.as_deref(),
        state.config.publisher_key(),
    )?;

    if state.registry.count(&device) == 0 {
        tracing::debug!(device = %device, "Publish signal with no listeners, skipping fetch");
        return Ok(acknowledgement(0));
    }

    match state.upstream.fetch(&device).await {
        Ok(payload) => {
            let notified = match state.engine.handle_payload(&device, payload, None) {
                DeliveryOutcome::Delivered { notified, .. } => notified,
                DeliveryOutcome::Parked | DeliveryOutcome::NoData => 0,
            };
            Ok(acknowledgement(notified))
        }
        Err(err) => {
            tracing::warn!(device = %device, error = %err, "Upstream fetch failed, subscribers remain held");
            Ok(acknowledgement(0))
        }
    }
}

/// CORS preflight; the open-origin header is stamped by the router layer.
pub(crate) async fn preflight() -> Response {
    StatusCode::OK.into_response()
}

/// Fallback for unknown paths.
pub(crate) async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "unknown endpoint" })),
    )
        .into_response()
}

/// Hands a fetched payload to the delivery engine and finishes the request.
///
/// The close guard is armed before the engine sees the connection so a peer
/// disconnect can never strand a registered entry; its removal is
/// idempotent on every other exit path.
async fn park_or_respond(
    state: &AppState,
    device: DeviceId,
    payload: String,
) -> Result<Response, ApiError> {
    let (connection, receiver) = HeldConnection::channel();
    let connection_id = connection.id();
    let _close_guard = CloseGuard::new(state.registry.clone(), device.clone(), connection_id);

    match state.engine.handle_payload(&device, payload, Some(connection)) {
        DeliveryOutcome::Delivered { payload, .. } => Ok(payload.into_response()),
        DeliveryOutcome::Parked => {
            match tokio::time::timeout(state.config.subscriber_timeout(), receiver).await {
                Ok(Ok(Some(payload))) => Ok(payload.into_response()),
                // Shutdown drain, or the registry let go of the channel.
                Ok(Ok(None)) | Ok(Err(_)) => Ok(empty()),
                Err(_) => {
                    state.registry.remove(&device, connection_id);
                    tracing::debug!(device = %device, connection = %connection_id, "Subscriber timed out");
                    Ok(empty())
                }
            }
        }
        // An empty payload with a live connection always parks; this arm
        // only exists to keep the match total.
        DeliveryOutcome::NoData => Ok(empty()),
    }
}

/// The empty terminal response: closes the connection with no payload.
fn empty() -> Response {
    StatusCode::OK.into_response()
}

/// Acknowledgement for publish signals.
fn acknowledgement(notified: usize) -> Response {
    Json(serde_json::json!({ "status": "ok", "notified": notified })).into_response()
}

/// Liveness acknowledgement for `ping` probes.
fn liveness() -> Response {
    Json(serde_json::json!({ "status": "alive" })).into_response()
}
