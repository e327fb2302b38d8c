// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the broker.
//!
//! Failures are split into two layers: [`UpstreamError`] for anything that
//! goes wrong while talking to the upstream data store, and [`ApiError`] for
//! request-scoped failures that map onto HTTP responses. Validation problems
//! are caller mistakes and are never logged as faults; upstream failures are
//! recovered per endpoint policy (see the server module).

use thiserror::Error;

/// Errors from the upstream data store.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The HTTP request itself failed (connect, timeout, body read).
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The upstream answered with a non-success status.
    #[error("upstream returned HTTP {status}")]
    Status {
        /// The status code the upstream responded with.
        status: u16,
    },
}

/// Request-scoped errors surfaced to HTTP callers.
///
/// The server module maps each variant to a status code: validation
/// failures become 4xx responses with a structured error body, upstream
/// failures become 502, and anything unexpected becomes a bare 500.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The `device` query parameter was missing or empty.
    #[error("missing device identifier")]
    MissingDevice,

    /// The `code` query parameter did not match the role's access key.
    #[error("invalid access key")]
    InvalidKey,

    /// Fetching from the upstream store failed.
    #[error("upstream fetch failed: {0}")]
    Upstream(#[from] UpstreamError),

    /// Unexpected failure inside request handling.
    #[error("internal error")]
    Internal,
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, ApiError>;
