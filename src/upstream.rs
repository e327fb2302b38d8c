// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Client for the upstream data store.
//!
//! The broker never interprets stored values beyond the freshness check; the
//! upstream is an opaque text-in, text-out key-value service. Two calls
//! exist: a read, and a combined write-then-read used by subscribe-POST.

use std::time::Duration;

use reqwest::Client;

use crate::broker::DeviceId;
use crate::error::UpstreamError;

/// HTTP client for the upstream data store.
///
/// # Examples
///
/// ```no_run
/// use pushgate::{DeviceId, UpstreamClient};
///
/// # async fn example() -> Result<(), pushgate::UpstreamError> {
/// let client = UpstreamClient::new("http://store.local", Some("store-key".into()))?;
/// let device = DeviceId::new("greenhouse-7").unwrap();
/// let payload = client.fetch(&device).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    base_url: String,
    key: Option<String>,
    client: Client,
}

impl UpstreamClient {
    /// Default request timeout toward the upstream store.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a client for the store at `base_url`.
    ///
    /// A trailing slash on the base URL is tolerated. `key`, when present,
    /// is appended to every request.
    ///
    /// # Errors
    ///
    /// Returns error if the underlying HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, key: Option<String>) -> Result<Self, UpstreamError> {
        Self::with_timeout(base_url, key, Self::DEFAULT_TIMEOUT)
    }

    /// Creates a client with a custom request timeout.
    ///
    /// # Errors
    ///
    /// Returns error if the underlying HTTP client cannot be built.
    pub fn with_timeout(
        base_url: impl Into<String>,
        key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, UpstreamError> {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(UpstreamError::Transport)?;

        Ok(Self {
            base_url,
            key,
            client,
        })
    }

    /// Returns the base URL of the store.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds the value URL for a device.
    fn value_url(&self, device: &DeviceId) -> String {
        let encoded = urlencoding::encode(device.as_str());
        match &self.key {
            Some(key) => {
                format!(
                    "{}/values/{encoded}?key={}",
                    self.base_url,
                    urlencoding::encode(key)
                )
            }
            None => format!("{}/values/{encoded}", self.base_url),
        }
    }

    /// Fetches the current value for a device.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] on transport failure or a non-success
    /// status.
    pub async fn fetch(&self, device: &DeviceId) -> Result<String, UpstreamError> {
        let url = self.value_url(device);
        tracing::debug!(url = %url, "Fetching upstream value");

        let response = self.client.get(&url).send().await?;
        Self::into_body(response).await
    }

    /// Writes `body` for a device and returns the store's resulting value.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] on transport failure or a non-success
    /// status.
    pub async fn fetch_and_set(
        &self,
        device: &DeviceId,
        body: String,
    ) -> Result<String, UpstreamError> {
        let url = self.value_url(device);
        tracing::debug!(url = %url, bytes = body.len(), "Writing upstream value");

        let response = self.client.post(&url).body(body).send().await?;
        Self::into_body(response).await
    }

    async fn into_body(response: reqwest::Response) -> Result<String, UpstreamError> {
        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(name: &str) -> DeviceId {
        DeviceId::new(name).unwrap()
    }

    #[test]
    fn value_url_without_key() {
        let client = UpstreamClient::new("http://store.local", None).unwrap();
        assert_eq!(
            client.value_url(&device("dev-1")),
            "http://store.local/values/dev-1"
        );
    }

    #[test]
    fn value_url_with_key() {
        let client = UpstreamClient::new("http://store.local", Some("s3cret".into())).unwrap();
        assert_eq!(
            client.value_url(&device("dev-1")),
            "http://store.local/values/dev-1?key=s3cret"
        );
    }

    #[test]
    fn value_url_encodes_device() {
        let client = UpstreamClient::new("http://store.local", None).unwrap();
        assert_eq!(
            client.value_url(&device("shed sensor")),
            "http://store.local/values/shed%20sensor"
        );
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = UpstreamClient::new("http://store.local/", None).unwrap();
        assert_eq!(client.base_url(), "http://store.local");
    }
}
