// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Broker configuration.
//!
//! All knobs are environment-supplied with documented defaults and resolved
//! once at startup by [`BrokerConfig::from_env`]; the rest of the crate only
//! ever sees the resolved values.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `PUSHGATE_PORT` | `8080` | Listening port |
//! | `PUSHGATE_SUBSCRIBER_KEY` | `device-secret` | Access key for `/subscribe` |
//! | `PUSHGATE_PUBLISHER_KEY` | `publish-secret` | Access key for `/publish` |
//! | `PUSHGATE_UPSTREAM_URL` | `http://localhost:3000` | Upstream store base URL |
//! | `PUSHGATE_UPSTREAM_KEY` | unset | Key appended to upstream requests |
//! | `PUSHGATE_SUBSCRIBER_TIMEOUT_MS` | `600000` | How long a connection is held |
//! | `PUSHGATE_SHUTDOWN_GRACE_MS` | `500` | Pause before exit after draining |

use std::time::Duration;

use thiserror::Error;

/// Error raised when an environment variable cannot be interpreted.
#[derive(Debug, Error)]
#[error("invalid value for {name}: {value}")]
pub struct ConfigError {
    /// Name of the offending variable.
    pub name: &'static str,
    /// The raw value found in the environment.
    pub value: String,
}

/// Resolved broker configuration.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use pushgate::BrokerConfig;
///
/// let config = BrokerConfig::new("dev-key", "pub-key", "http://store.local")
///     .with_port(9090)
///     .with_subscriber_timeout(Duration::from_secs(30));
///
/// assert_eq!(config.port(), 9090);
/// ```
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    port: u16,
    subscriber_key: String,
    publisher_key: String,
    upstream_base_url: String,
    upstream_key: Option<String>,
    subscriber_timeout: Duration,
    shutdown_grace: Duration,
}

impl BrokerConfig {
    /// Default listening port.
    pub const DEFAULT_PORT: u16 = 8080;
    /// Default time a subscriber connection is held before it is released
    /// with an empty response.
    pub const DEFAULT_SUBSCRIBER_TIMEOUT: Duration = Duration::from_millis(600_000);
    /// Default pause between draining held connections and process exit.
    pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

    /// Creates a configuration with the given keys and upstream base URL and
    /// defaults for everything else.
    #[must_use]
    pub fn new(
        subscriber_key: impl Into<String>,
        publisher_key: impl Into<String>,
        upstream_base_url: impl Into<String>,
    ) -> Self {
        Self {
            port: Self::DEFAULT_PORT,
            subscriber_key: subscriber_key.into(),
            publisher_key: publisher_key.into(),
            upstream_base_url: upstream_base_url.into(),
            upstream_key: None,
            subscriber_timeout: Self::DEFAULT_SUBSCRIBER_TIMEOUT,
            shutdown_grace: Self::DEFAULT_SHUTDOWN_GRACE,
        }
    }

    /// Resolves the configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a numeric variable is set but not parseable.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::new(
            env_or("PUSHGATE_SUBSCRIBER_KEY", "device-secret"),
            env_or("PUSHGATE_PUBLISHER_KEY", "publish-secret"),
            env_or("PUSHGATE_UPSTREAM_URL", "http://localhost:3000"),
        );

        config.port = parse_env("PUSHGATE_PORT", Self::DEFAULT_PORT)?;
        config.upstream_key = std::env::var("PUSHGATE_UPSTREAM_KEY").ok();
        config.subscriber_timeout = Duration::from_millis(parse_env(
            "PUSHGATE_SUBSCRIBER_TIMEOUT_MS",
            duration_millis(Self::DEFAULT_SUBSCRIBER_TIMEOUT),
        )?);
        config.shutdown_grace = Duration::from_millis(parse_env(
            "PUSHGATE_SHUTDOWN_GRACE_MS",
            duration_millis(Self::DEFAULT_SHUTDOWN_GRACE),
        )?);

        Ok(config)
    }

    /// Sets the listening port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the key appended to upstream requests.
    #[must_use]
    pub fn with_upstream_key(mut self, key: impl Into<String>) -> Self {
        self.upstream_key = Some(key.into());
        self
    }

    /// Sets how long a subscriber connection is held.
    #[must_use]
    pub fn with_subscriber_timeout(mut self, timeout: Duration) -> Self {
        self.subscriber_timeout = timeout;
        self
    }

    /// Sets the pause between draining and process exit.
    #[must_use]
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Returns the listening port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the access key required on `/subscribe`.
    #[must_use]
    pub fn subscriber_key(&self) -> &str {
        &self.subscriber_key
    }

    /// Returns the access key required on `/publish`.
    #[must_use]
    pub fn publisher_key(&self) -> &str {
        &self.publisher_key
    }

    /// Returns the upstream store base URL.
    #[must_use]
    pub fn upstream_base_url(&self) -> &str {
        &self.upstream_base_url
    }

    /// Returns the upstream access key if one is configured.
    #[must_use]
    pub fn upstream_key(&self) -> Option<&str> {
        self.upstream_key.as_deref()
    }

    /// Returns how long a subscriber connection is held.
    #[must_use]
    pub fn subscriber_timeout(&self) -> Duration {
        self.subscriber_timeout
    }

    /// Returns the pause between draining and process exit.
    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        self.shutdown_grace
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError { name, value: raw }),
        Err(_) => Ok(default),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn duration_millis(d: Duration) -> u64 {
    d.as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = BrokerConfig::new("sub", "pub", "http://store.local");
        assert_eq!(config.port(), 8080);
        assert_eq!(config.subscriber_key(), "sub");
        assert_eq!(config.publisher_key(), "pub");
        assert_eq!(config.upstream_base_url(), "http://store.local");
        assert!(config.upstream_key().is_none());
        assert_eq!(config.subscriber_timeout(), Duration::from_millis(600_000));
        assert_eq!(config.shutdown_grace(), Duration::from_millis(500));
    }

    #[test]
    fn builder_chain() {
        let config = BrokerConfig::new("sub", "pub", "http://store.local")
            .with_port(9999)
            .with_upstream_key("store-key")
            .with_subscriber_timeout(Duration::from_secs(1))
            .with_shutdown_grace(Duration::from_millis(50));

        assert_eq!(config.port(), 9999);
        assert_eq!(config.upstream_key(), Some("store-key"));
        assert_eq!(config.subscriber_timeout(), Duration::from_secs(1));
        assert_eq!(config.shutdown_grace(), Duration::from_millis(50));
    }

    #[test]
    fn config_error_display() {
        let err = ConfigError {
            name: "PUSHGATE_PORT",
            value: "not-a-port".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid value for PUSHGATE_PORT: not-a-port"
        );
    }
}
