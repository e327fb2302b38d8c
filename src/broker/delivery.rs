// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Delivery decisions.
//!
//! The engine is the single place where a fetched payload turns into either
//! a new parked subscription or a broadcast. Handlers fetch, hand the result
//! here, and act on the returned [`DeliveryOutcome`].

use std::sync::Arc;

use super::{DeviceId, Freshness, HeldConnection, SubscriberRegistry};

/// What the engine did with a fetched payload.
#[derive(Debug)]
pub enum DeliveryOutcome {
    /// The payload was empty and the originating connection is now parked
    /// in the registry; its handler should await delivery.
    Parked,
    /// The payload was real. Every connection held at classification time
    /// was resolved with it; the originating request, when there is one,
    /// answers with the payload directly.
    Delivered {
        /// The payload to answer the originating request with.
        payload: String,
        /// How many parked connections received the payload.
        notified: usize,
    },
    /// The payload was empty and there was no originating connection to
    /// park (publish path); nothing happened.
    NoData,
}

/// Classifies payloads and routes them to the registry.
#[derive(Debug, Clone)]
pub struct DeliveryEngine {
    registry: Arc<SubscriberRegistry>,
}

impl DeliveryEngine {
    /// Creates an engine over the given registry.
    #[must_use]
    pub fn new(registry: Arc<SubscriberRegistry>) -> Self {
        Self { registry }
    }

    /// Applies a fetched payload for a device.
    ///
    /// `originating` is the connection behind a live subscribe request, or
    /// `None` for a publish signal. An empty payload parks the originating
    /// connection (if any); a real payload drains the device's slot and
    /// resolves every drained connection with the payload. Connections
    /// registered after the drain begins catch the next delivery instead.
    ///
    /// When the payload is real and `originating` is present, the unused
    /// connection is simply dropped here; the caller answers its peer
    /// straight from the outcome, so the request is never parked and
    /// released in the same breath.
    pub fn handle_payload(
        &self,
        device: &DeviceId,
        payload: String,
        originating: Option<HeldConnection>,
    ) -> DeliveryOutcome {
        match Freshness::classify(&payload) {
            Freshness::Empty => match originating {
                Some(connection) => {
                    tracing::debug!(
                        device = %device,
                        connection = %connection.id(),
                        "No fresh data, parking subscriber"
                    );
                    self.registry.register(device, connection);
                    DeliveryOutcome::Parked
                }
                None => {
                    tracing::debug!(device = %device, "Empty payload on publish signal, nothing to deliver");
                    DeliveryOutcome::NoData
                }
            },
            Freshness::Real => {
                let drained = self.registry.drain(device);
                let notified = drained.len();
                for connection in drained {
                    connection.resolve(Some(payload.clone()));
                }
                tracing::debug!(device = %device, notified, "Delivered payload to held connections");
                DeliveryOutcome::Delivered { payload, notified }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> (DeliveryEngine, Arc<SubscriberRegistry>) {
        let registry = Arc::new(SubscriberRegistry::new());
        (DeliveryEngine::new(registry.clone()), registry)
    }

    fn device(name: &str) -> DeviceId {
        DeviceId::new(name).unwrap()
    }

    #[test]
    fn empty_payload_parks_originating_connection() {
        let (engine, registry) = engine();
        let dev = device("dev-1");
        let (conn, _rx) = HeldConnection::channel();

        let outcome = engine.handle_payload(&dev, "{}".to_string(), Some(conn));

        assert!(matches!(outcome, DeliveryOutcome::Parked));
        assert_eq!(registry.count(&dev), 1);
    }

    #[test]
    fn empty_payload_without_connection_does_nothing() {
        let (engine, registry) = engine();
        let dev = device("dev-1");

        let outcome = engine.handle_payload(&dev, String::new(), None);

        assert!(matches!(outcome, DeliveryOutcome::NoData));
        assert_eq!(registry.count(&dev), 0);
    }

    #[tokio::test]
    async fn real_payload_broadcasts_and_clears() {
        let (engine, registry) = engine();
        let dev = device("dev-1");
        let (c1, rx1) = HeldConnection::channel();
        let (c2, rx2) = HeldConnection::channel();
        registry.register(&dev, c1);
        registry.register(&dev, c2);

        let outcome = engine.handle_payload(&dev, "42.5".to_string(), None);

        match outcome {
            DeliveryOutcome::Delivered { payload, notified } => {
                assert_eq!(payload, "42.5");
                assert_eq!(notified, 2);
            }
            other => panic!("expected Delivered, got {other:?}"),
        }
        assert_eq!(rx1.await.unwrap(), Some("42.5".to_string()));
        assert_eq!(rx2.await.unwrap(), Some("42.5".to_string()));
        assert_eq!(registry.count(&dev), 0);
    }

    #[tokio::test]
    async fn real_payload_answers_originating_request_directly() {
        let (engine, registry) = engine();
        let dev = device("dev-1");
        let (parked, parked_rx) = HeldConnection::channel();
        registry.register(&dev, parked);

        let (conn, mut rx) = HeldConnection::channel();
        let outcome = engine.handle_payload(&dev, "17.2".to_string(), Some(conn));

        match outcome {
            DeliveryOutcome::Delivered { payload, notified } => {
                assert_eq!(payload, "17.2");
                assert_eq!(notified, 1);
            }
            other => panic!("expected Delivered, got {other:?}"),
        }
        // The parked peer got the broadcast; the originating connection was
        // never registered, so its channel just closes.
        assert_eq!(parked_rx.await.unwrap(), Some("17.2".to_string()));
        assert!(rx.try_recv().is_err());
        assert_eq!(registry.count(&dev), 0);
    }

    #[test]
    fn delivery_only_touches_its_own_device() {
        let (engine, registry) = engine();
        let (other, _rx) = HeldConnection::channel();
        registry.register(&device("dev-2"), other);

        let outcome = engine.handle_payload(&device("dev-1"), "21.0".to_string(), None);

        match outcome {
            DeliveryOutcome::Delivered { notified, .. } => assert_eq!(notified, 0),
            other => panic!("expected Delivered, got {other:?}"),
        }
        assert_eq!(registry.count(&device("dev-2")), 1);
    }
}
