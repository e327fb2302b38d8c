// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscriber bookkeeping.
//!
//! The registry maps device identifiers to the connections currently parked
//! on them. A parked connection is represented by [`HeldConnection`], the
//! sending half of a oneshot channel whose receiver is awaited by the
//! subscribe handler. Sending consumes the channel, so a connection can be
//! resolved at most once no matter which path (delivery, timeout, shutdown)
//! gets there first.
//!
//! All mutating operations take a single lock over the whole map. The
//! expected load is low-frequency IoT signaling, not high-throughput
//! streaming, so one mutex is enough to serialize register/drain/remove for
//! any identifier.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::oneshot;

use super::DeviceId;

/// Counter backing [`ConnectionId`]; process-wide so ids stay unique across
/// registries (tests create several).
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a held connection.
///
/// Used to remove a specific connection from the registry when its peer
/// disconnects or its hold times out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw id value.
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Conn({})", self.0)
    }
}

/// The resolution pushed to a held connection.
///
/// `Some(payload)` is a delivery; `None` is the empty terminal response used
/// by timeouts and shutdown.
pub type Resolution = Option<String>;

/// An open, not-yet-completed response channel parked in the registry.
///
/// Owned exclusively by the [`SubscriberRegistry`] from registration until
/// it is drained out for resolution. Resolving consumes the connection, so
/// double-resolution is impossible by construction.
#[derive(Debug)]
pub struct HeldConnection {
    id: ConnectionId,
    tx: oneshot::Sender<Resolution>,
}

impl HeldConnection {
    /// Creates a connection and the receiving half its handler awaits.
    #[must_use]
    pub fn channel() -> (Self, oneshot::Receiver<Resolution>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                id: ConnectionId::next(),
                tx,
            },
            rx,
        )
    }

    /// Returns this connection's id.
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Resolves the connection, waking its handler.
    ///
    /// A send failure means the peer already hung up and the handler is
    /// gone; there is nobody left to notify, so it is ignored.
    pub fn resolve(self, resolution: Resolution) {
        let _ = self.tx.send(resolution);
    }
}

/// Registry of held connections, grouped by device identifier.
///
/// An identifier with zero held connections may be absent from the map or
/// present with an empty collection; the two states are equivalent and every
/// operation treats them identically.
#[derive(Debug, Default)]
pub struct SubscriberRegistry {
    connections: Mutex<HashMap<DeviceId, Vec<HeldConnection>>>,
}

impl SubscriberRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parks a connection under the given device identifier.
    pub fn register(&self, device: &DeviceId, connection: HeldConnection) {
        let mut connections = self.connections.lock();
        connections
            .entry(device.clone())
            .or_default()
            .push(connection);
    }

    /// Atomically removes and returns every connection held for the device.
    ///
    /// The slot is left in place but empty, ready for the next round; a
    /// subsequent [`count`](Self::count) reads 0. A register racing with a
    /// drain lands either in this drain or in the registry for the next one,
    /// never nowhere.
    #[must_use]
    pub fn drain(&self, device: &DeviceId) -> Vec<HeldConnection> {
        let mut connections = self.connections.lock();
        std::mem::take(connections.entry(device.clone()).or_default())
    }

    /// Removes one specific connection, dropping its channel unresolved.
    ///
    /// Used when the peer closes early: the connection is already gone, so
    /// there is nothing to resolve. Idempotent; removing a connection that
    /// was already drained or removed is a no-op. Returns whether anything
    /// was removed.
    pub fn remove(&self, device: &DeviceId, id: ConnectionId) -> bool {
        let mut connections = self.connections.lock();
        let Some(held) = connections.get_mut(device) else {
            return false;
        };
        let before = held.len();
        held.retain(|connection| connection.id() != id);
        held.len() < before
    }

    /// Returns how many connections are currently held for the device.
    #[must_use]
    pub fn count(&self, device: &DeviceId) -> usize {
        self.connections.lock().get(device).map_or(0, Vec::len)
    }

    /// Removes and returns every held connection regardless of identifier.
    ///
    /// Used only by shutdown. Draining (rather than listing) makes a second
    /// shutdown pass trivially a no-op.
    #[must_use]
    pub fn drain_all(&self) -> Vec<(DeviceId, HeldConnection)> {
        let mut connections = self.connections.lock();
        connections
            .drain()
            .flat_map(|(device, held)| {
                held.into_iter()
                    .map(move |connection| (device.clone(), connection))
            })
            .collect()
    }
}

/// Removes a connection from the registry when dropped.
///
/// The subscribe handler arms one of these before parking, so a peer
/// disconnect (which drops the handler future mid-await) cleans the stale
/// entry out of the registry. Removal is idempotent, which makes the guard
/// harmless on every other exit path: after a delivery the connection was
/// already drained, after a timeout it was already removed.
#[derive(Debug)]
pub struct CloseGuard {
    registry: Arc<SubscriberRegistry>,
    device: DeviceId,
    id: ConnectionId,
}

impl CloseGuard {
    /// Arms a guard for the given connection.
    #[must_use]
    pub fn new(registry: Arc<SubscriberRegistry>, device: DeviceId, id: ConnectionId) -> Self {
        Self {
            registry,
            device,
            id,
        }
    }
}

impl Drop for CloseGuard {
    fn drop(&mut self) {
        if self.registry.remove(&self.device, self.id) {
            tracing::debug!(device = %self.device, connection = %self.id, "Removed held connection on close");
        }
    }
}
