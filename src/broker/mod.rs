// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core broker: subscriber bookkeeping and delivery.
//!
//! Everything in here is transport-agnostic. The pieces compose leaf-first:
//!
//! - [`Freshness`] decides whether an upstream payload carries new data.
//! - [`SubscriberRegistry`] holds parked connections per [`DeviceId`].
//! - [`DeliveryEngine`] turns a fetched payload into either a new parked
//!   subscription or a broadcast to every held connection.
//!
//! The HTTP layer in [`crate::server`] drives these; shutdown in
//! [`crate::shutdown`] drains them.

mod delivery;
mod device_id;
mod freshness;
mod registry;

pub use delivery::{DeliveryEngine, DeliveryOutcome};
pub use device_id::{DeviceId, EmptyDeviceId};
pub use freshness::Freshness;
pub use registry::{CloseGuard, ConnectionId, HeldConnection, Resolution, SubscriberRegistry};
