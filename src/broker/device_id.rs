// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device identifier type.

use std::fmt;

use thiserror::Error;

/// Error raised when constructing a [`DeviceId`] from an empty string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("device identifier must be non-empty")]
pub struct EmptyDeviceId;

/// Identifier naming a device or data source.
///
/// The identifier is opaque to the broker; its only job is to group held
/// connections and correlate publish signals with them. The one constraint
/// is that it is non-empty.
///
/// # Examples
///
/// ```
/// use pushgate::DeviceId;
///
/// let id = DeviceId::new("greenhouse-7").unwrap();
/// assert_eq!(id.as_str(), "greenhouse-7");
/// assert!(DeviceId::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceId(String);

impl DeviceId {
    /// Creates a device identifier from a raw string.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyDeviceId`] if the string is empty.
    pub fn new(raw: impl Into<String>) -> Result<Self, EmptyDeviceId> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(EmptyDeviceId);
        }
        Ok(Self(raw))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
