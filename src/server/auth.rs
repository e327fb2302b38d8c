// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request validation and key-based access control.

use crate::broker::DeviceId;
use crate::error::ApiError;

/// Validates the `device` and `code` parameters of a request.
///
/// The device identifier is checked first so a request missing both gets
/// the 400, not the 403. Each endpoint passes its own role key; the broker
/// is indifferent to the key values themselves.
pub(crate) fn authorize(
    device: Option<&str>,
    code: Option<&str>,
    expected_key: &str,
) -> Result<DeviceId, ApiError> {
    let device = device
        .and_then(|raw| DeviceId::new(raw).ok())
        .ok_or(ApiError::MissingDevice)?;

    if code != Some(expected_key) {
        return Err(ApiError::InvalidKey);
    }

    Ok(device)
}
