// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Payload freshness classification.
//!
//! The upstream store answers every fetch, even when it has nothing new to
//! say; in that case it returns `""`, `"{}"` or `"[]"`. The broker tells the
//! two cases apart purely by payload length. The heuristic is deliberately
//! crude and is part of the wire contract with deployed devices: anything of
//! two characters or fewer counts as empty, so a real payload of `"0"` or
//! `"ok"` is misclassified. Do not "fix" the threshold without changing the
//! upstream contract to a structured no-data marker.

/// Classification of an upstream payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// No new data; the payload is a placeholder like `""`, `"{}"` or `"[]"`.
    Empty,
    /// Deliverable data.
    Real,
}

impl Freshness {
    /// Longest payload (in bytes) still classified as empty.
    pub const EMPTY_THRESHOLD: usize = 2;

    /// Classifies a payload by length.
    #[must_use]
    pub fn classify(payload: &str) -> Self {
        if payload.len() <= Self::EMPTY_THRESHOLD {
            Self::Empty
        } else {
            Self::Real
        }
    }

    /// Returns `true` for [`Freshness::Empty`].
    #[must_use]
    pub const fn is_empty(self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns `true` for [`Freshness::Real`].
    #[must_use]
    pub const fn is_real(self) -> bool {
        matches!(self, Self::Real)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_empty() {
        assert_eq!(Freshness::classify(""), Freshness::Empty);
        assert_eq!(Freshness::classify("{}"), Freshness::Empty);
        assert_eq!(Freshness::classify("[]"), Freshness::Empty);
    }

    #[test]
    fn short_real_payloads_are_misclassified() {
        // Known limitation of the length heuristic, preserved on purpose.
        assert_eq!(Freshness::classify("0"), Freshness::Empty);
        assert_eq!(Freshness::classify("ok"), Freshness::Empty);
    }

    #[test]
    fn threshold_boundary() {
        assert!(Freshness::classify("ab").is_empty());
        assert!(Freshness::classify("abc").is_real());
    }

    #[test]
    fn real_payloads() {
        assert_eq!(Freshness::classify("42.5"), Freshness::Real);
        assert_eq!(Freshness::classify(r#"{"t":21}"#), Freshness::Real);
    }

    #[test]
    fn multibyte_payload_is_real() {
        // Length is measured in bytes, so a single 3-byte character passes.
        assert_eq!(Freshness::classify("°C"), Freshness::Real);
    }
}
