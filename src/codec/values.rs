// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Conversions between wire data bytes and physical values.
//!
//! The device encodes temperatures as half-degree graduations with
//! kind-specific offsets and humidity as a full-byte fraction. These are
//! device-native scales; no further unit policy is applied here.

/// Wire offset of the setpoint scale: value 30 is 15.0 °C.
const TARGET_OFFSET: f32 = 30.0;

/// Wire offset of the ambient scale: value 71 is 45.5 °C, descending.
const AMBIENT_OFFSET: f32 = 71.0;

/// Converts a setpoint data byte to °C.
///
/// The scale starts at value 30 (15 °C) with 40 graduations of 0.5 °C
/// up to 35 °C.
#[must_use]
pub fn target_from_value(value: u8) -> f32 {
    (f32::from(value) - TARGET_OFFSET) * 0.5 + 15.0
}

/// Converts a setpoint in °C to its data byte.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[must_use]
pub fn value_from_target(celsius: f32) -> u8 {
    (((celsius - 15.0) / 0.5) + TARGET_OFFSET).round() as u8
}

/// Converts an ambient-temperature data byte to °C.
///
/// The scale starts at value 71 (45.5 °C) and descends 0.5 °C per
/// graduation down to -0.5 °C.
#[must_use]
pub fn ambient_from_value(value: u8) -> f32 {
    45.5 - (f32::from(value) - AMBIENT_OFFSET) * 0.5
}

/// Converts an ambient temperature in °C to its data byte.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[must_use]
pub fn value_from_ambient(celsius: f32) -> u8 {
    (((45.5 - celsius) / 0.5) + AMBIENT_OFFSET).round() as u8
}

/// Converts a humidity data byte (0..=255) to a percentage (0..=100).
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[must_use]
pub fn humidity_from_value(value: u8) -> u8 {
    (f32::from(value) * 100.0 / 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_scale_endpoints() {
        assert_eq!(target_from_value(30), 15.0);
        assert_eq!(target_from_value(70), 35.0);
        assert_eq!(value_from_target(15.0), 30);
        assert_eq!(value_from_target(35.0), 70);
    }

    #[test]
    fn target_scale_roundtrip() {
        for value in 30..=70 {
            assert_eq!(value_from_target(target_from_value(value)), value);
        }
    }

    #[test]
    fn ambient_scale() {
        assert_eq!(ambient_from_value(71), 45.5);
        assert_eq!(ambient_from_value(122), 20.0);
        assert_eq!(value_from_ambient(20.0), 122);
    }

    #[test]
    fn humidity_scale() {
        assert_eq!(humidity_from_value(0), 0);
        assert_eq!(humidity_from_value(255), 100);
        assert_eq!(humidity_from_value(115), 45);
    }
}
