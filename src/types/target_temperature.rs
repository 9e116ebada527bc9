// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Target temperature type.
//!
//! The device represents its setpoint as 40 half-degree graduations from
//! 15 °C to 35 °C. This module provides a type-safe representation that is
//! always on that grid.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// A thermostat setpoint in °C, constrained to the device range.
///
/// Valid values run from 15.0 to 35.0 °C in 0.5 ° steps.
///
/// # Examples
///
/// ```
/// use termowifi::types::TargetTemperature;
///
/// let target = TargetTemperature::new(21.5).unwrap();
/// assert_eq!(target.celsius(), 21.5);
///
/// // Out-of-range or off-grid values return an error
/// assert!(TargetTemperature::new(40.0).is_err());
/// assert!(TargetTemperature::new(21.3).is_err());
///
/// // Or clamp/snap instead
/// assert_eq!(TargetTemperature::clamped(40.0).celsius(), 35.0);
/// assert_eq!(TargetTemperature::clamped(21.3).celsius(), 21.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetTemperature(f32);

impl TargetTemperature {
    /// Minimum supported setpoint (15.0 °C).
    pub const MIN: Self = Self(15.0);

    /// Maximum supported setpoint (35.0 °C).
    pub const MAX: Self = Self(35.0);

    /// Setpoint granularity (0.5 °C).
    pub const STEP: f32 = 0.5;

    /// Creates a new target temperature.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::TemperatureOutOfRange` if `celsius` is outside
    /// 15.0–35.0 °C, or `ValueError::TemperatureOffGrid` if it is not a
    /// multiple of 0.5 °C.
    pub fn new(celsius: f32) -> Result<Self, ValueError> {
        if !(Self::MIN.0..=Self::MAX.0).contains(&celsius) {
            return Err(ValueError::TemperatureOutOfRange {
                min: Self::MIN.0,
                max: Self::MAX.0,
                actual: celsius,
            });
        }
        let steps = (celsius - Self::MIN.0) / Self::STEP;
        if (steps - steps.round()).abs() > 1e-4 {
            return Err(ValueError::TemperatureOffGrid(celsius));
        }
        Ok(Self(Self::MIN.0 + steps.round() * Self::STEP))
    }

    /// Creates a target temperature, clamping to the valid range and
    /// snapping to the nearest 0.5 ° step.
    #[must_use]
    pub fn clamped(celsius: f32) -> Self {
        let clamped = celsius.clamp(Self::MIN.0, Self::MAX.0);
        let steps = ((clamped - Self::MIN.0) / Self::STEP).round();
        Self(Self::MIN.0 + steps * Self::STEP)
    }

    /// Returns the setpoint in °C.
    #[must_use]
    pub const fn celsius(&self) -> f32 {
        self.0
    }
}

impl fmt::Display for TargetTemperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} °C", self.0)
    }
}
