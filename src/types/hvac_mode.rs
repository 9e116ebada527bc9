// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HVAC mode vocabulary.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Operating mode of a thermostat zone as exposed to the host.
///
/// The device itself tracks two independent bits per room: a power switch
/// (on/off) and an operating mode (heat/cool). This enum is the combined
/// host-facing view: `Off` when the switch is off, otherwise `Heat` or
/// `Cool` per the operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HvacMode {
    /// The zone is actively heating toward its setpoint.
    Heat,
    /// The zone is actively cooling toward its setpoint.
    Cool,
    /// The zone is switched off.
    Off,
}

impl HvacMode {
    /// Combines the device's power and operating bits into a host mode.
    #[must_use]
    pub(crate) fn from_device_bits(power_on: bool, cooling: bool) -> Self {
        if !power_on {
            Self::Off
        } else if cooling {
            Self::Cool
        } else {
            Self::Heat
        }
    }

    /// Returns `true` if the zone is switched on in this mode.
    #[must_use]
    pub fn is_on(&self) -> bool {
        !matches!(self, Self::Off)
    }
}

impl fmt::Display for HvacMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Heat => write!(f, "heat"),
            Self::Cool => write!(f, "cool"),
            Self::Off => write!(f, "off"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_bit_combinations() {
        assert_eq!(HvacMode::from_device_bits(false, false), HvacMode::Off);
        assert_eq!(HvacMode::from_device_bits(false, true), HvacMode::Off);
        assert_eq!(HvacMode::from_device_bits(true, false), HvacMode::Heat);
        assert_eq!(HvacMode::from_device_bits(true, true), HvacMode::Cool);
    }

    #[test]
    fn is_on() {
        assert!(HvacMode::Heat.is_on());
        assert!(HvacMode::Cool.is_on());
        assert!(!HvacMode::Off.is_on());
    }
}
