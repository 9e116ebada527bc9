// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Last-known state of a single thermostat zone.

use std::time::Instant;

use serde::Serialize;

use crate::codec::RoomField;
use crate::types::{HvacMode, RoomId, TargetTemperature};

/// Tracked state of one room.
///
/// All sensor fields are optional because the device does not guarantee a
/// sensor per room and a poll answer carries one field at a time; a field
/// stays `None` until the device first reports it and keeps its last value
/// when a later refresh omits it.
///
/// # Examples
///
/// ```
/// use termowifi::state::RoomState;
/// use termowifi::types::RoomId;
///
/// let state = RoomState::new(RoomId::new(1).unwrap());
/// assert!(state.target_temperature().is_none());
/// assert!(state.is_available());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomState {
    room: RoomId,
    target_temperature: Option<TargetTemperature>,
    current_temperature: Option<f32>,
    humidity: Option<u8>,
    power: Option<bool>,
    cooling: Option<bool>,
    available: bool,
    #[serde(skip)]
    last_updated: Instant,
}

impl RoomState {
    /// Creates an empty state for a freshly discovered room.
    #[must_use]
    pub fn new(room: RoomId) -> Self {
        Self {
            room,
            target_temperature: None,
            current_temperature: None,
            humidity: None,
            power: None,
            cooling: None,
            available: true,
            last_updated: Instant::now(),
        }
    }

    /// The room this state belongs to.
    #[must_use]
    pub fn room(&self) -> RoomId {
        self.room
    }

    /// The configured setpoint, if reported.
    #[must_use]
    pub fn target_temperature(&self) -> Option<TargetTemperature> {
        self.target_temperature
    }

    /// The measured ambient temperature in °C, if the room has the sensor.
    #[must_use]
    pub fn current_temperature(&self) -> Option<f32> {
        self.current_temperature
    }

    /// The measured relative humidity in percent, if the room has the sensor.
    #[must_use]
    pub fn humidity(&self) -> Option<u8> {
        self.humidity
    }

    /// The combined HVAC mode, once the power state is known.
    ///
    /// A room that is on but has not yet reported an operating mode is
    /// assumed heating, the device's resting mode.
    #[must_use]
    pub fn hvac_mode(&self) -> Option<HvacMode> {
        self.power
            .map(|on| HvacMode::from_device_bits(on, self.cooling.unwrap_or(false)))
    }

    /// Whether the device is still answering polls for this room.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.available
    }

    /// When the device last reported any field for this room.
    #[must_use]
    pub fn last_updated(&self) -> Instant {
        self.last_updated
    }

    /// Merges one reported field into this state.
    ///
    /// Returns `true` if a host-visible value changed. Fields absent from
    /// the update keep their previous value.
    pub(crate) fn apply(&mut self, field: RoomField) -> bool {
        self.last_updated = Instant::now();
        match field {
            RoomField::Power(on) => {
                let prev = self.hvac_mode();
                self.power = Some(on);
                prev != self.hvac_mode()
            }
            RoomField::OperatingMode { cooling } => {
                let prev = self.hvac_mode();
                self.cooling = Some(cooling);
                prev != self.hvac_mode()
            }
            RoomField::Target(target) => {
                let changed = self.target_temperature != Some(target);
                self.target_temperature = Some(target);
                changed
            }
            RoomField::Ambient(celsius) => {
                let changed = self.current_temperature != Some(celsius);
                self.current_temperature = Some(celsius);
                changed
            }
            RoomField::Humidity(percent) => {
                let changed = self.humidity != Some(percent);
                self.humidity = Some(percent);
                changed
            }
        }
    }

    /// Sets availability, returning `true` if it flipped.
    pub(crate) fn set_available(&mut self, available: bool) -> bool {
        let changed = self.available != available;
        self.available = available;
        changed
    }
}
