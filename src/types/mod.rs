// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core value types for the Termowifi protocol.

mod hvac_mode;
mod room_id;
mod target_temperature;

pub use hvac_mode::HvacMode;
pub use room_id::RoomId;
pub use target_temperature::TargetTemperature;
