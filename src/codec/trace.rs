// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Outbound command trace construction.
//!
//! Every host-to-device message is a 7-byte trace under the
//! [`TraceHeader::SendCommand`] header. Each room owns four command slots
//! (`room * 4 + n`): power switch, operating mode, setpoint, and info
//! request; discovery uses the fixed id `0x23`.

use crate::types::{HvacMode, RoomId, TargetTemperature};

use super::values::value_from_target;
use super::{FRAME_LEN, TraceHeader};

/// Command id of the room-discovery request.
const DISCOVERY_COMMAND: u8 = 0x23;

/// Fixed term added into every outbound checksum.
const CHECKSUM_BASE: u8 = 0x03;

/// Builds a 7-byte outbound trace for a command id and data byte.
fn build(cid: u8, data: u8) -> [u8; FRAME_LEN] {
    let header = TraceHeader::SendCommand.bytes();
    let checksum = cid.wrapping_add(data).wrapping_add(CHECKSUM_BASE);
    [
        header[0], header[1], header[2], header[3], cid, data, checksum,
    ]
}

/// Builds the room-discovery trace (`3B 01 FE 04 23 00 26`).
#[must_use]
pub fn discovery_trace() -> [u8; FRAME_LEN] {
    build(DISCOVERY_COMMAND, 0x00)
}

/// Builder for the command traces of a single room.
///
/// # Examples
///
/// ```
/// use termowifi::codec::TraceBuilder;
/// use termowifi::types::{RoomId, TargetTemperature};
///
/// let traces = TraceBuilder::new(RoomId::new(1).unwrap());
/// let trace = traces.set_target(TargetTemperature::new(21.5).unwrap());
/// assert_eq!(trace, [0x3B, 0x01, 0xFE, 0x04, 0x06, 0x2B, 0x34]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TraceBuilder {
    room: RoomId,
}

impl TraceBuilder {
    /// Creates a trace builder for the given room.
    #[must_use]
    pub fn new(room: RoomId) -> Self {
        Self { room }
    }

    /// Trace switching the room on or off.
    #[must_use]
    pub fn switch(&self, on: bool) -> [u8; FRAME_LEN] {
        let data = if on { 0x03 } else { 0x02 };
        build(self.room.command_base(), data)
    }

    /// Trace selecting the heating or cooling operating mode.
    ///
    /// `Off` is not an operating mode on the wire; callers express it with
    /// [`switch`](Self::switch). Passing `Off` here selects heat, the
    /// device's resting mode.
    #[must_use]
    pub fn operating_mode(&self, mode: HvacMode) -> [u8; FRAME_LEN] {
        let data = match mode {
            HvacMode::Cool => 0x03,
            HvacMode::Heat | HvacMode::Off => 0x02,
        };
        build(self.room.command_base() + 1, data)
    }

    /// Trace changing the room's target temperature.
    #[must_use]
    pub fn set_target(&self, target: TargetTemperature) -> [u8; FRAME_LEN] {
        build(self.room.command_base() + 2, value_from_target(target.celsius()))
    }

    /// Trace requesting a full state refresh for the room.
    #[must_use]
    pub fn info(&self) -> [u8; FRAME_LEN] {
        build(self.room.command_base() + 3, 0x00)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(id: u8) -> RoomId {
        RoomId::new(id).unwrap()
    }

    #[test]
    fn discovery_trace_matches_capture() {
        // Observed on the wire: 3B 01 FE 04 23 00 26
        assert_eq!(
            discovery_trace(),
            [0x3B, 0x01, 0xFE, 0x04, 0x23, 0x00, 0x26]
        );
    }

    #[test]
    fn switch_traces() {
        let traces = TraceBuilder::new(room(0));
        assert_eq!(traces.switch(true), [0x3B, 0x01, 0xFE, 0x04, 0x00, 0x03, 0x06]);
        assert_eq!(traces.switch(false), [0x3B, 0x01, 0xFE, 0x04, 0x00, 0x02, 0x05]);
    }

    #[test]
    fn operating_mode_traces() {
        let traces = TraceBuilder::new(room(1));
        assert_eq!(
            traces.operating_mode(HvacMode::Heat),
            [0x3B, 0x01, 0xFE, 0x04, 0x05, 0x02, 0x0A]
        );
        assert_eq!(
            traces.operating_mode(HvacMode::Cool),
            [0x3B, 0x01, 0xFE, 0x04, 0x05, 0x03, 0x0B]
        );
    }

    #[test]
    fn set_target_trace() {
        // 21.5 °C is wire value 43 (0x2B); cid 6, checksum (6+43+3) = 0x34
        let traces = TraceBuilder::new(room(1));
        let target = TargetTemperature::new(21.5).unwrap();
        assert_eq!(
            traces.set_target(target),
            [0x3B, 0x01, 0xFE, 0x04, 0x06, 0x2B, 0x34]
        );
    }

    #[test]
    fn info_trace_per_room() {
        assert_eq!(
            TraceBuilder::new(room(0)).info(),
            [0x3B, 0x01, 0xFE, 0x04, 0x03, 0x00, 0x06]
        );
        assert_eq!(
            TraceBuilder::new(room(4)).info(),
            [0x3B, 0x01, 0xFE, 0x04, 0x13, 0x00, 0x16]
        );
    }

    #[test]
    fn checksum_wraps_modulo_256() {
        // Room 4 target 35.0 °C: cid 0x12, data 0x46, checksum 0x5B
        let traces = TraceBuilder::new(room(4));
        let target = TargetTemperature::new(35.0).unwrap();
        let trace = traces.set_target(target);
        assert_eq!(trace[4], 0x12);
        assert_eq!(trace[5], 0x46);
        assert_eq!(trace[6], 0x5B);
    }
}
