// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wire codec for the Termowifi 7-byte frame protocol.
//!
//! The device speaks fixed-size frames: a 4-byte header identifying the
//! trace kind, a command id, a data byte, and a modular checksum. This
//! module is pure encoding/decoding with no I/O, so it can be validated
//! against captured device traffic in isolation.

mod frame;
mod trace;
pub mod values;

pub use frame::{Frame, FrameDecoder, RoomField, FRAME_LEN};
pub use trace::{discovery_trace, TraceBuilder};

/// The three 4-byte headers the device uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceHeader {
    /// Host-to-device command (also seen echoed back as an ack).
    SendCommand,
    /// Device answer to an info/discovery request.
    ValidAnswer,
    /// Device confirmation of an accepted command.
    ValidConfirmation,
}

impl TraceHeader {
    /// Raw header bytes.
    #[must_use]
    pub const fn bytes(self) -> [u8; 4] {
        match self {
            Self::SendCommand => [0x3B, 0x01, 0xFE, 0x04],
            Self::ValidAnswer => [0x3B, 0x01, 0x01, 0x04],
            Self::ValidConfirmation => [0x3B, 0xFE, 0x01, 0x01],
        }
    }

    /// Matches the first four bytes of a frame against the known headers.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        [Self::SendCommand, Self::ValidAnswer, Self::ValidConfirmation]
            .into_iter()
            .find(|h| bytes.starts_with(&h.bytes()))
    }

    /// Checksum offset applied to inbound frames with this header.
    ///
    /// Answers use `0x06`, confirmations `0x00`.
    #[must_use]
    pub(crate) const fn checksum_diff(self) -> u8 {
        match self {
            Self::ValidConfirmation => 0x00,
            Self::SendCommand | Self::ValidAnswer => 0x06,
        }
    }
}
