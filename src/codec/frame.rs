// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inbound frame model and resumable decoding.
//!
//! Frames are self-delimited by their fixed 7-byte length, so resumable
//! parsing reduces to buffering: the [`FrameDecoder`] accumulates raw bytes
//! from the socket and yields complete frames regardless of how TCP reads
//! split them. Fewer than seven buffered bytes means "need more", and the
//! buffer is left untouched.

use crate::error::ParseError;
use crate::types::{RoomId, TargetTemperature};

use super::values::{ambient_from_value, humidity_from_value, target_from_value};
use super::TraceHeader;

/// Length of every Termowifi frame in bytes.
pub const FRAME_LEN: usize = 7;

/// One decoded state field of a room.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoomField {
    /// Power switch state (on/off).
    Power(bool),
    /// Operating mode; `cooling` is false for heat.
    OperatingMode {
        /// Whether the zone is in cooling mode.
        cooling: bool,
    },
    /// Configured target temperature.
    Target(TargetTemperature),
    /// Measured ambient temperature in °C.
    Ambient(f32),
    /// Measured relative humidity in percent.
    Humidity(u8),
}

/// One complete, decoded device frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Frame {
    /// A state field reported for a room (answer or confirmation).
    Answer {
        /// The room the field belongs to.
        room: RoomId,
        /// The decoded field.
        field: RoomField,
    },
    /// A discovery answer announcing that a room exists.
    RoomDiscovered {
        /// The announced room.
        room: RoomId,
    },
    /// An acknowledgement carrying no state: either an echo of a command
    /// the host sent, or a zero-data confirmation of a write.
    Ack {
        /// Acknowledged command id.
        cid: u8,
        /// Acknowledged data byte.
        data: u8,
    },
}

/// Decodes a single complete frame.
///
/// # Errors
///
/// Returns a [`ParseError`] carrying the raw bytes when the header is
/// unknown, the checksum does not verify, or the command id maps to no
/// known room field.
pub fn decode_frame(bytes: &[u8; FRAME_LEN]) -> Result<Frame, ParseError> {
    let Some(header) = TraceHeader::from_bytes(bytes) else {
        return Err(ParseError::UnknownHeader(bytes.to_vec()));
    };

    let cid = bytes[4];
    let data = bytes[5];
    let checksum = bytes[6];

    // Echoed commands are acknowledgements; the device repeats our own
    // trace verbatim, so there is nothing further to verify.
    if header == TraceHeader::SendCommand {
        return Ok(Frame::Ack { cid, data });
    }

    let expected = cid.wrapping_add(data).wrapping_add(header.checksum_diff());
    if checksum != expected {
        return Err(ParseError::InvalidChecksum(bytes.to_vec()));
    }

    decode_payload(cid, data).ok_or_else(|| ParseError::UnrecognizedCommand(bytes.to_vec()))
}

/// Maps a verified (cid, data) pair to its typed frame, if any.
fn decode_payload(cid: u8, data: u8) -> Option<Frame> {
    // Discovery answers: cid 0x32..=0x36, data must be zero.
    if (0x32..=0x36).contains(&cid) {
        if data != 0x00 {
            return None;
        }
        let room = RoomId::new(cid - 0x32).ok()?;
        return Some(Frame::RoomDiscovered { room });
    }

    // A zero data byte outside discovery carries no state; the controller
    // confirms power and mode writes this way. On the setpoint slot it
    // must not be read as a temperature.
    if data == 0x00 {
        return Some(Frame::Ack { cid, data });
    }

    // Humidity answers: cid = room + 0x64.
    if (0x64..=0x64 + RoomId::MAX).contains(&cid) {
        let room = RoomId::new(cid - 0x64).ok()?;
        return Some(Frame::Answer {
            room,
            field: RoomField::Humidity(humidity_from_value(data)),
        });
    }

    // Room field answers: cid = room * 4 + slot.
    let room = RoomId::new(cid / 4).ok()?;
    let field = match (cid % 4, data) {
        (0, 0x03) => RoomField::Power(true),
        (0, 0x02) => RoomField::Power(false),
        (1, 0x02) => RoomField::OperatingMode { cooling: false },
        (1, 0x03) => RoomField::OperatingMode { cooling: true },
        (2, value) => RoomField::Target(TargetTemperature::clamped(target_from_value(value))),
        (3, value) => RoomField::Ambient(ambient_from_value(value)),
        _ => return None,
    };
    Some(Frame::Answer { room, field })
}

/// Accumulating decoder for a raw TCP byte stream.
///
/// # Examples
///
/// ```
/// use termowifi::codec::{Frame, FrameDecoder};
///
/// let mut decoder = FrameDecoder::new();
/// // A frame split across two reads decodes once complete.
/// decoder.push(&[0x3B, 0x01, 0x01]);
/// assert!(decoder.next_frame().is_none());
/// decoder.push(&[0x04, 0x06, 0x2B, 0x37]);
/// let frame = decoder.next_frame().unwrap().unwrap();
/// assert!(matches!(frame, Frame::Answer { .. }));
/// ```
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

impl FrameDecoder {
    /// Creates an empty decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends raw bytes read from the socket.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Attempts to decode the next buffered frame.
    ///
    /// Returns `None` while fewer than [`FRAME_LEN`] bytes are buffered
    /// (the partial tail is kept for the next read). A complete frame is
    /// always consumed, decodable or not; on error the raw bytes travel
    /// with the [`ParseError`].
    pub fn next_frame(&mut self) -> Option<Result<Frame, ParseError>> {
        if self.buffer.len() < FRAME_LEN {
            return None;
        }
        let mut raw = [0u8; FRAME_LEN];
        raw.copy_from_slice(&self.buffer[..FRAME_LEN]);
        self.buffer.drain(..FRAME_LEN);
        Some(decode_frame(&raw))
    }

    /// Number of bytes currently buffered.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Discards any buffered bytes.
    ///
    /// Used when the connection is torn down; a new connection starts
    /// from a clean frame boundary.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
