// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the Termowifi client.
//!
//! This module provides the error hierarchy for failures across the library:
//! value validation, TCP connection handling, wire-frame parsing, and command
//! submission.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error occurred on the TCP connection to the device.
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// Error occurred while parsing a device frame.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Error occurred while submitting a command.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// The room id has not been discovered on the device.
    #[error("room {0} not found")]
    RoomNotFound(u8),

    /// The client has not been started.
    #[error("client is not started")]
    NotStarted,
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValueError {
    /// A target temperature is outside the device-supported range.
    #[error("target temperature {actual} °C is out of range [{min}, {max}]")]
    TemperatureOutOfRange {
        /// Minimum supported temperature in °C.
        min: f32,
        /// Maximum supported temperature in °C.
        max: f32,
        /// The temperature that was provided.
        actual: f32,
    },

    /// A target temperature is not a multiple of the device step (0.5 °C).
    #[error("target temperature {0} °C is not on the 0.5 °C grid")]
    TemperatureOffGrid(f32),

    /// A room id is outside the range the device can address.
    #[error("room id {actual} is out of range [0, {max}]")]
    RoomIdOutOfRange {
        /// Maximum addressable room id.
        max: u8,
        /// The id that was provided.
        actual: u8,
    },
}

/// Errors related to the TCP connection.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Socket-level I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Connecting to the device timed out.
    #[error("connect timed out after {0} ms")]
    ConnectTimeout(u64),

    /// A read from the device timed out.
    #[error("read timed out after {0} ms")]
    ReadTimeout(u64),

    /// A write to the device timed out.
    #[error("write timed out after {0} ms")]
    WriteTimeout(u64),

    /// The device closed the connection.
    #[error("connection closed by the device")]
    Closed,

    /// Invalid host or port.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// Errors related to parsing device frames.
///
/// All variants carry the raw offending bytes so a desynced stream can be
/// diagnosed from the logs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The frame header matched none of the known trace headers.
    #[error("unknown frame header: {}", format_frame(.0))]
    UnknownHeader(Vec<u8>),

    /// The frame checksum did not match the computed value.
    #[error("invalid checksum: {}", format_frame(.0))]
    InvalidChecksum(Vec<u8>),

    /// The command id matched no known room field or discovery answer.
    #[error("unrecognized command id: {}", format_frame(.0))]
    UnrecognizedCommand(Vec<u8>),
}

/// Errors related to command submission.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The command queue is full; the command was rejected, not dropped.
    #[error("command queue is full (capacity {0})")]
    QueueFull(usize),

    /// The worker task has stopped; no commands can be delivered.
    #[error("worker has stopped")]
    WorkerStopped,
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

/// Formats raw frame bytes as space-separated uppercase hex for diagnostics.
fn format_frame(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}
