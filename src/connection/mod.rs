// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! TCP transport to the thermostat controller.
//!
//! [`DeviceConnection`] wraps a [`TcpStream`] with the timeouts and the
//! fixed-size frame reads the controller protocol needs. Connection state
//! tracking and reconnection pacing live in [`ConnectionState`] and
//! [`ReconnectionPolicy`]; the worker task drives both.

mod policy;

use std::time::Duration;

use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::codec::FRAME_LEN;
use crate::error::ConnectionError;

pub use policy::{Backoff, ReconnectionPolicy};

/// Network address of a thermostat controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceAddress {
    /// Hostname or IP address.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl DeviceAddress {
    /// Creates an address from a host and port.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl std::fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Connection state of the client.
///
/// Published through [`crate::TermowifiClient::watch_connection`] and via
/// [`crate::ClientEvent::ConnectionChanged`] events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ConnectionState {
    /// Not connected and not trying to connect.
    Disconnected,
    /// A connection attempt is in progress.
    Connecting,
    /// Connected and polling.
    Connected,
    /// The last attempt or session failed; a reconnect is pending.
    Failed(String),
}

impl ConnectionState {
    /// Returns `true` if the client is currently connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Millisecond count for timeout diagnostics.
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// An established TCP session with the controller.
///
/// All operations carry a bounded timeout so the worker's select loop can
/// never be wedged by a silent peer. Any error invalidates the session;
/// the worker drops it and reconnects.
#[derive(Debug)]
pub struct DeviceConnection {
    stream: TcpStream,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl DeviceConnection {
    /// Opens a TCP connection to `address`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::ConnectTimeout`] if the connection is not
    /// established within `connect_timeout`, or [`ConnectionError::Io`] for
    /// refused or unroutable addresses.
    pub async fn connect(
        address: &DeviceAddress,
        connect_timeout: Duration,
        read_timeout: Duration,
        write_timeout: Duration,
    ) -> Result<Self, ConnectionError> {
        let target = address.to_string();
        let stream = timeout(connect_timeout, TcpStream::connect(&target))
            .await
            .map_err(|_| ConnectionError::ConnectTimeout(millis(connect_timeout)))??;
        stream.set_nodelay(true)?;
        debug!(address = %target, "connected to controller");
        Ok(Self {
            stream,
            read_timeout,
            write_timeout,
        })
    }

    /// Writes a complete trace to the controller.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::WriteTimeout`] if the peer does not accept
    /// the bytes in time, or [`ConnectionError::Io`] on a broken socket.
    pub async fn send(&mut self, trace: &[u8]) -> Result<(), ConnectionError> {
        trace!(bytes = ?trace, "sending trace");
        timeout(self.write_timeout, self.stream.write_all(trace))
            .await
            .map_err(|_| ConnectionError::WriteTimeout(millis(self.write_timeout)))??;
        Ok(())
    }

    /// Reads exactly one wire frame.
    ///
    /// Built from single cancel-safe reads against a deadline, so a frame
    /// arriving in slow pieces within the window is still assembled.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::ReadTimeout`] if a full frame does not
    /// arrive in time, [`ConnectionError::Closed`] on EOF, or
    /// [`ConnectionError::Io`] on a broken socket.
    pub async fn read_frame(&mut self) -> Result<[u8; FRAME_LEN], ConnectionError> {
        let deadline = tokio::time::Instant::now() + self.read_timeout;
        let mut frame = [0u8; FRAME_LEN];
        let mut filled = 0;
        while filled < FRAME_LEN {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return Err(ConnectionError::ReadTimeout(millis(self.read_timeout)));
            }
            match timeout(remaining, self.stream.read(&mut frame[filled..])).await {
                Ok(Ok(0)) => return Err(ConnectionError::Closed),
                Ok(Ok(n)) => filled += n,
                Ok(Err(err)) => return Err(ConnectionError::Io(err)),
                Err(_) => return Err(ConnectionError::ReadTimeout(millis(self.read_timeout))),
            }
        }
        trace!(bytes = ?frame, "received frame");
        Ok(frame)
    }

    /// Reads whatever bytes the controller has queued.
    ///
    /// Returns `Ok(None)` when nothing arrives within `wait`. A single
    /// `read` is used, so the result may hold a partial frame or several
    /// frames at once; framing is the caller's concern. The read is
    /// cancellation safe: a fired timeout never consumes bytes, so a
    /// partial frame in flight survives for the next call.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::Closed`] on EOF, or [`ConnectionError::Io`]
    /// on a broken socket.
    pub async fn read_available(
        &mut self,
        wait: Duration,
    ) -> Result<Option<Vec<u8>>, ConnectionError> {
        let mut buf = [0u8; 8 * FRAME_LEN];
        match timeout(wait, self.stream.read(&mut buf)).await {
            Ok(Ok(0)) => Err(ConnectionError::Closed),
            Ok(Ok(n)) => {
                trace!(bytes = ?&buf[..n], "received bytes");
                Ok(Some(buf[..n].to_vec()))
            }
            Ok(Err(err)) => Err(ConnectionError::Io(err)),
            Err(_) => Ok(None),
        }
    }

    /// Shuts down the write half, signalling the controller that the
    /// session is over. Errors are ignored; the socket is being torn
    /// down either way.
    pub async fn close(mut self) {
        let _ = self.stream.shutdown().await;
    }
}
