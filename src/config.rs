// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Client configuration.

use std::time::Duration;

use serde::Serialize;

use crate::connection::ReconnectionPolicy;

/// Configuration for [`crate::TermowifiClient`].
///
/// All durations and counts have defaults that match the controller's
/// observed timing; only the poll interval is commonly tuned.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use termowifi::ClientConfig;
///
/// let config = ClientConfig::new()
///     .with_poll_interval(Duration::from_secs(30))
///     .with_queue_capacity(64);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientConfig {
    /// Interval between poll cycles.
    pub poll_interval: Duration,
    /// Timeout for establishing the TCP connection.
    pub connect_timeout: Duration,
    /// Timeout for a single expected frame read.
    pub read_timeout: Duration,
    /// Timeout for writing a trace.
    pub write_timeout: Duration,
    /// Capacity of the command queue between the facade and the worker.
    pub queue_capacity: usize,
    /// Consecutive unanswered polls before a room is marked unavailable.
    pub max_missed_polls: u32,
    /// How many times each write command is repeated on the wire.
    pub command_repeats: u8,
    /// How many times the discovery request is repeated on the wire.
    pub discovery_repeats: u8,
    /// Reconnection pacing after failures.
    pub reconnection: ReconnectionPolicy,
}

impl ClientConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the interval between poll cycles.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the TCP connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the timeout for reading an expected frame.
    #[must_use]
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Sets the timeout for writing a trace.
    #[must_use]
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Sets the command queue capacity.
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Sets how many consecutive unanswered polls mark a room unavailable.
    #[must_use]
    pub fn with_max_missed_polls(mut self, polls: u32) -> Self {
        self.max_missed_polls = polls;
        self
    }

    /// Sets the reconnection policy.
    #[must_use]
    pub fn with_reconnection(mut self, policy: ReconnectionPolicy) -> Self {
        self.reconnection = policy;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(2),
            write_timeout: Duration::from_secs(2),
            queue_capacity: 32,
            max_missed_polls: 3,
            command_repeats: 2,
            discovery_repeats: 2,
            reconnection: ReconnectionPolicy::default(),
        }
    }
}
