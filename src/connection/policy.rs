// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reconnection pacing for the worker task.

use std::time::{Duration, Instant};

use serde::Serialize;

/// Policy for reconnecting after connection failures.
///
/// The worker retries indefinitely by default; the thermostat controller is
/// expected to drop off the network during power cycles and come back on
/// its own schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconnectionPolicy {
    /// Initial delay between retry attempts.
    pub initial_delay: Duration,
    /// Maximum delay between retry attempts (for exponential backoff).
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f32,
    /// How long a session must stay healthy before the backoff resets.
    pub stability_window: Duration,
}

impl ReconnectionPolicy {
    /// Creates a new reconnection policy with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial delay between retry attempts.
    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay between retry attempts.
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier.
    #[must_use]
    pub fn with_backoff_multiplier(mut self, multiplier: f32) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Calculates the delay before the given retry attempt (0-based).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return self.initial_delay;
        }

        let multiplier = self
            .backoff_multiplier
            .powi(i32::try_from(attempt).unwrap_or(i32::MAX));

        // Safe: initial_delay is typically seconds/minutes, not near u128 max
        #[allow(clippy::cast_precision_loss)]
        let delay_ms = self.initial_delay.as_millis() as f32 * multiplier;

        // Safe: delay_ms is always positive (from Duration) and within practical bounds
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let delay = Duration::from_millis(delay_ms as u64);

        delay.min(self.max_delay)
    }
}

impl Default for ReconnectionPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
            stability_window: Duration::from_secs(10),
        }
    }
}

/// Tracks consecutive connection failures across the worker's lifetime.
///
/// The attempt counter only resets once a session has survived for the
/// policy's stability window, so a controller that accepts connections and
/// immediately drops them still backs off.
#[derive(Debug)]
pub struct Backoff {
    policy: ReconnectionPolicy,
    attempt: u32,
    connected_at: Option<Instant>,
}

impl Backoff {
    /// Creates a tracker for the given policy.
    #[must_use]
    pub fn new(policy: ReconnectionPolicy) -> Self {
        Self {
            policy,
            attempt: 0,
            connected_at: None,
        }
    }

    /// Returns the delay to sleep before the next connection attempt.
    #[must_use]
    pub fn next_delay(&self) -> Duration {
        self.policy.delay_for_attempt(self.attempt)
    }

    /// Records a failed attempt or a dropped session.
    pub fn record_failure(&mut self) {
        if let Some(connected_at) = self.connected_at.take() {
            if connected_at.elapsed() >= self.policy.stability_window {
                self.attempt = 0;
            }
        }
        self.attempt = self.attempt.saturating_add(1);
    }

    /// Records a successful connection. The attempt counter resets once the
    /// session outlives the stability window.
    pub fn record_connected(&mut self) {
        self.connected_at = Some(Instant::now());
    }

    /// Returns the number of consecutive failures.
    #[must_use]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}
