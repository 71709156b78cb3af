// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Exponential backoff for watch re-subscription.
//!
//! A watch that ends (server timeout, dropped connection, API error) is
//! reopened forever, but never in a tight loop: consecutive failures wait
//! progressively longer, capped at [`WATCH_BACKOFF_MAX_SECS`], and a
//! subscription that made progress resets the delay.

use crate::constants::{
    WATCH_BACKOFF_INITIAL_MILLIS, WATCH_BACKOFF_MAX_SECS, WATCH_BACKOFF_MULTIPLIER,
    WATCH_BACKOFF_RANDOMIZATION_FACTOR,
};
use rand::Rng;
use std::time::Duration;

/// Delay schedule between watch subscriptions.
///
/// Each call to [`next_backoff`](Self::next_backoff) returns the current
/// delay with jitter applied, then grows it by `multiplier` up to
/// `max_interval`. There is no give-up point; the watch is reopened for
/// as long as the process runs.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    /// Un-jittered delay returned next
    pub current_interval: Duration,
    /// Delay after a [`reset`](Self::reset)
    pub initial_interval: Duration,
    /// Upper bound of the un-jittered delay
    pub max_interval: Duration,
    /// Growth factor applied after every delay
    pub multiplier: f64,
    /// Jitter as a fraction of the delay, in both directions
    pub randomization_factor: f64,
}

impl ExponentialBackoff {
    #[must_use]
    pub fn new(
        initial_interval: Duration,
        max_interval: Duration,
        multiplier: f64,
        randomization_factor: f64,
    ) -> Self {
        Self {
            current_interval: initial_interval,
            initial_interval,
            max_interval,
            multiplier,
            randomization_factor,
        }
    }

    /// Delay to wait before the next subscription.
    pub fn next_backoff(&mut self) -> Duration {
        let delay = self.jittered(self.current_interval);
        self.current_interval = self
            .current_interval
            .mul_f64(self.multiplier)
            .min(self.max_interval);
        delay
    }

    /// Called once a subscription delivered events.
    pub fn reset(&mut self) {
        self.current_interval = self.initial_interval;
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if self.randomization_factor <= 0.0 {
            return delay;
        }

        let spread = delay.as_secs_f64() * self.randomization_factor;
        let offset = rand::rng().random_range(-spread..=spread);

        Duration::from_secs_f64((delay.as_secs_f64() + offset).max(0.0))
    }
}

/// Backoff used between watch subscriptions.
///
/// # Configuration
///
/// - **Initial interval**: 100ms
/// - **Max interval**: 30 seconds
/// - **Max elapsed time**: none
/// - **Multiplier**: 2.0
/// - **Randomization**: ±10%, so both watchers do not reconnect in lockstep
#[must_use]
pub fn watch_backoff() -> ExponentialBackoff {
    ExponentialBackoff::new(
        Duration::from_millis(WATCH_BACKOFF_INITIAL_MILLIS),
        Duration::from_secs(WATCH_BACKOFF_MAX_SECS),
        WATCH_BACKOFF_MULTIPLIER,
        WATCH_BACKOFF_RANDOMIZATION_FACTOR,
    )
}
