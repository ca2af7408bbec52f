// SPDX-FileCopyrightText: 2026 Arcane Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed-window request throttling.
//!
//! Counters are keyed by caller identity (user id for commands, peer
//! address for the stream endpoint) and live for the process lifetime
//! only. This is abuse mitigation, not a hard quota: state is per-process
//! and best-effort across multiple instances.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

use arcane_core::ArcaneError;

/// A fixed-window policy: at most `limit` calls per `window`.
#[derive(Debug, Clone, Copy)]
pub struct RatePolicy {
    pub limit: u32,
    pub window: Duration,
}

impl RatePolicy {
    pub const fn per_window(limit: u32, window: Duration) -> Self {
        Self { limit, window }
    }
}

#[derive(Debug)]
struct Window {
    count: u32,
    reset_at: Instant,
}

/// Per-key fixed-window counters.
#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: DashMap<String, Window>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            windows: DashMap::new(),
        }
    }

    /// Permits or rejects a call under `policy`.
    ///
    /// The first call for a key, or the first call after the window's reset
    /// instant, restarts the window with count 1. At or over the limit the
    /// call fails with `ResourceExhausted`; otherwise the counter increments.
    pub fn check(&self, key: &str, policy: RatePolicy) -> Result<(), ArcaneError> {
        let now = Instant::now();
        let mut entry = self
            .windows
            .entry(key.to_string())
            .or_insert_with(|| Window {
                count: 0,
                reset_at: now,
            });

        if entry.count == 0 || entry.reset_at <= now {
            entry.count = 1;
            entry.reset_at = now + policy.window;
            return Ok(());
        }
        if entry.count >= policy.limit {
            tracing::debug!(key, "rate limit exceeded");
            return Err(ArcaneError::ResourceExhausted);
        }
        entry.count += 1;
        Ok(())
    }
}
