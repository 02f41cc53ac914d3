// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Throttling for log lines on paths that can fire once per sample.

use std::{
    sync::{
        OnceLock,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

/// A window of whole seconds in which at most one caller is let through.
///
/// Usually declared as a `static` by [`rate_limited!`](crate::rate_limited), one per call site.
#[derive(Debug)]
pub struct RateLimiter {
    // second, relative to the process epoch, from which the next caller is let through
    open_at: AtomicU64,
}

impl RateLimiter {
    pub const fn new() -> Self {
        Self {
            open_at: AtomicU64::new(0),
        }
    }

    /// Whether the caller may proceed now. Sub-second intervals count as one second.
    pub fn ready(&self, interval: Duration) -> bool {
        self.ready_at(uptime_secs(), interval)
    }

    fn ready_at(&self, now_secs: u64, interval: Duration) -> bool {
        let open_at = self.open_at.load(Ordering::Relaxed);
        if now_secs < open_at {
            return false;
        }
        let next = now_secs.saturating_add(interval.as_secs().max(1));
        // one winner per window when several threads race
        self.open_at
            .compare_exchange(open_at, next, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

fn uptime_secs() -> u64 {
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    EPOCH.get_or_init(Instant::now).elapsed().as_secs()
}

/// `rate_limited!(interval, expr)` evaluates `expr` at most once per `interval`, across all
/// threads. Each call site is limited on its own.
///
/// ```
/// use std::time::Duration;
///
/// let mut logged = 0;
/// for _ in 0..100 {
///     harvest_core::rate_limited!(Duration::from_secs(60), logged += 1);
/// }
/// assert_eq!(logged, 1);
/// ```
#[macro_export]
macro_rules! rate_limited {
    ($interval:expr, $call:expr) => {{
        static LIMITER: $crate::rate_limit::RateLimiter = $crate::rate_limit::RateLimiter::new();
        if LIMITER.ready($interval) {
            $call;
        }
    }};
}
