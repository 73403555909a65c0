// SPDX-FileCopyrightText: 2026 Banter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token-bucket throughput cap shared across the worker pool.
//!
//! The bucket holds one second of burst capacity and refills continuously,
//! capping job starts at the configured rate regardless of how many
//! workers are idle.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Shared token bucket; `acquire` suspends until a token is available.
pub struct Throttle {
    state: Mutex<BucketState>,
    capacity: f64,
    refill_per_sec: f64,
}

impl Throttle {
    /// A bucket allowing `rate` acquisitions per second, starting full.
    pub fn per_second(rate: u32) -> Self {
        let capacity = f64::from(rate.max(1));
        Self {
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
            capacity,
            refill_per_sec: capacity,
        }
    }

    /// Take one token, waiting for the refill when the bucket is empty.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                let now = Instant::now();
                let elapsed = now.duration_since(state.last_refill).as_secs_f64();
                state.tokens =
                    (state.tokens + elapsed * self.refill_per_sec).min(self.capacity);
                state.last_refill = now;

                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    return;
                }
                Duration::from_secs_f64((1.0 - state.tokens) / self.refill_per_sec)
            };
            tokio::time::sleep(wait).await;
        }
    }
}
