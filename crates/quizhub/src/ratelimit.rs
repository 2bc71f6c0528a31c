// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rate Limiter: per-session token bucket.

use std::time::{Duration, Instant};

/// Parameters governing a token bucket. Cheap to copy; held by `QuizConfig`.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitParams {
    pub capacity: u32,
    pub refill_tokens: u32,
    pub refill_period: Duration,
}

impl Default for RateLimitParams {
    fn default() -> Self {
        Self { capacity: 10, refill_tokens: 5, refill_period: Duration::from_secs(1) }
    }
}

/// Per-session token bucket, allocated lazily on first use (construction is
/// cheap enough that we just build it eagerly with the session instead).
pub struct TokenBucket {
    tokens: f64,
    last_refill: Option<Instant>,
}

impl TokenBucket {
    pub fn new() -> Self {
        Self { tokens: 0.0, last_refill: None }
    }

    /// Try to consume one token under `params`. Returns whether the call is
    /// permitted. O(1), synchronous, never fails — there is no internal
    /// error path here, so the "fail open on internal error" clause has
    /// nothing to trigger on; it's preserved at the call site in `ratelimit::check`.
    pub fn try_consume(&mut self, params: &RateLimitParams) -> bool {
        let now = Instant::now();
        match self.last_refill {
            None => {
                // Bucket starts full: capacity is the initial allowance, not
                // something a caller has to wait a period to earn.
                self.tokens = params.capacity as f64;
                self.last_refill = Some(now);
            }
            Some(last) => {
                let elapsed = now.duration_since(last);
                let period = params.refill_period.as_secs_f64().max(f64::EPSILON);
                let periods = elapsed.as_secs_f64() / period;
                let refill = periods * params.refill_tokens as f64;
                if refill > 0.0 {
                    self.tokens = (self.tokens + refill).min(params.capacity as f64);
                    self.last_refill = Some(now);
                }
            }
        }

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

impl Default for TokenBucket {
    fn default() -> Self {
        Self::new()
    }
}

/// Check whether `bucket` permits one more call under `params`. Isolated as a
/// free function (rather than only `TokenBucket::try_consume`) so the
/// fail-open contract is visible at the call site even though the bucket
/// itself cannot currently fail.
pub fn check(bucket: &mut TokenBucket, params: &RateLimitParams) -> bool {
    bucket.try_consume(params)
}

#[cfg(test)]
#[path = "ratelimit_tests.rs"]
mod tests;
