// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resilience Gate: circuit breaker, health prober, and fallback mirror
//! wired in front of the shared `LeaderboardBackend`.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::store::mirror::FallbackMirror;
use crate::store::{InitOutcome, LeaderboardBackend, LeaderboardEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, Copy)]
pub struct BreakerParams {
    pub window_size: usize,
    pub min_calls: usize,
    pub failure_rate_threshold: f64,
    pub open_duration: Duration,
    pub half_open_probes: u32,
}

impl Default for BreakerParams {
    fn default() -> Self {
        Self {
            window_size: 10,
            min_calls: 5,
            failure_rate_threshold: 0.5,
            open_duration: Duration::from_secs(30),
            half_open_probes: 3,
        }
    }
}

struct Inner {
    state: BreakerState,
    window: VecDeque<bool>,
    opened_at: Option<Instant>,
    half_open_probes_remaining: u32,
    half_open_successes: u32,
}

/// Three-state breaker guarding calls to the shared datastore. Lock-free in
/// the sense that it is the only thing that locks: a single `Mutex<Inner>`
/// held only across the O(1) state transition, never across a backend call.
pub struct CircuitBreaker {
    inner: Mutex<Inner>,
    params: BreakerParams,
}

impl CircuitBreaker {
    pub fn new(params: BreakerParams) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: BreakerState::Closed,
                window: VecDeque::with_capacity(params.window_size),
                opened_at: None,
                half_open_probes_remaining: 0,
                half_open_successes: 0,
            }),
            params,
        }
    }

    pub fn state(&self) -> BreakerState {
        self.inner.lock().state
    }

    /// Whether this call should be attempted against the backend. `Open`
    /// transitions itself to `HalfOpen` once the cooldown has elapsed.
    pub fn should_call_backend(&self) -> bool {
        let mut inner = self.inner.lock();
        match inner.state {
            BreakerState::Closed => true,
            BreakerState::Open => {
                let elapsed = inner.opened_at.map(|t| t.elapsed()).unwrap_or_default();
                if elapsed >= self.params.open_duration {
                    inner.state = BreakerState::HalfOpen;
                    inner.half_open_probes_remaining = self.params.half_open_probes;
                    inner.half_open_successes = 0;
                    inner.half_open_probes_remaining -= 1;
                    true
                } else {
                    false
                }
            }
            BreakerState::HalfOpen => {
                if inner.half_open_probes_remaining > 0 {
                    inner.half_open_probes_remaining -= 1;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Record the outcome of a call that `should_call_backend` permitted.
    pub fn record_outcome(&self, success: bool) {
        let mut inner = self.inner.lock();
        match inner.state {
            BreakerState::Closed => {
                inner.window.push_back(success);
                if inner.window.len() > self.params.window_size {
                    inner.window.pop_front();
                }
                if inner.window.len() >= self.params.min_calls {
                    let failures = inner.window.iter().filter(|ok| !**ok).count();
                    let rate = failures as f64 / inner.window.len() as f64;
                    if rate >= self.params.failure_rate_threshold {
                        self.trip_open(&mut inner);
                    }
                }
            }
            BreakerState::HalfOpen => {
                if success {
                    inner.half_open_successes += 1;
                    if inner.half_open_successes >= self.params.half_open_probes {
                        inner.state = BreakerState::Closed;
                        inner.window.clear();
                        inner.opened_at = None;
                    }
                } else {
                    self.trip_open(&mut inner);
                }
            }
            BreakerState::Open => {
                // A stray outcome (e.g. from the health prober) while open;
                // nothing to do, the window was already cleared on trip.
            }
        }
    }

    fn trip_open(&self, inner: &mut Inner) {
        inner.state = BreakerState::Open;
        inner.opened_at = Some(Instant::now());
        inner.window.clear();
        inner.half_open_successes = 0;
        inner.half_open_probes_remaining = 0;
    }

    /// Force an early `Open` → `HalfOpen` transition, driven by the health
    /// prober observing sustained backend liveness. A no-op unless currently
    /// `Open`.
    pub fn force_half_open(&self) {
        let mut inner = self.inner.lock();
        if inner.state == BreakerState::Open {
            inner.state = BreakerState::HalfOpen;
            inner.half_open_probes_remaining = self.params.half_open_probes;
            inner.half_open_successes = 0;
        }
    }
}

/// Consecutive successful prober pings, while `Open`, before forcing an
/// early `HalfOpen` transition.
const PROBE_SUSTAINED_SUCCESSES: u32 = 2;

/// Spawn the independent liveness prober. Runs on `health_check_interval`
/// regardless of breaker state; only acts when the breaker is `Open`.
pub fn spawn_health_prober<B: LeaderboardBackend + ?Sized + 'static>(
    backend: Arc<B>,
    breaker: Arc<CircuitBreaker>,
    interval: Duration,
    shutdown: CancellationToken,
) {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let consecutive_successes = AtomicU32::new(0);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = timer.tick() => {}
            }

            if breaker.state() != BreakerState::Open {
                consecutive_successes.store(0, Ordering::Relaxed);
                continue;
            }

            match backend.health_check().await {
                Ok(()) => {
                    let count = consecutive_successes.fetch_add(1, Ordering::Relaxed) + 1;
                    if count >= PROBE_SUSTAINED_SUCCESSES {
                        tracing::info!("health prober observed sustained backend recovery, forcing half-open");
                        breaker.force_half_open();
                        consecutive_successes.store(0, Ordering::Relaxed);
                    }
                }
                Err(e) => {
                    consecutive_successes.store(0, Ordering::Relaxed);
                    tracing::debug!(err = %e, "health prober ping failed");
                }
            }
        }
    });
}

/// Wraps a shared `LeaderboardBackend` with the breaker and the fallback
/// mirror. Every trait method follows the same shape: ask the breaker
/// whether to try the backend, time-box the attempt, record the outcome,
/// and fall back to the mirror on denial, error, or timeout.
pub struct ResilienceGate<B: LeaderboardBackend> {
    backend: Arc<B>,
    mirror: Arc<FallbackMirror>,
    breaker: Arc<CircuitBreaker>,
    call_timeout: Duration,
}

impl<B: LeaderboardBackend> ResilienceGate<B> {
    pub fn new(backend: Arc<B>, mirror: Arc<FallbackMirror>, breaker: Arc<CircuitBreaker>) -> Self {
        Self { backend, mirror, breaker, call_timeout: Duration::from_secs(2) }
    }

    pub fn breaker(&self) -> Arc<CircuitBreaker> {
        Arc::clone(&self.breaker)
    }

    pub fn backend(&self) -> Arc<B> {
        Arc::clone(&self.backend)
    }
}

#[async_trait]
impl<B: LeaderboardBackend> LeaderboardBackend for ResilienceGate<B> {
    async fn initialize(&self, quiz: &str, user: &str) -> anyhow::Result<InitOutcome> {
        if self.breaker.should_call_backend() {
            match tokio::time::timeout(self.call_timeout, self.backend.initialize(quiz, user)).await {
                Ok(Ok(outcome)) => {
                    self.breaker.record_outcome(true);
                    return Ok(outcome);
                }
                Ok(Err(e)) => {
                    self.breaker.record_outcome(false);
                    tracing::warn!(err = %e, quiz, user, "initialize: backend failed, using mirror");
                }
                Err(_) => {
                    self.breaker.record_outcome(false);
                    tracing::warn!(quiz, user, "initialize: backend timed out, using mirror");
                }
            }
        }
        self.mirror.initialize(quiz, user).await
    }

    async fn increment(&self, quiz: &str, user: &str, delta: i64) -> anyhow::Result<i64> {
        if self.breaker.should_call_backend() {
            match tokio::time::timeout(self.call_timeout, self.backend.increment(quiz, user, delta)).await
            {
                Ok(Ok(score)) => {
                    self.breaker.record_outcome(true);
                    return Ok(score);
                }
                Ok(Err(e)) => {
                    self.breaker.record_outcome(false);
                    tracing::warn!(err = %e, quiz, user, "increment: backend failed, using mirror");
                }
                Err(_) => {
                    self.breaker.record_outcome(false);
                    tracing::warn!(quiz, user, "increment: backend timed out, using mirror");
                }
            }
        }
        self.mirror.increment(quiz, user, delta).await
    }

    async fn top_n(&self, quiz: &str, n: usize) -> anyhow::Result<Vec<LeaderboardEntry>> {
        if self.breaker.should_call_backend() {
            match tokio::time::timeout(self.call_timeout, self.backend.top_n(quiz, n)).await {
                Ok(Ok(rows)) => {
                    self.breaker.record_outcome(true);
                    return Ok(rows);
                }
                Ok(Err(e)) => {
                    self.breaker.record_outcome(false);
                    tracing::warn!(err = %e, quiz, "top_n: backend failed, using mirror");
                }
                Err(_) => {
                    self.breaker.record_outcome(false);
                    tracing::warn!(quiz, "top_n: backend timed out, using mirror");
                }
            }
        }
        self.mirror.top_n(quiz, n).await
    }

    async fn score(&self, quiz: &str, user: &str) -> anyhow::Result<Option<i64>> {
        if self.breaker.should_call_backend() {
            match tokio::time::timeout(self.call_timeout, self.backend.score(quiz, user)).await {
                Ok(Ok(score)) => {
                    self.breaker.record_outcome(true);
                    return Ok(score);
                }
                Ok(Err(e)) => {
                    self.breaker.record_outcome(false);
                    tracing::warn!(err = %e, quiz, user, "score: backend failed, using mirror");
                }
                Err(_) => {
                    self.breaker.record_outcome(false);
                    tracing::warn!(quiz, user, "score: backend timed out, using mirror");
                }
            }
        }
        self.mirror.score(quiz, user).await
    }

    async fn rank(&self, quiz: &str, user: &str) -> anyhow::Result<Option<u32>> {
        if self.breaker.should_call_backend() {
            match tokio::time::timeout(self.call_timeout, self.backend.rank(quiz, user)).await {
                Ok(Ok(rank)) => {
                    self.breaker.record_outcome(true);
                    return Ok(rank);
                }
                Ok(Err(e)) => {
                    self.breaker.record_outcome(false);
                    tracing::warn!(err = %e, quiz, user, "rank: backend failed, using mirror");
                }
                Err(_) => {
                    self.breaker.record_outcome(false);
                    tracing::warn!(quiz, user, "rank: backend timed out, using mirror");
                }
            }
        }
        self.mirror.rank(quiz, user).await
    }

    async fn size(&self, quiz: &str) -> anyhow::Result<usize> {
        if self.breaker.should_call_backend() {
            match tokio::time::timeout(self.call_timeout, self.backend.size(quiz)).await {
                Ok(Ok(size)) => {
                    self.breaker.record_outcome(true);
                    return Ok(size);
                }
                Ok(Err(e)) => {
                    self.breaker.record_outcome(false);
                    tracing::warn!(err = %e, quiz, "size: backend failed, using mirror");
                }
                Err(_) => {
                    self.breaker.record_outcome(false);
                    tracing::warn!(quiz, "size: backend timed out, using mirror");
                }
            }
        }
        self.mirror.size(quiz).await
    }

    async fn remove(&self, quiz: &str, user: &str) -> anyhow::Result<()> {
        if self.breaker.should_call_backend() {
            match tokio::time::timeout(self.call_timeout, self.backend.remove(quiz, user)).await {
                Ok(Ok(())) => {
                    self.breaker.record_outcome(true);
                    return Ok(());
                }
                Ok(Err(e)) => {
                    self.breaker.record_outcome(false);
                    tracing::warn!(err = %e, quiz, user, "remove: backend failed, using mirror");
                }
                Err(_) => {
                    self.breaker.record_outcome(false);
                    tracing::warn!(quiz, user, "remove: backend timed out, using mirror");
                }
            }
        }
        self.mirror.remove(quiz, user).await
    }

    async fn delete(&self, quiz: &str) -> anyhow::Result<()> {
        if self.breaker.should_call_backend() {
            match tokio::time::timeout(self.call_timeout, self.backend.delete(quiz)).await {
                Ok(Ok(())) => {
                    self.breaker.record_outcome(true);
                    return Ok(());
                }
                Ok(Err(e)) => {
                    self.breaker.record_outcome(false);
                    tracing::warn!(err = %e, quiz, "delete: backend failed, using mirror");
                }
                Err(_) => {
                    self.breaker.record_outcome(false);
                    tracing::warn!(quiz, "delete: backend timed out, using mirror");
                }
            }
        }
        self.mirror.delete(quiz).await
    }

    async fn health_check(&self) -> anyhow::Result<()> {
        self.backend.health_check().await
    }
}

#[cfg(test)]
#[path = "resilience_tests.rs"]
mod tests;
