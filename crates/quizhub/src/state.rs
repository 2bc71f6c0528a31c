// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared application state handed to every connection handler.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::bus::EventBus;
use crate::config::QuizConfig;
use crate::ratelimit::RateLimitParams;
use crate::resilience::CircuitBreaker;
use crate::session::Sessions;
use crate::store::LeaderboardBackend;

/// Everything a connection handler or background task needs: the session
/// registry, the resilience-wrapped leaderboard store, the event bus, and
/// the resolved runtime configuration.
pub struct AppState {
    pub config: QuizConfig,
    pub instance_id: String,
    pub sessions: Arc<Sessions>,
    pub store: Arc<dyn LeaderboardBackend>,
    pub bus: Arc<dyn EventBus>,
    pub breaker: Arc<CircuitBreaker>,
    pub rate_limit: RateLimitParams,
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        config: QuizConfig,
        store: Arc<dyn LeaderboardBackend>,
        bus: Arc<dyn EventBus>,
        breaker: Arc<CircuitBreaker>,
        shutdown: CancellationToken,
    ) -> Self {
        let instance_id = config.resolved_instance_id();
        let rate_limit = RateLimitParams {
            capacity: config.rate_limit_capacity,
            refill_tokens: config.rate_limit_refill_tokens,
            refill_period: config.rate_limit_refill_period(),
        };
        Self {
            config,
            instance_id,
            sessions: Arc::new(Sessions::new()),
            store,
            bus,
            breaker,
            rate_limit,
            shutdown,
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
