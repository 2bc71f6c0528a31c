// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Quizhub: realtime leaderboard coordination for live quiz sessions.

pub mod broadcast;
pub mod bus;
pub mod config;
pub mod error;
pub mod handler;
pub mod heartbeat;
pub mod message;
pub mod questions;
pub mod ratelimit;
pub mod resilience;
pub mod service;
pub mod session;
pub mod state;
pub mod store;
pub mod transport;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::bus::local::LocalBus;
use crate::bus::nats::NatsEventBus;
use crate::bus::EventBus;
use crate::config::QuizConfig;
use crate::resilience::{BreakerParams, CircuitBreaker, ResilienceGate};
use crate::state::AppState;
use crate::store::mirror::FallbackMirror;
use crate::store::redis::RedisBackend;
use crate::store::LeaderboardBackend;
use crate::transport::build_router;

/// Run the quizhub server until shutdown.
pub async fn run(config: QuizConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let shutdown = CancellationToken::new();

    let breaker_params = BreakerParams {
        window_size: config.circuit_window_size,
        min_calls: config.circuit_min_calls,
        failure_rate_threshold: config.circuit_failure_rate_threshold,
        open_duration: config.circuit_open_duration(),
        half_open_probes: config.circuit_half_open_probes,
    };
    let breaker = Arc::new(CircuitBreaker::new(breaker_params));

    let redis_backend = Arc::new(RedisBackend::connect(&config.redis_url).await?);
    let mirror = Arc::new(FallbackMirror::new());
    let gate = Arc::new(ResilienceGate::new(Arc::clone(&redis_backend), mirror, Arc::clone(&breaker)));
    let store: Arc<dyn LeaderboardBackend> = gate;

    crate::resilience::spawn_health_prober(
        redis_backend,
        Arc::clone(&breaker),
        config.backend_health_check_interval(),
        shutdown.clone(),
    );

    let bus: Arc<dyn EventBus> = match NatsEventBus::connect(&config.nats_url, shutdown.clone()).await {
        Ok(nats_bus) => Arc::new(nats_bus),
        Err(e) => {
            tracing::warn!(err = %e, "failed to connect to NATS, falling back to in-process event bus");
            Arc::new(LocalBus::new())
        }
    };

    let state = Arc::new(AppState::new(config.clone(), store, Arc::clone(&bus), breaker, shutdown.clone()));

    crate::heartbeat::spawn_sweeper(
        Arc::clone(&state.sessions),
        config.heartbeat_sweep_interval(),
        config.heartbeat_timeout(),
        shutdown.clone(),
        {
            let sessions = Arc::clone(&state.sessions);
            move |session_id: String| {
                let sessions = Arc::clone(&sessions);
                async move { sessions.cleanup(&session_id).await }
            }
        },
    );

    crate::broadcast::spawn_coordinator(
        Arc::clone(&state.store),
        Arc::clone(&bus),
        Arc::clone(&state.sessions),
        config.leaderboard_top_n,
        shutdown.clone(),
    );

    tracing::info!(instance_id = %state.instance_id, "quizhub listening on {addr}");
    let router = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    Ok(())
}
