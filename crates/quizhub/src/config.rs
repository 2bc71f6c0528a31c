// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

/// Configuration for the quizhub realtime leaderboard service.
#[derive(Debug, Clone, clap::Parser)]
pub struct QuizConfig {
    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "QUIZHUB_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8900, env = "QUIZHUB_PORT")]
    pub port: u16,

    /// Redis connection URL backing the shared leaderboard store.
    #[arg(long, default_value = "redis://127.0.0.1:6379", env = "QUIZHUB_REDIS_URL")]
    pub redis_url: String,

    /// NATS connection URL backing the event bus.
    #[arg(long, default_value = "nats://127.0.0.1:4222", env = "QUIZHUB_NATS_URL")]
    pub nats_url: String,

    /// Number of rows sent in a `LEADERBOARD_UPDATE` broadcast.
    #[arg(long, default_value_t = 10, env = "QUIZHUB_LEADERBOARD_TOP_N")]
    pub leaderboard_top_n: usize,

    /// Token bucket capacity per session.
    #[arg(long, default_value_t = 10, env = "QUIZHUB_RATE_LIMIT_CAPACITY")]
    pub rate_limit_capacity: u32,

    /// Tokens added per refill period.
    #[arg(long, default_value_t = 5, env = "QUIZHUB_RATE_LIMIT_REFILL_TOKENS")]
    pub rate_limit_refill_tokens: u32,

    /// Refill period, in seconds.
    #[arg(long, default_value_t = 1, env = "QUIZHUB_RATE_LIMIT_REFILL_PERIOD_SECONDS")]
    pub rate_limit_refill_period_seconds: u64,

    /// Expected client heartbeat interval, in seconds.
    #[arg(long, default_value_t = 30, env = "QUIZHUB_HEARTBEAT_INTERVAL_SECONDS")]
    pub heartbeat_interval_seconds: u64,

    /// Multiplier applied to the heartbeat interval to obtain the timeout.
    #[arg(long, default_value_t = 2, env = "QUIZHUB_HEARTBEAT_TIMEOUT_MULTIPLIER")]
    pub heartbeat_timeout_multiplier: u64,

    /// Interval between sweeps for stale sessions, in seconds.
    #[arg(long, default_value_t = 60, env = "QUIZHUB_HEARTBEAT_SWEEP_INTERVAL_SECONDS")]
    pub heartbeat_sweep_interval_seconds: u64,

    /// Failure fraction, over the sliding window, that trips the breaker open.
    #[arg(long, default_value_t = 0.5, env = "QUIZHUB_CIRCUIT_FAILURE_RATE_THRESHOLD")]
    pub circuit_failure_rate_threshold: f64,

    /// Size of the sliding window of recent call outcomes.
    #[arg(long, default_value_t = 10, env = "QUIZHUB_CIRCUIT_WINDOW_SIZE")]
    pub circuit_window_size: usize,

    /// Minimum calls in the window before the failure rate is evaluated.
    #[arg(long, default_value_t = 5, env = "QUIZHUB_CIRCUIT_MIN_CALLS")]
    pub circuit_min_calls: usize,

    /// How long the breaker stays open before allowing half-open probes, in seconds.
    #[arg(long, default_value_t = 30, env = "QUIZHUB_CIRCUIT_OPEN_DURATION_SECONDS")]
    pub circuit_open_duration_seconds: u64,

    /// Number of successful probes required to close the breaker from half-open.
    #[arg(long, default_value_t = 3, env = "QUIZHUB_CIRCUIT_HALF_OPEN_PROBES")]
    pub circuit_half_open_probes: u32,

    /// Interval between backend health probes, in seconds.
    #[arg(long, default_value_t = 10, env = "QUIZHUB_BACKEND_HEALTH_CHECK_INTERVAL_SECONDS")]
    pub backend_health_check_interval_seconds: u64,

    /// Identifier for this instance, used in logs and as a NATS client name.
    /// Defaults to the local hostname.
    #[arg(long, env = "QUIZHUB_INSTANCE_ID")]
    pub instance_id: Option<String>,
}

impl QuizConfig {
    pub fn rate_limit_refill_period(&self) -> Duration {
        Duration::from_secs(self.rate_limit_refill_period_seconds)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_seconds)
    }

    /// Time after the last heartbeat (or join) a session is considered stale.
    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_seconds * self.heartbeat_timeout_multiplier)
    }

    pub fn heartbeat_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_sweep_interval_seconds)
    }

    pub fn circuit_open_duration(&self) -> Duration {
        Duration::from_secs(self.circuit_open_duration_seconds)
    }

    pub fn backend_health_check_interval(&self) -> Duration {
        Duration::from_secs(self.backend_health_check_interval_seconds)
    }

    /// Resolve the configured instance id, falling back to the `HOSTNAME` env
    /// var and finally to a random suffix if neither is available.
    pub fn resolved_instance_id(&self) -> String {
        self.instance_id.clone().unwrap_or_else(|| {
            std::env::var("HOSTNAME")
                .unwrap_or_else(|_| format!("quizhub-{}", uuid::Uuid::new_v4()))
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
