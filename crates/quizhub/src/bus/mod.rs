// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event Bus Adapter: cross-instance fan-out of leaderboard-relevant changes.

pub mod local;
pub mod nats;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// A leaderboard-relevant event, published then discarded — delivery is
/// at-most-once and events are not replayed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "USER_JOINED")]
    UserJoined {
        #[serde(rename = "quizId")]
        quiz_id: String,
        #[serde(rename = "userId")]
        user_id: String,
        timestamp: String,
        #[serde(rename = "sourceInstanceId")]
        source_instance_id: String,
    },
    #[serde(rename = "SCORE_UPDATED")]
    ScoreUpdated {
        #[serde(rename = "quizId")]
        quiz_id: String,
        #[serde(rename = "userId")]
        user_id: String,
        score: i64,
        timestamp: String,
        #[serde(rename = "sourceInstanceId")]
        source_instance_id: String,
    },
}

impl Event {
    pub fn quiz_id(&self) -> &str {
        match self {
            Event::UserJoined { quiz_id, .. } => quiz_id,
            Event::ScoreUpdated { quiz_id, .. } => quiz_id,
        }
    }
}

/// Deterministic logical channel name for a quiz's event stream.
pub fn chan(quiz: &str) -> String {
    format!("quiz:{quiz}:events")
}

/// Wildcard pattern matching every quiz's channel.
pub const WILDCARD: &str = "quiz:*:events";

/// Publish/subscribe transport for `Event`s. The Broadcast Coordinator is the
/// sole subscriber; the Quiz Service is the sole publisher.
#[async_trait]
pub trait EventBus: Send + Sync {
    async fn publish(&self, event: Event) -> anyhow::Result<()>;

    /// Subscribe to every quiz's event stream. Each call returns an
    /// independent receiver; a slow subscriber lags rather than blocking
    /// publishers (see `tokio::sync::broadcast`'s semantics).
    fn subscribe(&self) -> broadcast::Receiver<Event>;
}

/// Current UTC time as an ISO 8601 string (e.g. "2026-02-14T01:23:45Z").
pub fn iso8601_now() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let dur = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    let secs = dur.as_secs();
    let time_secs = secs % 86400;
    let hours = time_secs / 3600;
    let minutes = (time_secs % 3600) / 60;
    let seconds = time_secs % 60;
    // Civil calendar from days since epoch (Howard Hinnant's algorithm).
    let days = secs / 86400;
    let z = days as i64 + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = (z - era * 146097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = if m <= 2 { y + 1 } else { y };
    format!("{y:04}-{m:02}-{d:02}T{hours:02}:{minutes:02}:{seconds:02}Z")
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
