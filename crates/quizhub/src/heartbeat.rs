// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Heartbeat Monitor: stale-session sweep.
//!
//! The per-session timestamp itself lives on `session::Session` (it is an
//! attribute of the session, per the data model); this module only owns the
//! sweep schedule and the staleness rule.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::session::Sessions;

/// Record a heartbeat (or an implicit one from JOIN) for `session_id`.
pub fn record(session: &crate::session::Session, now_ms: i64) {
    session.touch(now_ms);
}

/// Spawn the sweep task. For every session whose last heartbeat is older than
/// `timeout`, calls `cleanup` — the same path used by explicit disconnect.
/// Never holds a registry lock across the `cleanup` call: it snapshots first.
pub fn spawn_sweeper<F, Fut>(
    sessions: Arc<Sessions>,
    sweep_interval: Duration,
    timeout: Duration,
    shutdown: CancellationToken,
    cleanup: F,
) where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(sweep_interval);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = timer.tick() => {}
            }

            let now_ms = now_ms();
            let stale: Vec<String> = sessions
                .snapshot()
                .await
                .into_iter()
                .filter(|s| now_ms.saturating_sub(s.last_seen_ms()) > timeout.as_millis() as i64)
                .map(|s| s.id.clone())
                .collect();

            for session_id in stale {
                tracing::info!(session_id = %session_id, "sweeping stale session");
                cleanup(session_id).await;
            }
        }
    });
}

pub fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;
