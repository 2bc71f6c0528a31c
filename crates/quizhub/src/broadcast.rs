// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Broadcast Coordinator: the only component authorized to emit
//! `LEADERBOARD_UPDATE` frames. Subscribes to the event bus; on every event
//! (regardless of kind) it re-reads `top_n` from the store and redraws every
//! local subscriber of that quiz's room.
//!
//! Idempotent by construction: a duplicated or coalesced event just causes
//! another (harmless) snapshot read and redraw. `tokio::sync::broadcast`'s
//! lag behavior — a slow coordinator skips ahead rather than queuing every
//! event — is exactly the coalescing the spec allows, so no extra
//! bookkeeping is needed here.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use crate::bus::EventBus;
use crate::message::{LeaderboardRow, OutboundMessage};
use crate::session::Sessions;
use crate::store::LeaderboardBackend;

pub fn spawn_coordinator<B: LeaderboardBackend + ?Sized + 'static>(
    store: Arc<B>,
    bus: Arc<dyn EventBus>,
    sessions: Arc<Sessions>,
    top_n: usize,
    shutdown: CancellationToken,
) {
    let mut rx = bus.subscribe();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                event = rx.recv() => {
                    match event {
                        Ok(event) => {
                            redraw(&store, &sessions, event.quiz_id(), top_n).await;
                        }
                        Err(RecvError::Lagged(n)) => {
                            tracing::debug!(skipped = n, "broadcast coordinator lagged; next event will redraw");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            }
        }
    });
}

async fn redraw<B: LeaderboardBackend + ?Sized>(store: &B, sessions: &Sessions, quiz: &str, top_n: usize) {
    let rows = match store.top_n(quiz, top_n).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!(err = %e, quiz, "coordinator failed to read leaderboard for redraw");
            return;
        }
    };

    let leaderboard: Vec<LeaderboardRow> = rows
        .into_iter()
        .map(|entry| LeaderboardRow { user_id: entry.user_id, score: entry.score, rank: entry.rank })
        .collect();
    let frame = OutboundMessage::LeaderboardUpdate { quiz_id: quiz.to_owned(), leaderboard };

    for session in sessions.room_members(quiz).await {
        session.send(frame.clone());
    }
}

#[cfg(test)]
#[path = "broadcast_tests.rs"]
mod tests;
