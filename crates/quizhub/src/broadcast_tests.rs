// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::*;
use crate::bus::local::LocalBus;
use crate::bus::{iso8601_now, Event};
use crate::store::mirror::FallbackMirror;

#[tokio::test]
async fn score_updated_event_redraws_room_subscribers() {
    let store = Arc::new(FallbackMirror::new());
    store.increment("q1", "alice", 7).await.unwrap();

    let bus: Arc<dyn EventBus> = Arc::new(LocalBus::new());
    let sessions = Arc::new(Sessions::new());
    let (session, mut rx) = sessions.register("s1".to_owned()).await;
    sessions.add_to_room("q1", &session).await;

    let shutdown = CancellationToken::new();
    spawn_coordinator(Arc::clone(&store), Arc::clone(&bus), Arc::clone(&sessions), 10, shutdown.clone());

    bus.publish(Event::ScoreUpdated {
        quiz_id: "q1".to_owned(),
        user_id: "alice".to_owned(),
        score: 7,
        timestamp: iso8601_now(),
        source_instance_id: "node-1".to_owned(),
    })
    .await
    .unwrap();

    let frame = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
    match frame {
        OutboundMessage::LeaderboardUpdate { quiz_id, leaderboard } => {
            assert_eq!(quiz_id, "q1");
            assert_eq!(leaderboard.len(), 1);
            assert_eq!(leaderboard[0].user_id, "alice");
            assert_eq!(leaderboard[0].score, 7);
            assert_eq!(leaderboard[0].rank, 1);
        }
        other => panic!("expected LeaderboardUpdate, got {other:?}"),
    }

    shutdown.cancel();
}

#[tokio::test]
async fn sessions_outside_the_room_do_not_receive_the_redraw() {
    let store = Arc::new(FallbackMirror::new());
    store.increment("q1", "alice", 1).await.unwrap();

    let bus: Arc<dyn EventBus> = Arc::new(LocalBus::new());
    let sessions = Arc::new(Sessions::new());
    let (_s1, _rx1) = sessions.register("s1".to_owned()).await;
    // s1 never joins q1's room.

    let shutdown = CancellationToken::new();
    spawn_coordinator(Arc::clone(&store), Arc::clone(&bus), Arc::clone(&sessions), 10, shutdown.clone());

    bus.publish(Event::UserJoined {
        quiz_id: "q1".to_owned(),
        user_id: "alice".to_owned(),
        timestamp: iso8601_now(),
        source_instance_id: "node-1".to_owned(),
    })
    .await
    .unwrap();

    // Give the coordinator a moment; s1 should see nothing since it's not in the room.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(sessions.room_members("q1").await.is_empty());

    shutdown.cancel();
}
