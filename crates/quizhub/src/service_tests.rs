// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::bus::local::LocalBus;
use crate::store::mirror::FallbackMirror;

#[tokio::test]
async fn join_initializes_and_publishes_user_joined() {
    let store = FallbackMirror::new();
    let bus = LocalBus::new();
    let mut rx = bus.subscribe();

    handle_join(&store, &bus, "node-1", "q1", "alice").await.unwrap();

    assert_eq!(store.score("q1", "alice").await.unwrap(), Some(0));
    let event = rx.recv().await.unwrap();
    assert!(matches!(event, Event::UserJoined { .. }));
}

#[tokio::test]
async fn submit_rejects_out_of_range_question() {
    let store = FallbackMirror::new();
    let bus = LocalBus::new();

    let result = handle_submit(&store, &bus, "node-1", "q1", "alice", 11, true).await;
    assert_eq!(result, Err(QuizError::InvalidInput));
}

#[tokio::test]
async fn correct_answer_increments_by_question_number() {
    let store = FallbackMirror::new();
    let bus = LocalBus::new();
    let mut rx = bus.subscribe();

    let new_score = handle_submit(&store, &bus, "node-1", "q1", "alice", 7, true).await.unwrap();
    assert_eq!(new_score, 7);
    assert_eq!(store.score("q1", "alice").await.unwrap(), Some(7));

    let event = rx.recv().await.unwrap();
    match event {
        Event::ScoreUpdated { score, .. } => assert_eq!(score, 7),
        other => panic!("expected ScoreUpdated, got {other:?}"),
    }
}

#[tokio::test]
async fn incorrect_answer_yields_zero_delta_but_still_publishes() {
    let store = FallbackMirror::new();
    let bus = LocalBus::new();
    store.increment("q1", "alice", 7).await.unwrap();
    let mut rx = bus.subscribe();

    let new_score = handle_submit(&store, &bus, "node-1", "q1", "alice", 9, false).await.unwrap();
    assert_eq!(new_score, 7);

    let event = rx.recv().await.unwrap();
    match event {
        Event::ScoreUpdated { score, .. } => assert_eq!(score, 7),
        other => panic!("expected ScoreUpdated, got {other:?}"),
    }
}

#[tokio::test]
async fn returned_new_score_matches_store_after_submit() {
    let store = FallbackMirror::new();
    let bus = LocalBus::new();

    let returned = handle_submit(&store, &bus, "node-1", "q1", "alice", 3, true).await.unwrap();
    let stored = store.score("q1", "alice").await.unwrap().unwrap();
    assert_eq!(returned, stored);
}
