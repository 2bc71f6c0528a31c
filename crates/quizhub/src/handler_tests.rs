// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use super::*;
use crate::bus::local::LocalBus;
use crate::store::mirror::FallbackMirror;

fn params() -> RateLimitParams {
    RateLimitParams { capacity: 10, refill_tokens: 5, refill_period: Duration::from_secs(1) }
}

#[tokio::test]
async fn join_then_submit_correct_answer_s1() {
    let sessions = Sessions::new();
    let (session, mut rx) = sessions.register("s1".to_owned()).await;
    let store = FallbackMirror::new();
    let bus = LocalBus::new();

    handle_message(
        InboundMessage::Join { quiz_id: "q1".to_owned(), user_id: "alice".to_owned() },
        &session,
        &sessions,
        &store,
        &bus,
        "node-1",
        &params(),
    )
    .await;

    match rx.recv().await.unwrap() {
        OutboundMessage::JoinSuccess { quiz_id, user_id, .. } => {
            assert_eq!(quiz_id, "q1");
            assert_eq!(user_id, "alice");
        }
        other => panic!("expected JoinSuccess, got {other:?}"),
    }

    handle_message(
        InboundMessage::SubmitAnswer {
            quiz_id: "q1".to_owned(),
            user_id: "alice".to_owned(),
            question_number: 7,
            correct: true,
        },
        &session,
        &sessions,
        &store,
        &bus,
        "node-1",
        &params(),
    )
    .await;

    match rx.recv().await.unwrap() {
        OutboundMessage::AnswerResult { question_number, correct, points_earned, new_score, .. } => {
            assert_eq!(question_number, 7);
            assert!(correct);
            assert_eq!(points_earned, 7);
            assert_eq!(new_score, 7);
        }
        other => panic!("expected AnswerResult, got {other:?}"),
    }
}

#[tokio::test]
async fn submit_before_join_yields_not_in_room_s_edge() {
    let sessions = Sessions::new();
    let (session, mut rx) = sessions.register("s1".to_owned()).await;
    let store = FallbackMirror::new();
    let bus = LocalBus::new();

    handle_message(
        InboundMessage::SubmitAnswer {
            quiz_id: "q1".to_owned(),
            user_id: "alice".to_owned(),
            question_number: 3,
            correct: true,
        },
        &session,
        &sessions,
        &store,
        &bus,
        "node-1",
        &params(),
    )
    .await;

    match rx.recv().await.unwrap() {
        OutboundMessage::Error { details, .. } => assert_eq!(details.as_deref(), Some("NOT_IN_ROOM")),
        other => panic!("expected Error, got {other:?}"),
    }
}

#[tokio::test]
async fn out_of_range_question_number_yields_invalid_input() {
    let sessions = Sessions::new();
    let (session, mut rx) = sessions.register("s1".to_owned()).await;
    let store = FallbackMirror::new();
    let bus = LocalBus::new();

    sessions.add_to_room("q1", &session).await;

    handle_message(
        InboundMessage::SubmitAnswer {
            quiz_id: "q1".to_owned(),
            user_id: "alice".to_owned(),
            question_number: 42,
            correct: true,
        },
        &session,
        &sessions,
        &store,
        &bus,
        "node-1",
        &params(),
    )
    .await;

    match rx.recv().await.unwrap() {
        OutboundMessage::Error { details, .. } => assert_eq!(details.as_deref(), Some("INVALID_INPUT")),
        other => panic!("expected Error, got {other:?}"),
    }
}

#[tokio::test]
async fn incorrect_answer_yields_zero_points_s3() {
    let sessions = Sessions::new();
    let (session, mut rx) = sessions.register("s1".to_owned()).await;
    let store = FallbackMirror::new();
    store.increment("q1", "alice", 7).await.unwrap();
    let bus = LocalBus::new();
    sessions.add_to_room("q1", &session).await;

    handle_message(
        InboundMessage::SubmitAnswer {
            quiz_id: "q1".to_owned(),
            user_id: "alice".to_owned(),
            question_number: 9,
            correct: false,
        },
        &session,
        &sessions,
        &store,
        &bus,
        "node-1",
        &params(),
    )
    .await;

    match rx.recv().await.unwrap() {
        OutboundMessage::AnswerResult { points_earned, new_score, .. } => {
            assert_eq!(points_earned, 0);
            assert_eq!(new_score, 7);
        }
        other => panic!("expected AnswerResult, got {other:?}"),
    }
}

#[tokio::test]
async fn eleventh_burst_submit_is_rate_limited_s4() {
    let sessions = Sessions::new();
    let (session, mut rx) = sessions.register("s1".to_owned()).await;
    let store = FallbackMirror::new();
    let bus = LocalBus::new();
    sessions.add_to_room("q1", &session).await;

    for _ in 0..11 {
        handle_message(
            InboundMessage::SubmitAnswer {
                quiz_id: "q1".to_owned(),
                user_id: "alice".to_owned(),
                question_number: 1,
                correct: true,
            },
            &session,
            &sessions,
            &store,
            &bus,
            "node-1",
            &params(),
        )
        .await;
    }

    let mut error_count = 0;
    let mut ok_count = 0;
    for _ in 0..11 {
        match rx.recv().await.unwrap() {
            OutboundMessage::AnswerResult { .. } => ok_count += 1,
            OutboundMessage::Error { details, .. } => {
                assert_eq!(details.as_deref(), Some("RATE_LIMITED"));
                error_count += 1;
            }
            other => panic!("unexpected frame {other:?}"),
        }
    }
    assert_eq!(ok_count, 10);
    assert_eq!(error_count, 1);
}

#[tokio::test]
async fn heartbeat_produces_no_reply() {
    let sessions = Sessions::new();
    let (session, mut rx) = sessions.register("s1".to_owned()).await;
    let store = FallbackMirror::new();
    let bus = LocalBus::new();

    handle_message(
        InboundMessage::Heartbeat {},
        &session,
        &sessions,
        &store,
        &bus,
        "node-1",
        &params(),
    )
    .await;

    assert!(session.last_seen_ms() > 0);
    assert!(rx.try_recv().is_err());
}
