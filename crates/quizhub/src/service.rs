// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Quiz Service: stateless orchestration of join and answer submission.
//!
//! Never broadcasts — that is exclusively `broadcast::Coordinator`'s job, so
//! every instance's local subscribers (including the originating one)
//! receive updates through the same event-bus path.

use crate::bus::{iso8601_now, Event, EventBus};
use crate::error::QuizError;
use crate::questions;
use crate::store::LeaderboardBackend;

pub async fn handle_join<B: LeaderboardBackend + ?Sized>(
    store: &B,
    bus: &dyn EventBus,
    instance_id: &str,
    quiz: &str,
    user: &str,
) -> anyhow::Result<()> {
    store.initialize(quiz, user).await?;

    let event = Event::UserJoined {
        quiz_id: quiz.to_owned(),
        user_id: user.to_owned(),
        timestamp: iso8601_now(),
        source_instance_id: instance_id.to_owned(),
    };
    if let Err(e) = bus.publish(event).await {
        tracing::warn!(err = %e, quiz, user, "failed to publish USER_JOINED event");
    }
    Ok(())
}

pub async fn handle_submit<B: LeaderboardBackend + ?Sized>(
    store: &B,
    bus: &dyn EventBus,
    instance_id: &str,
    quiz: &str,
    user: &str,
    question_number: i64,
    correct: bool,
) -> Result<i64, QuizError> {
    if !questions::is_valid(question_number) {
        return Err(QuizError::InvalidInput);
    }

    let delta = if correct { questions::points(question_number) } else { 0 };
    let new_score = store.increment(quiz, user, delta).await.map_err(|e| {
        tracing::error!(err = %e, quiz, user, "increment failed even through the resilience gate");
        QuizError::InternalFault
    })?;

    let event = Event::ScoreUpdated {
        quiz_id: quiz.to_owned(),
        user_id: user.to_owned(),
        score: new_score,
        timestamp: iso8601_now(),
        source_instance_id: instance_id.to_owned(),
    };
    if let Err(e) = bus.publish(event).await {
        tracing::warn!(err = %e, quiz, user, "failed to publish SCORE_UPDATED event");
    }

    Ok(new_score)
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
