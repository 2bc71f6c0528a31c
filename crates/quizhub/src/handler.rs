// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message Handler: demultiplexes inbound frames and drives the Quiz
//! Service. Every path is exception-safe: any internal failure produces an
//! `ERROR` reply (or is silently absorbed for heartbeats) and never closes
//! the connection implicitly.

use std::sync::Arc;

use crate::bus::EventBus;
use crate::error::QuizError;
use crate::heartbeat;
use crate::message::{InboundMessage, OutboundMessage};
use crate::questions;
use crate::ratelimit::{self, RateLimitParams};
use crate::service;
use crate::session::{Session, Sessions};
use crate::store::LeaderboardBackend;

pub async fn handle_message<B: LeaderboardBackend + ?Sized>(
    msg: InboundMessage,
    session: &Arc<Session>,
    sessions: &Sessions,
    store: &B,
    bus: &dyn EventBus,
    instance_id: &str,
    rate_limit: &RateLimitParams,
) {
    match msg {
        InboundMessage::Heartbeat {} => {
            heartbeat::record(session, heartbeat::now_ms());
        }

        InboundMessage::Join { quiz_id, user_id } => {
            if !check_rate_limit(session, rate_limit) {
                return;
            }
            if quiz_id.trim().is_empty() || user_id.trim().is_empty() {
                session.send(QuizError::InvalidInput.to_outbound("quizId and userId must be non-empty"));
                return;
            }

            sessions.associate(&user_id, session).await;
            sessions.add_to_room(&quiz_id, session).await;

            match service::handle_join(store, bus, instance_id, &quiz_id, &user_id).await {
                Ok(()) => {
                    session.send(OutboundMessage::JoinSuccess {
                        quiz_id: quiz_id.clone(),
                        user_id: user_id.clone(),
                        message: format!("{user_id} joined {quiz_id}"),
                    });
                }
                Err(e) => {
                    tracing::error!(err = %e, quiz = %quiz_id, user = %user_id, "join failed");
                    session.send(QuizError::InternalFault.to_outbound("failed to join quiz"));
                }
            }
        }

        InboundMessage::SubmitAnswer { quiz_id, user_id, question_number, correct } => {
            if !check_rate_limit(session, rate_limit) {
                return;
            }
            if quiz_id.trim().is_empty() || user_id.trim().is_empty() {
                session.send(QuizError::InvalidInput.to_outbound("quizId and userId must be non-empty"));
                return;
            }
            if !sessions.is_in_room(&quiz_id, &session.id).await {
                session.send(QuizError::NotInRoom.to_outbound("submit before join on this connection"));
                return;
            }

            match service::handle_submit(
                store,
                bus,
                instance_id,
                &quiz_id,
                &user_id,
                question_number,
                correct,
            )
            .await
            {
                Ok(new_score) => {
                    let points_earned = if correct { questions::points(question_number) } else { 0 };
                    session.send(OutboundMessage::AnswerResult {
                        quiz_id,
                        user_id,
                        question_number,
                        correct,
                        points_earned,
                        new_score,
                    });
                }
                Err(QuizError::InvalidInput) => {
                    session.send(
                        QuizError::InvalidInput.to_outbound("questionNumber must be between 1 and 10"),
                    );
                }
                Err(other) => {
                    tracing::error!(quiz = %quiz_id, user = %user_id, "submit failed: {other}");
                    session.send(other.to_outbound("failed to record answer"));
                }
            }
        }
    }
}

/// Apply the rate limit, replying with `ERROR` and returning `false` if the
/// session is over quota. Heartbeats never reach this path (they bypass the
/// limiter entirely, per the spec).
fn check_rate_limit(session: &Session, params: &RateLimitParams) -> bool {
    let permitted = ratelimit::check(&mut session.bucket.lock(), params);
    if !permitted {
        session.send(QuizError::RateLimited.to_outbound("rate limit exceeded, slow down"));
    }
    permitted
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;
