// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire-format application messages.
//!
//! Mirrors the closed set of inbound/outbound frame kinds a decoded client
//! connection can produce or consume. The actual framing/transport (how bytes
//! off a socket become one of these) lives in `transport`; this module only
//! owns the JSON shape.

use serde::{Deserialize, Serialize};

/// A decoded inbound application frame.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum InboundMessage {
    #[serde(rename = "JOIN")]
    Join {
        #[serde(rename = "quizId")]
        quiz_id: String,
        #[serde(rename = "userId")]
        user_id: String,
    },
    #[serde(rename = "SUBMIT_ANSWER")]
    SubmitAnswer {
        #[serde(rename = "quizId")]
        quiz_id: String,
        #[serde(rename = "userId")]
        user_id: String,
        #[serde(rename = "questionNumber")]
        question_number: i64,
        correct: bool,
    },
    #[serde(rename = "HEARTBEAT")]
    Heartbeat {},
}

/// A single leaderboard row as sent to clients.
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardRow {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub score: i64,
    pub rank: u32,
}

/// A frame destined for a session's personal reply queue or a quiz's broadcast topic.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum OutboundMessage {
    #[serde(rename = "JOIN_SUCCESS")]
    JoinSuccess {
        #[serde(rename = "quizId")]
        quiz_id: String,
        #[serde(rename = "userId")]
        user_id: String,
        message: String,
    },
    #[serde(rename = "ANSWER_RESULT")]
    AnswerResult {
        #[serde(rename = "quizId")]
        quiz_id: String,
        #[serde(rename = "userId")]
        user_id: String,
        #[serde(rename = "questionNumber")]
        question_number: i64,
        correct: bool,
        #[serde(rename = "pointsEarned")]
        points_earned: i64,
        #[serde(rename = "newScore")]
        new_score: i64,
    },
    #[serde(rename = "ERROR")]
    Error {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
    #[serde(rename = "LEADERBOARD_UPDATE")]
    LeaderboardUpdate {
        #[serde(rename = "quizId")]
        quiz_id: String,
        leaderboard: Vec<LeaderboardRow>,
    },
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
