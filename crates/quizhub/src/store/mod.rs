// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Leaderboard Store: ordered-set semantics over a shared backend.

pub mod mirror;
pub mod redis;

use async_trait::async_trait;

/// Deterministic key for a quiz's leaderboard in the shared datastore.
pub fn key(quiz: &str) -> String {
    format!("quiz:{quiz}:leaderboard")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Added,
    Existed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub score: i64,
    /// 1-based, strictly increasing within a single `top_n` call.
    pub rank: u32,
}

/// Ordered-set leaderboard store, keyed by quiz, member = user id, score =
/// integer. Every operation is wrapped by the Resilience Gate before it
/// reaches a handler.
///
/// `initialize`/`increment` must be O(log N) or better; `top_n` must be
/// O(log N + n); `rank` must be O(log N). A Redis sorted set satisfies these
/// bounds natively; `mirror::FallbackMirror` trades them for availability
/// while the shared backend is unreachable (see its doc comment).
#[async_trait]
pub trait LeaderboardBackend: Send + Sync {
    async fn initialize(&self, quiz: &str, user: &str) -> anyhow::Result<InitOutcome>;

    /// `delta` must be `>= 0`. Returns the score after the increment.
    async fn increment(&self, quiz: &str, user: &str, delta: i64) -> anyhow::Result<i64>;

    /// Ranks are 1-based, score-descending. Tie-break is backend-defined but
    /// deterministic within a single call. Empty quiz yields an empty list.
    async fn top_n(&self, quiz: &str, n: usize) -> anyhow::Result<Vec<LeaderboardEntry>>;

    async fn score(&self, quiz: &str, user: &str) -> anyhow::Result<Option<i64>>;

    async fn rank(&self, quiz: &str, user: &str) -> anyhow::Result<Option<u32>>;

    async fn size(&self, quiz: &str) -> anyhow::Result<usize>;

    async fn remove(&self, quiz: &str, user: &str) -> anyhow::Result<()>;

    async fn delete(&self, quiz: &str) -> anyhow::Result<()>;

    /// Cheap liveness probe used by the resilience health prober.
    async fn health_check(&self) -> anyhow::Result<()>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
