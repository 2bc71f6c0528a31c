// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory per-instance fallback mirror, used only while the shared
//! backend is unreachable. Not synced back on recovery: the shared store is
//! always the source of truth once the circuit closes.
//!
//! Trades the store's O(log N) / O(log N + n) bounds for a flat
//! `HashMap<user, score>` per quiz with an O(n log n) sort on `top_n` and an
//! O(n) `rank`. This is a deliberate tradeoff: the mirror only serves calls
//! during a backend outage, its population is bounded by one instance's
//! active users, and it is discarded (not migrated) on recovery, so its
//! algorithmic complexity does not compound over the life of the system the
//! way the shared store's does.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{InitOutcome, LeaderboardBackend, LeaderboardEntry};

#[derive(Default)]
pub struct FallbackMirror {
    quizzes: RwLock<HashMap<String, HashMap<String, i64>>>,
}

impl FallbackMirror {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LeaderboardBackend for FallbackMirror {
    async fn initialize(&self, quiz: &str, user: &str) -> anyhow::Result<InitOutcome> {
        let mut quizzes = self.quizzes.write();
        let board = quizzes.entry(quiz.to_owned()).or_default();
        if board.contains_key(user) {
            Ok(InitOutcome::Existed)
        } else {
            board.insert(user.to_owned(), 0);
            Ok(InitOutcome::Added)
        }
    }

    async fn increment(&self, quiz: &str, user: &str, delta: i64) -> anyhow::Result<i64> {
        let mut quizzes = self.quizzes.write();
        let board = quizzes.entry(quiz.to_owned()).or_default();
        let score = board.entry(user.to_owned()).or_insert(0);
        *score += delta;
        Ok(*score)
    }

    async fn top_n(&self, quiz: &str, n: usize) -> anyhow::Result<Vec<LeaderboardEntry>> {
        let quizzes = self.quizzes.read();
        let Some(board) = quizzes.get(quiz) else { return Ok(Vec::new()) };
        let mut rows: Vec<(&String, &i64)> = board.iter().collect();
        rows.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        Ok(rows
            .into_iter()
            .take(n)
            .enumerate()
            .map(|(i, (user, score))| LeaderboardEntry {
                user_id: user.clone(),
                score: *score,
                rank: (i + 1) as u32,
            })
            .collect())
    }

    async fn score(&self, quiz: &str, user: &str) -> anyhow::Result<Option<i64>> {
        Ok(self.quizzes.read().get(quiz).and_then(|b| b.get(user)).copied())
    }

    async fn rank(&self, quiz: &str, user: &str) -> anyhow::Result<Option<u32>> {
        let quizzes = self.quizzes.read();
        let Some(board) = quizzes.get(quiz) else { return Ok(None) };
        if !board.contains_key(user) {
            return Ok(None);
        }
        let mut rows: Vec<(&String, &i64)> = board.iter().collect();
        rows.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        Ok(rows.iter().position(|(u, _)| u.as_str() == user).map(|i| i as u32 + 1))
    }

    async fn size(&self, quiz: &str) -> anyhow::Result<usize> {
        Ok(self.quizzes.read().get(quiz).map_or(0, |b| b.len()))
    }

    async fn remove(&self, quiz: &str, user: &str) -> anyhow::Result<()> {
        if let Some(board) = self.quizzes.write().get_mut(quiz) {
            board.remove(user);
        }
        Ok(())
    }

    async fn delete(&self, quiz: &str) -> anyhow::Result<()> {
        self.quizzes.write().remove(quiz);
        Ok(())
    }

    async fn health_check(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "mirror_tests.rs"]
mod tests;
