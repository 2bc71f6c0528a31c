// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `LeaderboardBackend` over a shared Redis (or Redis-compatible) instance,
//! using its sorted-set commands for the O(log N) / O(log N + n) bounds the
//! store requires.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::{key, InitOutcome, LeaderboardBackend, LeaderboardEntry};

pub struct RedisBackend {
    conn: ConnectionManager,
}

impl RedisBackend {
    /// Connect, using a `ConnectionManager` so transient disconnects are
    /// retried transparently rather than failing every call until a new
    /// connection is built by hand.
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn })
    }

    /// Issue a lightweight command used by the resilience prober.
    pub async fn ping(&self) -> anyhow::Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

#[async_trait]
impl LeaderboardBackend for RedisBackend {
    async fn initialize(&self, quiz: &str, user: &str) -> anyhow::Result<InitOutcome> {
        let mut conn = self.conn.clone();
        let added: i64 = redis::cmd("ZADD")
            .arg(key(quiz))
            .arg("NX")
            .arg(0)
            .arg(user)
            .query_async(&mut conn)
            .await?;
        Ok(if added > 0 { InitOutcome::Added } else { InitOutcome::Existed })
    }

    async fn increment(&self, quiz: &str, user: &str, delta: i64) -> anyhow::Result<i64> {
        let mut conn = self.conn.clone();
        let score: f64 = conn.zincr(key(quiz), user, delta).await?;
        Ok(score.round() as i64)
    }

    async fn top_n(&self, quiz: &str, n: usize) -> anyhow::Result<Vec<LeaderboardEntry>> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        let rows: Vec<(String, f64)> =
            conn.zrevrange_withscores(key(quiz), 0, n as isize - 1).await?;
        Ok(rows
            .into_iter()
            .enumerate()
            .map(|(i, (user_id, score))| LeaderboardEntry {
                user_id,
                score: score.round() as i64,
                rank: (i + 1) as u32,
            })
            .collect())
    }

    async fn score(&self, quiz: &str, user: &str) -> anyhow::Result<Option<i64>> {
        let mut conn = self.conn.clone();
        let score: Option<f64> = conn.zscore(key(quiz), user).await?;
        Ok(score.map(|s| s.round() as i64))
    }

    async fn rank(&self, quiz: &str, user: &str) -> anyhow::Result<Option<u32>> {
        let mut conn = self.conn.clone();
        let rank: Option<u64> = conn.zrevrank(key(quiz), user).await?;
        Ok(rank.map(|r| r as u32 + 1))
    }

    async fn size(&self, quiz: &str) -> anyhow::Result<usize> {
        let mut conn = self.conn.clone();
        let size: u64 = conn.zcard(key(quiz)).await?;
        Ok(size as usize)
    }

    async fn remove(&self, quiz: &str, user: &str) -> anyhow::Result<()> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.zrem(key(quiz), user).await?;
        Ok(())
    }

    async fn delete(&self, quiz: &str) -> anyhow::Result<()> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.del(key(quiz)).await?;
        Ok(())
    }

    async fn health_check(&self) -> anyhow::Result<()> {
        self.ping().await
    }
}

#[cfg(test)]
#[path = "redis_tests.rs"]
mod tests;
