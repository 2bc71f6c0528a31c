// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session Registry & Room Index: per-instance bookkeeping of live connections.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock as SyncRwLock};
use tokio::sync::{mpsc, RwLock};

use crate::message::OutboundMessage;
use crate::ratelimit::TokenBucket;

/// One live client connection on this instance.
pub struct Session {
    pub id: String,
    outbound: mpsc::UnboundedSender<OutboundMessage>,
    user_id: SyncRwLock<Option<String>>,
    quiz_id: SyncRwLock<Option<String>>,
    /// Millis since epoch of the last heartbeat or join, used by the sweep.
    last_seen_ms: AtomicI64,
    pub bucket: Mutex<TokenBucket>,
}

impl Session {
    pub fn user_id(&self) -> Option<String> {
        self.user_id.read().clone()
    }

    pub fn quiz_id(&self) -> Option<String> {
        self.quiz_id.read().clone()
    }

    /// Send a frame to this session's personal reply queue. Silently dropped
    /// if the connection has already gone away — the caller never blocks or
    /// fails on a disconnected peer.
    pub fn send(&self, frame: OutboundMessage) {
        let _ = self.outbound.send(frame);
    }

    pub fn touch(&self, now_ms: i64) {
        self.last_seen_ms.store(now_ms, Ordering::Relaxed);
    }

    pub fn last_seen_ms(&self) -> i64 {
        self.last_seen_ms.load(Ordering::Relaxed)
    }
}

/// Combined Session Registry and Room Index.
///
/// These two maps are kept together because every Room Index entry must have
/// a matching Session Registry entry, and `add_to_room`/`cleanup` must update
/// both without a window where one reflects a session the other does not.
pub struct Sessions {
    by_id: RwLock<HashMap<String, Arc<Session>>>,
    by_user: RwLock<HashMap<String, String>>,
    rooms: RwLock<HashMap<String, HashSet<String>>>,
    now_ms: fn() -> i64,
}

impl Sessions {
    pub fn new() -> Self {
        Self::with_clock(default_now_ms)
    }

    fn with_clock(now_ms: fn() -> i64) -> Self {
        Self {
            by_id: RwLock::new(HashMap::new()),
            by_user: RwLock::new(HashMap::new()),
            rooms: RwLock::new(HashMap::new()),
            now_ms,
        }
    }

    /// Register a brand-new connection and return its handle.
    pub async fn register(&self, session_id: String) -> (Arc<Session>, mpsc::UnboundedReceiver<OutboundMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Arc::new(Session {
            id: session_id.clone(),
            outbound: tx,
            user_id: SyncRwLock::new(None),
            quiz_id: SyncRwLock::new(None),
            last_seen_ms: AtomicI64::new((self.now_ms)()),
            bucket: Mutex::new(TokenBucket::new()),
        });
        self.by_id.write().await.insert(session_id, Arc::clone(&session));
        (session, rx)
    }

    pub async fn get(&self, session_id: &str) -> Option<Arc<Session>> {
        self.by_id.read().await.get(session_id).cloned()
    }

    /// Associate `user` with `session`. If another session currently holds
    /// this user, the mapping moves to the new session; the old session is
    /// left open (it will be overwritten on its own next JOIN).
    pub async fn associate(&self, user: &str, session: &Arc<Session>) {
        *session.user_id.write() = Some(user.to_owned());
        self.by_user.write().await.insert(user.to_owned(), session.id.clone());
    }

    /// Put `session` in `quiz`'s room, first removing it from any prior room.
    pub async fn add_to_room(&self, quiz: &str, session: &Arc<Session>) {
        let prev = session.quiz_id.read().clone();
        if let Some(prev_quiz) = prev {
            if prev_quiz != quiz {
                self.remove_from_room(&prev_quiz, &session.id).await;
            }
        }
        *session.quiz_id.write() = Some(quiz.to_owned());
        let mut rooms = self.rooms.write().await;
        rooms.entry(quiz.to_owned()).or_default().insert(session.id.clone());
    }

    async fn remove_from_room(&self, quiz: &str, session_id: &str) {
        let mut rooms = self.rooms.write().await;
        if let Some(set) = rooms.get_mut(quiz) {
            set.remove(session_id);
            if set.is_empty() {
                rooms.remove(quiz);
            }
        }
    }

    /// All sessions currently in `quiz`'s room, for broadcast fan-out.
    pub async fn room_members(&self, quiz: &str) -> Vec<Arc<Session>> {
        let session_ids: Vec<String> = {
            let rooms = self.rooms.read().await;
            match rooms.get(quiz) {
                Some(set) => set.iter().cloned().collect(),
                None => return Vec::new(),
            }
        };
        let by_id = self.by_id.read().await;
        session_ids.iter().filter_map(|id| by_id.get(id).cloned()).collect()
    }

    pub async fn is_in_room(&self, quiz: &str, session_id: &str) -> bool {
        self.rooms.read().await.get(quiz).is_some_and(|set| set.contains(session_id))
    }

    /// Remove `session_id` from every registry: session map, room, and (by
    /// construction, since they live on the `Session`) heartbeat and limiter
    /// state. Idempotent: tolerates a session already partially removed.
    pub async fn cleanup(&self, session_id: &str) {
        let session = self.by_id.write().await.remove(session_id);
        let Some(session) = session else { return };

        if let Some(quiz) = session.quiz_id() {
            self.remove_from_room(&quiz, session_id).await;
        }

        if let Some(user) = session.user_id() {
            let mut by_user = self.by_user.write().await;
            if by_user.get(&user).map(|s| s.as_str()) == Some(session_id) {
                by_user.remove(&user);
            }
        }
    }

    /// Snapshot of every live session, for the heartbeat sweep.
    pub async fn snapshot(&self) -> Vec<Arc<Session>> {
        self.by_id.read().await.values().cloned().collect()
    }
}

impl Default for Sessions {
    fn default() -> Self {
        Self::new()
    }
}

fn default_now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
