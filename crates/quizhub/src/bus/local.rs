// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process `EventBus`, for tests and single-instance deployments without
//! a NATS dependency. Publish fans out directly to every `subscribe()`r via
//! a `tokio::sync::broadcast` channel — no network round trip.

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::{Event, EventBus};

pub struct LocalBus {
    tx: broadcast::Sender<Event>,
}

impl LocalBus {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(1024);
        Self { tx }
    }
}

impl Default for LocalBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventBus for LocalBus {
    async fn publish(&self, event: Event) -> anyhow::Result<()> {
        // No subscribers is not an error: a publish before the coordinator
        // starts listening is a legitimate startup race, not a fault.
        let _ = self.tx.send(event);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
