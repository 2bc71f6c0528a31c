// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! NATS-backed `EventBus`.
//!
//! NATS subjects cannot contain `:`, so the logical channel names from
//! `bus::chan`/`bus::WILDCARD` (`quiz:{quizId}:events`, `quiz:*:events`) are
//! mapped to dot-delimited subjects (`quiz.{quizId}.events`, `quiz.*.events`)
//! purely for wire purposes; callers never see the NATS subject shape.

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{Event, EventBus};

/// Map a quiz id to its NATS subject.
fn subject_for(quiz: &str) -> String {
    format!("quiz.{quiz}.events")
}

/// NATS subject matching every quiz's events.
const SUBJECT_WILDCARD: &str = "quiz.*.events";

pub struct NatsEventBus {
    client: async_nats::Client,
    tx: broadcast::Sender<Event>,
}

impl NatsEventBus {
    /// Connect to NATS and start the background subscriber that feeds the
    /// internal broadcast channel consumed by `subscribe`.
    pub async fn connect(url: &str, shutdown: CancellationToken) -> anyhow::Result<Self> {
        let opts = async_nats::ConnectOptions::new().retry_on_initial_connect();
        let client = opts.connect(url).await?;
        tracing::info!(url, "event bus connected to NATS");

        let (tx, _rx) = broadcast::channel(1024);
        spawn_subscriber(client.clone(), tx.clone(), shutdown);

        Ok(Self { client, tx })
    }
}

#[async_trait]
impl EventBus for NatsEventBus {
    async fn publish(&self, event: Event) -> anyhow::Result<()> {
        let subject = subject_for(event.quiz_id());
        let payload = serde_json::to_vec(&event)?;
        self.client.publish(subject, payload.into()).await?;
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

fn spawn_subscriber(client: async_nats::Client, tx: broadcast::Sender<Event>, shutdown: CancellationToken) {
    tokio::spawn(async move {
        let mut sub = match client.subscribe(SUBJECT_WILDCARD).await {
            Ok(sub) => sub,
            Err(e) => {
                tracing::error!(err = %e, "event bus failed to subscribe to NATS wildcard");
                return;
            }
        };

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                msg = sub.next() => {
                    let Some(msg) = msg else { break };
                    match serde_json::from_slice::<Event>(&msg.payload) {
                        Ok(event) => {
                            // No local subscribers yet is not an error; the
                            // coordinator may not have started subscribing.
                            let _ = tx.send(event);
                        }
                        Err(e) => {
                            debug!(err = %e, "event bus dropped undecodable event");
                        }
                    }
                }
            }
        }

        warn!("event bus NATS subscriber loop exited");
    });
}

#[cfg(test)]
#[path = "nats_tests.rs"]
mod tests;
