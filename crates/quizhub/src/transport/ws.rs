// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The single `/ws` endpoint clients connect to. Decodes each text frame as
//! an `InboundMessage`, drives it through the handler, and forwards whatever
//! lands on the session's personal reply queue back out over the socket.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};

use crate::handler;
use crate::message::InboundMessage;
use crate::state::AppState;

pub async fn ws_handler(State(state): State<Arc<AppState>>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let session_id = uuid::Uuid::new_v4().to_string();
    let (session, mut outbound_rx) = state.sessions.register(session_id.clone()).await;
    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => break,

            frame = outbound_rx.recv() => {
                match frame {
                    Some(frame) => {
                        let text = match serde_json::to_string(&frame) {
                            Ok(text) => text,
                            Err(e) => {
                                tracing::error!(err = %e, session = %session_id, "failed to encode outbound frame");
                                continue;
                            }
                        };
                        if ws_tx.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }

            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<InboundMessage>(&text) {
                            Ok(inbound) => {
                                handler::handle_message(
                                    inbound,
                                    &session,
                                    &state.sessions,
                                    state.store.as_ref(),
                                    state.bus.as_ref(),
                                    &state.instance_id,
                                    &state.rate_limit,
                                )
                                .await;
                            }
                            Err(e) => {
                                tracing::debug!(err = %e, session = %session_id, "failed to decode inbound frame");
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }

    state.sessions.cleanup(&session_id).await;
}
