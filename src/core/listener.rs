//! Persistent notification listener, one task per monitored server.
//!
//! State machine: Connecting (connect + capability-discovery handshake) →
//! Listening (decode loop) → Closed (peer close or transport error). The
//! listener never reconnects on its own; restarting is the supervisor's job.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Message, Utf8Bytes};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::core::event::DomainEvent;
use crate::core::router::EventRouter;
use crate::registry::RemoteServerRef;
use crate::rpc::client::{RpcError, WsStream};
use crate::rpc::protocol::{Notification, Request, Response};

enum Closed {
    /// Peer closed the socket or the transport failed.
    ByPeer,
    /// Cancelled from outside; nothing is delivered after this.
    Cancelled,
}

/// Run the listener until disconnect, cancellation, or connect failure.
///
/// Emits the user-visible lifecycle notices itself; deregistration from the
/// supervisor's tables is handled by the task that spawned us.
pub async fn run(server: RemoteServerRef, router: Arc<EventRouter>, cancel: CancellationToken) {
    match listen(&server, &router, &cancel).await {
        Ok(Closed::ByPeer) => {
            debug!(server = %server.name, "connection closed by peer");
            router
                .plain(
                    server.channel,
                    "Connection Lost",
                    format!("Connection to `{}` lost.", server.name),
                )
                .await;
        }
        Ok(Closed::Cancelled) => {
            debug!(server = %server.name, "listener cancelled");
        }
        Err(e) => {
            warn!(server = %server.name, error = %e, "listener failed to connect");
            router
                .plain(
                    server.channel,
                    "Connection Failed",
                    format!("Could not connect to `{}`: {}", server.name, e),
                )
                .await;
        }
    }
}

async fn listen(
    server: &RemoteServerRef,
    router: &EventRouter,
    cancel: &CancellationToken,
) -> Result<Closed, RpcError> {
    let url = format!("ws://{}", server.address);
    let (mut ws, _) = tokio::select! {
        _ = cancel.cancelled() => return Ok(Closed::Cancelled),
        conn = connect_async(&url) => conn.map_err(|e| RpcError::Transport(e.to_string()))?,
    };

    // Opening handshake: a capability-discovery request whose reply is only
    // checked for being a well-formed response. A failure here aborts the
    // whole connection attempt.
    let hello = serde_json::to_string(&Request::new(crate::rpc::api::methods::DISCOVER, None))
        .map_err(|e| RpcError::Protocol(e.to_string()))?;
    ws.send(Message::Text(hello.into()))
        .await
        .map_err(|e| RpcError::Transport(e.to_string()))?;

    let reply = tokio::select! {
        _ = cancel.cancelled() => {
            let _ = ws.close(None).await;
            return Ok(Closed::Cancelled);
        }
        reply = next_text(&mut ws) => reply?,
    };
    let _: Response = serde_json::from_str(reply.as_str())
        .map_err(|e| RpcError::Protocol(format!("handshake reply: {}", e)))?;

    debug!(server = %server.name, address = %server.address, "listening for notifications");

    loop {
        let message = tokio::select! {
            _ = cancel.cancelled() => {
                let _ = ws.close(None).await;
                return Ok(Closed::Cancelled);
            }
            message = ws.next() => message,
        };

        match message {
            Some(Ok(Message::Text(text))) => {
                // A single bad message is skipped; the loop keeps running.
                let note: Notification = match serde_json::from_str(text.as_str()) {
                    Ok(note) => note,
                    Err(e) => {
                        warn!(server = %server.name, error = %e, "skipping undecodable message");
                        continue;
                    }
                };
                match DomainEvent::from_notification(&note.method, &note.params) {
                    Some(event) => router.route(&server.name, event, server.channel).await,
                    None => {
                        trace!(server = %server.name, method = %note.method, "ignoring unknown notification");
                    }
                }
            }
            Some(Ok(Message::Close(_))) | None => return Ok(Closed::ByPeer),
            // Control frames carry no notifications.
            Some(Ok(_)) => continue,
            Some(Err(e)) => {
                debug!(server = %server.name, error = %e, "transport error");
                return Ok(Closed::ByPeer);
            }
        }
    }
}

/// Wait for the next text frame, skipping control frames.
async fn next_text(ws: &mut WsStream) -> Result<Utf8Bytes, RpcError> {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => return Ok(text),
            Some(Ok(Message::Close(_))) | None => {
                return Err(RpcError::Transport("connection closed during handshake".into()));
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(RpcError::Transport(e.to_string())),
        }
    }
}
