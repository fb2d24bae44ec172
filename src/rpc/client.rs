//! One-shot RPC client for remote management servers.
//!
//! Opens a fresh WebSocket per call, sends a single JSON-RPC request, awaits
//! exactly one correlated response, and closes the socket before returning.
//! Callers own any retry policy; the client never retries on its own.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::{Instant, timeout_at};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;

use super::protocol::{REQUEST_ID, RemoteError, Request, Response};
use crate::registry::ServerAddress;

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Error returned by RPC client operations.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Connect, send or receive failure, including timeouts.
    #[error("transport error: {0}")]
    Transport(String),
    /// Malformed JSON, id mismatch, or an otherwise unexpected message.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// The server answered with an explicit error payload.
    #[error("remote error: {0}")]
    Remote(RemoteError),
}

/// Stateless client; holds only the per-call timeout.
#[derive(Debug, Clone)]
pub struct RpcClient {
    timeout: Duration,
}

impl RpcClient {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Call an RPC method on the server at `addr` and return its raw result.
    ///
    /// One deadline spans connect and exchange together; a timeout is
    /// reported as a transport error, same as an unreachable server.
    pub async fn call(
        &self,
        addr: &ServerAddress,
        method: &str,
        params: Option<Value>,
    ) -> Result<Value, RpcError> {
        let url = format!("ws://{}", addr);
        let deadline = Instant::now() + self.timeout;
        let (mut ws, _) = timeout_at(deadline, connect_async(&url))
            .await
            .map_err(|_| RpcError::Transport(format!("connect to {} timed out", addr)))?
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        debug!(%addr, method, "rpc call");
        let outcome = timeout_at(deadline, exchange(&mut ws, method, params)).await;

        // The socket is closed on every exit path, success or failure.
        let _ = ws.close(None).await;

        match outcome {
            Ok(result) => result,
            Err(_) => Err(RpcError::Transport(format!(
                "call to {} timed out after {:?}",
                addr, self.timeout
            ))),
        }
    }

    /// Call an RPC method and deserialize its result.
    pub async fn call_as<T: DeserializeOwned>(
        &self,
        addr: &ServerAddress,
        method: &str,
        params: Option<Value>,
    ) -> Result<T, RpcError> {
        let result = self.call(addr, method, params).await?;
        serde_json::from_value(result).map_err(|e| RpcError::Protocol(e.to_string()))
    }
}

/// Send one request and wait for its correlated response.
async fn exchange(
    ws: &mut WsStream,
    method: &str,
    params: Option<Value>,
) -> Result<Value, RpcError> {
    let request = Request::new(method, params);
    let payload =
        serde_json::to_string(&request).map_err(|e| RpcError::Protocol(e.to_string()))?;

    ws.send(Message::Text(payload.into()))
        .await
        .map_err(|e| RpcError::Transport(e.to_string()))?;

    loop {
        let message = ws
            .next()
            .await
            .ok_or_else(|| RpcError::Transport("connection closed before response".into()))?
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => {
                return Err(RpcError::Transport("connection closed before response".into()));
            }
            // Control frames are not responses.
            _ => continue,
        };

        let response: Response =
            serde_json::from_str(text.as_str()).map_err(|e| RpcError::Protocol(e.to_string()))?;

        if response.id != REQUEST_ID {
            return Err(RpcError::Protocol(format!(
                "response id {} does not match request id {}",
                response.id, REQUEST_ID
            )));
        }
        if let Some(error) = response.error {
            return Err(RpcError::Remote(error));
        }
        return Ok(response.result.unwrap_or(Value::Null));
    }
}
