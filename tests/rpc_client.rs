use std::time::Duration;

use craftbridge::registry::ServerAddress;
use craftbridge::rpc::{RpcClient, RpcError};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// Bind a one-connection mock server that replies to the first request with
/// `make_reply(request)`, then reports whether the client closed the socket.
async fn spawn_replying_server(
    make_reply: impl FnOnce(serde_json::Value) -> String + Send + 'static,
) -> (ServerAddress, tokio::sync::oneshot::Receiver<bool>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let (tx, rx) = tokio::sync::oneshot::channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();

        let msg = ws.next().await.unwrap().unwrap();
        let request: serde_json::Value = serde_json::from_str(msg.to_text().unwrap()).unwrap();
        let reply = make_reply(request);
        ws.send(Message::Text(reply.into())).await.unwrap();

        // The client must close the socket after the exchange.
        let closed = matches!(
            ws.next().await,
            None | Some(Ok(Message::Close(_))) | Some(Err(_))
        );
        let _ = tx.send(closed);
    });

    (ServerAddress::new("127.0.0.1", port), rx)
}

#[tokio::test]
async fn call_returns_result_unchanged() {
    let (addr, closed) = spawn_replying_server(|request| {
        assert_eq!(request["method"], "minecraft:server/status");
        json!({"id": request["id"], "jsonrpc": "2.0", "result": {"started": true}}).to_string()
    })
    .await;

    let client = RpcClient::new(Duration::from_secs(2));
    let result = client
        .call(&addr, "minecraft:server/status", None)
        .await
        .unwrap();

    assert_eq!(result, json!({"started": true}));
    assert!(closed.await.unwrap(), "client left the socket open");
}

#[tokio::test]
async fn error_payload_becomes_remote_error() {
    let (addr, closed) = spawn_replying_server(|request| {
        json!({
            "id": request["id"],
            "jsonrpc": "2.0",
            "error": {"code": -32601, "message": "Method not found"}
        })
        .to_string()
    })
    .await;

    let client = RpcClient::new(Duration::from_secs(2));
    let err = client
        .call(&addr, "minecraft:nonsense", None)
        .await
        .unwrap_err();

    match err {
        RpcError::Remote(remote) => assert_eq!(remote.code, -32601),
        other => panic!("expected Remote error, got {other:?}"),
    }
    assert!(closed.await.unwrap());
}

#[tokio::test]
async fn mismatched_id_is_a_protocol_error() {
    let (addr, _closed) = spawn_replying_server(|_| {
        json!({"id": 99, "jsonrpc": "2.0", "result": null}).to_string()
    })
    .await;

    let client = RpcClient::new(Duration::from_secs(2));
    let err = client
        .call(&addr, "minecraft:server/status", None)
        .await
        .unwrap_err();

    assert!(matches!(err, RpcError::Protocol(_)), "got {err:?}");
}

#[tokio::test]
async fn malformed_response_is_a_protocol_error() {
    let (addr, _closed) = spawn_replying_server(|_| "this is not json".to_string()).await;

    let client = RpcClient::new(Duration::from_secs(2));
    let err = client
        .call(&addr, "minecraft:server/status", None)
        .await
        .unwrap_err();

    assert!(matches!(err, RpcError::Protocol(_)), "got {err:?}");
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    // Bind and immediately drop to get a port with nothing listening.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client = RpcClient::new(Duration::from_millis(500));
    let err = client
        .call(
            &ServerAddress::new("127.0.0.1", port),
            "minecraft:server/status",
            None,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, RpcError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn silent_server_times_out_as_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        // Swallow the request, never answer.
        while let Some(Ok(_)) = ws.next().await {}
    });

    let client = RpcClient::new(Duration::from_millis(300));
    let addr = ServerAddress::new("127.0.0.1", port);
    let call = client.call(&addr, "minecraft:server/status", None);

    // The error must arrive within the configured bound, not hang.
    let err = timeout(Duration::from_secs(2), call)
        .await
        .expect("call did not respect its timeout")
        .unwrap_err();

    assert!(matches!(err, RpcError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn deadline_spans_connect_and_exchange_together() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        // Stall the upgrade so the connect eats part of the budget, then
        // never answer the request.
        tokio::time::sleep(Duration::from_millis(200)).await;
        let mut ws = accept_async(stream).await.unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    });

    let client = RpcClient::new(Duration::from_millis(300));
    let started = std::time::Instant::now();
    let err = client
        .call(
            &ServerAddress::new("127.0.0.1", port),
            "minecraft:server/status",
            None,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, RpcError::Transport(_)), "got {err:?}");
    // A slow connect must not grant the exchange a second full budget.
    let elapsed = started.elapsed();
    assert!(elapsed < Duration::from_millis(450), "took {elapsed:?}");
}
