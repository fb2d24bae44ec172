//! JSON-RPC 2.0 protocol types.
//!
//! Implements the client side of the JSON-RPC 2.0 specification used by the
//! remote server management protocol. See: https://www.jsonrpc.org/specification

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Correlation id used for every outbound request.
///
/// Each socket carries at most one request at a time, so a constant id is
/// sufficient; the response is still checked against it.
pub const REQUEST_ID: i64 = 1;

/// JSON-RPC 2.0 request object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Must be exactly "2.0"
    pub jsonrpc: String,
    /// Method name to invoke (namespaced, e.g. `minecraft:server/stop`)
    pub method: String,
    /// Optional parameters. Shape is method-specific: a positional scalar,
    /// a single object, or a one-element list wrapping a batch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Request identifier, echoed back in the response.
    pub id: i64,
}

impl Request {
    pub fn new(method: &str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
            id: REQUEST_ID,
        }
    }
}

/// JSON-RPC 2.0 response object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Always "2.0"
    pub jsonrpc: String,
    /// Result on success (mutually exclusive with error)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error on failure (mutually exclusive with result)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RemoteError>,
    /// Request identifier (echoed from the request)
    pub id: Value,
}

/// JSON-RPC 2.0 error object carried in an error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

/// JSON-RPC notification: a push message with a method but no id.
///
/// The remote server uses these for one-way event delivery; no response is
/// ever sent back.
#[derive(Debug, Clone, Deserialize)]
pub struct Notification {
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_request() {
        let req = Request::new(
            "minecraft:server/status",
            Some(serde_json::json!([{"name": "Steve"}])),
        );
        let json = serde_json::to_string(&req).unwrap();

        assert!(json.contains(r#""jsonrpc":"2.0""#));
        assert!(json.contains(r#""method":"minecraft:server/status""#));
        assert!(json.contains(r#""id":1"#));
    }

    #[test]
    fn request_without_params_omits_field() {
        let req = Request::new("rpc.discover", None);
        let json = serde_json::to_string(&req).unwrap();

        assert!(!json.contains("params"));
    }

    #[test]
    fn parse_success_response() {
        let json = r#"{"jsonrpc":"2.0","result":{"started":true},"id":1}"#;
        let resp: Response = serde_json::from_str(json).unwrap();

        assert_eq!(resp.id, REQUEST_ID);
        assert!(resp.error.is_none());
        assert_eq!(resp.result.unwrap()["started"], true);
    }

    #[test]
    fn parse_error_response() {
        let json = r#"{"jsonrpc":"2.0","error":{"code":-32601,"message":"Method not found"},"id":1}"#;
        let resp: Response = serde_json::from_str(json).unwrap();

        let err = resp.error.unwrap();
        assert_eq!(err.code, -32601);
        assert!(err.to_string().contains("Method not found"));
    }

    #[test]
    fn parse_notification() {
        let json = r#"{"method":"notification:players/joined","params":[{"name":"Steve"}]}"#;
        let note: Notification = serde_json::from_str(json).unwrap();

        assert_eq!(note.method, "notification:players/joined");
        assert_eq!(note.params[0]["name"], "Steve");
    }
}
