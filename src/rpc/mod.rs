//! JSON-RPC client layer for remote management servers.
//!
//! ## Architecture
//!
//! - `protocol`: JSON-RPC 2.0 request/response/notification types
//! - `client`: one-shot call over a fresh WebSocket, bounded by a timeout
//! - `api`: typed method wrappers consumed by the command surface
//!
//! Persistent connections (for push notifications) live in `core::listener`;
//! this module only covers the request/response side.

pub mod api;
pub mod client;
pub mod protocol;

pub use api::{FullStatus, Gamerule, Operator, Player, ServerApi, ServerStatus, UserBan};
pub use client::{RpcClient, RpcError};
pub use protocol::{Notification, RemoteError, Request, Response};
