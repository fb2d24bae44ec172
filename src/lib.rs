//! craftbridge: an RPC/event bridge for remote game servers.
//!
//! Issues JSON-RPC calls over per-call WebSockets, keeps one persistent
//! listening connection per managed server for push notifications, and
//! supervises the set of active connections. Command parsing, permissions,
//! and persistence live outside this crate behind the `registry` and `sink`
//! collaborator traits.

pub mod config;
pub mod context;
pub mod core;
pub mod logging;
pub mod registry;
pub mod rpc;
pub mod sink;
