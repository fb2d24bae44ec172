//! Outbound notice delivery.
//!
//! The core renders events into `Notice`s and hands them to a `ChannelSink`;
//! what a "channel" actually is (Discord channel, webhook, test recorder) is
//! the sink implementation's business.

mod webhook;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use webhook::WebhookSink;

/// Identifier of a destination channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A rendered, human-readable alert.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub title: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
}

impl Notice {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Delivery collaborator. Implementations must not assume delivery succeeds;
/// the router logs and drops failures.
#[async_trait]
pub trait ChannelSink: Send + Sync {
    async fn deliver(&self, channel: ChannelId, notice: Notice) -> anyhow::Result<()>;
}
