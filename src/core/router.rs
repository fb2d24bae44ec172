//! Routes decoded events to their destination channel.
//!
//! Each event passes a per-kind preference gate, gets rendered into a
//! notice, and is handed to the sink. Delivery is fire-and-forget: a failed
//! delivery is logged and never reaches the listener loop.

use std::sync::Arc;

use tracing::{trace, warn};

use crate::config::NotificationPrefs;
use crate::core::event::DomainEvent;
use crate::sink::{ChannelId, ChannelSink, Notice};

pub struct EventRouter {
    prefs: Arc<NotificationPrefs>,
    sink: Arc<dyn ChannelSink>,
}

impl EventRouter {
    pub fn new(prefs: Arc<NotificationPrefs>, sink: Arc<dyn ChannelSink>) -> Self {
        Self { prefs, sink }
    }

    /// Dispatch one event for `server_name` to `channel`.
    pub async fn route(&self, server_name: &str, event: DomainEvent, channel: ChannelId) {
        if !self.prefs.enabled(event.kind()) {
            trace!(server = server_name, kind = event.kind().key(), "event kind disabled");
            return;
        }
        let notice = render(server_name, &event);
        self.deliver(channel, notice).await;
    }

    /// Deliver a lifecycle notice that bypasses the preference gate
    /// (listening started, connection lost, connect failed).
    pub async fn plain(&self, channel: ChannelId, title: &str, body: impl Into<String>) {
        self.deliver(channel, Notice::new(title, body)).await;
    }

    async fn deliver(&self, channel: ChannelId, notice: Notice) {
        if let Err(e) = self.sink.deliver(channel, notice).await {
            warn!(channel = %channel, error = %e, "notice delivery failed");
        }
    }
}

fn render(server: &str, event: &DomainEvent) -> Notice {
    match event {
        DomainEvent::PlayerJoined { name } => Notice::new(
            "Player Joined",
            format!("`{}` joined **{}**", name, server),
        ),
        DomainEvent::PlayerLeft { name } => {
            Notice::new("Player Left", format!("`{}` left **{}**", name, server))
        }
        DomainEvent::BanAdded { player } => {
            Notice::new("Player Banned", format!("`{}` was banned.", player))
        }
        DomainEvent::BanRemoved { name } => {
            Notice::new("Player Unbanned", format!("`{}` was unbanned.", name))
        }
        DomainEvent::AllowlistAdded { name } => Notice::new(
            "Allowlist Update",
            format!("`{}` added to allowlist.", name),
        ),
        DomainEvent::AllowlistRemoved { name } => Notice::new(
            "Allowlist Update",
            format!("`{}` removed from allowlist.", name),
        ),
        DomainEvent::OperatorAdded { player } => Notice::new(
            "Operator Granted",
            format!("`{}` is now an operator.", player),
        ),
        DomainEvent::OperatorRemoved { player } => Notice::new(
            "Operator Removed",
            format!("`{}` removed from operators.", player),
        ),
        DomainEvent::ServerStarted => Notice::new(
            "Server Started",
            format!("Server **{}** is now online.", server),
        ),
        DomainEvent::ServerStopping => Notice::new(
            "Server Stopping",
            format!("Server **{}** is shutting down.", server),
        ),
        DomainEvent::ServerSaving => {
            Notice::new("Saving World", format!("Server **{}** is saving.", server))
        }
        DomainEvent::ServerSaved => Notice::new(
            "World Saved",
            format!("Server **{}** finished saving.", server),
        ),
        DomainEvent::Heartbeat { players } => {
            let roster = if players.is_empty() {
                "no players".to_string()
            } else {
                players.join(", ")
            };
            Notice::new(
                "Server Heartbeat",
                format!(
                    "Server **{}** is alive. Players online: **{}** ({})",
                    server,
                    players.len(),
                    roster
                ),
            )
        }
        DomainEvent::GameruleUpdated { key, value } => Notice::new(
            "Gamerule Updated",
            format!("`{}` set to `{}`", key, value),
        ),
    }
}
