//! Domain events decoded from push notifications.
//!
//! The listener maps every inbound notification method to a closed set of
//! event variants at decode time; unknown methods decode to nothing and are
//! ignored upstream.

use serde_json::Value;

/// One occurrence on a remote server. Ephemeral: produced by the listener,
/// consumed by the router, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    PlayerJoined { name: String },
    PlayerLeft { name: String },
    BanAdded { player: String },
    BanRemoved { name: String },
    AllowlistAdded { name: String },
    AllowlistRemoved { name: String },
    OperatorAdded { player: String },
    OperatorRemoved { player: String },
    ServerStarted,
    ServerStopping,
    ServerSaving,
    ServerSaved,
    Heartbeat { players: Vec<String> },
    GameruleUpdated { key: String, value: String },
}

/// Event categories, one canonical preference key per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PlayersJoined,
    PlayersLeft,
    BansAdded,
    BansRemoved,
    AllowlistAdded,
    AllowlistRemoved,
    OperatorsAdded,
    OperatorsRemoved,
    ServerStarted,
    ServerStopping,
    ServerSaving,
    ServerSaved,
    ServerStatus,
    GamerulesUpdated,
}

impl EventKind {
    pub const ALL: [EventKind; 14] = [
        EventKind::PlayersJoined,
        EventKind::PlayersLeft,
        EventKind::BansAdded,
        EventKind::BansRemoved,
        EventKind::AllowlistAdded,
        EventKind::AllowlistRemoved,
        EventKind::OperatorsAdded,
        EventKind::OperatorsRemoved,
        EventKind::ServerStarted,
        EventKind::ServerStopping,
        EventKind::ServerSaving,
        EventKind::ServerSaved,
        EventKind::ServerStatus,
        EventKind::GamerulesUpdated,
    ];

    /// Canonical preference key for this kind.
    pub fn key(self) -> &'static str {
        match self {
            EventKind::PlayersJoined => "players_joined",
            EventKind::PlayersLeft => "players_left",
            EventKind::BansAdded => "bans_added",
            EventKind::BansRemoved => "bans_removed",
            EventKind::AllowlistAdded => "allowlist_added",
            EventKind::AllowlistRemoved => "allowlist_removed",
            EventKind::OperatorsAdded => "operators_added",
            EventKind::OperatorsRemoved => "operators_removed",
            EventKind::ServerStarted => "server_started",
            EventKind::ServerStopping => "server_stopping",
            EventKind::ServerSaving => "server_saving",
            EventKind::ServerSaved => "server_saved",
            EventKind::ServerStatus => "server_status",
            EventKind::GamerulesUpdated => "gamerules_updated",
        }
    }
}

impl DomainEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            DomainEvent::PlayerJoined { .. } => EventKind::PlayersJoined,
            DomainEvent::PlayerLeft { .. } => EventKind::PlayersLeft,
            DomainEvent::BanAdded { .. } => EventKind::BansAdded,
            DomainEvent::BanRemoved { .. } => EventKind::BansRemoved,
            DomainEvent::AllowlistAdded { .. } => EventKind::AllowlistAdded,
            DomainEvent::AllowlistRemoved { .. } => EventKind::AllowlistRemoved,
            DomainEvent::OperatorAdded { .. } => EventKind::OperatorsAdded,
            DomainEvent::OperatorRemoved { .. } => EventKind::OperatorsRemoved,
            DomainEvent::ServerStarted => EventKind::ServerStarted,
            DomainEvent::ServerStopping => EventKind::ServerStopping,
            DomainEvent::ServerSaving => EventKind::ServerSaving,
            DomainEvent::ServerSaved => EventKind::ServerSaved,
            DomainEvent::Heartbeat { .. } => EventKind::ServerStatus,
            DomainEvent::GameruleUpdated { .. } => EventKind::GamerulesUpdated,
        }
    }

    /// Decode a notification into an event.
    ///
    /// Returns `None` for unknown methods and for payloads missing the
    /// fields the method requires; callers treat both as a skipped message.
    /// Notification params arrive as a single-element list wrapping one
    /// object.
    pub fn from_notification(method: &str, params: &Value) -> Option<DomainEvent> {
        let body = params.get(0).unwrap_or(&Value::Null);

        match method {
            "notification:players/joined" => Some(DomainEvent::PlayerJoined {
                name: str_field(body, "name")?,
            }),
            "notification:players/left" => Some(DomainEvent::PlayerLeft {
                name: str_field(body, "name")?,
            }),
            "notification:bans/added" => Some(DomainEvent::BanAdded {
                player: player_name(body)?,
            }),
            "notification:bans/removed" => Some(DomainEvent::BanRemoved {
                name: str_field(body, "name")?,
            }),
            "notification:allowlist/added" => Some(DomainEvent::AllowlistAdded {
                name: str_field(body, "name")?,
            }),
            "notification:allowlist/removed" => Some(DomainEvent::AllowlistRemoved {
                name: str_field(body, "name")?,
            }),
            "notification:operators/added" => Some(DomainEvent::OperatorAdded {
                player: player_name(body)?,
            }),
            "notification:operators/removed" => Some(DomainEvent::OperatorRemoved {
                player: player_name(body)?,
            }),
            "notification:server/started" => Some(DomainEvent::ServerStarted),
            "notification:server/stopping" => Some(DomainEvent::ServerStopping),
            "notification:server/saving" => Some(DomainEvent::ServerSaving),
            "notification:server/saved" => Some(DomainEvent::ServerSaved),
            "notification:server/status" => {
                let players = body
                    .get("status")
                    .and_then(|status| status.get("players"))
                    .and_then(Value::as_array)
                    .map(|players| {
                        players
                            .iter()
                            .filter_map(|p| p.get("name").and_then(Value::as_str))
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();
                Some(DomainEvent::Heartbeat { players })
            }
            "notification:gamerules/updated" => {
                let rule = body.get("gamerule")?;
                // Older servers send `name` where newer ones send `key`.
                let key = rule
                    .get("key")
                    .or_else(|| rule.get("name"))?
                    .as_str()?
                    .to_string();
                let value = match rule.get("value") {
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => return None,
                };
                Some(DomainEvent::GameruleUpdated { key, value })
            }
            _ => None,
        }
    }
}

fn str_field(body: &Value, field: &str) -> Option<String> {
    body.get(field)?.as_str().map(str::to_string)
}

fn player_name(body: &Value) -> Option<String> {
    body.get("player")?.get("name")?.as_str().map(str::to_string)
}
