//! Typed wrappers over the raw RPC client.
//!
//! One method per remote operation the command surface exposes. Param shapes
//! follow the management protocol: batch operations wrap their payload in a
//! one-element list, player references nest under a `player` object.

use std::collections::HashMap;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::client::{RpcClient, RpcError};
use crate::registry::ServerAddress;

pub mod methods {
    pub const DISCOVER: &str = "rpc.discover";
    pub const SERVER_STATUS: &str = "minecraft:server/status";
    pub const SERVER_STOP: &str = "minecraft:server/stop";
    pub const SYSTEM_MESSAGE: &str = "minecraft:server/system_message";
    pub const PLAYERS: &str = "minecraft:players";
    pub const PLAYERS_KICK: &str = "minecraft:players/kick";
    pub const BANS: &str = "minecraft:bans";
    pub const BANS_ADD: &str = "minecraft:bans/add";
    pub const BANS_REMOVE: &str = "minecraft:bans/remove";
    pub const BANS_CLEAR: &str = "minecraft:bans/clear";
    pub const IP_BANS: &str = "minecraft:ip_bans";
    pub const ALLOWLIST: &str = "minecraft:allowlist";
    pub const ALLOWLIST_ADD: &str = "minecraft:allowlist/add";
    pub const ALLOWLIST_REMOVE: &str = "minecraft:allowlist/remove";
    pub const ALLOWLIST_CLEAR: &str = "minecraft:allowlist/clear";
    pub const OPERATORS: &str = "minecraft:operators";
    pub const OPERATORS_ADD: &str = "minecraft:operators/add";
    pub const OPERATORS_REMOVE: &str = "minecraft:operators/remove";
    pub const GAMERULES: &str = "minecraft:gamerules";
    pub const GAMERULES_UPDATE: &str = "minecraft:gamerules/update";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub protocol: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerStatus {
    #[serde(default)]
    pub started: bool,
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub version: Option<Version>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserBan {
    pub player: Player,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operator {
    pub player: Player,
    #[serde(default, rename = "permissionLevel")]
    pub permission_level: Option<u8>,
    #[serde(default, rename = "bypassesPlayerLimit")]
    pub bypasses_player_limit: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gamerule {
    /// Some protocol versions name this field `name` instead of `key`.
    #[serde(alias = "name")]
    pub key: String,
    pub value: Value,
}

/// Aggregated snapshot produced by [`ServerApi::full_status`].
#[derive(Debug, Clone, Default)]
pub struct FullStatus {
    pub status: ServerStatus,
    pub operators: Vec<Operator>,
    pub bans: Vec<UserBan>,
    pub allowlist: Vec<Player>,
    /// `serversettings` values keyed by setting name; settings whose fetch
    /// failed are simply absent.
    pub settings: HashMap<String, Value>,
}

/// Settings gathered by `full_status`, matching what the remote exposes
/// under `minecraft:serversettings/<key>`.
const STATUS_SETTINGS: [&str; 19] = [
    "motd",
    "difficulty",
    "game_mode",
    "max_players",
    "autosave",
    "use_allowlist",
    "enforce_allowlist",
    "allow_flight",
    "force_game_mode",
    "view_distance",
    "simulation_distance",
    "spawn_protection_radius",
    "player_idle_timeout",
    "pause_when_empty_seconds",
    "entity_broadcast_range",
    "operator_user_permission_level",
    "hide_online_players",
    "accept_transfers",
    "status_replies",
];

/// Command-level API for a single remote server.
#[derive(Debug, Clone)]
pub struct ServerApi {
    client: RpcClient,
    addr: ServerAddress,
}

impl ServerApi {
    pub fn new(client: RpcClient, addr: ServerAddress) -> Self {
        Self { client, addr }
    }

    pub async fn status(&self) -> Result<ServerStatus, RpcError> {
        self.client
            .call_as(&self.addr, methods::SERVER_STATUS, None)
            .await
    }

    pub async fn stop(&self) -> Result<Value, RpcError> {
        self.client.call(&self.addr, methods::SERVER_STOP, None).await
    }

    /// Broadcast a system message to all connected players.
    pub async fn broadcast(&self, message: &str) -> Result<Value, RpcError> {
        let payload = json!([{
            "message": {"literal": message},
            "overlay": false,
            "receivingPlayers": [],
        }]);
        self.client
            .call(&self.addr, methods::SYSTEM_MESSAGE, Some(payload))
            .await
    }

    pub async fn players(&self) -> Result<Vec<Player>, RpcError> {
        self.client.call_as(&self.addr, methods::PLAYERS, None).await
    }

    pub async fn kick(&self, player: &str, reason: &str) -> Result<Value, RpcError> {
        let payload = json!([{
            "players": [{"name": player}],
            "message": {"literal": reason},
        }]);
        self.client
            .call(&self.addr, methods::PLAYERS_KICK, Some(payload))
            .await
    }

    pub async fn bans(&self) -> Result<Vec<UserBan>, RpcError> {
        self.client.call_as(&self.addr, methods::BANS, None).await
    }

    pub async fn ip_bans(&self) -> Result<Vec<Value>, RpcError> {
        self.client.call_as(&self.addr, methods::IP_BANS, None).await
    }

    pub async fn ban(&self, player: &str, reason: &str) -> Result<Value, RpcError> {
        let payload = json!([[{"player": {"name": player}, "reason": reason}]]);
        self.client
            .call(&self.addr, methods::BANS_ADD, Some(payload))
            .await
    }

    pub async fn unban(&self, player: &str) -> Result<Value, RpcError> {
        let payload = json!([[{"name": player}]]);
        self.client
            .call(&self.addr, methods::BANS_REMOVE, Some(payload))
            .await
    }

    pub async fn clear_bans(&self) -> Result<Value, RpcError> {
        self.client.call(&self.addr, methods::BANS_CLEAR, None).await
    }

    pub async fn allowlist(&self) -> Result<Vec<Player>, RpcError> {
        self.client.call_as(&self.addr, methods::ALLOWLIST, None).await
    }

    pub async fn allowlist_add(&self, player: &str) -> Result<Value, RpcError> {
        let payload = json!([[{"name": player}]]);
        self.client
            .call(&self.addr, methods::ALLOWLIST_ADD, Some(payload))
            .await
    }

    pub async fn allowlist_remove(&self, player: &str) -> Result<Value, RpcError> {
        let payload = json!([[{"name": player}]]);
        self.client
            .call(&self.addr, methods::ALLOWLIST_REMOVE, Some(payload))
            .await
    }

    pub async fn allowlist_clear(&self) -> Result<Value, RpcError> {
        self.client
            .call(&self.addr, methods::ALLOWLIST_CLEAR, None)
            .await
    }

    pub async fn operators(&self) -> Result<Vec<Operator>, RpcError> {
        self.client.call_as(&self.addr, methods::OPERATORS, None).await
    }

    pub async fn op(&self, player: &str, permission_level: u8) -> Result<Value, RpcError> {
        let payload = json!([[{
            "player": {"name": player},
            "permissionLevel": permission_level,
            "bypassesPlayerLimit": true,
        }]]);
        self.client
            .call(&self.addr, methods::OPERATORS_ADD, Some(payload))
            .await
    }

    pub async fn deop(&self, player: &str) -> Result<Value, RpcError> {
        let payload = json!([[{"name": player}]]);
        self.client
            .call(&self.addr, methods::OPERATORS_REMOVE, Some(payload))
            .await
    }

    pub async fn gamerules(&self) -> Result<Vec<Gamerule>, RpcError> {
        self.client.call_as(&self.addr, methods::GAMERULES, None).await
    }

    pub async fn set_gamerule(&self, key: &str, value: &str) -> Result<Value, RpcError> {
        let payload = json!([{"key": key, "value": value}]);
        self.client
            .call(&self.addr, methods::GAMERULES_UPDATE, Some(payload))
            .await
    }

    /// Read a `server.properties`-backed setting.
    pub async fn setting(&self, key: &str) -> Result<Value, RpcError> {
        let method = format!("minecraft:serversettings/{}", key);
        self.client.call(&self.addr, &method, None).await
    }

    /// Write a `server.properties`-backed setting. The value is positional.
    pub async fn set_setting(&self, key: &str, value: Value) -> Result<Value, RpcError> {
        let method = format!("minecraft:serversettings/{}/set", key);
        self.client.call(&self.addr, &method, Some(json!([value]))).await
    }

    /// Gather the complete server picture with concurrent calls.
    ///
    /// Calls may complete in any order; each result is correlated by call,
    /// not by arrival. Only the core status call is required to succeed.
    pub async fn full_status(&self) -> Result<FullStatus, RpcError> {
        let (status, operators, bans, allowlist) =
            tokio::join!(self.status(), self.operators(), self.bans(), self.allowlist());

        let values = join_all(STATUS_SETTINGS.iter().map(|key| self.setting(key))).await;
        let mut settings = HashMap::new();
        for (key, value) in STATUS_SETTINGS.iter().zip(values) {
            if let Ok(value) = value {
                settings.insert((*key).to_string(), value);
            }
        }

        Ok(FullStatus {
            status: status?,
            operators: operators.unwrap_or_default(),
            bans: bans.unwrap_or_default(),
            allowlist: allowlist.unwrap_or_default(),
            settings,
        })
    }
}
