//! Registered remote servers.
//!
//! The supervisor only ever borrows a snapshot per operation; long-term
//! ownership of server records stays behind the `ServerRegistry` trait so a
//! persistent store can be swapped in without touching the core.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::sink::ChannelId;

/// host:port of a remote management endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerAddress {
    pub host: String,
    pub port: u16,
}

impl ServerAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// A managed remote server: unique name, management address, and the channel
/// its event notices go to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteServerRef {
    pub name: String,
    pub address: ServerAddress,
    pub channel: ChannelId,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("server name `{0}` is already taken")]
    NameTaken(String),
}

/// Lookup interface the core consumes.
#[async_trait]
pub trait ServerRegistry: Send + Sync {
    async fn resolve_name(&self, name: &str) -> Option<RemoteServerRef>;
    async fn resolve_channel(&self, channel: ChannelId) -> Option<RemoteServerRef>;
    async fn all(&self) -> Vec<RemoteServerRef>;
}

/// In-memory registry, seeded from config at startup.
#[derive(Default)]
pub struct MemoryRegistry {
    inner: RwLock<HashMap<String, RemoteServerRef>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a server. Names are unique; a duplicate is rejected.
    pub async fn add(&self, server: RemoteServerRef) -> Result<(), RegistryError> {
        let mut map = self.inner.write().await;
        if map.contains_key(&server.name) {
            return Err(RegistryError::NameTaken(server.name));
        }
        map.insert(server.name.clone(), server);
        Ok(())
    }

    /// Remove a server. Returns false if the name was not registered.
    pub async fn remove(&self, name: &str) -> bool {
        self.inner.write().await.remove(name).is_some()
    }

    /// Update the address and/or channel of an existing server.
    pub async fn edit(
        &self,
        name: &str,
        address: Option<ServerAddress>,
        channel: Option<ChannelId>,
    ) -> bool {
        let mut map = self.inner.write().await;
        match map.get_mut(name) {
            Some(server) => {
                if let Some(address) = address {
                    server.address = address;
                }
                if let Some(channel) = channel {
                    server.channel = channel;
                }
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl ServerRegistry for MemoryRegistry {
    async fn resolve_name(&self, name: &str) -> Option<RemoteServerRef> {
        self.inner.read().await.get(name).cloned()
    }

    async fn resolve_channel(&self, channel: ChannelId) -> Option<RemoteServerRef> {
        self.inner
            .read()
            .await
            .values()
            .find(|server| server.channel == channel)
            .cloned()
    }

    async fn all(&self) -> Vec<RemoteServerRef> {
        self.inner.read().await.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(name: &str, channel: u64) -> RemoteServerRef {
        RemoteServerRef {
            name: name.to_string(),
            address: ServerAddress::new("10.0.0.5", 25585),
            channel: ChannelId(channel),
        }
    }

    #[tokio::test]
    async fn add_rejects_duplicate_names() {
        let registry = MemoryRegistry::new();

        registry.add(server("Alpha", 1)).await.unwrap();
        let err = registry.add(server("Alpha", 2)).await.unwrap_err();

        assert!(matches!(err, RegistryError::NameTaken(name) if name == "Alpha"));
    }

    #[tokio::test]
    async fn resolve_by_name_and_channel() {
        let registry = MemoryRegistry::new();
        registry.add(server("Alpha", 42)).await.unwrap();

        assert_eq!(registry.resolve_name("Alpha").await.unwrap().channel, ChannelId(42));
        assert_eq!(
            registry.resolve_channel(ChannelId(42)).await.unwrap().name,
            "Alpha"
        );
        assert!(registry.resolve_name("Beta").await.is_none());
        assert!(registry.resolve_channel(ChannelId(7)).await.is_none());
    }

    #[tokio::test]
    async fn edit_updates_address_and_channel() {
        let registry = MemoryRegistry::new();
        registry.add(server("Alpha", 1)).await.unwrap();

        assert!(
            registry
                .edit("Alpha", Some(ServerAddress::new("10.0.0.6", 25586)), None)
                .await
        );
        let updated = registry.resolve_name("Alpha").await.unwrap();
        assert_eq!(updated.address.port, 25586);
        assert_eq!(updated.channel, ChannelId(1));

        assert!(!registry.edit("Beta", None, Some(ChannelId(9))).await);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let registry = MemoryRegistry::new();
        registry.add(server("Alpha", 1)).await.unwrap();

        assert!(registry.remove("Alpha").await);
        assert!(!registry.remove("Alpha").await);
        assert!(registry.all().await.is_empty());
    }
}
