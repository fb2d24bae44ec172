use std::sync::Arc;

use crate::config::{AppConfig, NotificationPrefs};
use crate::registry::ServerRegistry;
use crate::sink::ChannelSink;

/// Shared handles passed into the supervisor.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub registry: Arc<dyn ServerRegistry>,
    pub prefs: Arc<NotificationPrefs>,
    pub sink: Arc<dyn ChannelSink>,
}

impl AppContext {
    pub fn new(
        config: AppConfig,
        registry: Arc<dyn ServerRegistry>,
        sink: Arc<dyn ChannelSink>,
    ) -> Self {
        let prefs = Arc::new(NotificationPrefs::new(config.notifications.clone()));
        Self {
            config: Arc::new(config),
            registry,
            prefs,
            sink,
        }
    }
}
