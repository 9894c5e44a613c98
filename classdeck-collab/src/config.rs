use std::path::PathBuf;
use std::time::Duration;

use crate::supervisor::ReconnectPolicy;

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// WebSocket server URL (None = never dial)
    pub server_url: Option<String>,
    /// Opaque user id stamped on every request
    pub user_id: String,
    /// Channel name stamped on every request
    pub channel_name: String,
    /// Optional class name sent with the requirements
    pub class_name: Option<String>,
    /// Reconnect attempts before giving up
    pub max_reconnect_attempts: u32,
    /// Base reconnect delay; attempt n waits n times this
    pub reconnect_base_delay: Duration,
    /// Delay before the first connect
    pub startup_delay: Duration,
    /// Directory holding persisted settings
    pub settings_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            user_id: "user-123".to_string(),
            channel_name: "powerpoint-taskpane".to_string(),
            class_name: None,
            max_reconnect_attempts: 3,
            reconnect_base_delay: Duration::from_millis(2000),
            startup_delay: Duration::from_millis(500),
            settings_dir: PathBuf::from(".classdeck"),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `CLASSDECK_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns. Unparseable
    /// numbers are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let value = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = value("CLASSDECK_WS_URL") {
            config.server_url = Some(url);
        }
        if let Some(user) = value("CLASSDECK_USER_ID") {
            config.user_id = user;
        }
        if let Some(channel) = value("CLASSDECK_CHANNEL") {
            config.channel_name = channel;
        }
        if let Some(class_name) = value("CLASSDECK_CLASS_NAME") {
            config.class_name = Some(class_name);
        }
        if let Some(raw) = value("CLASSDECK_MAX_RECONNECTS") {
            match raw.parse() {
                Ok(n) => config.max_reconnect_attempts = n,
                Err(_) => log::warn!("Ignoring CLASSDECK_MAX_RECONNECTS={raw}"),
            }
        }
        if let Some(raw) = value("CLASSDECK_RECONNECT_DELAY_MS") {
            match raw.parse() {
                Ok(ms) => config.reconnect_base_delay = Duration::from_millis(ms),
                Err(_) => log::warn!("Ignoring CLASSDECK_RECONNECT_DELAY_MS={raw}"),
            }
        }
        if let Some(dir) = value("CLASSDECK_SETTINGS_DIR") {
            config.settings_dir = PathBuf::from(dir);
        }
        config
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            max_attempts: self.max_reconnect_attempts,
            base_delay: self.reconnect_base_delay,
        }
    }
}
