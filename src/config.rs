//! Client configuration from the environment

use crate::state_machine::ConnContext;
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8000/ws";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a ws:// or wss:// URL, got {value:?}")]
    InvalidEndpoint { var: &'static str, value: String },
    #[error("{var} must be a boolean, got {value:?}")]
    InvalidBool { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base WebSocket endpoint; the client id is appended per session
    pub endpoint: String,
    /// Connect on startup instead of waiting for `/connect`
    pub autoconnect: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            autoconnect: false,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (the environment in production)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(endpoint) = lookup("CONTACT_CHAT_ENDPOINT") {
            if !(endpoint.starts_with("ws://") || endpoint.starts_with("wss://")) {
                return Err(ConfigError::InvalidEndpoint {
                    var: "CONTACT_CHAT_ENDPOINT",
                    value: endpoint,
                });
            }
            config.endpoint = endpoint;
        }

        if let Some(value) = lookup("CONTACT_CHAT_AUTOCONNECT") {
            config.autoconnect = match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" | "" => false,
                _ => {
                    return Err(ConfigError::InvalidBool {
                        var: "CONTACT_CHAT_AUTOCONNECT",
                        value,
                    })
                }
            };
        }

        Ok(config)
    }

    pub fn context(&self) -> ConnContext {
        ConnContext::new(self.endpoint.clone())
    }
}
