//! Server configuration.

use std::time::Duration;

use crate::NoughtsError;

/// Environment variable holding the listen address.
pub const BIND_ENV: &str = "NOUGHTS_BIND";

/// Environment variable holding the keepalive ping interval in whole seconds.
pub const PING_INTERVAL_ENV: &str = "NOUGHTS_PING_INTERVAL_SECS";

/// Runtime settings for a [`NoughtsServer`](crate::NoughtsServer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the listener binds to, e.g. `"0.0.0.0:8080"`.
    pub bind_addr: String,

    /// How often the server pings each connection. A silent client keeps
    /// its seat; only a ping or send that fails on the transport ends the
    /// connection.
    pub ping_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            ping_interval: Duration::from_secs(30),
        }
    }
}

impl ServerConfig {
    /// Reads overrides from `NOUGHTS_BIND` and `NOUGHTS_PING_INTERVAL_SECS`.
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    /// [`NoughtsError::Config`] if a variable is set but unusable.
    pub fn from_env() -> Result<Self, NoughtsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading through `lookup` instead
    /// of the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, NoughtsError> {
        let mut config = Self::default();

        if let Some(addr) = lookup(BIND_ENV) {
            let addr = addr.trim();
            if addr.is_empty() {
                return Err(NoughtsError::Config(format!("{BIND_ENV} is empty")));
            }
            config.bind_addr = addr.to_string();
        }

        if let Some(secs) = lookup(PING_INTERVAL_ENV) {
            let secs: u64 = secs.trim().parse().map_err(|e| {
                NoughtsError::Config(format!("{PING_INTERVAL_ENV}={secs:?}: {e}"))
            })?;
            if secs == 0 {
                return Err(NoughtsError::Config(format!(
                    "{PING_INTERVAL_ENV} must be at least 1"
                )));
            }
            config.ping_interval = Duration::from_secs(secs);
        }

        Ok(config)
    }
}
