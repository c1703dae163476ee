use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Errors in a turn configuration
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },
}

/// Timing configuration for a turn session
///
/// All values are milliseconds. Keys are camelCase on the wire and every key
/// is optional, falling back to the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct TurnConfig {
    /// How long a participant may hold the turn
    pub turn_timeout_ms: u64,

    /// Cadence of the liveness check
    pub heartbeat_check_interval_ms: u64,

    /// Silence after which a participant counts as unreachable
    pub disconnect_threshold_ms: u64,

    /// Wait after the active participant drops before handing the turn off
    pub reconnect_grace_ms: u64,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            turn_timeout_ms: 30_000,
            heartbeat_check_interval_ms: 5_000,
            disconnect_threshold_ms: 15_000,
            reconnect_grace_ms: 5_000,
        }
    }
}

impl TurnConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_turn_timeout(mut self, ms: u64) -> Self {
        self.turn_timeout_ms = ms;
        self
    }

    pub fn with_heartbeat_check_interval(mut self, ms: u64) -> Self {
        self.heartbeat_check_interval_ms = ms;
        self
    }

    pub fn with_disconnect_threshold(mut self, ms: u64) -> Self {
        self.disconnect_threshold_ms = ms;
        self
    }

    pub fn with_reconnect_grace(mut self, ms: u64) -> Self {
        self.reconnect_grace_ms = ms;
        self
    }

    pub fn turn_timeout(&self) -> Duration {
        Duration::from_millis(self.turn_timeout_ms)
    }

    pub fn heartbeat_check_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_check_interval_ms)
    }

    pub fn disconnect_threshold(&self) -> Duration {
        Duration::from_millis(self.disconnect_threshold_ms)
    }

    pub fn reconnect_grace(&self) -> Duration {
        Duration::from_millis(self.reconnect_grace_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("turnTimeoutMs", self.turn_timeout_ms),
            ("heartbeatCheckIntervalMs", self.heartbeat_check_interval_ms),
            ("disconnectThresholdMs", self.disconnect_threshold_ms),
            ("reconnectGraceMs", self.reconnect_grace_ms),
        ];

        match fields.iter().find(|(_, value)| *value == 0) {
            Some((field, _)) => Err(ConfigError::ZeroDuration { field: *field }),
            None => Ok(()),
        }
    }
}
