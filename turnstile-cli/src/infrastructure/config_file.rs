use crate::infrastructure::error::{CliError, Result};
use clap::Args;
use std::path::Path;
use turnstile_core::TurnConfig;

/// Command line overrides for individual config values
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigOverrides {
    /// How long a participant may hold the turn (ms)
    #[arg(long)]
    pub turn_timeout_ms: Option<u64>,

    /// Cadence of the liveness check (ms)
    #[arg(long)]
    pub heartbeat_check_interval_ms: Option<u64>,

    /// Silence before a participant counts as unreachable (ms)
    #[arg(long)]
    pub disconnect_threshold_ms: Option<u64>,

    /// Wait before handing off a dropped participant's turn (ms)
    #[arg(long)]
    pub reconnect_grace_ms: Option<u64>,
}

impl ConfigOverrides {
    pub fn apply(&self, mut config: TurnConfig) -> TurnConfig {
        if let Some(ms) = self.turn_timeout_ms {
            config = config.with_turn_timeout(ms);
        }
        if let Some(ms) = self.heartbeat_check_interval_ms {
            config = config.with_heartbeat_check_interval(ms);
        }
        if let Some(ms) = self.disconnect_threshold_ms {
            config = config.with_disconnect_threshold(ms);
        }
        if let Some(ms) = self.reconnect_grace_ms {
            config = config.with_reconnect_grace(ms);
        }
        config
    }
}

/// Effective config: file values (if any) over defaults, then overrides
pub fn load_config(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<TurnConfig> {
    let base = match path {
        Some(path) => {
            if !path.is_file() {
                return Err(CliError::config_not_found(path.to_path_buf()));
            }
            let raw = std::fs::read_to_string(path)?;
            let config: TurnConfig = serde_json::from_str(&raw)?;
            tracing::debug!("Loaded config from {}", path.display());
            config
        }
        None => TurnConfig::default(),
    };

    let config = overrides.apply(base);
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let config = load_config(None, &ConfigOverrides::default()).unwrap();
        assert_eq!(config, TurnConfig::default());
    }

    #[test]
    fn test_file_then_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"turnTimeoutMs": 20000, "reconnectGraceMs": 1000}}"#).unwrap();

        let overrides = ConfigOverrides {
            reconnect_grace_ms: Some(3_000),
            ..Default::default()
        };
        let config = load_config(Some(file.path()), &overrides).unwrap();

        assert_eq!(config.turn_timeout_ms, 20_000);
        assert_eq!(config.reconnect_grace_ms, 3_000);
        assert_eq!(config.disconnect_threshold_ms, 15_000);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");

        let result = load_config(Some(&path), &ConfigOverrides::default());
        assert!(matches!(result, Err(CliError::ConfigFileNotFound { .. })));
    }

    #[test]
    fn test_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let result = load_config(Some(file.path()), &ConfigOverrides::default());
        assert!(matches!(result, Err(CliError::Json(_))));
    }

    #[test]
    fn test_zero_override_rejected() {
        let overrides = ConfigOverrides {
            turn_timeout_ms: Some(0),
            ..Default::default()
        };

        let result = load_config(None, &overrides);
        assert!(matches!(result, Err(CliError::InvalidConfig(_))));
    }
}
