use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::ConfigError;

/// Server settings, from flags or `COMPANION_*` environment variables.
#[derive(Debug, Clone, Parser)]
#[command(name = "ti4-companion")]
#[command(about = "Session companion server: phases, turn order and turn timers")]
pub struct ServerConfig {
    /// Address the HTTP/WebSocket server listens on
    #[arg(long, env = "COMPANION_BIND", default_value = "127.0.0.1:8000")]
    pub bind: SocketAddr,

    /// Where the session blob is stored
    #[arg(long, env = "COMPANION_STATE_FILE", default_value = "ti4-companion-state.json")]
    pub state_file: PathBuf,

    /// Clock tick interval in milliseconds
    #[arg(long, env = "COMPANION_TICK_MS", default_value_t = 100)]
    pub tick_ms: u64,

    /// Keep the session in memory only
    #[arg(long, env = "COMPANION_NO_PERSIST")]
    pub no_persist: bool,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "tick_ms".to_string(),
                details: "must be greater than zero".to_string(),
            });
        }
        if !self.no_persist && self.state_file.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "state_file".to_string(),
                details: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ServerConfig::parse_from(["ti4-companion"]);
        assert_eq!(config.tick_ms, 100);
        assert!(!config.no_persist);
        assert!(config.validate().is_ok());
        assert_eq!(config.tick_interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_zero_tick_is_rejected() {
        let config = ServerConfig::parse_from(["ti4-companion", "--tick-ms", "0", "--no-persist"]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "tick_ms"
        ));
    }
}
