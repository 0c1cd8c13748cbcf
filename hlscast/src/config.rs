//! Configuration types and defaults

use crate::{CaptureConfig, DeviceConstraints, MediaError, PlaybackConfig};

/// Default `tracing` filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "hlscast=info,hlscast_media=info,hlscast_signaling=info";

/// Global hlscast configuration
#[derive(Debug, Clone)]
pub struct GlobalConfig {
    /// Enable debug logging
    pub debug_logging: bool,
    /// Backend WebSocket URL used when a session is not given an explicit channel
    pub signaling_url: Option<String>,
    /// Capture settings for new sessions
    pub capture: CaptureConfig,
    /// Device constraints for new sessions
    pub constraints: DeviceConstraints,
    /// Playback settings for new sessions
    pub playback: PlaybackConfig,
    /// Capacity of a session's observer event channel
    pub session_event_capacity: usize,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            debug_logging: false,
            signaling_url: None,
            capture: CaptureConfig::default(),
            constraints: DeviceConstraints::fixed(),
            playback: PlaybackConfig::default(),
            session_event_capacity: 256,
        }
    }
}

impl GlobalConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), MediaError> {
        self.capture.validate()?;
        self.constraints.validate()?;
        self.playback.validate()?;
        if self.session_event_capacity == 0 {
            return Err(MediaError::InvalidConfiguration {
                message: "Session event capacity must be > 0".to_string(),
            });
        }
        if matches!(&self.signaling_url, Some(url) if url.is_empty()) {
            return Err(MediaError::InvalidConfiguration {
                message: "Signaling URL must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// `tracing` filter directive matching `debug_logging`
    pub fn log_filter(&self) -> &'static str {
        if self.debug_logging {
            "hlscast=debug,hlscast_media=debug,hlscast_signaling=debug"
        } else {
            DEFAULT_LOG_FILTER
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_config_is_valid() {
        let config = GlobalConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.log_filter(), DEFAULT_LOG_FILTER);
        assert_eq!(config.constraints, DeviceConstraints::fixed());
    }

    #[test]
    fn test_invalid_nested_config() {
        let mut config = GlobalConfig::default();
        config.capture.chunk_interval = Duration::ZERO;
        assert!(config.validate().is_err());

        let config = GlobalConfig {
            signaling_url: Some(String::new()),
            ..GlobalConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MediaError::InvalidConfiguration { .. })
        ));
    }
}
