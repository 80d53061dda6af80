//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::gateway::GatewayConfig;
use crate::gateway::mock::DEFAULT_MOCK_DELAY;

/// Copilot configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct CopilotConfig {
    /// Gateway selection and endpoint.
    pub gateway: GatewayConfig,
    /// Directory holding the durable state slot.
    pub state_dir: PathBuf,
    /// Directory exported plans are written to.
    pub export_dir: PathBuf,
}

impl Default for CopilotConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            state_dir: PathBuf::from("./data"),
            export_dir: PathBuf::from("."),
        }
    }
}

impl CopilotConfig {
    /// Build config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// `COPILOT_USE_MOCK` enables the mock only when it is exactly `true`
    /// (and when unset); any other value selects the remote backend.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_base_url = lookup("COPILOT_API_BASE_URL")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.gateway.api_base_url);

        let use_mock = lookup("COPILOT_USE_MOCK")
            .map(|s| s.trim() == "true")
            .unwrap_or(true);

        let mock_delay = match lookup("COPILOT_MOCK_DELAY_MS") {
            Some(raw) => {
                let ms: u64 = raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
                    key: "COPILOT_MOCK_DELAY_MS".to_string(),
                    message: format!("{raw:?} is not a number of milliseconds: {e}"),
                })?;
                Duration::from_millis(ms)
            }
            None => DEFAULT_MOCK_DELAY,
        };

        let state_dir = lookup("COPILOT_STATE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.state_dir);
        let export_dir = lookup("COPILOT_EXPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.export_dir);

        Ok(Self {
            gateway: GatewayConfig {
                use_mock,
                api_base_url,
                mock_delay,
            },
            state_dir,
            export_dir,
        })
    }
}
