// Where and how long to wait for kuryr-daemon.

use std::env;
use std::time::Duration;

use log::debug;
use serde_json::Value;

use crate::error::{KuryrError, KuryrResult, ERR_INVALID_NETWORK_CONFIG};

// Default kuryr-daemon bind address.
pub const DEFAULT_DAEMON_URL: &str = "http://127.0.0.1:5036";
// Seconds until a request to the daemon is given up.
pub const DEFAULT_TIMEOUT: u64 = 180;

pub const DAEMON_URL_ENV: &str = "KURYR_DAEMON_URL";
pub const DAEMON_TIMEOUT_ENV: &str = "KURYR_DAEMON_TIMEOUT";

/// Key of the daemon section in the network configuration.
pub const CONFIG_KEY: &str = "daemon";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DaemonConfig {
    /// Base URL the endpoint paths are appended to.
    pub url: String,
    /// None waits forever.
    pub timeout: Option<Duration>,
}

/// Optional `"daemon": {...}` section of the network configuration.
#[derive(Debug, Default, Deserialize)]
struct DaemonSection {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    timeout: Option<u64>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        DaemonConfig {
            url: DEFAULT_DAEMON_URL.to_string(),
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT)),
        }
    }
}

impl DaemonConfig {
    /// Build the config from the process environment and the network
    /// configuration, the environment wins.
    pub fn load(network_config: &Value) -> KuryrResult<Self> {
        Self::resolve(
            network_config,
            env::var(DAEMON_URL_ENV).ok(),
            env::var(DAEMON_TIMEOUT_ENV).ok(),
        )
    }

    pub fn resolve(
        network_config: &Value,
        env_url: Option<String>,
        env_timeout: Option<String>,
    ) -> KuryrResult<Self> {
        let section: DaemonSection = match network_config.get(CONFIG_KEY) {
            None | Some(Value::Null) => DaemonSection::default(),
            Some(v) => serde_json::from_value(v.clone()).map_err(|e| {
                KuryrError::code(
                    ERR_INVALID_NETWORK_CONFIG,
                    format!("invalid {:?} section in network configuration: {}", CONFIG_KEY, e),
                )
            })?,
        };

        let url = match env_url.or(section.url) {
            Some(url) => url,
            None => DEFAULT_DAEMON_URL.to_string(),
        };
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(KuryrError::code(
                ERR_INVALID_NETWORK_CONFIG,
                format!("invalid kuryr-daemon url {:?}: expected an http(s) url", url),
            ));
        }

        let secs = match env_timeout {
            Some(val) => val.trim().parse::<u64>().map_err(|e| {
                KuryrError::code(
                    ERR_INVALID_NETWORK_CONFIG,
                    format!("invalid {} {:?}: {}", DAEMON_TIMEOUT_ENV, val, e),
                )
            })?,
            None => section.timeout.unwrap_or(DEFAULT_TIMEOUT),
        };
        let timeout = match secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        let config = DaemonConfig { url, timeout };
        debug!("using kuryr-daemon config {:?}", config);
        Ok(config)
    }

    /// Full URL of an endpoint, e.g. `http://127.0.0.1:5036/addNetwork`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.url.trim_end_matches('/'), path)
    }
}
