//! User configuration (§6): a defaults template merged with a user
//! overlay and then with environment variables, in that precedence
//! order. Hot-reload watches the overlay file, debounces changes
//! 500ms, and reloads + emits `configuration-reloaded` (§6).

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use log::warn;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::error::PoolError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommsConfig {
    pub net_connect: bool,
    pub net_host: String,
    pub net_port: u16,
    pub rs485_port: String,
}

impl Default for CommsConfig {
    fn default() -> Self {
        Self {
            net_connect: false,
            net_host: "127.0.0.1".into(),
            net_port: 6200,
            rs485_port: "/dev/ttyUSB0".into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControllerSection {
    pub comms: CommsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSection {
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for LocationSection {
    fn default() -> Self {
        Self {
            latitude: 33.64,
            longitude: -117.84,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogAppSection {
    pub level: String,
}

impl Default for LogAppSection {
    fn default() -> Self {
        Self { level: "info".into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogSection {
    pub app: LogAppSection,
}

/// The merged configuration surface (§6 env-var table). Field names use
/// the dotted paths from that table under `camelCase` JSON keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub controller: ControllerSection,
    #[serde(default)]
    pub location: LocationSection,
    #[serde(default)]
    pub log: LogSection,
}

impl AppConfig {
    /// Build the merged configuration: defaults struct, then the
    /// defaults-template file (if present), then the user overlay file
    /// (if present), then environment variables, in increasing
    /// precedence order.
    pub async fn load(defaults_path: &Path, overlay_path: &Path) -> Result<Self, PoolError> {
        let mut value = serde_json::to_value(Self::default())
            .map_err(|e| PoolError::Internal(format!("serializing config defaults: {e}")))?;

        for path in [defaults_path, overlay_path] {
            if let Ok(bytes) = tokio::fs::read(path).await {
                let patch: serde_json::Value = serde_json::from_slice(&bytes)
                    .map_err(|e| PoolError::ConfigurationCorrupt(path.to_path_buf()).pipe_log(&e))?;
                merge_json(&mut value, patch);
            }
        }

        let mut config: AppConfig = serde_json::from_value(value)
            .map_err(|e| PoolError::Internal(format!("deserializing merged config: {e}")))?;
        config.apply_env();
        Ok(config)
    }

    /// Apply the exhaustive environment-variable mapping (§6 table).
    /// Unparseable values are logged and left at their prior setting.
    fn apply_env(&mut self) {
        apply_bool_env("POOL_NET_CONNECT", &mut self.controller.comms.net_connect);
        apply_string_env("POOL_NET_HOST", &mut self.controller.comms.net_host);
        apply_parsed_env("POOL_NET_PORT", &mut self.controller.comms.net_port);
        apply_string_env("POOL_RS485_PORT", &mut self.controller.comms.rs485_port);
        apply_parsed_env("POOL_LATITUDE", &mut self.location.latitude);
        apply_parsed_env("POOL_LONGITUDE", &mut self.location.longitude);
        apply_string_env("POOL_LOG_LEVEL", &mut self.log.app.level);
    }
}

/// Tiny adapter so a parse error can be logged with its source before
/// being folded into the simpler `ConfigurationCorrupt(path)` variant
/// the rest of the core matches on.
trait LogPipe {
    fn pipe_log(self, err: &dyn std::fmt::Display) -> Self;
}

impl LogPipe for PoolError {
    fn pipe_log(self, err: &dyn std::fmt::Display) -> Self {
        warn!("config: {self}: {err}");
        self
    }
}

fn apply_bool_env(var: &str, target: &mut bool) {
    if let Ok(raw) = std::env::var(var) {
        match raw.parse() {
            Ok(value) => *target = value,
            Err(_) => warn!("config: {var}={raw:?} is not a valid bool, ignoring"),
        }
    }
}

fn apply_string_env(var: &str, target: &mut String) {
    if let Ok(raw) = std::env::var(var) {
        *target = raw;
    }
}

fn apply_parsed_env<T: std::str::FromStr>(var: &str, target: &mut T) {
    if let Ok(raw) = std::env::var(var) {
        match raw.parse() {
            Ok(value) => *target = value,
            Err(_) => warn!("config: {var}={raw:?} failed to parse, ignoring"),
        }
    }
}

/// RFC 7386-style recursive merge: scalar and array values in `patch`
/// replace `base`; objects merge key-by-key.
fn merge_json(base: &mut serde_json::Value, patch: serde_json::Value) {
    match (base, patch) {
        (serde_json::Value::Object(base_map), serde_json::Value::Object(patch_map)) => {
            for (key, value) in patch_map {
                merge_json(base_map.entry(key).or_insert(serde_json::Value::Null), value);
            }
        }
        (base_slot, patch_value) => *base_slot = patch_value,
    }
}

/// Watches `overlay_path` for changes, debounced 500ms (§6), reloading
/// the full merged config and handing it to `on_reload` (the caller
/// decides what a reload means — e.g. publishing a
/// `configuration-reloaded` event through the Change Engine).
pub fn spawn_hot_reload(
    defaults_path: PathBuf,
    overlay_path: PathBuf,
    on_reload: impl Fn(AppConfig) + Send + 'static,
) {
    const POLL_INTERVAL: Duration = Duration::from_millis(200);
    const DEBOUNCE: Duration = Duration::from_millis(500);

    tokio::spawn(async move {
        let mut last_modified: Option<SystemTime> = None;
        let mut pending_since: Option<Instant> = None;
        loop {
            tokio::time::sleep(POLL_INTERVAL).await;

            let Ok(metadata) = tokio::fs::metadata(&overlay_path).await else {
                continue;
            };
            let Ok(modified) = metadata.modified() else {
                continue;
            };
            if last_modified != Some(modified) {
                last_modified = Some(modified);
                pending_since = Some(Instant::now());
            }

            let Some(since) = pending_since else { continue };
            if since.elapsed() < DEBOUNCE {
                continue;
            }
            pending_since = None;

            match AppConfig::load(&defaults_path, &overlay_path).await {
                Ok(config) => on_reload(config),
                Err(e) => warn!("config: hot-reload failed: {e}"),
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn defaults_survive_with_no_files_present() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("defaults.json"), &dir.path().join("overlay.json"))
            .await
            .unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[tokio::test]
    async fn overlay_file_wins_over_defaults_file() {
        let dir = tempfile::tempdir().unwrap();
        let defaults_path = dir.path().join("defaults.json");
        let overlay_path = dir.path().join("overlay.json");
        tokio::fs::write(&defaults_path, r#"{"controller":{"comms":{"netHost":"10.0.0.1"}}}"#)
            .await
            .unwrap();
        tokio::fs::write(&overlay_path, r#"{"controller":{"comms":{"netHost":"10.0.0.2"}}}"#)
            .await
            .unwrap();
        let config = AppConfig::load(&defaults_path, &overlay_path).await.unwrap();
        assert_eq!(config.controller.comms.net_host, "10.0.0.2");
    }

    #[tokio::test]
    async fn env_var_wins_over_every_file() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var("POOL_NET_HOST", "192.168.1.50");
        let config = AppConfig::load(&dir.path().join("defaults.json"), &dir.path().join("overlay.json"))
            .await
            .unwrap();
        std::env::remove_var("POOL_NET_HOST");
        assert_eq!(config.controller.comms.net_host, "192.168.1.50");
    }
}
