//! Settings for the `rviz_info_display` binary
//!
//! Every field has a default, so an empty file (or no file at all) runs the
//! display on the standard WHILL topics at 10 Hz.
//!
//! ```toml
//! node_rate_hz = 50.0
//!
//! [distance]
//! reset_button = 8
//! odom_topic = { name = "/whill/odom", depth = 10, transport = "shared_memory" }
//!
//! [overlay]
//! overlay_topic = { name = "/whill_info" }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use whill_core::communication::config::{find_config_file, from_file};
use whill_core::error::{WhillError, WhillResult};
use whill_core::SchedulerConfig;
use whill_library::nodes::{DistanceCalculatorConfig, InfoOverlayConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub distance: DistanceCalculatorConfig,
    pub overlay: InfoOverlayConfig,
    pub scheduler: SchedulerConfig,
    /// Tick rate of both nodes; must be above the publish rate
    pub node_rate_hz: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            distance: DistanceCalculatorConfig::default(),
            overlay: InfoOverlayConfig::default(),
            scheduler: SchedulerConfig::default(),
            node_rate_hz: 100.0,
        }
    }
}

impl AppConfig {
    /// Load from `path`, or from the first standard search path that exists
    ///
    /// An explicit path must exist. Without one, a missing file means defaults.
    pub fn load(path: Option<&Path>) -> WhillResult<Self> {
        let config: AppConfig = match path {
            Some(path) => from_file(path)?,
            None => match find_config_file() {
                Some(found) => {
                    tracing::info!("Using config file {}", found.display());
                    from_file(&found)?
                }
                None => AppConfig::default(),
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> WhillResult<()> {
        if self.node_rate_hz.is_nan() || self.node_rate_hz <= 0.0 {
            return Err(WhillError::InvalidInput(format!(
                "node_rate_hz must be positive, got {}",
                self.node_rate_hz
            )));
        }
        if self.distance.publish_period_ms == 0 || self.overlay.publish_period_ms == 0 {
            return Err(WhillError::InvalidInput(
                "publish_period_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use whill_core::Transport;

    #[test]
    fn test_empty_file_gives_defaults() {
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.distance.distance_topic.name, "/distance");
        assert_eq!(config.overlay.publish_period_ms, 100);
    }

    #[test]
    fn test_partial_toml_overrides() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
node_rate_hz = 50.0

[distance]
reset_button = 3
odom_topic = {{ name = "/odom", depth = 5, transport = "in_process" }}

[overlay]
overlay_topic = {{ name = "/overlay" }}
"#
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.node_rate_hz, 50.0);
        assert_eq!(config.distance.reset_button, 3);
        assert_eq!(config.distance.odom_topic.name, "/odom");
        assert_eq!(config.distance.odom_topic.depth, 5);
        assert_eq!(config.distance.odom_topic.transport, Transport::InProcess);
        assert_eq!(config.distance.joy_topic.transport, Transport::SharedMemory);
        assert_eq!(config.distance.joy_topic.name, "/joy");
        assert_eq!(config.overlay.overlay_topic.name, "/overlay");
        assert_eq!(config.overlay.overlay_topic.depth, 10);
    }

    #[test]
    fn test_yaml_config() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "overlay:\n  publish_period_ms: 250\nscheduler:\n  global_rate_hz: 20.0"
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.overlay.publish_period_ms, 250);
        assert_eq!(config.scheduler.global_rate_hz, 20.0);
        assert_eq!(config.scheduler.tick_budget_ms, 50.0);
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let result = AppConfig::load(Some(Path::new("/nonexistent/rviz_info.toml")));
        assert!(matches!(result, Err(WhillError::Config(_))));
    }

    #[test]
    fn test_rejects_zero_period() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[distance]\npublish_period_ms = 0").unwrap();

        let result = AppConfig::load(Some(file.path()));
        assert!(matches!(result, Err(WhillError::InvalidInput(_))));
    }
}
