/// Configuration file support
///
/// Topic tables and application settings are read from TOML or YAML files.
/// The format is picked from the file extension; files without a known
/// extension are tried as TOML first, then YAML.
use crate::communication::hub::DEFAULT_DEPTH;
use crate::error::{WhillError, WhillResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How a topic's messages move between Hubs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    /// Ring buffer in shared memory; reaches Hubs in other processes
    #[default]
    SharedMemory,
    /// Queues inside this process only
    InProcess,
}

/// Topic name, per-subscriber history depth and transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubConfig {
    pub name: String,

    #[serde(default = "default_depth")]
    pub depth: usize,

    #[serde(default)]
    pub transport: Transport,
}

fn default_depth() -> usize {
    DEFAULT_DEPTH
}

impl HubConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            depth: DEFAULT_DEPTH,
            transport: Transport::default(),
        }
    }

    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }
}

/// Load any deserializable config from a file (auto-detect format)
pub fn from_file<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> WhillResult<T> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| {
        WhillError::config(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    match path.extension().and_then(|s| s.to_str()) {
        Some("toml") => from_toml(&contents),
        Some("yaml") | Some("yml") => from_yaml(&contents),
        _ => from_toml(&contents).or_else(|_| from_yaml(&contents)),
    }
}

pub fn from_toml<T: DeserializeOwned>(contents: &str) -> WhillResult<T> {
    toml::from_str(contents).map_err(|e| WhillError::config(format!("Failed to parse TOML: {}", e)))
}

pub fn from_yaml<T: DeserializeOwned>(contents: &str) -> WhillResult<T> {
    serde_yaml::from_str(contents)
        .map_err(|e| WhillError::config(format!("Failed to parse YAML: {}", e)))
}

/// Standard config file search paths
///
/// Search order:
/// 1. ./whill.toml, ./whill.yaml, ./whill.yml
/// 2. ~/.whill/config.toml or ~/.whill/config.yaml
/// 3. /etc/whill/config.toml or /etc/whill/config.yaml
pub fn get_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("whill.toml"),
        PathBuf::from("whill.yaml"),
        PathBuf::from("whill.yml"),
    ];

    if let Some(home) = dirs::home_dir() {
        let whill_dir = home.join(".whill");
        paths.push(whill_dir.join("config.toml"));
        paths.push(whill_dir.join("config.yaml"));
    }

    paths.push(PathBuf::from("/etc/whill/config.toml"));
    paths.push(PathBuf::from("/etc/whill/config.yaml"));
    paths
}

/// First existing file from [`get_search_paths`]
pub fn find_config_file() -> Option<PathBuf> {
    get_search_paths().into_iter().find(|path| path.exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Topics {
        odom: HubConfig,
        joy: HubConfig,
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            [odom]
            name = "/whill/odom"
            depth = 5

            [joy]
            name = "/joy"
            transport = "in_process"
        "#;

        let topics: Topics = from_toml(toml_str).unwrap();
        assert_eq!(topics.odom, HubConfig::new("/whill/odom").with_depth(5));
        assert_eq!(topics.odom.transport, Transport::SharedMemory);
        assert_eq!(topics.joy.depth, DEFAULT_DEPTH);
        assert_eq!(topics.joy.transport, Transport::InProcess);
    }

    #[test]
    fn test_parse_yaml() {
        let yaml_str = r#"
odom:
  name: /whill/odom
joy:
  name: /joy
  depth: 1
"#;

        let topics: Topics = from_yaml(yaml_str).unwrap();
        assert_eq!(topics.odom.depth, DEFAULT_DEPTH);
        assert_eq!(topics.joy, HubConfig::new("/joy").with_depth(1));
    }

    #[test]
    fn test_from_file_detects_format() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "odom:\n  name: /odom\njoy:\n  name: /joy").unwrap();

        let topics: Topics = from_file(file.path()).unwrap();
        assert_eq!(topics.odom.name, "/odom");
    }

    #[test]
    fn test_from_file_without_extension_falls_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "joy:\n  name: /joy\nodom:\n  name: /odom").unwrap();

        let topics: Topics = from_file(file.path()).unwrap();
        assert_eq!(topics.joy.name, "/joy");
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result: WhillResult<Topics> = from_file("/nonexistent/whill.toml");
        assert!(matches!(result, Err(WhillError::Config(_))));
    }

    #[test]
    fn test_search_paths_start_in_current_dir() {
        let paths = get_search_paths();
        assert_eq!(paths[0], PathBuf::from("whill.toml"));
        assert!(paths.contains(&PathBuf::from("/etc/whill/config.toml")));
    }
}
