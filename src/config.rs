//! Configuration Management
//!
//! Persistent defaults for mixerctl. Command line flags win over the
//! config file, which wins over the built-in defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Address of the configuration service when nothing else is given
pub const DEFAULT_API_SERVER: &str = "istio-galley:9096";

/// Namespace the configuration service runs in when nothing else is given
pub const DEFAULT_NAMESPACE: &str = "istio-system";

/// User configuration
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Service name (or base URL when not resolving through the cluster)
    #[serde(default)]
    pub api_server: Option<String>,
    /// Namespace of the configuration service
    #[serde(default)]
    pub namespace: Option<String>,
    /// Resolve the service through the Kubernetes API
    #[serde(default)]
    pub use_kube: Option<bool>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("mixerctl").join("config.json"))
    }

    /// Log file path, next to the config file when there is a config dir
    pub fn log_path() -> PathBuf {
        dirs::config_dir()
            .map(|p| p.join("mixerctl"))
            .or_else(|| dirs::home_dir().map(|p| p.join(".mixerctl")))
            .unwrap_or_default()
            .join("mixerctl.log")
    }

    /// Load configuration from the default location
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load configuration from `path`, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid config {}: {}", path.display(), e);
                Self::default()
            }),
            Err(e) => {
                tracing::warn!("Failed to read config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Get effective service address (CLI > config > default)
    pub fn effective_api_server(&self, flag: Option<&str>) -> String {
        flag.map(str::to_string)
            .or_else(|| self.api_server.clone())
            .unwrap_or_else(|| DEFAULT_API_SERVER.to_string())
    }

    /// Get effective namespace (istio namespace flag > namespace flag > config > default)
    pub fn effective_namespace(
        &self,
        istio_namespace: Option<&str>,
        namespace: Option<&str>,
    ) -> String {
        istio_namespace
            .filter(|ns| !ns.is_empty())
            .or(namespace.filter(|ns| !ns.is_empty()))
            .map(str::to_string)
            .or_else(|| self.namespace.clone())
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string())
    }

    /// Whether to resolve the service through the cluster (CLI > config > true)
    pub fn effective_use_kube(&self, flag: Option<bool>) -> bool {
        flag.or(self.use_kube).unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_flags_or_file() {
        let config = Config::default();
        assert_eq!(config.effective_api_server(None), DEFAULT_API_SERVER);
        assert_eq!(config.effective_namespace(None, None), DEFAULT_NAMESPACE);
        assert!(config.effective_use_kube(None));
    }

    #[test]
    fn flags_win_over_config() {
        let config = Config {
            api_server: Some("galley:1234".to_string()),
            namespace: Some("mesh".to_string()),
            use_kube: Some(false),
        };
        assert_eq!(config.effective_api_server(None), "galley:1234");
        assert_eq!(config.effective_api_server(Some("localhost:9096")), "localhost:9096");
        assert_eq!(config.effective_namespace(None, None), "mesh");
        assert_eq!(config.effective_namespace(None, Some("default")), "default");
        assert_eq!(
            config.effective_namespace(Some("istio"), Some("default")),
            "istio"
        );
        assert!(!config.effective_use_kube(None));
        assert!(config.effective_use_kube(Some(true)));
    }

    #[test]
    fn empty_istio_namespace_falls_back_to_namespace() {
        let config = Config::default();
        assert_eq!(config.effective_namespace(Some(""), Some("default")), "default");
    }

    #[test]
    fn load_reads_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"api_server": "http://localhost:9096", "use_kube": false}"#)
            .unwrap();

        let config = Config::load_from(&path);
        assert_eq!(
            config,
            Config {
                api_server: Some("http://localhost:9096".to_string()),
                namespace: None,
                use_kube: Some(false),
            }
        );
        assert!(!config.effective_use_kube(None));
        assert_eq!(config.effective_namespace(None, None), DEFAULT_NAMESPACE);
    }

    #[test]
    fn log_file_is_named_after_the_tool() {
        let path = Config::log_path();
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("mixerctl.log"));
    }

    #[test]
    fn invalid_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
        assert_eq!(Config::load_from(&dir.path().join("missing.json")), Config::default());
    }
}
