//! Application configuration.
//!
//! The configuration is loaded from `$XDG_CONFIG_HOME/acmectl/config.json`.
//! The top-level schema groups the external command lines under a
//! `"transport"` key so the file can grow additional sections later without
//! breaking backward compatibility.
//!
//! # Example
//!
//! ```json
//! {
//!   "transport": {
//!     "ninep": ["9p", "-a", "unix!/tmp/ns.me.:0/acme"],
//!     "acmeevent": ["acmeevent"],
//!     "service": "acme"
//!   },
//!   "winid_var": "winid"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration.
///
/// Every field is optional — a minimal `{}` file is valid and all sections
/// fall back to their compiled-in defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Command lines for the external tools.
    #[serde(default)]
    pub transport: PipelineConfig,

    /// Environment variable consulted when no window id is given.  acme sets
    /// `winid` for every command it runs from a window.
    #[serde(default = "default_winid_var")]
    pub winid_var: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transport: PipelineConfig::default(),
            winid_var: default_winid_var(),
        }
    }
}

fn default_winid_var() -> String {
    "winid".into()
}

/// How to reach acme's file tree.
///
/// Command lines are argument vectors: the first element is the program,
/// the rest are passed before the subcommand (`read` / `write`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// The 9P client.  Default: `["9p"]`.
    pub ninep: Vec<String>,
    /// The event decoder.  Default: `["acmeevent"]`.
    pub acmeevent: Vec<String>,
    /// Service name at the root of every resource path.  Default: `"acme"`.
    pub service: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ninep: vec!["9p".into()],
            acmeevent: vec!["acmeevent".into()],
            service: "acme".into(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(config)
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_full_config() {
        let json = r#"{
            "transport": {
                "ninep": ["9p", "-a", "unix!/tmp/acme"],
                "acmeevent": ["/usr/local/plan9/bin/acmeevent"],
                "service": "acme2"
            },
            "winid_var": "ACME_WIN"
        }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.transport.ninep, vec!["9p", "-a", "unix!/tmp/acme"]);
        assert_eq!(cfg.transport.acmeevent, vec!["/usr/local/plan9/bin/acmeevent"]);
        assert_eq!(cfg.transport.service, "acme2");
        assert_eq!(cfg.winid_var, "ACME_WIN");
    }

    #[test]
    fn deserialize_empty_uses_defaults() {
        let cfg: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.transport, PipelineConfig::default());
        assert_eq!(cfg.winid_var, "winid");
    }

    #[test]
    fn deserialize_partial_transport() {
        let json = r#"{ "transport": { "service": "acme-test" } }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.transport.service, "acme-test");
        assert_eq!(cfg.transport.ninep, vec!["9p"]);
        assert_eq!(cfg.transport.acmeevent, vec!["acmeevent"]);
    }

    #[test]
    fn unknown_top_level_keys_ignored() {
        let json = r#"{ "transport": {}, "future_section": { "key": 42 } }"#;
        let _cfg: Config = serde_json::from_str(json).unwrap();
    }

    #[test]
    fn load_missing_file_is_an_error() {
        let path = std::env::temp_dir().join(format!(
            "acmectl-missing-{}.json",
            std::process::id()
        ));
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
