//! Configuration: debounce timings, storage key layout, collaboration settings
//!
//! Every field has a default, so an empty YAML document is a valid config.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors loading a configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarginaliaConfig {
    pub sync: SyncConfig,
    pub collab: CollabConfig,
}

impl MarginaliaConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        // serde_yaml rejects an empty document; treat it as all-defaults
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
    }
}

/// Persistence timing and key layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Quiet period before the comment set is written
    pub comment_debounce_ms: u64,
    /// Quiet period before document content is written
    pub content_debounce_ms: u64,
    pub comments_key_prefix: String,
    pub content_key_prefix: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            comment_debounce_ms: 500,
            content_debounce_ms: 500,
            comments_key_prefix: "comments:".to_string(),
            content_key_prefix: "content:".to_string(),
        }
    }
}

impl SyncConfig {
    pub fn comment_debounce(&self) -> Duration {
        Duration::from_millis(self.comment_debounce_ms)
    }

    pub fn content_debounce(&self) -> Duration {
        Duration::from_millis(self.content_debounce_ms)
    }

    /// Store key holding a document's serialized comment set
    pub fn comments_key(&self, document_id: &str) -> String {
        format!("{}{}", self.comments_key_prefix, document_id)
    }

    /// Store key holding a document's serialized content
    pub fn content_key(&self, document_id: &str) -> String {
        format!("{}{}", self.content_key_prefix, document_id)
    }
}

/// Credentials and presentation defaults for collaboration sessions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollabConfig {
    pub app_id: String,
    pub token: String,
    /// Cursor colour used when a user connects without choosing one
    pub default_color: String,
}

impl Default for CollabConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            token: String::new(),
            default_color: "#958DF1".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        let config = MarginaliaConfig::from_yaml_str("").unwrap();
        assert_eq!(config, MarginaliaConfig::default());
        assert_eq!(config.sync.comment_debounce(), Duration::from_millis(500));
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let yaml = r#"
sync:
  comment_debounce_ms: 250
collab:
  app_id: my-app
"#;
        let config = MarginaliaConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.sync.comment_debounce_ms, 250);
        assert_eq!(config.sync.content_debounce_ms, 500);
        assert_eq!(config.sync.comments_key_prefix, "comments:");
        assert_eq!(config.collab.app_id, "my-app");
        assert_eq!(config.collab.default_color, "#958DF1");
    }

    #[test]
    fn key_layout_is_scoped_per_document() {
        let sync = SyncConfig::default();
        assert_eq!(sync.comments_key("doc-1"), "comments:doc-1");
        assert_eq!(sync.content_key("doc-1"), "content:doc-1");
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let err = MarginaliaConfig::from_yaml_str("sync: [not, a, map]").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn from_file_reads_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("marginalia.yaml");
        std::fs::write(&path, "sync:\n  content_key_prefix: \"doc/\"\n").unwrap();
        let config = MarginaliaConfig::from_file(&path).unwrap();
        assert_eq!(config.sync.content_key("x"), "doc/x");
    }
}
