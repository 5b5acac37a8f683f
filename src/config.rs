//! TOML configuration.
//!
//! Everything the binary needs comes from one file (default
//! `./config/senti.toml`); every field has a default so a minimal file is
//! valid. Secrets never live here: the stream token is named by the
//! environment variable in `stream.token_env` and read at connect time.
//!
//! ```toml
//! [files]
//! dir = "state"
//!
//! [stream]
//! kind = "http"
//! endpoint = "https://stream.example.com/filter"
//! token_env = "SENTI_STREAM_TOKEN"
//! language = "en"
//!
//! [store]
//! backend = "http"
//! host = "localhost"
//! port = 5984
//!
//! [artifacts]
//! polarity = "artifacts/sa_polarity.json"
//! subjectivity = "artifacts/sa_subjectivity.json"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::recents::LastSession;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub artifacts: ArtifactsConfig,
}

/// State-file location.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilesConfig {
    #[serde(default = "default_state_dir")]
    pub dir: PathBuf,
}

/// Upstream stream settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StreamConfig {
    /// `http` for a live endpoint, `replay` for a capture file.
    #[serde(default = "default_stream_kind")]
    pub kind: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Name of the environment variable holding the bearer token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    /// Capture file for `kind = "replay"`.
    #[serde(default)]
    pub replay_path: Option<PathBuf>,
    /// Messages in any other language are ignored.
    #[serde(default = "default_language")]
    pub language: String,
}

/// Document store settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// `http` or `memory`.
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl StoreConfig {
    /// Prefer the host and port most recently verified by `connect`,
    /// falling back to the configured values when there is no session on
    /// record.
    pub fn with_last_session(mut self, last: &LastSession) -> Self {
        if let Some(host) = &last.host {
            self.host = host.clone();
        }
        if let Some(port) = last.port {
            self.port = port;
        }
        self
    }
}

/// Paths of the trained model artifacts.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactsConfig {
    #[serde(default = "default_polarity_artifact")]
    pub polarity: PathBuf,
    #[serde(default = "default_subjectivity_artifact")]
    pub subjectivity: PathBuf,
}

fn default_state_dir() -> PathBuf {
    PathBuf::from("state")
}

fn default_stream_kind() -> String {
    "http".to_string()
}

fn default_endpoint() -> String {
    "https://stream.example.com/filter".to_string()
}

fn default_token_env() -> String {
    "SENTI_STREAM_TOKEN".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_backend() -> String {
    "http".to_string()
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5984
}

fn default_polarity_artifact() -> PathBuf {
    PathBuf::from("artifacts/sa_polarity.json")
}

fn default_subjectivity_artifact() -> PathBuf {
    PathBuf::from("artifacts/sa_subjectivity.json")
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            dir: default_state_dir(),
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            kind: default_stream_kind(),
            endpoint: default_endpoint(),
            token_env: default_token_env(),
            replay_path: None,
            language: default_language(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            polarity: default_polarity_artifact(),
            subjectivity: default_subjectivity_artifact(),
        }
    }
}

/// Load and validate a configuration file. A missing file yields the
/// defaults.
pub fn load_config(path: &Path) -> Result<Config> {
    let config = if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?
    } else {
        Config {
            files: FilesConfig::default(),
            stream: StreamConfig::default(),
            store: StoreConfig::default(),
            artifacts: ArtifactsConfig::default(),
        }
    };
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    match config.stream.kind.as_str() {
        "http" => {
            if config.stream.endpoint.trim().is_empty() {
                bail!("stream.endpoint must not be empty");
            }
        }
        "replay" => {
            if config.stream.replay_path.is_none() {
                bail!("stream.replay_path is required when stream.kind is \"replay\"");
            }
        }
        other => bail!("unknown stream.kind: {other} (expected \"http\" or \"replay\")"),
    }
    if config.stream.language.trim().is_empty() {
        bail!("stream.language must not be empty");
    }
    match config.store.backend.as_str() {
        "http" => {
            if config.store.port == 0 {
                bail!("store.port must be nonzero");
            }
            if config.store.host.trim().is_empty() {
                bail!("store.host must not be empty");
            }
        }
        "memory" => {}
        other => bail!("unknown store.backend: {other} (expected \"http\" or \"memory\")"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("senti.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = load_config(Path::new("/nonexistent/senti.toml")).unwrap();
        assert_eq!(config.store.backend, "http");
        assert_eq!(config.store.port, 5984);
        assert_eq!(config.stream.language, "en");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let (_dir, path) = write_config(
            r#"
            [store]
            host = "db.internal"
            "#,
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.store.host, "db.internal");
        assert_eq!(config.store.port, 5984);
        assert_eq!(config.files.dir, PathBuf::from("state"));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let (_dir, path) = write_config(
            r#"
            [store]
            backend = "ledger"
            "#,
        );
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_replay_requires_path() {
        let (_dir, path) = write_config(
            r#"
            [stream]
            kind = "replay"
            "#,
        );
        assert!(load_config(&path).is_err());

        let (_dir, path) = write_config(
            r#"
            [stream]
            kind = "replay"
            replay_path = "capture.ndjson"
            "#,
        );
        assert!(load_config(&path).is_ok());
    }

    #[test]
    fn test_zero_port_rejected() {
        let (_dir, path) = write_config(
            r#"
            [store]
            port = 0
            "#,
        );
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_store_prefers_last_verified_connection() {
        let cfg = StoreConfig::default();
        let last = LastSession {
            host: Some("db.internal".to_string()),
            port: Some(4242),
            database: None,
            collection: None,
        };
        let resolved = cfg.clone().with_last_session(&last);
        assert_eq!(resolved.host, "db.internal");
        assert_eq!(resolved.port, 4242);

        // Nothing on record: the configured values stand.
        let resolved = cfg.with_last_session(&LastSession::default());
        assert_eq!(resolved.host, "localhost");
        assert_eq!(resolved.port, 5984);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let (_dir, path) = write_config(
            r#"
            [store]
            hostt = "typo"
            "#,
        );
        assert!(load_config(&path).is_err());
    }
}
