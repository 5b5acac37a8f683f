//! Recency state files.
//!
//! Three small JSON files under the state directory remember what the
//! operator did last, so the CLI can offer sensible defaults:
//!
//! | File | Contents |
//! |------|----------|
//! | `hosts.json` | every store host:port ever connected, with the last database and collection used on each |
//! | `last.json` | the most recent host, port, database and collection |
//! | `keywords.json` | up to the ten most recent stream keywords, newest first |
//!
//! Missing files read as empty state; the directory is created on first
//! write.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Keyword history holds at most this many entries.
pub const MAX_RECENT_KEYWORDS: usize = 10;

const HOSTS_FILE: &str = "hosts.json";
const LAST_FILE: &str = "last.json";
const KEYWORDS_FILE: &str = "keywords.json";

/// One remembered store connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionEntry {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub collection: Option<String>,
}

/// The most recent session's connection and selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastSession {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub collection: Option<String>,
}

/// Handle on the state directory.
pub struct StateFiles {
    dir: PathBuf,
}

impl StateFiles {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read_json<T: Default + for<'de> Deserialize<'de>>(&self, name: &str) -> anyhow::Result<T> {
        let path = self.dir.join(name);
        if !path.exists() {
            return Ok(T::default());
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        let path = self.dir.join(name);
        let raw = serde_json::to_string_pretty(value)?;
        fs::write(&path, raw).with_context(|| format!("failed to write {}", path.display()))
    }

    pub fn read_hosts(&self) -> anyhow::Result<Vec<ConnectionEntry>> {
        self.read_json(HOSTS_FILE)
    }

    pub fn read_last(&self) -> anyhow::Result<LastSession> {
        self.read_json(LAST_FILE)
    }

    pub fn read_keywords(&self) -> anyhow::Result<Vec<String>> {
        self.read_json(KEYWORDS_FILE)
    }

    /// Remember a verified connection and make it the last session.
    ///
    /// A host:port already on record keeps its position and its saved
    /// database and collection.
    pub fn record_connection(&self, host: &str, port: u16) -> anyhow::Result<()> {
        let mut hosts = self.read_hosts()?;
        if !hosts.iter().any(|e| e.host == host && e.port == port) {
            hosts.push(ConnectionEntry {
                host: host.to_string(),
                port,
                database: None,
                collection: None,
            });
        }
        self.write_json(HOSTS_FILE, &hosts)?;

        let mut last = self.read_last()?;
        last.host = Some(host.to_string());
        last.port = Some(port);
        self.write_json(LAST_FILE, &last)
    }

    /// Remember the database and collection chosen for the last host.
    pub fn record_selection(&self, database: &str, collection: &str) -> anyhow::Result<()> {
        let mut last = self.read_last()?;
        last.database = Some(database.to_string());
        last.collection = Some(collection.to_string());

        if let (Some(host), Some(port)) = (last.host.clone(), last.port) {
            let mut hosts = self.read_hosts()?;
            if let Some(entry) = hosts.iter_mut().find(|e| e.host == host && e.port == port) {
                entry.database = Some(database.to_string());
                entry.collection = Some(collection.to_string());
                self.write_json(HOSTS_FILE, &hosts)?;
            }
        }
        self.write_json(LAST_FILE, &last)
    }

    /// Add a keyword to the recency list.
    ///
    /// Keywords already on the list stay where they are; new ones go to
    /// the front, evicting the oldest entries past the cap.
    pub fn record_keyword(&self, keyword: &str) -> anyhow::Result<()> {
        let mut keywords = self.read_keywords()?;
        if keywords.iter().any(|k| k == keyword) {
            return Ok(());
        }
        while keywords.len() >= MAX_RECENT_KEYWORDS {
            keywords.pop();
        }
        keywords.insert(0, keyword.to_string());
        self.write_json(KEYWORDS_FILE, &keywords)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
