//! Document store backends for scored records.
//!
//! Everything downstream of scoring talks to the [`DocumentStore`] trait:
//!
//! | Backend | Struct | Use |
//! |---------|--------|-----|
//! | `http` | [`HttpStore`] | REST document server (default) |
//! | `memory` | [`MemoryStore`] | tests and offline runs |
//!
//! A store is only handed to a session after [`connect`] succeeds, which
//! performs a full write probe: create a disposable database, insert one
//! document, drop the database. Passing the probe proves the credentials
//! and the write path, not just TCP reachability.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::models::SentimentRecord;

/// Result of inserting a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The record was written.
    Stored,
    /// A record with the same id already exists; nothing was written.
    DuplicateId,
}

/// Equality filter on a dotted field path, e.g. `lexicon.polarity`.
#[derive(Debug, Clone)]
pub struct Filter {
    pub field: String,
    pub label: String,
}

impl Filter {
    pub fn new(field: &str, label: &str) -> Self {
        Self {
            field: field.to_string(),
            label: label.to_string(),
        }
    }

    fn matches(&self, doc: &Value) -> bool {
        let mut node = doc;
        for part in self.field.split('.') {
            match node.get(part) {
                Some(next) => node = next,
                None => return false,
            }
        }
        node.as_str() == Some(self.label.as_str())
    }
}

/// Materialized query result.
pub struct Cursor {
    items: Vec<Value>,
}

impl Cursor {
    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }
}

/// Operations every store backend provides.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Round-trip a throwaway write to prove the store accepts documents.
    async fn probe(&self) -> Result<()>;

    /// Insert a scored record, keyed by its message id.
    async fn insert(
        &self,
        database: &str,
        collection: &str,
        record: &SentimentRecord,
    ) -> Result<InsertOutcome>;

    /// Fetch documents, optionally narrowed by an equality filter.
    async fn find(
        &self,
        database: &str,
        collection: &str,
        filter: Option<&Filter>,
    ) -> Result<Cursor>;

    async fn list_databases(&self) -> Result<Vec<String>>;

    async fn list_collections(&self, database: &str) -> Result<Vec<String>>;

    async fn drop_database(&self, database: &str) -> Result<()>;

    async fn drop_collection(&self, database: &str, collection: &str) -> Result<()>;
}

/// Build the backend named in `cfg` without probing it.
pub fn open(cfg: &StoreConfig) -> Result<Box<dyn DocumentStore>> {
    match cfg.backend.as_str() {
        "http" => Ok(Box::new(HttpStore::new(&cfg.host, cfg.port))),
        "memory" => Ok(Box::new(MemoryStore::new())),
        other => Err(Error::Config(format!("unknown store backend: {other}"))),
    }
}

/// Build the backend and verify it with a write probe.
pub async fn connect(cfg: &StoreConfig) -> Result<Box<dyn DocumentStore>> {
    let store = open(cfg)?;
    store.probe().await?;
    info!(backend = %cfg.backend, host = %cfg.host, port = cfg.port, "store connection verified");
    Ok(store)
}

/// Reject blank or malformed database names.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] describing what to fix.
pub fn validate_database_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(
            "Give a database name to continue".to_string(),
        ));
    }
    if !trimmed.chars().next().is_some_and(|c| c.is_ascii_alphanumeric()) {
        return Err(Error::InvalidInput(
            "Database name must start with a letter or digit".to_string(),
        ));
    }
    Ok(())
}

/// Reject blank or malformed collection names.
pub fn validate_collection_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(
            "Give a collection name to continue".to_string(),
        ));
    }
    if !trimmed.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
        return Err(Error::InvalidInput(
            "Collection name must start with a letter".to_string(),
        ));
    }
    Ok(())
}

/// REST-backed document store.
///
/// Databases are path segments (`PUT /{db}` creates, `DELETE /{db}`
/// drops) and documents are posted to `/{db}/{collection}`; the server
/// answers `409` on an id collision.
pub struct HttpStore {
    client: reqwest::Client,
    base: String,
}

impl HttpStore {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            client: reqwest::Client::new(),
            base: format!("http://{host}:{port}"),
        }
    }

    fn url(&self, parts: &[&str]) -> String {
        let mut url = self.base.clone();
        for part in parts {
            url.push('/');
            url.push_str(part);
        }
        url
    }

    async fn create_database(&self, database: &str) -> Result<()> {
        let resp = self
            .client
            .put(self.url(&[database]))
            .send()
            .await
            .map_err(|e| Error::StoreConnection(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(Error::StoreConnection(format!(
                "create database {database} failed with status {}",
                resp.status()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for HttpStore {
    async fn probe(&self) -> Result<()> {
        // Random name so repeated or concurrent probes never collide.
        let database = format!("probe_db_{}", uuid::Uuid::new_v4().simple());
        debug!(%database, "running store write probe");
        self.create_database(&database).await?;
        let doc = serde_json::json!({ "_id": 0, "probe": true });
        let resp = self
            .client
            .post(self.url(&[&database, "probe"]))
            .json(&doc)
            .send()
            .await
            .map_err(|e| Error::StoreConnection(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(Error::StoreConnection(format!(
                "probe insert failed with status {}",
                resp.status()
            )));
        }
        self.drop_database(&database).await
    }

    async fn insert(
        &self,
        database: &str,
        collection: &str,
        record: &SentimentRecord,
    ) -> Result<InsertOutcome> {
        self.create_database(database).await?;
        let resp = self
            .client
            .post(self.url(&[database, collection]))
            .json(record)
            .send()
            .await
            .map_err(|e| Error::StoreConnection(e.to_string()))?;
        match resp.status().as_u16() {
            200 | 201 => Ok(InsertOutcome::Stored),
            409 => Ok(InsertOutcome::DuplicateId),
            status => Err(Error::StoreConnection(format!(
                "insert into {database}/{collection} failed with status {status}"
            ))),
        }
    }

    async fn find(
        &self,
        database: &str,
        collection: &str,
        filter: Option<&Filter>,
    ) -> Result<Cursor> {
        let resp = self
            .client
            .get(self.url(&[database, collection]))
            .send()
            .await
            .map_err(|e| Error::StoreConnection(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(Error::StoreConnection(format!(
                "query of {database}/{collection} failed with status {}",
                resp.status()
            )));
        }
        let docs: Vec<Value> = resp
            .json()
            .await
            .map_err(|e| Error::StoreConnection(e.to_string()))?;
        let items = match filter {
            Some(f) => docs.into_iter().filter(|d| f.matches(d)).collect(),
            None => docs,
        };
        Ok(Cursor { items })
    }

    async fn list_databases(&self) -> Result<Vec<String>> {
        let resp = self
            .client
            .get(self.url(&["_all_dbs"]))
            .send()
            .await
            .map_err(|e| Error::StoreConnection(e.to_string()))?;
        resp.json()
            .await
            .map_err(|e| Error::StoreConnection(e.to_string()))
    }

    async fn list_collections(&self, database: &str) -> Result<Vec<String>> {
        let resp = self
            .client
            .get(self.url(&[database, "_all_collections"]))
            .send()
            .await
            .map_err(|e| Error::StoreConnection(e.to_string()))?;
        resp.json()
            .await
            .map_err(|e| Error::StoreConnection(e.to_string()))
    }

    async fn drop_database(&self, database: &str) -> Result<()> {
        let resp = self
            .client
            .delete(self.url(&[database]))
            .send()
            .await
            .map_err(|e| Error::StoreConnection(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(Error::StoreConnection(format!(
                "drop database {database} failed with status {}",
                resp.status()
            )));
        }
        Ok(())
    }

    async fn drop_collection(&self, database: &str, collection: &str) -> Result<()> {
        let resp = self
            .client
            .delete(self.url(&[database, collection]))
            .send()
            .await
            .map_err(|e| Error::StoreConnection(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(Error::StoreConnection(format!(
                "drop collection {database}/{collection} failed with status {}",
                resp.status()
            )));
        }
        Ok(())
    }
}

type Collections = HashMap<String, BTreeMap<i64, Value>>;

/// In-process store keyed `database -> collection -> id -> document`.
///
/// `set_offline` flips every operation into a connection error so tests
/// can exercise mid-session store failures.
#[derive(Default)]
pub struct MemoryStore {
    databases: RwLock<HashMap<String, Collections>>,
    offline: RwLock<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        *self.offline.write().unwrap_or_else(|e| e.into_inner()) = offline;
    }

    fn check_online(&self) -> Result<()> {
        if *self.offline.read().unwrap_or_else(|e| e.into_inner()) {
            return Err(Error::StoreConnection(
                "memory store is offline".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn probe(&self) -> Result<()> {
        self.check_online()
    }

    async fn insert(
        &self,
        database: &str,
        collection: &str,
        record: &SentimentRecord,
    ) -> Result<InsertOutcome> {
        self.check_online()?;
        let doc = serde_json::to_value(record)
            .map_err(|e| Error::StoreConnection(e.to_string()))?;
        let mut databases = self.databases.write().unwrap_or_else(|e| e.into_inner());
        let docs = databases
            .entry(database.to_string())
            .or_default()
            .entry(collection.to_string())
            .or_default();
        if docs.contains_key(&record.id) {
            return Ok(InsertOutcome::DuplicateId);
        }
        docs.insert(record.id, doc);
        Ok(InsertOutcome::Stored)
    }

    async fn find(
        &self,
        database: &str,
        collection: &str,
        filter: Option<&Filter>,
    ) -> Result<Cursor> {
        self.check_online()?;
        let databases = self.databases.read().unwrap_or_else(|e| e.into_inner());
        let docs = databases
            .get(database)
            .and_then(|colls| colls.get(collection));
        let items = match docs {
            Some(docs) => docs
                .values()
                .filter(|d| filter.map_or(true, |f| f.matches(d)))
                .cloned()
                .collect(),
            None => Vec::new(),
        };
        Ok(Cursor { items })
    }

    async fn list_databases(&self) -> Result<Vec<String>> {
        self.check_online()?;
        let databases = self.databases.read().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = databases.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn list_collections(&self, database: &str) -> Result<Vec<String>> {
        self.check_online()?;
        let databases = self.databases.read().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = databases
            .get(database)
            .map(|colls| colls.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        Ok(names)
    }

    async fn drop_database(&self, database: &str) -> Result<()> {
        self.check_online()?;
        self.databases
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(database);
        Ok(())
    }

    async fn drop_collection(&self, database: &str, collection: &str) -> Result<()> {
        self.check_online()?;
        let mut databases = self.databases.write().unwrap_or_else(|e| e.into_inner());
        if let Some(colls) = databases.get_mut(database) {
            colls.remove(collection);
        }
        Ok(())
    }
}
