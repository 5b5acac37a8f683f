//! Upstream message sources.
//!
//! A [`StreamSource`] opens a keyword-filtered connection; the resulting
//! [`StreamConnection`] is polled for [`StreamEvent`]s until it is
//! exhausted or the session decides to stop. Three sources exist:
//!
//! - [`HttpSource`] attaches to a live chunked-HTTP endpoint.
//! - [`ReplaySource`] feeds a newline-delimited JSON capture file, for
//!   offline runs and integration tests.
//! - [`ScriptedConnection`] replays a fixed event list, for unit tests.

use std::collections::VecDeque;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::RawMessage;

/// One observation from an open stream connection.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// The upstream acknowledged the connection.
    Connected,
    /// A message arrived.
    Data(RawMessage),
    /// The upstream rejected or throttled us.
    Error { status: u16 },
    /// The connection dropped.
    Disconnected { reason: String },
}

/// Factory for stream connections.
#[async_trait]
pub trait StreamSource: Send + Sync {
    /// Open a connection filtered to the given keywords.
    async fn open(&self, keywords: &[String]) -> Result<Box<dyn StreamConnection>>;
}

/// An open, pollable stream of events.
#[async_trait]
pub trait StreamConnection: Send {
    /// Next event, or `None` once the stream is exhausted.
    async fn next_event(&mut self) -> Option<StreamEvent>;
}

/// Human-readable meaning of an upstream HTTP status.
pub fn describe_status(status: u16) -> &'static str {
    match status {
        304 => "no new data to return",
        401 => "authentication credentials were missing or incorrect",
        403 => "access to the requested resource is forbidden",
        420 => "rate limited for making too many requests",
        500 => "something is broken upstream",
        503 => "the upstream servers are overloaded",
        504 => "the upstream request timed out",
        _ => "unexpected response from upstream",
    }
}

/// Live chunked-HTTP stream source.
///
/// The bearer token is read from the environment at open time so it never
/// lands in config files.
pub struct HttpSource {
    client: reqwest::Client,
    endpoint: String,
    token_env: String,
}

impl HttpSource {
    pub fn new(endpoint: &str, token_env: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            token_env: token_env.to_string(),
        }
    }
}

#[async_trait]
impl StreamSource for HttpSource {
    async fn open(&self, keywords: &[String]) -> Result<Box<dyn StreamConnection>> {
        let token = std::env::var(&self.token_env).map_err(|_| {
            Error::Config(format!(
                "environment variable {} is not set",
                self.token_env
            ))
        })?;
        let response = self
            .client
            .get(&self.endpoint)
            .bearer_auth(token)
            .query(&[("track", keywords.join(","))])
            .send()
            .await
            .map_err(|e| Error::Disconnected(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            // Surface the status through the event stream so the session
            // applies its normal error handling.
            return Ok(Box::new(ScriptedConnection::new(vec![StreamEvent::Error {
                status,
            }])));
        }
        Ok(Box::new(HttpConnection {
            response,
            buffer: Vec::new(),
            announced: false,
        }))
    }
}

struct HttpConnection {
    response: reqwest::Response,
    buffer: Vec<u8>,
    announced: bool,
}

impl HttpConnection {
    /// Pop the first complete line out of the buffer, if any.
    fn take_line(&mut self) -> Option<String> {
        let newline = self.buffer.iter().position(|&b| b == b'\n')?;
        let line: Vec<u8> = self.buffer.drain(..=newline).collect();
        Some(String::from_utf8_lossy(&line).trim().to_string())
    }
}

#[async_trait]
impl StreamConnection for HttpConnection {
    async fn next_event(&mut self) -> Option<StreamEvent> {
        if !self.announced {
            self.announced = true;
            return Some(StreamEvent::Connected);
        }
        loop {
            if let Some(line) = self.take_line() {
                if line.is_empty() {
                    // Keep-alive newline.
                    continue;
                }
                match serde_json::from_str::<RawMessage>(&line) {
                    Ok(message) => return Some(StreamEvent::Data(message)),
                    Err(err) => {
                        debug!(%err, "skipping malformed stream line");
                        continue;
                    }
                }
            }
            match self.response.chunk().await {
                Ok(Some(bytes)) => self.buffer.extend_from_slice(&bytes),
                Ok(None) => return None,
                Err(err) => {
                    return Some(StreamEvent::Disconnected {
                        reason: err.to_string(),
                    })
                }
            }
        }
    }
}

/// Capture-file source: one JSON message per line.
pub struct ReplaySource {
    path: PathBuf,
}

impl ReplaySource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl StreamSource for ReplaySource {
    async fn open(&self, _keywords: &[String]) -> Result<Box<dyn StreamConnection>> {
        let raw = fs::read_to_string(&self.path).await.map_err(|e| {
            Error::Config(format!(
                "failed to read replay file {}: {e}",
                self.path.display()
            ))
        })?;
        let mut events = vec![StreamEvent::Connected];
        for line in raw.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<RawMessage>(line) {
                Ok(message) => events.push(StreamEvent::Data(message)),
                Err(err) => debug!(%err, "skipping malformed replay line"),
            }
        }
        Ok(Box::new(ScriptedConnection::new(events)))
    }
}

/// Connection that yields a pre-built event list in order.
pub struct ScriptedConnection {
    events: VecDeque<StreamEvent>,
}

impl ScriptedConnection {
    pub fn new(events: Vec<StreamEvent>) -> Self {
        Self {
            events: events.into(),
        }
    }
}

#[async_trait]
impl StreamConnection for ScriptedConnection {
    async fn next_event(&mut self) -> Option<StreamEvent> {
        self.events.pop_front()
    }
}

/// Source wrapper around a fixed event list, for session tests.
pub struct ScriptedSource {
    events: Vec<StreamEvent>,
}

impl ScriptedSource {
    pub fn new(events: Vec<StreamEvent>) -> Self {
        Self { events }
    }
}

#[async_trait]
impl StreamSource for ScriptedSource {
    async fn open(&self, _keywords: &[String]) -> Result<Box<dyn StreamConnection>> {
        Ok(Box::new(ScriptedConnection::new(self.events.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn test_describe_status_table() {
        assert_eq!(
            describe_status(401),
            "authentication credentials were missing or incorrect"
        );
        assert_eq!(describe_status(420), "rate limited for making too many requests");
        assert_eq!(describe_status(999), "unexpected response from upstream");
    }

    #[tokio::test]
    async fn test_replay_source_reads_ndjson() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.ndjson");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, r#"{{"id": 1, "text": "first", "lang": "en"}}"#).unwrap();
        writeln!(file, "this line is not json").unwrap();
        writeln!(file, r#"{{"id": 2, "text": "second", "lang": "fr"}}"#).unwrap();

        let source = ReplaySource::new(path);
        let mut conn = source.open(&[]).await.unwrap();

        assert!(matches!(conn.next_event().await, Some(StreamEvent::Connected)));
        match conn.next_event().await {
            Some(StreamEvent::Data(msg)) => {
                assert_eq!(msg.id, 1);
                assert_eq!(msg.text, "first");
            }
            other => panic!("expected data event, got {other:?}"),
        }
        match conn.next_event().await {
            Some(StreamEvent::Data(msg)) => assert_eq!(msg.lang, "fr"),
            other => panic!("expected data event, got {other:?}"),
        }
        assert!(conn.next_event().await.is_none());
    }

    #[tokio::test]
    async fn test_replay_source_missing_file() {
        let source = ReplaySource::new(PathBuf::from("/nonexistent/capture.ndjson"));
        assert!(matches!(source.open(&[]).await, Err(Error::Config(_))));
    }
}
