//! Streaming session lifecycle.
//!
//! A [`SessionController`] owns one session and walks it through:
//!
//! ```text
//! Idle -> Connecting -> Streaming <-> Paused
//!                          |
//!                          v
//!                      Stopping -> Stopped
//! ```
//!
//! Stop and pause are requested through a cloneable [`SessionHandle`]
//! backed by atomic flags, so a signal handler or another task can
//! interrupt the loop without holding the controller. The loop observes
//! the stop flag between events: a stop request takes effect at the next
//! poll, never mid-record.
//!
//! Pause keeps the connection alive. While paused, incoming events are
//! drained and acknowledged but nothing is scored or stored; resume picks
//! the stream back up where it is, not where it was.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::classifier::TrainedScorers;
use crate::error::{Error, Result};
use crate::features::bag_of_words;
use crate::models::{
    LexiconScores, RawMessage, RuleBasedScores, SentimentRecord, TrainedScores,
};
use crate::normalize::normalize;
use crate::recents::StateFiles;
use crate::sentiment;
use crate::source::{describe_status, StreamEvent, StreamSource};
use crate::store::{DocumentStore, InsertOutcome};

/// Progress is logged every this many stored records.
const PROGRESS_INTERVAL: u64 = 100;

/// Where a session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Streaming,
    Paused,
    Stopping,
    Stopped,
}

/// Final counters of a completed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionReport {
    /// Records written to the store.
    pub stored: u64,
    /// Messages dropped for language mismatch or duplicate id.
    pub ignored: u64,
}

/// External control surface for a running session.
#[derive(Clone)]
pub struct SessionHandle {
    stop_flag: Arc<AtomicBool>,
    pause_flag: Arc<AtomicBool>,
}

impl SessionHandle {
    /// Request a stop. Takes effect at the next event poll.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
    }

    /// Request a pause. The connection stays open.
    pub fn pause(&self) {
        self.pause_flag.store(true, Ordering::SeqCst);
    }

    /// Clear a pause so scoring resumes.
    pub fn resume(&self) {
        self.pause_flag.store(false, Ordering::SeqCst);
    }
}

/// Drives one streaming session end to end.
pub struct SessionController {
    state: SessionState,
    stored_count: u64,
    ignored_count: u64,
    stop_flag: Arc<AtomicBool>,
    pause_flag: Arc<AtomicBool>,
    target_lang: String,
    scorers: TrainedScorers,
    store: Arc<dyn DocumentStore>,
    database: String,
    collection: String,
}

impl SessionController {
    pub fn new(
        scorers: TrainedScorers,
        store: Arc<dyn DocumentStore>,
        target_lang: &str,
        database: &str,
        collection: &str,
    ) -> Self {
        Self {
            state: SessionState::Idle,
            stored_count: 0,
            ignored_count: 0,
            stop_flag: Arc::new(AtomicBool::new(false)),
            pause_flag: Arc::new(AtomicBool::new(false)),
            target_lang: target_lang.to_string(),
            scorers,
            store,
            database: database.to_string(),
            collection: collection.to_string(),
        }
    }

    /// Control handle sharing this session's flags.
    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            stop_flag: Arc::clone(&self.stop_flag),
            pause_flag: Arc::clone(&self.pause_flag),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn stored_count(&self) -> u64 {
        self.stored_count
    }

    pub fn ignored_count(&self) -> u64 {
        self.ignored_count
    }

    /// Pause a streaming session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] unless the session is
    /// currently streaming.
    pub fn pause(&mut self) -> Result<()> {
        if self.state != SessionState::Streaming {
            return Err(Error::InvalidTransition(format!(
                "cannot pause while {:?}",
                self.state
            )));
        }
        self.pause_flag.store(true, Ordering::SeqCst);
        self.state = SessionState::Paused;
        info!("session paused");
        Ok(())
    }

    /// Resume a paused session.
    pub fn resume(&mut self) -> Result<()> {
        if self.state != SessionState::Paused {
            return Err(Error::InvalidTransition(format!(
                "cannot resume while {:?}",
                self.state
            )));
        }
        self.pause_flag.store(false, Ordering::SeqCst);
        self.state = SessionState::Streaming;
        info!("session resumed");
        Ok(())
    }

    /// Request a stop. Idempotent: stopping an already-stopped session is
    /// a no-op.
    pub fn stop(&mut self) -> Result<()> {
        if self.state == SessionState::Stopped {
            return Ok(());
        }
        self.stop_flag.store(true, Ordering::SeqCst);
        if self.state != SessionState::Idle {
            self.state = SessionState::Stopping;
        }
        info!("session stop requested");
        Ok(())
    }

    /// Connect to the source and pump events until the stream ends, a
    /// session-severity error strikes, or a stop is requested.
    ///
    /// Keywords are trimmed and recorded in the recency file before the
    /// connection opens.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an empty keyword list,
    /// [`Error::Upstream`] when the source rejects the connection, and
    /// [`Error::Disconnected`] or [`Error::StoreConnection`] when the
    /// stream or store drops mid-session. In every error case the session
    /// ends in [`SessionState::Stopped`].
    pub async fn run(
        &mut self,
        source: &dyn StreamSource,
        keywords: &[String],
        files: &StateFiles,
    ) -> Result<SessionReport> {
        let keywords: Vec<String> = keywords
            .iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        if keywords.is_empty() {
            return Err(Error::InvalidInput(
                "enter a keyword to track".to_string(),
            ));
        }
        for keyword in &keywords {
            if let Err(err) = files.record_keyword(keyword) {
                warn!(%err, "failed to update keyword history");
            }
        }

        self.state = SessionState::Connecting;
        info!(keywords = %keywords.join(","), "connecting to stream");
        let mut connection = match source.open(&keywords).await {
            Ok(conn) => conn,
            Err(err) => {
                self.state = SessionState::Stopped;
                return Err(err);
            }
        };

        loop {
            if self.stop_flag.load(Ordering::SeqCst) {
                self.state = SessionState::Stopping;
                info!("stop flag observed, closing stream");
                break;
            }
            let Some(event) = connection.next_event().await else {
                break;
            };
            match event {
                StreamEvent::Connected => {
                    self.state = SessionState::Streaming;
                    self.stored_count = 0;
                    self.ignored_count = 0;
                    info!("stream connected");
                }
                StreamEvent::Data(message) => {
                    if self.pause_flag.load(Ordering::SeqCst) {
                        // Acknowledge and drop: the upstream keeps the
                        // connection alive while we sit out.
                        self.state = SessionState::Paused;
                        continue;
                    }
                    if self.state == SessionState::Paused {
                        self.state = SessionState::Streaming;
                    }
                    if let Err(err) = self.on_message(message).await {
                        self.state = SessionState::Stopped;
                        return Err(err);
                    }
                }
                StreamEvent::Error { status } => {
                    self.state = SessionState::Stopped;
                    return Err(Error::Upstream {
                        status,
                        reason: describe_status(status).to_string(),
                    });
                }
                StreamEvent::Disconnected { reason } => {
                    self.state = SessionState::Stopped;
                    return Err(Error::Disconnected(reason));
                }
            }
        }

        self.state = SessionState::Stopped;
        info!(
            stored = self.stored_count,
            ignored = self.ignored_count,
            "session finished"
        );
        Ok(SessionReport {
            stored: self.stored_count,
            ignored: self.ignored_count,
        })
    }

    /// Score one message and write it, tallying the outcome.
    async fn on_message(&mut self, message: RawMessage) -> Result<()> {
        if message.lang != self.target_lang {
            self.ignored_count += 1;
            debug!(id = message.id, lang = %message.lang, "ignoring off-language message");
            return Ok(());
        }
        let record = self.build_record(&message);
        match self
            .store
            .insert(&self.database, &self.collection, &record)
            .await?
        {
            InsertOutcome::Stored => {
                self.stored_count += 1;
                if self.stored_count % PROGRESS_INTERVAL == 0 {
                    info!(stored = self.stored_count, "session progress");
                }
            }
            InsertOutcome::DuplicateId => {
                self.ignored_count += 1;
                debug!(id = message.id, "duplicate id, record ignored");
            }
        }
        Ok(())
    }

    /// Normalize the text and apply all five scorers.
    fn build_record(&self, message: &RawMessage) -> SentimentRecord {
        let cleaned = normalize(&message.text);
        let joined = cleaned.joined_words();
        let features = bag_of_words(&cleaned.words);

        SentimentRecord {
            id: message.id,
            whole_text: message.text.clone(),
            lexicon: LexiconScores {
                polarity: sentiment::lexicon_polarity(&joined),
                subjectivity: sentiment::lexicon_subjectivity(&joined),
            },
            rule_based: RuleBasedScores {
                polarity: sentiment::compound_polarity(&joined),
            },
            trained: TrainedScores {
                polarity: self.scorers.polarity(&features),
                // The subjectivity model was trained on whole
                // whitespace-tokenized text, so stopwords and entities
                // stay in its input.
                subjectivity: self.scorers.subjectivity(&message.text),
            },
            cleaned_text: cleaned,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{LabelParams, TrainedModel};
    use crate::source::ScriptedSource;
    use crate::store::MemoryStore;
    use std::collections::HashMap;

    fn scorers() -> TrainedScorers {
        let model = |a: &str, b: &str| TrainedModel {
            labels: vec![
                LabelParams {
                    label: a.to_string(),
                    log_prior: -0.5,
                    log_likelihood: HashMap::new(),
                    unseen_log_likelihood: -4.0,
                },
                LabelParams {
                    label: b.to_string(),
                    log_prior: -0.9,
                    log_likelihood: HashMap::new(),
                    unseen_log_likelihood: -4.0,
                },
            ],
        };
        TrainedScorers::from_models(model("pos", "neg"), model("obj", "subj"))
    }

    fn message(id: i64, text: &str, lang: &str) -> StreamEvent {
        StreamEvent::Data(RawMessage {
            id,
            text: text.to_string(),
            lang: lang.to_string(),
        })
    }

    fn controller(store: Arc<dyn DocumentStore>) -> SessionController {
        SessionController::new(scorers(), store, "en", "tweets", "stream")
    }

    fn state_files() -> (tempfile::TempDir, StateFiles) {
        let dir = tempfile::tempdir().unwrap();
        let files = StateFiles::new(dir.path());
        (dir, files)
    }

    #[tokio::test]
    async fn test_language_filter_and_counters() {
        let store = Arc::new(MemoryStore::new());
        let mut session = controller(store.clone());
        let (_dir, files) = state_files();
        let source = ScriptedSource::new(vec![
            StreamEvent::Connected,
            message(1, "a great day", "en"),
            message(2, "une belle journée", "fr"),
            message(3, "what a mess", "en"),
        ]);

        let report = session
            .run(&source, &["day".to_string()], &files)
            .await
            .unwrap();
        assert_eq!(report.stored, 2);
        assert_eq!(report.ignored, 1);
        assert_eq!(session.state(), SessionState::Stopped);
        assert_eq!(store.find("tweets", "stream", None).await.unwrap().count(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_id_counts_as_ignored() {
        let store = Arc::new(MemoryStore::new());
        let mut session = controller(store.clone());
        let (_dir, files) = state_files();
        let source = ScriptedSource::new(vec![
            StreamEvent::Connected,
            message(7, "first copy", "en"),
            message(7, "second copy", "en"),
        ]);

        let report = session
            .run(&source, &["copy".to_string()], &files)
            .await
            .unwrap();
        assert_eq!(report.stored, 1);
        assert_eq!(report.ignored, 1);
    }

    #[tokio::test]
    async fn test_pause_flag_drains_without_storing() {
        let store = Arc::new(MemoryStore::new());
        let mut session = controller(store.clone());
        let handle = session.handle();
        handle.pause();
        let (_dir, files) = state_files();
        let source = ScriptedSource::new(vec![
            StreamEvent::Connected,
            message(1, "while paused", "en"),
            message(2, "still paused", "en"),
        ]);

        let report = session
            .run(&source, &["paused".to_string()], &files)
            .await
            .unwrap();
        // Paused messages are acknowledged, not counted.
        assert_eq!(report.stored, 0);
        assert_eq!(report.ignored, 0);
        assert_eq!(store.find("tweets", "stream", None).await.unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_stop_flag_ends_run() {
        let store = Arc::new(MemoryStore::new());
        let mut session = controller(store);
        session.handle().stop();
        let (_dir, files) = state_files();
        let source = ScriptedSource::new(vec![
            StreamEvent::Connected,
            message(1, "never seen", "en"),
        ]);

        let report = session
            .run(&source, &["seen".to_string()], &files)
            .await
            .unwrap();
        assert_eq!(report.stored, 0);
        assert_eq!(session.state(), SessionState::Stopped);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let mut session = controller(store);
        assert!(session.stop().is_ok());
        assert!(session.stop().is_ok());
    }

    #[tokio::test]
    async fn test_pause_outside_streaming_rejected() {
        let store = Arc::new(MemoryStore::new());
        let mut session = controller(store);
        assert!(matches!(
            session.pause(),
            Err(Error::InvalidTransition(_))
        ));
        assert!(matches!(
            session.resume(),
            Err(Error::InvalidTransition(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_keywords_rejected() {
        let store = Arc::new(MemoryStore::new());
        let mut session = controller(store);
        let (_dir, files) = state_files();
        let source = ScriptedSource::new(vec![StreamEvent::Connected]);

        let result = session
            .run(&source, &["   ".to_string()], &files)
            .await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_upstream_error_stops_session() {
        let store = Arc::new(MemoryStore::new());
        let mut session = controller(store);
        let (_dir, files) = state_files();
        let source = ScriptedSource::new(vec![StreamEvent::Error { status: 420 }]);

        let result = session
            .run(&source, &["anything".to_string()], &files)
            .await;
        match result {
            Err(Error::Upstream { status, reason }) => {
                assert_eq!(status, 420);
                assert!(reason.contains("rate limited"));
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
        assert_eq!(session.state(), SessionState::Stopped);
    }

    #[tokio::test]
    async fn test_store_failure_mid_session() {
        let store = Arc::new(MemoryStore::new());
        let mut session = controller(store.clone());
        let (_dir, files) = state_files();
        store.set_offline(true);
        let source = ScriptedSource::new(vec![
            StreamEvent::Connected,
            message(1, "doomed write", "en"),
        ]);

        let result = session
            .run(&source, &["write".to_string()], &files)
            .await;
        assert!(matches!(result, Err(Error::StoreConnection(_))));
        assert_eq!(session.state(), SessionState::Stopped);
    }

    #[tokio::test]
    async fn test_keywords_recorded_before_connect() {
        let store = Arc::new(MemoryStore::new());
        let mut session = controller(store);
        let (_dir, files) = state_files();
        let source = ScriptedSource::new(vec![StreamEvent::Connected]);

        session
            .run(&source, &["  rust  ".to_string()], &files)
            .await
            .unwrap();
        assert_eq!(files.read_keywords().unwrap(), vec!["rust"]);
    }

    #[tokio::test]
    async fn test_trained_subjectivity_sees_raw_text_stopwords() {
        // The subjectivity model tokenizes the whole message, so a cue
        // word the normalizer files under stopwords must still reach it.
        let cue_model = TrainedModel {
            labels: vec![
                LabelParams {
                    label: "obj".to_string(),
                    log_prior: -0.7,
                    log_likelihood: HashMap::new(),
                    unseen_log_likelihood: -5.0,
                },
                LabelParams {
                    label: "subj".to_string(),
                    log_prior: -0.7,
                    log_likelihood: HashMap::from([("not".to_string(), -0.5)]),
                    unseen_log_likelihood: -5.0,
                },
            ],
        };
        let polarity_model = TrainedModel {
            labels: vec![LabelParams {
                label: "pos".to_string(),
                log_prior: -0.5,
                log_likelihood: HashMap::new(),
                unseen_log_likelihood: -4.0,
            }],
        };
        let store = Arc::new(MemoryStore::new());
        let mut session = SessionController::new(
            TrainedScorers::from_models(polarity_model, cue_model),
            store.clone(),
            "en",
            "tweets",
            "stream",
        );
        let (_dir, files) = state_files();
        let source = ScriptedSource::new(vec![
            StreamEvent::Connected,
            message(1, "not helpful", "en"),
        ]);

        session
            .run(&source, &["helpful".to_string()], &files)
            .await
            .unwrap();
        let cursor = store.find("tweets", "stream", None).await.unwrap();
        assert_eq!(cursor.items()[0]["trained"]["subjectivity"], "subj");
    }

    #[tokio::test]
    async fn test_record_carries_all_five_scores() {
        let store = Arc::new(MemoryStore::new());
        let mut session = controller(store.clone());
        let (_dir, files) = state_files();
        let source = ScriptedSource::new(vec![
            StreamEvent::Connected,
            message(42, "what a great wonderful day #rust", "en"),
        ]);

        session
            .run(&source, &["rust".to_string()], &files)
            .await
            .unwrap();
        let cursor = store.find("tweets", "stream", None).await.unwrap();
        assert_eq!(cursor.count(), 1);
        let doc = &cursor.items()[0];
        assert_eq!(doc["lexicon"]["polarity"], "pos");
        assert!(doc["rule_based"]["polarity"].is_string());
        assert!(doc["trained"]["polarity"].is_string());
        assert!(doc["trained"]["subjectivity"].is_string());
        assert_eq!(doc["whole_text"], "what a great wonderful day #rust");
    }
}
