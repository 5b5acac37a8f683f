//! # sentistream
//!
//! Keyword-filtered ingestion of a live text stream, per-message
//! sentiment scoring, and persistence to a document store.
//!
//! ```text
//!  stream endpoint              sentistream                    store
//! ┌───────────────┐   ┌──────────────────────────────┐   ┌───────────┐
//! │ chunked HTTP  │──▶│ normalize ─▶ features ─▶ score│──▶│ documents │
//! │ (or replay)   │   │        session controller     │   │  (REST)   │
//! └───────────────┘   └──────────────────────────────┘   └───────────┘
//! ```
//!
//! Each accepted message is scored five ways before it is written: two
//! lexicon labels (polarity and subjectivity), one rule-based compound
//! polarity, and two trained Naive Bayes labels loaded from artifacts on
//! disk.
//!
//! ## Modules
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`config`] | TOML configuration with defaults and validation |
//! | [`error`] | error taxonomy with message/session/process severity |
//! | [`models`] | message, token set, label and record types |
//! | [`normalize`] | tokenizer repair and token classification |
//! | [`features`] | bag-of-words feature extraction |
//! | [`sentiment`] | lexicon and rule-based compound scorers |
//! | [`classifier`] | trained Naive Bayes scorers and their artifacts |
//! | [`source`] | live, replay, and scripted stream sources |
//! | [`session`] | session state machine and ingest loop |
//! | [`store`] | document store trait, HTTP and in-memory backends |
//! | [`recents`] | hosts/last/keywords state files |
//! | [`report`] | per-label collection statistics |

pub mod classifier;
pub mod config;
pub mod error;
pub mod features;
pub mod models;
pub mod normalize;
pub mod recents;
pub mod report;
pub mod sentiment;
pub mod session;
pub mod source;
pub mod store;

pub use error::{Error, Result, Severity};
pub use models::SentimentRecord;
pub use session::{SessionController, SessionHandle, SessionReport, SessionState};
