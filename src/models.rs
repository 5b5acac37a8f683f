//! Core data models used throughout sentistream.
//!
//! These types represent the messages, token partitions, and labeled
//! records that flow through the ingestion and scoring pipeline.

use serde::{Deserialize, Serialize};

/// Raw item emitted by the upstream stream source before normalization.
///
/// Consumed once per arrival; never persisted as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMessage {
    pub id: i64,
    pub text: String,
    pub lang: String,
}

/// Partition of one message's repaired token sequence.
///
/// Every surviving token belongs to exactly one bucket; entity matching
/// takes priority over the stopword/punctuation classification. Built per
/// message by [`crate::normalize::normalize`] and consumed immediately by
/// the scoring engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenSet {
    pub words: Vec<String>,
    pub stop_words: Vec<String>,
    pub punctuation: Vec<String>,
    pub entities: Vec<String>,
}

impl TokenSet {
    /// Total number of classified tokens across all four buckets.
    pub fn len(&self) -> usize {
        self.words.len() + self.stop_words.len() + self.punctuation.len() + self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The meaningful content words joined with single spaces, as consumed
    /// by the lexicon and rule-based scorers.
    pub fn joined_words(&self) -> String {
        self.words.join(" ")
    }
}

/// Positive / neutral / negative sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Pos,
    Neu,
    Neg,
}

impl Polarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Polarity::Pos => "pos",
            Polarity::Neu => "neu",
            Polarity::Neg => "neg",
        }
    }
}

/// Subjective (opinion-bearing) vs. objective (factual) label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subjectivity {
    Subj,
    Obj,
}

impl Subjectivity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Subjectivity::Subj => "subj",
            Subjectivity::Obj => "obj",
        }
    }
}

/// Output of the lexicon-based scorer pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LexiconScores {
    pub polarity: Polarity,
    pub subjectivity: Subjectivity,
}

/// Output of the rule-based compound scorer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleBasedScores {
    pub polarity: Polarity,
}

/// Output of the two trained statistical classifiers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainedScores {
    pub polarity: Polarity,
    pub subjectivity: Subjectivity,
}

/// The persisted unit: one scored message.
///
/// `id` is the message id and the natural unique key — a duplicate insert
/// is rejected by the store, not overwritten. Records are never mutated
/// after insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentRecord {
    pub id: i64,
    pub whole_text: String,
    pub cleaned_text: TokenSet,
    pub lexicon: LexiconScores,
    pub rule_based: RuleBasedScores,
    pub trained: TrainedScores,
}
