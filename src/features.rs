//! Bag-of-words feature extraction for the trained classifier.

use std::collections::BTreeMap;

use crate::normalize::is_stop_word;

/// Convert a cleaned token sequence into presence-only features.
///
/// Lower-cases each token, drops stopwords and pure-digit tokens, and
/// returns a set-like mapping (every surviving token maps to `true`;
/// counts are not kept). This representation feeds the trained polarity
/// classifier only — the lexicon and rule-based scorers consume joined
/// cleaned text instead.
pub fn bag_of_words<S: AsRef<str>>(tokens: &[S]) -> BTreeMap<String, bool> {
    let mut features = BTreeMap::new();
    for token in tokens {
        let word = token.as_ref().to_lowercase();
        if word.is_empty() || is_stop_word(&word) {
            continue;
        }
        if word.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        features.insert(word, true);
    }
    features
}
