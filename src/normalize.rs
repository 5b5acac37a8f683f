//! Text normalization: tokenize, repair, classify.
//!
//! Social-media text defeats a generic word tokenizer: `#tag` splits into
//! `#` + `tag`, `@user` into `@` + `user`, URLs shatter at the scheme, and
//! contractions split into fragments (`can't` becomes `ca` + `n't`). The
//! normalizer runs three stages:
//!
//! 1. [`tokenize`] — a deliberately generic tokenizer (word runs, single
//!    punctuation marks) known to mangle the tokens above.
//! 2. [`repair`] — a single left-to-right scan that re-merges entity and
//!    URL fragments and rewrites contraction fragments. The pass builds a
//!    new sequence rather than mutating the one being scanned.
//! 3. Classification — lower-case each repaired token and place it in
//!    exactly one [`TokenSet`] bucket, entity match first. Truncation
//!    artifacts (tokens ending in `…`) and bare `http`/`https` leftovers
//!    are dropped entirely.
//!
//! All token resources (stopword list, punctuation set) are compiled in,
//! so normalization is total: malformed input never produces an error.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::TokenSet;

/// Fixed English stopword list used by both the normalizer and the
/// feature extractor.
pub const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "ain", "all", "am", "an", "and", "any",
    "are", "aren", "as", "at", "be", "because", "been", "before", "being", "below", "between",
    "both", "but", "by", "can", "couldn", "d", "did", "didn", "do", "does", "doesn", "doing",
    "don", "down", "during", "each", "few", "for", "from", "further", "had", "hadn", "has",
    "hasn", "have", "haven", "having", "he", "her", "here", "hers", "herself", "him", "himself",
    "his", "how", "i", "if", "in", "into", "is", "isn", "it", "its", "itself", "just", "ll", "m",
    "ma", "me", "mightn", "more", "most", "mustn", "my", "myself", "needn", "no", "nor", "not",
    "now", "o", "of", "off", "on", "once", "only", "or", "other", "our", "ours", "ourselves",
    "out", "over", "own", "re", "s", "same", "shan", "she", "should", "shouldn", "so", "some",
    "such", "t", "than", "that", "the", "their", "theirs", "them", "themselves", "then", "there",
    "these", "they", "this", "those", "through", "to", "too", "under", "until", "up", "ve",
    "very", "was", "wasn", "we", "were", "weren", "what", "when", "where", "which", "while",
    "who", "whom", "why", "will", "with", "won", "wouldn", "y", "you", "your", "yours",
    "yourself", "yourselves",
];

/// Multi-character punctuation tokens treated as stopwords, the way a
/// corpus tokenizer emits them.
const EXTRA_PUNCTUATION: &[&str] = &["''", "``", "—", "…", "...", "--", ".."];

/// Retweet marker; noise in every bucket it could land in.
const RETWEET_MARKER: &str = "rt";

/// True if `token` is a punctuation mark (single or compound).
pub fn is_punctuation(token: &str) -> bool {
    if EXTRA_PUNCTUATION.contains(&token) {
        return true;
    }
    !token.is_empty() && token.chars().all(|c| c.is_ascii_punctuation())
}

/// True if `token` belongs to the augmented stopword set: the fixed
/// English list, punctuation marks, and the retweet marker.
pub fn is_stop_word(token: &str) -> bool {
    token == RETWEET_MARKER || STOP_WORDS.contains(&token) || is_punctuation(token)
}

fn entity_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:[#@]\w+:?|https?:\S*)$").expect("entity pattern is valid")
    })
}

/// True if `token` is a reconstructed hashtag, mention, or URL.
pub fn is_entity(token: &str) -> bool {
    entity_pattern().is_match(token)
}

/// Generic word tokenizer.
///
/// Word runs (alphanumerics, `_`, internal apostrophes) become one token;
/// every other non-space character becomes its own token, with two
/// concessions to raw stream text: a `/`-initiated run extends to the next
/// whitespace (so a URL path survives as one fragment), and the `…`
/// truncation glyph stays attached to the word it cut short. Contractions
/// split the way a treebank tokenizer splits them: `can't` → `ca` + `n't`,
/// `you're` → `you` + `'re`.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut word = String::new();
    let mut chars = text.chars().peekable();

    let flush = |word: &mut String, tokens: &mut Vec<String>| {
        if !word.is_empty() {
            split_contraction(word, tokens);
            word.clear();
        }
    };

    while let Some(c) = chars.next() {
        if c.is_alphanumeric() || c == '_' || c == '\'' {
            word.push(c);
        } else if c == '…' {
            if word.is_empty() {
                tokens.push("…".to_string());
            } else {
                word.push(c);
                flush(&mut word, &mut tokens);
            }
        } else if c.is_whitespace() {
            flush(&mut word, &mut tokens);
        } else if c == '/' {
            flush(&mut word, &mut tokens);
            let mut run = String::from('/');
            while let Some(&next) = chars.peek() {
                if next.is_whitespace() {
                    break;
                }
                run.push(next);
                chars.next();
            }
            tokens.push(run);
        } else {
            flush(&mut word, &mut tokens);
            tokens.push(c.to_string());
        }
    }
    flush(&mut word, &mut tokens);
    tokens
}

/// Split a word run holding an apostrophe into contraction fragments.
fn split_contraction(word: &str, tokens: &mut Vec<String>) {
    if word.len() > 3 && word.ends_with("n't") {
        tokens.push(word[..word.len() - 3].to_string());
        tokens.push("n't".to_string());
    } else if word.len() > 3 && word.ends_with("'re") {
        tokens.push(word[..word.len() - 3].to_string());
        tokens.push("'re".to_string());
    } else {
        tokens.push(word.to_string());
    }
}

/// Repair pass: one left-to-right scan producing a new sequence.
///
/// - `@` or `#` merges with the following token (`@user`, `#tag`); a `:`
///   immediately after is absorbed too (`@user:`).
/// - `http` / `https` merges with up to the next two tokens to
///   reconstruct a URL.
/// - `n't` is rewritten to the literal word `not`; when the preceding
///   token ends in a vowel it gains a trailing `n` first, so `ca` + `n't`
///   comes out as `can` + `not`.
/// - `'re` is rewritten to `are`.
pub fn repair(tokens: &[String]) -> Vec<String> {
    let mut repaired: Vec<String> = Vec::with_capacity(tokens.len());
    let mut i = 0;

    while i < tokens.len() {
        match tokens[i].as_str() {
            marker @ ("@" | "#") if i + 1 < tokens.len() => {
                let mut merged = format!("{}{}", marker, tokens[i + 1]);
                i += 2;
                if i < tokens.len() && tokens[i] == ":" {
                    merged.push(':');
                    i += 1;
                }
                repaired.push(merged);
            }
            scheme @ ("http" | "https") => {
                let tail = (tokens.len() - i - 1).min(2);
                let mut merged = scheme.to_string();
                for part in &tokens[i + 1..i + 1 + tail] {
                    merged.push_str(part);
                }
                repaired.push(merged);
                i += 1 + tail;
            }
            "n't" => {
                if let Some(prev) = repaired.last_mut() {
                    if prev.ends_with(['a', 'e', 'i', 'o', 'u']) {
                        prev.push('n');
                    }
                }
                repaired.push("not".to_string());
                i += 1;
            }
            "'re" => {
                repaired.push("are".to_string());
                i += 1;
            }
            _ => {
                repaired.push(tokens[i].clone());
                i += 1;
            }
        }
    }
    repaired
}

/// Normalize raw message text into a four-way token partition.
///
/// Never fails: any input, however malformed, yields a (possibly empty)
/// [`TokenSet`].
pub fn normalize(text: &str) -> TokenSet {
    let repaired = repair(&tokenize(text));
    let mut set = TokenSet::default();

    for token in repaired {
        let token = token.to_lowercase();

        // Truncation artifact of the upstream message-length limit.
        if token.chars().count() > 1 && token.ends_with('…') {
            continue;
        }
        // A scheme with nothing to merge is noise, not a word.
        if token == "http" || token == "https" {
            continue;
        }

        if is_entity(&token) {
            set.entities.push(token);
        } else if is_stop_word(&token) {
            if is_punctuation(&token) {
                set.punctuation.push(token);
            } else {
                set.stop_words.push(token);
            }
        } else {
            set.words.push(token);
        }
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_tokenize_splits_hashtags_and_mentions() {
        assert_eq!(tokenize("#great day"), toks(&["#", "great", "day"]));
        assert_eq!(tokenize("@user: hi"), toks(&["@", "user", ":", "hi"]));
    }

    #[test]
    fn test_tokenize_splits_contractions_like_a_treebank() {
        assert_eq!(tokenize("can't wait"), toks(&["ca", "n't", "wait"]));
        assert_eq!(tokenize("you're here"), toks(&["you", "'re", "here"]));
    }

    #[test]
    fn test_tokenize_shatters_urls_at_the_scheme() {
        assert_eq!(
            tokenize("see https://t.co/abc now"),
            toks(&["see", "https", ":", "//t.co/abc", "now"])
        );
    }

    #[test]
    fn test_repair_reconstructs_hashtag() {
        assert_eq!(
            repair(&toks(&["#", "great", "day"])),
            toks(&["#great", "day"])
        );
    }

    #[test]
    fn test_repair_mention_absorbs_trailing_colon() {
        assert_eq!(repair(&toks(&["@", "user", ":"])), toks(&["@user:"]));
    }

    #[test]
    fn test_repair_rebuilds_url_from_three_fragments() {
        assert_eq!(
            repair(&toks(&["https", ":", "//t.co/abc", "wow"])),
            toks(&["https://t.co/abc", "wow"])
        );
    }

    #[test]
    fn test_repair_expands_not_contraction() {
        assert_eq!(
            repair(&toks(&["ca", "n't", "wait"])),
            toks(&["can", "not", "wait"])
        );
        // Preceding token not ending in a vowel is left alone.
        assert_eq!(repair(&toks(&["is", "n't"])), toks(&["is", "not"]));
    }

    #[test]
    fn test_repair_expands_are_contraction() {
        assert_eq!(repair(&toks(&["you", "'re"])), toks(&["you", "are"]));
    }

    #[test]
    fn test_repair_trailing_marker_survives() {
        // Nothing after the marker to merge with.
        assert_eq!(repair(&toks(&["hello", "#"])), toks(&["hello", "#"]));
    }

    #[test]
    fn test_normalize_buckets() {
        let set = normalize("RT @user: can't wait for the #great day!");
        assert_eq!(set.entities, toks(&["@user:", "#great"]));
        assert_eq!(set.words, toks(&["wait", "day"]));
        assert!(set.stop_words.contains(&"rt".to_string()));
        assert!(set.stop_words.contains(&"can".to_string()));
        assert!(set.stop_words.contains(&"not".to_string()));
        assert!(set.stop_words.contains(&"the".to_string()));
        assert!(set.stop_words.contains(&"for".to_string()));
        assert_eq!(set.punctuation, toks(&["!"]));
    }

    #[test]
    fn test_normalize_url_is_an_entity() {
        let set = normalize("look https://t.co/xyz");
        assert_eq!(set.entities, toks(&["https://t.co/xyz"]));
        assert_eq!(set.words, toks(&["look"]));
    }

    #[test]
    fn test_normalize_drops_truncation_artifacts() {
        let set = normalize("an interesting stor…");
        assert_eq!(set.words, toks(&["interesting"]));
        assert!(!set.words.iter().any(|w| w.ends_with('…')));
    }

    #[test]
    fn test_normalize_drops_bare_scheme() {
        // A lone scheme has nothing to merge with and is excluded.
        let set = normalize("http");
        assert!(set.is_empty());
    }

    #[test]
    fn test_partition_is_exact() {
        let text = "RT @user: can't wait, the #great day is here! https://t.co/a b…";
        let repaired = repair(&tokenize(text));
        let dropped = repaired
            .iter()
            .map(|t| t.to_lowercase())
            .filter(|t| {
                (t.chars().count() > 1 && t.ends_with('…')) || t == "http" || t == "https"
            })
            .count();
        let set = normalize(text);
        assert_eq!(set.len() + dropped, repaired.len());
    }

    #[test]
    fn test_normalize_never_panics_on_garbage() {
        for text in ["", "   ", "\u{0}\u{1f600}…", "@", "# ", "https https"] {
            let _ = normalize(text);
        }
    }
}
