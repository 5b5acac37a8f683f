//! Lexicon and rule-based sentiment scorers.
//!
//! Two of the three polarity scorers live here (the third is the trained
//! classifier in [`crate::classifier`]):
//!
//! - **Lexicon scorers** average per-word polarity / subjectivity ratings
//!   from a built-in lexicon and map the mean through a documented
//!   threshold.
//! - **Rule-based compound scorer** sums boosted, negation-aware word
//!   valences and squashes the total into `[-1, 1]` with the classic
//!   `sum / sqrt(sum² + 15)` normalization.
//!
//! All scorers are pure functions over text: no shared mutable state,
//! safe to call concurrently for different messages.
//!
//! # Label thresholds
//!
//! These are contracts, not tunables; boundary behavior is asserted by
//! tests at exactly these values.
//!
//! | Scorer | Rule |
//! |--------|------|
//! | lexicon polarity | `> 0` → pos, `== 0` → neu, `< 0` → neg |
//! | lexicon subjectivity | `>= 0.5` → subj, else obj |
//! | compound polarity | `> 0.2` → pos, `< -0.2` → neg, else neu |

use crate::models::{Polarity, Subjectivity};

/// Compound scores above this are positive.
pub const RULE_POSITIVE_THRESHOLD: f64 = 0.2;
/// Compound scores below this are negative.
pub const RULE_NEGATIVE_THRESHOLD: f64 = -0.2;
/// Lexicon subjectivity scores at or above this are subjective.
pub const SUBJECTIVITY_THRESHOLD: f64 = 0.5;

/// Normalization constant for the compound score denominator.
const COMPOUND_ALPHA: f64 = 15.0;
/// Lexicon ratings are in [-1, 1]; the compound normalization expects
/// valences in a [-4, 4] range.
const VALENCE_SCALE: f64 = 3.2;
/// Dampened inversion applied to a negated valence.
const NEGATION_FACTOR: f64 = -0.74;
/// A negation token affects valences up to this many tokens ahead.
const NEGATION_WINDOW: usize = 3;
/// Polarity inversion applied by a negation in the averaging scorers.
const LEXICON_NEGATION_FACTOR: f64 = -0.5;

/// Built-in sentiment lexicon: `(word, polarity, subjectivity)`.
///
/// Polarity in [-1, 1], subjectivity in [0, 1].
const LEXICON: &[(&str, f64, f64)] = &[
    // strongly positive
    ("amazing", 0.9, 0.95),
    ("awesome", 0.85, 0.9),
    ("beautiful", 0.8, 0.85),
    ("best", 0.9, 0.65),
    ("brilliant", 0.85, 0.9),
    ("delicious", 0.75, 0.9),
    ("excellent", 0.9, 0.9),
    ("fantastic", 0.85, 0.9),
    ("great", 0.8, 0.75),
    ("incredible", 0.85, 0.9),
    ("love", 0.75, 0.85),
    ("loved", 0.75, 0.85),
    ("perfect", 0.9, 0.9),
    ("wonderful", 0.85, 0.9),
    // moderately positive
    ("better", 0.5, 0.5),
    ("cool", 0.45, 0.6),
    ("enjoy", 0.5, 0.6),
    ("enjoyed", 0.5, 0.6),
    ("excited", 0.55, 0.8),
    ("fun", 0.5, 0.6),
    ("glad", 0.55, 0.75),
    ("good", 0.6, 0.6),
    ("happy", 0.7, 0.85),
    ("helpful", 0.5, 0.55),
    ("hope", 0.3, 0.6),
    ("impressive", 0.6, 0.7),
    ("interesting", 0.4, 0.55),
    ("like", 0.35, 0.5),
    ("nice", 0.55, 0.85),
    ("promising", 0.5, 0.6),
    ("proud", 0.6, 0.8),
    ("recommend", 0.45, 0.5),
    ("safe", 0.4, 0.4),
    ("smart", 0.5, 0.65),
    ("strong", 0.45, 0.45),
    ("succeed", 0.55, 0.5),
    ("success", 0.6, 0.55),
    ("successful", 0.6, 0.55),
    ("thanks", 0.45, 0.5),
    ("useful", 0.45, 0.45),
    ("win", 0.6, 0.55),
    ("winner", 0.6, 0.6),
    ("winning", 0.6, 0.6),
    ("wow", 0.55, 0.9),
    // strongly negative
    ("awful", -0.9, 0.95),
    ("disaster", -0.85, 0.8),
    ("disgusting", -0.9, 0.95),
    ("dreadful", -0.85, 0.95),
    ("hate", -0.8, 0.9),
    ("hated", -0.8, 0.9),
    ("horrible", -0.9, 0.95),
    ("pathetic", -0.8, 0.9),
    ("terrible", -0.9, 0.9),
    ("worst", -0.9, 0.7),
    // moderately negative
    ("angry", -0.6, 0.85),
    ("annoying", -0.55, 0.75),
    ("bad", -0.65, 0.65),
    ("boring", -0.5, 0.75),
    ("broken", -0.5, 0.5),
    ("crash", -0.55, 0.5),
    ("disappointed", -0.6, 0.8),
    ("disappointing", -0.6, 0.8),
    ("fail", -0.6, 0.55),
    ("failed", -0.6, 0.55),
    ("failure", -0.6, 0.55),
    ("fake", -0.5, 0.6),
    ("fear", -0.5, 0.7),
    ("lose", -0.45, 0.5),
    ("losing", -0.45, 0.5),
    ("loss", -0.45, 0.45),
    ("mess", -0.45, 0.6),
    ("poor", -0.5, 0.6),
    ("problem", -0.4, 0.4),
    ("sad", -0.6, 0.85),
    ("scam", -0.85, 0.85),
    ("slow", -0.35, 0.45),
    ("sorry", -0.35, 0.65),
    ("stupid", -0.7, 0.9),
    ("ugly", -0.6, 0.85),
    ("unhappy", -0.6, 0.85),
    ("useless", -0.6, 0.7),
    ("weak", -0.4, 0.5),
    ("worse", -0.6, 0.6),
    ("wrong", -0.5, 0.55),
];

/// Degree modifiers applied to the immediately following valence.
const BOOSTERS: &[(&str, f64)] = &[
    ("absolutely", 0.293),
    ("completely", 0.293),
    ("extremely", 0.293),
    ("incredibly", 0.293),
    ("really", 0.293),
    ("so", 0.293),
    ("totally", 0.293),
    ("very", 0.293),
    ("barely", -0.293),
    ("hardly", -0.293),
    ("slightly", -0.293),
    ("somewhat", -0.293),
];

/// Tokens that invert the sentiment of nearby words.
const NEGATIONS: &[&str] = &[
    "not", "no", "never", "cannot", "nothing", "neither", "nor", "without",
];

fn lookup(word: &str) -> Option<(f64, f64)> {
    LEXICON
        .iter()
        .find(|(w, _, _)| *w == word)
        .map(|(_, p, s)| (*p, *s))
}

fn booster(word: &str) -> Option<f64> {
    BOOSTERS.iter().find(|(w, _)| *w == word).map(|(_, b)| *b)
}

fn is_negation(word: &str) -> bool {
    NEGATIONS.contains(&word)
}

/// Mean lexicon polarity of the matched words in `text`, in [-1, 1].
///
/// A negation within the preceding window inverts and dampens the rating.
/// No matched words yields exactly `0.0`.
pub fn polarity_score(text: &str) -> f64 {
    let tokens: Vec<String> = text.split_whitespace().map(str::to_lowercase).collect();
    let mut total = 0.0;
    let mut matched = 0usize;

    for (i, token) in tokens.iter().enumerate() {
        if let Some((polarity, _)) = lookup(token) {
            let rating = if negated(&tokens, i) {
                polarity * LEXICON_NEGATION_FACTOR
            } else {
                polarity
            };
            total += rating;
            matched += 1;
        }
    }
    if matched == 0 {
        0.0
    } else {
        (total / matched as f64).clamp(-1.0, 1.0)
    }
}

/// Mean lexicon subjectivity of the matched words in `text`, in [0, 1].
///
/// No matched words yields `0.0` (treated as objective).
pub fn subjectivity_score(text: &str) -> f64 {
    let mut total = 0.0;
    let mut matched = 0usize;

    for token in text.split_whitespace() {
        if let Some((_, subjectivity)) = lookup(&token.to_lowercase()) {
            total += subjectivity;
            matched += 1;
        }
    }
    if matched == 0 {
        0.0
    } else {
        (total / matched as f64).clamp(0.0, 1.0)
    }
}

/// Rule-based compound sentiment intensity of `text`, in [-1, 1].
///
/// Each matched word contributes its scaled valence, adjusted by a degree
/// modifier on the preceding token and inverted (dampened) when a
/// negation appears within the preceding window. The raw sum is squashed
/// with `sum / sqrt(sum² + 15)`.
pub fn compound_score(text: &str) -> f64 {
    let tokens: Vec<String> = text.split_whitespace().map(str::to_lowercase).collect();
    let mut sum = 0.0;

    for (i, token) in tokens.iter().enumerate() {
        let Some((polarity, _)) = lookup(token) else {
            continue;
        };
        let mut valence = polarity * VALENCE_SCALE;

        if i > 0 {
            if let Some(boost) = booster(&tokens[i - 1]) {
                valence += if valence >= 0.0 { boost } else { -boost };
            }
        }
        if negated(&tokens, i) {
            valence *= NEGATION_FACTOR;
        }
        sum += valence;
    }

    if sum == 0.0 {
        return 0.0;
    }
    sum / (sum * sum + COMPOUND_ALPHA).sqrt()
}

fn negated(tokens: &[String], index: usize) -> bool {
    let start = index.saturating_sub(NEGATION_WINDOW);
    tokens[start..index].iter().any(|t| is_negation(t))
}

/// Map a continuous lexicon polarity score to a label.
pub fn label_polarity(score: f64) -> Polarity {
    if score > 0.0 {
        Polarity::Pos
    } else if score == 0.0 {
        Polarity::Neu
    } else {
        Polarity::Neg
    }
}

/// Map a continuous subjectivity score to a label.
pub fn label_subjectivity(score: f64) -> Subjectivity {
    if score >= SUBJECTIVITY_THRESHOLD {
        Subjectivity::Subj
    } else {
        Subjectivity::Obj
    }
}

/// Map a compound score to a label. Scores at exactly the thresholds are
/// neutral.
pub fn label_compound(score: f64) -> Polarity {
    if score > RULE_POSITIVE_THRESHOLD {
        Polarity::Pos
    } else if score < RULE_NEGATIVE_THRESHOLD {
        Polarity::Neg
    } else {
        Polarity::Neu
    }
}

/// Lexicon polarity label for `text`.
pub fn lexicon_polarity(text: &str) -> Polarity {
    label_polarity(polarity_score(text))
}

/// Lexicon subjectivity label for `text`.
pub fn lexicon_subjectivity(text: &str) -> Subjectivity {
    label_subjectivity(subjectivity_score(text))
}

/// Rule-based compound polarity label for `text`.
pub fn compound_polarity(text: &str) -> Polarity {
    label_compound(compound_score(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexicon_polarity_signs() {
        assert_eq!(lexicon_polarity("what a great wonderful day"), Polarity::Pos);
        assert_eq!(lexicon_polarity("horrible awful experience"), Polarity::Neg);
        // No lexicon matches: score is exactly zero.
        assert_eq!(lexicon_polarity("the report covers four quarters"), Polarity::Neu);
        assert_eq!(lexicon_polarity(""), Polarity::Neu);
    }

    #[test]
    fn test_lexicon_polarity_negation_inverts() {
        assert_eq!(lexicon_polarity("not good"), Polarity::Neg);
    }

    #[test]
    fn test_lexicon_subjectivity_threshold() {
        assert_eq!(label_subjectivity(0.5), Subjectivity::Subj);
        assert_eq!(label_subjectivity(0.499), Subjectivity::Obj);
        assert_eq!(lexicon_subjectivity("i love this beautiful place"), Subjectivity::Subj);
        assert_eq!(lexicon_subjectivity("quarterly numbers released"), Subjectivity::Obj);
    }

    #[test]
    fn test_compound_boundaries_are_neutral() {
        assert_eq!(label_compound(RULE_POSITIVE_THRESHOLD), Polarity::Neu);
        assert_eq!(label_compound(RULE_NEGATIVE_THRESHOLD), Polarity::Neu);
        assert_eq!(label_compound(0.21), Polarity::Pos);
        assert_eq!(label_compound(-0.21), Polarity::Neg);
        assert_eq!(label_compound(0.0), Polarity::Neu);
    }

    #[test]
    fn test_compound_score_range_and_signs() {
        let up = compound_score("great amazing awesome");
        assert!(up > RULE_POSITIVE_THRESHOLD && up <= 1.0);

        let down = compound_score("terrible horrible awful");
        assert!(down < RULE_NEGATIVE_THRESHOLD && down >= -1.0);

        assert_eq!(compound_score("plain words only"), 0.0);
    }

    #[test]
    fn test_compound_negation_flips() {
        assert_eq!(compound_polarity("great"), Polarity::Pos);
        assert_eq!(compound_polarity("not great"), Polarity::Neg);
    }

    #[test]
    fn test_compound_booster_strengthens() {
        let plain = compound_score("good");
        let boosted = compound_score("very good");
        assert!(boosted > plain);
    }
}
