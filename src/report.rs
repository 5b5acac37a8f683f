//! Collection statistics report.
//!
//! Counts stored records per scorer and label and prints a fixed-width
//! table, one row per scorer/label pair with its share of the total.

use anyhow::Result;

use crate::store::{Cursor, DocumentStore, Filter};

/// Scorer/label pairs in display order.
const BREAKDOWN: &[(&str, &str, &[&str])] = &[
    ("lexicon", "polarity", &["pos", "neu", "neg"]),
    ("lexicon", "subjectivity", &["subj", "obj"]),
    ("rule_based", "polarity", &["pos", "neu", "neg"]),
    ("trained", "polarity", &["pos", "neg"]),
    ("trained", "subjectivity", &["subj", "obj"]),
];

/// Print label counts for every scorer over one collection.
pub async fn run_stats(
    store: &dyn DocumentStore,
    database: &str,
    collection: &str,
) -> Result<()> {
    let total = store.find(database, collection, None).await?.count();
    if total == 0 {
        println!("No documents found in this collection.");
        return Ok(());
    }

    println!("{database}/{collection}: {total} documents");
    println!();
    println!("{:<24} {:>6} {:>8} {:>8}", "scorer", "label", "count", "share");
    println!("{}", "-".repeat(50));

    for (scorer, dimension, labels) in BREAKDOWN {
        let field = format!("{scorer}.{dimension}");
        for label in *labels {
            let filter = Filter::new(&field, label);
            let cursor: Cursor = store.find(database, collection, Some(&filter)).await?;
            let count = cursor.count();
            let share = count as f64 / total as f64 * 100.0;
            println!("{field:<24} {label:>6} {count:>8} {share:>7.1}%");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        LexiconScores, Polarity, RuleBasedScores, SentimentRecord, Subjectivity, TokenSet,
        TrainedScores,
    };
    use crate::store::MemoryStore;

    fn record(id: i64, polarity: Polarity) -> SentimentRecord {
        SentimentRecord {
            id,
            whole_text: String::new(),
            cleaned_text: TokenSet::default(),
            lexicon: LexiconScores {
                polarity,
                subjectivity: Subjectivity::Subj,
            },
            rule_based: RuleBasedScores { polarity },
            trained: TrainedScores {
                polarity,
                subjectivity: Subjectivity::Subj,
            },
        }
    }

    #[tokio::test]
    async fn test_stats_over_empty_collection() {
        let store = MemoryStore::new();
        assert!(run_stats(&store, "tweets", "empty").await.is_ok());
    }

    #[tokio::test]
    async fn test_stats_counts_match_filters() {
        let store = MemoryStore::new();
        store.insert("tweets", "s", &record(1, Polarity::Pos)).await.unwrap();
        store.insert("tweets", "s", &record(2, Polarity::Pos)).await.unwrap();
        store.insert("tweets", "s", &record(3, Polarity::Neg)).await.unwrap();
        assert!(run_stats(&store, "tweets", "s").await.is_ok());

        let filter = Filter::new("rule_based.polarity", "pos");
        let cursor = store.find("tweets", "s", Some(&filter)).await.unwrap();
        assert_eq!(cursor.count(), 2);
    }
}
