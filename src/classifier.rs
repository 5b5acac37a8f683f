//! Trained Naive Bayes scorers loaded from JSON artifacts.
//!
//! Two models ship as artifacts on disk: one labels polarity (`pos` /
//! `neg`), the other subjectivity (`subj` / `obj`). Each artifact stores,
//! per label, a log prior and per-feature log likelihoods plus a fallback
//! likelihood for features never seen at training time. Classification is
//! a plain argmax over summed log probabilities.
//!
//! Artifact presence is checked before a streaming session is allowed to
//! start; see [`TrainedScorers::verify`].

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::ArtifactsConfig;
use crate::error::{Error, Result};
use crate::features::bag_of_words;
use crate::models::{Polarity, Subjectivity};

/// Per-label parameters of a trained model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelParams {
    /// Label emitted when this entry wins the argmax.
    pub label: String,
    /// Log prior probability of the label.
    pub log_prior: f64,
    /// Log likelihood per known feature.
    pub log_likelihood: HashMap<String, f64>,
    /// Log likelihood applied to features absent from the table.
    pub unseen_log_likelihood: f64,
}

/// A trained Naive Bayes model: one [`LabelParams`] entry per label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    pub labels: Vec<LabelParams>,
}

impl TrainedModel {
    /// Load a model artifact from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingArtifact`] when the file does not exist and
    /// [`Error::MalformedArtifact`] when it is not a valid model document.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::MissingArtifact {
                path: path.to_path_buf(),
            });
        }
        let raw = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let model: TrainedModel = serde_json::from_str(&raw).map_err(|source| {
            Error::MalformedArtifact {
                path: path.to_path_buf(),
                source,
            }
        })?;
        if model.labels.is_empty() {
            return Err(Error::Config(format!(
                "model {} declares no labels",
                path.display()
            )));
        }
        Ok(model)
    }

    /// Label with the highest summed log probability for `features`.
    pub fn classify<'a, I>(&self, features: I) -> &str
    where
        I: IntoIterator<Item = &'a str> + Clone,
    {
        let mut best: Option<(&str, f64)> = None;
        for params in &self.labels {
            let mut score = params.log_prior;
            for feature in features.clone() {
                score += params
                    .log_likelihood
                    .get(feature)
                    .copied()
                    .unwrap_or(params.unseen_log_likelihood);
            }
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((&params.label, score)),
            }
        }
        // load() rejects empty label sets, so best is always populated.
        best.map(|(label, _)| label).unwrap_or_default()
    }
}

/// The pair of trained models a streaming session scores with.
pub struct TrainedScorers {
    polarity: TrainedModel,
    subjectivity: TrainedModel,
}

impl TrainedScorers {
    /// Load both model artifacts named in `cfg`.
    pub fn load(cfg: &ArtifactsConfig) -> Result<Self> {
        Ok(Self {
            polarity: TrainedModel::load(&cfg.polarity)?,
            subjectivity: TrainedModel::load(&cfg.subjectivity)?,
        })
    }

    /// Build scorers from already-constructed models.
    pub fn from_models(polarity: TrainedModel, subjectivity: TrainedModel) -> Self {
        Self {
            polarity,
            subjectivity,
        }
    }

    /// Check that both artifacts exist without loading them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingArtifact`] naming the first absent file.
    pub fn verify(cfg: &ArtifactsConfig) -> Result<()> {
        for path in [&cfg.polarity, &cfg.subjectivity] {
            if !path.exists() {
                return Err(Error::MissingArtifact {
                    path: path.clone(),
                });
            }
        }
        Ok(())
    }

    /// Trained polarity label for an extracted feature map.
    pub fn polarity(&self, features: &BTreeMap<String, bool>) -> Polarity {
        let words: Vec<&str> = features.keys().map(String::as_str).collect();
        match self.polarity.classify(words) {
            "pos" => Polarity::Pos,
            _ => Polarity::Neg,
        }
    }

    /// Trained subjectivity label for raw text.
    ///
    /// The subjectivity model was trained on whitespace-split lowercase
    /// words rather than the filtered feature map.
    pub fn subjectivity(&self, text: &str) -> Subjectivity {
        let words: Vec<String> = text.split_whitespace().map(str::to_lowercase).collect();
        let refs: Vec<&str> = words.iter().map(String::as_str).collect();
        match self.subjectivity.classify(refs) {
            "subj" => Subjectivity::Subj,
            _ => Subjectivity::Obj,
        }
    }

    /// Convenience: polarity label straight from token words.
    pub fn polarity_of_words(&self, words: &[String]) -> Polarity {
        self.polarity(&bag_of_words(words))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn two_label_model(first: &str, second: &str, cue: &str) -> TrainedModel {
        TrainedModel {
            labels: vec![
                LabelParams {
                    label: first.to_string(),
                    log_prior: -0.7,
                    log_likelihood: HashMap::from([(cue.to_string(), -0.5)]),
                    unseen_log_likelihood: -5.0,
                },
                LabelParams {
                    label: second.to_string(),
                    log_prior: -0.7,
                    log_likelihood: HashMap::new(),
                    unseen_log_likelihood: -5.0,
                },
            ],
        }
    }

    #[test]
    fn test_classify_prefers_known_features() {
        let model = two_label_model("pos", "neg", "great");
        assert_eq!(model.classify(vec!["great"]), "pos");
        // Unknown features fall back to the unseen likelihood for every
        // label, leaving the priors tied; the first entry wins ties.
        assert_eq!(model.classify(vec!["zzz"]), "pos");
    }

    #[test]
    fn test_scorers_map_labels() {
        let scorers = TrainedScorers::from_models(
            two_label_model("pos", "neg", "great"),
            two_label_model("subj", "obj", "feel"),
        );
        let features = bag_of_words(&["great", "launch"]);
        assert_eq!(scorers.polarity(&features), Polarity::Pos);
        assert_eq!(scorers.subjectivity("i feel fine"), Subjectivity::Subj);

        let neg = TrainedScorers::from_models(
            two_label_model("neg", "pos", "awful"),
            two_label_model("obj", "subj", "data"),
        );
        let features = bag_of_words(&["awful"]);
        assert_eq!(neg.polarity(&features), Polarity::Neg);
        assert_eq!(neg.subjectivity("raw data here"), Subjectivity::Obj);
    }

    #[test]
    fn test_load_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sa_polarity.json");
        match TrainedModel::load(&path) {
            Err(Error::MissingArtifact { path: p }) => assert_eq!(p, path),
            other => panic!("expected MissingArtifact, got {other:?}"),
        }
    }

    #[test]
    fn test_load_malformed_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sa_polarity.json");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{{ not json").unwrap();
        assert!(matches!(
            TrainedModel::load(&path),
            Err(Error::MalformedArtifact { .. })
        ));
    }

    #[test]
    fn test_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sa_subjectivity.json");
        let model = two_label_model("subj", "obj", "feel");
        std::fs::write(&path, serde_json::to_string(&model).unwrap()).unwrap();
        let loaded = TrainedModel::load(&path).unwrap();
        assert_eq!(loaded.labels.len(), 2);
        assert_eq!(loaded.classify(vec!["feel"]), "subj");
    }
}
