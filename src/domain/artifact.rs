// ============================================================
// Layer 3 — Model Artifacts
// ============================================================
// A trained model is only usable together with the vocabulary and
// tokenizer settings it was fitted against, so all three travel as
// one immutable bundle.
//
//   TrainedArtifact — output of the training pipeline, no version yet
//   ModelArtifact   — the same bundle after the registry assigned it
//                     a version id on publish

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::settings::TokenizerConfig;
use crate::domain::vocabulary::{Vocabulary, VocabularyId};
use crate::error::{ClassifierError, Result};

/// Monotonic version number handed out by the model registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(u64);

impl VersionId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for VersionId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim().trim_start_matches('v').parse().map(Self)
    }
}

/// Layout tag of the parameter blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterFormat {
    /// Linear layer + softmax; weights row-major `[input_dim][labels]`.
    SoftmaxRegressionV1,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    pub format:    ParameterFormat,
    pub labels:    Vec<String>,
    pub input_dim: usize,
    pub weights:   Vec<f32>,
    pub bias:      Vec<f32>,
}

impl ModelParameters {
    pub fn num_labels(&self) -> usize {
        self.labels.len()
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.labels.len() < 2 {
            return Err(format!("expected at least 2 labels, found {}", self.labels.len()));
        }
        let mut seen = std::collections::HashSet::new();
        if let Some(dup) = self.labels.iter().find(|l| !seen.insert(l.as_str())) {
            return Err(format!("duplicate label '{dup}'"));
        }
        let expected = self.input_dim * self.labels.len();
        if self.weights.len() != expected {
            return Err(format!(
                "weight blob has {} values, expected {} ({} x {})",
                self.weights.len(),
                expected,
                self.input_dim,
                self.labels.len()
            ));
        }
        if self.bias.len() != self.labels.len() {
            return Err(format!("bias has {} values for {} labels", self.bias.len(), self.labels.len()));
        }
        if self.weights.iter().chain(&self.bias).any(|w| !w.is_finite()) {
            return Err("parameters contain non-finite values".to_string());
        }
        Ok(())
    }
}

/// Loss and accuracy after one pass over the training split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:          usize,
    pub train_loss:     f64,
    pub train_accuracy: f64,
    /// None when the run had no validation split.
    pub val_accuracy:   Option<f64>,
}

impl EpochMetrics {
    /// Returns true if this epoch's loss beats the best seen so far.
    pub fn is_improvement(&self, best_loss: f64) -> bool {
        self.train_loss < best_loss
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub documents:           usize,
    pub validation_documents: usize,
    pub label_counts:        BTreeMap<String, usize>,
    pub vocabulary_size:     usize,
    pub epochs:              Vec<EpochMetrics>,
    pub best_epoch:          usize,
    pub final_loss:          f64,
    pub train_accuracy:      f64,
    pub validation_accuracy: Option<f64>,
}

/// A freshly trained, not yet published bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedArtifact {
    pub vocabulary: Vocabulary,
    pub tokenizer:  TokenizerConfig,
    pub parameters: ModelParameters,
    pub trained_at: DateTime<Utc>,
    pub metrics:    TrainingMetrics,
}

impl TrainedArtifact {
    /// Reject bundles the inference engine could not serve.
    pub fn validate(&self) -> Result<()> {
        check_bundle(&self.vocabulary, &self.tokenizer, &self.parameters)
    }
}

/// A published, immutable model version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub version:            VersionId,
    pub vocabulary_version: VocabularyId,
    pub vocabulary:         Vocabulary,
    pub tokenizer:          TokenizerConfig,
    pub parameters:         ModelParameters,
    pub trained_at:         DateTime<Utc>,
    pub metrics:            TrainingMetrics,
}

impl ModelArtifact {
    pub fn from_trained(version: VersionId, trained: TrainedArtifact) -> Self {
        Self {
            version,
            vocabulary_version: trained.vocabulary.id().clone(),
            vocabulary:         trained.vocabulary,
            tokenizer:          trained.tokenizer,
            parameters:         trained.parameters,
            trained_at:         trained.trained_at,
            metrics:            trained.metrics,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if &self.vocabulary_version != self.vocabulary.id() {
            return Err(ClassifierError::InvalidArtifact(format!(
                "artifact references vocabulary {} but carries {}",
                self.vocabulary_version,
                self.vocabulary.id()
            )));
        }
        check_bundle(&self.vocabulary, &self.tokenizer, &self.parameters)
    }
}

fn check_bundle(vocabulary: &Vocabulary, tokenizer: &TokenizerConfig, parameters: &ModelParameters) -> Result<()> {
    tokenizer.validate().map_err(ClassifierError::InvalidArtifact)?;
    if vocabulary.term_count() == 0 {
        return Err(ClassifierError::InvalidArtifact(format!(
            "vocabulary {} has no terms",
            vocabulary.id()
        )));
    }
    if parameters.input_dim != vocabulary.len() {
        return Err(ClassifierError::InvalidArtifact(format!(
            "parameters expect {} features but vocabulary {} has {}",
            parameters.input_dim,
            vocabulary.id(),
            vocabulary.len()
        )));
    }
    parameters.validate().map_err(ClassifierError::InvalidArtifact)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::domain::vocabulary::{FeatureSettings, OOV_TERM};

    /// Small hand-built artifact: "ho" votes for `health`, "xe" for `traffic`.
    pub fn trained() -> TrainedArtifact {
        let vocabulary = Vocabulary::new(
            vec![OOV_TERM.into(), "ho".into(), "xe".into()],
            vec![1.0, 1.5, 1.5],
            FeatureSettings { ngram_max: 1, ..FeatureSettings::default() },
            4,
        )
        .unwrap();
        let parameters = ModelParameters {
            format:    ParameterFormat::SoftmaxRegressionV1,
            labels:    vec!["health".into(), "traffic".into()],
            input_dim: 3,
            weights:   vec![0.0, 0.0, 2.0, -2.0, -2.0, 2.0],
            bias:      vec![0.1, 0.0],
        };
        let metrics = TrainingMetrics {
            documents:            4,
            validation_documents: 0,
            label_counts:         BTreeMap::from([("health".into(), 2), ("traffic".into(), 2)]),
            vocabulary_size:      3,
            epochs:               Vec::new(),
            best_epoch:           0,
            final_loss:           0.0,
            train_accuracy:       1.0,
            validation_accuracy:  None,
        };
        TrainedArtifact {
            vocabulary,
            tokenizer: TokenizerConfig::default(),
            parameters,
            trained_at: Utc::now(),
            metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_is_valid() {
        assert!(fixtures::trained().validate().is_ok());
    }

    #[test]
    fn test_dimension_mismatch_is_invalid() {
        let mut t = fixtures::trained();
        t.parameters.input_dim = 2;
        t.parameters.weights.truncate(4);
        assert!(matches!(t.validate(), Err(ClassifierError::InvalidArtifact(_))));
    }

    #[test]
    fn test_unbounded_word_window_is_invalid() {
        let mut t = fixtures::trained();
        t.tokenizer.max_word_syllables = usize::MAX;
        assert!(matches!(t.validate(), Err(ClassifierError::InvalidArtifact(_))));

        let artifact = ModelArtifact::from_trained(VersionId::new(1), t);
        assert!(matches!(artifact.validate(), Err(ClassifierError::InvalidArtifact(_))));
    }

    #[test]
    fn test_single_label_is_invalid() {
        let mut t = fixtures::trained();
        t.parameters.labels.truncate(1);
        t.parameters.weights = vec![0.0; 3];
        t.parameters.bias = vec![0.0];
        assert!(matches!(t.validate(), Err(ClassifierError::InvalidArtifact(_))));
    }

    #[test]
    fn test_vocabulary_reference_must_match() {
        let trained = fixtures::trained();
        let other = {
            let mut t = fixtures::trained();
            t.vocabulary = crate::domain::vocabulary::Vocabulary::new(
                vec![crate::domain::vocabulary::OOV_TERM.into(), "ho".into(), "xe".into()],
                vec![1.0, 1.0, 1.0],
                crate::domain::vocabulary::FeatureSettings::default(),
                4,
            )
            .unwrap();
            t
        };
        let mut artifact = ModelArtifact::from_trained(VersionId::new(1), trained);
        artifact.vocabulary_version = other.vocabulary.id().clone();
        assert!(matches!(artifact.validate(), Err(ClassifierError::InvalidArtifact(_))));
    }

    #[test]
    fn test_version_parsing() {
        assert_eq!("v7".parse::<VersionId>().unwrap(), VersionId::new(7));
        assert_eq!(" 12 ".parse::<VersionId>().unwrap(), VersionId::new(12));
        assert_eq!(VersionId::new(3).next(), VersionId::new(4));
    }

    #[test]
    fn test_is_improvement() {
        let m = EpochMetrics { epoch: 2, train_loss: 0.4, train_accuracy: 0.9, val_accuracy: None };
        assert!(m.is_improvement(0.5));
        assert!(!m.is_improvement(0.3));
    }
}
