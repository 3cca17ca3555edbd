// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the offline training pipeline in order:
//
//   Step 1: Validate the corpus          (labels, size)
//   Step 2: Stratified train/val split   (Layer 4 - data)
//   Step 3: Segment every text           (Layer 4 - data)
//   Step 4: Build the vocabulary + idf   (Layer 4 - data)
//   Step 5: Encode TF-IDF vectors        (Layer 4 - data)
//   Step 6: Fit softmax regression       (Layer 5 - ml)
//   Step 7: Package one TrainedArtifact  (Layer 3 - domain)
//
// `train` stops at step 7; `execute` also loads the corpus and
// hands the artifact to the registry. Nothing is published unless
// every step succeeded.
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::{label_counts, EncodedDataset, EncodedSample, LabelSet},
    features::{FeatureExtractor, VocabularyBuilder},
    segmenter::Segmenter,
    splitter::stratified_split,
};
use crate::domain::artifact::{TrainedArtifact, TrainingMetrics, VersionId};
use crate::domain::document::{LabeledText, Locale};
use crate::domain::settings::TokenizerConfig;
use crate::domain::token::Token;
use crate::domain::traits::CorpusSource;
use crate::domain::vocabulary::{FeatureSettings, Vocabulary};
use crate::error::{ClassifierError, Result};
use crate::infra::{metrics::MetricsLogger, registry::ModelRegistry};
use crate::ml::trainer::{FitOptions, Trainer};

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run. Missing fields in a JSON
// config fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub min_token_frequency: usize,
    pub max_vocab_size:      usize,
    pub oov_bucket_enabled:  bool,
    pub ngram_max:           usize,
    pub sublinear_tf:        bool,
    pub epochs:              usize,
    pub batch_size:          usize,
    pub learning_rate:       f64,
    pub validation_fraction: f64,
    pub seed:                u64,
    pub tokenizer:           TokenizerConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            min_token_frequency: 2,
            max_vocab_size:      20_000,
            oov_bucket_enabled:  true,
            ngram_max:           2,
            sublinear_tf:        true,
            epochs:              20,
            batch_size:          32,
            learning_rate:       0.05,
            validation_fraction: 0.2,
            seed:                42,
            tokenizer:           TokenizerConfig::default(),
        }
    }
}

impl TrainConfig {
    /// Reject settings that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(ClassifierError::InvalidConfig(msg));
        if self.epochs == 0 {
            return invalid("epochs must be at least 1".to_string());
        }
        if self.batch_size == 0 {
            return invalid("batch_size must be at least 1".to_string());
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return invalid(format!("learning_rate must be positive, got {}", self.learning_rate));
        }
        if !(0.0..=0.9).contains(&self.validation_fraction) {
            return invalid(format!("validation_fraction must be in [0, 0.9], got {}", self.validation_fraction));
        }
        self.tokenizer.validate().map_err(ClassifierError::InvalidConfig)
    }

    fn feature_settings(&self) -> FeatureSettings {
        FeatureSettings {
            ngram_max:          self.ngram_max.clamp(1, 2),
            sublinear_tf:       self.sublinear_tf,
            oov_bucket_enabled: self.oov_bucket_enabled,
        }
    }

    fn fit_options(&self) -> FitOptions {
        FitOptions {
            epochs:        self.epochs,
            batch_size:    self.batch_size,
            learning_rate: self.learning_rate,
            seed:          self.seed,
        }
    }
}

/// Outcome of a successful publish.
#[derive(Debug, Clone, Serialize)]
pub struct PublishReport {
    pub version_id: VersionId,
    pub metrics:    TrainingMetrics,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config:      TrainConfig,
    metrics_dir: Option<std::path::PathBuf>,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config, metrics_dir: None }
    }

    /// Also append each epoch to `<dir>/metrics.csv`.
    pub fn with_metrics_dir(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.metrics_dir = Some(dir.into());
        self
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Load the corpus, train, and publish the result as a new version.
    pub fn execute(&self, corpus: &dyn CorpusSource, registry: &ModelRegistry) -> Result<PublishReport> {
        let examples = corpus.load_all()?;
        tracing::info!("Loaded {} labelled texts", examples.len());

        let trained = self.train(examples)?;
        let metrics = trained.metrics.clone();
        let version_id = registry.publish(trained)?;

        tracing::info!(version = %version_id, "Published model");
        Ok(PublishReport { version_id, metrics })
    }

    /// Run the pipeline end to end and return the packaged artifact.
    pub fn train(&self, examples: Vec<LabeledText>) -> Result<TrainedArtifact> {
        let cfg = &self.config;

        // ── Step 1: Validate ──────────────────────────────────────────────────
        cfg.validate()?;
        if examples.is_empty() {
            return Err(ClassifierError::InsufficientData("corpus is empty".to_string()));
        }
        let labels = LabelSet::from_examples(&examples);
        if labels.len() < 2 {
            return Err(ClassifierError::InsufficientData(format!(
                "need at least two distinct labels, found {}",
                labels.len()
            )));
        }
        let counts = label_counts(&examples);

        // ── Step 2: Stratified split ──────────────────────────────────────────
        let (train_texts, val_texts) = stratified_split(examples, cfg.validation_fraction, cfg.seed);
        tracing::info!("Split: {} train, {} validation", train_texts.len(), val_texts.len());

        // ── Step 3: Segment ───────────────────────────────────────────────────
        let segmenter = Segmenter::new(&cfg.tokenizer);
        let segment = |texts: &[LabeledText]| -> Vec<Vec<Token>> {
            texts.iter().map(|t| segmenter.segment(&t.text, &Locale::Vietnamese)).collect()
        };
        let train_tokens = segment(&train_texts);
        let val_tokens = segment(&val_texts);

        // ── Step 4: Vocabulary (training split only) ──────────────────────────
        let vocabulary = VocabularyBuilder::new(cfg.min_token_frequency, cfg.max_vocab_size, cfg.feature_settings())
            .build(&train_tokens)?;
        tracing::info!(size = vocabulary.len(), id = %vocabulary.id(), "Vocabulary built");

        // ── Step 5: Encode ────────────────────────────────────────────────────
        let train_set = encode(&vocabulary, &labels, &train_texts, train_tokens)?;
        let val_set = encode(&vocabulary, &labels, &val_texts, val_tokens)?;

        // ── Step 6: Fit ───────────────────────────────────────────────────────
        let logger = self.metrics_logger();
        let report = Trainer::new(cfg.fit_options()).fit(
            &train_set,
            (!val_set.is_empty()).then_some(&val_set),
            &labels,
            |epoch| {
                if let Some(logger) = &logger {
                    if let Err(e) = logger.log(epoch) {
                        tracing::warn!("Could not record epoch {}: {e:#}", epoch.epoch);
                    }
                }
            },
        )?;

        // ── Step 7: Package ───────────────────────────────────────────────────
        let metrics = TrainingMetrics {
            documents:            vocabulary.documents(),
            validation_documents: val_set.len(),
            label_counts:         counts,
            vocabulary_size:      vocabulary.len(),
            epochs:               report.epochs,
            best_epoch:           report.best_epoch,
            final_loss:           report.final_loss,
            train_accuracy:       report.train_accuracy,
            validation_accuracy:  report.validation_accuracy,
        };
        let artifact = TrainedArtifact {
            vocabulary,
            tokenizer: cfg.tokenizer.clone(),
            parameters: report.parameters,
            trained_at: Utc::now(),
            metrics,
        };
        artifact.validate()?;
        Ok(artifact)
    }

    fn metrics_logger(&self) -> Option<MetricsLogger> {
        let dir = self.metrics_dir.as_ref()?;
        match MetricsLogger::new(dir) {
            Ok(logger) => Some(logger),
            Err(e) => {
                tracing::warn!("Metrics disabled: {e:#}");
                None
            }
        }
    }
}

/// TF-IDF vectors for `tokens`, paired with each text's label index.
fn encode(
    vocabulary: &Vocabulary,
    labels:     &LabelSet,
    texts:      &[LabeledText],
    tokens:     Vec<Vec<Token>>,
) -> Result<EncodedDataset> {
    let extractor = FeatureExtractor::new(vocabulary);
    let samples = texts
        .iter()
        .zip(tokens)
        .map(|(text, tokens)| {
            let label = labels
                .index_of(&text.label)
                .ok_or_else(|| ClassifierError::Compute(format!("unindexed label '{}'", text.label)))?;
            Ok(EncodedSample { features: extractor.extract(tokens).into_values(), label })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(EncodedDataset::new(samples, vocabulary.len()))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory_store::InMemoryArtifactStore;
    use std::sync::Arc;

    fn corpus() -> Vec<LabeledText> {
        let mut out = Vec::new();
        for i in 0..12 {
            out.push(LabeledText::new("health", format!("bệnh nhân bị sốt cao và ho lần {i}")));
            out.push(LabeledText::new("traffic", format!("xe máy vượt đèn đỏ trên đường lần {i}")));
        }
        out
    }

    fn quick() -> TrainConfig {
        TrainConfig { epochs: 15, batch_size: 8, learning_rate: 0.1, ..TrainConfig::default() }
    }

    #[test]
    fn test_rejects_empty_and_single_label_corpora() {
        let uc = TrainUseCase::new(quick());
        assert!(matches!(uc.train(Vec::new()), Err(ClassifierError::InsufficientData(_))));

        let one = vec![LabeledText::new("a", "xin chào"), LabeledText::new("a", "cảm ơn")];
        assert!(matches!(uc.train(one), Err(ClassifierError::InsufficientData(_))));
    }

    #[test]
    fn test_rejects_zero_epochs_and_bad_settings() {
        let bad = [
            TrainConfig { epochs: 0, ..quick() },
            TrainConfig { batch_size: 0, ..quick() },
            TrainConfig { learning_rate: f64::NAN, ..quick() },
            TrainConfig { validation_fraction: 1.0, ..quick() },
            TrainConfig {
                tokenizer: TokenizerConfig { max_word_syllables: 0, ..TokenizerConfig::default() },
                ..quick()
            },
        ];
        for cfg in bad {
            let err = TrainUseCase::new(cfg.clone()).train(corpus()).unwrap_err();
            assert!(matches!(err, ClassifierError::InvalidConfig(_)), "{cfg:?} gave {err}");
        }
    }

    #[test]
    fn test_rejects_corpus_with_empty_vocabulary() {
        let cfg = TrainConfig { min_token_frequency: 50, ..quick() };
        let err = TrainUseCase::new(cfg).train(corpus()).unwrap_err();
        assert!(matches!(err, ClassifierError::InsufficientData(_)));
    }

    #[test]
    fn test_trains_valid_artifact() {
        let artifact = TrainUseCase::new(quick()).train(corpus()).unwrap();
        assert!(artifact.validate().is_ok());
        assert_eq!(artifact.parameters.labels, vec!["health".to_string(), "traffic".to_string()]);
        assert_eq!(artifact.parameters.input_dim, artifact.vocabulary.len());

        let m = &artifact.metrics;
        assert_eq!(m.documents + m.validation_documents, 24);
        assert_eq!(m.documents, artifact.vocabulary.documents());
        assert_eq!(m.label_counts["health"], 12);
        assert_eq!(m.epochs.len(), 15);
        assert!(m.validation_accuracy.is_some());
        assert!(m.train_accuracy > 0.9);
    }

    #[test]
    fn test_same_seed_same_artifact() {
        let a = TrainUseCase::new(quick()).train(corpus()).unwrap();
        let b = TrainUseCase::new(quick()).train(corpus()).unwrap();
        assert_eq!(a.vocabulary.id(), b.vocabulary.id());
        assert_eq!(a.parameters, b.parameters);
    }

    #[test]
    fn test_execute_publishes_and_logs_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ModelRegistry::new(Arc::new(InMemoryArtifactStore::new()));
        let uc = TrainUseCase::new(quick()).with_metrics_dir(dir.path());

        let report = uc.execute(&corpus(), &registry).unwrap();
        assert_eq!(report.version_id, VersionId::new(1));
        assert_eq!(registry.current_version(), Some(VersionId::new(1)));

        let csv = std::fs::read_to_string(dir.path().join("metrics.csv")).unwrap();
        assert_eq!(csv.lines().count(), 1 + 15);
    }

    #[test]
    fn test_failed_training_publishes_nothing() {
        let registry = ModelRegistry::new(Arc::new(InMemoryArtifactStore::new()));
        let one_label = vec![LabeledText::new("a", "xin chào")];
        assert!(TrainUseCase::new(quick()).execute(&one_label, &registry).is_err());
        assert_eq!(registry.latest_version().unwrap(), None);
    }

    #[test]
    fn test_config_fills_missing_fields() {
        let cfg: TrainConfig = serde_json::from_str(r#"{"epochs": 3}"#).unwrap();
        assert_eq!(cfg.epochs, 3);
        assert_eq!(cfg.seed, TrainConfig::default().seed);
    }
}
