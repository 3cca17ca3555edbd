// ============================================================
// Layer 5 — Inference Engine
// ============================================================
// Runs one document through tokenizer → feature extractor →
// classifier, all bound to a single model version.
//
// Every call starts by pinning a version (`pin`). The pinned
// handle carries the artifact and the segmenter built from that
// artifact's frozen tokenizer settings, so a publish that lands
// mid-call cannot change the feature space under it; the call
// finishes on the version it started with and reports it.
//
// Cancellation is checked before segmentation, between tokens
// and right before the model is applied. A cancelled call has no
// side effects.

use std::collections::HashMap;
use std::sync::Arc;

use burn::backend::ndarray::{NdArray, NdArrayDevice};
use chrono::Utc;
use parking_lot::RwLock;

use crate::data::batcher::FeatureBatcher;
use crate::data::features::{Extraction, FeatureExtractor};
use crate::data::segmenter::Segmenter;
use crate::domain::artifact::{ModelArtifact, VersionId};
use crate::domain::cancel::CancelToken;
use crate::domain::document::{Document, DocumentId, Locale};
use crate::domain::prediction::{LabelScore, Prediction};
use crate::error::{ClassifierError, Result};
use crate::infra::registry::{ModelRegistry, CACHE_CAPACITY};
use crate::ml::model::{tensor_values, TextClassifier};

type InferBackend = NdArray;

/// Which model version a call should use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModelSelector {
    /// Whatever the registry serves when the call starts.
    #[default]
    Current,
    /// An exact published version.
    Version(VersionId),
}

impl From<Option<VersionId>> for ModelSelector {
    fn from(version: Option<VersionId>) -> Self {
        version.map_or(ModelSelector::Current, ModelSelector::Version)
    }
}

// ─── PinnedModel ──────────────────────────────────────────────────────────────

/// One model version plus the segmenter it was trained with.
#[derive(Clone)]
pub struct PinnedModel {
    artifact:  Arc<ModelArtifact>,
    segmenter: Arc<Segmenter>,
}

impl PinnedModel {
    pub fn version(&self) -> VersionId {
        self.artifact.version
    }

    pub fn predict(&self, document: &Document, cancel: &CancelToken) -> Result<Prediction> {
        cancel.check()?;

        // ── Tokenise + extract (lazy; cancellable between tokens) ─────────────
        let stream = self.segmenter.tokenize(&document.text, &document.locale);
        let extraction = FeatureExtractor::new(&self.artifact.vocabulary).extract_with(stream.iter(), cancel)?;

        cancel.check()?;
        self.classify(document.id, extraction)
    }

    /// Decode `bytes` as UTF-8 and predict.
    pub fn predict_bytes(&self, bytes: &[u8], locale: Locale, cancel: &CancelToken) -> Result<Prediction> {
        let document = Document::from_bytes(bytes, locale)?;
        self.predict(&document, cancel)
    }

    fn classify(&self, document_id: DocumentId, extraction: Extraction) -> Result<Prediction> {
        let artifact = &self.artifact;
        if extraction.vector.vocabulary_version() != &artifact.vocabulary_version {
            return Err(ClassifierError::InvalidArtifact(format!(
                "features built for {} but model {} expects {}",
                extraction.vector.vocabulary_version(),
                artifact.version,
                artifact.vocabulary_version
            )));
        }

        // ── Apply the classifier ──────────────────────────────────────────────
        let device = NdArrayDevice::default();
        let params = &artifact.parameters;
        let model = TextClassifier::<InferBackend>::from_parameters(params, &device);
        let batcher = FeatureBatcher::<InferBackend>::new(device, params.input_dim);
        let features = batcher.features(&[extraction.vector.values()]);
        let probabilities = tensor_values(model.probabilities(features))?;

        if probabilities.len() != params.num_labels() || probabilities.iter().any(|p| !p.is_finite()) {
            return Err(ClassifierError::Compute(format!(
                "model {} produced an invalid distribution",
                artifact.version
            )));
        }

        // ── Decode: argmax, lowest index wins ties ────────────────────────────
        let mut best = 0;
        for (i, p) in probabilities.iter().enumerate() {
            if *p > probabilities[best] {
                best = i;
            }
        }

        let mut distribution: Vec<LabelScore> = params
            .labels
            .iter()
            .zip(&probabilities)
            .map(|(label, &score)| LabelScore { label: label.clone(), score })
            .collect();
        // stable sort keeps label order among equal scores
        distribution.sort_by(|a, b| b.score.total_cmp(&a.score));

        tracing::debug!(
            version = %artifact.version,
            label = %params.labels[best],
            score = probabilities[best],
            tokens = extraction.token_count,
            unknown = extraction.unknown_tokens,
            "Prediction"
        );

        Ok(Prediction {
            document_id,
            model_version: artifact.version,
            label: params.labels[best].clone(),
            score: probabilities[best],
            distribution,
            token_count: extraction.token_count,
            unknown_tokens: extraction.unknown_tokens,
            created_at: Utc::now(),
        })
    }
}

// ─── InferenceEngine ──────────────────────────────────────────────────────────

pub struct InferenceEngine {
    registry:   Arc<ModelRegistry>,
    /// Segmenters compiled from recent versions' tokenizer settings.
    segmenters: RwLock<HashMap<VersionId, Arc<Segmenter>>>,
}

impl InferenceEngine {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self { registry, segmenters: RwLock::new(HashMap::new()) }
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    /// Resolve `selector` once; the result never changes version.
    pub fn pin(&self, selector: ModelSelector) -> Result<PinnedModel> {
        let artifact = match selector {
            ModelSelector::Current => self.registry.current()?,
            ModelSelector::Version(v) => self.registry.get(v)?,
        };
        let segmenter = self.segmenter_for(&artifact);
        Ok(PinnedModel { artifact, segmenter })
    }

    pub fn predict(&self, document: &Document, selector: ModelSelector, cancel: &CancelToken) -> Result<Prediction> {
        self.pin(selector)?.predict(document, cancel)
    }

    fn segmenter_for(&self, artifact: &ModelArtifact) -> Arc<Segmenter> {
        if let Some(seg) = self.segmenters.read().get(&artifact.version) {
            return Arc::clone(seg);
        }
        let built = Arc::new(Segmenter::new(&artifact.tokenizer));
        let mut segmenters = self.segmenters.write();
        let segmenter = Arc::clone(segmenters.entry(artifact.version).or_insert(built));

        // oldest versions go first; pinned callers keep their own Arc
        if segmenters.len() > CACHE_CAPACITY {
            let mut versions: Vec<VersionId> = segmenters.keys().copied().filter(|&v| v != artifact.version).collect();
            versions.sort_unstable();
            let excess = segmenters.len() - CACHE_CAPACITY;
            for v in versions.into_iter().take(excess) {
                segmenters.remove(&v);
            }
        }
        segmenter
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::artifact::fixtures;
    use crate::infra::memory_store::InMemoryArtifactStore;

    fn engine() -> InferenceEngine {
        let registry = Arc::new(ModelRegistry::new(Arc::new(InMemoryArtifactStore::new())));
        InferenceEngine::new(registry)
    }

    fn doc(text: &str) -> Document {
        Document::new(text, Locale::Vietnamese)
    }

    /// The fixture with its two label columns swapped.
    fn flipped() -> crate::domain::artifact::TrainedArtifact {
        let mut t = fixtures::trained();
        t.parameters.weights = vec![0.0, 0.0, -2.0, 2.0, 2.0, -2.0];
        t
    }

    #[test]
    fn test_unpublished_engine_is_unavailable() {
        let e = engine();
        let err = e.predict(&doc("ho"), ModelSelector::Current, &CancelToken::new()).unwrap_err();
        assert!(matches!(err, ClassifierError::ModelUnavailable));
        let err = e.pin(ModelSelector::Version(VersionId::new(4))).err().unwrap();
        assert!(matches!(err, ClassifierError::VersionNotFound(_)));
    }

    #[test]
    fn test_predicts_with_current_version() {
        let e = engine();
        let v = e.registry().publish(fixtures::trained()).unwrap();

        let p = e.predict(&doc("Tôi bị ho"), ModelSelector::Current, &CancelToken::new()).unwrap();
        assert_eq!(p.label, "health");
        assert_eq!(p.model_version, v);
        assert_eq!(p.token_count, 3);
        assert_eq!(p.unknown_tokens, 2);
        assert_eq!(p.distribution[0].label, "health");
        let total: f32 = p.distribution.iter().map(|s| s.score).sum();
        assert!((total - 1.0).abs() < 1e-5);
        assert_eq!(p.score, p.distribution[0].score);

        let p = e.predict(&doc("đi xe"), ModelSelector::Current, &CancelToken::new()).unwrap();
        assert_eq!(p.label, "traffic");
    }

    #[test]
    fn test_empty_and_unknown_input_degrade_to_bias() {
        let e = engine();
        e.registry().publish(fixtures::trained()).unwrap();
        let cancel = CancelToken::new();

        let empty = e.predict(&doc(""), ModelSelector::Current, &cancel).unwrap();
        assert_eq!(empty.token_count, 0);
        assert_eq!(empty.label, "health");
        let expected = 0.1f32.exp() / (0.1f32.exp() + 1.0);
        assert!((empty.score - expected).abs() < 1e-5);

        let unknown = e.predict(&doc("hoàn toàn lạ lẫm"), ModelSelector::Current, &cancel).unwrap();
        assert_eq!(unknown.unknown_tokens, unknown.token_count);
        assert_eq!(unknown.label, "health");
        assert!((unknown.score - expected).abs() < 1e-5);
    }

    #[test]
    fn test_same_input_same_prediction() {
        let e = engine();
        e.registry().publish(fixtures::trained()).unwrap();
        let d = doc("xe ho xe");
        let a = e.predict(&d, ModelSelector::Current, &CancelToken::new()).unwrap();
        let b = e.predict(&d, ModelSelector::Current, &CancelToken::new()).unwrap();
        assert_eq!((a.label, a.score, a.distribution), (b.label, b.score, b.distribution));
    }

    #[test]
    fn test_pinned_model_survives_publish() {
        let e = engine();
        let v1 = e.registry().publish(fixtures::trained()).unwrap();
        let pinned = e.pin(ModelSelector::Current).unwrap();
        assert_eq!(pinned.version(), v1);

        let v2 = e.registry().publish(flipped()).unwrap();
        assert_ne!(v1, v2);

        let old = pinned.predict(&doc("ho"), &CancelToken::new()).unwrap();
        assert_eq!((old.model_version, old.label.as_str()), (v1, "health"));

        let new = e.predict(&doc("ho"), ModelSelector::Current, &CancelToken::new()).unwrap();
        assert_eq!((new.model_version, new.label.as_str()), (v2, "traffic"));

        let explicit = e.predict(&doc("ho"), ModelSelector::Version(v1), &CancelToken::new()).unwrap();
        assert_eq!(explicit.label, "health");
    }

    #[test]
    fn test_cancelled_call_fails_fast() {
        let e = engine();
        e.registry().publish(fixtures::trained()).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = e.predict(&doc("ho"), ModelSelector::Current, &cancel).unwrap_err();
        assert!(matches!(err, ClassifierError::Cancelled));
    }

    #[test]
    fn test_predict_bytes_rejects_invalid_utf8() {
        let e = engine();
        e.registry().publish(fixtures::trained()).unwrap();
        let pinned = e.pin(ModelSelector::Current).unwrap();
        let err = pinned.predict_bytes(&[0x68, 0xc0], Locale::Vietnamese, &CancelToken::new()).unwrap_err();
        assert!(matches!(err, ClassifierError::InvalidEncoding(_)));
        let ok = pinned.predict_bytes("ho".as_bytes(), Locale::Vietnamese, &CancelToken::new()).unwrap();
        assert_eq!(ok.label, "health");
    }

    #[test]
    fn test_predictions_continue_during_publishes() {
        let e = Arc::new(engine());
        e.registry().publish(fixtures::trained()).unwrap();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let e = Arc::clone(&e);
                std::thread::spawn(move || {
                    (0..25)
                        .map(|_| e.predict(&doc("ho"), ModelSelector::Current, &CancelToken::new()).unwrap())
                        .map(|p| p.model_version.raw())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        for _ in 0..5 {
            e.registry().publish(fixtures::trained()).unwrap();
        }

        for r in readers {
            let seen = r.join().unwrap();
            assert!(seen.iter().all(|v| (1..=6).contains(v)));
            // a reader never goes back to an older version
            assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn test_segmenter_cache_is_bounded() {
        let e = engine();
        let total = CACHE_CAPACITY as u64 + 3;
        let first = e.registry().publish(fixtures::trained()).unwrap();
        let pinned_first = e.pin(ModelSelector::Version(first)).unwrap();
        for _ in 1..total {
            e.registry().publish(fixtures::trained()).unwrap();
            e.predict(&doc("ho"), ModelSelector::Current, &CancelToken::new()).unwrap();
        }

        let cached = e.segmenters.read();
        assert_eq!(cached.len(), CACHE_CAPACITY);
        assert!(!cached.contains_key(&first));
        assert!(cached.contains_key(&VersionId::new(total)));
        drop(cached);

        // an evicted version still serves through its pinned handle and on re-pin
        assert_eq!(pinned_first.predict(&doc("ho"), &CancelToken::new()).unwrap().model_version, first);
        let again = e.predict(&doc("ho"), ModelSelector::Version(first), &CancelToken::new()).unwrap();
        assert_eq!(again.model_version, first);
        assert_eq!(e.segmenters.read().len(), CACHE_CAPACITY);
    }
}
