// ============================================================
// Layer 2 — Classifier Service
// ============================================================
// The one object a host process keeps around. It owns the
// registry and the inference engine and exposes the two external
// operations:
//
//   predict(raw_text, locale)        → PredictionReport
//   publish_model(corpus_reference)  → PublishReport
//
// Publishing trains synchronously on the caller's thread;
// `spawn_publish` does the same on a background thread so that
// serving never waits on a training run.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::application::predict_use_case::{PredictUseCase, PredictionReport};
use crate::application::train_use_case::{PublishReport, TrainConfig, TrainUseCase};
use crate::data::loader::CorpusLoader;
use crate::domain::artifact::{ModelArtifact, VersionId};
use crate::domain::cancel::CancelToken;
use crate::domain::traits::ArtifactStore;
use crate::error::Result;
use crate::infra::registry::ModelRegistry;
use crate::ml::inferencer::{InferenceEngine, ModelSelector};

pub struct ClassifierService {
    registry:  Arc<ModelRegistry>,
    engine:    Arc<InferenceEngine>,
    predictor: PredictUseCase,
    trainer:   TrainUseCase,
}

impl ClassifierService {
    pub fn new(store: Arc<dyn ArtifactStore>, config: TrainConfig) -> Self {
        Self::with_trainer(store, TrainUseCase::new(config))
    }

    pub fn with_trainer(store: Arc<dyn ArtifactStore>, trainer: TrainUseCase) -> Self {
        Self::with_registry(ModelRegistry::new(store), trainer)
    }

    /// Serve from a preconfigured registry (e.g. a custom poll interval).
    pub fn with_registry(registry: ModelRegistry, trainer: TrainUseCase) -> Self {
        let registry = Arc::new(registry);
        let engine = Arc::new(InferenceEngine::new(Arc::clone(&registry)));
        let predictor = PredictUseCase::new(Arc::clone(&engine));
        Self { registry, engine, predictor, trainer }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn engine(&self) -> &InferenceEngine {
        &self.engine
    }

    pub fn predict(&self, raw_text: &str, locale: &str) -> Result<PredictionReport> {
        self.predictor.predict(raw_text, locale)
    }

    pub fn predict_bytes(&self, bytes: &[u8], locale: &str) -> Result<PredictionReport> {
        self.predictor.predict_bytes(bytes, locale)
    }

    pub fn predict_pinned(
        &self,
        raw_text: &str,
        locale:   &str,
        version:  VersionId,
        cancel:   &CancelToken,
    ) -> Result<PredictionReport> {
        self.predictor.predict_pinned(raw_text, locale, version, cancel)
    }

    /// Artifact served for `selector`.
    pub fn model(&self, selector: ModelSelector) -> Result<Arc<ModelArtifact>> {
        match selector {
            ModelSelector::Current => self.registry.current(),
            ModelSelector::Version(v) => self.registry.get(v),
        }
    }

    /// Train on the corpus file at `corpus_reference` and publish.
    pub fn publish_model(&self, corpus_reference: impl AsRef<Path>) -> Result<PublishReport> {
        let loader = CorpusLoader::new(corpus_reference.as_ref());
        self.trainer.execute(&loader, &self.registry)
    }

    /// `publish_model` on a background thread.
    pub fn spawn_publish(self: &Arc<Self>, corpus_reference: impl Into<PathBuf>) -> JoinHandle<Result<PublishReport>> {
        let service = Arc::clone(self);
        let corpus = corpus_reference.into();
        thread::spawn(move || {
            let outcome = service.publish_model(&corpus);
            if let Err(e) = &outcome {
                tracing::warn!("Background publish from '{}' failed: {e}", corpus.display());
            }
            outcome
        })
    }
}
