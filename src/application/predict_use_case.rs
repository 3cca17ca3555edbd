// ============================================================
// Layer 2 — Predict Use Case
// ============================================================
// Turns a raw request (text or bytes plus a locale tag) into a
// Document, runs it through the inference engine and shapes the
// answer for callers:
//
//   { label, score, model_version, timestamp, ... }

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::artifact::VersionId;
use crate::domain::cancel::CancelToken;
use crate::domain::document::{Document, DocumentId, Locale};
use crate::domain::prediction::{LabelScore, Prediction};
use crate::error::Result;
use crate::ml::inferencer::{InferenceEngine, ModelSelector};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionReport {
    pub label:         String,
    pub score:         f32,
    pub model_version: VersionId,
    pub timestamp:     DateTime<Utc>,
    pub document_id:   DocumentId,
    pub distribution:  Vec<LabelScore>,
}

impl From<Prediction> for PredictionReport {
    fn from(p: Prediction) -> Self {
        Self {
            label:         p.label,
            score:         p.score,
            model_version: p.model_version,
            timestamp:     p.created_at,
            document_id:   p.document_id,
            distribution:  p.distribution,
        }
    }
}

pub struct PredictUseCase {
    engine: Arc<InferenceEngine>,
}

impl PredictUseCase {
    pub fn new(engine: Arc<InferenceEngine>) -> Self {
        Self { engine }
    }

    /// Classify `raw_text` with the current model.
    pub fn predict(&self, raw_text: &str, locale: &str) -> Result<PredictionReport> {
        self.run(Document::new(raw_text, Locale::parse(locale)), ModelSelector::Current, &CancelToken::new())
    }

    /// Classify undecoded input; invalid UTF-8 is a client error.
    pub fn predict_bytes(&self, bytes: &[u8], locale: &str) -> Result<PredictionReport> {
        let document = Document::from_bytes(bytes, Locale::parse(locale))?;
        self.run(document, ModelSelector::Current, &CancelToken::new())
    }

    /// Classify with an exact version, cancellable by the caller.
    pub fn predict_pinned(
        &self,
        raw_text: &str,
        locale:   &str,
        version:  VersionId,
        cancel:   &CancelToken,
    ) -> Result<PredictionReport> {
        self.run(Document::new(raw_text, Locale::parse(locale)), ModelSelector::Version(version), cancel)
    }

    fn run(&self, document: Document, selector: ModelSelector, cancel: &CancelToken) -> Result<PredictionReport> {
        let prediction = self.engine.predict(&document, selector, cancel)?;
        tracing::debug!(
            document = %document.id,
            locale = %document.locale,
            version = %prediction.model_version,
            "Classified as '{}' ({:.3})",
            prediction.label,
            prediction.score,
        );
        Ok(prediction.into())
    }
}
