// ============================================================
// Layer 3 — Prediction
// ============================================================
// The output of one inference call. It always names the model
// version that produced it so the result can be reproduced later
// with a pinned `get(version)`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::artifact::VersionId;
use crate::domain::document::DocumentId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub document_id:    DocumentId,
    pub model_version:  VersionId,
    pub label:          String,
    /// Probability of `label`.
    pub score:          f32,
    /// Every label's probability, highest first.
    pub distribution:   Vec<LabelScore>,
    pub token_count:    usize,
    /// Tokens that fell into the out-of-vocabulary bucket (or were dropped).
    pub unknown_tokens: usize,
    pub created_at:     DateTime<Utc>,
}
