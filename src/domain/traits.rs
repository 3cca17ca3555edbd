// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The two seams where the core meets the outside world:
//
//   ArtifactStore — the durable key → record store that holds
//                   serialised artifacts and the "current" pointer
//   CorpusSource  — anything that can hand the training pipeline
//                   a list of labelled texts
//
// Implementations:
//   - InMemoryArtifactStore / FsArtifactStore (infra layer)
//   - CorpusLoader (data layer) → JSONL / TSV files

use crate::domain::artifact::VersionId;
use crate::domain::document::LabeledText;
use crate::error::{Result, StoreError};

/// Narrow persistence interface consumed by the model registry.
///
/// The store knows nothing about artifact contents; it moves bytes
/// and one pointer.
pub trait ArtifactStore: Send + Sync {
    fn load_artifact(&self, version: VersionId) -> std::result::Result<Vec<u8>, StoreError>;

    /// Create-only write. Returns `StoreError::Conflict` if the version
    /// already holds an artifact.
    fn save_artifact(&self, version: VersionId, bytes: &[u8]) -> std::result::Result<(), StoreError>;

    /// Compare-and-swap the current pointer from `expected` to `next`.
    /// Returns `StoreError::Conflict` if the pointer moved in between.
    fn set_current_pointer(
        &self,
        expected: Option<VersionId>,
        next: VersionId,
    ) -> std::result::Result<(), StoreError>;

    fn get_current_pointer(&self) -> std::result::Result<Option<VersionId>, StoreError>;
}

/// Any component that can load a labelled training corpus.
pub trait CorpusSource {
    fn load_all(&self) -> Result<Vec<LabeledText>>;
}
