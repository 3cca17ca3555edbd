// ============================================================
// Layer 6 — In-Memory Artifact Store
// ============================================================
// ArtifactStore backed by a HashMap behind one parking_lot mutex.
// Used by tests and by embedders that keep models only for the
// lifetime of the process.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::domain::artifact::VersionId;
use crate::domain::traits::ArtifactStore;
use crate::error::StoreError;

#[derive(Default)]
struct State {
    artifacts: HashMap<VersionId, Vec<u8>>,
    current:   Option<VersionId>,
}

#[derive(Default)]
pub struct InMemoryArtifactStore {
    state: Mutex<State>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored artifacts, published or not.
    pub fn len(&self) -> usize {
        self.state.lock().artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ArtifactStore for InMemoryArtifactStore {
    fn load_artifact(&self, version: VersionId) -> Result<Vec<u8>, StoreError> {
        self.state.lock().artifacts.get(&version).cloned().ok_or(StoreError::NotFound(version))
    }

    fn save_artifact(&self, version: VersionId, bytes: &[u8]) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        if state.artifacts.contains_key(&version) {
            return Err(StoreError::Conflict);
        }
        state.artifacts.insert(version, bytes.to_vec());
        Ok(())
    }

    fn set_current_pointer(&self, expected: Option<VersionId>, next: VersionId) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        if state.current != expected {
            return Err(StoreError::Conflict);
        }
        if !state.artifacts.contains_key(&next) {
            return Err(StoreError::NotFound(next));
        }
        state.current = Some(next);
        Ok(())
    }

    fn get_current_pointer(&self) -> Result<Option<VersionId>, StoreError> {
        Ok(self.state.lock().current)
    }
}
