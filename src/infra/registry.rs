// ============================================================
// Layer 6 — Model Registry
// ============================================================
// Owns the versioned artifacts and the one "current" pointer
// that decides which of them serves predictions.
//
// Publish protocol:
//   1. validate the trained bundle       → InvalidArtifact
//   2. allocate the next version id       (pointer + 1)
//   3. write the encoded artifact         create-only; on Conflict
//                                          the id is taken, try +1
//   4. compare-and-swap the pointer        retried on Conflict; a
//                                          newer pointer wins
//   5. install the artifact in memory
//
// The pointer is only touched after the artifact is durable, so
// it can never name a version that fails to load. Publishes are
// serialised by `writer`; readers take a brief read lock on an
// Arc and never wait for a publish to finish writing bytes.
//
// Other processes may publish into the same store. `current`
// re-reads the pointer at most once per poll interval and
// installs anything newer. At most CACHE_CAPACITY decoded versions
// stay cached; the oldest non-current ones are evicted first and
// reload from the store on demand.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};

use crate::domain::artifact::{ModelArtifact, TrainedArtifact, VersionId};
use crate::domain::traits::ArtifactStore;
use crate::error::{ClassifierError, Result, StoreError};
use crate::infra::codec;

/// Give up on store contention after this many retries.
const MAX_ATTEMPTS: usize = 16;

/// Decoded versions kept in memory per registry.
pub const CACHE_CAPACITY: usize = 8;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

pub struct ModelRegistry {
    store:         Arc<dyn ArtifactStore>,
    current:       RwLock<Option<Arc<ModelArtifact>>>,
    cache:         RwLock<HashMap<VersionId, Arc<ModelArtifact>>>,
    writer:        Mutex<()>,
    poll_interval: Duration,
    last_poll:     Mutex<Instant>,
}

impl ModelRegistry {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            store,
            current:       RwLock::new(None),
            cache:         RwLock::new(HashMap::new()),
            writer:        Mutex::new(()),
            poll_interval: DEFAULT_POLL_INTERVAL,
            last_poll:     Mutex::new(Instant::now()),
        }
    }

    /// How often `current` re-reads the store pointer. Zero polls on every call.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Persist `trained` as a new version and make it current.
    pub fn publish(&self, trained: TrainedArtifact) -> Result<VersionId> {
        trained.validate()?;
        let _writer = self.writer.lock();

        // ── Steps 2 + 3: allocate and write ───────────────────────────────────
        let pointer = self.store.get_current_pointer()?;
        let mut artifact = ModelArtifact::from_trained(pointer.map_or(VersionId::new(1), |v| v.next()), trained);
        let mut attempts = 0;
        loop {
            let bytes = codec::encode(&artifact)?;
            match self.store.save_artifact(artifact.version, &bytes) {
                Ok(()) => break,
                Err(StoreError::Conflict) if attempts < MAX_ATTEMPTS => {
                    tracing::debug!("Version {} already taken, trying next", artifact.version);
                    artifact.version = artifact.version.next();
                    attempts += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
        let version = artifact.version;

        // ── Step 4: swap the pointer ──────────────────────────────────────────
        let mut expected = pointer;
        let mut superseded = false;
        let mut attempts = 0;
        loop {
            if expected.is_some_and(|cur| cur >= version) {
                superseded = true;
                break;
            }
            match self.store.set_current_pointer(expected, version) {
                Ok(()) => break,
                Err(StoreError::Conflict) if attempts < MAX_ATTEMPTS => {
                    expected = self.store.get_current_pointer()?;
                    attempts += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }

        // ── Step 5: install ───────────────────────────────────────────────────
        let artifact = self.cache_insert(Arc::new(artifact));
        if superseded {
            tracing::warn!("Version {} stored but superseded by {:?} before it went live", version, expected);
            self.refresh()?;
        } else {
            self.install(artifact);
            tracing::info!("Published model version {}", version);
        }

        Ok(version)
    }

    /// The artifact currently serving. Loads the persisted pointer on
    /// first use after a restart, and picks up newer versions from
    /// other publishers once per poll interval.
    pub fn current(&self) -> Result<Arc<ModelArtifact>> {
        let installed = self.current.read().clone();
        if let Some(artifact) = installed {
            if !self.poll_due() {
                return Ok(artifact);
            }
            if let Err(e) = self.catch_up(artifact.version) {
                tracing::warn!("Could not check for a newer model, serving {}: {e}", artifact.version);
            }
            return Ok(self.current.read().clone().unwrap_or(artifact));
        }

        let version = self.store.get_current_pointer()?.ok_or(ClassifierError::ModelUnavailable)?;
        let artifact = self.get(version)?;
        self.install(Arc::clone(&artifact));
        Ok(artifact)
    }

    /// A specific published version, for pinned inference.
    pub fn get(&self, version: VersionId) -> Result<Arc<ModelArtifact>> {
        if let Some(artifact) = self.cache.read().get(&version) {
            return Ok(Arc::clone(artifact));
        }

        let bytes = self.store.load_artifact(version).map_err(|e| match e {
            StoreError::NotFound(v) => ClassifierError::VersionNotFound(v),
            other => other.into(),
        })?;
        let artifact = Arc::new(codec::decode(&bytes, version)?);
        tracing::debug!("Loaded model version {} from store", version);

        Ok(self.cache_insert(artifact))
    }

    /// Re-read the store pointer, picking up versions published by
    /// another registry over the same store.
    pub fn refresh(&self) -> Result<Option<VersionId>> {
        let Some(version) = self.store.get_current_pointer()? else {
            return Ok(None);
        };
        let artifact = self.get(version)?;
        self.install(artifact);
        Ok(Some(version))
    }

    /// Version the store pointer names right now, without loading it.
    pub fn latest_version(&self) -> Result<Option<VersionId>> {
        Ok(self.store.get_current_pointer()?)
    }

    /// Version currently installed in memory, if any.
    pub fn current_version(&self) -> Option<VersionId> {
        self.current.read().as_ref().map(|a| a.version)
    }

    /// Claim the next poll slot. Readers that lose the race skip the poll.
    fn poll_due(&self) -> bool {
        let Some(mut last) = self.last_poll.try_lock() else {
            return false;
        };
        if last.elapsed() < self.poll_interval {
            return false;
        }
        *last = Instant::now();
        true
    }

    fn catch_up(&self, installed: VersionId) -> Result<()> {
        if let Some(latest) = self.store.get_current_pointer()? {
            if latest > installed {
                let artifact = self.get(latest)?;
                tracing::info!("Picked up model version {} from the store", latest);
                self.install(artifact);
            }
        }
        Ok(())
    }

    /// Cache `artifact`, evicting the oldest versions that are neither
    /// current nor the one just inserted.
    fn cache_insert(&self, artifact: Arc<ModelArtifact>) -> Arc<ModelArtifact> {
        let keep = self.current_version();
        let version = artifact.version;
        let mut cache = self.cache.write();
        let cached = Arc::clone(cache.entry(version).or_insert(artifact));

        if cache.len() > CACHE_CAPACITY {
            let mut evictable: Vec<VersionId> =
                cache.keys().copied().filter(|&v| v != version && Some(v) != keep).collect();
            evictable.sort_unstable();
            let excess = cache.len() - CACHE_CAPACITY;
            for v in evictable.into_iter().take(excess) {
                cache.remove(&v);
            }
        }
        cached
    }

    /// Swap `artifact` in unless a newer one is already installed.
    fn install(&self, artifact: Arc<ModelArtifact>) {
        let mut current = self.current.write();
        if current.as_ref().map_or(true, |c| c.version < artifact.version) {
            *current = Some(artifact);
        }
    }
}
