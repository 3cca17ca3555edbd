// ============================================================
// Layer 6 — Filesystem Artifact Store
// ============================================================
// Keeps encoded artifacts and the "current" pointer in a directory:
//
//   <root>/
//     versions/
//       v1.json        ← encoded ModelArtifact, written once
//       v2.json
//       ...
//     CURRENT          ← version number of the served model
//
// Write discipline:
//   - An artifact is written to a temp file first and then
//     hard-linked to its final name. The link fails if the name is
//     taken, which makes the save create-only, and readers never
//     see a half-written artifact.
//   - CURRENT is replaced with write-temp-then-rename, so it always
//     holds either the old or the new version number.
//   - The compare-and-swap on CURRENT is serialised by an in-process
//     mutex; cross-process publishers must go through one registry.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use uuid::Uuid;

use crate::domain::artifact::VersionId;
use crate::domain::traits::ArtifactStore;
use crate::error::StoreError;

const VERSIONS_DIR: &str = "versions";
const POINTER_FILE: &str = "CURRENT";

pub struct FsArtifactStore {
    root:    PathBuf,
    pointer: Mutex<()>,
}

impl FsArtifactStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        let versions = root.join(VERSIONS_DIR);
        fs::create_dir_all(&versions)
            .map_err(|e| StoreError::io(format!("cannot create '{}'", versions.display()), e))?;
        tracing::debug!("Artifact store at '{}'", root.display());
        Ok(Self { root, pointer: Mutex::new(()) })
    }

    fn artifact_path(&self, version: VersionId) -> PathBuf {
        self.root.join(VERSIONS_DIR).join(format!("v{version}.json"))
    }

    fn pointer_path(&self) -> PathBuf {
        self.root.join(POINTER_FILE)
    }

    /// Write `bytes` to a fresh temp file next to `target` and return its path.
    fn write_temp(&self, target: &Path, bytes: &[u8]) -> Result<PathBuf, StoreError> {
        let file_name = target.file_name().and_then(|n| n.to_str()).unwrap_or("record");
        let tmp = target.with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4()));

        let mut f = fs::File::create(&tmp)
            .map_err(|e| StoreError::io(format!("cannot create '{}'", tmp.display()), e))?;
        f.write_all(bytes)
            .and_then(|_| f.sync_all())
            .map_err(|e| StoreError::io(format!("cannot write '{}'", tmp.display()), e))?;
        Ok(tmp)
    }

    fn read_pointer(&self) -> Result<Option<VersionId>, StoreError> {
        let path = self.pointer_path();
        match fs::read_to_string(&path) {
            Ok(s) => s
                .parse::<VersionId>()
                .map(Some)
                .map_err(|e| StoreError::Corrupt(format!("'{}' holds '{}': {e}", path.display(), s.trim()))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(format!("cannot read '{}'", path.display()), e)),
        }
    }
}

impl ArtifactStore for FsArtifactStore {
    fn load_artifact(&self, version: VersionId) -> Result<Vec<u8>, StoreError> {
        let path = self.artifact_path(version);
        fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StoreError::NotFound(version),
            _ => StoreError::io(format!("cannot read '{}'", path.display()), e),
        })
    }

    fn save_artifact(&self, version: VersionId, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.artifact_path(version);
        let tmp = self.write_temp(&path, bytes)?;

        let linked = fs::hard_link(&tmp, &path);
        // the temp name is never needed again, linked or not
        let _ = fs::remove_file(&tmp);

        match linked {
            Ok(()) => {
                tracing::debug!("Stored artifact v{} ({} bytes)", version, bytes.len());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(StoreError::Conflict),
            Err(e) => Err(StoreError::io(format!("cannot create '{}'", path.display()), e)),
        }
    }

    fn set_current_pointer(&self, expected: Option<VersionId>, next: VersionId) -> Result<(), StoreError> {
        let _guard = self.pointer.lock();

        if self.read_pointer()? != expected {
            return Err(StoreError::Conflict);
        }
        if !self.artifact_path(next).exists() {
            return Err(StoreError::NotFound(next));
        }

        let path = self.pointer_path();
        let tmp = self.write_temp(&path, next.to_string().as_bytes())?;
        fs::rename(&tmp, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            StoreError::io(format!("cannot replace '{}'", path.display()), e)
        })?;

        tracing::debug!("CURRENT → v{}", next);
        Ok(())
    }

    fn get_current_pointer(&self) -> Result<Option<VersionId>, StoreError> {
        self.read_pointer()
    }
}
