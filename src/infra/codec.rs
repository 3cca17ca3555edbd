// ============================================================
// Layer 6 — Artifact Codec
// ============================================================
// Serialises a ModelArtifact into the bytes an ArtifactStore
// keeps, inside a small versioned envelope:
//
//   {
//     "format":         "vntext-classifier/model-artifact",
//     "format_version": 1,
//     "artifact":       { ...ModelArtifact... }
//   }
//
// The envelope header is checked before the body is decoded, so
// a record written by an incompatible build fails with a clear
// InvalidArtifact instead of a confusing field error. The decoded
// artifact is validated again on the way in: bytes on disk are
// never trusted more than a fresh training run.

use serde::{Deserialize, Serialize};

use crate::domain::artifact::{ModelArtifact, VersionId};
use crate::error::{ClassifierError, Result};

pub const ARTIFACT_FORMAT: &str = "vntext-classifier/model-artifact";
pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    format:         &'a str,
    format_version: u32,
    artifact:       &'a ModelArtifact,
}

#[derive(Deserialize)]
struct Header {
    format:         String,
    format_version: u32,
}

#[derive(Deserialize)]
struct Envelope {
    artifact: ModelArtifact,
}

pub fn encode(artifact: &ModelArtifact) -> Result<Vec<u8>> {
    serde_json::to_vec(&EnvelopeRef { format: ARTIFACT_FORMAT, format_version: FORMAT_VERSION, artifact })
        .map_err(|e| ClassifierError::InvalidArtifact(format!("cannot encode version {}: {e}", artifact.version)))
}

/// Decode the record stored under `expected` and check it really is that version.
pub fn decode(bytes: &[u8], expected: VersionId) -> Result<ModelArtifact> {
    let header: Header = serde_json::from_slice(bytes)
        .map_err(|e| ClassifierError::InvalidArtifact(format!("version {expected}: unreadable envelope: {e}")))?;
    if header.format != ARTIFACT_FORMAT {
        return Err(ClassifierError::InvalidArtifact(format!(
            "version {expected}: unknown record format '{}'",
            header.format
        )));
    }
    if header.format_version != FORMAT_VERSION {
        return Err(ClassifierError::InvalidArtifact(format!(
            "version {expected}: unsupported format version {} (expected {FORMAT_VERSION})",
            header.format_version
        )));
    }

    let envelope: Envelope = serde_json::from_slice(bytes)
        .map_err(|e| ClassifierError::InvalidArtifact(format!("version {expected}: {e}")))?;
    let artifact = envelope.artifact;
    if artifact.version != expected {
        return Err(ClassifierError::InvalidArtifact(format!(
            "record stored as version {expected} claims version {}",
            artifact.version
        )));
    }
    artifact.validate()?;
    Ok(artifact)
}
