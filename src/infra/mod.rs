// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Persistence and cross-cutting concerns:
//
//   codec.rs        — Versioned JSON envelope for ModelArtifact
//                     records; decoding re-validates every
//                     invariant before an artifact is served.
//
//   memory_store.rs — ArtifactStore kept in process memory
//   fs_store.rs     — ArtifactStore in a directory, with
//                     create-only artifact files and an
//                     atomically renamed CURRENT pointer
//
//   registry.rs     — ModelRegistry: version allocation, the
//                     compare-and-swap publish protocol, the
//                     in-memory current pointer and the
//                     per-version artifact cache
//
//   metrics.rs      — Training metrics logging
//                     Writes epoch-level loss and accuracy to a
//                     CSV file for later analysis and plotting.

/// Artifact envelope encoding and decoding
pub mod codec;

/// In-memory artifact store
pub mod memory_store;

/// Filesystem artifact store
pub mod fs_store;

/// Versioned model registry
pub mod registry;

/// Training metrics CSV logger
pub mod metrics;
