// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain structs, enums and traits describing what the system
// works with. No burn, no file I/O, no segmentation logic.

/// Input documents, locales and labelled corpus rows
pub mod document;

/// Segmented tokens and their metadata
pub mod token;

/// Tokenizer settings frozen into every artifact
pub mod settings;

/// Frozen term → index mapping with idf statistics
pub mod vocabulary;

/// Trained / published model bundles and their metrics
pub mod artifact;

/// Inference results
pub mod prediction;

/// Caller-driven cancellation flag
pub mod cancel;

/// Store and corpus abstractions implemented by other layers
pub mod traits;
