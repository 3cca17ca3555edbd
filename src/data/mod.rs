// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between raw text and tensors:
//
//   raw text
//       │
//       ▼
//   Preprocessor      → NFC + whitespace cleanup
//       │
//       ▼
//   Segmenter         → lazy Vietnamese word segmentation (Lexicon)
//       │
//       ▼
//   FeatureExtractor  → tf-idf vector over a frozen Vocabulary
//       │
//       ▼
//   EncodedDataset    → implements Burn's Dataset trait
//       │
//       ▼
//   FeatureBatcher    → stacks samples into tensor batches
//
// Training additionally uses CorpusLoader (labelled files on disk),
// the stratified splitter and VocabularyBuilder.

/// Reads labelled JSONL / TSV corpora
pub mod loader;

/// Unicode and whitespace normalisation
pub mod preprocessor;

/// Bundled and configured multi-syllable words
pub mod lexicon;

/// Longest-match Vietnamese tokenizer
pub mod segmenter;

/// Feature extractor and vocabulary builder
pub mod features;

/// Implements Burn's Dataset trait for encoded samples
pub mod dataset;

/// Builds tensor batches from encoded samples
pub mod batcher;

/// Seeded, stratified train/validation split
pub mod splitter;
