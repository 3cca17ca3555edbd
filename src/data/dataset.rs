// ============================================================
// Layer 4 — Encoded Training Dataset
// ============================================================
// The training corpus after segmentation and feature extraction:
// one dense feature row plus a label index per example. Implements
// burn's Dataset trait so the trainer can index samples the same
// way whether it is shuffling, batching or evaluating.

use std::collections::BTreeMap;

use burn::data::dataset::Dataset;

use crate::domain::document::LabeledText;

/// Sorted, de-duplicated label names; a label's position is its class index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    labels: Vec<String>,
}

impl LabelSet {
    pub fn from_examples(examples: &[LabeledText]) -> Self {
        let mut labels: Vec<String> = examples.iter().map(|e| e.label.clone()).collect();
        labels.sort();
        labels.dedup();
        Self { labels }
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.binary_search_by(|l| l.as_str().cmp(label)).ok()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.labels
    }
}

/// Example count per label.
pub fn label_counts(examples: &[LabeledText]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for e in examples {
        *counts.entry(e.label.clone()).or_insert(0) += 1;
    }
    counts
}

/// One feature row and its class index.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedSample {
    pub features: Vec<f32>,
    pub label:    usize,
}

pub struct EncodedDataset {
    samples:   Vec<EncodedSample>,
    input_dim: usize,
}

impl EncodedDataset {
    pub fn new(samples: Vec<EncodedSample>, input_dim: usize) -> Self {
        Self { samples, input_dim }
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl Dataset<EncodedSample> for EncodedDataset {
    fn get(&self, index: usize) -> Option<EncodedSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        EncodedDataset::len(self)
    }
}
