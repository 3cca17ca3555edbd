// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Holds out part of the corpus to measure how the classifier does
// on text it never trained on.
//
// The split is stratified: every label is shuffled and cut on its
// own, so a rare label still shows up on both sides instead of
// landing entirely in one of them by chance. Each label keeps at
// least one training example.
//
// Shuffling uses a seeded StdRng, so the same corpus and seed always
// produce the same split and therefore the same trained model.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::domain::document::LabeledText;

/// Shuffle `samples` with `rng` and split into (train, validation).
pub fn split_train_val<T>(mut samples: Vec<T>, train_fraction: f64, rng: &mut StdRng) -> (Vec<T>, Vec<T>) {
    samples.shuffle(rng);

    let total = samples.len();
    let split_at = ((total as f64) * train_fraction.clamp(0.0, 1.0)).round() as usize;
    let val = samples.split_off(split_at.min(total));

    (samples, val)
}

/// Per-label split of a labelled corpus.
pub fn stratified_split(
    examples: Vec<LabeledText>,
    validation_fraction: f64,
    seed: u64,
) -> (Vec<LabeledText>, Vec<LabeledText>) {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut by_label: BTreeMap<String, Vec<LabeledText>> = BTreeMap::new();
    for example in examples {
        by_label.entry(example.label.clone()).or_default().push(example);
    }

    let mut train = Vec::new();
    let mut val = Vec::new();
    for group in by_label.into_values() {
        let (mut t, mut v) = split_train_val(group, 1.0 - validation_fraction, &mut rng);
        if t.is_empty() {
            // the whole label went to validation; pull one back
            t.extend(v.pop());
        }
        train.extend(t);
        val.extend(v);
    }

    train.shuffle(&mut rng);
    tracing::debug!(
        "Dataset split: {} training, {} validation ({}% / {}%)",
        train.len(),
        val.len(),
        (train.len() * 100) / (train.len() + val.len()).max(1),
        (val.len() * 100) / (train.len() + val.len()).max(1),
    );

    (train, val)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn corpus(health: usize, traffic: usize) -> Vec<LabeledText> {
        (0..health)
            .map(|i| LabeledText::new("health", format!("ho {i}")))
            .chain((0..traffic).map(|i| LabeledText::new("traffic", format!("xe {i}"))))
            .collect()
    }

    #[test]
    fn test_correct_split_sizes() {
        let mut rng = StdRng::seed_from_u64(1);
        let items: Vec<usize> = (0..100).collect();
        let (train, val) = split_train_val(items, 0.8, &mut rng);
        assert_eq!(train.len(), 80);
        assert_eq!(val.len(), 20);
    }

    #[test]
    fn test_empty_dataset() {
        let mut rng = StdRng::seed_from_u64(1);
        let (train, val) = split_train_val(Vec::<usize>::new(), 0.8, &mut rng);
        assert!(train.is_empty());
        assert!(val.is_empty());
    }

    #[test]
    fn test_stratified_keeps_label_ratio() {
        let (train, val) = stratified_split(corpus(50, 10), 0.2, 7);
        let val_traffic = val.iter().filter(|e| e.label == "traffic").count();
        assert_eq!(val.len(), 12);
        assert_eq!(val_traffic, 2);
        assert_eq!(train.len(), 48);
    }

    #[test]
    fn test_every_label_keeps_a_training_example() {
        let (train, val) = stratified_split(corpus(1, 1), 0.9, 3);
        assert_eq!(train.len(), 2);
        assert!(val.is_empty());
    }

    #[test]
    fn test_zero_fraction_keeps_everything() {
        let (train, val) = stratified_split(corpus(5, 5), 0.0, 3);
        assert_eq!(train.len(), 10);
        assert!(val.is_empty());
    }

    #[test]
    fn test_same_seed_same_split() {
        let a = stratified_split(corpus(20, 20), 0.25, 42);
        let b = stratified_split(corpus(20, 20), 0.25, 42);
        assert_eq!(a, b);
    }
}
