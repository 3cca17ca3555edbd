// ============================================================
// Layer 4 — Feature Batcher
// ============================================================
// Stacks encoded samples into the tensors one optimisation step
// (or one evaluation pass) consumes:
//
//   features: [batch, input_dim]   f32, already tf-idf weighted
//   targets:  [batch]              class indices
//
// Rows are flattened row-major and reshaped on the device, the
// same way for training (autodiff backend) and evaluation.

use burn::prelude::*;
use burn::tensor::TensorData;

use crate::data::dataset::EncodedSample;

#[derive(Debug, Clone)]
pub struct FeatureBatch<B: Backend> {
    pub features: Tensor<B, 2>,
    pub targets:  Tensor<B, 1, Int>,
}

#[derive(Clone, Debug)]
pub struct FeatureBatcher<B: Backend> {
    device:    B::Device,
    input_dim: usize,
}

impl<B: Backend> FeatureBatcher<B> {
    pub fn new(device: B::Device, input_dim: usize) -> Self {
        Self { device, input_dim }
    }

    pub fn batch(&self, items: Vec<EncodedSample>) -> FeatureBatch<B> {
        let rows: Vec<&[f32]> = items.iter().map(|s| s.features.as_slice()).collect();
        let targets: Vec<i32> = items.iter().map(|s| s.label as i32).collect();

        FeatureBatch {
            features: self.features(&rows),
            targets:  Tensor::<B, 1, Int>::from_ints(targets.as_slice(), &self.device),
        }
    }

    /// Feature rows only, for inference.
    pub fn features(&self, rows: &[&[f32]]) -> Tensor<B, 2> {
        let flat: Vec<f32> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Tensor::<B, 2>::from_data(TensorData::new(flat, [rows.len(), self.input_dim]), &self.device)
    }
}
