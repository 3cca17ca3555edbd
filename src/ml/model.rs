// ============================================================
// Layer 5 — Softmax Regression Classifier
// ============================================================
// A single linear layer over the tf-idf vector followed by a
// softmax over the labels:
//
//   logits = x · W + b        x: [batch, input_dim]
//                             W: [input_dim, labels]
//                             b: [labels]
//   p      = softmax(logits)
//
// The weight layout matches ModelParameters (row-major
// [input_dim][labels]), so moving between the burn module and the
// persisted blob is a plain copy in both directions.

use burn::{
    module::Param,
    nn::loss::CrossEntropyLossConfig,
    prelude::*,
    tensor::{activation::softmax, TensorData},
};

use crate::domain::artifact::{ModelParameters, ParameterFormat};
use crate::error::{ClassifierError, Result as ClassifierResult};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct TextClassifierConfig {
    pub input_dim:  usize,
    pub num_labels: usize,
}

impl TextClassifierConfig {
    /// All-zero parameters: training starts from the same point every run.
    pub fn init<B: Backend>(&self, device: &B::Device) -> TextClassifier<B> {
        TextClassifier {
            weight: Param::from_tensor(Tensor::zeros([self.input_dim, self.num_labels], device)),
            bias:   Param::from_tensor(Tensor::zeros([self.num_labels], device)),
        }
    }
}

#[derive(Module, Debug)]
pub struct TextClassifier<B: Backend> {
    pub weight: Param<Tensor<B, 2>>,
    pub bias:   Param<Tensor<B, 1>>,
}

impl<B: Backend> TextClassifier<B> {
    /// Rebuild the module from a persisted parameter blob.
    pub fn from_parameters(parameters: &ModelParameters, device: &B::Device) -> Self {
        let (d, k) = (parameters.input_dim, parameters.num_labels());
        let weight = Tensor::<B, 2>::from_data(TensorData::new(parameters.weights.clone(), [d, k]), device);
        let bias = Tensor::<B, 1>::from_data(TensorData::new(parameters.bias.clone(), [k]), device);
        Self { weight: Param::from_tensor(weight), bias: Param::from_tensor(bias) }
    }

    /// features: [batch, input_dim] → logits: [batch, labels]
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        features.matmul(self.weight.val()) + self.bias.val().unsqueeze::<2>()
    }

    /// features → per-label probabilities, each row summing to 1.
    pub fn probabilities(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        softmax(self.forward(features), 1)
    }

    /// Mean cross-entropy of the batch, plus the logits it was computed from.
    pub fn forward_loss(&self, features: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let logits = self.forward(features);
        let loss = CrossEntropyLossConfig::new()
            .init(&logits.device())
            .forward(logits.clone(), targets);
        (loss, logits)
    }

    /// Snapshot the current weights into a persistable blob.
    pub fn to_parameters(&self, labels: Vec<String>) -> ClassifierResult<ModelParameters> {
        let [input_dim, _] = self.weight.val().dims();
        Ok(ModelParameters {
            format: ParameterFormat::SoftmaxRegressionV1,
            labels,
            input_dim,
            weights: tensor_values(self.weight.val())?,
            bias: tensor_values(self.bias.val())?,
        })
    }
}

/// Copy a float tensor's contents out as `f32`.
pub fn tensor_values<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> ClassifierResult<Vec<f32>> {
    tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| ClassifierError::Compute(format!("cannot read tensor data: {e:?}")))
}
