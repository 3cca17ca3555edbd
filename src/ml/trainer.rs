// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Fits the softmax classifier on encoded samples with Adam.
//
//   - Training uses TrainBackend (Autodiff<NdArray>) for gradients
//   - model.valid() returns the model on the plain NdArray backend,
//     used for accuracy so evaluation carries no autodiff overhead
//   - Mini-batches come from a seeded shuffle of sample indices, so
//     the same data, options and seed give the same weights
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use burn::{
    backend::{
        ndarray::{NdArray, NdArrayDevice},
        Autodiff,
    },
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    data::dataset::Dataset,
    prelude::*,
};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::data::batcher::FeatureBatcher;
use crate::data::dataset::{EncodedDataset, LabelSet};
use crate::domain::artifact::{EpochMetrics, ModelParameters};
use crate::error::{ClassifierError, Result};
use crate::ml::model::{TextClassifier, TextClassifierConfig};

type TrainBackend = Autodiff<NdArray>;
type EvalBackend = NdArray;

#[derive(Debug, Clone)]
pub struct FitOptions {
    pub epochs:        usize,
    pub batch_size:    usize,
    pub learning_rate: f64,
    pub seed:          u64,
}

/// Final weights and the curve that produced them.
#[derive(Debug, Clone)]
pub struct FitReport {
    pub parameters:          ModelParameters,
    pub epochs:              Vec<EpochMetrics>,
    pub best_epoch:          usize,
    pub final_loss:          f64,
    pub train_accuracy:      f64,
    pub validation_accuracy: Option<f64>,
}

pub struct Trainer {
    options: FitOptions,
    device:  NdArrayDevice,
}

impl Trainer {
    pub fn new(options: FitOptions) -> Self {
        Self { options, device: NdArrayDevice::default() }
    }

    /// Train on `train`, evaluating on `validation` after every epoch.
    /// `on_epoch` sees each epoch's metrics as soon as they exist.
    pub fn fit(
        &self,
        train:      &EncodedDataset,
        validation: Option<&EncodedDataset>,
        labels:     &LabelSet,
        mut on_epoch: impl FnMut(&EpochMetrics),
    ) -> Result<FitReport> {
        if train.is_empty() {
            return Err(ClassifierError::InsufficientData("training split is empty".to_string()));
        }
        let opts = &self.options;
        if opts.epochs == 0 || opts.batch_size == 0 {
            return Err(ClassifierError::InvalidConfig(format!(
                "epochs and batch_size must be at least 1, got {} and {}",
                opts.epochs, opts.batch_size
            )));
        }
        let input_dim = train.input_dim();

        // ── Build model ───────────────────────────────────────────────────────
        let mut model: TextClassifier<TrainBackend> =
            TextClassifierConfig::new(input_dim, labels.len()).init(&self.device);
        tracing::info!(input_dim, labels = labels.len(), samples = train.len(), "Classifier ready");

        // ── Adam optimiser ────────────────────────────────────────────────────
        // m = β1*m + (1-β1)*g        (mean)
        // v = β2*v + (1-β2)*g²       (variance)
        // θ = θ - lr * m / (√v + ε)  (update)
        let mut optim = AdamConfig::new().with_epsilon(1e-8).init();

        let train_batcher = FeatureBatcher::<TrainBackend>::new(self.device.clone(), input_dim);
        let eval_batcher = FeatureBatcher::<EvalBackend>::new(self.device.clone(), input_dim);

        let mut rng = StdRng::seed_from_u64(opts.seed);
        let mut order: Vec<usize> = (0..train.len()).collect();
        let batch_size = opts.batch_size;

        let mut history = Vec::with_capacity(opts.epochs);
        let mut best_loss = f64::INFINITY;
        let mut best_epoch = 0;

        // ── Epoch loop ────────────────────────────────────────────────────────
        for epoch in 1..=opts.epochs {
            order.shuffle(&mut rng);

            let mut loss_sum = 0.0f64;
            let mut batches = 0usize;

            for chunk in order.chunks(batch_size) {
                let items = chunk.iter().filter_map(|&i| train.get(i)).collect();
                let batch = train_batcher.batch(items);

                let (loss, _) = model.forward_loss(batch.features, batch.targets);
                loss_sum += loss.clone().into_scalar().elem::<f64>();
                batches += 1;

                // Backward pass + Adam update
                let grads = loss.backward();
                let grads = GradientsParams::from_grads(grads, &model);
                model = optim.step(opts.learning_rate, model, grads);
            }

            let train_loss = loss_sum / batches as f64;
            if !train_loss.is_finite() {
                return Err(ClassifierError::Compute(format!("training loss diverged at epoch {epoch}")));
            }

            // ── Evaluation ────────────────────────────────────────────────────
            let model_valid = model.valid();
            let train_accuracy = accuracy(&model_valid, train, &eval_batcher, batch_size);
            let val_accuracy = validation
                .filter(|v| !v.is_empty())
                .map(|v| accuracy(&model_valid, v, &eval_batcher, batch_size));

            let metrics = EpochMetrics { epoch, train_loss, train_accuracy, val_accuracy };
            if metrics.is_improvement(best_loss) {
                best_loss = train_loss;
                best_epoch = epoch;
            }

            tracing::info!(
                "Epoch {:>3}/{} | train_loss={:.4} | train_acc={:.1}% | val_acc={}",
                epoch,
                opts.epochs,
                train_loss,
                train_accuracy * 100.0,
                val_accuracy.map_or_else(|| "n/a".to_string(), |a| format!("{:.1}%", a * 100.0)),
            );
            on_epoch(&metrics);
            history.push(metrics);
        }

        let parameters = model.valid().to_parameters(labels.names().to_vec())?;
        let last = history.last().cloned().ok_or_else(|| ClassifierError::Compute("no epoch ran".to_string()))?;

        tracing::info!("Training complete!");
        Ok(FitReport {
            parameters,
            best_epoch,
            final_loss: last.train_loss,
            train_accuracy: last.train_accuracy,
            validation_accuracy: last.val_accuracy,
            epochs: history,
        })
    }
}

/// Fraction of `dataset` whose argmax prediction equals its label.
pub fn accuracy<B: Backend>(
    model:      &TextClassifier<B>,
    dataset:    &EncodedDataset,
    batcher:    &FeatureBatcher<B>,
    batch_size: usize,
) -> f64 {
    if dataset.is_empty() {
        return 0.0;
    }

    let mut correct = 0i64;
    let indices: Vec<usize> = (0..dataset.len()).collect();
    for chunk in indices.chunks(batch_size.max(1)) {
        let items = chunk.iter().filter_map(|&i| dataset.get(i)).collect();
        let batch = batcher.batch(items);

        // argmax(1) is [batch, 1]; targets are [batch]
        let predicted = model.forward(batch.features).argmax(1).flatten::<1>(0, 1);
        correct += predicted.equal(batch.targets).int().sum().into_scalar().elem::<i64>();
    }

    correct as f64 / dataset.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::EncodedSample;

    fn separable() -> (EncodedDataset, LabelSet) {
        // label 0 lights feature 0, label 1 lights feature 1
        let samples = (0..20)
            .map(|i| {
                let label = i % 2;
                let mut features = vec![0.0; 3];
                features[label] = 1.0;
                features[2] = 0.1;
                EncodedSample { features, label }
            })
            .collect();
        let labels = LabelSet::from_examples(&[
            crate::domain::document::LabeledText::new("a", ""),
            crate::domain::document::LabeledText::new("b", ""),
        ]);
        (EncodedDataset::new(samples, 3), labels)
    }

    fn options() -> FitOptions {
        FitOptions { epochs: 30, batch_size: 4, learning_rate: 0.1, seed: 7 }
    }

    #[test]
    fn test_fits_separable_data() {
        let (data, labels) = separable();
        let mut seen = 0;
        let report = Trainer::new(options()).fit(&data, Some(&data), &labels, |_| seen += 1).unwrap();

        assert_eq!(seen, 30);
        assert_eq!(report.epochs.len(), 30);
        assert_eq!(report.train_accuracy, 1.0);
        assert_eq!(report.validation_accuracy, Some(1.0));
        assert!(report.final_loss < report.epochs[0].train_loss);
        assert_eq!(report.parameters.input_dim, 3);
        assert_eq!(report.parameters.weights.len(), 6);
    }

    #[test]
    fn test_same_seed_same_weights() {
        let (data, labels) = separable();
        let a = Trainer::new(options()).fit(&data, None, &labels, |_| {}).unwrap();
        let b = Trainer::new(options()).fit(&data, None, &labels, |_| {}).unwrap();
        assert_eq!(a.parameters, b.parameters);
        assert_eq!(a.validation_accuracy, None);
    }

    #[test]
    fn test_zero_epochs_is_rejected() {
        let (data, labels) = separable();
        let mut seen = 0;
        let opts = FitOptions { epochs: 0, ..options() };
        let err = Trainer::new(opts).fit(&data, None, &labels, |_| seen += 1).unwrap_err();
        assert!(matches!(err, ClassifierError::InvalidConfig(_)));
        assert_eq!(seen, 0);

        let opts = FitOptions { batch_size: 0, ..options() };
        assert!(Trainer::new(opts).fit(&data, None, &labels, |_| {}).is_err());
    }

    #[test]
    fn test_accuracy_reads_through_dataset() {
        let (data, labels) = separable();
        let report = Trainer::new(options()).fit(&data, None, &labels, |_| {}).unwrap();
        let device = NdArrayDevice::default();
        let model = TextClassifier::<EvalBackend>::from_parameters(&report.parameters, &device);
        let batcher = FeatureBatcher::<EvalBackend>::new(device, 3);
        // batch sizes that do not divide the sample count still see every sample
        assert_eq!(accuracy(&model, &data, &batcher, 3), 1.0);
        assert_eq!(accuracy(&model, &data, &batcher, 64), 1.0);
    }

    #[test]
    fn test_empty_training_split_is_rejected() {
        let (_, labels) = separable();
        let empty = EncodedDataset::new(Vec::new(), 3);
        let err = Trainer::new(options()).fit(&empty, None, &labels, |_| {}).unwrap_err();
        assert!(matches!(err, ClassifierError::InsufficientData(_)));
    }
}
