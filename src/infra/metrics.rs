// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records training metrics to a CSV file after each epoch, so a
// run's learning curve can be plotted next to earlier runs.
//
// Metrics recorded per epoch:
//   - run:            random id shared by the rows of one run
//   - epoch:          the epoch number (1, 2, 3, ...)
//   - train_loss:     mean cross-entropy over training batches
//   - train_accuracy: fraction of training texts classified right
//   - val_accuracy:   same on the held-out split (empty if none)
//
// Example CSV output:
//   run,epoch,train_loss,train_accuracy,val_accuracy
//   3f2c…,1,0.693147,0.500000,0.500000
//   3f2c…,2,0.512900,0.910000,0.880000
//
// How to read the metrics:
//   - Loss should decrease each epoch
//   - train_accuracy rising while val_accuracy falls → overfitting

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use uuid::Uuid;

use crate::domain::artifact::EpochMetrics;

const HEADER: &str = "run,epoch,train_loss,train_accuracy,val_accuracy";

/// Appends epoch metrics to `<dir>/metrics.csv`.
pub struct MetricsLogger {
    csv_path: PathBuf,
    /// Groups the rows of one training run.
    run_id:   Uuid,
}

impl MetricsLogger {
    /// Create the directory and write the CSV header if the file is new.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).with_context(|| format!("Cannot create metrics dir '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path, run_id: Uuid::new_v4() })
    }

    /// Append one epoch's metrics as a new row.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        let val = m.val_accuracy.map(|a| format!("{a:.6}")).unwrap_or_default();
        writeln!(f, "{},{},{:.6},{:.6},{}", self.run_id, m.epoch, m.train_loss, m.train_accuracy, val)?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, train_acc={:.4}",
            m.epoch,
            m.train_loss,
            m.train_accuracy,
        );
        Ok(())
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
