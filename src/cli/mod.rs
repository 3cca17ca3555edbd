// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for operators. Uses the `clap` crate to parse
// command line arguments; all work is delegated to Layer 2.
//
// Three commands are supported:
//   1. `train`   — trains on a labelled corpus and publishes
//   2. `predict` — classifies one text
//   3. `show`    — prints a published model's metadata
//
// Every command prints one JSON document on stdout.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use commands::{Commands, PredictArgs, ShowArgs, TrainArgs};
use serde_json::json;

use crate::application::{
    service::ClassifierService,
    train_use_case::{TrainConfig, TrainUseCase},
};
use crate::domain::cancel::CancelToken;
use crate::infra::fs_store::FsArtifactStore;
use crate::ml::inferencer::ModelSelector;

#[derive(Parser, Debug)]
#[command(
    name = "vntext-classifier",
    version,
    about = "Train, version and serve Vietnamese text classifiers."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching handler.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => run_train(args),
            Commands::Predict(args) => run_predict(args),
            Commands::Show(args)    => run_show(args),
        }
    }
}

fn open_service(store_dir: &Path, trainer: TrainUseCase) -> Result<ClassifierService> {
    let store = FsArtifactStore::open(store_dir)
        .with_context(|| format!("Cannot open model store '{}'", store_dir.display()))?;
    Ok(ClassifierService::with_trainer(Arc::new(store), trainer))
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_train(args: TrainArgs) -> Result<()> {
    tracing::info!("Training on corpus '{}'", args.corpus.display());

    let corpus = args.corpus.clone();
    let store_dir = args.store_dir.clone();
    let metrics_dir = args.metrics_dir.clone();

    let mut trainer = TrainUseCase::new(args.into());
    if let Some(dir) = metrics_dir {
        trainer = trainer.with_metrics_dir(dir);
    }

    let service = open_service(&store_dir, trainer)?;
    let report = service
        .publish_model(&corpus)
        .with_context(|| format!("Training on '{}' failed", corpus.display()))?;
    print_json(&report)
}

fn run_predict(args: PredictArgs) -> Result<()> {
    let service = open_service(&args.store_dir, TrainUseCase::new(TrainConfig::default()))?;
    let report = match args.version {
        Some(v) => service.predict_pinned(&args.text, &args.locale, v, &CancelToken::new()),
        None => service.predict(&args.text, &args.locale),
    }
    .context("Prediction failed")?;
    print_json(&report)
}

fn run_show(args: ShowArgs) -> Result<()> {
    let service = open_service(&args.store_dir, TrainUseCase::new(TrainConfig::default()))?;
    let artifact = service.model(ModelSelector::from(args.version)).context("Cannot load model")?;
    let is_current = service.registry().latest_version()? == Some(artifact.version);

    print_json(&json!({
        "version":            artifact.version,
        "current":            is_current,
        "vocabulary_version": artifact.vocabulary_version,
        "vocabulary_size":    artifact.vocabulary.len(),
        "labels":             artifact.parameters.labels,
        "trained_at":         artifact.trained_at,
        "tokenizer":          artifact.tokenizer,
        "metrics":            artifact.metrics,
    }))
}
