#![recursion_limit = "256"]
//! Vietnamese text classification core.
//!
//! Raw text is segmented into Vietnamese words, weighted into a
//! TF-IDF vector against a frozen vocabulary and scored by a
//! softmax classifier. Trained bundles are published as numbered,
//! immutable versions; inference pins one version per call.
//!
//! Layers, outermost first:
//!
//! - [`cli`]         — `train`, `predict`, `show` commands
//! - [`application`] — use cases and the [`application::service::ClassifierService`] facade
//! - [`domain`]      — plain data types and the storage traits
//! - [`data`]        — preprocessing, segmentation, features, corpus loading
//! - [`ml`]          — Burn model, training loop, inference engine
//! - [`infra`]       — artifact codec, stores, registry, metrics CSV

pub mod cli;
pub mod application;
pub mod domain;
pub mod data;
pub mod ml;
pub mod infra;
pub mod error;

pub use application::service::ClassifierService;
pub use error::{ClassifierError, ErrorClass, Result};
