// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `train`, `predict` and `show`
// and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, VersionId, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::application::train_use_case::TrainConfig;
use crate::domain::artifact::VersionId;
use crate::domain::settings::{SegmentationPolicy, TokenizerConfig};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a classifier on a labelled corpus and publish it
    Train(TrainArgs),

    /// Classify one text with a published model
    Predict(PredictArgs),

    /// Print a published model's metadata and training metrics
    Show(ShowArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Labelled corpus: `.jsonl` ({"label", "text"} per line) or `.tsv` (label<TAB>text)
    #[arg(long)]
    pub corpus: PathBuf,

    /// Directory holding published model versions
    #[arg(long, default_value = "models")]
    pub store_dir: PathBuf,

    /// Directory for the per-epoch metrics CSV
    #[arg(long)]
    pub metrics_dir: Option<PathBuf>,

    /// Drop terms seen fewer times than this across the training split
    #[arg(long, default_value_t = 2)]
    pub min_token_frequency: usize,

    /// Keep at most this many of the most frequent terms
    #[arg(long, default_value_t = 20_000)]
    pub max_vocab_size: usize,

    /// Ignore unknown tokens instead of counting them in an OOV slot
    #[arg(long)]
    pub no_oov_bucket: bool,

    /// 1 = unigrams only, 2 = unigrams + adjacent-token bigrams
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(1..=2))]
    pub ngram_max: u8,

    /// Use raw term counts instead of 1 + ln(count)
    #[arg(long)]
    pub raw_tf: bool,

    /// Number of full passes through the training split
    #[arg(long, default_value_t = 20)]
    pub epochs: usize,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// Adam step size
    #[arg(long, default_value_t = 0.05)]
    pub lr: f64,

    /// Share of each label held out for validation
    #[arg(long, default_value_t = 0.2)]
    pub validation_fraction: f64,

    /// Seed for the split and mini-batch shuffling
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// One token per syllable; no dictionary compounds
    #[arg(long)]
    pub syllable_only: bool,

    /// Skip the bundled Vietnamese word list
    #[arg(long)]
    pub no_builtin_lexicon: bool,

    /// Extra multi-syllable word, e.g. --word "huyết áp" (repeatable)
    #[arg(long = "word")]
    pub words: Vec<String>,

    /// Term kept exactly as written, e.g. --keep COVID-19 (repeatable)
    #[arg(long = "keep")]
    pub keep_as_is: Vec<String>,

    /// Token rewrite FROM=TO applied after segmentation (repeatable)
    #[arg(long = "synonym", value_parser = parse_synonym)]
    pub synonyms: Vec<(String, String)>,

    /// Keep capitalised mid-sentence names in their original case
    #[arg(long)]
    pub preserve_proper_nouns: bool,
}

fn parse_synonym(s: &str) -> Result<(String, String), String> {
    let (from, to) = s.split_once('=').ok_or_else(|| format!("expected FROM=TO, got '{s}'"))?;
    let (from, to) = (from.trim(), to.trim());
    if from.is_empty() || to.is_empty() {
        return Err(format!("empty side in '{s}'"));
    }
    Ok((from.to_string(), to.to_string()))
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        let tokenizer = TokenizerConfig {
            policy:                if a.syllable_only { SegmentationPolicy::Syllable } else { SegmentationPolicy::LongestMatch },
            use_builtin_lexicon:   !a.no_builtin_lexicon,
            lexicon:               a.words,
            preserve_proper_nouns: a.preserve_proper_nouns,
            keep_as_is:            a.keep_as_is,
            synonyms:              a.synonyms.into_iter().collect::<BTreeMap<_, _>>(),
            ..TokenizerConfig::default()
        };
        TrainConfig {
            min_token_frequency: a.min_token_frequency,
            max_vocab_size:      a.max_vocab_size,
            oov_bucket_enabled:  !a.no_oov_bucket,
            ngram_max:           usize::from(a.ngram_max),
            sublinear_tf:        !a.raw_tf,
            epochs:              a.epochs,
            batch_size:          a.batch_size,
            learning_rate:       a.lr,
            validation_fraction: a.validation_fraction,
            seed:                a.seed,
            tokenizer,
        }
    }
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Text to classify
    #[arg(long)]
    pub text: String,

    /// Language tag of the text
    #[arg(long, default_value = "vi")]
    pub locale: String,

    #[arg(long, default_value = "models")]
    pub store_dir: PathBuf,

    /// Use this version instead of the current one (e.g. 3 or v3)
    #[arg(long)]
    pub version: Option<VersionId>,
}

/// All arguments for the `show` command
#[derive(Args, Debug)]
pub struct ShowArgs {
    #[arg(long, default_value = "models")]
    pub store_dir: PathBuf,

    /// Version to describe; defaults to the current one
    #[arg(long)]
    pub version: Option<VersionId>,
}
