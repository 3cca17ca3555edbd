// ============================================================
// Layer 4 — Feature Extraction
// ============================================================
// Maps a token sequence onto the fixed-length numeric vector a
// model consumes, and builds the vocabulary that defines that
// vector's layout.
//
// Term mapping (shared by training and inference):
//   unigram  token text        → its index, or the OOV slot if unknown
//   bigram   "prev cur"        → its index, or dropped if unknown
//
// Weighting (sklearn-style tf-idf):
//   tf   = count                 or 1 + ln(count) when sublinear
//   idf  = ln((1 + n) / (1 + df)) + 1,   frozen at training time
//   x    = tf · idf, then L2-normalised
//
// Both the builder and the extractor count terms through the
// same `TermCounter`, so training-time and serve-time vectors
// cannot drift apart.

use std::collections::HashMap;

use crate::domain::cancel::CancelToken;
use crate::domain::token::Token;
use crate::domain::vocabulary::{FeatureSettings, Vocabulary, VocabularyId, OOV_TERM};
use crate::error::{ClassifierError, Result};

// ─── FeatureVector ────────────────────────────────────────────────────────────

/// Dense feature vector tagged with the vocabulary it was built against.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    vocabulary_version: VocabularyId,
    values:             Vec<f32>,
}

impl FeatureVector {
    pub fn vocabulary_version(&self) -> &VocabularyId {
        &self.vocabulary_version
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f32> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

}

/// A feature vector plus what the extractor saw on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub vector:         FeatureVector,
    pub token_count:    usize,
    /// Unigrams not in the vocabulary.
    pub unknown_tokens: usize,
}

// ─── Term counting ────────────────────────────────────────────────────────────

/// Per-document term counts over one vocabulary's slots.
struct TermCounter<'v> {
    vocabulary:     &'v Vocabulary,
    counts:         Vec<u32>,
    previous:       Option<String>,
    token_count:    usize,
    unknown_tokens: usize,
}

impl<'v> TermCounter<'v> {
    fn new(vocabulary: &'v Vocabulary) -> Self {
        Self {
            vocabulary,
            counts: vec![0; vocabulary.len()],
            previous: None,
            token_count: 0,
            unknown_tokens: 0,
        }
    }

    fn add(&mut self, token: Token) {
        self.token_count += 1;

        match self.vocabulary.index_of(&token.text) {
            Some(i) => self.counts[i] += 1,
            None => {
                self.unknown_tokens += 1;
                if let Some(oov) = self.vocabulary.oov_index() {
                    self.counts[oov] += 1;
                }
            }
        }

        if self.vocabulary.settings().ngram_max >= 2 {
            if let Some(prev) = &self.previous {
                if let Some(i) = self.vocabulary.index_of(&bigram(prev, &token.text)) {
                    self.counts[i] += 1;
                }
            }
            self.previous = Some(token.text);
        }
    }
}

fn bigram(first: &str, second: &str) -> String {
    format!("{first} {second}")
}

// ─── FeatureExtractor ─────────────────────────────────────────────────────────

/// Stateless extractor bound to one frozen vocabulary.
#[derive(Debug, Clone, Copy)]
pub struct FeatureExtractor<'v> {
    vocabulary: &'v Vocabulary,
}

impl<'v> FeatureExtractor<'v> {
    pub fn new(vocabulary: &'v Vocabulary) -> Self {
        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        self.vocabulary
    }

    /// Vector for `tokens`. An empty sequence yields the zero vector.
    pub fn extract<I>(&self, tokens: I) -> FeatureVector
    where
        I: IntoIterator<Item = Token>,
    {
        let mut counter = TermCounter::new(self.vocabulary);
        tokens.into_iter().for_each(|t| counter.add(t));
        self.finish(counter).vector
    }

    /// Like `extract`, polling `cancel` before each token.
    pub fn extract_with<I>(&self, tokens: I, cancel: &CancelToken) -> Result<Extraction>
    where
        I: IntoIterator<Item = Token>,
    {
        let mut counter = TermCounter::new(self.vocabulary);
        for token in tokens {
            cancel.check()?;
            counter.add(token);
        }
        Ok(self.finish(counter))
    }

    fn finish(&self, counter: TermCounter<'_>) -> Extraction {
        let sublinear = self.vocabulary.settings().sublinear_tf;
        let mut values: Vec<f32> = counter
            .counts
            .iter()
            .enumerate()
            .map(|(i, &count)| match count {
                0 => 0.0,
                c if sublinear => (1.0 + (c as f32).ln()) * self.vocabulary.idf(i),
                c => c as f32 * self.vocabulary.idf(i),
            })
            .collect();

        let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            values.iter_mut().for_each(|v| *v /= norm);
        }

        Extraction {
            vector: FeatureVector { vocabulary_version: self.vocabulary.id().clone(), values },
            token_count: counter.token_count,
            unknown_tokens: counter.unknown_tokens,
        }
    }
}

// ─── VocabularyBuilder ────────────────────────────────────────────────────────

/// Fits a vocabulary and its idf weights to a tokenised corpus.
#[derive(Debug, Clone)]
pub struct VocabularyBuilder {
    pub min_token_frequency: usize,
    pub max_vocab_size:      usize,
    pub settings:            FeatureSettings,
}

impl VocabularyBuilder {
    pub fn new(min_token_frequency: usize, max_vocab_size: usize, settings: FeatureSettings) -> Self {
        Self { min_token_frequency, max_vocab_size, settings }
    }

    /// Select terms and compute document frequencies.
    ///
    /// Terms are kept when they occur at least `min_token_frequency`
    /// times across the corpus; the `max_vocab_size` most frequent
    /// survive (ties broken alphabetically) and are then laid out in
    /// alphabetical order after the OOV slot.
    pub fn build(&self, documents: &[Vec<Token>]) -> Result<Vocabulary> {
        // ── Step 1: corpus-wide term frequencies ──────────────────────────────
        let mut frequencies: HashMap<String, usize> = HashMap::new();
        for tokens in documents {
            for (i, token) in tokens.iter().enumerate() {
                *frequencies.entry(token.text.clone()).or_default() += 1;
                if self.settings.ngram_max >= 2 && i > 0 {
                    *frequencies.entry(bigram(&tokens[i - 1].text, &token.text)).or_default() += 1;
                }
            }
        }

        // ── Step 2: prune and cap ─────────────────────────────────────────────
        let mut ranked: Vec<(String, usize)> = frequencies
            .into_iter()
            .filter(|(term, count)| *count >= self.min_token_frequency.max(1) && term != OOV_TERM)
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(self.max_vocab_size);

        if ranked.is_empty() {
            return Err(ClassifierError::InsufficientData(format!(
                "no term occurs at least {} times in {} documents",
                self.min_token_frequency,
                documents.len()
            )));
        }

        let mut terms: Vec<String> = ranked.into_iter().map(|(term, _)| term).collect();
        terms.sort();
        if self.settings.oov_bucket_enabled {
            terms.insert(0, OOV_TERM.to_string());
        }

        // ── Step 3: document frequencies through the serving-time mapping ─────
        let provisional = Vocabulary::new(terms.clone(), vec![1.0; terms.len()], self.settings, documents.len())
            .map_err(ClassifierError::InvalidArtifact)?;

        let mut df = vec![0usize; terms.len()];
        for tokens in documents {
            let mut counter = TermCounter::new(&provisional);
            tokens.iter().cloned().for_each(|t| counter.add(t));
            for (slot, count) in counter.counts.iter().enumerate() {
                if *count > 0 {
                    df[slot] += 1;
                }
            }
        }

        let n = documents.len() as f32;
        let idf = df.iter().map(|&d| ((1.0 + n) / (1.0 + d as f32)).ln() + 1.0).collect();

        let vocabulary = Vocabulary::new(terms, idf, self.settings, documents.len())
            .map_err(ClassifierError::InvalidArtifact)?;

        tracing::info!(
            id = %vocabulary.id(),
            terms = vocabulary.term_count(),
            documents = documents.len(),
            "Vocabulary built"
        );
        Ok(vocabulary)
    }
}
