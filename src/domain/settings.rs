// ============================================================
// Layer 3 — Tokenizer Settings
// ============================================================
// Segmentation options fixed once per deployment. A trained
// artifact stores the exact settings it was fitted with, and the
// inference engine rebuilds its segmenter from that copy, so a
// model can never be fed tokens produced under different rules.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Upper bound on `max_word_syllables`; the matcher buffers this many syllables.
pub const MAX_WORD_SYLLABLES: usize = 8;

/// How syllables are grouped into words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentationPolicy {
    /// Greedy forward longest match against the lexicon.
    LongestMatch,
    /// One token per syllable, no lexicon lookups.
    Syllable,
}

impl Default for SegmentationPolicy {
    fn default() -> Self {
        SegmentationPolicy::LongestMatch
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    pub policy: SegmentationPolicy,

    /// Longest lexicon entry, in syllables, the matcher will try.
    pub max_word_syllables: usize,

    /// Include the bundled Vietnamese word list.
    pub use_builtin_lexicon: bool,

    /// Extra multi-syllable words, written with spaces (`"huyết áp"`).
    pub lexicon: Vec<String>,

    /// Keep mid-sentence capitalised syllable runs in their original case.
    pub preserve_proper_nouns: bool,

    /// Terms emitted verbatim when they appear as a whole piece (`"COVID-19"`).
    pub keep_as_is: Vec<String>,

    /// Token → canonical token, applied after segmentation
    /// (`"nhức_đầu" → "đau_đầu"`).
    pub synonyms: BTreeMap<String, String>,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            policy:                SegmentationPolicy::LongestMatch,
            max_word_syllables:    4,
            use_builtin_lexicon:   true,
            lexicon:               Vec::new(),
            preserve_proper_nouns: false,
            keep_as_is:            Vec::new(),
            synonyms:              BTreeMap::new(),
        }
    }
}

impl TokenizerConfig {
    /// Reject settings a segmenter cannot honour.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_word_syllables == 0 || self.max_word_syllables > MAX_WORD_SYLLABLES {
            return Err(format!(
                "max_word_syllables must be in 1..={MAX_WORD_SYLLABLES}, got {}",
                self.max_word_syllables
            ));
        }
        if let Some((from, _)) = self.synonyms.iter().find(|(from, to)| from.is_empty() || to.is_empty()) {
            return Err(format!("empty synonym entry for '{from}'"));
        }
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        assert!(TokenizerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_window() {
        for bad in [0, MAX_WORD_SYLLABLES + 1, usize::MAX] {
            let cfg = TokenizerConfig { max_word_syllables: bad, ..TokenizerConfig::default() };
            let err = cfg.validate().unwrap_err();
            assert!(err.contains("max_word_syllables"), "{err}");
        }
    }

    #[test]
    fn test_rejects_empty_synonym() {
        let mut cfg = TokenizerConfig::default();
        cfg.synonyms.insert("ho".into(), String::new());
        assert!(cfg.validate().is_err());
    }
}
