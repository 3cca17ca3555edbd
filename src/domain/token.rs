// ============================================================
// Layer 3 — Token Domain Type
// ============================================================
// The normalised unit produced by segmentation. Tokens exist only
// in flight between the tokenizer and the feature extractor and
// are never persisted.

use serde::{Deserialize, Serialize};

/// What the segmenter decided a token is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    /// A single lower-cased syllable.
    Word,
    /// Several syllables matched as one lexicon entry, joined by `_`.
    Compound,
    /// Digits, possibly with internal `.` or `,` separators.
    Numeral,
    /// A capitalised syllable run kept with its original case.
    ProperNoun,
    /// A configured keep-as-is term, emitted exactly as written.
    Verbatim,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text:      String,
    pub kind:      TokenKind,
    /// Number of syllables the token spans in the source text.
    pub syllables: usize,
}

impl Token {
    pub fn new(text: impl Into<String>, kind: TokenKind, syllables: usize) -> Self {
        Self { text: text.into(), kind, syllables }
    }

    /// Keep-as-is tokens bypass lower-casing and punctuation stripping.
    pub fn keep_as_is(&self) -> bool {
        matches!(self.kind, TokenKind::Numeral | TokenKind::ProperNoun | TokenKind::Verbatim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keep_as_is_kinds() {
        assert!(Token::new("37.5", TokenKind::Numeral, 1).keep_as_is());
        assert!(Token::new("Hà_Nội", TokenKind::ProperNoun, 2).keep_as_is());
        assert!(!Token::new("sức_khỏe", TokenKind::Compound, 2).keep_as_is());
        assert!(!Token::new("ho", TokenKind::Word, 1).keep_as_is());
    }
}
