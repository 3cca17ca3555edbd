// ============================================================
// Layer 4 — Text Normaliser
// ============================================================
// Brings raw request text into one canonical form before the
// segmenter looks at it.
//
// Vietnamese text arrives in two Unicode shapes:
//   - precomposed:  "ỏ" as the single code point U+1ECF
//   - decomposed:   "o" + U+0309 (hook above)
// Both render identically but compare unequal, so a lexicon entry
// written one way would never match input typed the other way.
// NFC composition removes that difference.
//
// Cleaning steps (applied in order):
//   1. NFC composition (tokenizers' NormalizedString)
//   2. Unicode whitespace variants and control characters → space,
//      \r → \n
//   3. Collapse runs of spaces and trim each line
//   4. Drop blank lines; a line break survives as a single \n,
//      which the segmenter treats as a phrase boundary

use tokenizers::NormalizedString;

#[derive(Debug, Clone, Copy, Default)]
pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// NFC-compose `text` without touching anything else.
    pub fn normalize_unicode(&self, text: &str) -> String {
        let mut normalized = NormalizedString::from(text);
        normalized.nfc();
        normalized.get().to_string()
    }

    /// Full cleaning pass used on every document before segmentation.
    pub fn clean(&self, text: &str) -> String {
        let composed = self.normalize_unicode(text);

        // ── Step 2: map invisible characters ─────────────────────────────────
        let mapped: String = composed
            .chars()
            .map(|c| match c {
                '\t' | '\u{00A0}' | '\u{200B}' | '\u{FEFF}' | '\u{202F}' => ' ',
                '\r' => '\n',
                c if c.is_control() && c != '\n' => ' ',
                c => c,
            })
            .collect();

        // ── Steps 3 + 4: per-line collapse ───────────────────────────────────
        mapped
            .lines()
            .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
