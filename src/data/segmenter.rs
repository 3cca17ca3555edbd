// ============================================================
// Layer 4 — Vietnamese Segmenter
// ============================================================
// Turns normalised text into the token sequence the feature
// extractor consumes.
//
// Vietnamese puts a space between every syllable, including the
// syllables of one word: "sức khỏe" (health) is one word written
// as two space-separated units. The segmenter therefore works in
// two passes, both lazy:
//
//   text ──▶ Pieces  ─▶ syllables, numerals and keep-as-is terms,
//                       each flagged with whether punctuation or a
//                       line break separates it from its predecessor
//        ──▶ Tokens  ─▶ greedy forward longest match against the
//                       lexicon over a small lookahead window,
//                       never across a boundary
//
// Only `window` pieces are buffered at any time, so a caller that
// stops pulling tokens early (cancellation) pays for nothing more.
// A TokenStream owns its normalised text and can be iterated any
// number of times; every pass yields the same sequence.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::data::lexicon::Lexicon;
use crate::data::preprocessor::Preprocessor;
use crate::domain::document::Locale;
use crate::domain::settings::{SegmentationPolicy, TokenizerConfig, MAX_WORD_SYLLABLES};
use crate::domain::token::{Token, TokenKind};

/// Punctuation that also starts a new sentence.
const SENTENCE_END: [char; 4] = ['.', '!', '?', '…'];

// ─── Segmenter ────────────────────────────────────────────────────────────────

/// Tokenizer built from one frozen `TokenizerConfig`.
#[derive(Debug, Clone)]
pub struct Segmenter {
    config:       TokenizerConfig,
    lexicon:      Lexicon,
    keep_as_is:   HashSet<String>,
    synonyms:     HashMap<String, String>,
    /// Pieces buffered ahead of the cursor.
    window:       usize,
    /// Longest compound the matcher will try.
    max_compound: usize,
    preprocessor: Preprocessor,
}

impl Segmenter {
    pub fn new(config: &TokenizerConfig) -> Self {
        let preprocessor = Preprocessor::new();

        let mut lexicon = if config.use_builtin_lexicon { Lexicon::builtin() } else { Lexicon::default() };
        lexicon.extend(config.lexicon.iter().map(String::as_str));

        let keep_as_is = config
            .keep_as_is
            .iter()
            .map(|t| preprocessor.normalize_unicode(t.trim()))
            .filter(|t| !t.is_empty())
            .collect();

        let synonyms = config
            .synonyms
            .iter()
            .map(|(from, to)| (canonical_term(&preprocessor, from), canonical_term(&preprocessor, to)))
            .filter(|(from, to)| !from.is_empty() && !to.is_empty())
            .collect();

        let window = config.max_word_syllables.clamp(1, MAX_WORD_SYLLABLES);
        let max_compound = window.min(lexicon.max_syllables());

        tracing::debug!(
            lexicon = lexicon.len(),
            keep_as_is = config.keep_as_is.len(),
            synonyms = config.synonyms.len(),
            window,
            "Segmenter ready"
        );

        Self { config: config.clone(), lexicon, keep_as_is, synonyms, window, max_compound, preprocessor }
    }

    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    /// Segment `text`. Vietnamese text under the longest-match policy
    /// gets compound detection; everything else is split per syllable.
    pub fn tokenize(&self, text: &str, locale: &Locale) -> TokenStream<'_> {
        TokenStream {
            segmenter: self,
            text:      self.preprocessor.clean(text),
            compound:  locale.is_vietnamese() && self.config.policy == SegmentationPolicy::LongestMatch,
        }
    }

    /// Collect the full token sequence of `text`.
    pub fn segment(&self, text: &str, locale: &Locale) -> Vec<Token> {
        self.tokenize(text, locale).iter().collect()
    }

    /// Synonym rewrite; keep-as-is tokens pass through untouched.
    fn canonical(&self, token: Token) -> Token {
        if token.keep_as_is() {
            return token;
        }
        match self.synonyms.get(&token.text) {
            Some(target) => Token { text: target.clone(), ..token },
            None => token,
        }
    }
}

/// Synonym keys and values are token texts: NFC, lower-case, `_`-joined.
fn canonical_term(preprocessor: &Preprocessor, raw: &str) -> String {
    preprocessor
        .normalize_unicode(raw)
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

// ─── TokenStream ──────────────────────────────────────────────────────────────

/// Restartable token sequence of one document.
#[derive(Debug, Clone)]
pub struct TokenStream<'s> {
    segmenter: &'s Segmenter,
    text:      String,
    compound:  bool,
}

impl<'s> TokenStream<'s> {
    /// Start a fresh pass over the tokens.
    pub fn iter(&self) -> Tokens<'_> {
        Tokens {
            segmenter: self.segmenter,
            pieces:    Pieces::new(&self.text, &self.segmenter.keep_as_is),
            window:    VecDeque::with_capacity(self.segmenter.window),
            compound:  self.compound,
        }
    }
}

impl<'a, 's> IntoIterator for &'a TokenStream<'s> {
    type Item = Token;
    type IntoIter = Tokens<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ─── Tokens ───────────────────────────────────────────────────────────────────

pub struct Tokens<'a> {
    segmenter: &'a Segmenter,
    pieces:    Pieces<'a>,
    window:    VecDeque<Piece<'a>>,
    compound:  bool,
}

impl<'a> Tokens<'a> {
    fn syllable_token(&mut self, first: Piece<'a>) -> Token {
        let seg = self.segmenter;
        // syllables in the window that may join `first`
        let run = 1 + self.window.iter().take_while(|p| p.joinable()).count();

        if seg.config.preserve_proper_nouns && first.capitalized() && !first.sentence_start {
            let len = 1 + self.window.iter().take(run - 1).take_while(|p| p.capitalized()).count();
            let mut parts = vec![first.text];
            parts.extend(self.window.drain(..len - 1).map(|p| p.text));
            return Token::new(parts.join("_"), TokenKind::ProperNoun, len);
        }

        if self.compound && run >= 2 && seg.max_compound >= 2 {
            let lowered: Vec<String> = std::iter::once(first.text)
                .chain(self.window.iter().take(run.min(seg.max_compound) - 1).map(|p| p.text))
                .map(str::to_lowercase)
                .collect();

            for n in (2..=lowered.len()).rev() {
                if seg.lexicon.contains(&lowered[..n].join(" ")) {
                    self.window.drain(..n - 1);
                    return Token::new(lowered[..n].join("_"), TokenKind::Compound, n);
                }
            }
        }

        Token::new(first.text.to_lowercase(), TokenKind::Word, 1)
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        while self.window.len() < self.segmenter.window {
            match self.pieces.next() {
                Some(piece) => self.window.push_back(piece),
                None => break,
            }
        }

        let first = self.window.pop_front()?;
        let token = match first.kind {
            PieceKind::Numeral => Token::new(first.text, TokenKind::Numeral, 1),
            PieceKind::Verbatim => Token::new(first.text, TokenKind::Verbatim, 1),
            PieceKind::Syllable => self.syllable_token(first),
        };
        Some(self.segmenter.canonical(token))
    }
}

// ─── Pieces ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PieceKind {
    Syllable,
    Numeral,
    Verbatim,
}

#[derive(Debug, Clone, Copy)]
struct Piece<'a> {
    text:           &'a str,
    kind:           PieceKind,
    /// Nothing but plain spaces separates it from the previous piece.
    attached:       bool,
    sentence_start: bool,
}

impl Piece<'_> {
    fn joinable(&self) -> bool {
        self.attached && self.kind == PieceKind::Syllable
    }

    fn capitalized(&self) -> bool {
        self.text.chars().next().is_some_and(char::is_uppercase)
    }
}

/// Splits cleaned text into pieces one whitespace chunk at a time.
struct Pieces<'a> {
    rest:           &'a str,
    keep_as_is:     &'a HashSet<String>,
    queue:          VecDeque<Piece<'a>>,
    boundary:       bool,
    sentence_start: bool,
}

impl<'a> Pieces<'a> {
    fn new(text: &'a str, keep_as_is: &'a HashSet<String>) -> Self {
        Self { rest: text, keep_as_is, queue: VecDeque::new(), boundary: true, sentence_start: true }
    }

    fn mark_boundary(&mut self, punctuation: &str) {
        self.boundary = true;
        if punctuation.contains(&SENTENCE_END[..]) {
            self.sentence_start = true;
        }
    }

    fn push(&mut self, text: &'a str, kind: PieceKind) {
        self.queue.push_back(Piece {
            text,
            kind,
            attached:       !self.boundary,
            sentence_start: self.sentence_start,
        });
        self.boundary = false;
        self.sentence_start = false;
    }

    fn split_chunk(&mut self, chunk: &'a str) {
        if self.keep_as_is.contains(chunk) {
            self.push(chunk, PieceKind::Verbatim);
            return;
        }

        let Some(start) = chunk.find(is_word_char) else {
            self.mark_boundary(chunk);
            return;
        };
        let end = chunk
            .char_indices()
            .rev()
            .find(|(_, c)| is_word_char(*c))
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(chunk.len());

        let (lead, core, trail) = (&chunk[..start], &chunk[start..end], &chunk[end..]);
        if !lead.is_empty() {
            self.mark_boundary(lead);
        }
        if self.keep_as_is.contains(core) {
            self.push(core, PieceKind::Verbatim);
        } else {
            self.split_core(core);
        }
        if !trail.is_empty() {
            self.mark_boundary(trail);
        }
    }

    /// Internal punctuation is a hard boundary, except `.` and `,`
    /// between two digits, which stay inside a numeral.
    fn split_core(&mut self, core: &'a str) {
        let chars: Vec<(usize, char)> = core.char_indices().collect();
        let mut piece_start: Option<usize> = None;

        for (k, &(i, c)) in chars.iter().enumerate() {
            let numeric_separator = matches!(c, '.' | ',')
                && k > 0
                && chars[k - 1].1.is_numeric()
                && chars.get(k + 1).is_some_and(|(_, next)| next.is_numeric());

            if is_word_char(c) || numeric_separator {
                piece_start.get_or_insert(i);
            } else {
                if let Some(s) = piece_start.take() {
                    self.push_piece(&core[s..i]);
                }
                self.mark_boundary(&core[i..i + c.len_utf8()]);
            }
        }
        if let Some(s) = piece_start {
            self.push_piece(&core[s..]);
        }
    }

    fn push_piece(&mut self, text: &'a str) {
        let numeral = text.chars().all(|c| c.is_numeric() || c == '.' || c == ',');
        self.push(text, if numeral { PieceKind::Numeral } else { PieceKind::Syllable });
    }
}

impl<'a> Iterator for Pieces<'a> {
    type Item = Piece<'a>;

    fn next(&mut self) -> Option<Piece<'a>> {
        loop {
            if let Some(piece) = self.queue.pop_front() {
                return Some(piece);
            }

            let trimmed = self.rest.trim_start();
            if self.rest[..self.rest.len() - trimmed.len()].contains('\n') {
                self.boundary = true;
                self.sentence_start = true;
            }
            if trimmed.is_empty() {
                self.rest = trimmed;
                return None;
            }

            let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
            let (chunk, rest) = trimmed.split_at(end);
            self.rest = rest;
            self.split_chunk(chunk);
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || ('\u{0300}'..='\u{036F}').contains(&c)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn texts(seg: &Segmenter, text: &str) -> Vec<String> {
        seg.segment(text, &Locale::Vietnamese).into_iter().map(|t| t.text).collect()
    }

    fn default_segmenter() -> Segmenter {
        Segmenter::new(&TokenizerConfig::default())
    }

    #[test]
    fn test_joins_lexicon_compounds() {
        let seg = default_segmenter();
        assert_eq!(
            texts(&seg, "Tôi bị đau đầu và sốt cao"),
            vec!["tôi", "bị", "đau_đầu", "và", "sốt_cao"]
        );
    }

    #[test]
    fn test_prefers_longest_match() {
        let seg = default_segmenter();
        let tokens = seg.segment("thi giấy phép lái xe", &Locale::Vietnamese);
        assert_eq!(tokens[1].text, "giấy_phép_lái_xe");
        assert_eq!(tokens[1].kind, TokenKind::Compound);
        assert_eq!(tokens[1].syllables, 4);
    }

    #[test]
    fn test_punctuation_blocks_compounds() {
        let seg = default_segmenter();
        assert_eq!(texts(&seg, "đau, đầu"), vec!["đau", "đầu"]);
        assert_eq!(texts(&seg, "sức\nkhỏe"), vec!["sức", "khỏe"]);
        assert_eq!(texts(&seg, "(sức khỏe)!"), vec!["sức_khỏe"]);
    }

    #[test]
    fn test_numerals_keep_separators() {
        let seg = default_segmenter();
        let tokens = seg.segment("sốt 38,5 độ, phạt 1.000.000 đồng.", &Locale::Vietnamese);
        let shown: Vec<_> = tokens.iter().map(|t| (t.text.as_str(), t.kind)).collect();
        assert_eq!(
            shown,
            vec![
                ("sốt", TokenKind::Word),
                ("38,5", TokenKind::Numeral),
                ("độ", TokenKind::Word),
                ("phạt", TokenKind::Word),
                ("1.000.000", TokenKind::Numeral),
                ("đồng", TokenKind::Word),
            ]
        );
    }

    #[test]
    fn test_keep_as_is_terms_are_verbatim() {
        let config = TokenizerConfig { keep_as_is: vec!["COVID-19".into()], ..TokenizerConfig::default() };
        let seg = Segmenter::new(&config);
        let tokens = seg.segment("Bệnh COVID-19, rất nguy hiểm", &Locale::Vietnamese);
        assert_eq!(tokens[1], Token::new("COVID-19", TokenKind::Verbatim, 1));
        assert_eq!(tokens.last().map(|t| t.text.as_str()), Some("nguy_hiểm"));
    }

    #[test]
    fn test_unlisted_hyphenated_term_is_split() {
        let seg = default_segmenter();
        assert_eq!(texts(&seg, "COVID-19"), vec!["covid", "19"]);
    }

    #[test]
    fn test_proper_nouns_keep_case_when_enabled() {
        let config = TokenizerConfig { preserve_proper_nouns: true, ..TokenizerConfig::default() };
        let seg = Segmenter::new(&config);
        let tokens = seg.segment("Tôi sống ở Hà Nội.", &Locale::Vietnamese);
        assert_eq!(tokens[0].text, "tôi");
        assert_eq!(tokens[3], Token::new("Hà_Nội", TokenKind::ProperNoun, 2));

        let plain = default_segmenter();
        assert_eq!(texts(&plain, "Tôi sống ở Hà Nội."), vec!["tôi", "sống", "ở", "hà_nội"]);
    }

    #[test]
    fn test_other_locales_split_per_syllable() {
        let seg = default_segmenter();
        let tokens = seg.segment("sức khỏe", &Locale::parse("en"));
        assert_eq!(tokens.iter().map(|t| t.text.as_str()).collect::<Vec<_>>(), vec!["sức", "khỏe"]);
    }

    #[test]
    fn test_syllable_policy_skips_lexicon() {
        let config = TokenizerConfig { policy: SegmentationPolicy::Syllable, ..TokenizerConfig::default() };
        let seg = Segmenter::new(&config);
        assert_eq!(texts(&seg, "sức khỏe"), vec!["sức", "khỏe"]);
    }

    #[test]
    fn test_custom_lexicon_without_builtin() {
        let config = TokenizerConfig {
            use_builtin_lexicon: false,
            lexicon: vec!["máy bay".into()],
            ..TokenizerConfig::default()
        };
        let seg = Segmenter::new(&config);
        assert_eq!(texts(&seg, "máy bay và sức khỏe"), vec!["máy_bay", "và", "sức", "khỏe"]);
    }

    #[test]
    fn test_synonyms_are_applied_after_segmentation() {
        let mut config = TokenizerConfig::default();
        config.synonyms.insert("nhức đầu".into(), "đau_đầu".into());
        let seg = Segmenter::new(&config);
        assert_eq!(texts(&seg, "bị nhức đầu"), vec!["bị", "đau_đầu"]);
    }

    #[test]
    fn test_synonyms_skip_keep_as_is_tokens() {
        let mut config = TokenizerConfig { keep_as_is: vec!["sars".into()], ..TokenizerConfig::default() };
        config.synonyms.insert("2".into(), "hai".into());
        config.synonyms.insert("sars".into(), "cúm".into());
        let seg = Segmenter::new(&config);
        assert_eq!(texts(&seg, "2 ca sars"), vec!["2", "ca", "sars"]);
    }

    #[test]
    fn test_oversized_word_window_is_clamped() {
        let config = TokenizerConfig { max_word_syllables: usize::MAX, ..TokenizerConfig::default() };
        let seg = Segmenter::new(&config);
        assert_eq!(seg.window, MAX_WORD_SYLLABLES);
        assert_eq!(texts(&seg, "thi giấy phép lái xe"), vec!["thi", "giấy_phép_lái_xe"]);
    }

    #[test]
    fn test_decomposed_input_matches_lexicon() {
        let seg = default_segmenter();
        assert_eq!(texts(&seg, "su\u{301}c kho\u{309}e"), vec!["sức_khỏe"]);
    }

    #[test]
    fn test_stream_is_restartable() {
        let seg = default_segmenter();
        let stream = seg.tokenize("Tập thể dục mỗi ngày giúp tăng cường sức khỏe.", &Locale::Vietnamese);
        let first: Vec<Token> = stream.iter().collect();
        let second: Vec<Token> = (&stream).into_iter().collect();
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn test_empty_and_punctuation_only_input() {
        let seg = default_segmenter();
        assert!(seg.segment("", &Locale::Vietnamese).is_empty());
        assert!(seg.segment("  ...  !! ", &Locale::Vietnamese).is_empty());
    }

    proptest! {
        #[test]
        fn prop_tokenization_is_deterministic(text in "\\PC{0,80}") {
            let seg = default_segmenter();
            let a = seg.segment(&text, &Locale::Vietnamese);
            let b = seg.segment(&text, &Locale::Vietnamese);
            prop_assert_eq!(&a, &b);
            for token in &a {
                prop_assert!(!token.text.is_empty());
                prop_assert!(!token.text.chars().any(char::is_whitespace));
            }
        }

        #[test]
        fn prop_syllable_policy_never_compounds(text in "[a-zđơư ,.]{0,60}") {
            let seg = default_segmenter();
            let tokens = seg.segment(&text, &Locale::parse("en"));
            prop_assert!(tokens.iter().all(|t| t.kind != TokenKind::Compound));
        }
    }
}
