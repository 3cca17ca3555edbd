// ============================================================
// Layer 3 — Document Domain Type
// ============================================================
// A single piece of text submitted for inference, tagged with
// the locale it was written in. Documents are immutable once
// built: the inference engine only ever borrows them.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ClassifierError, Result};

/// Identifier attached to every document and echoed in its Prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Language tag of a document.
///
/// Only Vietnamese gets dictionary segmentation; every other tag
/// falls back to one token per syllable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Locale {
    Vietnamese,
    Other(String),
}

impl Locale {
    /// Parse a BCP-47-ish tag. `vi`, `vi-VN`, `vi_vn` and the empty
    /// string all mean Vietnamese.
    pub fn parse(tag: &str) -> Self {
        let tag = tag.trim().to_ascii_lowercase();
        let primary = tag.split(['-', '_']).next().unwrap_or("");
        if primary.is_empty() || primary == "vi" {
            Locale::Vietnamese
        } else {
            Locale::Other(tag)
        }
    }

    pub fn is_vietnamese(&self) -> bool {
        matches!(self, Locale::Vietnamese)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::Vietnamese => f.write_str("vi"),
            Locale::Other(tag) => f.write_str(tag),
        }
    }
}

/// A raw text input plus its locale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id:     DocumentId,
    pub text:   String,
    pub locale: Locale,
}

impl Document {
    pub fn new(text: impl Into<String>, locale: Locale) -> Self {
        Self {
            id:     DocumentId::new(),
            text:   text.into(),
            locale,
        }
    }

    /// Build a document from undecoded bytes, rejecting anything
    /// that is not valid UTF-8.
    pub fn from_bytes(bytes: &[u8], locale: Locale) -> Result<Self> {
        let text = std::str::from_utf8(bytes).map_err(|e| {
            ClassifierError::InvalidEncoding(format!(
                "invalid byte sequence at offset {}",
                e.valid_up_to()
            ))
        })?;
        Ok(Self::new(text, locale))
    }
}

/// One labelled example of a training corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledText {
    pub label: String,
    pub text:  String,
}

impl LabeledText {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self { label: label.into(), text: text.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_parsing() {
        assert_eq!(Locale::parse("vi"), Locale::Vietnamese);
        assert_eq!(Locale::parse("VI-vn"), Locale::Vietnamese);
        assert_eq!(Locale::parse(""), Locale::Vietnamese);
        assert_eq!(Locale::parse("en-US"), Locale::Other("en-us".to_string()));
    }

    #[test]
    fn test_from_bytes_rejects_invalid_utf8() {
        let err = Document::from_bytes(&[0x66, 0xff, 0xfe], Locale::Vietnamese).unwrap_err();
        assert!(matches!(err, ClassifierError::InvalidEncoding(_)));
    }

    #[test]
    fn test_from_bytes_accepts_vietnamese() {
        let doc = Document::from_bytes("sức khỏe".as_bytes(), Locale::Vietnamese).unwrap();
        assert_eq!(doc.text, "sức khỏe");
    }

    #[test]
    fn test_documents_get_distinct_ids() {
        let a = Document::new("a", Locale::Vietnamese);
        let b = Document::new("a", Locale::Vietnamese);
        assert_ne!(a.id, b.id);
    }
}
