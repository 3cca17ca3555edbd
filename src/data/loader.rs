// ============================================================
// Layer 4 — Corpus Loader
// ============================================================
// Reads a labelled training corpus from disk. Two line-oriented
// formats are accepted, picked by file extension:
//
//   .jsonl / .ndjson / .json   {"label": "health", "text": "Tôi bị ho"}
//   anything else (TSV)        health<TAB>Tôi bị ho
//
// Blank lines and lines starting with '#' are skipped. A line that
// is malformed or not valid UTF-8 is logged and skipped instead of
// failing the whole corpus; one bad export row should not block a
// retrain.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::document::LabeledText;
use crate::domain::traits::CorpusSource;
use crate::error::{ClassifierError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorpusFormat {
    JsonLines,
    Tsv,
}

impl CorpusFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
            Some("jsonl" | "ndjson" | "json") => CorpusFormat::JsonLines,
            _ => CorpusFormat::Tsv,
        }
    }
}

#[derive(Deserialize)]
struct JsonRow {
    label: String,
    text:  String,
}

/// Loads one corpus file. Implements `CorpusSource`.
pub struct CorpusLoader {
    path:   PathBuf,
    format: CorpusFormat,
}

impl CorpusLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = CorpusFormat::from_path(&path);
        Self { path, format }
    }

    /// Parse corpus bytes already in memory.
    pub fn parse(bytes: &[u8], format: CorpusFormat) -> Vec<LabeledText> {
        let mut rows = Vec::new();

        for (n, raw) in bytes.split(|b| *b == b'\n').enumerate() {
            let line_no = n + 1;
            let line = match std::str::from_utf8(raw) {
                Ok(line) => line.trim(),
                Err(e) => {
                    tracing::warn!("Skipping line {}: not UTF-8 ({})", line_no, e);
                    continue;
                }
            };
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match parse_line(line, format) {
                Ok(row) => rows.push(row),
                Err(reason) => tracing::warn!("Skipping line {}: {}", line_no, reason),
            }
        }

        rows
    }
}

fn parse_line(line: &str, format: CorpusFormat) -> std::result::Result<LabeledText, String> {
    let (label, text) = match format {
        CorpusFormat::JsonLines => {
            let row: JsonRow = serde_json::from_str(line).map_err(|e| e.to_string())?;
            (row.label, row.text)
        }
        CorpusFormat::Tsv => {
            let (label, text) = line.split_once('\t').ok_or("expected label<TAB>text")?;
            (label.to_string(), text.to_string())
        }
    };

    let label = label.trim();
    let text = text.trim();
    if label.is_empty() {
        return Err("empty label".to_string());
    }
    if text.is_empty() {
        return Err("empty text".to_string());
    }
    Ok(LabeledText::new(label, text))
}

impl CorpusSource for CorpusLoader {
    fn load_all(&self) -> Result<Vec<LabeledText>> {
        let bytes = fs::read(&self.path)
            .map_err(|e| ClassifierError::Corpus(format!("cannot read '{}': {}", self.path.display(), e)))?;

        let rows = Self::parse(&bytes, self.format);
        tracing::info!("Loaded {} labelled rows from '{}'", rows.len(), self.path.display());
        Ok(rows)
    }
}

/// A corpus that already lives in memory.
impl CorpusSource for Vec<LabeledText> {
    fn load_all(&self) -> Result<Vec<LabeledText>> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parses_tsv() {
        let rows = CorpusLoader::parse(
            "# comment\nhealth\tTôi bị ho\n\ntraffic\tVượt đèn đỏ bị phạt\n".as_bytes(),
            CorpusFormat::Tsv,
        );
        assert_eq!(
            rows,
            vec![LabeledText::new("health", "Tôi bị ho"), LabeledText::new("traffic", "Vượt đèn đỏ bị phạt")]
        );
    }

    #[test]
    fn test_parses_jsonl() {
        let input = "{\"label\":\"health\",\"text\":\"sốt cao\"}\n{\"label\":\"traffic\",\"text\":\"xe máy\"}";
        let rows = CorpusLoader::parse(input.as_bytes(), CorpusFormat::JsonLines);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].label, "traffic");
    }

    #[test]
    fn test_skips_malformed_and_non_utf8_lines() {
        let mut input = b"health\tho khan\nno tab here\n\tempty label\n".to_vec();
        input.extend_from_slice(&[0xff, b'\t', b'x', b'\n']);
        input.extend_from_slice("traffic\tđèn đỏ".as_bytes());
        let rows = CorpusLoader::parse(&input, CorpusFormat::Tsv);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(CorpusFormat::from_path(Path::new("a.JSONL")), CorpusFormat::JsonLines);
        assert_eq!(CorpusFormat::from_path(Path::new("a.tsv")), CorpusFormat::Tsv);
    }

    #[test]
    fn test_load_all_reads_file() {
        let mut file = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();
        writeln!(file, "{{\"label\":\"health\",\"text\":\"đau đầu\"}}").unwrap();
        let rows = CorpusLoader::new(file.path()).load_all().unwrap();
        assert_eq!(rows, vec![LabeledText::new("health", "đau đầu")]);
    }

    #[test]
    fn test_missing_file_is_corpus_error() {
        let err = CorpusLoader::new("/definitely/not/here.tsv").load_all().unwrap_err();
        assert!(matches!(err, ClassifierError::Corpus(_)));
    }
}
