// ============================================================
// Layer 3 — Vocabulary
// ============================================================
// The frozen term → index mapping that defines one feature space,
// together with the statistics the extractor needs to weight a
// term (inverse document frequency, tf scaling mode, n-gram order).
//
// Invariants enforced on construction and on deserialisation:
//   - indices are dense 0..N-1 and terms are unique
//   - idf has exactly one entry per term
//   - the OOV slot, when present, is index 0 and holds OOV_TERM
//   - the vocabulary id is a hash of all of the above

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Reserved term occupying the out-of-vocabulary slot.
pub const OOV_TERM: &str = "<oov>";

/// Content-derived identifier of one vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VocabularyId(String);

impl fmt::Display for VocabularyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Term-weighting options frozen alongside the vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSettings {
    /// 1 = unigrams only, 2 = unigrams + adjacent bigrams.
    pub ngram_max:          usize,
    /// Use `1 + ln(count)` instead of the raw count.
    pub sublinear_tf:       bool,
    pub oov_bucket_enabled: bool,
}

impl Default for FeatureSettings {
    fn default() -> Self {
        Self { ngram_max: 2, sublinear_tf: true, oov_bucket_enabled: true }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    id:        VocabularyId,
    terms:     Vec<String>,
    idf:       Vec<f32>,
    index:     HashMap<String, u32>,
    settings:  FeatureSettings,
    documents: usize,
}

impl Vocabulary {
    /// Build a vocabulary from terms in index order.
    ///
    /// When the OOV bucket is enabled the caller must put OOV_TERM
    /// first; see `VocabularyBuilder` in the data layer.
    pub fn new(
        terms:     Vec<String>,
        idf:       Vec<f32>,
        settings:  FeatureSettings,
        documents: usize,
    ) -> Result<Self, String> {
        if terms.len() != idf.len() {
            return Err(format!(
                "vocabulary has {} terms but {} idf weights",
                terms.len(),
                idf.len()
            ));
        }
        if settings.ngram_max == 0 || settings.ngram_max > 2 {
            return Err(format!("unsupported n-gram order {}", settings.ngram_max));
        }
        if settings.oov_bucket_enabled && terms.first().map(String::as_str) != Some(OOV_TERM) {
            return Err("OOV bucket enabled but index 0 is not the OOV slot".to_string());
        }
        if let Some(bad) = idf.iter().find(|w| !w.is_finite() || **w <= 0.0) {
            return Err(format!("non-positive idf weight {bad}"));
        }

        let mut index = HashMap::with_capacity(terms.len());
        for (i, term) in terms.iter().enumerate() {
            if term.is_empty() {
                return Err(format!("empty term at index {i}"));
            }
            if term == OOV_TERM && !(settings.oov_bucket_enabled && i == 0) {
                return Err(format!("reserved term {OOV_TERM} at index {i}"));
            }
            if index.insert(term.clone(), i as u32).is_some() {
                return Err(format!("duplicate term '{term}'"));
            }
        }

        let id = Self::compute_id(&terms, &idf, &settings, documents);
        Ok(Self { id, terms, idf, index, settings, documents })
    }

    fn compute_id(
        terms:     &[String],
        idf:       &[f32],
        settings:  &FeatureSettings,
        documents: usize,
    ) -> VocabularyId {
        let mut hasher = Sha256::new();
        hasher.update([settings.ngram_max as u8, settings.sublinear_tf as u8, settings.oov_bucket_enabled as u8]);
        hasher.update((documents as u64).to_le_bytes());
        for (term, weight) in terms.iter().zip(idf) {
            hasher.update(term.as_bytes());
            hasher.update([0u8]);
            hasher.update(weight.to_bits().to_le_bytes());
        }
        let digest = hasher.finalize();
        VocabularyId(format!("vocab-{}", hex::encode(&digest[..12])))
    }

    pub fn id(&self) -> &VocabularyId {
        &self.id
    }

    /// Number of feature slots, including the OOV slot.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Number of real terms, excluding the OOV slot.
    pub fn term_count(&self) -> usize {
        self.terms.len() - usize::from(self.settings.oov_bucket_enabled)
    }

    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.index.get(term).map(|&i| i as usize)
    }

    pub fn term(&self, index: usize) -> Option<&str> {
        self.terms.get(index).map(String::as_str)
    }

    pub fn idf(&self, index: usize) -> f32 {
        self.idf[index]
    }

    pub fn oov_index(&self) -> Option<usize> {
        self.settings.oov_bucket_enabled.then_some(0)
    }

    pub fn settings(&self) -> &FeatureSettings {
        &self.settings
    }

    /// Number of training documents the idf weights were computed from.
    pub fn documents(&self) -> usize {
        self.documents
    }
}

// ─── Serialisation ────────────────────────────────────────────────────────────
// The lookup index is rebuilt on load and every invariant is re-checked,
// including that the stored id still matches the content.

#[derive(Serialize, Deserialize)]
struct VocabularyRecord {
    id:        VocabularyId,
    terms:     Vec<String>,
    idf:       Vec<f32>,
    settings:  FeatureSettings,
    documents: usize,
}

impl Serialize for Vocabulary {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        VocabularyRecord {
            id:        self.id.clone(),
            terms:     self.terms.clone(),
            idf:       self.idf.clone(),
            settings:  self.settings,
            documents: self.documents,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Vocabulary {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = VocabularyRecord::deserialize(deserializer)?;
        let vocab = Vocabulary::new(record.terms, record.idf, record.settings, record.documents)
            .map_err(serde::de::Error::custom)?;
        if vocab.id != record.id {
            return Err(serde::de::Error::custom(format!(
                "vocabulary id {} does not match its content ({})",
                record.id, vocab.id
            )));
        }
        Ok(vocab)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vocabulary {
        Vocabulary::new(
            vec![OOV_TERM.to_string(), "ho".to_string(), "sức_khỏe".to_string()],
            vec![1.5, 1.2, 2.0],
            FeatureSettings::default(),
            10,
        )
        .unwrap()
    }

    #[test]
    fn test_indices_are_dense() {
        let v = sample();
        assert_eq!(v.len(), 3);
        assert_eq!(v.term_count(), 2);
        assert_eq!(v.oov_index(), Some(0));
        assert_eq!(v.index_of("ho"), Some(1));
        assert_eq!(v.index_of("sức_khỏe"), Some(2));
        assert_eq!(v.index_of("xe"), None);
    }

    #[test]
    fn test_rejects_duplicates() {
        let err = Vocabulary::new(
            vec![OOV_TERM.into(), "ho".into(), "ho".into()],
            vec![1.0, 1.0, 1.0],
            FeatureSettings::default(),
            1,
        )
        .unwrap_err();
        assert!(err.contains("duplicate"));
    }

    #[test]
    fn test_requires_oov_slot_first() {
        let err = Vocabulary::new(vec!["ho".into()], vec![1.0], FeatureSettings::default(), 1).unwrap_err();
        assert!(err.contains("OOV"));
    }

    #[test]
    fn test_id_depends_on_content() {
        let a = sample();
        let b = Vocabulary::new(
            vec![OOV_TERM.to_string(), "ho".to_string(), "sức_khỏe".to_string()],
            vec![1.5, 1.2, 2.5],
            FeatureSettings::default(),
            10,
        )
        .unwrap();
        assert_eq!(a.id(), sample().id());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_json_round_trip_preserves_lookup() {
        let v = sample();
        let json = serde_json::to_string(&v).unwrap();
        let back: Vocabulary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
        assert_eq!(back.index_of("sức_khỏe"), Some(2));
    }

    #[test]
    fn test_tampered_id_is_rejected() {
        let json = serde_json::to_string(&sample()).unwrap();
        let tampered = json.replace("\"ho\"", "\"xe\"");
        assert!(serde_json::from_str::<Vocabulary>(&tampered).is_err());
    }
}
