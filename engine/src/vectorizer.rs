//! TF-IDF encoding of item text.
//!
//! `Vectorizer::fit` builds an immutable [`Vocabulary`] over the whole corpus;
//! [`Vocabulary::transform`] turns one text into an L2-normalized sparse vector.
//! Term ids are assigned in lexical order, so equal input always yields equal
//! ids and weights.

use crate::error::{EngineError, Result};
use crate::tokenizer::tokenize;
use crate::TermId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

pub const DEFAULT_MAX_FEATURES: usize = 20_000;

/// Sparse term vector, entries sorted by term id with no duplicates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    pub entries: Vec<(TermId, f32)>,
}

impl SparseVector {
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn norm(&self) -> f32 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt()
    }

    /// Dot product by merging the two sorted entry lists.
    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j) = (0, 0);
        let mut acc = 0.0f32;
        while i < self.entries.len() && j < other.entries.len() {
            let (ta, wa) = self.entries[i];
            let (tb, wb) = other.entries[j];
            if ta == tb {
                acc += wa * wb;
                i += 1;
                j += 1;
            } else if ta < tb {
                i += 1;
            } else {
                j += 1;
            }
        }
        acc
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    terms: BTreeMap<String, TermId>,
    idf: Vec<f32>,
    num_docs: usize,
}

impl Vocabulary {
    pub fn len(&self) -> usize { self.idf.len() }
    pub fn is_empty(&self) -> bool { self.idf.is_empty() }
    pub fn num_docs(&self) -> usize { self.num_docs }
    pub fn term_id(&self, term: &str) -> Option<TermId> { self.terms.get(term).copied() }
    pub fn idf(&self, term: &str) -> Option<f32> {
        self.term_id(term).map(|id| self.idf[id as usize])
    }

    /// Encode `text` as raw term frequency times idf, scaled to unit length.
    /// Text with no in-vocabulary terms yields an empty vector.
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut tf: BTreeMap<TermId, u32> = BTreeMap::new();
        for term in tokenize(text) {
            if let Some(&tid) = self.terms.get(&term) {
                *tf.entry(tid).or_insert(0) += 1;
            }
        }
        let mut entries: Vec<(TermId, f32)> = tf
            .into_iter()
            .map(|(tid, count)| (tid, count as f32 * self.idf[tid as usize]))
            .collect();
        let norm = entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm == 0.0 {
            return SparseVector::default();
        }
        for (_, w) in entries.iter_mut() { *w /= norm; }
        SparseVector { entries }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Vectorizer {
    pub max_features: usize,
}

impl Default for Vectorizer {
    fn default() -> Self { Self { max_features: DEFAULT_MAX_FEATURES } }
}

impl Vectorizer {
    pub fn new(max_features: usize) -> Self { Self { max_features } }

    /// Fit a vocabulary with smoothed idf `ln((1+N)/(1+df)) + 1`.
    ///
    /// When more than `max_features` distinct terms occur, the ones with the
    /// highest document frequency are kept, ties going to the lexically smaller term.
    pub fn fit<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vocabulary> {
        if texts.is_empty() {
            return Err(EngineError::EmptyCorpus);
        }
        let mut df: HashMap<String, u32> = HashMap::new();
        for text in texts {
            let unique: HashSet<String> = tokenize(text.as_ref()).into_iter().collect();
            for term in unique {
                *df.entry(term).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(String, u32)> = df.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(self.max_features);
        if ranked.is_empty() {
            return Err(EngineError::EmptyVocabulary);
        }
        ranked.sort_by(|a, b| a.0.cmp(&b.0));

        let n = texts.len() as f32;
        let mut terms = BTreeMap::new();
        let mut idf = Vec::with_capacity(ranked.len());
        for (tid, (term, df_t)) in ranked.into_iter().enumerate() {
            idf.push(((1.0 + n) / (1.0 + df_t as f32)).ln() + 1.0);
            terms.insert(term, tid as TermId);
        }
        tracing::debug!(num_docs = texts.len(), num_terms = idf.len(), "fitted vocabulary");
        Ok(Vocabulary { terms, idf, num_docs: texts.len() })
    }

    pub fn fit_transform<S: AsRef<str>>(&self, texts: &[S]) -> Result<(Vocabulary, Vec<SparseVector>)> {
        let vocab = self.fit(texts)?;
        let vectors = texts.iter().map(|t| vocab.transform(t.as_ref())).collect();
        Ok((vocab, vectors))
    }
}
