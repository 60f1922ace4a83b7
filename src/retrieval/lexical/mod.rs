//! BM25 keyword scoring.
//!
//! Text is lower-cased and split on every character that is not alphanumeric, so
//! `"France?"` and `"france"` produce the same term. Term statistics are computed once
//! per corpus when the [`ChunkStore`](super::chunk_store::ChunkStore) is built.


use std::collections::{HashMap, HashSet};

use crate::retrieval::semantic::top_k;

/// Term-frequency saturation
pub const BM25_K1: f32 = 1.2;
/// Document-length normalization
pub const BM25_B: f32 = 0.75;

/// Split text into lower-cased alphanumeric terms
#[inline]
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|term| !term.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Per-corpus term statistics
#[derive(Debug, Clone, Default)]
pub struct LexicalIndex {
    term_frequencies: Vec<HashMap<String, u32>>,
    document_lengths: Vec<usize>,
    document_frequencies: HashMap<String, usize>,
    average_length: f32,
}

impl LexicalIndex {
    #[inline]
    pub fn build<'a, I>(documents: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut term_frequencies = Vec::new();
        let mut document_lengths = Vec::new();
        let mut document_frequencies: HashMap<String, usize> = HashMap::new();

        for document in documents {
            let terms = tokenize(document);
            document_lengths.push(terms.len());

            let mut frequencies: HashMap<String, u32> = HashMap::new();
            for term in terms {
                *frequencies.entry(term).or_insert(0) += 1;
            }
            for term in frequencies.keys() {
                *document_frequencies.entry(term.clone()).or_insert(0) += 1;
            }
            term_frequencies.push(frequencies);
        }

        let total_length: usize = document_lengths.iter().sum();
        let average_length = if document_lengths.is_empty() {
            0.0
        } else {
            total_length as f32 / document_lengths.len() as f32
        };

        Self {
            term_frequencies,
            document_lengths,
            document_frequencies,
            average_length,
        }
    }

    #[inline]
    pub fn document_count(&self) -> usize {
        self.document_lengths.len()
    }

    /// Inverse document frequency, always positive
    #[inline]
    pub fn idf(&self, term: &str) -> f32 {
        let n = self.document_count() as f32;
        let df = self.document_frequencies.get(term).copied().unwrap_or(0) as f32;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    /// BM25 score of one document against a set of distinct query terms
    #[inline]
    pub fn score(&self, document: usize, query_terms: &[String]) -> f32 {
        let Some(frequencies) = self.term_frequencies.get(document) else {
            return 0.0;
        };
        let length = self.document_lengths[document] as f32;
        let length_ratio = if self.average_length > 0.0 {
            length / self.average_length
        } else {
            0.0
        };

        query_terms
            .iter()
            .filter_map(|term| {
                let tf = *frequencies.get(term)? as f32;
                let numerator = tf * (BM25_K1 + 1.0);
                let denominator = tf + BM25_K1 * (1.0 - BM25_B + BM25_B * length_ratio);
                Some(self.idf(term) * numerator / denominator)
            })
            .sum()
    }
}

/// Rank documents in `index` against `query` and return the top `k` as
/// `(chunk index, score)` pairs.
///
/// Documents sharing no term with the query are omitted. Repeated query terms count once.
#[inline]
pub fn rank(index: &LexicalIndex, query: &str, k: usize) -> Vec<(usize, f32)> {
    let mut seen = HashSet::new();
    let query_terms: Vec<String> = tokenize(query)
        .into_iter()
        .filter(|term| seen.insert(term.clone()))
        .collect();

    if query_terms.is_empty() || index.document_count() == 0 {
        return Vec::new();
    }

    let scored = (0..index.document_count())
        .map(|document| (document, index.score(document, &query_terms)))
        .filter(|(_, score)| *score > 0.0)
        .collect();

    top_k(scored, k)
}
