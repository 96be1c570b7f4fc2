use indexmap::IndexSet;

use crate::{utils::math::vector::SpVec, vectorizer::{corpus::Corpus, term::TermFrequency}};

/// TF-IDF calculation strategy plugged into `TfIdfModel<A, E>`.
pub trait TfIdfEngine {
    /// Generate the IDF vector
    /// # Arguments
    /// * `corpus` - fit corpus
    /// * `vocab` - term dimensions, position = dimension index
    /// # Returns
    /// * `Vec<f64>` - IDF per dimension
    fn idf_vec(corpus: &Corpus, vocab: &IndexSet<String>) -> Vec<f64>;
    /// Generate the TF vector of one document over `vocab`
    /// Terms outside `vocab` are dropped.
    fn tf_vec(freq: &TermFrequency, vocab: &IndexSet<String>) -> SpVec<f64>;
    /// Combine TF and IDF into the final document vector
    fn tfidf_vec(tf: SpVec<f64>, idf: &[f64]) -> SpVec<f64>;
}

/// Default TF-IDF engine
/// - TF: raw count
/// - IDF: smoothed `ln((1 + n) / (1 + df)) + 1`
/// - result is L2 normalized
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTfIdfEngine;

impl DefaultTfIdfEngine {
    /// smoothed idf, strictly decreasing in `doc_freq` and always > 0
    #[inline]
    pub fn idf_calc(doc_num: u64, doc_freq: u64) -> f64 {
        ((1.0 + doc_num as f64) / (1.0 + doc_freq as f64)).ln() + 1.0
    }
}

impl TfIdfEngine for DefaultTfIdfEngine {
    fn idf_vec(corpus: &Corpus, vocab: &IndexSet<String>) -> Vec<f64> {
        let doc_num = corpus.get_doc_num();
        vocab
            .iter()
            .map(|term| Self::idf_calc(doc_num, corpus.get_term_count(term)))
            .collect()
    }

    fn tf_vec(freq: &TermFrequency, vocab: &IndexSet<String>) -> SpVec<f64> {
        let pairs: Vec<(u32, f64)> = freq
            .iter()
            .filter_map(|(term, count)| {
                vocab.get_index_of(term).map(|idx| (idx as u32, count as f64))
            })
            .collect();
        SpVec::from_pairs(vocab.len() as u32, pairs)
    }

    fn tfidf_vec(tf: SpVec<f64>, idf: &[f64]) -> SpVec<f64> {
        let pairs: Vec<(u32, f64)> = tf
            .raw_iter()
            .map(|(idx, v)| (idx, v * idf.get(idx as usize).copied().unwrap_or(0.0)))
            .collect();
        let mut out = SpVec::from_pairs(tf.len(), pairs);
        out.normalize();
        out
    }
}
