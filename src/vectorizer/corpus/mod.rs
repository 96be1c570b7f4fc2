use ahash::RandomState;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::TermFrequency;

/// keep document count and per-term document frequency
///
/// Unlike `TermFrequency`, a term is counted at most once per document.
/// Iteration order is first-seen order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Corpus {
    /// number of documents added
    doc_num: u64,
    /// term -> number of documents containing it
    term_counts: IndexMap<Box<str>, u64, RandomState>,
}

impl Corpus {
    /// Create a new instance
    pub fn new() -> Self {
        Self {
            doc_num: 0,
            term_counts: IndexMap::with_hasher(RandomState::new()),
        }
    }

    /// Add a document's distinct terms to the corpus
    pub fn add_set<T>(&mut self, terms: &[T])
    where
        T: AsRef<str>,
    {
        self.doc_num += 1;
        for term in terms {
            *self.term_counts.entry(term.as_ref().into()).or_insert(0) += 1;
        }
    }

    /// Add a document by its term frequency
    pub fn add_doc(&mut self, freq: &TermFrequency) {
        self.add_set(&freq.term_set());
    }

    /// Get the number of documents in the corpus
    #[inline]
    pub fn get_doc_num(&self) -> u64 {
        self.doc_num
    }

    /// Get the document frequency of a term
    #[inline]
    pub fn get_term_count(&self, term: &str) -> u64 {
        self.term_counts.get(term).copied().unwrap_or(0)
    }

    /// Get the current vocabulary size (number of unique terms)
    #[inline]
    pub fn vocab_size(&self) -> usize {
        self.term_counts.len()
    }

    /// Iterate over (term, document frequency)
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.term_counts.iter().map(|(t, c)| (t.as_ref(), *c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_documents_not_occurrences() {
        let mut corpus = Corpus::new();
        corpus.add_doc(&TermFrequency::from(&["a", "a", "b"][..]));
        corpus.add_doc(&TermFrequency::from(&["a", "c"][..]));
        assert_eq!(corpus.get_doc_num(), 2);
        assert_eq!(corpus.get_term_count("a"), 2);
        assert_eq!(corpus.get_term_count("b"), 1);
        assert_eq!(corpus.get_term_count("zzz"), 0);
        assert_eq!(corpus.vocab_size(), 3);
    }
}
