use core::str;
use std::fmt::Debug;

use ahash::RandomState;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// TermFrequency struct
/// Manages the frequency of term occurrences.
/// Counts the number of times each term appears.
///
/// Iteration order is first-seen order, so two counters built from the
/// same term stream iterate identically.
///
/// # Examples
/// ```
/// use tf_idf_personalizer::TermFrequency;
/// let mut term_freq = TermFrequency::new();
/// term_freq.add_term("term1");
/// term_freq.add_term("term2");
/// term_freq.add_term("term1");
///
/// assert_eq!(term_freq.term_count("term1"), 2);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct TermFrequency {
    term_count: IndexMap<String, u64, RandomState>,
    total_term_count: u64,
}

impl PartialEq for TermFrequency {
    fn eq(&self, other: &Self) -> bool {
        self.total_term_count == other.total_term_count
            && self.term_count.len() == other.term_count.len()
            && self.term_count.iter().all(|(t, c)| other.term_count.get(t) == Some(c))
    }
}

/// Implementation for adding and removing terms
impl TermFrequency {
    /// Create a new TermFrequency
    pub fn new() -> Self {
        TermFrequency {
            term_count: IndexMap::with_hasher(RandomState::new()),
            total_term_count: 0,
        }
    }

    /// Add a term
    ///
    /// # Arguments
    /// * `term` - term to add
    #[inline]
    pub fn add_term(&mut self, term: &str) -> &mut Self {
        let count = self.term_count.entry(term.to_string()).or_insert(0);
        *count += 1;
        self.total_term_count += 1;
        self
    }

    /// Add multiple terms
    ///
    /// # Arguments
    /// * `terms` - Slice of terms to add
    #[inline]
    pub fn add_terms<T>(&mut self, terms: &[T]) -> &mut Self
    where T: AsRef<str>
    {
        for term in terms {
            self.add_term(term.as_ref());
        }
        self
    }
}

impl<T> From<&[T]> for TermFrequency
where
    T: AsRef<str>,
{
    fn from(terms: &[T]) -> Self {
        let mut tf = TermFrequency::new();
        tf.add_terms(terms);
        tf
    }
}

/// Implementation for retrieving information from TermFrequency
impl TermFrequency {
    /// Get iterator over all terms and their counts
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.term_count.iter().map(|(term, &count)| (term.as_str(), count))
    }

    /// Get the occurrence count of a term, 0 if unseen
    #[inline]
    pub fn term_count(&self, term: &str) -> u64 {
        self.term_count.get(term).copied().unwrap_or(0)
    }

    /// Total number of terms added (with multiplicity)
    #[inline]
    pub fn term_sum(&self) -> u64 {
        self.total_term_count
    }

    /// Number of distinct terms
    #[inline]
    pub fn term_num(&self) -> usize {
        self.term_count.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.term_count.is_empty()
    }

    /// Distinct terms, first-seen order
    #[inline]
    pub fn term_set(&self) -> Vec<&str> {
        self.term_count.keys().map(|s| s.as_str()).collect()
    }

    #[inline]
    pub fn contains_term(&self, term: &str) -> bool {
        self.term_count.contains_key(term)
    }

    /// Top `n` terms by count
    /// Ties keep first-seen order.
    ///
    /// # Returns
    /// * `Vec<(&str, u64)>` - terms and counts, most frequent first
    pub fn most_frequent(&self, n: usize) -> Vec<(&str, u64)> {
        let mut v: Vec<(&str, u64)> = self.iter().collect();
        // stable sort
        v.sort_by(|a, b| b.1.cmp(&a.1));
        v.truncate(n);
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_sum() {
        let mut tf = TermFrequency::new();
        tf.add_terms(&["rust", "fast", "rust"]).add_term("safe");
        assert_eq!(tf.term_count("rust"), 2);
        assert_eq!(tf.term_count("missing"), 0);
        assert_eq!(tf.term_sum(), 4);
        assert_eq!(tf.term_num(), 3);
        assert_eq!(tf.term_set(), vec!["rust", "fast", "safe"]);
    }

    #[test]
    fn most_frequent_is_stable_on_ties() {
        let tf = TermFrequency::from(&["b", "a", "c", "a", "b", "d"][..]);
        assert_eq!(tf.most_frequent(3), vec![("b", 2), ("a", 2), ("c", 1)]);
    }

    #[test]
    fn serde_roundtrip_cbor() {
        let tf = TermFrequency::from(&["one", "two", "two"][..]);
        let bytes = serde_cbor::to_vec(&tf).unwrap();
        let de: TermFrequency = serde_cbor::from_slice(&bytes).unwrap();
        assert_eq!(de, tf);
        assert_eq!(de.term_set(), tf.term_set());
    }
}
