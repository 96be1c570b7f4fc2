pub mod analyzer;
pub mod compare;
pub mod corpus;
pub mod serde;
pub mod term;
pub mod tfidf;

use std::fmt::Debug;
use std::marker::PhantomData;

use indexmap::IndexSet;
use rayon::prelude::*;

use crate::{utils::math::vector::SpVec, vectorizer::{analyzer::Analyzer, corpus::Corpus, serde::TfIdfData, term::TermFrequency, tfidf::{DefaultTfIdfEngine, TfIdfEngine}}};

/// Fitted TF-IDF weighting space.
///
/// The vocabulary and IDF vector are fixed by `fit`; `transform` only reads them,
/// so repeated transforms of the same text are bit-identical.
///
/// `TfIdfModel<A, E>` has the following generic parameters:
/// - `A`: analyzer turning raw text into terms (used by both fit and transform)
/// - `E`: TF-IDF calculation engine (e.g., DefaultTfIdfEngine)
pub struct TfIdfModel<A, E = DefaultTfIdfEngine>
where
    A: Analyzer,
    E: TfIdfEngine + Send + Sync,
{
    analyzer: A,
    /// term dimensions, sorted; position = dimension index
    vocab: IndexSet<String>,
    /// IDF per dimension
    idf: Vec<f64>,
    /// vocabulary cutoff used at fit time
    min_df: f64,
    /// number of documents seen at fit time
    doc_num: u64,
    _marker: PhantomData<E>,
}

impl<A, E> TfIdfModel<A, E>
where
    A: Analyzer,
    E: TfIdfEngine + Send + Sync,
{
    /// Fit on a corpus of raw documents
    ///
    /// A term enters the vocabulary when it appears in at least
    /// `min_df * corpus.len()` documents. An empty corpus, or a cutoff that
    /// removes every term, gives an empty vocabulary (transform then yields
    /// zero vectors).
    ///
    /// # Arguments
    /// * `analyzer` - term extraction, kept for transform
    /// * `corpus` - raw documents
    /// * `min_df` - minimum document frequency as a fraction in [0, 1]
    pub fn fit<T>(analyzer: A, corpus: &[T], min_df: f64) -> Self
    where
        T: AsRef<str> + Sync,
    {
        let freqs: Vec<TermFrequency> = corpus
            .par_iter()
            .map(|doc| TermFrequency::from(analyzer.analyze(doc.as_ref()).as_slice()))
            .collect();

        let mut df = Corpus::new();
        for freq in &freqs {
            df.add_doc(freq);
        }

        let threshold = min_df * df.get_doc_num() as f64;
        let mut terms: Vec<&str> = df
            .iter()
            .filter(|(_, count)| *count as f64 >= threshold)
            .map(|(term, _)| term)
            .collect();
        terms.sort_unstable();
        let vocab: IndexSet<String> = terms.into_iter().map(str::to_string).collect();
        let idf = E::idf_vec(&df, &vocab);

        Self {
            analyzer,
            vocab,
            idf,
            min_df,
            doc_num: df.get_doc_num(),
            _marker: PhantomData,
        }
    }

    /// Transform raw documents into L2-normalized TF-IDF vectors over the fitted vocabulary
    /// Out-of-vocabulary terms are dropped silently.
    pub fn transform<T>(&self, docs: &[T]) -> Vec<SpVec<f64>>
    where
        T: AsRef<str> + Sync,
    {
        docs.par_iter()
            .map(|doc| self.transform_one(doc.as_ref()))
            .collect()
    }

    pub fn transform_one(&self, doc: &str) -> SpVec<f64> {
        if self.vocab.is_empty() {
            return SpVec::zeros(0);
        }
        let freq = TermFrequency::from(self.analyzer.analyze(doc).as_slice());
        let tf = E::tf_vec(&freq, &self.vocab);
        E::tfidf_vec(tf, &self.idf)
    }

    /// Terms in dimension order
    pub fn vocabulary(&self) -> impl Iterator<Item = &str> {
        self.vocab.iter().map(|s| s.as_str())
    }

    pub fn contains_term(&self, term: &str) -> bool {
        self.vocab.contains(term)
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    /// Vector dimension
    pub fn dim(&self) -> usize {
        self.vocab.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vocab.is_empty()
    }

    pub fn min_df(&self) -> f64 {
        self.min_df
    }

    pub fn doc_num(&self) -> u64 {
        self.doc_num
    }

    pub fn analyzer(&self) -> &A {
        &self.analyzer
    }

    /// Detach the serializable part
    pub fn to_data(&self) -> TfIdfData {
        TfIdfData {
            vocabulary: self.vocab.iter().cloned().collect(),
            idf: self.idf.clone(),
            min_df: self.min_df,
            doc_num: self.doc_num,
        }
    }

    /// Rebuild from persisted data, attaching an analyzer
    pub(crate) fn from_parts(analyzer: A, data: TfIdfData) -> Self {
        Self {
            analyzer,
            vocab: data.vocabulary.into_iter().collect(),
            idf: data.idf,
            min_df: data.min_df,
            doc_num: data.doc_num,
            _marker: PhantomData,
        }
    }
}

impl<A, E> Debug for TfIdfModel<A, E>
where
    A: Analyzer,
    E: TfIdfEngine + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TfIdfModel")
            .field("dim", &self.vocab.len())
            .field("doc_num", &self.doc_num)
            .field("min_df", &self.min_df)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectorizer::{analyzer::WhitespaceAnalyzer, compare::cosine_similarity};

    type Model = TfIdfModel<WhitespaceAnalyzer>;

    #[test]
    fn vocabulary_sorted_and_cut_by_min_df() {
        let corpus = ["b a", "a c", "a d", "a b"];
        let m = Model::fit(WhitespaceAnalyzer, &corpus, 0.5);
        // a: 4/4, b: 2/4, c,d: 1/4
        assert_eq!(m.vocabulary().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(m.dim(), 2);
        assert_eq!(m.doc_num(), 4);
        assert!(m.idf()[1] > m.idf()[0], "rarer term gets larger idf");
    }

    #[test]
    fn transform_drops_unknown_terms() {
        let m = Model::fit(WhitespaceAnalyzer, &["apple banana"], 0.01);
        let v = m.transform(&["apple cherry cherry"]);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].nnz(), 1);
        assert!((v[0].norm() - 1.0).abs() < 1e-12);
        let unknown = m.transform_one("durian");
        assert!(unknown.is_zero());
        assert_eq!(unknown.len(), 2);
    }

    #[test]
    fn empty_corpus_gives_zero_vectors() {
        let empty: [&str; 0] = [];
        let m = Model::fit(WhitespaceAnalyzer, &empty, 0.01);
        assert!(m.is_empty());
        let out = m.transform(&["anything at all", ""]);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|v| v.is_zero()));
    }

    #[test]
    fn cutoff_collapsing_vocab_gives_zero_vectors() {
        let m = Model::fit(WhitespaceAnalyzer, &["x", "y", "z"], 0.9);
        assert!(m.is_empty());
        assert!(m.transform(&["x y z"]).iter().all(|v| v.is_zero()));
    }

    #[test]
    fn fit_transform_is_deterministic() {
        let corpus = ["mars rover lands", "rover finds water on mars", "new telescope images"];
        let a = Model::fit(WhitespaceAnalyzer, &corpus, 0.01);
        let b = Model::fit(WhitespaceAnalyzer, &corpus, 0.01);
        assert_eq!(a.vocabulary().collect::<Vec<_>>(), b.vocabulary().collect::<Vec<_>>());
        assert_eq!(a.idf(), b.idf());
        let docs = ["mars water", "telescope rover rover"];
        assert_eq!(a.transform(&docs), b.transform(&docs));
        assert_eq!(a.transform(&docs), a.transform(&docs));
    }

    #[test]
    fn similar_text_scores_higher() {
        let profile = "mars rover nasa launch mars";
        let m = Model::fit(WhitespaceAnalyzer, &[profile], 0.01);
        let p = m.transform_one(profile);
        let v = m.transform(&["nasa mars mission", "election results tonight"]);
        assert!(cosine_similarity(&p, &v[0]) > cosine_similarity(&p, &v[1]));
    }
}
