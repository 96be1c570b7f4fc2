/// This crate re-ranks search results per user, using TF-IDF profiles built from
/// what each user has written.
pub mod config;
pub mod error;
pub mod personalize;
pub mod profile;
pub mod utils;
pub mod vectorizer;

/// Personalization Engine
/// The top-level entry point of this crate.
/// Given a batch of search results and a set of users, it returns for each user
/// the batch re-scored against that user's profile and cut to the top K.
///
/// The blended score of a result is
/// `raw * normalized_raw_score + text * text_similarity + mention * mention_similarity`
/// with the weights of `BlendWeights` (0.2 / 0.5 / 0.3 by default), rounded to
/// 6 decimals.
///
/// Each component lies in [0, 1]:
/// - `normalized_raw_score`: backend score, min-max scaled over the batch
/// - `text_similarity`: cosine against the user's text profile, min-max scaled
/// - `mention_similarity`: cosine against the user's mention profile, min-max scaled
pub use personalize::{Personalizer, PersonalizedResult, SearchResult};

/// Search Backend Interface
/// `SearchBackend` returns `Hit`s for a query tree it never inspects.
/// `ResponseFileBackend` replays a saved Elasticsearch-style response.
pub use personalize::backend::{Hit, ResponseFileBackend, SearchBackend};

/// User Profile Store
/// Builds and caches the parse aggregate of the source collections, and per user
/// the fitted text and mention models.
///
/// # Cache
/// Entries are CBOR in a versioned envelope, written atomically.
/// A stale, corrupt or foreign entry is discarded and rebuilt.
/// Nothing expires; delete an entry to force a rebuild.
pub use profile::store::{ProfileStore, UserProfile};

/// Parsed documents and the per-author aggregate
pub use profile::document::{Document, ParsedCorpus, RawTweet};

/// TF-IDF Model
/// Fitted weighting space: a sorted vocabulary and an IDF vector.
/// `transform` turns raw text into L2-normalized sparse vectors over that vocabulary.
///
/// `TfIdfModel<A, E>` has the following generic parameters:
/// - `A`: analyzer (e.g., TweetAnalyzer)
/// - `E`: TF-IDF calculation engine (e.g., DefaultTfIdfEngine)
///
/// # Serialization
/// Supported. The analyzer is not serialized.
/// `TfIdfData` is the stored form; turn it back into a model with `into_model`
/// by handing it an analyzer.
pub use vectorizer::TfIdfModel;

/// TF-IDF Model Data Structure for Serialization
pub use vectorizer::serde::TfIdfData;

/// Corpus for TF-IDF Model
/// Document count and per-term document frequency, the base data for IDF.
pub use vectorizer::corpus::Corpus;

/// Term Frequency structure
/// Occurrence count of each term within a document, the base data for TF.
pub use vectorizer::term::TermFrequency;

/// TF IDF Calculation Engine Trait
/// Plug a different weighting into `TfIdfModel<A, E>` by implementing it.
/// `DefaultTfIdfEngine` uses raw counts and smoothed IDF `ln((1 + n) / (1 + df)) + 1`.
pub use vectorizer::tfidf::{DefaultTfIdfEngine, TfIdfEngine};

/// Analyzers
/// `Analyzer` turns raw text into terms, and is injected into `TfIdfModel`.
/// - `TweetAnalyzer`: tweet cleanup, stop words, Snowball English stemming
/// - `WhitespaceAnalyzer`: lowercase whitespace split
/// - `FnAnalyzer`: wraps a closure
pub use vectorizer::analyzer::{Analyzer, FnAnalyzer, TweetAnalyzer, WhitespaceAnalyzer};

/// Similarity
pub use vectorizer::compare::{cosine_similarity, similarity_matrix, similarity_scores};

/// Sparse Vector
pub use utils::math::vector::SpVec;

pub use config::{BlendWeights, PersonalizeConfig};
pub use error::{Error, Result};
