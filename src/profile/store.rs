use std::{path::{Path, PathBuf}, sync::{atomic::{AtomicBool, Ordering}, Arc}};

use indexmap::IndexMap;
use parking_lot::RwLock;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::{
    config::PersonalizeConfig,
    error::{Error, Result},
    profile::{cache::{self, KeyedLocks, KIND_AGGREGATE, KIND_MODEL}, document::ParsedCorpus},
    vectorizer::{analyzer::Analyzer, serde::TfIdfData, TfIdfModel},
};

const TEXT_MODEL_FILE: &str = "vect_text.cbor";
const MENTION_MODEL_FILE: &str = "vect_mentions.cbor";

/// A user's interest profile: their corpora and the two models fitted on them
pub struct UserProfile<A>
where
    A: Analyzer + ?Sized,
{
    pub author: String,
    /// space-joined raw texts of the author's tweets
    pub text_corpus: String,
    /// space-prefixed handles the author mentioned, `" "` if none
    pub mention_corpus: String,
    pub text_model: TfIdfModel<Arc<A>>,
    pub mention_model: TfIdfModel<Arc<A>>,
}

impl<A> std::fmt::Debug for UserProfile<A>
where
    A: Analyzer + ?Sized,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserProfile")
            .field("author", &self.author)
            .field("text_model", &self.text_model)
            .field("mention_model", &self.mention_model)
            .finish()
    }
}

/// Builds, caches and serves user profiles
///
/// Two cache levels, both under `config.cache_dir`:
/// - the parse aggregate, keyed by the ordered source file stems (`a&b.cbor`)
/// - per author, the fitted text and mention models (`<author>/vect_*.cbor`)
///
/// Entries never expire; delete them (or call `invalidate_*`) to force a rebuild.
///
/// Misses are serialized per cache file through `KeyedLocks::shared`, so any number
/// of stores over the same `cache_dir` in one process build each entry once.
pub struct ProfileStore<A>
where
    A: Analyzer + ?Sized,
{
    config: PersonalizeConfig,
    sources: Vec<PathBuf>,
    analyzer: Arc<A>,
    /// aggregate loaded by this instance
    corpus: RwLock<Option<Arc<ParsedCorpus>>>,
}

impl<A> ProfileStore<A>
where
    A: Analyzer + ?Sized,
{
    pub fn new<P: Into<PathBuf>>(config: PersonalizeConfig, sources: impl IntoIterator<Item = P>, analyzer: Arc<A>) -> Self {
        Self {
            config,
            sources: sources.into_iter().map(Into::into).collect(),
            analyzer,
            corpus: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &PersonalizeConfig {
        &self.config
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn analyzer(&self) -> &Arc<A> {
        &self.analyzer
    }

    /// Cache path of the parse aggregate
    /// Derived from the ordered source file stems only, not from any author set.
    pub fn aggregate_path(&self) -> PathBuf {
        let stems: Vec<String> = self
            .sources
            .iter()
            .map(|p| {
                p.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default()
            })
            .collect();
        self.config.cache_dir.join(format!("{}.cbor", stems.join("&")))
    }

    /// Cache directory of an author's models, see `author_key`
    pub fn author_dir(&self, author: &str) -> PathBuf {
        self.config.cache_dir.join(author_key(author))
    }

    /// The parse aggregate, from memory, disk cache, or a fresh parse (in that order)
    ///
    /// # Errors
    /// * `NoSourceCollections` - nothing cached and no sources to parse
    /// * source read/parse errors and cache write errors
    pub fn corpus(&self) -> Result<Arc<ParsedCorpus>> {
        if let Some(c) = self.corpus.read().as_ref() {
            return Ok(Arc::clone(c));
        }
        let path = self.aggregate_path();
        let lock = KeyedLocks::shared().lock_for(&path);
        let _guard = lock.lock();
        // 別スレッドが先に構築したかもしれない
        if let Some(c) = self.corpus.read().as_ref() {
            return Ok(Arc::clone(c));
        }

        let parsed = match cache::read_entry::<ParsedCorpus>(&path, KIND_AGGREGATE) {
            Ok(Some(parsed)) => {
                info!(path = %path.display(), "user profiles loaded from cache");
                parsed
            }
            miss => {
                if let Err(e) = miss {
                    warn!(path = %path.display(), error = %e, "discarding unusable profile cache");
                }
                if self.sources.is_empty() {
                    return Err(Error::NoSourceCollections);
                }
                info!(sources = self.sources.len(), "user profiles not yet pre-processed, parsing sources");
                let parsed = ParsedCorpus::parse(&self.sources, self.analyzer.as_ref())?;
                cache::write_entry(&path, KIND_AGGREGATE, &parsed)?;
                info!(path = %path.display(), authors = parsed.tweets.len(), "saved preprocessed user profiles");
                parsed
            }
        };
        let parsed = Arc::new(parsed);
        *self.corpus.write() = Some(Arc::clone(&parsed));
        Ok(parsed)
    }

    /// Authors known to the store, source order
    pub fn authors(&self) -> Result<Vec<String>> {
        Ok(self.corpus()?.authors().map(str::to_string).collect())
    }

    /// Build (or load) the profile of one author
    /// `Ok(None)` if the author has no tweets in the sources.
    pub fn profile(&self, author: &str) -> Result<Option<UserProfile<A>>> {
        let corpus = self.corpus()?;
        if !corpus.contains_author(author) {
            return Ok(None);
        }
        let text_corpus = corpus.text_corpus(author);
        let mention_corpus = corpus.mention_corpus(author);
        let dir = self.author_dir(author);
        let text_model = self.model(author, &dir.join(TEXT_MODEL_FILE), &text_corpus)?;
        let mention_model = self.model(author, &dir.join(MENTION_MODEL_FILE), &mention_corpus)?;
        Ok(Some(UserProfile {
            author: author.to_string(),
            text_corpus,
            mention_corpus,
            text_model,
            mention_model,
        }))
    }

    /// Profiles for `authors`, or for every known author when `authors` is empty
    ///
    /// Unknown authors are skipped with a warning; the result may be empty.
    /// Profiles are built in parallel, one author per worker.
    pub fn get_or_build<S: AsRef<str>>(&self, authors: &[S]) -> Result<IndexMap<String, UserProfile<A>>> {
        self.get_or_build_cancellable(authors, &AtomicBool::new(false))
    }

    /// `get_or_build`, stopped with `Cancelled` once `cancel` is set
    ///
    /// The flag is checked before the aggregate is loaded and before each author,
    /// so a request cancelled up front touches neither sources nor cache.
    pub fn get_or_build_cancellable<S: AsRef<str>>(
        &self,
        authors: &[S],
        cancel: &AtomicBool,
    ) -> Result<IndexMap<String, UserProfile<A>>> {
        if cancel.load(Ordering::Relaxed) {
            return Err(Error::Cancelled);
        }
        let corpus = self.corpus()?;
        let targets: Vec<&str> = if authors.is_empty() {
            corpus.authors().collect()
        } else {
            // 要求順ではなくデータセット順
            let requested: Vec<&str> = authors.iter().map(|a| a.as_ref()).collect();
            for a in &requested {
                if !corpus.contains_author(a) {
                    warn!(author = %a, "no profile for requested user");
                }
            }
            corpus.authors().filter(|a| requested.contains(a)).collect()
        };
        let profiles: Vec<UserProfile<A>> = targets
            .par_iter()
            .map(|a| {
                if cancel.load(Ordering::Relaxed) {
                    return Err(Error::Cancelled);
                }
                self.profile(a)
            })
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect();
        Ok(profiles.into_iter().map(|p| (p.author.clone(), p)).collect())
    }

    /// Delete an author's cached models
    pub fn invalidate_author(&self, author: &str) -> Result<()> {
        let dir = self.author_dir(author);
        for file in [TEXT_MODEL_FILE, MENTION_MODEL_FILE] {
            let path = dir.join(file);
            let lock = KeyedLocks::shared().lock_for(&path);
            let _guard = lock.lock();
            cache::remove_entry(&path)?;
        }
        Ok(())
    }

    /// Delete the cached aggregate and forget the in-memory copy
    pub fn invalidate_aggregate(&self) -> Result<()> {
        let path = self.aggregate_path();
        let lock = KeyedLocks::shared().lock_for(&path);
        let _guard = lock.lock();
        *self.corpus.write() = None;
        cache::remove_entry(&path)?;
        Ok(())
    }

    fn model(&self, author: &str, path: &Path, corpus_text: &str) -> Result<TfIdfModel<Arc<A>>> {
        let lock = KeyedLocks::shared().lock_for(path);
        let _guard = lock.lock();
        match cache::read_entry::<TfIdfData>(path, KIND_MODEL) {
            Ok(Some(data)) => {
                debug!(author, path = %path.display(), "profile vectorizer loaded");
                return Ok(data.into_model(Arc::clone(&self.analyzer)));
            }
            Ok(None) => {}
            Err(e) => warn!(author, path = %path.display(), error = %e, "discarding unusable vectorizer cache"),
        }
        let model: TfIdfModel<Arc<A>> = TfIdfModel::fit(
            Arc::clone(&self.analyzer),
            std::slice::from_ref(&corpus_text),
            self.config.min_document_frequency,
        );
        cache::write_entry(path, KIND_MODEL, &model)?;
        info!(author, path = %path.display(), dim = model.dim(), "saved profile vectorizer");
        Ok(model)
    }
}

/// Directory name for an author: whitespace removed, always a single plain path component
///
/// Path separators and other characters that are not portable in file names become `_`,
/// and a key that would read as `.` or `..` (or is empty) gets a `_` prefix.
pub fn author_key(author: &str) -> String {
    let key: String = author
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    match key.as_str() {
        "" | "." | ".." => format!("_{key}"),
        _ => key,
    }
}
