pub mod backend;

use std::sync::atomic::{AtomicBool, Ordering};

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    config::{BlendWeights, PersonalizeConfig},
    error::{Error, Result},
    personalize::backend::Hit,
    profile::{
        document::{extract_mentions, mention_text},
        store::{ProfileStore, UserProfile},
    },
    utils::scaler::{min_max_scale, round_to},
    vectorizer::{analyzer::Analyzer, compare::similarity_scores},
};

/// One retrieved candidate, as handed to the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub candidate_id: String,
    pub raw_score: f64,
    pub text: String,
    /// space-prefixed handles found in `text`, `" "` if none
    pub mentions_text: String,
    /// stored fields passed through to the presentation layer
    #[serde(default)]
    pub source: Value,
}

impl SearchResult {
    pub fn new<I: Into<String>, T: Into<String>>(candidate_id: I, raw_score: f64, text: T) -> Self {
        let text = text.into();
        let mentions_text = mention_text(&extract_mentions(&text));
        Self {
            candidate_id: candidate_id.into(),
            raw_score,
            text,
            mentions_text,
            source: Value::Null,
        }
    }

    pub fn from_hit(hit: &Hit) -> Self {
        let mut result = Self::new(hit.id.clone(), hit.score, hit.field("text"));
        result.source = hit.source.clone();
        result
    }

    /// A string field of the stored document, empty if absent
    pub fn field(&self, name: &str) -> &str {
        self.source.get(name).and_then(Value::as_str).unwrap_or("")
    }
}

/// A candidate re-scored for one user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonalizedResult<'r> {
    pub result: &'r SearchResult,
    pub normalized_raw_score: f64,
    pub text_similarity: f64,
    pub mention_similarity: f64,
    pub blended_score: f64,
}

/// Blend precomputed component scores, then sort and cut
///
/// The sort is stable, so equal blended scores keep batch order.
///
/// # Arguments
/// * `results` - the batch, in retrieval order
/// * `normalized` / `text` / `mention` - component scores per result, same order
/// * `weights` - blend weights
/// * `top_k` - results kept
/// * `decimals` - rounding of the blended score
pub fn rank<'r>(
    results: &'r [SearchResult],
    normalized: &[f64],
    text: &[f64],
    mention: &[f64],
    weights: &BlendWeights,
    top_k: usize,
    decimals: u32,
) -> Vec<PersonalizedResult<'r>> {
    let mut ranked: Vec<PersonalizedResult<'r>> = results
        .iter()
        .zip(normalized)
        .zip(text.iter().zip(mention))
        .map(|((result, &n), (&t, &m))| PersonalizedResult {
            result,
            normalized_raw_score: n,
            text_similarity: t,
            mention_similarity: m,
            blended_score: round_to(weights.raw * n + weights.text * t + weights.mention * m, decimals),
        })
        .collect();
    ranked.sort_by(|a, b| b.blended_score.total_cmp(&a.blended_score));
    ranked.truncate(top_k);
    ranked
}

/// Re-ranks a result batch for each target user against their profile
#[derive(Debug, Clone)]
pub struct Personalizer {
    config: PersonalizeConfig,
}

impl Personalizer {
    pub fn new(config: PersonalizeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PersonalizeConfig {
        &self.config
    }

    /// Personalized top-K lists, one per target user
    ///
    /// An empty `targets` means every author known to `store`. Output order
    /// follows the store's author order. Similarities are rescaled within one
    /// user's pass, so blended scores are not comparable across users.
    ///
    /// # Errors
    /// * `NoMatchingUsers` - no target resolves to a profile
    /// * any profile store error
    pub fn personalize<'r, A, S>(
        &self,
        results: &'r [SearchResult],
        targets: &[S],
        store: &ProfileStore<A>,
    ) -> Result<IndexMap<String, Vec<PersonalizedResult<'r>>>>
    where
        A: Analyzer + ?Sized,
        S: AsRef<str>,
    {
        self.personalize_cancellable(results, targets, store, &AtomicBool::new(false))
    }

    /// `personalize`, abandoned with `Cancelled` once `cancel` is set
    ///
    /// The flag is checked before profiles are loaded or built, before each
    /// author's profile, and before each author's scoring pass. Per-user work
    /// already done is dropped, nothing partial is returned.
    pub fn personalize_cancellable<'r, A, S>(
        &self,
        results: &'r [SearchResult],
        targets: &[S],
        store: &ProfileStore<A>,
        cancel: &AtomicBool,
    ) -> Result<IndexMap<String, Vec<PersonalizedResult<'r>>>>
    where
        A: Analyzer + ?Sized,
        S: AsRef<str>,
    {
        if cancel.load(Ordering::Relaxed) {
            return Err(Error::Cancelled);
        }
        let profiles = store.get_or_build_cancellable(targets, cancel)?;
        if profiles.is_empty() {
            return Err(Error::NoMatchingUsers {
                requested: targets.iter().map(|t| t.as_ref().to_string()).collect(),
            });
        }
        if cancel.load(Ordering::Relaxed) {
            return Err(Error::Cancelled);
        }

        let raw: Vec<f64> = results.iter().map(|r| r.raw_score).collect();
        let normalized = min_max_scale(&raw);
        info!(results = results.len(), users = profiles.len(), "personalizing results");

        let users: Vec<&UserProfile<A>> = profiles.values().collect();
        let lists = users
            .par_iter()
            .map(|profile| {
                if cancel.load(Ordering::Relaxed) {
                    return Err(Error::Cancelled);
                }
                Ok((profile.author.clone(), self.score_profile(results, &normalized, profile)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(lists.into_iter().collect())
    }

    /// Score the batch against one user's profile
    pub fn score_profile<'r, A>(
        &self,
        results: &'r [SearchResult],
        normalized: &[f64],
        profile: &UserProfile<A>,
    ) -> Vec<PersonalizedResult<'r>>
    where
        A: Analyzer + ?Sized,
    {
        let texts: Vec<&str> = results.iter().map(|r| r.text.as_str()).collect();
        let mentions: Vec<&str> = results.iter().map(|r| r.mentions_text.as_str()).collect();

        let text_ref = profile.text_model.transform_one(&profile.text_corpus);
        let text_sims = similarity_scores(&profile.text_model.transform(&texts), &text_ref);
        let mention_ref = profile.mention_model.transform_one(&profile.mention_corpus);
        let mention_sims = similarity_scores(&profile.mention_model.transform(&mentions), &mention_ref);
        debug!(author = %profile.author, text_dim = text_ref.len(), mention_dim = mention_ref.len(), "scored batch");

        rank(
            results,
            normalized,
            &text_sims,
            &mention_sims,
            &self.config.weights,
            self.config.top_k,
            self.config.round_decimals,
        )
    }
}
