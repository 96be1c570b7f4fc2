use std::{fs, path::{Path, PathBuf}};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Blend weights for the personalized score
/// blended = raw * normalized_raw_score + text * text_similarity + mention * mention_similarity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendWeights {
    pub raw: f64,
    pub text: f64,
    pub mention: f64,
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self {
            raw: 0.2,
            text: 0.5,
            mention: 0.3,
        }
    }
}

impl BlendWeights {
    /// Weights must be non-negative and sum to 1, otherwise the blend leaves [0, 1].
    pub fn validate(&self) -> Result<()> {
        let ws = [self.raw, self.text, self.mention];
        if ws.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(Error::Config(format!("blend weights must be non-negative: {:?}", self)));
        }
        let sum: f64 = ws.iter().sum();
        if (sum - 1.0).abs() > 1e-9 {
            return Err(Error::Config(format!("blend weights must sum to 1.0, got {sum}")));
        }
        Ok(())
    }
}

/// Personalization settings
/// Every field has a default, so a config file only needs the overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalizeConfig {
    /// root of the profile cache
    pub cache_dir: PathBuf,
    /// vocabulary cutoff, fraction of fit documents a term must appear in
    pub min_document_frequency: f64,
    /// results kept per user
    pub top_k: usize,
    pub weights: BlendWeights,
    /// decimals kept in the blended score
    pub round_decimals: u32,
}

impl Default for PersonalizeConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("./user-profiles"),
            min_document_frequency: 0.01,
            top_k: 10,
            weights: BlendWeights::default(),
            round_decimals: 6,
        }
    }
}

impl PersonalizeConfig {
    /// Load a config from a JSON file, filling missing fields with defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("cannot parse {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;
        if !(0.0..=1.0).contains(&self.min_document_frequency) {
            return Err(Error::Config(format!(
                "min_document_frequency must be within [0, 1], got {}",
                self.min_document_frequency
            )));
        }
        if self.top_k == 0 {
            return Err(Error::Config("top_k must be positive".to_string()));
        }
        Ok(())
    }

    pub fn with_cache_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.cache_dir = dir.into();
        self
    }
}
