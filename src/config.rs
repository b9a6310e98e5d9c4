use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Stopwords used by the tutorial corpus preprocessing.
pub const DEFAULT_STOPWORDS: &[&str] = &["for", "a", "of", "the", "and", "to", "in"];

/// Vector normalization applied after TF-IDF weighting.
/// Corpus and query vectors always share the same setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Normalization {
    /// Euclidean unit length
    #[default]
    L2,
    /// Absolute values sum to one
    L1,
    /// Raw weights
    None,
}

/// TF-IDF weighting parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TfidfConfig {
    pub normalize: Normalization,
    /// Logarithm base for `idf = log(N / df)`
    pub idf_base: f64,
    /// Weights with an absolute value below this are dropped
    pub eps: f64,
}

impl Default for TfidfConfig {
    fn default() -> Self {
        Self {
            normalize: Normalization::L2,
            idf_base: 2.0,
            eps: 1e-12,
        }
    }
}

impl TfidfConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.idf_base.is_finite() && self.idf_base > 1.0) {
            return Err(Error::InvalidConfig(format!("idf_base must be > 1, got {}", self.idf_base)));
        }
        if !(self.eps.is_finite() && self.eps >= 0.0) {
            return Err(Error::InvalidConfig(format!("eps must be >= 0, got {}", self.eps)));
        }
        Ok(())
    }
}

/// Dictionary pruning parameters, see `Dictionary::filter_extremes`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FilterConfig {
    /// Drop tokens found in fewer documents than this
    pub no_below: u64,
    /// Drop tokens found in more than this fraction of documents
    pub no_above: f64,
    /// Keep at most this many tokens, `None` keeps all
    pub keep_n: Option<usize>,
}

impl Default for FilterConfig {
    /// Keeps every token.
    fn default() -> Self {
        Self {
            no_below: 1,
            no_above: 1.0,
            keep_n: None,
        }
    }
}

impl FilterConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.no_above) {
            return Err(Error::InvalidConfig(format!("no_above must be within 0.0..=1.0, got {}", self.no_above)));
        }
        Ok(())
    }
}

/// Whole pipeline configuration, loadable from JSON.
///
/// Every field has a default, so `{}` is a valid config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub stopwords: Vec<String>,
    /// Tokens whose count over the whole corpus is not above this are
    /// removed before the dictionary is built. 0 keeps everything.
    pub min_token_count: u64,
    pub filter: FilterConfig,
    pub tfidf: TfidfConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stopwords: DEFAULT_STOPWORDS.iter().map(|s| s.to_string()).collect(),
            min_token_count: 0,
            filter: FilterConfig::default(),
            tfidf: TfidfConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Read a JSON config file and validate it.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: PipelineConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.filter.validate()?;
        self.tfidf.validate()
    }
}
