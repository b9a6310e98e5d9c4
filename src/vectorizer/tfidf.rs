use std::borrow::Borrow;
use std::marker::PhantomData;

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::TfidfConfig;
use crate::error::{Error, Result};
use crate::utils::math::vector::SparseVec;
use crate::vectorizer::dictionary::Dictionary;

/// TF-IDF weighting strategy
///
/// Plug a different strategy into `TfidfModel<E>` by implementing this trait.
pub trait TfidfEngine: Send + Sync {
    /// Local weight of a raw in-document count (`count >= 1`).
    fn tf(count: f64, base: f64) -> f64;
    /// Global weight of a token found in `doc_freq` of `doc_num` documents.
    /// Only called with `doc_freq >= 1`.
    fn idf(doc_num: u64, doc_freq: u64, base: f64) -> f64;
}

/// デフォルトのTF-IDFエンジン
/// tf = count, idf = log_base(N / df)
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTfidfEngine;

impl TfidfEngine for DefaultTfidfEngine {
    #[inline]
    fn tf(count: f64, _base: f64) -> f64 {
        count
    }

    #[inline]
    fn idf(doc_num: u64, doc_freq: u64, base: f64) -> f64 {
        (doc_num as f64 / doc_freq as f64).log(base)
    }
}

/// tf = 1 + log_base(count), idf as `DefaultTfidfEngine`
#[derive(Debug, Clone, Copy, Default)]
pub struct SublinearTfidfEngine;

impl TfidfEngine for SublinearTfidfEngine {
    #[inline]
    fn tf(count: f64, base: f64) -> f64 {
        1.0 + count.log(base)
    }

    #[inline]
    fn idf(doc_num: u64, doc_freq: u64, base: f64) -> f64 {
        DefaultTfidfEngine::idf(doc_num, doc_freq, base)
    }
}

/// Fitted TF-IDF model. Immutable once built.
///
/// Holds one idf weight per token id seen at fit time. `transform` weights a
/// bag-of-words vector and normalizes it as configured in `TfidfConfig`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
pub struct TfidfModel<E = DefaultTfidfEngine>
where
    E: TfidfEngine,
{
    num_docs: u64,
    #[serde(with = "indexmap::map::serde_seq")]
    idfs: IndexMap<u32, f64>,
    config: TfidfConfig,
    #[serde(skip)]
    _marker: PhantomData<E>,
}

impl<E> TfidfModel<E>
where
    E: TfidfEngine,
{
    /// Fit over `corpus`, taking document frequencies from `dictionary`.
    /// Both must describe the same documents: a dictionary that counted a
    /// different number of documents than `corpus` holds is rejected.
    pub fn fit(corpus: &[SparseVec<u32>], dictionary: &Dictionary, config: TfidfConfig) -> Result<Self> {
        let corpus_docs = corpus.len() as u64;
        if dictionary.num_docs() != corpus_docs {
            return Err(Error::CorpusMismatch {
                corpus_docs,
                dictionary_docs: dictionary.num_docs(),
            });
        }
        let dfs = dictionary
            .iter()
            .map(|(_, stats)| (stats.id, stats.doc_freq))
            .collect();
        Self::from_dfs(corpus_docs, dfs, config)
    }

    /// Fit by recounting document frequencies from the corpus itself.
    /// Works for any one-pass source of bag-of-words vectors.
    pub fn fit_corpus<I, B>(corpus: I, config: TfidfConfig) -> Result<Self>
    where
        I: IntoIterator<Item = B>,
        B: Borrow<SparseVec<u32>>,
    {
        Self::try_fit_corpus(corpus.into_iter().map(Ok), config)
    }

    /// `fit_corpus` over a fallible source such as a `BowStream` pass.
    /// The first error aborts the fit.
    pub fn try_fit_corpus<I, B>(corpus: I, config: TfidfConfig) -> Result<Self>
    where
        I: IntoIterator<Item = Result<B>>,
        B: Borrow<SparseVec<u32>>,
    {
        let mut num_docs = 0u64;
        let mut dfs: IndexMap<u32, u64> = IndexMap::new();
        for bow in corpus {
            let bow = bow?;
            num_docs += 1;
            for &id in bow.borrow().ids() {
                *dfs.entry(id).or_insert(0) += 1;
            }
        }
        dfs.sort_keys();
        Self::from_dfs(num_docs, dfs, config)
    }

    fn from_dfs(num_docs: u64, dfs: IndexMap<u32, u64>, config: TfidfConfig) -> Result<Self> {
        config.validate()?;
        info!(
            "calculating IDF weights for {} documents and {} features",
            num_docs,
            dfs.len()
        );
        let mut idfs = IndexMap::with_capacity(dfs.len());
        for (id, df) in dfs {
            if df == 0 {
                return Err(Error::ZeroDocumentFrequency { id });
            }
            if df > num_docs {
                return Err(Error::InconsistentDocumentFrequency {
                    id,
                    doc_freq: df,
                    num_docs,
                });
            }
            idfs.insert(id, E::idf(num_docs, df, config.idf_base));
        }
        Ok(Self {
            num_docs,
            idfs,
            config,
            _marker: PhantomData,
        })
    }

    /// Weight and normalize one bag-of-words vector.
    /// Ids unknown to the model are dropped; empty in, empty out.
    pub fn transform(&self, bow: &SparseVec<u32>) -> SparseVec<f64> {
        let base = self.config.idf_base;
        let eps = self.config.eps;
        let weighted = bow.map_values(|id, count| match self.idfs.get(&id) {
            Some(&idf) => {
                let w = E::tf(count as f64, base) * idf;
                if w.abs() < eps { 0.0 } else { w }
            }
            None => 0.0,
        });
        weighted.normalized(self.config.normalize)
    }

    /// `transform` every vector, keeping corpus order.
    pub fn transform_corpus(&self, corpus: &[SparseVec<u32>]) -> Vec<SparseVec<f64>> {
        corpus.par_iter().map(|bow| self.transform(bow)).collect()
    }

    /// idf of `id`, `None` if the id was not seen at fit time.
    #[inline]
    pub fn idf(&self, id: u32) -> Option<f64> {
        self.idfs.get(&id).copied()
    }

    /// `(id, idf)` in id order.
    pub fn idfs(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.idfs.iter().map(|(&id, &idf)| (id, idf))
    }

    #[inline]
    pub fn num_docs(&self) -> u64 {
        self.num_docs
    }

    /// Number of ids with an idf weight.
    #[inline]
    pub fn num_features(&self) -> usize {
        self.idfs.len()
    }

    #[inline]
    pub fn config(&self) -> &TfidfConfig {
        &self.config
    }
}
