use std::cmp::Ordering;
use std::fmt::{self, Debug, Display};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Normalization;
use crate::error::{Error, Result};
use crate::utils::math::vector::SparseVec;

/// Structure to store search results
pub struct Hits<K = usize> {
    /// (Document key, Score)
    pub list: Vec<(K, f64)>,
}

impl<K> Hits<K> {
    pub fn new(vec: Vec<(K, f64)>) -> Self {
        Hits { list: vec }
    }

    /// Sort results by descending score.
    /// The sort is stable, equal scores keep their current order.
    pub fn sort_by_score(&mut self) -> &mut Self {
        // Remove NaN scores
        self.list.retain(|(_, s)| !s.is_nan());
        // -0.0 and 0.0 tie
        self.list.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        self
    }

    /// Sort results by ascending score
    pub fn sort_by_score_rev(&mut self) -> &mut Self {
        self.list.retain(|(_, s)| !s.is_nan());
        self.list.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        self
    }

    /// Keep the first `n` entries.
    pub fn top(&mut self, n: usize) -> &mut Self {
        self.list.truncate(n);
        self
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, f64)> + '_ {
        self.list.iter().map(|(k, s)| (k, *s))
    }

    /// Keys in current order.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.list.iter().map(|(k, _)| k)
    }
}

/// Rank `(document, score)` pairs, best first. Ties keep document order.
pub fn rank<K>(scores: Vec<(K, f64)>) -> Hits<K> {
    let mut hits = Hits::new(scores);
    hits.sort_by_score();
    hits
}

impl<K> Debug for Hits<K>
where
    K: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            // each hit on a new line
            writeln!(f, "Hits [")?;
            for (key, score) in &self.list {
                writeln!(f, "    {:?}: {:.6}", key, score)?;
            }
            write!(f, "]")
        } else {
            f.debug_list().entries(&self.list).finish()
        }
    }
}

impl<K> Display for Hits<K>
where
    K: Display,
{
    /// One `<key>\t<score>` line per hit.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, score) in &self.list {
            writeln!(f, "{}\t{:.6}", key, score)?;
        }
        Ok(())
    }
}

/// Cosine similarity index over a fixed corpus.
///
/// Stored vectors are unit length, so a query score is a plain dot product
/// over shared ids. Scores of empty vectors (stored or query) are 0.0.
///
/// Deserialization re-checks the invariants `build` establishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SimilarityIndexData")]
pub struct SimilarityIndex {
    documents: Vec<SparseVec<f64>>,
    num_features: usize,
}

/// Unchecked on-disk form of `SimilarityIndex`
#[derive(Deserialize)]
struct SimilarityIndexData {
    documents: Vec<SparseVec<f64>>,
    num_features: usize,
}

impl TryFrom<SimilarityIndexData> for SimilarityIndex {
    type Error = Error;

    fn try_from(data: SimilarityIndexData) -> Result<Self> {
        for (index, doc) in data.documents.iter().enumerate() {
            check_feature_space(doc, data.num_features)?;
            let norm_sq = doc.norm_sq::<f64>();
            if !doc.is_empty() && (norm_sq - 1.0).abs() > UNIT_TOLERANCE {
                return Err(Error::InvalidData(format!(
                    "document {index} is not unit length (squared norm {norm_sq})"
                )));
            }
        }
        Ok(Self {
            documents: data.documents,
            num_features: data.num_features,
        })
    }
}

const UNIT_TOLERANCE: f64 = 1e-9;

fn check_feature_space(doc: &SparseVec<f64>, num_features: usize) -> Result<()> {
    match doc.max_id() {
        Some(id) if id as usize >= num_features => Err(Error::DimensionMismatch { id, num_features }),
        _ => Ok(()),
    }
}

impl SimilarityIndex {
    /// Index `corpus`; document `i` of the corpus is document `i` of every
    /// query result. Fails if a vector uses an id `>= num_features`.
    pub fn build<I>(corpus: I, num_features: usize) -> Result<Self>
    where
        I: IntoIterator<Item = SparseVec<f64>>,
    {
        let mut documents = Vec::new();
        for doc in corpus {
            check_feature_space(&doc, num_features)?;
            documents.push(doc.normalized(Normalization::L2));
        }
        debug!(documents = documents.len(), num_features, "built similarity index");
        Ok(Self {
            documents,
            num_features,
        })
    }

    /// Score `query` against every document, in corpus order.
    /// The query is scaled to unit length as given; ids outside the feature
    /// space then match nothing and add nothing to the score.
    pub fn query(&self, query: &SparseVec<f64>) -> Vec<(usize, f64)> {
        let query = self.prepare(query);
        self.documents
            .par_iter()
            .enumerate()
            .map(|(index, doc)| (index, doc.dot::<f64>(&query)))
            .collect()
    }

    /// The `n` best documents, best first.
    pub fn query_top(&self, query: &SparseVec<f64>, n: usize) -> Hits<usize> {
        let mut hits = rank(self.query(query));
        hits.top(n);
        hits
    }

    /// `query` for several vectors at once.
    pub fn query_batch(&self, queries: &[SparseVec<f64>]) -> Vec<Vec<(usize, f64)>> {
        queries.iter().map(|q| self.query(q)).collect()
    }

    fn prepare(&self, query: &SparseVec<f64>) -> SparseVec<f64> {
        let num_features = self.num_features;
        let mut query = query.clone().normalized(Normalization::L2);
        query.retain(|id, _| (id as usize) < num_features);
        query
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    #[inline]
    pub fn num_features(&self) -> usize {
        self.num_features
    }

    /// Stored (unit length) vector of a document.
    pub fn document(&self, index: usize) -> Option<&SparseVec<f64>> {
        self.documents.get(index)
    }
}
