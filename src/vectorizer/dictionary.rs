use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::FilterConfig;
use crate::error::{Error, Result};

/// Per-token statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenStats {
    /// Token id
    pub id: u32,
    /// Number of documents containing the token
    pub doc_freq: u64,
    /// Total occurrences over all documents
    pub collection_freq: u64,
}

/// Dictionary
/// token <-> id の対応と文書頻度を管理します
///
/// Ids are handed out in first-seen order. `entries` keeps insertion order,
/// and since ids only grow (and `compactify` renumbers in order), entry ids
/// are always strictly increasing. Id lookups rely on that, so it is
/// re-checked on deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DictionaryData")]
pub struct Dictionary {
    #[serde(with = "indexmap::map::serde_seq")]
    entries: IndexMap<String, TokenStats>,
    /// next id to hand out
    next_id: u32,
    /// documents processed
    num_docs: u64,
    /// tokens processed (sum of document lengths)
    num_pos: u64,
    /// sum of distinct tokens per document
    num_nnz: u64,
}

/// Unchecked on-disk form of `Dictionary`
#[derive(Deserialize)]
struct DictionaryData {
    #[serde(with = "indexmap::map::serde_seq")]
    entries: IndexMap<String, TokenStats>,
    next_id: u32,
    num_docs: u64,
    num_pos: u64,
    num_nnz: u64,
}

impl TryFrom<DictionaryData> for Dictionary {
    type Error = Error;

    fn try_from(data: DictionaryData) -> Result<Self> {
        let mut prev: Option<u32> = None;
        for (token, stats) in &data.entries {
            if prev.is_some_and(|p| stats.id <= p) {
                return Err(Error::InvalidData(format!("token {token:?}: ids are not strictly increasing")));
            }
            if stats.id >= data.next_id {
                return Err(Error::InvalidData(format!(
                    "token {token:?}: id {} is not below next id {}",
                    stats.id, data.next_id
                )));
            }
            prev = Some(stats.id);
        }
        Ok(Self {
            entries: data.entries,
            next_id: data.next_id,
            num_docs: data.num_docs,
            num_pos: data.num_pos,
            num_nnz: data.num_nnz,
        })
    }
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dictionary over tokenized documents.
    pub fn from_documents<T>(documents: &[Vec<T>]) -> Self
    where
        T: AsRef<str>,
    {
        let mut dictionary = Self::new();
        dictionary.add_documents(documents);
        dictionary
    }

    /// Add documents, assigning ids to unseen tokens and updating frequencies.
    pub fn add_documents<T>(&mut self, documents: &[Vec<T>])
    where
        T: AsRef<str>,
    {
        for (doc_no, doc) in documents.iter().enumerate() {
            if doc_no % 10_000 == 0 {
                debug!(doc_no, "adding document");
            }
            self.doc2bow_update(doc);
        }
        info!(
            "built {} from {} documents (total {} corpus positions)",
            self,
            self.num_docs,
            self.num_pos
        );
    }

    /// Intern `token`, returning its id. Frequencies are not touched.
    pub(crate) fn intern(&mut self, token: &str) -> u32 {
        if let Some(stats) = self.entries.get(token) {
            return stats.id;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(
            token.to_string(),
            TokenStats {
                id,
                doc_freq: 0,
                collection_freq: 0,
            },
        );
        id
    }

    /// Record one processed document. `counts` holds `(id, count)` for its
    /// distinct tokens.
    pub(crate) fn record_document(&mut self, counts: &[(u32, u32)]) {
        self.num_docs += 1;
        self.num_nnz += counts.len() as u64;
        for &(id, count) in counts {
            self.num_pos += count as u64;
            if let Some(pos) = self.position_of(id) {
                if let Some((_, stats)) = self.entries.get_index_mut(pos) {
                    stats.doc_freq += 1;
                    stats.collection_freq += count as u64;
                }
            }
        }
    }

    // entries の id は昇順なので二分探索
    fn position_of(&self, id: u32) -> Option<usize> {
        let (mut lo, mut hi) = (0usize, self.entries.len());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let (_, stats) = self.entries.get_index(mid)?;
            match stats.id.cmp(&id) {
                std::cmp::Ordering::Equal => return Some(mid),
                std::cmp::Ordering::Less => lo = mid + 1,
                std::cmp::Ordering::Greater => hi = mid,
            }
        }
        None
    }
}

/// Lookups
impl Dictionary {
    /// Id of `token`, `None` if unknown.
    #[inline]
    pub fn token_to_id(&self, token: &str) -> Option<u32> {
        self.entries.get(token).map(|stats| stats.id)
    }

    pub fn id_to_token(&self, id: u32) -> Option<&str> {
        self.position_of(id)
            .and_then(|pos| self.entries.get_index(pos))
            .map(|(token, _)| token.as_str())
    }

    pub fn stats(&self, token: &str) -> Option<&TokenStats> {
        self.entries.get(token)
    }

    /// Number of documents containing the token with this id. 0 if unknown.
    pub fn doc_freq(&self, id: u32) -> u64 {
        self.position_of(id)
            .and_then(|pos| self.entries.get_index(pos))
            .map_or(0, |(_, stats)| stats.doc_freq)
    }

    /// Total occurrences of the token with this id. 0 if unknown.
    pub fn collection_freq(&self, id: u32) -> u64 {
        self.position_of(id)
            .and_then(|pos| self.entries.get_index(pos))
            .map_or(0, |(_, stats)| stats.collection_freq)
    }

    /// `(token, stats)` in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TokenStats)> + '_ {
        self.entries.iter().map(|(token, stats)| (token.as_str(), stats))
    }

    /// `(token, id)` in id order.
    pub fn token2id(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.entries.iter().map(|(token, stats)| (token.as_str(), stats.id))
    }

    /// Number of tokens.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One past the highest id ever handed out. Equals `len()` after
    /// `compactify`.
    #[inline]
    pub fn id_bound(&self) -> u32 {
        self.next_id
    }

    /// Whether ids are exactly `0..len()`.
    pub fn is_compact(&self) -> bool {
        self.entries
            .values()
            .enumerate()
            .all(|(pos, stats)| stats.id as usize == pos)
    }

    #[inline]
    pub fn num_docs(&self) -> u64 {
        self.num_docs
    }

    #[inline]
    pub fn num_pos(&self) -> u64 {
        self.num_pos
    }

    #[inline]
    pub fn num_nnz(&self) -> u64 {
        self.num_nnz
    }
}

/// Filtering and id compaction
impl Dictionary {
    /// Remove the given ids together with their frequencies.
    /// Ids are left sparse; call `compactify` when density matters.
    pub fn filter_tokens(&mut self, remove_ids: &[u32]) {
        let remove_ids = sorted_ids(remove_ids);
        let before = self.entries.len();
        self.entries.retain(|_, stats| remove_ids.binary_search(&stats.id).is_err());
        debug!(removed = before - self.entries.len(), "filtered tokens by id");
    }

    /// Keep only the given ids.
    pub fn filter_tokens_keep(&mut self, keep_ids: &[u32]) {
        let keep_ids = sorted_ids(keep_ids);
        let before = self.entries.len();
        self.entries.retain(|_, stats| keep_ids.binary_search(&stats.id).is_ok());
        debug!(removed = before - self.entries.len(), "filtered tokens by id");
    }

    /// Drop tokens found in fewer than `no_below` documents or in more than
    /// `no_above * num_docs` documents, then keep at most `keep_n` of the
    /// remaining ones with the highest document frequency (ties: lower id).
    /// Compacts ids afterwards.
    pub fn filter_extremes(&mut self, filter: &FilterConfig) {
        let no_above_abs = (filter.no_above * self.num_docs as f64) as u64;
        let mut good: Vec<(u32, u64)> = self
            .entries
            .values()
            .filter(|stats| stats.doc_freq >= filter.no_below && stats.doc_freq <= no_above_abs)
            .map(|stats| (stats.id, stats.doc_freq))
            .collect();
        if let Some(keep_n) = filter.keep_n {
            // stable sort, equal df keeps id order
            good.sort_by(|a, b| b.1.cmp(&a.1));
            good.truncate(keep_n);
        }
        let mut keep_ids: Vec<u32> = good.into_iter().map(|(id, _)| id).collect();
        keep_ids.sort_unstable();

        let before = self.entries.len();
        self.entries.retain(|_, stats| keep_ids.binary_search(&stats.id).is_ok());
        info!(
            "discarding {} tokens (no_below={}, no_above={}, keep_n={:?}), keeping {}",
            before - self.entries.len(),
            filter.no_below,
            filter.no_above,
            filter.keep_n,
            self.entries.len()
        );
        self.compactify();
    }

    /// Renumber ids densely as `0..len()` keeping relative order.
    /// Returns the old id -> new id map.
    pub fn compactify(&mut self) -> HashMap<u32, u32> {
        let mut remap = HashMap::with_capacity(self.entries.len());
        for (new_id, stats) in self.entries.values_mut().enumerate() {
            let new_id = new_id as u32;
            remap.insert(stats.id, new_id);
            stats.id = new_id;
        }
        self.next_id = self.entries.len() as u32;
        debug!(tokens = self.entries.len(), "compactified dictionary");
        remap
    }

    /// Merge `other` into this dictionary. Unseen tokens get new ids after
    /// the current ones, frequencies and counters are summed.
    /// Returns the other id -> merged id map, for re-encoding vectors that
    /// were built with `other`.
    pub fn merge_with(&mut self, other: &Dictionary) -> HashMap<u32, u32> {
        let mut remap = HashMap::with_capacity(other.len());
        for (token, other_stats) in other.iter() {
            let id = self.intern(token);
            if let Some(stats) = self.entries.get_mut(token) {
                stats.doc_freq += other_stats.doc_freq;
                stats.collection_freq += other_stats.collection_freq;
            }
            remap.insert(other_stats.id, id);
        }
        self.num_docs += other.num_docs;
        self.num_pos += other.num_pos;
        self.num_nnz += other.num_nnz;
        remap
    }
}

fn sorted_ids(ids: &[u32]) -> Vec<u32> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

impl fmt::Display for Dictionary {
    /// `Dictionary<3 unique tokens: ["human", "machine", "interface"]>`
    /// (at most 10 tokens are listed)
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head: Vec<&str> = self.entries.keys().take(10).map(|s| s.as_str()).collect();
        write!(f, "Dictionary<{} unique tokens: {:?}", self.len(), head)?;
        if self.len() > 10 {
            write!(f, "...")?;
        }
        write!(f, ">")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(texts: &[&str]) -> Vec<Vec<String>> {
        texts
            .iter()
            .map(|t| t.split_whitespace().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn ids_follow_first_appearance() {
        let dict = Dictionary::from_documents(&docs(&[
            "human machine interface",
            "human computer interaction",
            "computer interaction",
        ]));
        let ids: Vec<(&str, u32)> = dict.token2id().collect();
        assert_eq!(
            ids,
            vec![("human", 0), ("machine", 1), ("interface", 2), ("computer", 3), ("interaction", 4)]
        );
        assert_eq!(dict.token_to_id("computer"), Some(3));
        assert_eq!(dict.token_to_id("missing"), None);
        assert_eq!(dict.id_to_token(4), Some("interaction"));
        assert_eq!(dict.id_to_token(5), None);
    }

    #[test]
    fn document_frequency_counts_documents_not_occurrences() {
        let dict = Dictionary::from_documents(&docs(&["a a a b", "a c", "c"]));
        let a = dict.token_to_id("a").unwrap();
        let c = dict.token_to_id("c").unwrap();
        assert_eq!(dict.doc_freq(a), 2);
        assert_eq!(dict.collection_freq(a), 4);
        assert_eq!(dict.doc_freq(c), 2);
        assert_eq!(dict.num_docs(), 3);
        assert_eq!(dict.num_pos(), 7);
        assert_eq!(dict.num_nnz(), 5);
    }

    #[test]
    fn filter_then_compactify_closes_gaps_in_order() {
        let mut dict = Dictionary::from_documents(&docs(&["a b c d e"]));
        dict.filter_tokens(&[1, 3]);
        assert_eq!(dict.len(), 3);
        assert!(!dict.is_compact());
        assert_eq!(dict.doc_freq(1), 0);

        let remap = dict.compactify();
        assert!(dict.is_compact());
        assert_eq!(dict.id_bound(), 3);
        assert_eq!(dict.token2id().collect::<Vec<_>>(), vec![("a", 0), ("c", 1), ("e", 2)]);
        assert_eq!(remap[&4], 2);
        assert_eq!(dict.doc_freq(2), 1);
    }

    #[test]
    fn filtered_dictionary_does_not_reuse_ids() {
        let mut dict = Dictionary::from_documents(&docs(&["a b c"]));
        dict.filter_tokens(&[2]);
        dict.add_documents(&docs(&["d"]));
        assert_eq!(dict.token_to_id("d"), Some(3));
    }

    #[test]
    fn filter_tokens_keep_retains_only_listed() {
        let mut dict = Dictionary::from_documents(&docs(&["a b c"]));
        dict.filter_tokens_keep(&[0, 2]);
        assert_eq!(dict.token2id().collect::<Vec<_>>(), vec![("a", 0), ("c", 2)]);
    }

    #[test]
    fn filter_ids_in_any_order_with_repeats() {
        let mut dict = Dictionary::from_documents(&docs(&["a b c d e f"]));
        dict.filter_tokens(&[4, 1, 4, 99]);
        assert_eq!(
            dict.token2id().collect::<Vec<_>>(),
            vec![("a", 0), ("c", 2), ("d", 3), ("f", 5)]
        );
        dict.filter_tokens_keep(&[5, 0, 5, 1]);
        assert_eq!(dict.token2id().collect::<Vec<_>>(), vec![("a", 0), ("f", 5)]);
    }

    #[test]
    fn deserialize_checks_id_order() {
        let dict = Dictionary::from_documents(&docs(&["a b", "b c"]));
        let json = serde_json::to_string(&dict).unwrap();
        assert_eq!(serde_json::from_str::<Dictionary>(&json).unwrap(), dict);

        let unordered = r#"{"entries":[["a",{"id":1,"doc_freq":1,"collection_freq":1}],["b",{"id":0,"doc_freq":1,"collection_freq":1}]],"next_id":2,"num_docs":1,"num_pos":2,"num_nnz":2}"#;
        assert!(serde_json::from_str::<Dictionary>(unordered).is_err());

        let past_next = r#"{"entries":[["a",{"id":0,"doc_freq":1,"collection_freq":1}],["b",{"id":5,"doc_freq":1,"collection_freq":1}]],"next_id":2,"num_docs":1,"num_pos":2,"num_nnz":2}"#;
        assert!(serde_json::from_str::<Dictionary>(past_next).is_err());
    }

    #[test]
    fn filter_extremes_applies_bounds_and_keep_n() {
        let mut dict = Dictionary::from_documents(&docs(&["a b c", "a b", "a d", "a e e"]));
        // a: df 4, b: df 2, c/d/e: df 1
        dict.filter_extremes(&FilterConfig {
            no_below: 2,
            no_above: 0.9,
            keep_n: None,
        });
        assert_eq!(dict.token2id().collect::<Vec<_>>(), vec![("b", 0)]);

        let mut dict = Dictionary::from_documents(&docs(&["a b c", "a b", "a d", "a e e"]));
        dict.filter_extremes(&FilterConfig {
            no_below: 1,
            no_above: 1.0,
            keep_n: Some(3),
        });
        assert_eq!(dict.token2id().collect::<Vec<_>>(), vec![("a", 0), ("b", 1), ("c", 2)]);
    }

    #[test]
    fn merge_with_appends_unseen_tokens() {
        let mut left = Dictionary::from_documents(&docs(&["a b"]));
        let right = Dictionary::from_documents(&docs(&["c b", "b"]));
        let remap = left.merge_with(&right);
        assert_eq!(left.token2id().collect::<Vec<_>>(), vec![("a", 0), ("b", 1), ("c", 2)]);
        assert_eq!(remap[&0], 2);
        assert_eq!(remap[&1], 1);
        assert_eq!(left.doc_freq(1), 3);
        assert_eq!(left.num_docs(), 3);
    }

    #[test]
    fn display_lists_tokens() {
        let dict = Dictionary::from_documents(&docs(&["x y"]));
        assert_eq!(dict.to_string(), r#"Dictionary<2 unique tokens: ["x", "y"]>"#);
        assert_eq!(Dictionary::new().to_string(), "Dictionary<0 unique tokens: []>");
    }
}
