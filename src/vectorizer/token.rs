use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_STOPWORDS;

/// Tokenizer 構造体
/// 文書を小文字化して空白で分割し、stopword を除去します
///
/// # Examples
/// ```
/// use tfidf_similarity::Tokenizer;
/// let tokenizer = Tokenizer::default();
/// assert_eq!(tokenizer.tokenize("The EPS user interface"), vec!["eps", "user", "interface"]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tokenizer {
    stopwords: HashSet<String>,
}

impl Default for Tokenizer {
    /// Tokenizer with the stoplist `for a of the and to in`.
    fn default() -> Self {
        Self::new(DEFAULT_STOPWORDS)
    }
}

impl Tokenizer {
    /// Stopwords are lowercased so they match lowercased tokens.
    pub fn new<I, S>(stopwords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            stopwords: stopwords.into_iter().map(|s| s.as_ref().to_lowercase()).collect(),
        }
    }

    /// Tokenizer that keeps every token.
    pub fn without_stopwords() -> Self {
        Self {
            stopwords: HashSet::new(),
        }
    }

    #[inline]
    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }

    /// Lowercase, split on whitespace, drop stopwords.
    /// Empty input yields no tokens.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.to_lowercase()
            .split_whitespace()
            .filter(|tok| !self.is_stopword(tok))
            .map(str::to_string)
            .collect()
    }

    /// Tokenize every document, keeping document order.
    pub fn tokenize_corpus<I, S>(&self, documents: I) -> Vec<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        documents.into_iter().map(|doc| self.tokenize(doc.as_ref())).collect()
    }
}

/// TokenFrequency 構造体
/// token の出現回数を初出順に管理します
///
/// Counts are total occurrences, so over a whole corpus this is the
/// collection frequency, not the document frequency.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TokenFrequency {
    #[serde(with = "indexmap::map::serde_seq")]
    token_count: IndexMap<String, u64>,
    total_token_count: u64,
}

/// Token の追加、削除の実装
impl TokenFrequency {
    pub fn new() -> Self {
        TokenFrequency {
            token_count: IndexMap::new(),
            total_token_count: 0,
        }
    }

    /// Count all tokens of every document.
    pub fn from_documents<T>(documents: &[Vec<T>]) -> Self
    where
        T: AsRef<str>,
    {
        let mut freq = Self::new();
        for doc in documents {
            freq.add_tokens(doc);
        }
        freq
    }

    #[inline]
    pub fn add_token(&mut self, token: &str) -> &mut Self {
        if let Some(count) = self.token_count.get_mut(token) {
            *count += 1;
        } else {
            self.token_count.insert(token.to_string(), 1);
        }
        self.total_token_count += 1;
        self
    }

    #[inline]
    pub fn add_tokens<T>(&mut self, tokens: &[T]) -> &mut Self
    where
        T: AsRef<str>,
    {
        for token in tokens {
            self.add_token(token.as_ref());
        }
        self
    }

    /// 条件に基づいて token を削除します
    ///
    /// # Returns
    /// * `u64` - 削除された token の合計数
    pub fn remove_tokens_by_condition<F>(&mut self, condition: F) -> u64
    where
        F: Fn(&str, u64) -> bool,
    {
        let mut removed_total_count: u64 = 0;
        self.token_count.retain(|token, count| {
            if condition(token, *count) {
                removed_total_count += *count;
                false
            } else {
                true
            }
        });
        self.total_token_count -= removed_total_count;
        removed_total_count
    }

    #[inline]
    pub fn clear(&mut self) {
        self.token_count.clear();
        self.total_token_count = 0;
    }
}

/// TokenFrequency の情報を取得するための実装
impl TokenFrequency {
    #[inline]
    pub fn token_count(&self, token: &str) -> u64 {
        self.token_count.get(token).copied().unwrap_or(0)
    }

    /// Sum of all counts.
    #[inline]
    pub fn token_sum(&self) -> u64 {
        self.total_token_count
    }

    /// Number of distinct tokens.
    #[inline]
    pub fn token_num(&self) -> usize {
        self.token_count.len()
    }

    #[inline]
    pub fn contains_token(&self, token: &str) -> bool {
        self.token_count.contains_key(token)
    }

    /// Distinct tokens in first-seen order.
    #[inline]
    pub fn token_set_ref_str(&self) -> Vec<&str> {
        self.token_count.keys().map(|s| s.as_str()).collect()
    }

    /// `(token, count)` in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.token_count.iter().map(|(token, &count)| (token.as_str(), count))
    }

    /// 頻度でソートされたトークンのベクタを取得(降順)
    /// ties keep first-seen order
    pub fn sorted_frequency_vector(&self) -> Vec<(String, u64)> {
        let mut token_list: Vec<(String, u64)> = self
            .token_count
            .iter()
            .map(|(token, &count)| (token.clone(), count))
            .collect();
        token_list.sort_by(|a, b| b.1.cmp(&a.1));
        token_list
    }

    /// Keep, in every document, only tokens whose count here is strictly
    /// greater than `min_count`. Document order and token order are kept.
    pub fn retain_frequent(&self, documents: &[Vec<String>], min_count: u64) -> Vec<Vec<String>> {
        documents
            .iter()
            .map(|doc| {
                doc.iter()
                    .filter(|tok| self.token_count(tok) > min_count)
                    .cloned()
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_lowercases_splits_and_filters() {
        let tokenizer = Tokenizer::default();
        assert_eq!(
            tokenizer.tokenize("Human machine interface for lab abc computer applications"),
            vec!["human", "machine", "interface", "lab", "abc", "computer", "applications"]
        );
        assert_eq!(
            tokenizer.tokenize("  Graph\tminors A\nsurvey "),
            vec!["graph", "minors", "survey"]
        );
        assert!(tokenizer.tokenize("").is_empty());
        assert!(tokenizer.tokenize("the of and").is_empty());
    }

    #[test]
    fn stopwords_are_matched_case_insensitively() {
        let tokenizer = Tokenizer::new(["EPS"]);
        assert_eq!(tokenizer.tokenize("The EPS user"), vec!["the", "user"]);
        assert_eq!(Tokenizer::without_stopwords().tokenize("The a"), vec!["the", "a"]);
    }

    #[test]
    fn token_frequency_counts_collection_frequency() {
        let docs = vec![vec!["a", "b", "a"], vec!["b", "c"]];
        let freq = TokenFrequency::from_documents(&docs);
        assert_eq!(freq.token_count("a"), 2);
        assert_eq!(freq.token_count("b"), 2);
        assert_eq!(freq.token_count("c"), 1);
        assert_eq!(freq.token_count("zzz"), 0);
        assert_eq!(freq.token_sum(), 5);
        assert_eq!(freq.token_num(), 3);
        assert_eq!(freq.token_set_ref_str(), vec!["a", "b", "c"]);
        assert_eq!(freq.sorted_frequency_vector()[2], ("c".to_string(), 1));
    }

    #[test]
    fn retain_frequent_drops_singletons() {
        let tokenizer = Tokenizer::default();
        let texts = tokenizer.tokenize_corpus([
            "Graph minors IV Widths of trees",
            "Graph minors A survey",
            "The intersection graph of paths in trees",
        ]);
        let freq = TokenFrequency::from_documents(&texts);
        let kept = freq.retain_frequent(&texts, 1);
        assert_eq!(
            kept,
            vec![
                vec!["graph", "minors", "trees"],
                vec!["graph", "minors"],
                vec!["graph", "trees"],
            ]
        );
    }

    #[test]
    fn remove_tokens_by_condition_updates_total() {
        let mut freq = TokenFrequency::new();
        freq.add_tokens(&["x", "y", "y", "z"]);
        let removed = freq.remove_tokens_by_condition(|_, count| count < 2);
        assert_eq!(removed, 2);
        assert_eq!(freq.token_sum(), 2);
        assert!(!freq.contains_token("x"));
        freq.clear();
        assert_eq!(freq.token_num(), 0);
    }
}
