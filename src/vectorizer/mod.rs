pub mod bow;
pub mod corpus;
pub mod dictionary;
pub mod evaluate;
pub mod serde;
pub mod tfidf;
pub mod token;

use ::serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{FilterConfig, PipelineConfig};
use crate::error::Result;
use crate::utils::math::vector::SparseVec;
use crate::vectorizer::{
    corpus::Corpus,
    dictionary::Dictionary,
    evaluate::scoring::{rank, Hits, SimilarityIndex},
    tfidf::{DefaultTfidfEngine, TfidfEngine, TfidfModel},
    token::{TokenFrequency, Tokenizer},
};

/// Fitted tokenizer, dictionary, TF-IDF model and similarity index.
///
/// Built once by `fit` and read-only afterwards, so a pipeline can be shared
/// between threads and queried concurrently. Query text goes through the
/// same tokenizer, dictionary and model as the corpus did.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
pub struct SimilarityPipeline<E = DefaultTfidfEngine>
where
    E: TfidfEngine,
{
    tokenizer: Tokenizer,
    dictionary: Dictionary,
    model: TfidfModel<E>,
    index: SimilarityIndex,
}

impl<E> SimilarityPipeline<E>
where
    E: TfidfEngine,
{
    /// Fit every stage over `documents`. Document `i` of the input is
    /// document `i` of every query result.
    ///
    /// Steps: tokenize, drop rare tokens (`min_token_count`), build the
    /// dictionary, prune it (`filter`), encode, fit TF-IDF, index.
    pub fn fit<I, S>(documents: I, config: &PipelineConfig) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        config.validate()?;
        let tokenizer = Tokenizer::new(&config.stopwords);

        let mut texts = tokenizer.tokenize_corpus(documents);
        debug!(documents = texts.len(), "tokenized corpus");
        if config.min_token_count > 0 {
            let frequency = TokenFrequency::from_documents(&texts);
            texts = frequency.retain_frequent(&texts, config.min_token_count);
            debug!(min_token_count = config.min_token_count, "removed rare tokens");
        }

        let mut dictionary = Dictionary::from_documents(&texts);
        if config.filter != FilterConfig::default() {
            dictionary.filter_extremes(&config.filter);
        }

        let corpus = Corpus::from_token_documents(&dictionary, &texts);
        let model = TfidfModel::fit(corpus.as_slice(), &dictionary, config.tfidf.clone())?;
        let index = SimilarityIndex::build(model.transform_corpus(corpus.as_slice()), dictionary.id_bound() as usize)?;
        info!(
            "fitted pipeline over {} documents with {} features",
            index.len(),
            index.num_features()
        );

        Ok(Self {
            tokenizer,
            dictionary,
            model,
            index,
        })
    }

    /// Bag-of-words of `text`. Unknown tokens are dropped.
    pub fn bow(&self, text: &str) -> SparseVec<u32> {
        self.dictionary.doc2bow(&self.tokenizer.tokenize(text))
    }

    /// TF-IDF vector of `text`.
    pub fn vectorize(&self, text: &str) -> SparseVec<f64> {
        self.model.transform(&self.bow(text))
    }

    /// Similarity of `text` to every document, in corpus order.
    pub fn query(&self, text: &str) -> Vec<(usize, f64)> {
        self.index.query(&self.vectorize(text))
    }

    /// Every document ranked by similarity to `text`, best first.
    pub fn rank(&self, text: &str) -> Hits<usize> {
        rank(self.query(text))
    }

    /// The `n` documents most similar to `text`.
    pub fn rank_top(&self, text: &str, n: usize) -> Hits<usize> {
        self.index.query_top(&self.vectorize(text), n)
    }

    #[inline]
    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    #[inline]
    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    #[inline]
    pub fn model(&self) -> &TfidfModel<E> {
        &self.model
    }

    #[inline]
    pub fn index(&self) -> &SimilarityIndex {
        &self.index
    }

    /// Number of indexed documents
    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectorizer::tfidf::SublinearTfidfEngine;

    const TUTORIAL: [&str; 9] = [
        "Human machine interface for lab abc computer applications",
        "A survey of user opinion of computer system response time",
        "The EPS user interface management system",
        "System and human system engineering testing of EPS",
        "Relation of user perceived response time to error measurement",
        "The generation of random binary unordered trees",
        "The intersection graph of paths in trees",
        "Graph minors IV Widths of trees and well quasi ordering",
        "Graph minors A survey",
    ];

    fn no_stopwords() -> PipelineConfig {
        PipelineConfig {
            stopwords: Vec::new(),
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn small_corpus_end_to_end() {
        let docs = ["human machine interface", "human computer interaction", "computer interaction"];
        let pipeline: SimilarityPipeline = SimilarityPipeline::fit(docs, &no_stopwords()).unwrap();

        let ids: Vec<(&str, u32)> = pipeline.dictionary().token2id().collect();
        assert_eq!(
            ids,
            vec![("human", 0), ("machine", 1), ("interface", 2), ("computer", 3), ("interaction", 4)]
        );

        let scores = pipeline.query("human computer");
        assert_eq!(scores.len(), 3);
        assert!((scores[0].1 - 0.1786).abs() < 1e-3);
        assert!((scores[1].1 - 2.0 / 6f64.sqrt()).abs() < 1e-9);
        assert!((scores[2].1 - 0.5).abs() < 1e-9);

        let ranked = pipeline.rank("human computer");
        assert_eq!(ranked.keys().copied().collect::<Vec<_>>(), vec![1, 2, 0]);
    }

    #[test]
    fn tutorial_corpus_keeps_twelve_tokens() {
        let config = PipelineConfig {
            min_token_count: 1,
            ..PipelineConfig::default()
        };
        let pipeline: SimilarityPipeline = SimilarityPipeline::fit(TUTORIAL, &config).unwrap();
        let dictionary = pipeline.dictionary();
        assert_eq!(dictionary.len(), 12);
        assert_eq!(dictionary.token_to_id("human"), Some(0));
        assert_eq!(dictionary.token_to_id("minors"), Some(11));
        assert_eq!(dictionary.token_to_id("engineering"), None);
        assert_eq!(pipeline.index().num_features(), 12);

        // unknown "interaction" is ignored
        let top = pipeline.rank_top("Human computer interaction", 1);
        assert_eq!(top.list[0].0, 0);
        assert!((top.list[0].1 - 2.0 / 6f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn every_document_matches_itself_best() {
        let pipeline: SimilarityPipeline = SimilarityPipeline::fit(TUTORIAL, &PipelineConfig::default()).unwrap();
        for (i, doc) in TUTORIAL.iter().enumerate() {
            let scores = pipeline.query(doc);
            assert!((scores[i].1 - 1.0).abs() < 1e-9, "document {i}");
            assert!(scores.iter().all(|(_, s)| *s <= scores[i].1 + 1e-9));
        }
    }

    #[test]
    fn unknown_or_empty_query_scores_zero() {
        let pipeline: SimilarityPipeline = SimilarityPipeline::fit(TUTORIAL, &PipelineConfig::default()).unwrap();
        for text in ["", "the of and", "completely unseen words"] {
            assert!(pipeline.vectorize(text).is_empty());
            assert!(pipeline.query(text).iter().all(|(_, s)| *s == 0.0));
        }
        // ties keep document order
        let ranked = pipeline.rank("");
        assert_eq!(ranked.keys().copied().collect::<Vec<_>>(), (0..TUTORIAL.len()).collect::<Vec<_>>());
    }

    #[test]
    fn empty_corpus_is_not_an_error() {
        let pipeline: SimilarityPipeline = SimilarityPipeline::fit(Vec::<String>::new(), &PipelineConfig::default()).unwrap();
        assert!(pipeline.is_empty());
        assert!(pipeline.query("anything").is_empty());
    }

    #[test]
    fn filter_prunes_dictionary_before_indexing() {
        let config = PipelineConfig {
            filter: FilterConfig {
                no_below: 2,
                no_above: 0.5,
                keep_n: None,
            },
            ..PipelineConfig::default()
        };
        let pipeline: SimilarityPipeline = SimilarityPipeline::fit(TUTORIAL, &config).unwrap();
        let dictionary = pipeline.dictionary();
        assert!(dictionary.is_compact());
        assert!(dictionary.iter().all(|(_, stats)| stats.doc_freq >= 2 && stats.doc_freq <= 4));
        assert_eq!(pipeline.index().num_features(), dictionary.len());
    }

    #[test]
    fn sublinear_engine_plugs_in() {
        let pipeline: SimilarityPipeline<SublinearTfidfEngine> =
            SimilarityPipeline::fit(TUTORIAL, &PipelineConfig::default()).unwrap();
        let ranked = pipeline.rank("graph minors trees");
        assert_eq!(ranked.keys().take(2).copied().collect::<Vec<_>>(), vec![8, 7]);
    }
}
