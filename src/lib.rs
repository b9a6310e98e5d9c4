/// This crate is a document similarity engine built on sparse TF-IDF vectors.
pub mod config;
pub mod error;
pub mod utils;
pub mod vectorizer;

/// Similarity Pipeline
/// The top-level struct of this crate. It fits every stage over a document
/// collection in one call and answers similarity queries for raw text.
///
/// Internally, it holds:
/// - The tokenizer (lowercase, whitespace split, stopword filter)
/// - The dictionary (token <-> id, document frequencies)
/// - The fitted TF-IDF model
/// - The similarity index over the corpus vectors
///
/// `SimilarityPipeline<E>` takes the TF-IDF weighting engine as its generic
/// parameter (`DefaultTfidfEngine` unless given).
///
/// A fitted pipeline is never mutated, so it can be shared between threads
/// and queried concurrently.
///
/// # Serialization
/// Supported, see `CborPersist`.
pub use vectorizer::SimilarityPipeline;

/// Tokenizer
/// Lowercases a document, splits it on whitespace and removes stopwords.
/// Stopwords are lowercased when the tokenizer is built.
pub use vectorizer::token::Tokenizer;

/// Token Frequency structure
/// Counts token occurrences over a set of tokenized documents.
/// It manages:
/// - The count of occurrences of each token
/// - The total number of tokens seen
///
/// Used to drop rare tokens before the dictionary is built.
pub use vectorizer::token::TokenFrequency;

/// Dictionary
/// Bijective mapping between tokens and integer ids, plus per-token document
/// and collection frequencies.
///
/// Ids are handed out in order of first appearance. The dictionary can be
/// pruned (`filter_extremes`, `filter_tokens`), renumbered (`compactify`) and
/// merged with another dictionary (`merge_with`).
///
/// Bag-of-words encoding (`doc2bow`, `doc2bow_update`, `doc2idx`, `decode`)
/// is implemented on it.
pub use vectorizer::dictionary::{Dictionary, TokenStats};

/// Corpus and streaming corpus
/// - `Corpus`: ordered collection of sparse document vectors
/// - `BowStream`: lazy, restartable bag-of-words view over a `DocumentSource`
/// - `FileSource` / `MemorySource`: documents from a file (one per line) or memory
pub use vectorizer::corpus::{build_dictionary, BowStream, Corpus, DocumentSource, FileSource, MemorySource};

/// TF IDF Calculation Engine Trait
/// A trait that defines the behavior of a TF-IDF calculation engine.
///
/// By implementing this trait, you can plug different TF-IDF calculation strategies
/// into `TfidfModel<E>`.
/// - `DefaultTfidfEngine`: tf = count, idf = log_b(N / df)
/// - `SublinearTfidfEngine`: tf = 1 + log_b(count), same idf
pub use vectorizer::tfidf::{DefaultTfidfEngine, SublinearTfidfEngine, TfidfEngine, TfidfModel};

/// Similarity Index
/// Stores unit length document vectors and scores a query vector against all
/// of them (cosine similarity), in corpus order.
pub use vectorizer::evaluate::scoring::SimilarityIndex;

/// Search Hits
/// Data structures for managing search results.
/// - `Hits`: holds a list of `(document, score)` and sorts it by score (stable)
/// - `rank`: sorts scores into `Hits`, best first
pub use vectorizer::evaluate::scoring::{rank, Hits};

/// CBOR persistence for the fitted structures
pub use vectorizer::serde::CborPersist;

/// Sparse vector with strictly increasing ids and no stored zeros
pub use utils::math::vector::SparseVec;

pub use config::{FilterConfig, Normalization, PipelineConfig, TfidfConfig};
pub use error::{Error, Result};
