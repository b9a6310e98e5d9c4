use thiserror::Error;

/// Errors produced while fitting, querying or persisting the engine.
///
/// Unknown tokens, empty documents and empty corpora are not errors; they
/// yield empty structures instead.
#[derive(Debug, Error)]
pub enum Error {
    /// A token id reached idf computation with a document frequency of zero.
    /// Cannot happen for ids taken from the fitted corpus, so this marks a
    /// dictionary and corpus that disagree with each other.
    #[error("token id {id} has zero document frequency")]
    ZeroDocumentFrequency { id: u32 },

    /// The dictionary and the corpus passed to a fit count different numbers
    /// of documents.
    #[error("dictionary counts {dictionary_docs} documents but the corpus has {corpus_docs}")]
    CorpusMismatch { corpus_docs: u64, dictionary_docs: u64 },

    /// A token id was reported in more documents than were fitted.
    #[error("token id {id} has document frequency {doc_freq} over only {num_docs} documents")]
    InconsistentDocumentFrequency { id: u32, doc_freq: u64, num_docs: u64 },

    /// A corpus vector references an id outside the index feature space.
    #[error("token id {id} is outside the feature space of {num_features} features")]
    DimensionMismatch { id: u32, num_features: usize },

    /// Rejected configuration value.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Loaded data breaks an invariant of the structure it describes.
    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cbor error: {0}")]
    Cbor(#[from] serde_cbor::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
