use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use num::Num;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::utils::math::vector::SparseVec;
use crate::vectorizer::dictionary::Dictionary;
use crate::vectorizer::token::Tokenizer;

/// Ordered collection of sparse document vectors.
/// The position of a vector is its document index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Corpus<N = u32>
where
    N: Num + Copy,
{
    documents: Vec<SparseVec<N>>,
}

impl<N> Corpus<N>
where
    N: Num + Copy,
{
    pub fn new() -> Self {
        Self {
            documents: Vec::new(),
        }
    }

    pub fn from_vec(documents: Vec<SparseVec<N>>) -> Self {
        Self { documents }
    }

    /// Append a document, returning its index.
    pub fn push(&mut self, doc: SparseVec<N>) -> usize {
        self.documents.push(doc);
        self.documents.len() - 1
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
    pub fn get(&self, index: usize) -> Option<&SparseVec<N>> {
        self.documents.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SparseVec<N>> {
        self.documents.iter()
    }

    #[inline]
    pub fn as_slice(&self) -> &[SparseVec<N>] {
        &self.documents
    }

    pub fn into_inner(self) -> Vec<SparseVec<N>> {
        self.documents
    }

    /// Total stored entries over all documents.
    pub fn num_nnz(&self) -> usize {
        self.documents.iter().map(SparseVec::nnz).sum()
    }

    /// One past the highest id referenced by any document.
    pub fn num_terms(&self) -> usize {
        self.documents
            .iter()
            .filter_map(SparseVec::max_id)
            .max()
            .map_or(0, |id| id as usize + 1)
    }
}

impl Corpus<u32> {
    /// Encode tokenized documents with `dictionary`.
    pub fn from_token_documents<T>(dictionary: &Dictionary, documents: &[Vec<T>]) -> Self
    where
        T: AsRef<str>,
    {
        Self::from_vec(documents.iter().map(|doc| dictionary.doc2bow(doc)).collect())
    }
}

impl<'a, N> IntoIterator for &'a Corpus<N>
where
    N: Num + Copy,
{
    type Item = &'a SparseVec<N>;
    type IntoIter = std::slice::Iter<'a, SparseVec<N>>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.iter()
    }
}

/// Restartable supply of raw documents, one string per document.
/// Every `open` call starts a fresh pass from the first document.
pub trait DocumentSource {
    type Docs<'a>: Iterator<Item = Result<String>>
    where
        Self: 'a;

    fn open(&self) -> Result<Self::Docs<'_>>;
}

/// Documents read line by line from a text file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

pub struct FileLines {
    lines: Lines<BufReader<File>>,
}

impl Iterator for FileLines {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.lines.next().map(|line| line.map_err(Into::into))
    }
}

impl DocumentSource for FileSource {
    type Docs<'a> = FileLines where Self: 'a;

    fn open(&self) -> Result<FileLines> {
        debug!(path = %self.path.display(), "opening document file");
        let file = File::open(&self.path)?;
        Ok(FileLines {
            lines: BufReader::new(file).lines(),
        })
    }
}

/// Documents held in memory.
#[derive(Debug, Clone)]
pub struct MemorySource<S> {
    documents: Vec<S>,
}

impl<S> MemorySource<S>
where
    S: AsRef<str>,
{
    pub fn new(documents: Vec<S>) -> Self {
        Self { documents }
    }
}

pub struct MemoryDocs<'a, S> {
    inner: std::slice::Iter<'a, S>,
}

impl<'a, S> Iterator for MemoryDocs<'a, S>
where
    S: AsRef<str>,
{
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|doc| Ok(doc.as_ref().to_string()))
    }
}

impl<S> DocumentSource for MemorySource<S>
where
    S: AsRef<str>,
{
    type Docs<'a> = MemoryDocs<'a, S> where Self: 'a;

    fn open(&self) -> Result<MemoryDocs<'_, S>> {
        Ok(MemoryDocs {
            inner: self.documents.iter(),
        })
    }
}

/// Build a dictionary in one pass over `source` without keeping the
/// documents around.
pub fn build_dictionary<S>(source: &S, tokenizer: &Tokenizer) -> Result<Dictionary>
where
    S: DocumentSource,
{
    let mut dictionary = Dictionary::new();
    for doc in source.open()? {
        let tokens = tokenizer.tokenize(&doc?);
        dictionary.doc2bow_update(&tokens);
    }
    info!("built {} from {} documents", dictionary, dictionary.num_docs());
    Ok(dictionary)
}

/// Lazy bag-of-words corpus.
///
/// Each `iter` call re-opens the source and encodes documents on demand, so
/// the corpus is never materialized and can be walked any number of times.
pub struct BowStream<'d, S>
where
    S: DocumentSource,
{
    dictionary: &'d Dictionary,
    tokenizer: &'d Tokenizer,
    source: S,
}

impl<'d, S> BowStream<'d, S>
where
    S: DocumentSource,
{
    pub fn new(dictionary: &'d Dictionary, tokenizer: &'d Tokenizer, source: S) -> Self {
        Self {
            dictionary,
            tokenizer,
            source,
        }
    }

    /// Start a new pass.
    pub fn iter(&self) -> Result<impl Iterator<Item = Result<SparseVec<u32>>> + '_> {
        let docs = self.source.open()?;
        Ok(docs.map(move |doc| {
            let tokens = self.tokenizer.tokenize(&doc?);
            Ok(self.dictionary.doc2bow(&tokens))
        }))
    }

    /// Materialize one pass into a `Corpus`.
    pub fn collect_corpus(&self) -> Result<Corpus<u32>> {
        let documents = self.iter()?.collect::<Result<Vec<_>>>()?;
        Ok(Corpus::from_vec(documents))
    }
}

impl<'d> BowStream<'d, FileSource> {
    /// Stream the lines of a text file, one document per line.
    pub fn from_path<P: AsRef<Path>>(dictionary: &'d Dictionary, tokenizer: &'d Tokenizer, path: P) -> Self {
        BowStream::new(dictionary, tokenizer, FileSource::new(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::vectorizer::tfidf::TfidfModel;
    use crate::config::TfidfConfig;
    use std::io::Write;

    const DOCS: [&str; 4] = [
        "Human machine interface for lab abc computer applications",
        "A survey of user opinion of computer system response time",
        "The EPS user interface management system",
        "System and human system engineering testing of EPS",
    ];

    #[test]
    fn corpus_tracks_sizes() {
        let mut corpus: Corpus = Corpus::new();
        assert!(corpus.is_empty());
        assert_eq!(corpus.num_terms(), 0);
        corpus.push(SparseVec::from_unsorted(vec![(0u32, 1u32), (4, 2)]));
        let idx = corpus.push(SparseVec::new());
        assert_eq!(idx, 1);
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.num_nnz(), 2);
        assert_eq!(corpus.num_terms(), 5);
        assert!(corpus.get(1).unwrap().is_empty());
    }

    #[test]
    fn stream_is_restartable_and_matches_eager_encoding() {
        let tokenizer = Tokenizer::default();
        let source = MemorySource::new(DOCS.to_vec());
        let dictionary = build_dictionary(&source, &tokenizer).unwrap();
        assert_eq!(dictionary.num_docs(), 4);

        let stream = BowStream::new(&dictionary, &tokenizer, source);
        let first = stream.collect_corpus().unwrap();
        let second = stream.collect_corpus().unwrap();
        assert_eq!(first, second);

        let eager = Corpus::from_token_documents(&dictionary, &tokenizer.tokenize_corpus(DOCS));
        assert_eq!(first, eager);
    }

    #[test]
    fn stream_feeds_tfidf_fit_without_materializing() {
        let tokenizer = Tokenizer::default();
        let source = MemorySource::new(DOCS.to_vec());
        let dictionary = build_dictionary(&source, &tokenizer).unwrap();
        let stream = BowStream::new(&dictionary, &tokenizer, source);

        let streamed: TfidfModel = TfidfModel::try_fit_corpus(stream.iter().unwrap(), TfidfConfig::default()).unwrap();
        let corpus = stream.collect_corpus().unwrap();
        let eager: TfidfModel = TfidfModel::fit(corpus.as_slice(), &dictionary, TfidfConfig::default()).unwrap();
        assert_eq!(streamed.idfs().collect::<Vec<_>>(), eager.idfs().collect::<Vec<_>>());
    }

    #[test]
    fn file_stream_reads_lines() {
        let path = std::env::temp_dir().join(format!("tfidf-similarity-stream-{}.txt", std::process::id()));
        {
            let mut file = File::create(&path).unwrap();
            for doc in DOCS {
                writeln!(file, "{doc}").unwrap();
            }
        }
        let tokenizer = Tokenizer::default();
        let dictionary = build_dictionary(&FileSource::new(&path), &tokenizer).unwrap();
        let stream = BowStream::from_path(&dictionary, &tokenizer, &path);
        assert_eq!(stream.iter().unwrap().count(), 4);
        assert_eq!(stream.collect_corpus().unwrap().len(), 4);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let tokenizer = Tokenizer::default();
        let dictionary = Dictionary::new();
        let stream = BowStream::from_path(&dictionary, &tokenizer, "/nonexistent/tfidf-similarity/docs.txt");
        assert!(matches!(stream.iter().err(), Some(Error::Io(_))));
    }
}
