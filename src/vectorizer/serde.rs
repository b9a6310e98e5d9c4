use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use num::Num;
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::vectorizer::{
    corpus::Corpus, dictionary::Dictionary, evaluate::scoring::SimilarityIndex, tfidf::{TfidfEngine, TfidfModel},
    SimilarityPipeline,
};

/// CBOR での保存と読み込み
///
/// Loading what was saved gives back an equal value; a loaded model or index
/// answers queries exactly like the saved one.
pub trait CborPersist: Serialize + DeserializeOwned {
    fn save_cbor<W: Write>(&self, writer: W) -> Result<()> {
        serde_cbor::to_writer(writer, self)?;
        Ok(())
    }

    fn load_cbor<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_cbor::from_reader(reader)?)
    }

    /// Write to `path`, replacing an existing file.
    fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        self.save_cbor(&mut writer)?;
        writer.flush()?;
        debug!(path = %path.display(), "saved");
        Ok(())
    }

    fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading");
        Self::load_cbor(BufReader::new(File::open(path)?))
    }
}

impl CborPersist for Dictionary {}

impl CborPersist for SimilarityIndex {}

impl<N> CborPersist for Corpus<N> where N: Num + Copy + Serialize + DeserializeOwned {}

impl<E> CborPersist for TfidfModel<E> where E: TfidfEngine {}

impl<E> CborPersist for SimilarityPipeline<E> where E: TfidfEngine {}
