use indexmap::IndexMap;

use crate::utils::math::vector::SparseVec;
use crate::vectorizer::dictionary::Dictionary;

/// Bag-of-words encoding against a `Dictionary`.
impl Dictionary {
    /// Count tokens and map them to ids. Unknown tokens are dropped, so a
    /// document without known tokens gives an empty vector.
    pub fn doc2bow<T>(&self, tokens: &[T]) -> SparseVec<u32>
    where
        T: AsRef<str>,
    {
        SparseVec::from_unsorted(
            tokens
                .iter()
                .filter_map(|tok| self.token_to_id(tok.as_ref()))
                .map(|id| (id, 1u32)),
        )
    }

    /// Like `doc2bow`, but unseen tokens are added first (in order of
    /// appearance) and the document is counted into the frequencies.
    pub fn doc2bow_update<T>(&mut self, tokens: &[T]) -> SparseVec<u32>
    where
        T: AsRef<str>,
    {
        // 初出順を保つため IndexMap で数える
        let mut counts: IndexMap<&str, u32> = IndexMap::new();
        for tok in tokens {
            *counts.entry(tok.as_ref()).or_insert(0) += 1;
        }
        let pairs: Vec<(u32, u32)> = counts
            .into_iter()
            .map(|(tok, count)| (self.intern(tok), count))
            .collect();
        self.record_document(&pairs);
        SparseVec::from_unsorted(pairs)
    }

    /// Id of every token in order, `None` for unknown ones.
    pub fn doc2idx<T>(&self, tokens: &[T]) -> Vec<Option<u32>>
    where
        T: AsRef<str>,
    {
        tokens.iter().map(|tok| self.token_to_id(tok.as_ref())).collect()
    }

    /// Expand a bag-of-words vector back into tokens, each repeated by its
    /// count, in id order. Ids unknown to the dictionary are skipped.
    pub fn decode(&self, bow: &SparseVec<u32>) -> Vec<String> {
        let mut tokens = Vec::with_capacity(bow.values().iter().map(|&c| c as usize).sum());
        for (id, count) in bow.raw_iter() {
            if let Some(token) = self.id_to_token(id) {
                tokens.extend(std::iter::repeat(token.to_string()).take(count as usize));
            }
        }
        tokens
    }
}
