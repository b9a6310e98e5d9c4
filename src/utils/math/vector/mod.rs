pub mod math;
pub mod serde;

use std::fmt::{self, Debug};

use num::Num;

use crate::utils::sort::{merge_sorted_u32_soa, radix_sort_u32_soa};

/// SparseVec は 0 要素を省いた疎ベクトル
/// inds と vals を持ち
/// inds は要素の id を、vals は要素の値を保持します
///
/// 要素は inds の昇順で並び、重複 id と 0 値は存在しないことを保証します
#[derive(Clone, PartialEq, Default)]
pub struct SparseVec<N>
where
    N: Num,
{
    inds: Vec<u32>,
    vals: Vec<N>,
}

impl<N> SparseVec<N>
where
    N: Num + Copy,
{
    #[inline]
    pub fn new() -> Self {
        SparseVec {
            inds: Vec::new(),
            vals: Vec::new(),
        }
    }

    #[inline]
    pub fn with_capacity(cap: usize) -> Self {
        SparseVec {
            inds: Vec::with_capacity(cap),
            vals: Vec::with_capacity(cap),
        }
    }

    /// Build from `(id, value)` pairs in any order.
    /// Duplicate ids are summed, zero values are dropped.
    pub fn from_unsorted<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (u32, N)>,
    {
        let (mut inds, mut vals): (Vec<u32>, Vec<N>) = pairs.into_iter().unzip();
        radix_sort_u32_soa(&mut inds, &mut vals);
        merge_sorted_u32_soa(&mut inds, &mut vals);
        SparseVec { inds, vals }
    }

    /// Append an entry past the current last id.
    /// Zero values are skipped. Returns `false` if `id` would break ordering.
    #[inline]
    pub fn push(&mut self, id: u32, value: N) -> bool {
        if let Some(&last) = self.inds.last() {
            if id <= last {
                return false;
            }
        }
        if value != N::zero() {
            self.inds.push(id);
            self.vals.push(value);
        }
        true
    }

    /// Number of stored (non-zero) entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.inds.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inds.is_empty()
    }

    /// Value stored for `id`, `None` when the entry is implicit zero.
    #[inline]
    pub fn get(&self, id: u32) -> Option<N> {
        self.inds.binary_search(&id).ok().map(|pos| self.vals[pos])
    }

    #[inline]
    pub fn contains_id(&self, id: u32) -> bool {
        self.inds.binary_search(&id).is_ok()
    }

    #[inline]
    pub fn ids(&self) -> &[u32] {
        &self.inds
    }

    #[inline]
    pub fn values(&self) -> &[N] {
        &self.vals
    }

    /// Highest stored id.
    #[inline]
    pub fn max_id(&self) -> Option<u32> {
        self.inds.last().copied()
    }

    /// Iterate `(id, value)` pairs in ascending id order.
    #[inline]
    pub fn raw_iter(&self) -> impl Iterator<Item = (u32, N)> + '_ {
        self.inds.iter().copied().zip(self.vals.iter().copied())
    }

    /// Map every value, keeping ids. Entries mapped to zero are dropped.
    pub fn map_values<M, F>(&self, mut f: F) -> SparseVec<M>
    where
        M: Num + Copy,
        F: FnMut(u32, N) -> M,
    {
        let mut out = SparseVec::with_capacity(self.nnz());
        for (id, val) in self.raw_iter() {
            let mapped = f(id, val);
            if mapped != M::zero() {
                out.inds.push(id);
                out.vals.push(mapped);
            }
        }
        out
    }

    /// Keep only entries for which `pred` holds.
    pub fn retain<F>(&mut self, mut pred: F)
    where
        F: FnMut(u32, N) -> bool,
    {
        let mut write = 0usize;
        for read in 0..self.inds.len() {
            let (id, val) = (self.inds[read], self.vals[read]);
            if pred(id, val) {
                self.inds[write] = id;
                self.vals[write] = val;
                write += 1;
            }
        }
        self.inds.truncate(write);
        self.vals.truncate(write);
    }

    pub fn into_pairs(self) -> Vec<(u32, N)> {
        self.inds.into_iter().zip(self.vals).collect()
    }

    /// Build from parts that already satisfy the ordering invariant.
    #[inline]
    pub(crate) fn from_parts_unchecked(inds: Vec<u32>, vals: Vec<N>) -> Self {
        debug_assert_eq!(inds.len(), vals.len());
        debug_assert!(inds.windows(2).all(|w| w[0] < w[1]));
        SparseVec { inds, vals }
    }
}

impl<N> FromIterator<(u32, N)> for SparseVec<N>
where
    N: Num + Copy,
{
    fn from_iter<T: IntoIterator<Item = (u32, N)>>(iter: T) -> Self {
        SparseVec::from_unsorted(iter)
    }
}

impl<N> Debug for SparseVec<N>
where
    N: Num + Copy + Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            write!(f, "SparseVec(nnz={}) ", self.nnz())?;
        }
        f.debug_list().entries(self.raw_iter()).finish()
    }
}
