use std::{cmp::Ordering, ops::AddAssign};

use num::Num;

use crate::config::Normalization;

use super::SparseVec;

impl<N> SparseVec<N>
where
    N: Num + Copy,
{
    /// ドット積を計算するメソッド
    /// ids present in only one operand contribute nothing
    ///
    /// # Arguments
    /// * `other` - 他のベクトル
    ///
    /// # Returns
    /// * `R` - ドット積の結果
    #[inline]
    pub fn dot<R>(&self, other: &Self) -> R
    where
        R: Num + AddAssign,
        N: Into<R>,
    {
        let mut result = R::zero();
        let (self_inds, self_vals) = (self.ids(), self.values());
        let (other_inds, other_vals) = (other.ids(), other.values());
        if self_inds.is_empty() || other_inds.is_empty() {
            return result;
        }

        let mut i = 0;
        let mut j = 0;
        while i < self_inds.len() && j < other_inds.len() {
            match self_inds[i].cmp(&other_inds[j]) {
                Ordering::Equal => {
                    result += self_vals[i].into() * other_vals[j].into();
                    i += 1;
                    j += 1;
                }
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
            }
        }
        result
    }

    #[inline]
    pub fn norm_sq<R>(&self) -> R
    where
        R: Num + AddAssign + Copy,
        N: Into<R>,
    {
        let mut result = R::zero();
        for &val in self.values() {
            let val: R = val.into();
            result += val * val;
        }
        result
    }
}

impl<N> SparseVec<N>
where
    N: Num + Copy + Into<f64>,
{
    /// cosθ = A・B / (|A||B|)
    /// A zero vector on either side scores 0.0.
    pub fn cosine_similarity(&self, other: &Self) -> f64 {
        let dot: f64 = self.dot(other);
        let norm = self.norm_sq::<f64>().sqrt() * other.norm_sq::<f64>().sqrt();
        if norm == 0.0 {
            return 0.0;
        }
        dot / norm
    }
}

impl SparseVec<f64> {
    /// Scale the vector according to `normalization`.
    /// A vector with zero norm comes back empty.
    pub fn normalized(mut self, normalization: Normalization) -> Self {
        let norm = match normalization {
            Normalization::None => return self,
            Normalization::L1 => self.values().iter().map(|v| v.abs()).sum::<f64>(),
            Normalization::L2 => self.norm_sq::<f64>().sqrt(),
        };
        if norm == 0.0 || !norm.is_finite() {
            return SparseVec::new();
        }
        self.retain(|_, v| v / norm != 0.0);
        let (inds, vals): (Vec<u32>, Vec<f64>) = self.raw_iter().map(|(id, v)| (id, v / norm)).unzip();
        SparseVec::from_parts_unchecked(inds, vals)
    }
}
