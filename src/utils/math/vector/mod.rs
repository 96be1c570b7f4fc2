use std::fmt::Debug;
use std::cmp::Ordering;

use num::Num;
use serde::{Deserialize, Serialize};

/// SpVec is a sparse vector that treats zero elements as absent.
/// Holds indices and values as two parallel arrays (SoA).
///
/// Indices are guaranteed to be sorted ascending and unique,
/// which is what the merge-join in `dot` relies on.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct SpVec<N = f64>
where
    N: Num + Copy,
{
    ind: Vec<u32>,
    val: Vec<N>,
    /// logical dimension
    len: u32,
}

impl<N> SpVec<N>
where
    N: Num + Copy + Into<f64>,
{
    /// Create a zero vector of the given dimension
    #[inline]
    pub fn zeros(len: u32) -> Self {
        Self {
            ind: Vec::new(),
            val: Vec::new(),
            len,
        }
    }

    /// Build from (index, value) pairs
    /// Pairs may be unsorted. Zero values are skipped and duplicate indices are summed.
    pub fn from_pairs(len: u32, mut pairs: Vec<(u32, N)>) -> Self {
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        let mut ind: Vec<u32> = Vec::with_capacity(pairs.len());
        let mut val: Vec<N> = Vec::with_capacity(pairs.len());
        for (i, v) in pairs {
            debug_assert!(i < len, "index {i} out of range for len {len}");
            match ind.last() {
                Some(&last) if last == i => {
                    if let Some(tail) = val.last_mut() {
                        *tail = *tail + v;
                    }
                }
                _ => {
                    ind.push(i);
                    val.push(v);
                }
            }
        }
        // 足し合わせで 0 になった要素を落とす
        let mut out_ind = Vec::with_capacity(ind.len());
        let mut out_val = Vec::with_capacity(val.len());
        for (i, v) in ind.into_iter().zip(val) {
            if v != N::zero() {
                out_ind.push(i);
                out_val.push(v);
            }
        }
        Self { ind: out_ind, val: out_val, len }
    }

    /// Build from a dense slice
    pub fn from_dense(dense: &[N]) -> Self {
        let mut ind = Vec::new();
        let mut val = Vec::new();
        for (i, v) in dense.iter().enumerate() {
            if *v != N::zero() {
                ind.push(i as u32);
                val.push(*v);
            }
        }
        Self { ind, val, len: dense.len() as u32 }
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.len
    }

    /// number of non-zero elements
    #[inline]
    pub fn nnz(&self) -> usize {
        self.ind.len()
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.ind.is_empty()
    }

    /// Get the value at `index`, zero if absent
    pub fn get(&self, index: u32) -> N {
        match self.ind.binary_search(&index) {
            Ok(pos) => self.val[pos],
            Err(_) => N::zero(),
        }
    }

    /// Iterate over non-zero elements as (index, value), ascending by index
    #[inline]
    pub fn raw_iter(&self) -> impl Iterator<Item = (u32, N)> + '_ {
        self.ind.iter().copied().zip(self.val.iter().copied())
    }

    /// Dot product by merge-join over the sorted indices
    pub fn dot(&self, other: &SpVec<N>) -> f64 {
        let mut a = 0usize;
        let mut b = 0usize;
        let mut acc = 0.0f64;
        while a < self.ind.len() && b < other.ind.len() {
            match self.ind[a].cmp(&other.ind[b]) {
                Ordering::Equal => {
                    acc += self.val[a].into() * other.val[b].into();
                    a += 1;
                    b += 1;
                }
                Ordering::Less => a += 1,
                Ordering::Greater => b += 1,
            }
        }
        acc
    }

    /// L2 norm
    #[inline]
    pub fn norm(&self) -> f64 {
        self.val
            .iter()
            .map(|v| {
                let x: f64 = (*v).into();
                x * x
            })
            .sum::<f64>()
            .sqrt()
    }

    pub fn to_dense(&self) -> Vec<N> {
        let mut dense = vec![N::zero(); self.len as usize];
        for (i, v) in self.raw_iter() {
            dense[i as usize] = v;
        }
        dense
    }
}

impl SpVec<f64> {
    /// L2 normalize in place. A zero vector stays zero.
    pub fn normalize(&mut self) -> &mut Self {
        let norm = self.norm();
        if norm > 0.0 && norm.is_finite() {
            self.val.iter_mut().for_each(|v| *v /= norm);
        }
        self
    }
}

impl<N> Debug for SpVec<N>
where
    N: Num + Copy + Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if f.alternate() {
            writeln!(f, "SpVec(len: {}, nnz: {}) [", self.len, self.ind.len())?;
            for (i, v) in self.ind.iter().zip(self.val.iter()) {
                writeln!(f, "    {}: {:?}", i, v)?;
            }
            write!(f, "]")
        } else {
            f.debug_struct("SpVec")
                .field("len", &self.len)
                .field("ind", &self.ind)
                .field("val", &self.val)
                .finish()
        }
    }
}
