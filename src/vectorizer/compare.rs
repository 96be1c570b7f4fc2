use num::Num;
use rayon::prelude::*;

use crate::utils::{math::vector::SpVec, scaler::min_max_scale};

/// コサイン類似度
/// cos(θ) = Σ(a_i * b_i) / (||a|| * ||b||)
///
/// Zero vectors have no direction, so any comparison with one scores 0.
pub fn cosine_similarity<N>(vec: &SpVec<N>, other: &SpVec<N>) -> f64
where
    N: Num + Copy + Into<f64>,
{
    let norm_a = vec.norm();
    let norm_b = other.norm();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (vec.dot(other) / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

/// Batch-relative similarity
///
/// For each reference vector, cosine against every query, then min-max rescaled
/// across the queries. Row `r` is the rescaled scores of all queries against
/// `references[r]`, so values are only comparable within a row.
///
/// # Arguments
/// * `queries` - the batch being ranked
/// * `references` - profile vectors
///
/// # Returns
/// * `Vec<Vec<f64>>` - `references.len()` rows of `queries.len()` scores in [0, 1]
pub fn similarity_matrix<N>(queries: &[SpVec<N>], references: &[SpVec<N>]) -> Vec<Vec<f64>>
where
    N: Num + Copy + Into<f64> + Send + Sync,
{
    references
        .par_iter()
        .map(|reference| {
            let raw: Vec<f64> = queries
                .iter()
                .map(|q| cosine_similarity(reference, q))
                .collect();
            min_max_scale(&raw)
        })
        .collect()
}

/// Single-reference convenience over `similarity_matrix`
pub fn similarity_scores<N>(queries: &[SpVec<N>], reference: &SpVec<N>) -> Vec<f64>
where
    N: Num + Copy + Into<f64> + Send + Sync,
{
    similarity_matrix(queries, std::slice::from_ref(reference))
        .pop()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_basics() {
        let a = SpVec::from_dense(&[1.0, 0.0, 1.0]);
        let b = SpVec::from_dense(&[1.0, 0.0, 1.0]);
        let c = SpVec::from_dense(&[0.0, 1.0, 0.0]);
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-12);
        assert_eq!(cosine_similarity(&a, &c), 0.0);
        let z: SpVec = SpVec::zeros(3);
        assert_eq!(cosine_similarity(&a, &z), 0.0);
    }

    #[test]
    fn rows_are_rescaled_per_reference() {
        let reference = SpVec::from_dense(&[1.0, 0.0]);
        let queries = vec![
            SpVec::from_dense(&[1.0, 0.0]),
            SpVec::from_dense(&[1.0, 1.0]),
            SpVec::from_dense(&[0.0, 1.0]),
        ];
        let m = similarity_matrix(&queries, &[reference.clone(), SpVec::zeros(2)]);
        assert_eq!(m.len(), 2);
        assert_eq!(m[0][0], 1.0);
        assert_eq!(m[0][2], 0.0);
        assert!(m[0][1] > 0.0 && m[0][1] < 1.0);
        // zero reference -> constant row -> all 0
        assert_eq!(m[1], vec![0.0, 0.0, 0.0]);
        assert_eq!(similarity_scores(&queries, &reference), m[0]);
    }

    #[test]
    fn constant_similarities_collapse_to_zero() {
        let reference = SpVec::from_dense(&[1.0, 0.0]);
        let queries = vec![SpVec::from_dense(&[3.0, 0.0]), SpVec::from_dense(&[7.0, 0.0])];
        assert_eq!(similarity_scores(&queries, &reference), vec![0.0, 0.0]);
    }
}
