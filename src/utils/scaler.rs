use num::Num;

/// Min-max rescale a batch into [0, 1] using the batch's own min and max.
///
/// A constant batch (including a single value) maps to all zeros.
/// Non-finite values are treated as 0 before scaling.
///
/// # Arguments
/// * `values` - batch to rescale
///
/// # Returns
/// * `Vec<f64>` - rescaled values, same order and length as `values`
pub fn min_max_scale<N>(values: &[N]) -> Vec<f64>
where
    N: Num + Copy + Into<f64>,
{
    let vals: Vec<f64> = values
        .iter()
        .map(|v| {
            let x: f64 = (*v).into();
            if x.is_finite() { x } else { 0.0 }
        })
        .collect();
    let mut min_v = f64::INFINITY;
    let mut max_v = f64::NEG_INFINITY;
    for &v in &vals {
        if v < min_v { min_v = v; }
        if v > max_v { max_v = v; }
    }
    let range = max_v - min_v;
    if vals.is_empty() || !(range > 0.0) {
        return vec![0.0; vals.len()];
    }
    vals.into_iter()
        .map(|v| ((v - min_v) / range).clamp(0.0, 1.0))
        .collect()
}

/// Round half away from zero to `decimals` places
#[inline]
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
