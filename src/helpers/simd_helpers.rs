#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::{
    _CMP_GE_OQ, _CMP_LE_OQ, _mm256_add_pd, _mm256_and_pd, _mm256_cmp_pd, _mm256_loadu_pd,
    _mm256_max_pd, _mm256_min_pd, _mm256_movemask_pd, _mm256_set1_pd, _mm256_setzero_pd,
    _mm256_storeu_pd,
};

use crate::processor::AggregateOp;

/// Aggregate over an f64 column using AVX2 or scalar fallback.
///
/// Returns `None` for an empty slice, except `Sum` which is `0.0`.
pub fn aggregate_f64(values: &[f64], op: AggregateOp) -> Option<f64> {
    if values.is_empty() {
        return match op {
            AggregateOp::Sum => Some(0.0),
            _ => None,
        };
    }

    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            return Some(unsafe { aggregate_f64_avx2_inner(values, op) });
        }
    }

    Some(aggregate_f64_scalar(values, op))
}

fn aggregate_f64_scalar(values: &[f64], op: AggregateOp) -> f64 {
    match op {
        AggregateOp::Sum => values.iter().sum(),
        AggregateOp::Avg => values.iter().sum::<f64>() / values.len() as f64,
        AggregateOp::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
        AggregateOp::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn aggregate_f64_avx2_inner(values: &[f64], op: AggregateOp) -> f64 {
    const LANES: usize = 4; // __m256d holds 4 f64s
    let mut sum = _mm256_setzero_pd();
    let mut min = _mm256_set1_pd(f64::INFINITY);
    let mut max = _mm256_set1_pd(f64::NEG_INFINITY);

    let chunks = values.chunks_exact(LANES);
    let remainder = chunks.remainder();

    for chunk in chunks {
        let v = unsafe { _mm256_loadu_pd(chunk.as_ptr()) };
        sum = _mm256_add_pd(sum, v);
        min = _mm256_min_pd(min, v);
        max = _mm256_max_pd(max, v);
    }

    let mut sum_arr = [0f64; LANES];
    let mut min_arr = [f64::INFINITY; LANES];
    let mut max_arr = [f64::NEG_INFINITY; LANES];
    unsafe { _mm256_storeu_pd(sum_arr.as_mut_ptr(), sum) };
    unsafe { _mm256_storeu_pd(min_arr.as_mut_ptr(), min) };
    unsafe { _mm256_storeu_pd(max_arr.as_mut_ptr(), max) };

    let mut total_sum: f64 = sum_arr.iter().sum();
    let mut total_min = min_arr.iter().copied().fold(f64::INFINITY, f64::min);
    let mut total_max = max_arr.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    for &v in remainder {
        total_sum += v;
        total_min = total_min.min(v);
        total_max = total_max.max(v);
    }

    match op {
        AggregateOp::Sum => total_sum,
        AggregateOp::Avg => total_sum / values.len() as f64,
        AggregateOp::Min => total_min,
        AggregateOp::Max => total_max,
    }
}

/// Indices of values in the inclusive range `[low, high]`, in ascending order
pub fn filter_f64_between(values: &[f64], low: f64, high: f64) -> Vec<usize> {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            return unsafe { filter_f64_between_avx2(values, low, high) };
        }
    }

    filter_f64_between_scalar(values, low, high)
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn filter_f64_between_avx2(values: &[f64], low: f64, high: f64) -> Vec<usize> {
    const LANES: usize = 4;
    let mut out = Vec::with_capacity(values.len());

    let chunks = values.chunks_exact(LANES);
    let remainder = chunks.remainder();

    let lo = _mm256_set1_pd(low);
    let hi = _mm256_set1_pd(high);

    for (chunk_idx, chunk) in chunks.enumerate() {
        let v = unsafe { _mm256_loadu_pd(chunk.as_ptr()) };
        let ge = _mm256_cmp_pd(v, lo, _CMP_GE_OQ);
        let le = _mm256_cmp_pd(v, hi, _CMP_LE_OQ);
        let mask_bits = _mm256_movemask_pd(_mm256_and_pd(ge, le));
        for i in 0..LANES {
            if (mask_bits & (1 << i)) != 0 {
                out.push(chunk_idx * LANES + i);
            }
        }
    }

    let base = values.len() - remainder.len();
    for (i, &v) in remainder.iter().enumerate() {
        if v >= low && v <= high {
            out.push(base + i);
        }
    }

    out
}

fn filter_f64_between_scalar(values: &[f64], low: f64, high: f64) -> Vec<usize> {
    values
        .iter()
        .enumerate()
        .filter_map(|(i, &v)| if v >= low && v <= high { Some(i) } else { None })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_matches_scalar() {
        let values: Vec<f64> = (1..=11).map(f64::from).collect();
        assert_eq!(aggregate_f64(&values, AggregateOp::Sum), Some(66.0));
        assert_eq!(aggregate_f64(&values, AggregateOp::Avg), Some(6.0));
        assert_eq!(aggregate_f64(&values, AggregateOp::Min), Some(1.0));
        assert_eq!(aggregate_f64(&values, AggregateOp::Max), Some(11.0));
    }

    #[test]
    fn test_aggregate_empty() {
        assert_eq!(aggregate_f64(&[], AggregateOp::Sum), Some(0.0));
        assert_eq!(aggregate_f64(&[], AggregateOp::Max), None);
        assert_eq!(aggregate_f64(&[], AggregateOp::Avg), None);
    }

    #[test]
    fn test_filter_between_is_inclusive() {
        let values = [0.0, 5.0, 100.0, 100.5, 42.0, 7.0, 101.0];
        assert_eq!(filter_f64_between(&values, 0.0, 100.0), vec![0, 1, 2, 4, 5]);
        assert_eq!(
            filter_f64_between_scalar(&values, 0.0, 100.0),
            filter_f64_between(&values, 0.0, 100.0)
        );
    }
}
