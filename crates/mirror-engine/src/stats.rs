//! Numeric helpers shared by every stage.
//!
//! Aggregates over empty input return 0 so downstream arithmetic never sees NaN.

/// Clamp `x` into `[lo, hi]`.
pub fn clamp(x: f64, lo: f64, hi: f64) -> f64 {
    lo.max(hi.min(x))
}

/// Unit-less linear penalty: 0 at or below `lo`, 1 at or above `hi`.
///
/// A degenerate band (`hi <= lo`) never penalizes.
pub fn penalty(x: f64, lo: f64, hi: f64) -> f64 {
    if hi <= lo {
        return 0.0;
    }
    clamp((x - lo) / (hi - lo), 0.0, 1.0)
}

/// Exponential moving average step.
pub fn ema(prev: f64, sample: f64, alpha: f64) -> f64 {
    (1.0 - alpha) * prev + alpha * sample
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sorted = sorted(values);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

/// Population standard deviation; 0 for fewer than two samples.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let avg = mean(values);
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Nearest-rank percentile (`p` in 0-100).
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sorted = sorted(values);
    let idx = (sorted.len() as f64 * p / 100.0).floor() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Substitute `fallback` for a zero aggregate.
pub fn nonzero_or(value: f64, fallback: f64) -> f64 {
    if value == 0.0 || value.is_nan() {
        fallback
    } else {
        value
    }
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_penalty_band() {
        assert_eq!(penalty(0.0, 0.2, 0.6), 0.0);
        assert_eq!(penalty(0.2, 0.2, 0.6), 0.0);
        assert!((penalty(0.4, 0.2, 0.6) - 0.5).abs() < 1e-12);
        assert_eq!(penalty(0.6, 0.2, 0.6), 1.0);
        assert_eq!(penalty(5.0, 0.2, 0.6), 1.0);
        assert_eq!(penalty(5.0, 0.6, 0.6), 0.0);
    }

    #[test]
    fn test_penalty_monotonic() {
        let mut prev = 0.0;
        for i in 0..=100 {
            let x = -0.5 + i as f64 * 0.02;
            let p = penalty(x, 0.1, 0.9);
            assert!(p >= prev);
            assert!((0.0..=1.0).contains(&p));
            prev = p;
        }
    }

    #[test]
    fn test_empty_aggregates_are_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(median(&[]), 0.0);
        assert_eq!(std_dev(&[]), 0.0);
        assert_eq!(std_dev(&[3.0]), 0.0);
        assert_eq!(percentile(&[], 50.0), 0.0);
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn test_percentile_nearest_rank() {
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        assert_eq!(percentile(&values, 10.0), 2.0);
        assert_eq!(percentile(&values, 90.0), 10.0);
        assert_eq!(percentile(&values, 100.0), 10.0);
    }

    #[test]
    fn test_nonzero_or() {
        assert_eq!(nonzero_or(0.0, 0.25), 0.25);
        assert_eq!(nonzero_or(0.3, 0.25), 0.3);
    }
}
