//! Descriptive statistics over AEP sample distributions.

/// Arithmetic mean; `0.0` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by `n`, not `n - 1`).
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Percentile `q` (0–100) with linear interpolation between closest ranks.
///
/// The rank is `q / 100 * (n - 1)` over the sorted values, so `q = 0` is the
/// minimum and `q = 100` the maximum. Returns `None` for an empty slice.
///
/// # Examples
///
/// ```
/// use windfarm_aep::sim::stats::percentile;
///
/// assert_eq!(percentile(&[1.0, 2.0, 3.0, 4.0], 50.0), Some(2.5));
/// let tens: Vec<f64> = (1..=11).map(|i| f64::from(i) * 10.0).collect();
/// assert_eq!(percentile(&tens, 10.0), Some(20.0));
/// ```
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = q.clamp(0.0, 100.0) / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_known_values() {
        assert!((mean(&[10.0, 12.0, 14.0]) - 12.0).abs() < 1e-12);
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn population_not_sample_std_dev() {
        // population variance of [2,4,4,4,5,5,7,9] is exactly 4
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((population_std_dev(&v) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn percentile_interpolates_linearly() {
        let v = [15.0, 20.0, 35.0, 40.0, 50.0];
        // rank 0.4 -> 15 + 0.4 * 5
        assert!((percentile(&v, 10.0).unwrap() - 17.0).abs() < 1e-12);
        assert_eq!(percentile(&v, 50.0), Some(35.0));
        // rank 3.6 -> 40 + 0.6 * 10
        assert!((percentile(&v, 90.0).unwrap() - 46.0).abs() < 1e-12);
    }

    #[test]
    fn percentile_ignores_input_order() {
        let a = percentile(&[5.0, 1.0, 4.0, 2.0, 3.0], 25.0);
        let b = percentile(&[1.0, 2.0, 3.0, 4.0, 5.0], 25.0);
        assert_eq!(a, b);
        assert_eq!(a, Some(2.0));
    }

    #[test]
    fn percentile_single_value_and_empty() {
        assert_eq!(percentile(&[7.5], 10.0), Some(7.5));
        assert_eq!(percentile(&[], 50.0), None);
    }
}
