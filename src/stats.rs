//! Descriptive statistics with numerical stability guarantees.
//!
//! All functions in this module handle edge cases explicitly and use
//! numerically stable algorithms to avoid catastrophic cancellation.
//! Beam moments are population moments (denominator `n`, or the weight
//! sum for weighted data).
//!
//! # Algorithms
//!
//! - **Mean**: Neumaier compensated summation for O(ε) error independent of n.
//! - **Variance/StdDev**: Welford's online algorithm.
//!   Reference: Welford (1962), "Note on a Method for Calculating
//!   Corrected Sums of Squares and Products", *Technometrics* 4(3).
//! - **Weighted variance**: West's incremental weighted algorithm.
//!   Reference: West (1979), "Updating Mean and Variance Estimates: An
//!   Improved Method", *Communications of the ACM* 22(9).

/// Computes the arithmetic mean using compensated summation.
///
/// # Complexity
/// Time: O(n), Space: O(1)
///
/// # Returns
/// - `None` if `data` is empty or contains any NaN/Inf.
///
/// # Examples
/// ```
/// use u_beamgen::stats::mean;
/// let v = [1.0, 2.0, 3.0, 4.0, 5.0];
/// assert!((mean(&v).unwrap() - 3.0).abs() < 1e-15);
/// ```
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    if !data.iter().all(|x| x.is_finite()) {
        return None;
    }
    Some(kahan_sum(data) / data.len() as f64)
}

/// Computes the population variance (denominator `n`).
///
/// # Returns
/// - `None` if `data` is empty or contains NaN/Inf.
///
/// # Examples
/// ```
/// use u_beamgen::stats::population_variance;
/// let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
/// assert!((population_variance(&v).unwrap() - 4.0).abs() < 1e-10);
/// ```
pub fn population_variance(data: &[f64]) -> Option<f64> {
    accumulate(data)?.population_variance()
}

/// Computes the population standard deviation.
///
/// This is the spread used for moment correction of sampled coordinates.
///
/// # Returns
/// - `None` if `data` is empty or contains NaN/Inf.
pub fn population_std_dev(data: &[f64]) -> Option<f64> {
    population_variance(data).map(f64::sqrt)
}

fn accumulate(data: &[f64]) -> Option<WelfordAccumulator> {
    if data.is_empty() || !data.iter().all(|x| x.is_finite()) {
        return None;
    }
    let mut acc = WelfordAccumulator::new();
    for &x in data {
        acc.update(x);
    }
    Some(acc)
}

/// Weighted mean `Σ wᵢxᵢ / Σ wᵢ`.
///
/// # Returns
/// - `None` if lengths differ, data is empty, any value or weight is
///   non-finite, any weight is negative, or the weights sum to zero.
///
/// # Examples
/// ```
/// use u_beamgen::stats::weighted_mean;
/// let m = weighted_mean(&[1.0, 3.0], &[3.0, 1.0]).unwrap();
/// assert!((m - 1.5).abs() < 1e-15);
/// ```
pub fn weighted_mean(data: &[f64], weights: &[f64]) -> Option<f64> {
    weighted_moments(data, weights).map(|(m, _)| m)
}

/// Weighted population standard deviation
/// `sqrt(Σ wᵢ(xᵢ − x̄)² / Σ wᵢ)`.
///
/// # Returns
/// - `None` under the same conditions as [`weighted_mean`].
pub fn weighted_std_dev(data: &[f64], weights: &[f64]) -> Option<f64> {
    weighted_moments(data, weights).map(|(_, v)| v.sqrt())
}

fn weighted_moments(data: &[f64], weights: &[f64]) -> Option<(f64, f64)> {
    if data.is_empty() || data.len() != weights.len() {
        return None;
    }
    let mut w_sum = 0.0;
    let mut mean = 0.0;
    let mut s = 0.0;
    for (&x, &w) in data.iter().zip(weights) {
        if !x.is_finite() || !w.is_finite() || w < 0.0 {
            return None;
        }
        if w == 0.0 {
            continue;
        }
        w_sum += w;
        let delta = x - mean;
        mean += (w / w_sum) * delta;
        s += w * delta * (x - mean);
    }
    if w_sum <= 0.0 {
        return None;
    }
    Some((mean, (s / w_sum).max(0.0)))
}

// ---------------------------------------------------------------------------
// Kahan compensated summation
// ---------------------------------------------------------------------------

/// Neumaier compensated summation for O(ε) error independent of `n`.
///
/// This is an improved variant of Kahan summation that also handles the
/// case where the addend is larger in magnitude than the running sum.
///
/// Reference: Neumaier (1974), "Rundungsfehleranalyse einiger Verfahren
/// zur Summation endlicher Summen", *Zeitschrift für Angewandte
/// Mathematik und Mechanik* 54(1), pp. 39–51.
///
/// # Complexity
/// Time: O(n), Space: O(1)
pub fn kahan_sum(data: &[f64]) -> f64 {
    let mut sum = 0.0_f64;
    let mut c = 0.0_f64;
    for &x in data {
        let t = sum + x;
        if sum.abs() >= x.abs() {
            c += (sum - t) + x;
        } else {
            c += (x - t) + sum;
        }
        sum = t;
    }
    sum + c
}

// ---------------------------------------------------------------------------
// Welford online accumulator
// ---------------------------------------------------------------------------

/// Streaming accumulator for mean and variance.
///
/// # Examples
/// ```
/// use u_beamgen::stats::WelfordAccumulator;
/// let mut acc = WelfordAccumulator::new();
/// for &x in &[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
///     acc.update(x);
/// }
/// assert!((acc.mean().unwrap() - 5.0).abs() < 1e-15);
/// assert!((acc.population_variance().unwrap() - 4.0).abs() < 1e-10);
/// ```
#[derive(Debug, Clone)]
pub struct WelfordAccumulator {
    count: u64,
    mean_acc: f64,
    m2: f64,
}

impl WelfordAccumulator {
    /// Creates a new empty accumulator.
    pub fn new() -> Self {
        Self {
            count: 0,
            mean_acc: 0.0,
            m2: 0.0,
        }
    }

    /// Feeds a new sample into the accumulator.
    pub fn update(&mut self, value: f64) {
        self.count += 1;
        if self.count == 1 {
            self.mean_acc = value;
            return;
        }
        let delta = value - self.mean_acc;
        self.mean_acc += delta / self.count as f64;
        self.m2 += delta * (value - self.mean_acc);
    }

    /// Returns the number of samples seen so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Returns the running mean, or `None` if no samples have been added.
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.mean_acc)
        }
    }

    /// Returns the population variance (n denominator), or `None` if no
    /// samples have been added.
    pub fn population_variance(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.m2 / self.count as f64)
        }
    }
}

impl Default for WelfordAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // --- mean ---

    #[test]
    fn test_mean_basic() {
        assert_eq!(mean(&[1.0, 2.0, 3.0, 4.0, 5.0]), Some(3.0));
    }

    #[test]
    fn test_mean_single() {
        assert_eq!(mean(&[42.0]), Some(42.0));
    }

    #[test]
    fn test_mean_empty() {
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_mean_nan() {
        assert_eq!(mean(&[1.0, f64::NAN, 3.0]), None);
    }

    // --- variance ---

    #[test]
    fn test_variance_single() {
        assert_eq!(population_variance(&[1.0]), Some(0.0));
        assert_eq!(population_variance(&[]), None);
    }

    #[test]
    fn test_population_std_dev() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((population_std_dev(&v).unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_population_variance_large_offset() {
        // Naive E[X²] − E[X]² loses everything here.
        let v: Vec<f64> = (0..1000).map(|i| 1e9 + (i % 2) as f64).collect();
        assert!((population_variance(&v).unwrap() - 0.25).abs() < 1e-9);
    }

    // --- weighted ---

    #[test]
    fn test_weighted_uniform_matches_unweighted() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let w = [0.125; 8];
        assert!((weighted_mean(&v, &w).unwrap() - 5.0).abs() < 1e-12);
        assert!((weighted_std_dev(&v, &w).unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_zero_weights_ignored() {
        let m = weighted_mean(&[1.0, 100.0], &[1.0, 0.0]).unwrap();
        assert!((m - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_weighted_invalid() {
        assert_eq!(weighted_mean(&[1.0, 2.0], &[1.0]), None);
        assert_eq!(weighted_mean(&[1.0], &[0.0]), None);
        assert_eq!(weighted_mean(&[1.0], &[-1.0]), None);
        assert_eq!(weighted_std_dev(&[], &[]), None);
    }

    // --- kahan_sum ---

    #[test]
    fn test_kahan_sum_compensates() {
        let v = [1.0, 1e100, 1.0, -1e100];
        assert_eq!(kahan_sum(&v), 2.0);
    }

    // --- WelfordAccumulator ---

    #[test]
    fn test_welford_empty() {
        let acc = WelfordAccumulator::default();
        assert_eq!(acc.count(), 0);
        assert_eq!(acc.mean(), None);
        assert_eq!(acc.population_variance(), None);
    }
}
