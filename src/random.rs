//! Uniform draws for inverse-CDF sampling.
//!
//! The generator consumes an (dims × N) matrix of values in [0, 1): one
//! row per sampled coordinate, N columns for N particles. Rows come either
//! from a seeded pseudo-random generator or from a Hammersley point set.
//!
//! # Reproducibility
//!
//! Hammersley draws are fully deterministic. Pseudo-random draws are
//! deterministic for a given seed on the same platform; without a seed
//! the generator is seeded from the thread-local RNG.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};

/// Creates a fast, seeded random number generator.
///
/// Uses `SmallRng` (Xoshiro256++) for high performance.
/// The sequence is deterministic for a given seed on the same platform.
///
/// # Examples
/// ```
/// use u_beamgen::random::create_rng;
/// use rand::Rng;
/// let mut rng = create_rng(42);
/// let x: f64 = rng.random();
/// assert!(x >= 0.0 && x < 1.0);
/// ```
pub fn create_rng(seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed)
}

// ============================================================================
// Low-discrepancy sequences
// ============================================================================

/// Van der Corput radical inverse of `index` in `base`.
///
/// Mirrors the base-`b` digits of `index` about the radix point:
/// `index = Σ dⱼ bʲ` maps to `Σ dⱼ b^-(j+1)`.
///
/// # Returns
/// A value in [0, 1). Returns 0 for `base < 2`.
///
/// # Examples
/// ```
/// use u_beamgen::random::radical_inverse;
/// assert_eq!(radical_inverse(1, 2), 0.5);
/// assert_eq!(radical_inverse(3, 2), 0.75);
/// assert!((radical_inverse(1, 3) - 1.0 / 3.0).abs() < 1e-15);
/// ```
pub fn radical_inverse(mut index: u64, base: u32) -> f64 {
    if base < 2 {
        return 0.0;
    }
    let b = base as u64;
    let inv_base = 1.0 / base as f64;
    let mut factor = inv_base;
    let mut result = 0.0;
    while index > 0 {
        result += (index % b) as f64 * factor;
        index /= b;
        factor *= inv_base;
    }
    result
}

/// The first `count` prime numbers, by trial division.
pub fn first_primes(count: usize) -> Vec<u32> {
    let mut primes: Vec<u32> = Vec::with_capacity(count);
    let mut candidate = 2u32;
    while primes.len() < count {
        if primes
            .iter()
            .take_while(|&&p| p * p <= candidate)
            .all(|&p| candidate % p != 0)
        {
            primes.push(candidate);
        }
        candidate += 1;
    }
    primes
}

/// Hammersley point set with `n` points in `dims` dimensions.
///
/// Row 0 is the regular grid `(i + 0.5) / n`; row `k ≥ 1` is the radical
/// inverse of `i + 1` in the k-th prime base (2, 3, 5, ...). Neither
/// construction produces an exact 0, so every row is safe to feed into
/// inverse CDFs with infinite support.
///
/// Reference: Hammersley (1960), "Monte Carlo methods for solving
/// multivariable problems", *Annals of the New York Academy of Sciences*
/// 86(3), pp. 844–874.
///
/// # Complexity
/// Time: O(n · dims · log n), Space: O(n · dims)
pub fn hammersley(n: usize, dims: usize) -> Vec<Vec<f64>> {
    if dims == 0 {
        return Vec::new();
    }
    let primes = first_primes(dims.saturating_sub(1));
    let mut rows = Vec::with_capacity(dims);
    rows.push((0..n).map(|i| (i as f64 + 0.5) / n as f64).collect());
    for &base in &primes {
        rows.push(
            (0..n)
                .map(|i| radical_inverse(i as u64 + 1, base))
                .collect(),
        );
    }
    rows
}

// ============================================================================
// Random source and draw matrix
// ============================================================================

/// Where the uniform draws come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RandomSource {
    /// Independent uniform draws from `SmallRng`.
    Pseudo { seed: Option<u64> },
    /// Deterministic Hammersley point set.
    Hammersley,
}

impl Default for RandomSource {
    fn default() -> Self {
        RandomSource::Pseudo { seed: None }
    }
}

/// Row-major matrix of uniform draws, one row per sampled dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomMatrix {
    rows: Vec<Vec<f64>>,
    n: usize,
}

impl RandomMatrix {
    /// Draws a `dims × n` matrix from `source`.
    pub fn draw(source: RandomSource, n: usize, dims: usize) -> Self {
        let rows = match source {
            RandomSource::Hammersley => hammersley(n, dims),
            RandomSource::Pseudo { seed } => {
                let mut rng = match seed {
                    Some(seed) => create_rng(seed),
                    None => SmallRng::from_rng(&mut rand::rng()),
                };
                (0..dims)
                    .map(|_| (0..n).map(|_| rng.random::<f64>()).collect())
                    .collect()
            }
        };
        Self { rows, n }
    }

    /// Wraps caller-supplied rows.
    ///
    /// # Errors
    /// Returns [`Error::InvalidParameters`] if rows differ in length or any
    /// value lies outside [0, 1].
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != n) {
            return Err(Error::InvalidParameters(
                "random matrix rows must all have the same length".into(),
            ));
        }
        if rows.iter().flatten().any(|u| !(0.0..=1.0).contains(u)) {
            return Err(Error::InvalidParameters(
                "random matrix values must lie in [0, 1]".into(),
            ));
        }
        Ok(Self { rows, n })
    }

    /// Number of draws per row.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Number of rows.
    pub fn dims(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, index: usize) -> Option<&[f64]> {
        self.rows.get(index).map(Vec::as_slice)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_rng_deterministic() {
        let mut a = create_rng(42);
        let mut b = create_rng(42);
        for _ in 0..100 {
            assert_eq!(a.random::<u64>(), b.random::<u64>());
        }
    }

    #[test]
    fn test_first_primes() {
        assert_eq!(first_primes(0), Vec::<u32>::new());
        assert_eq!(first_primes(6), vec![2, 3, 5, 7, 11, 13]);
    }

    #[test]
    fn test_radical_inverse_base2() {
        let expected = [0.0, 0.5, 0.25, 0.75, 0.125, 0.625];
        for (i, &e) in expected.iter().enumerate() {
            assert_eq!(radical_inverse(i as u64, 2), e, "index {i}");
        }
        assert_eq!(radical_inverse(5, 1), 0.0);
    }

    #[test]
    fn test_hammersley_shape_and_first_row() {
        let rows = hammersley(4, 3);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec![0.125, 0.375, 0.625, 0.875]);
        assert_eq!(rows[1], vec![0.5, 0.25, 0.75, 0.125]);
        assert!((rows[2][0] - 1.0 / 3.0).abs() < 1e-15);
        assert!(hammersley(4, 0).is_empty());
    }

    #[test]
    fn test_hammersley_uniform_mean() {
        let rows = hammersley(4096, 4);
        for (k, row) in rows.iter().enumerate() {
            let m = row.iter().sum::<f64>() / row.len() as f64;
            assert!((m - 0.5).abs() < 2e-3, "row {k}: mean {m}");
        }
    }

    #[test]
    fn test_draw_pseudo_seeded_reproducible() {
        let source = RandomSource::Pseudo { seed: Some(7) };
        let a = RandomMatrix::draw(source, 100, 3);
        let b = RandomMatrix::draw(source, 100, 3);
        assert_eq!(a, b);
        assert_eq!(a.dims(), 3);
        assert_eq!(a.n(), 100);
        assert!(a.row(3).is_none());
    }

    #[test]
    fn test_draw_unseeded_in_range() {
        let m = RandomMatrix::draw(RandomSource::default(), 50, 2);
        for k in 0..2 {
            assert!(m.row(k).unwrap().iter().all(|u| (0.0..1.0).contains(u)));
        }
    }

    #[test]
    fn test_from_rows_validation() {
        assert!(RandomMatrix::from_rows(vec![vec![0.1, 0.2], vec![0.3]]).is_err());
        assert!(RandomMatrix::from_rows(vec![vec![0.1, 1.5]]).is_err());
        let m = RandomMatrix::from_rows(vec![vec![0.1, 0.2]]).unwrap();
        assert_eq!(m.n(), 2);
        assert_eq!(m.row(0).unwrap(), &[0.1, 0.2]);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn radical_inverse_in_unit_interval(index in 0u64..1_000_000, base in 2u32..40) {
            let v = radical_inverse(index, base);
            prop_assert!((0.0..1.0).contains(&v));
        }

        #[test]
        fn hammersley_values_open_interval(n in 1usize..300, dims in 1usize..6) {
            let rows = hammersley(n, dims);
            prop_assert_eq!(rows.len(), dims);
            for row in &rows {
                prop_assert_eq!(row.len(), n);
                prop_assert!(row.iter().all(|&u| u > 0.0 && u < 1.0));
            }
        }
    }
}
