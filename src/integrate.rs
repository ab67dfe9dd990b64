//! Numerical integration and interpolation on sampled grids.
//!
//! Routines operate on raw magnitudes in whatever unit the caller holds
//! the grid in; [`linspace_quantity`] builds a unit-carrying grid from
//! two endpoints in possibly different units.
//!
//! # Bin conventions
//!
//! Rectangular rules assign each sample a bin bounded by the midpoints to
//! its neighbours. End bins extend by the same half-spacing past the first
//! and last samples. Radial rules clamp the end bins to the first and last
//! radii instead, so `r = 0` never produces a negative area.
//!
//! All routines pair `f` and `x` element-wise; surplus elements in the
//! longer slice are ignored.

use crate::units::{Quantity, QuantityVec, UnitError};

// ============================================================================
// Trapezoid rule
// ============================================================================

/// Trapezoid-rule integral of `f(x)` over the sampled grid.
///
/// # Returns
/// 0 for fewer than two samples.
///
/// # Examples
/// ```
/// use u_beamgen::integrate::trapz;
/// let x = [0.0, 1.0, 2.0];
/// let f = [0.0, 1.0, 2.0];
/// assert!((trapz(&f, &x) - 2.0).abs() < 1e-15);
/// ```
pub fn trapz(f: &[f64], x: &[f64]) -> f64 {
    f.windows(2)
        .zip(x.windows(2))
        .map(|(fw, xw)| 0.5 * (fw[0] + fw[1]) * (xw[1] - xw[0]))
        .sum()
}

/// Cumulative trapezoid integral, starting at 0.
///
/// The output has the same length as the shorter input; element `i` is
/// the integral from `x[0]` to `x[i]`.
pub fn cumtrapz(f: &[f64], x: &[f64]) -> Vec<f64> {
    let n = f.len().min(x.len());
    if n == 0 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(n);
    let mut acc = 0.0;
    out.push(acc);
    for i in 1..n {
        acc += 0.5 * (f[i - 1] + f[i]) * (x[i] - x[i - 1]);
        out.push(acc);
    }
    out
}

// ============================================================================
// Rectangle rule
// ============================================================================

/// Bin edges around each sample: interior edges at midpoints, end edges
/// extended by the adjacent half-spacing. Length `x.len() + 1`.
///
/// A single sample gets a degenerate bin `[x₀, x₀]`.
pub fn bin_edges(x: &[f64]) -> Vec<f64> {
    let n = x.len();
    if n == 0 {
        return Vec::new();
    }
    let mut edges = vec![0.0; n + 1];
    for i in 1..n {
        edges[i] = 0.5 * (x[i - 1] + x[i]);
    }
    if n == 1 {
        edges[0] = x[0];
        edges[1] = x[0];
        return edges;
    }
    edges[0] = x[0] - (edges[1] - x[0]);
    edges[n] = x[n - 1] + (x[n - 1] - edges[n - 1]);
    edges
}

/// Rectangle-rule integral: each `f[i]` times the width of its bin.
pub fn rectint(f: &[f64], x: &[f64]) -> f64 {
    let edges = bin_edges(x);
    f.iter()
        .zip(edges.windows(2))
        .map(|(fi, e)| fi * (e[1] - e[0]))
        .sum()
}

/// Cumulative rectangle-rule integral evaluated at the bin edges.
///
/// Returns `(cumulative, edges)`, both of length `x.len() + 1`, with
/// `cumulative[0] = 0`.
pub fn cumrectint(f: &[f64], x: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let edges = bin_edges(x);
    let cumulative = cumulate(f, &edges, |e| e[1] - e[0]);
    (cumulative, edges)
}

// ============================================================================
// Radial (r dr Jacobian)
// ============================================================================

/// Radial bin edges: `[r₀, midpoints..., r_last]`. Length `r.len() + 1`.
pub fn radial_edges(r: &[f64]) -> Vec<f64> {
    let n = r.len();
    if n == 0 {
        return Vec::new();
    }
    let mut edges = Vec::with_capacity(n + 1);
    edges.push(r[0]);
    edges.extend(r.windows(2).map(|w| 0.5 * (w[0] + w[1])));
    edges.push(r[n - 1]);
    edges
}

/// Radial integral `∫ f(r) r dr` with exact annulus areas per bin.
///
/// Each sample contributes `½(r²_{i+1/2} − r²_{i−1/2}) · f[i]`.
///
/// # Examples
/// ```
/// use u_beamgen::integrate::radint;
/// // Constant density on [0, 1] integrates to 1/2.
/// let r: Vec<f64> = (0..=100).map(|i| i as f64 / 100.0).collect();
/// let f = vec![1.0; r.len()];
/// assert!((radint(&f, &r) - 0.5).abs() < 1e-12);
/// ```
pub fn radint(f: &[f64], r: &[f64]) -> f64 {
    let edges = radial_edges(r);
    f.iter()
        .zip(edges.windows(2))
        .map(|(fi, e)| 0.5 * (e[1] * e[1] - e[0] * e[0]) * fi)
        .sum()
}

/// Cumulative radial integral at the radial bin edges.
///
/// Returns `(cumulative, edges)`, both of length `r.len() + 1`, with
/// `cumulative[0] = 0`.
pub fn radcumint(f: &[f64], r: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let edges = radial_edges(r);
    let cumulative = cumulate(f, &edges, |e| 0.5 * (e[1] * e[1] - e[0] * e[0]));
    (cumulative, edges)
}

fn cumulate(f: &[f64], edges: &[f64], measure: impl Fn(&[f64]) -> f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(edges.len());
    if edges.is_empty() {
        return out;
    }
    let mut acc = 0.0;
    out.push(acc);
    for (fi, e) in f.iter().zip(edges.windows(2)) {
        acc += measure(e) * fi;
        out.push(acc);
    }
    out
}

// ============================================================================
// Interpolation and grids
// ============================================================================

/// Piecewise-linear interpolation of `fs(xs)` at `x`.
///
/// `xs` must be non-decreasing. Outside `[xs[0], xs[last]]` the end values
/// are returned. Where `xs` repeats a value, the rightmost sample wins.
///
/// # Returns
/// `NaN` if `xs` is empty.
///
/// # Examples
/// ```
/// use u_beamgen::integrate::interp;
/// let xs = [0.0, 1.0, 2.0];
/// let fs = [0.0, 10.0, 0.0];
/// assert!((interp(0.5, &xs, &fs) - 5.0).abs() < 1e-12);
/// assert_eq!(interp(-1.0, &xs, &fs), 0.0);
/// ```
pub fn interp(x: f64, xs: &[f64], fs: &[f64]) -> f64 {
    let n = xs.len().min(fs.len());
    if n == 0 {
        return f64::NAN;
    }
    if x <= xs[0] {
        return fs[0];
    }
    if x >= xs[n - 1] {
        return fs[n - 1];
    }
    // First index with xs[i] > x; 1 ≤ hi ≤ n − 1 here.
    let hi = xs[..n].partition_point(|&v| v <= x);
    let lo = hi - 1;
    let span = xs[hi] - xs[lo];
    if span <= 0.0 {
        return fs[hi];
    }
    let t = (x - xs[lo]) / span;
    fs[lo] + t * (fs[hi] - fs[lo])
}

/// `n` evenly spaced values from `start` to `stop` inclusive.
///
/// # Examples
/// ```
/// use u_beamgen::integrate::linspace;
/// assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
/// assert_eq!(linspace(3.0, 7.0, 1), vec![3.0]);
/// ```
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            let mut v: Vec<f64> = (0..n).map(|i| start + i as f64 * step).collect();
            v[n - 1] = stop;
            v
        }
    }
}

/// Index of the element of `array` closest to `value`; the first such
/// index on ties.
///
/// # Returns
/// `None` if `array` is empty or `value` is NaN.
pub fn nearest_neighbor(array: &[f64], value: f64) -> Option<usize> {
    if value.is_nan() {
        return None;
    }
    let mut best: Option<(usize, f64)> = None;
    for (i, &a) in array.iter().enumerate() {
        let d = (a - value).abs();
        match best {
            Some((_, bd)) if bd <= d => {}
            _ => best = Some((i, d)),
        }
    }
    best.map(|(i, _)| i)
}

// ============================================================================
// Unit-carrying grids
// ============================================================================

/// Evenly spaced grid between two quantities, in the units of `stop`.
///
/// # Errors
/// Returns [`UnitError::Incompatible`] if the endpoints differ in dimension.
pub fn linspace_quantity(start: &Quantity, stop: &Quantity, n: usize) -> Result<QuantityVec, UnitError> {
    let a = start.value_in(stop.unit())?;
    Ok(QuantityVec::new(linspace(a, stop.value(), n), stop.unit().clone()))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trapz_exact_for_linear() {
        let x = linspace(-1.0, 3.0, 9);
        let f: Vec<f64> = x.iter().map(|v| 2.0 * v + 1.0).collect();
        // ∫_{-1}^{3} (2x+1) dx = [x²+x] = 12 − 0 = 12
        assert!((trapz(&f, &x) - 12.0).abs() < 1e-12);
        assert_eq!(trapz(&[1.0], &[0.0]), 0.0);
    }

    #[test]
    fn test_cumtrapz_last_equals_trapz() {
        let x = linspace(0.0, std::f64::consts::PI, 201);
        let f: Vec<f64> = x.iter().map(|v| v.sin()).collect();
        let c = cumtrapz(&f, &x);
        assert_eq!(c.len(), x.len());
        assert_eq!(c[0], 0.0);
        assert!((c[200] - trapz(&f, &x)).abs() < 1e-14);
        assert!((c[200] - 2.0).abs() < 1e-4);
        assert!(cumtrapz(&[], &[]).is_empty());
    }

    #[test]
    fn test_bin_edges_uniform_grid() {
        let edges = bin_edges(&[0.0, 1.0, 2.0]);
        assert_eq!(edges, vec![-0.5, 0.5, 1.5, 2.5]);
        assert_eq!(bin_edges(&[4.0]), vec![4.0, 4.0]);
        assert!(bin_edges(&[]).is_empty());
    }

    #[test]
    fn test_rectint_and_cumrectint() {
        let x = [0.0, 1.0, 2.0];
        let f = [1.0, 2.0, 3.0];
        assert!((rectint(&f, &x) - 6.0).abs() < 1e-15);
        let (c, e) = cumrectint(&f, &x);
        assert_eq!(c, vec![0.0, 1.0, 3.0, 6.0]);
        assert_eq!(e.len(), 4);
    }

    #[test]
    fn test_radial_edges_clamped() {
        assert_eq!(radial_edges(&[0.0, 1.0, 2.0]), vec![0.0, 0.5, 1.5, 2.0]);
    }

    #[test]
    fn test_radcumint_gaussian_disk() {
        // ∫₀^∞ exp(−r²/2) r dr = 1
        let r = linspace(0.0, 10.0, 2001);
        let f: Vec<f64> = r.iter().map(|v| (-0.5 * v * v).exp()).collect();
        let (c, edges) = radcumint(&f, &r);
        assert_eq!(c.len(), r.len() + 1);
        assert_eq!(edges.len(), r.len() + 1);
        assert!((c[c.len() - 1] - 1.0).abs() < 1e-4);
        assert!((radint(&f, &r) - c[c.len() - 1]).abs() < 1e-14);
    }

    #[test]
    fn test_interp_clamps_and_interpolates() {
        let xs = [1.0, 2.0, 4.0];
        let fs = [10.0, 20.0, 40.0];
        assert_eq!(interp(0.0, &xs, &fs), 10.0);
        assert_eq!(interp(5.0, &xs, &fs), 40.0);
        assert!((interp(3.0, &xs, &fs) - 30.0).abs() < 1e-12);
        assert!((interp(2.0, &xs, &fs) - 20.0).abs() < 1e-12);
        assert!(interp(1.0, &[], &[]).is_nan());
    }

    #[test]
    fn test_interp_repeated_abscissa() {
        let xs = [0.0, 1.0, 1.0, 2.0];
        let fs = [0.0, 1.0, 5.0, 6.0];
        assert!((interp(1.5, &xs, &fs) - 5.5).abs() < 1e-12);
        assert!((interp(0.5, &xs, &fs) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_nearest_neighbor() {
        let a = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(nearest_neighbor(&a, 1.4), Some(1));
        assert_eq!(nearest_neighbor(&a, 1.5), Some(1));
        assert_eq!(nearest_neighbor(&a, 9.0), Some(3));
        assert_eq!(nearest_neighbor(&[], 1.0), None);
        assert_eq!(nearest_neighbor(&a, f64::NAN), None);
    }

    #[test]
    fn test_linspace_quantity() {
        let a = Quantity::parse(-1.0, "mm").unwrap();
        let b = Quantity::parse(1000.0, "um").unwrap();
        let v = linspace_quantity(&a, &b, 3).unwrap();
        for (got, want) in v.values().iter().zip([-1000.0, 0.0, 1000.0]) {
            assert!((got - want).abs() < 1e-9, "{got} vs {want}");
        }
        assert!(linspace_quantity(&a, &Quantity::parse(1.0, "s").unwrap(), 3).is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn cumulative_integrals_monotone_for_nonneg(
            f in proptest::collection::vec(0.0_f64..10.0, 2..60),
        ) {
            let x = linspace(0.0, 1.0, f.len());
            for w in cumtrapz(&f, &x).windows(2) {
                prop_assert!(w[1] >= w[0]);
            }
            for w in radcumint(&f, &x).0.windows(2) {
                prop_assert!(w[1] >= w[0]);
            }
            let (c, _) = cumrectint(&f, &x);
            prop_assert!((c[c.len() - 1] - rectint(&f, &x)).abs() < 1e-9);
        }

        #[test]
        fn interp_bounded_by_samples(
            fs in proptest::collection::vec(-100.0_f64..100.0, 2..30),
            t in 0.0_f64..1.0,
        ) {
            let xs = linspace(0.0, 1.0, fs.len());
            let v = interp(t, &xs, &fs);
            let lo = fs.iter().cloned().fold(f64::INFINITY, f64::min);
            let hi = fs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(v >= lo - 1e-9 && v <= hi + 1e-9);
        }
    }
}
