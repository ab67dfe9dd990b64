//! Special mathematical functions.
//!
//! Error function family and the standard normal distribution, used by
//! the Gaussian and truncated radial Gaussian models.

/// 1/√(2π) ≈ 0.3989422804014327
const FRAC_1_SQRT_2PI: f64 = 0.3989422804014326779399460599343818684758586311649;

// ============================================================================
// Error Function
// ============================================================================

/// Complementary error function erfc(x) = 1 − erf(x).
///
/// # Algorithm
/// Chebyshev-fitted rational approximation of `erfc` for `x ≥ 0`, with
/// the reflection `erfc(−x) = 2 − erfc(x)`.
///
/// Reference: Press et al. (1992), *Numerical Recipes in C*, 2nd ed.,
/// §6.2, `erfcc`.
///
/// # Accuracy
/// Fractional error < 1.2 × 10⁻⁷ everywhere, including the tails.
///
/// # Examples
/// ```
/// use u_beamgen::special::erfc;
/// assert!((erfc(0.0) - 1.0).abs() < 1e-7);
/// assert!((erfc(3.0) - 2.209049699858544e-5).abs() < 1e-11);
/// ```
pub fn erfc(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let ans = t
        * (-z * z - 1.26551223
            + t * (1.00002368
                + t * (0.37409196
                    + t * (0.09678418
                        + t * (-0.18628806
                            + t * (0.27886807
                                + t * (-1.13520398
                                    + t * (1.48851587 + t * (-0.82215223 + t * 0.17087277)))))))))
            .exp();
    if x >= 0.0 {
        ans
    } else {
        2.0 - ans
    }
}

/// Error function erf(x).
///
/// # Definition
/// ```text
/// erf(x) = (2/√π) ∫₀ˣ exp(-t²) dt
/// ```
///
/// # Examples
/// ```
/// use u_beamgen::special::erf;
/// assert!(erf(0.0).abs() < 1e-7);
/// assert!((erf(1.0) - 0.8427007929497149).abs() < 1e-7);
/// ```
pub fn erf(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x >= 0.0 {
        1.0 - erfc(x)
    } else {
        erfc(-x) - 1.0
    }
}

/// Inverse error function: returns `x` with `erf(x) = y` for `y ∈ (−1, 1)`.
///
/// Computed as `Φ⁻¹((y + 1)/2) / √2`.
///
/// # Returns
/// - `f64::NAN` if `y` is outside `[−1, 1]` or NaN.
/// - `±∞` at `y = ±1`.
pub fn erf_inv(y: f64) -> f64 {
    inverse_normal_cdf(0.5 * (y + 1.0)) / std::f64::consts::SQRT_2
}

// ============================================================================
// Standard Normal
// ============================================================================

/// Standard normal CDF Φ(x) = P(Z ≤ x) for Z ~ N(0,1).
///
/// Evaluated as `erfc(−x/√2)/2`, which keeps relative accuracy in the
/// lower tail.
///
/// # Examples
/// ```
/// use u_beamgen::special::standard_normal_cdf;
/// assert!((standard_normal_cdf(0.0) - 0.5).abs() < 1e-7);
/// assert!((standard_normal_cdf(1.96) - 0.975).abs() < 1e-4);
/// ```
pub fn standard_normal_cdf(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x == f64::INFINITY {
        return 1.0;
    }
    if x == f64::NEG_INFINITY {
        return 0.0;
    }
    0.5 * erfc(-x / std::f64::consts::SQRT_2)
}

/// Inverse standard normal CDF (quantile function).
///
/// Given a probability `p ∈ (0, 1)`, returns `z` such that `Φ(z) = p`.
///
/// # Algorithm
/// Acklam's rational approximation: a central region
/// `0.02425 ≤ p ≤ 0.97575` and two tail regions in `√(−2 ln q)`.
///
/// Reference: P. J. Acklam (2003), "An algorithm for computing the inverse
/// normal cumulative distribution function".
///
/// # Accuracy
/// Relative error < 1.15 × 10⁻⁹.
///
/// # Returns
/// - `f64::NAN` if `p` is outside `[0, 1]` or NaN.
/// - `f64::NEG_INFINITY` if `p == 0.0`.
/// - `f64::INFINITY` if `p == 1.0`.
///
/// # Examples
/// ```
/// use u_beamgen::special::inverse_normal_cdf;
/// assert!(inverse_normal_cdf(0.5).abs() < 1e-9);
/// assert!((inverse_normal_cdf(0.975) - 1.959963984540054).abs() < 1e-8);
/// ```
pub fn inverse_normal_cdf(p: f64) -> f64 {
    if p.is_nan() || !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }

    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    const P_LOW: f64 = 0.02425;

    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    if p < P_LOW {
        tail((-2.0 * p.ln()).sqrt())
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -tail((-2.0 * (1.0 - p).ln()).sqrt())
    }
}

/// Standard normal PDF φ(x) = (1/√(2π)) exp(-x²/2).
///
/// # Examples
/// ```
/// use u_beamgen::special::standard_normal_pdf;
/// let peak = standard_normal_pdf(0.0);
/// assert!((peak - 0.3989422804014327).abs() < 1e-15);
/// ```
pub fn standard_normal_pdf(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    FRAC_1_SQRT_2PI * (-0.5 * x * x).exp()
}

// ============================================================================
// Tests
// ============================================================================


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn normal_quantile_roundtrip(p in 1e-6_f64..(1.0 - 1e-6)) {
            let z = inverse_normal_cdf(p);
            let p_back = standard_normal_cdf(z);
            prop_assert!(
                (p_back - p).abs() < 2e-7 * p.min(1.0 - p).max(1e-3),
                "roundtrip failed: p={p}, z={z}, p_back={p_back}"
            );
        }

        #[test]
        fn erf_bounded(x in -10.0_f64..10.0) {
            let e = erf(x);
            prop_assert!((-1.0..=1.0).contains(&e));
        }
    }
}
