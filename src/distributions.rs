//! Distribution models for sampled beam coordinates.
//!
//! Each model works on plain `f64` magnitudes expressed in one unit;
//! [`Distribution`] pairs a model with its coordinate name and that unit,
//! and exposes the unit-carrying `pdf`/`cdf`/`cdfinv`/`avg`/`std`/`rms`
//! contract the generator consumes.
//!
//! # Supported Distributions
//!
//! | Model | Type tags | Parameters | Mean | Std |
//! |---|---|---|---|---|
//! | [`Uniform`] | `u`, `uniform` | `min_<v>`, `max_<v>` | (a+b)/2 | (b−a)/√12 |
//! | [`Gaussian`] | `g`, `gaussian` | `sigma_<v>`, `avg_<v>` | μ | σ |
//! | [`RadialGaussian`] | `rg`, `radial_gaussian` | `sigma_xy` | σ√(π/2) | σ√((4−π)/2) |
//! | [`TruncatedRadialGaussian`] | `tg`, `truncated_radial_gaussian` | `truncation_fraction`, `pinhole_size` | see docs | see docs |
//! | [`Tabulated1d`] | `file` | `file` | numeric | numeric |
//! | [`RadialFile`] | `file` (for `r`) | `file` | numeric | numeric |
//! | [`PulseStacking`] | `crystals` | `crystal_length_<k>`, `crystal_angle_<k>` | 0 | numeric |
//!
//! Joint (x, y) tables live in [`File2d`](crate::tabulated::File2d), which
//! consumes two uniform rows at once.

use std::fmt;

use crate::error::{Error, Result};
use crate::input::ParamMap;
use crate::pulse_stacking::PulseStacking;
use crate::special;
use crate::tabulated::{RadialFile, Tabulated1d};
use crate::units::{Quantity, QuantityVec, Unit};

/// Common contract of the one-dimensional models.
///
/// All arguments and results are magnitudes in the model's own unit.
pub trait Univariate {
    fn mean(&self) -> f64;

    fn std_dev(&self) -> f64;

    /// Root mean square √⟨x²⟩.
    fn rms(&self) -> f64 {
        let (m, s) = (self.mean(), self.std_dev());
        (m * m + s * s).sqrt()
    }

    fn pdf(&self, x: f64) -> f64;

    /// Non-decreasing from 0 to 1 over the support.
    fn cdf(&self, x: f64) -> f64;

    /// Generalized inverse of [`cdf`](Univariate::cdf). `u` is clamped to
    /// [0, 1]; models with infinite support clamp further so the result
    /// stays finite.
    fn quantile(&self, u: f64) -> f64;
}

fn clamp_unit(u: f64) -> f64 {
    if u.is_nan() {
        0.5
    } else {
        u.clamp(0.0, 1.0)
    }
}

// ============================================================================
// Uniform Distribution
// ============================================================================

/// Continuous uniform distribution on `[min, max]`.
///
/// # Mathematical Definition
/// - PDF: f(x) = 1/(max−min) for x ∈ [min, max]
/// - CDF: F(x) = (x−min)/(max−min)
/// - Mean: (min+max)/2
/// - Std: (max−min)/√12
#[derive(Debug, Clone, PartialEq)]
pub struct Uniform {
    min: f64,
    max: f64,
}

impl Uniform {
    /// Creates a new uniform distribution on `[min, max]`.
    ///
    /// # Errors
    /// Returns `Err` if `min >= max` or either parameter is not finite.
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(Error::InvalidParameters(format!(
                "uniform requires min < max, got min={min}, max={max}"
            )));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

impl Univariate for Uniform {
    fn mean(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    fn std_dev(&self) -> f64 {
        (self.max - self.min) / 12.0_f64.sqrt()
    }

    /// PDF: f(x) = 1/(max−min) for x ∈ [min, max], 0 otherwise.
    fn pdf(&self, x: f64) -> f64 {
        if x >= self.min && x <= self.max {
            1.0 / (self.max - self.min)
        } else {
            0.0
        }
    }

    /// CDF: F(x) = (x−min)/(max−min), clamped to [0, 1].
    fn cdf(&self, x: f64) -> f64 {
        if x <= self.min {
            0.0
        } else if x >= self.max {
            1.0
        } else {
            (x - self.min) / (self.max - self.min)
        }
    }

    fn quantile(&self, u: f64) -> f64 {
        self.min + clamp_unit(u) * (self.max - self.min)
    }
}

// ============================================================================
// Gaussian Distribution
// ============================================================================

/// Normal (Gaussian) distribution N(μ, σ²).
///
/// # Mathematical Definition
/// - PDF: φ(x) = (1/(σ√(2π))) exp(−(x−μ)²/(2σ²))
/// - CDF: Φ((x−μ)/σ) (via standard normal CDF)
/// - Quantile: μ + σ·√2·erf⁻¹(2u − 1)
#[derive(Debug, Clone, PartialEq)]
pub struct Gaussian {
    mu: f64,
    sigma: f64,
}

impl Gaussian {
    /// Creates a new normal distribution N(μ, σ).
    ///
    /// # Errors
    /// Returns `Err` if `sigma ≤ 0` or parameters are not finite.
    pub fn new(mu: f64, sigma: f64) -> Result<Self> {
        if !mu.is_finite() || !sigma.is_finite() || sigma <= 0.0 {
            return Err(Error::InvalidParameters(format!(
                "Gaussian requires finite μ and σ > 0, got μ={mu}, σ={sigma}"
            )));
        }
        Ok(Self { mu, sigma })
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }
}

impl Univariate for Gaussian {
    fn mean(&self) -> f64 {
        self.mu
    }

    fn std_dev(&self) -> f64 {
        self.sigma
    }

    fn pdf(&self, x: f64) -> f64 {
        let z = (x - self.mu) / self.sigma;
        special::standard_normal_pdf(z) / self.sigma
    }

    fn cdf(&self, x: f64) -> f64 {
        let z = (x - self.mu) / self.sigma;
        special::standard_normal_cdf(z)
    }

    /// `u` is clamped into `[ε, 1 − ε]` so the tails stay finite.
    fn quantile(&self, u: f64) -> f64 {
        let u = clamp_unit(u).clamp(f64::EPSILON, 1.0 - f64::EPSILON);
        self.mu + self.sigma * std::f64::consts::SQRT_2 * special::erf_inv(2.0 * u - 1.0)
    }
}

// ============================================================================
// Radial Gaussian (Rayleigh)
// ============================================================================

/// Radius of a round beam whose x and y are independent N(0, σ²).
///
/// # Mathematical Definition
/// - PDF: f(r) = (r/σ²) exp(−r²/(2σ²)) for r ≥ 0
/// - CDF: F(r) = 1 − exp(−r²/(2σ²))
/// - Quantile: σ·√(−2 ln(1 − u))
/// - Mean: σ√(π/2), RMS: σ√2
#[derive(Debug, Clone, PartialEq)]
pub struct RadialGaussian {
    sigma: f64,
}

impl RadialGaussian {
    /// # Errors
    /// Returns `Err` if `sigma ≤ 0` or not finite.
    pub fn new(sigma: f64) -> Result<Self> {
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(Error::InvalidParameters(format!(
                "radial Gaussian requires sigma_xy > 0, got {sigma}"
            )));
        }
        Ok(Self { sigma })
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }
}

impl Univariate for RadialGaussian {
    fn mean(&self) -> f64 {
        self.sigma * (std::f64::consts::PI / 2.0).sqrt()
    }

    fn std_dev(&self) -> f64 {
        self.sigma * ((4.0 - std::f64::consts::PI) / 2.0).sqrt()
    }

    fn rms(&self) -> f64 {
        self.sigma * std::f64::consts::SQRT_2
    }

    fn pdf(&self, r: f64) -> f64 {
        if r < 0.0 {
            return 0.0;
        }
        let s2 = self.sigma * self.sigma;
        r / s2 * (-r * r / (2.0 * s2)).exp()
    }

    fn cdf(&self, r: f64) -> f64 {
        if r <= 0.0 {
            return 0.0;
        }
        -(-r * r / (2.0 * self.sigma * self.sigma)).exp_m1()
    }

    fn quantile(&self, u: f64) -> f64 {
        let u = clamp_unit(u).min(1.0 - f64::EPSILON);
        self.sigma * (-2.0 * (-u).ln_1p()).sqrt()
    }
}

// ============================================================================
// Truncated Radial Gaussian
// ============================================================================

/// Rayleigh radius clipped at a pinhole of radius `R`.
///
/// The underlying σ is chosen so that the fraction `f` of the untruncated
/// distribution lies beyond the pinhole: `exp(−R²/(2σ²)) = f`, i.e.
/// `σ = R / √(−2 ln f)`.
///
/// # Mathematical Definition
/// - CDF: F(r) = (1 − exp(−r²/(2σ²))) / (1 − f) on [0, R]
/// - Quantile: σ·√(−2 ln(1 − u(1 − f)))
/// - Mean: (σ√(π/2)·erf(R/(σ√2)) − R·f) / (1 − f)
/// - ⟨r²⟩: 2σ²(1 − (1 + S)f) / (1 − f), with S = R²/(2σ²)
#[derive(Debug, Clone, PartialEq)]
pub struct TruncatedRadialGaussian {
    radius: f64,
    fraction: f64,
    sigma: f64,
}

impl TruncatedRadialGaussian {
    /// Creates the model from the pinhole radius and truncation fraction.
    ///
    /// # Errors
    /// Returns `Err` if `radius ≤ 0` or `fraction` is outside (0, 1).
    pub fn new(radius: f64, fraction: f64) -> Result<Self> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(Error::InvalidParameters(format!(
                "truncated radial Gaussian requires a pinhole radius > 0, got {radius}"
            )));
        }
        if fraction.is_nan() || fraction <= 0.0 || fraction >= 1.0 {
            return Err(Error::InvalidParameters(format!(
                "truncation fraction must lie in (0, 1), got {fraction}"
            )));
        }
        let sigma = radius / (-2.0 * fraction.ln()).sqrt();
        Ok(Self {
            radius,
            fraction,
            sigma,
        })
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    /// σ of the untruncated Rayleigh distribution.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    fn mean_square(&self) -> f64 {
        let s = self.radius * self.radius / (2.0 * self.sigma * self.sigma);
        let f = self.fraction;
        2.0 * self.sigma * self.sigma * (1.0 - (1.0 + s) * f) / (1.0 - f)
    }
}

impl Univariate for TruncatedRadialGaussian {
    fn mean(&self) -> f64 {
        let (r, s, f) = (self.radius, self.sigma, self.fraction);
        let gauss = s * (std::f64::consts::PI / 2.0).sqrt()
            * special::erf(r / (s * std::f64::consts::SQRT_2));
        (gauss - r * f) / (1.0 - f)
    }

    fn std_dev(&self) -> f64 {
        let m = self.mean();
        (self.mean_square() - m * m).max(0.0).sqrt()
    }

    fn rms(&self) -> f64 {
        self.mean_square().sqrt()
    }

    fn pdf(&self, r: f64) -> f64 {
        if r < 0.0 || r > self.radius {
            return 0.0;
        }
        let s2 = self.sigma * self.sigma;
        r / s2 * (-r * r / (2.0 * s2)).exp() / (1.0 - self.fraction)
    }

    fn cdf(&self, r: f64) -> f64 {
        if r <= 0.0 {
            return 0.0;
        }
        if r >= self.radius {
            return 1.0;
        }
        let untruncated = -(-r * r / (2.0 * self.sigma * self.sigma)).exp_m1();
        (untruncated / (1.0 - self.fraction)).min(1.0)
    }

    fn quantile(&self, u: f64) -> f64 {
        let u = clamp_unit(u);
        let r = self.sigma * (-2.0 * (-u * (1.0 - self.fraction)).ln_1p()).sqrt();
        r.min(self.radius)
    }
}

// ============================================================================
// Unit-carrying distribution
// ============================================================================

/// The model behind a [`Distribution`].
#[derive(Debug, Clone)]
pub enum DistributionKind {
    Uniform(Uniform),
    Gaussian(Gaussian),
    RadialGaussian(RadialGaussian),
    TruncatedRadialGaussian(TruncatedRadialGaussian),
    Tabulated(Tabulated1d),
    RadialFile(RadialFile),
    PulseStacking(PulseStacking),
}

impl DistributionKind {
    fn model(&self) -> &dyn Univariate {
        match self {
            DistributionKind::Uniform(d) => d,
            DistributionKind::Gaussian(d) => d,
            DistributionKind::RadialGaussian(d) => d,
            DistributionKind::TruncatedRadialGaussian(d) => d,
            DistributionKind::Tabulated(d) => d,
            DistributionKind::RadialFile(d) => d,
            DistributionKind::PulseStacking(d) => d,
        }
    }

    /// Human-readable model name.
    pub fn name(&self) -> &'static str {
        match self {
            DistributionKind::Uniform(_) => "uniform",
            DistributionKind::Gaussian(_) => "Gaussian",
            DistributionKind::RadialGaussian(_) => "radial Gaussian",
            DistributionKind::TruncatedRadialGaussian(_) => "truncated radial Gaussian",
            DistributionKind::Tabulated(_) => "distribution file",
            DistributionKind::RadialFile(_) => "radial distribution file",
            DistributionKind::PulseStacking(_) => "crystal temporal laser shaping",
        }
    }
}

macro_rules! impl_from_model {
    ($($model:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$model> for DistributionKind {
                fn from(d: $model) -> Self {
                    DistributionKind::$variant(d)
                }
            }
        )*
    };
}

impl_from_model! {
    Uniform => Uniform,
    Gaussian => Gaussian,
    RadialGaussian => RadialGaussian,
    TruncatedRadialGaussian => TruncatedRadialGaussian,
    Tabulated1d => Tabulated,
    RadialFile => RadialFile,
    PulseStacking => PulseStacking,
}

/// A distribution model bound to a coordinate and a physical unit.
///
/// # Examples
/// ```
/// use u_beamgen::distributions::{Distribution, Uniform};
/// use u_beamgen::units::Unit;
/// let d = Distribution::new("x", Unit::parse("mm").unwrap(), Uniform::new(-1.0, 1.0).unwrap());
/// let xs = d.cdfinv(&[0.0, 0.5, 1.0]);
/// assert_eq!(xs.values(), &[-1.0, 0.0, 1.0]);
/// assert!((d.std().value() - 1.0 / 3.0_f64.sqrt()).abs() < 1e-15);
/// ```
#[derive(Debug, Clone)]
pub struct Distribution {
    coordinate: String,
    unit: Unit,
    kind: DistributionKind,
}

impl Distribution {
    pub fn new(coordinate: impl Into<String>, unit: Unit, kind: impl Into<DistributionKind>) -> Self {
        Self {
            coordinate: coordinate.into(),
            unit,
            kind: kind.into(),
        }
    }

    /// Builds the model named by `type_tag` for `coordinate` from its
    /// parameters.
    ///
    /// File-based models read their tables here, so every parameter and
    /// file problem surfaces before any sampling.
    ///
    /// # Errors
    /// - [`Error::UnsupportedDistribution`] for unknown tags or tags not
    ///   valid for `coordinate` (radial models need `r`).
    /// - [`Error::Config`] for missing parameters.
    /// - [`Error::InvalidParameters`] for physically meaningless values.
    /// - [`Error::Unit`] when parameters of one model disagree in dimension.
    pub fn from_params(coordinate: &str, type_tag: &str, params: &ParamMap) -> Result<Self> {
        match (type_tag, coordinate) {
            ("u" | "uniform", _) => uniform_from_params(coordinate, params),
            ("g" | "gaussian", _) => gaussian_from_params(coordinate, params),
            ("rg" | "radial_gaussian", "r") => {
                let sigma = params.quantity("sigma_xy")?;
                Ok(Self::new(
                    coordinate,
                    sigma.unit().clone(),
                    RadialGaussian::new(sigma.value())?,
                ))
            }
            ("tg" | "truncated_radial_gaussian", "r") => truncated_from_params(coordinate, params),
            ("file", "r") => {
                let (path, unit) = file_with_units(coordinate, params)?;
                Ok(Self::new(coordinate, unit, RadialFile::from_file(path)?))
            }
            ("file", c) if c != "xy" => {
                let (path, unit) = file_with_units(coordinate, params)?;
                Ok(Self::new(coordinate, unit, Tabulated1d::from_file(path)?))
            }
            ("crystals", _) => {
                let model = PulseStacking::from_params(params)?;
                Ok(Self::new(coordinate, model.unit(), model))
            }
            _ => Err(Error::UnsupportedDistribution {
                kind: type_tag.to_string(),
                coordinate: coordinate.to_string(),
            }),
        }
    }

    pub fn coordinate(&self) -> &str {
        &self.coordinate
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    pub fn kind(&self) -> &DistributionKind {
        &self.kind
    }

    /// Probability density at each point of `x`, in units of `1/unit`.
    ///
    /// # Errors
    /// Returns [`Error::Unit`] if `x` is not convertible to the model unit.
    pub fn pdf(&self, x: &QuantityVec) -> Result<QuantityVec> {
        let model = self.kind.model();
        let values = x.values_in(&self.unit)?.into_iter().map(|v| model.pdf(v)).collect();
        Ok(QuantityVec::new(values, self.unit.recip()))
    }

    /// Cumulative probability at each point of `x` (dimensionless).
    ///
    /// # Errors
    /// Returns [`Error::Unit`] if `x` is not convertible to the model unit.
    pub fn cdf(&self, x: &QuantityVec) -> Result<QuantityVec> {
        let model = self.kind.model();
        let values = x.values_in(&self.unit)?.into_iter().map(|v| model.cdf(v)).collect();
        Ok(QuantityVec::new(values, Unit::dimensionless()))
    }

    /// Maps uniform draws to coordinate values.
    pub fn cdfinv(&self, u: &[f64]) -> QuantityVec {
        let model = self.kind.model();
        QuantityVec::new(u.iter().map(|&p| model.quantile(p)).collect(), self.unit.clone())
    }

    pub fn avg(&self) -> Quantity {
        Quantity::new(self.kind.model().mean(), self.unit.clone())
    }

    pub fn std(&self) -> Quantity {
        Quantity::new(self.kind.model().std_dev(), self.unit.clone())
    }

    pub fn rms(&self) -> Quantity {
        Quantity::new(self.kind.model().rms(), self.unit.clone())
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = &self.coordinate;
        let q = |value: f64| Quantity::new(value, self.unit.clone());
        write!(f, "{}: ", self.kind.name())?;
        match &self.kind {
            DistributionKind::Uniform(d) => {
                write!(f, "min_{v} = {:.3}, max_{v} = {:.3}", q(d.min()), q(d.max()))
            }
            DistributionKind::Gaussian(d) => {
                write!(f, "avg_{v} = {:.3}, sigma_{v} = {:.3}", q(d.mu()), q(d.sigma()))
            }
            DistributionKind::RadialGaussian(d) => write!(f, "sigma_xy = {:.3}", q(d.sigma())),
            DistributionKind::TruncatedRadialGaussian(d) => write!(
                f,
                "f = {:.3}, pinhole radius = {:.3}",
                d.fraction(),
                q(d.radius())
            ),
            DistributionKind::Tabulated(d) => write!(f, "{} points [{}]", d.len(), self.unit),
            DistributionKind::RadialFile(d) => write!(f, "{} points [{}]", d.len(), self.unit),
            DistributionKind::PulseStacking(d) => write!(
                f,
                "{} crystals, {} pulses, sigma_{v} = {:.3}",
                d.crystals().len(),
                d.pulses().len(),
                q(d.std_dev())
            ),
        }
    }
}

fn uniform_from_params(coordinate: &str, params: &ParamMap) -> Result<Distribution> {
    let min = params.quantity(&format!("min_{coordinate}"))?;
    let max = params
        .quantity(&format!("max_{coordinate}"))?
        .value_in(min.unit())?;
    Ok(Distribution::new(
        coordinate,
        min.unit().clone(),
        Uniform::new(min.value(), max)?,
    ))
}

fn gaussian_from_params(coordinate: &str, params: &ParamMap) -> Result<Distribution> {
    let sigma = params.quantity(&format!("sigma_{coordinate}"))?;
    let avg = match params.optional_quantity(&format!("avg_{coordinate}"))? {
        Some(avg) => avg.value_in(sigma.unit())?,
        None => 0.0,
    };
    Ok(Distribution::new(
        coordinate,
        sigma.unit().clone(),
        Gaussian::new(avg, sigma.value())?,
    ))
}

fn truncated_from_params(coordinate: &str, params: &ParamMap) -> Result<Distribution> {
    let fraction = params
        .quantity("truncation_fraction")?
        .value_in(&Unit::dimensionless())?;
    let radius = match (
        params.optional_quantity("pinhole_size")?,
        params.optional_quantity("pinhole_radius")?,
    ) {
        (Some(size), None) => size.clone() / 2.0,
        (None, Some(radius)) => radius.clone(),
        (Some(_), Some(_)) => {
            return Err(Error::Config(
                "specify either 'pinhole_size' or 'pinhole_radius', not both".into(),
            ))
        }
        (None, None) => {
            return Err(Error::Config(
                "truncated radial Gaussian requires 'pinhole_size' or 'pinhole_radius'".into(),
            ))
        }
    };
    Ok(Distribution::new(
        coordinate,
        radius.unit().clone(),
        TruncatedRadialGaussian::new(radius.value(), fraction)?,
    ))
}

fn file_with_units<'p>(coordinate: &str, params: &'p ParamMap) -> Result<(&'p std::path::Path, Unit)> {
    let file = params.file("file")?;
    let unit = file.units.clone().ok_or_else(|| {
        Error::Config(format!("distribution file for '{coordinate}' must give its units"))
    })?;
    Ok((file.path.as_path(), unit))
}

// ============================================================================
// Tests
// ============================================================================


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn uniform_quantile_roundtrip(
            min in -100.0_f64..0.0,
            max in 1.0_f64..100.0,
            p in 0.0_f64..=1.0,
        ) {
            let u = Uniform::new(min, max).unwrap();
            let p_back = u.cdf(u.quantile(p));
            prop_assert!((p_back - p).abs() < 1e-12, "p={p} -> p_back={p_back}");
        }

        #[test]
        fn gaussian_quantile_roundtrip(
            mu in -10.0_f64..10.0,
            sigma in 0.01_f64..10.0,
            p in 0.001_f64..0.999,
        ) {
            let g = Gaussian::new(mu, sigma).unwrap();
            let p_back = g.cdf(g.quantile(p));
            prop_assert!((p_back - p).abs() < 1e-6, "p={p} -> p_back={p_back}");
        }

        #[test]
        fn radial_gaussian_quantile_roundtrip(
            sigma in 0.01_f64..10.0,
            p in 0.0_f64..0.999,
        ) {
            let rg = RadialGaussian::new(sigma).unwrap();
            let p_back = rg.cdf(rg.quantile(p));
            prop_assert!((p_back - p).abs() < 1e-12, "p={p} -> p_back={p_back}");
        }

        #[test]
        fn truncated_quantile_roundtrip(
            radius in 0.01_f64..10.0,
            fraction in 0.01_f64..0.99,
            p in 0.0_f64..1.0,
        ) {
            let t = TruncatedRadialGaussian::new(radius, fraction).unwrap();
            let r = t.quantile(p);
            prop_assert!(r >= 0.0 && r <= radius);
            let p_back = t.cdf(r);
            prop_assert!((p_back - p).abs() < 1e-9, "p={p} -> p_back={p_back}");
        }

        #[test]
        fn truncated_cdf_monotone(
            fraction in 0.01_f64..0.99,
            a in 0.0_f64..1.0,
            b in 0.0_f64..1.0,
        ) {
            let t = TruncatedRadialGaussian::new(1.0, fraction).unwrap();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(t.cdf(lo) <= t.cdf(hi));
        }
    }
}
