//! Temporal laser pulse shaping by birefringent crystal stacking.
//!
//! A Gaussian laser pulse, linearly polarized along x, passes a sequence
//! of birefringent crystals. Each crystal splits every incoming pulse into
//! projections on its fast and slow axes; the slow copy is delayed by
//! `delay_per_length × length`. After `k` crystals up to `2^k` pulses
//! remain, and the emitted time profile is their incoherent intensity sum.
//!
//! # Parameters
//!
//! | Name | Meaning | Default |
//! |---|---|---|
//! | `crystal_length_<k>` | thickness of crystal `k` | required |
//! | `crystal_angle_<k>` | fast-axis angle of crystal `k` | required |
//! | `pulse_fwhm` | FWHM of the input pulse | 1.8 ps |
//! | `delay_per_length` | slow-axis group delay per thickness | 0.8 ps/mm |
//!
//! Crystals are applied in increasing `k`.

use std::f64::consts::FRAC_PI_2;

use crate::distributions::Univariate;
use crate::error::{Error, Result};
use crate::input::ParamMap;
use crate::integrate;
use crate::tabulated::Tabulated1d;
use crate::units::{Quantity, Unit};

/// Input pulse FWHM [ps] when `pulse_fwhm` is not given.
pub const DEFAULT_PULSE_FWHM_PS: f64 = 1.8;
/// Slow-axis delay [ps/mm] when `delay_per_length` is not given.
pub const DEFAULT_DELAY_PS_PER_MM: f64 = 0.8;

/// Pulses weaker than this fraction of the input are dropped.
const MIN_INTENSITY: f64 = 1e-12;
/// Profile grid spacing in units of the pulse σ.
const GRID_STEP_SIGMAS: f64 = 0.05;
/// Profile grid extends this many σ past the first and last pulse.
const GRID_MARGIN_SIGMAS: f64 = 5.0;
/// Largest profile grid; bounds the pulse FWHM against the total delay.
const MAX_GRID_POINTS: usize = 1_000_000;

/// One birefringent plate.
#[derive(Debug, Clone, PartialEq)]
pub struct Crystal {
    pub length: Quantity,
    /// Fast-axis angle from x [rad].
    pub angle: f64,
}

/// A pulse copy after some number of crystals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pulse {
    /// Fraction of the input pulse energy.
    pub intensity: f64,
    /// Polarization angle from x [rad].
    pub polarization: f64,
    /// Delay relative to the undelayed copy, in the model's time unit.
    pub delay: f64,
}

/// Time profile of a crystal-stacked laser pulse.
#[derive(Debug, Clone, PartialEq)]
pub struct PulseStacking {
    crystals: Vec<Crystal>,
    pulses: Vec<Pulse>,
    sigma: f64,
    unit: Unit,
    profile: Tabulated1d,
}

impl PulseStacking {
    /// Builds the profile. Times are expressed in the unit of `pulse_fwhm`.
    ///
    /// # Errors
    /// - [`Error::InvalidParameters`] if there are no crystals, a length is
    ///   negative, the FWHM or delay per length is not positive, or the
    ///   FWHM is too narrow to tabulate against the total delay.
    /// - [`Error::Unit`] if `pulse_fwhm` is not a time or
    ///   `delay_per_length × length` is not a time.
    pub fn new(crystals: Vec<Crystal>, pulse_fwhm: &Quantity, delay_per_length: &Quantity) -> Result<Self> {
        if crystals.is_empty() {
            return Err(Error::InvalidParameters(
                "pulse stacking needs at least one crystal".into(),
            ));
        }
        let unit = pulse_fwhm.unit().clone();
        pulse_fwhm.value_in(&Unit::second())?;
        let fwhm = pulse_fwhm.value();
        if !fwhm.is_finite() || fwhm <= 0.0 {
            return Err(Error::InvalidParameters(format!(
                "pulse FWHM must be positive, got {pulse_fwhm}"
            )));
        }
        if !delay_per_length.value().is_finite() || delay_per_length.value() <= 0.0 {
            return Err(Error::InvalidParameters(format!(
                "delay per length must be positive, got {delay_per_length}"
            )));
        }

        let mut pulses = vec![Pulse {
            intensity: 1.0,
            polarization: 0.0,
            delay: 0.0,
        }];
        for (k, crystal) in crystals.iter().enumerate() {
            if !crystal.length.value().is_finite() || crystal.length.value() < 0.0 {
                return Err(Error::InvalidParameters(format!(
                    "crystal {} has invalid length {}",
                    k + 1,
                    crystal.length
                )));
            }
            let delay = (delay_per_length * &crystal.length).value_in(&unit)?;
            pulses = split_pulses(&pulses, crystal.angle, delay);
        }

        let sigma = fwhm / (2.0 * (2.0 * std::f64::consts::LN_2).sqrt());
        let profile = intensity_profile(&pulses, sigma)?;
        Ok(Self {
            crystals,
            pulses,
            sigma,
            unit,
            profile,
        })
    }

    /// Builds the model from `crystal_length_<k>`, `crystal_angle_<k>`,
    /// `pulse_fwhm` and `delay_per_length` parameters.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if lengths and angles do not pair up by
    /// index, plus everything [`PulseStacking::new`] reports.
    pub fn from_params(params: &ParamMap) -> Result<Self> {
        let lengths = params.indexed_quantities("crystal_length_")?;
        let angles = params.indexed_quantities("crystal_angle_")?;
        if lengths.len() != angles.len()
            || lengths.iter().zip(&angles).any(|((i, _), (j, _))| i != j)
        {
            return Err(Error::Config(
                "every crystal_length_<k> needs a matching crystal_angle_<k>".into(),
            ));
        }
        let crystals = lengths
            .into_iter()
            .zip(angles)
            .map(|((_, length), (_, angle))| {
                Ok(Crystal {
                    length: length.clone(),
                    angle: angle.value_in(&Unit::radian())?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let fwhm = match params.optional_quantity("pulse_fwhm")? {
            Some(q) => q.clone(),
            None => Quantity::parse(DEFAULT_PULSE_FWHM_PS, "ps")?,
        };
        let delay = match params.optional_quantity("delay_per_length")? {
            Some(q) => q.clone(),
            None => Quantity::parse(DEFAULT_DELAY_PS_PER_MM, "ps/mm")?,
        };
        Self::new(crystals, &fwhm, &delay)
    }

    pub fn crystals(&self) -> &[Crystal] {
        &self.crystals
    }

    /// Pulse copies leaving the last crystal.
    pub fn pulses(&self) -> &[Pulse] {
        &self.pulses
    }

    /// σ of each Gaussian pulse copy.
    pub fn pulse_sigma(&self) -> f64 {
        self.sigma
    }

    /// Time unit of every magnitude this model returns.
    pub fn unit(&self) -> Unit {
        self.unit.clone()
    }
}

impl Univariate for PulseStacking {
    fn mean(&self) -> f64 {
        self.profile.mean()
    }

    fn std_dev(&self) -> f64 {
        self.profile.std_dev()
    }

    fn pdf(&self, t: f64) -> f64 {
        self.profile.pdf(t)
    }

    fn cdf(&self, t: f64) -> f64 {
        self.profile.cdf(t)
    }

    fn quantile(&self, u: f64) -> f64 {
        self.profile.quantile(u)
    }
}

fn split_pulses(pulses: &[Pulse], fast_axis: f64, delay: f64) -> Vec<Pulse> {
    let mut out = Vec::with_capacity(2 * pulses.len());
    for p in pulses {
        let (s, c) = (p.polarization - fast_axis).sin_cos();
        let fast = Pulse {
            intensity: p.intensity * c * c,
            polarization: fast_axis,
            delay: p.delay,
        };
        let slow = Pulse {
            intensity: p.intensity * s * s,
            polarization: fast_axis + FRAC_PI_2,
            delay: p.delay + delay,
        };
        out.extend([fast, slow].into_iter().filter(|q| q.intensity > MIN_INTENSITY));
    }
    out
}

/// Incoherent sum of Gaussian pulses, centred on the intensity-weighted
/// mean delay.
fn intensity_profile(pulses: &[Pulse], sigma: f64) -> Result<Tabulated1d> {
    let total: f64 = pulses.iter().map(|p| p.intensity).sum();
    if total <= 0.0 {
        return Err(Error::InvalidParameters("no light leaves the crystal stack".into()));
    }
    let centre = pulses.iter().map(|p| p.intensity * p.delay).sum::<f64>() / total;
    let (lo, hi) = pulses.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
        (lo.min(p.delay), hi.max(p.delay))
    });
    let start = lo - GRID_MARGIN_SIGMAS * sigma;
    let stop = hi + GRID_MARGIN_SIGMAS * sigma;
    let steps = ((stop - start) / (GRID_STEP_SIGMAS * sigma)).ceil();
    if !steps.is_finite() || steps >= MAX_GRID_POINTS as f64 {
        return Err(Error::InvalidParameters(format!(
            "pulse width {sigma} is too narrow for a total delay of {}; \
             the profile would need more than {MAX_GRID_POINTS} points",
            hi - lo
        )));
    }
    let n = steps as usize + 1;

    let ts = integrate::linspace(start, stop, n.max(201));
    let intensity: Vec<f64> = ts
        .iter()
        .map(|&t| {
            pulses
                .iter()
                .map(|p| {
                    let z = (t - p.delay) / sigma;
                    p.intensity * (-0.5 * z * z).exp()
                })
                .sum()
        })
        .collect();
    let centred = ts.into_iter().map(|t| t - centre).collect();
    Tabulated1d::new(centred, intensity)
}

// ============================================================================
// Tests
// ============================================================================
