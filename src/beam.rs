//! Macroparticle beam container.
//!
//! A [`Beam`] holds one array per kinetic coordinate (`x`, `y`, `z`, `px`,
//! `py`, `pz`, `t`) plus the weight array `w`, all of length `n`. Arrays are
//! stored in fixed units (m, eV/c, s); values written with [`Beam::set`]
//! are converted on the way in. The cylindrical coordinates `r`, `theta`,
//! `pr` and `ptheta` are computed on access and cannot be written.
//!
//! # Examples
//! ```
//! use u_beamgen::beam::Beam;
//! use u_beamgen::units::{Quantity, QuantityVec, Unit};
//! let mut beam = Beam::new(2, Quantity::parse(1.0, "pC").unwrap(), "electron").unwrap();
//! let mm = Unit::parse("mm").unwrap();
//! beam.set("x", QuantityVec::new(vec![3.0, 0.0], mm.clone())).unwrap();
//! beam.set("y", QuantityVec::new(vec![4.0, 1.0], mm)).unwrap();
//! let r = beam.get("r").unwrap();
//! assert!((r.values()[0] - 5e-3).abs() < 1e-15);
//! assert!(beam.set("r", r).is_err());
//! ```

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::stats;
use crate::units::{Quantity, QuantityVec, Unit};

// ============================================================================
// Coordinate keys
// ============================================================================

/// Stored beam coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Coordinate {
    X,
    Y,
    Z,
    Px,
    Py,
    Pz,
    T,
    /// Per-particle weight, dimensionless, summing to one.
    W,
}

impl Coordinate {
    /// Every stored coordinate, in storage order.
    pub const ALL: [Coordinate; 8] = [
        Coordinate::X,
        Coordinate::Y,
        Coordinate::Z,
        Coordinate::Px,
        Coordinate::Py,
        Coordinate::Pz,
        Coordinate::T,
        Coordinate::W,
    ];

    /// Phase-space coordinates (everything except the weight).
    pub const KINETIC: [Coordinate; 7] = [
        Coordinate::X,
        Coordinate::Y,
        Coordinate::Z,
        Coordinate::Px,
        Coordinate::Py,
        Coordinate::Pz,
        Coordinate::T,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Coordinate::X => "x",
            Coordinate::Y => "y",
            Coordinate::Z => "z",
            Coordinate::Px => "px",
            Coordinate::Py => "py",
            Coordinate::Pz => "pz",
            Coordinate::T => "t",
            Coordinate::W => "w",
        }
    }

    /// Unit the coordinate is stored in.
    pub fn unit(self) -> Unit {
        match self {
            Coordinate::X | Coordinate::Y | Coordinate::Z => Unit::metre(),
            Coordinate::Px | Coordinate::Py | Coordinate::Pz => Unit::ev_per_c(),
            Coordinate::T => Unit::second(),
            Coordinate::W => Unit::dimensionless(),
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Coordinate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Coordinate::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| {
                if DERIVED.contains(&s) {
                    Error::Config(format!("beam coordinate '{s}' is derived and read-only"))
                } else {
                    Error::Config(format!("beam has no coordinate '{s}'"))
                }
            })
    }
}

/// Keys computed from the stored coordinates.
const DERIVED: [&str; 4] = ["r", "theta", "pr", "ptheta"];

// ============================================================================
// Beam
// ============================================================================

/// Particle ensemble with fixed size and total charge.
#[derive(Debug, Clone, PartialEq)]
pub struct Beam {
    n: usize,
    q: Quantity,
    species: String,
    params: [QuantityVec; 8],
}

impl Beam {
    /// Creates a beam of `n` particles at the origin with equal weights
    /// `1/n`.
    ///
    /// # Errors
    /// - [`Error::InvalidParameters`] if `n == 0`.
    /// - [`Error::Unit`] if `q` is not a charge.
    pub fn new(n: usize, q: Quantity, species: impl Into<String>) -> Result<Self> {
        if n == 0 {
            return Err(Error::InvalidParameters(
                "beam must contain at least one particle".into(),
            ));
        }
        q.to(&Unit::coulomb())?;
        let params = Coordinate::ALL.map(|c| match c {
            Coordinate::W => QuantityVec::new(vec![1.0 / n as f64; n], c.unit()),
            _ => QuantityVec::zeros(n, c.unit()),
        });
        Ok(Self {
            n,
            q,
            species: species.into(),
            params,
        })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    /// Total bunch charge.
    pub fn q(&self) -> &Quantity {
        &self.q
    }

    pub fn species(&self) -> &str {
        &self.species
    }

    /// Stored array for `coordinate`.
    pub fn coordinate(&self, coordinate: Coordinate) -> &QuantityVec {
        &self.params[coordinate.index()]
    }

    pub(crate) fn values_mut(&mut self, coordinate: Coordinate) -> &mut [f64] {
        self.params[coordinate.index()].values_mut()
    }

    /// Looks up a stored or derived coordinate by name.
    ///
    /// # Errors
    /// Returns [`Error::Config`] for unknown keys.
    pub fn get(&self, key: &str) -> Result<QuantityVec> {
        match key {
            "r" => Ok(self.r()),
            "theta" => Ok(self.theta()),
            "pr" => Ok(self.pr()),
            "ptheta" => Ok(self.ptheta()),
            _ => Ok(self.coordinate(key.parse()?).clone()),
        }
    }

    /// Replaces a stored coordinate by name.
    ///
    /// # Errors
    /// - [`Error::Config`] for unknown or derived keys.
    /// - [`Error::InvalidParameters`] if `values` has the wrong length.
    /// - [`Error::Unit`] if `values` has the wrong dimension.
    pub fn set(&mut self, key: &str, values: QuantityVec) -> Result<()> {
        self.set_coordinate(key.parse()?, values)
    }

    /// Replaces a stored coordinate, converting to its storage unit.
    pub fn set_coordinate(&mut self, coordinate: Coordinate, values: QuantityVec) -> Result<()> {
        if values.len() != self.n {
            return Err(Error::InvalidParameters(format!(
                "coordinate '{coordinate}' needs {} values, got {}",
                self.n,
                values.len()
            )));
        }
        self.params[coordinate.index()] = values.to(&coordinate.unit())?;
        Ok(())
    }

    /// Radius `sqrt(x² + y²)` [m].
    pub fn r(&self) -> QuantityVec {
        let values = self.xy().map(|(x, y)| x.hypot(y)).collect();
        QuantityVec::new(values, Unit::metre())
    }

    /// Azimuth `atan2(y, x)` [rad].
    pub fn theta(&self) -> QuantityVec {
        let values = self.xy().map(|(x, y)| y.atan2(x)).collect();
        QuantityVec::new(values, Unit::radian())
    }

    /// Radial momentum `px cos θ + py sin θ` [eV/c].
    pub fn pr(&self) -> QuantityVec {
        self.transverse_momentum(|px, py, (sin, cos)| px * cos + py * sin)
    }

    /// Azimuthal momentum `−px sin θ + py cos θ` [eV/c].
    pub fn ptheta(&self) -> QuantityVec {
        self.transverse_momentum(|px, py, (sin, cos)| -px * sin + py * cos)
    }

    fn xy(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        let x = self.coordinate(Coordinate::X).values();
        let y = self.coordinate(Coordinate::Y).values();
        x.iter().copied().zip(y.iter().copied())
    }

    fn transverse_momentum(&self, f: impl Fn(f64, f64, (f64, f64)) -> f64) -> QuantityVec {
        let px = self.coordinate(Coordinate::Px).values();
        let py = self.coordinate(Coordinate::Py).values();
        let values = self
            .xy()
            .zip(px.iter().zip(py))
            .map(|((x, y), (&px, &py))| f(px, py, y.atan2(x).sin_cos()))
            .collect();
        QuantityVec::new(values, Unit::ev_per_c())
    }

    /// Weighted average of a stored or derived coordinate, optionally
    /// converted to `unit`.
    ///
    /// # Errors
    /// - [`Error::Config`] for unknown keys.
    /// - [`Error::InvalidParameters`] if the values are not finite.
    /// - [`Error::Unit`] if `unit` has the wrong dimension.
    pub fn avg(&self, key: &str, unit: Option<&Unit>) -> Result<Quantity> {
        self.weighted(key, unit, stats::weighted_mean)
    }

    /// Weighted population standard deviation, optionally converted to
    /// `unit`.
    ///
    /// # Errors
    /// Same as [`Beam::avg`].
    pub fn std(&self, key: &str, unit: Option<&Unit>) -> Result<Quantity> {
        self.weighted(key, unit, stats::weighted_std_dev)
    }

    fn weighted(
        &self,
        key: &str,
        unit: Option<&Unit>,
        stat: fn(&[f64], &[f64]) -> Option<f64>,
    ) -> Result<Quantity> {
        let values = self.get(key)?;
        let weights = self.coordinate(Coordinate::W).values();
        let value = stat(values.values(), weights).ok_or_else(|| {
            Error::InvalidParameters(format!("coordinate '{key}' has non-finite values or weights"))
        })?;
        let q = Quantity::new(value, values.unit().clone());
        match unit {
            Some(unit) => Ok(q.to(unit)?),
            None => Ok(q),
        }
    }

    /// Logs weighted average and spread of every kinetic coordinate.
    pub fn log_stats(&self) {
        info!("Beam stats:");
        for c in Coordinate::KINETIC {
            match (self.avg(c.name(), None), self.std(c.name(), None)) {
                (Ok(avg), Ok(std)) => info!("   avg_{c} = {avg:.3}, sigma_{c} = {std:.3}"),
                _ => info!("   {c}: statistics undefined"),
            }
        }
    }

    /// Fixed-unit data record for output.
    ///
    /// # Errors
    /// Returns [`Error::Unit`] only if the stored charge is not a charge,
    /// which [`Beam::new`] already rules out.
    pub fn data(&self) -> Result<BeamData> {
        let total_charge = self.q.value_in(&Unit::coulomb())?;
        let values = |c: Coordinate| self.coordinate(c).values().to_vec();
        Ok(BeamData {
            n_particle: self.n,
            species: self.species.clone(),
            x: values(Coordinate::X),
            y: values(Coordinate::Y),
            z: values(Coordinate::Z),
            px: values(Coordinate::Px),
            py: values(Coordinate::Py),
            pz: values(Coordinate::Pz),
            t: values(Coordinate::T),
            status: vec![1; self.n],
            weight: self
                .coordinate(Coordinate::W)
                .values()
                .iter()
                .map(|w| w * total_charge)
                .collect(),
        })
    }
}

// ============================================================================
// Output record
// ============================================================================

/// Beam data in fixed units: positions [m], momenta [eV/c], time [s],
/// macro-charge weight [C]; `status == 1` marks live particles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeamData {
    pub n_particle: usize,
    pub species: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
    pub px: Vec<f64>,
    pub py: Vec<f64>,
    pub pz: Vec<f64>,
    pub t: Vec<f64>,
    pub status: Vec<i32>,
    pub weight: Vec<f64>,
}

impl BeamData {
    /// Writes the record as JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let io_err = |source| Error::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush().map_err(io_err)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn pc(v: f64) -> Quantity {
        Quantity::parse(v, "pC").unwrap()
    }

    fn unit(s: &str) -> Unit {
        Unit::parse(s).unwrap()
    }

    fn beam_with_xy(x: Vec<f64>, y: Vec<f64>) -> Beam {
        let mut beam = Beam::new(x.len(), pc(10.0), "electron").unwrap();
        beam.set("x", QuantityVec::new(x, unit("m"))).unwrap();
        beam.set("y", QuantityVec::new(y, unit("m"))).unwrap();
        beam
    }

    #[test]
    fn test_new_allocates_zeros_and_equal_weights() {
        let beam = Beam::new(4, pc(1.0), "electron").unwrap();
        assert_eq!(beam.n(), 4);
        for c in Coordinate::KINETIC {
            assert_eq!(beam.coordinate(c).values(), &[0.0; 4]);
            assert_eq!(beam.coordinate(c).unit(), &c.unit());
        }
        assert_eq!(beam.coordinate(Coordinate::W).values(), &[0.25; 4]);
    }

    #[test]
    fn test_new_rejects_empty_and_non_charge() {
        assert!(matches!(
            Beam::new(0, pc(1.0), "electron"),
            Err(Error::InvalidParameters(_))
        ));
        let not_charge = Quantity::parse(1.0, "mm").unwrap();
        assert!(matches!(
            Beam::new(3, not_charge, "electron"),
            Err(Error::Unit(_))
        ));
    }

    #[test]
    fn test_set_converts_to_storage_unit() {
        let mut beam = Beam::new(2, pc(1.0), "electron").unwrap();
        beam.set("t", QuantityVec::new(vec![1.0, 2.0], unit("ps")))
            .unwrap();
        let t = beam.coordinate(Coordinate::T);
        assert_eq!(t.unit(), &Unit::second());
        assert!((t.values()[1] - 2e-12).abs() < 1e-24);

        beam.set("pz", QuantityVec::new(vec![1.0, 0.0], unit("keV/c")))
            .unwrap();
        assert!((beam.coordinate(Coordinate::Pz).values()[0] - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_set_rejects_bad_input() {
        let mut beam = Beam::new(2, pc(1.0), "electron").unwrap();
        let mm = QuantityVec::new(vec![1.0, 2.0], unit("mm"));
        assert!(matches!(beam.set("q", mm.clone()), Err(Error::Config(_))));
        assert!(matches!(beam.set("r", mm.clone()), Err(Error::Config(_))));
        assert!(matches!(beam.set("t", mm), Err(Error::Unit(_))));
        let short = QuantityVec::new(vec![1.0], unit("mm"));
        assert!(matches!(
            beam.set("x", short),
            Err(Error::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_derived_message_names_key() {
        let err = "ptheta".parse::<Coordinate>().unwrap_err();
        assert!(err.to_string().contains("read-only"));
        let err = "E".parse::<Coordinate>().unwrap_err();
        assert!(err.to_string().contains("'E'"));
    }

    #[test]
    fn test_r_and_theta() {
        let beam = beam_with_xy(vec![3.0, 0.0, -1.0], vec![4.0, 2.0, 0.0]);
        let r = beam.get("r").unwrap();
        assert_eq!(r.values(), &[5.0, 2.0, 1.0]);
        let theta = beam.get("theta").unwrap();
        assert!(theta.unit().is_dimensionless());
        assert!((theta.values()[1] - std::f64::consts::FRAC_PI_2).abs() < 1e-15);
        assert!((theta.values()[2] - std::f64::consts::PI).abs() < 1e-15);
    }

    #[test]
    fn test_pr_and_ptheta() {
        // Particle on the +y axis moving along +y: purely radial.
        // Particle on the +x axis moving along +y: purely azimuthal.
        let mut beam = beam_with_xy(vec![0.0, 1.0], vec![1.0, 0.0]);
        beam.set("py", QuantityVec::new(vec![2.0, 3.0], unit("eV/c")))
            .unwrap();
        let pr = beam.get("pr").unwrap();
        let ptheta = beam.get("ptheta").unwrap();
        assert!((pr.values()[0] - 2.0).abs() < 1e-12);
        assert!(ptheta.values()[0].abs() < 1e-12);
        assert!(pr.values()[1].abs() < 1e-12);
        assert!((ptheta.values()[1] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_avg_std() {
        let mut beam = beam_with_xy(vec![1.0, 3.0], vec![0.0, 0.0]);
        beam.set("w", QuantityVec::new(vec![0.75, 0.25], Unit::dimensionless()))
            .unwrap();
        let avg = beam.avg("x", None).unwrap();
        assert!((avg.value() - 1.5).abs() < 1e-12);
        let std = beam.std("x", Some(&unit("mm"))).unwrap();
        // sqrt(0.75·0.25 + 0.25·2.25) = sqrt(0.75)
        assert!((std.value() - 0.75_f64.sqrt() * 1e3).abs() < 1e-9);
        assert!(beam.avg("x", Some(&unit("ps"))).is_err());
    }

    #[test]
    fn test_data_fixed_units() {
        let mut beam = Beam::new(2, pc(10.0), "electron").unwrap();
        beam.set("x", QuantityVec::new(vec![1.0, -1.0], unit("mm")))
            .unwrap();
        let data = beam.data().unwrap();
        assert_eq!(data.n_particle, 2);
        assert_eq!(data.species, "electron");
        assert_eq!(data.status, vec![1, 1]);
        assert!((data.x[0] - 1e-3).abs() < 1e-18);
        let total: f64 = data.weight.iter().sum();
        assert!((total - 10e-12).abs() < 1e-24);
    }

    #[test]
    fn test_write_json() {
        let beam = Beam::new(3, pc(1.0), "electron").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("beam.json");
        beam.data().unwrap().write_json(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["n_particle"], 3);
        assert_eq!(value["status"].as_array().unwrap().len(), 3);
    }
}
