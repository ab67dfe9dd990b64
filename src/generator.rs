//! Beam generation: input validation, sampling plan and the sampling
//! pipeline.
//!
//! [`Generator::parse_input`] turns a [`GeneratorInput`] into a validated
//! [`BeamConfig`]. [`Generator::beam`] then runs:
//!
//! 1. build every distribution model and assign random-draw rows to
//!    coordinate groups ([`SamplingPlan`]);
//! 2. allocate a zero-filled [`Beam`];
//! 3. draw a `population × N` uniform matrix;
//! 4. sample the radial group (`r` with `theta` explicit or uniform);
//! 5. sample the joint `xy` group;
//! 6. sample the remaining one-dimensional coordinates;
//! 7. apply beam-level `avg_`/`sigma_` overrides for x, y and t;
//! 8. rescale every coordinate to its target spread around zero;
//! 9. rotate (x, y) by `rotate_xy`;
//! 10. shift every coordinate to its target average;
//! 11. fold `pz` into the forward hemisphere (cathode start).
//!
//! # Examples
//! ```
//! use u_beamgen::beam::Coordinate;
//! use u_beamgen::generator::Generator;
//! use u_beamgen::input::GeneratorInput;
//! use u_beamgen::units::{PhysicalConstants, Unit};
//!
//! let input = GeneratorInput::from_json_str(r#"{
//!     "beam": {
//!         "particle_count": 2000,
//!         "rand_type": "hammersley",
//!         "start_type": "cathode",
//!         "params": {
//!             "total_charge": {"value": 10, "units": "pC"},
//!             "MTE": {"value": 150, "units": "meV"}
//!         }
//!     },
//!     "output": {"type": "gpt", "file": "beam.txt"},
//!     "r_dist": {"type": "rg", "params": {"sigma_xy": {"value": 1, "units": "mm"}}},
//!     "t_dist": {"type": "g", "params": {"sigma_t": {"value": 2, "units": "ps"}}}
//! }"#).unwrap();
//!
//! let constants = PhysicalConstants::codata2018();
//! let generator = Generator::new(&constants, 0);
//! let config = generator.parse_input(input).unwrap();
//! let beam = generator.beam(&config).unwrap();
//!
//! let sigma_x = beam.std("x", Some(&Unit::parse("mm").unwrap())).unwrap();
//! assert!((sigma_x.value() - 1.0).abs() < 1e-9);
//! assert!(beam.coordinate(Coordinate::Pz).values().iter().all(|&pz| pz >= 0.0));
//! ```

use std::collections::BTreeMap;
use std::f64::consts::{FRAC_1_SQRT_2, SQRT_2, TAU};
use std::fmt;
use std::ops::Range;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::beam::{Beam, Coordinate};
use crate::distributions::Distribution;
use crate::error::{Error, Result};
use crate::input::{GeneratorInput, OutputInput, Param, ParamMap};
use crate::random::{RandomMatrix, RandomSource};
use crate::stats;
use crate::tabulated::File2d;
use crate::units::{PhysicalConstants, Quantity, QuantityVec, Unit};

/// Output file used when the input names none.
pub const DEFAULT_OUTPUT_FILE: &str = "test.out.txt";

/// Coordinates that may carry a `<var>_dist` section.
const DIST_VARS: [&str; 10] = ["r", "theta", "xy", "x", "y", "z", "px", "py", "pz", "t"];

/// Coordinates whose targets may be overridden from the beam block.
const OVERRIDABLE: [Coordinate; 3] = [Coordinate::X, Coordinate::Y, Coordinate::T];

// ============================================================================
// Configuration
// ============================================================================

/// How the beam leaves its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartType {
    /// Emission from a photocathode: momenta follow from the MTE and `pz`
    /// points away from the surface.
    Cathode,
}

impl FromStr for StartType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cathode" => Ok(StartType::Cathode),
            other => Err(Error::UnsupportedStartType(other.to_string())),
        }
    }
}

impl fmt::Display for StartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartType::Cathode => f.write_str("cathode"),
        }
    }
}

/// Where and how the generated beam should be written.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSpec {
    pub format: String,
    pub file: PathBuf,
}

/// One `<var>_dist` section with converted parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionSpec {
    pub kind: String,
    pub params: ParamMap,
}

/// Validated generator input.
#[derive(Debug, Clone, PartialEq)]
pub struct BeamConfig {
    particle_count: usize,
    total_charge: Quantity,
    species: String,
    start_type: StartType,
    random_source: RandomSource,
    beam_params: ParamMap,
    output: OutputSpec,
    distributions: BTreeMap<String, DistributionSpec>,
}

impl BeamConfig {
    pub fn particle_count(&self) -> usize {
        self.particle_count
    }

    pub fn total_charge(&self) -> &Quantity {
        &self.total_charge
    }

    pub fn species(&self) -> &str {
        &self.species
    }

    pub fn start_type(&self) -> StartType {
        self.start_type
    }

    pub fn random_source(&self) -> RandomSource {
        self.random_source
    }

    /// Parameters of the `beam` block.
    pub fn beam_params(&self) -> &ParamMap {
        &self.beam_params
    }

    pub fn output(&self) -> &OutputSpec {
        &self.output
    }

    /// The distribution section for `var` (`"r"`, `"xy"`, `"t"`, ...).
    pub fn distribution(&self, var: &str) -> Option<&DistributionSpec> {
        self.distributions.get(var)
    }
}

// ============================================================================
// Sampling plan
// ============================================================================

/// Target moments of one coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub avg: Quantity,
    pub std: Quantity,
}

/// A set of coordinates sampled together from consecutive draw rows.
#[derive(Debug, Clone)]
pub enum SamplingGroup {
    /// `r` from its model and `theta` either from its own model or
    /// uniform on [0, 2π). Always owns two rows.
    Radial {
        r: Distribution,
        theta: Option<Distribution>,
        /// RMS radius used for the x and y spread under cylindrical
        /// symmetry.
        rrms: Quantity,
        rows: Range<usize>,
    },
    /// Joint (x, y) table; owns two rows.
    Joint { dist: File2d, rows: Range<usize> },
    /// One independent coordinate with its target moments.
    Single {
        coordinate: Coordinate,
        dist: Distribution,
        target: Target,
        row: usize,
    },
}

impl SamplingGroup {
    /// Draw rows consumed by this group.
    pub fn rows(&self) -> Range<usize> {
        match self {
            SamplingGroup::Radial { rows, .. } | SamplingGroup::Joint { rows, .. } => rows.clone(),
            SamplingGroup::Single { row, .. } => *row..*row + 1,
        }
    }
}

/// Groups in execution order with their row assignment.
#[derive(Debug, Clone)]
pub struct SamplingPlan {
    groups: Vec<SamplingGroup>,
    population: usize,
}

impl SamplingPlan {
    pub fn groups(&self) -> &[SamplingGroup] {
        &self.groups
    }

    /// Number of draw rows the plan consumes.
    pub fn population(&self) -> usize {
        self.population
    }

    fn push(&mut self, width: usize, group: impl FnOnce(Range<usize>) -> SamplingGroup) {
        let rows = self.population..self.population + width;
        self.population += width;
        self.groups.push(group(rows));
    }
}

// ============================================================================
// Generator
// ============================================================================

/// Builds beams from validated configurations.
///
/// Holds only a shared reference to the physical constants; every call
/// produces an independent beam.
#[derive(Debug, Clone, Copy)]
pub struct Generator<'a> {
    constants: &'a PhysicalConstants,
    verbose: u8,
}

impl<'a> Generator<'a> {
    /// `verbose == 0` silences all diagnostics.
    pub fn new(constants: &'a PhysicalConstants, verbose: u8) -> Self {
        Self { constants, verbose }
    }

    fn note(&self, indent: usize, message: fmt::Arguments<'_>) {
        if self.verbose > 0 {
            info!("{}{}", "   ".repeat(indent), message);
        }
    }

    fn caution(&self, indent: usize, message: fmt::Arguments<'_>) {
        if self.verbose > 0 {
            warn!("{}{}", "   ".repeat(indent), message);
        }
    }

    /// Validates an input document.
    ///
    /// For cathode starts any user `px`/`py`/`pz` sections are replaced by
    /// Gaussians of width [`thermal_momentum_spread`].
    ///
    /// # Errors
    /// - [`Error::Config`] for unknown sections, more than one transverse
    ///   section, `theta` without `r`, a zero particle count, unknown
    ///   `rand_type` or species, or missing `total_charge`/`MTE`.
    /// - [`Error::UnsupportedStartType`] for anything but `"cathode"`.
    /// - [`Error::Unit`] for unparseable units or a non-charge
    ///   `total_charge`.
    pub fn parse_input(&self, input: GeneratorInput) -> Result<BeamConfig> {
        let GeneratorInput {
            beam,
            output,
            distributions,
        } = input;

        if beam.particle_count == 0 {
            return Err(Error::Config("particle_count must be positive".into()));
        }

        let mut dists = BTreeMap::new();
        for (key, section) in &distributions {
            let var = key
                .strip_suffix("_dist")
                .filter(|v| DIST_VARS.contains(v))
                .ok_or_else(|| Error::Config(format!("unrecognized input section '{key}'")))?;
            dists.insert(
                var.to_string(),
                DistributionSpec {
                    kind: section.kind.clone(),
                    params: ParamMap::from_raw(&section.params)?,
                },
            );
        }
        check_transverse(&dists)?;

        let start_type: StartType = beam.start_type.parse()?;
        let species = beam.species.unwrap_or_else(|| "electron".to_string());
        if self.constants.rest_energy(&species).is_none() {
            return Err(Error::Config(format!("unsupported species '{species}'")));
        }

        let beam_params = ParamMap::from_raw(&beam.params)?;
        let total_charge = beam_params.quantity("total_charge")?.clone();
        total_charge.to(&Unit::coulomb())?;

        let random_source = match beam.rand_type.as_deref() {
            Some("hammersley") => RandomSource::Hammersley,
            None | Some("random") | Some("pseudo") => RandomSource::Pseudo {
                seed: beam.random_seed,
            },
            Some(other) => {
                return Err(Error::Config(format!(
                    "rand_type must be 'hammersley' or 'random', got '{other}'"
                )))
            }
        };

        match start_type {
            StartType::Cathode => {
                for var in ["px", "py", "pz"] {
                    if dists.contains_key(var) {
                        self.caution(
                            0,
                            format_args!("Ignoring user specified {var} distribution for cathode start."),
                        );
                    }
                }
                let mte = beam_params.quantity("MTE").map_err(|_| {
                    Error::Config("cathode start requires the beam parameter 'MTE'".into())
                })?;
                let sigma_p = thermal_momentum_spread(self.constants, &species, mte)?;
                for var in ["px", "py", "pz"] {
                    let mut params = ParamMap::new();
                    params.insert(format!("sigma_{var}"), Param::Quantity(sigma_p.clone()));
                    dists.insert(
                        var.to_string(),
                        DistributionSpec {
                            kind: "g".into(),
                            params,
                        },
                    );
                }
            }
        }

        let output = self.output_spec(output);

        Ok(BeamConfig {
            particle_count: beam.particle_count,
            total_charge,
            species,
            start_type,
            random_source,
            beam_params,
            output,
            distributions: dists,
        })
    }

    fn output_spec(&self, output: Option<OutputInput>) -> OutputSpec {
        let (format, file) = match output {
            Some(o) => (o.format, o.file),
            None => ("json".to_string(), None),
        };
        let file = file.unwrap_or_else(|| {
            self.caution(
                1,
                format_args!("Warning: no output file specified, defaulting to {DEFAULT_OUTPUT_FILE}."),
            );
            PathBuf::from(DEFAULT_OUTPUT_FILE)
        });
        OutputSpec { format, file }
    }

    /// Parses and generates in one call.
    pub fn generate(&self, input: GeneratorInput) -> Result<Beam> {
        let config = self.parse_input(input)?;
        self.beam(&config)
    }

    /// Builds every model and assigns draw rows: radial group, joint xy
    /// group, then x, y, z, px, py, pz, t.
    ///
    /// # Errors
    /// Any model construction error, and [`Error::Unit`] when a model's
    /// unit does not match its coordinate's dimension.
    pub fn sampling_plan(&self, config: &BeamConfig) -> Result<SamplingPlan> {
        let mut plan = SamplingPlan {
            groups: Vec::new(),
            population: 0,
        };

        if let Some(spec) = config.distribution("r") {
            let r = Distribution::from_params("r", &spec.kind, &spec.params)?;
            r.unit().factor_to(&Unit::metre())?;
            let theta = config
                .distribution("theta")
                .map(|t| Distribution::from_params("theta", &t.kind, &t.params))
                .transpose()?;
            if let Some(theta) = &theta {
                theta.unit().factor_to(&Unit::radian())?;
            }
            let sigma_xy = match spec.params.optional_quantity("sigma_xy")? {
                Some(s) => Some(s),
                None => config.beam_params.optional_quantity("sigma_xy")?,
            };
            let rrms = match sigma_xy {
                Some(s) => s.clone() * SQRT_2,
                None => r.rms(),
            };
            plan.push(2, |rows| SamplingGroup::Radial {
                r,
                theta,
                rrms,
                rows,
            });
        }

        if let Some(spec) = config.distribution("xy") {
            if spec.kind != "file" {
                return Err(Error::UnsupportedDistribution {
                    kind: spec.kind.clone(),
                    coordinate: "xy".into(),
                });
            }
            let file = spec.params.file("file")?;
            let dist = File2d::from_file(&file.path)?;
            dist.x_unit().factor_to(&Unit::metre())?;
            dist.y_unit().factor_to(&Unit::metre())?;
            plan.push(2, |rows| SamplingGroup::Joint { dist, rows });
        }

        for coordinate in Coordinate::KINETIC {
            let var = coordinate.name();
            let Some(spec) = config.distribution(var) else {
                continue;
            };
            let dist = Distribution::from_params(var, &spec.kind, &spec.params)?;
            dist.unit().factor_to(&coordinate.unit())?;
            let avg = match spec.params.optional_quantity(&format!("avg_{var}"))? {
                Some(avg) => avg.clone(),
                None => dist.avg(),
            };
            let std = match spec.params.optional_quantity(&format!("sigma_{var}"))? {
                Some(std) => std.clone(),
                None => dist.std(),
            };
            plan.push(1, |rows| SamplingGroup::Single {
                coordinate,
                dist,
                target: Target { avg, std },
                row: rows.start,
            });
        }

        Ok(plan)
    }

    /// Generates a beam, drawing the uniform matrix from the configured
    /// source.
    pub fn beam(&self, config: &BeamConfig) -> Result<Beam> {
        let plan = self.sampling_plan(config)?;
        let draws = RandomMatrix::draw(
            config.random_source,
            config.particle_count,
            plan.population(),
        );
        self.run(config, &plan, &draws)
    }

    /// Generates a beam from caller-supplied draws.
    ///
    /// # Errors
    /// [`Error::InvalidParameters`] if `draws` has fewer rows than the plan
    /// needs or a row length other than the particle count.
    pub fn beam_from_draws(&self, config: &BeamConfig, draws: &RandomMatrix) -> Result<Beam> {
        let plan = self.sampling_plan(config)?;
        self.run(config, &plan, draws)
    }

    fn run(&self, config: &BeamConfig, plan: &SamplingPlan, draws: &RandomMatrix) -> Result<Beam> {
        let watch = Instant::now();
        let n = config.particle_count;
        if draws.n() != n || draws.dims() < plan.population() {
            return Err(Error::InvalidParameters(format!(
                "sampling needs a {}×{n} draw matrix, got {}×{}",
                plan.population(),
                draws.dims(),
                draws.n()
            )));
        }

        self.note(0, format_args!("Distribution format: {}", config.output.format));
        self.note(0, format_args!("Output file: {}", config.output.file.display()));
        self.note(0, format_args!("Creating beam distribution...."));
        self.note(1, format_args!("Beam starting from: {}.", config.start_type));
        self.note(1, format_args!("Total charge: {:.3}.", config.total_charge));
        self.note(1, format_args!("Number of macroparticles: {n}."));

        let mut beam = Beam::new(n, config.total_charge.clone(), config.species.clone())?;
        let mut targets: BTreeMap<Coordinate, Target> = Coordinate::KINETIC
            .into_iter()
            .map(|c| {
                let zero = Quantity::new(0.0, c.unit());
                (c, Target { avg: zero.clone(), std: zero })
            })
            .collect();

        for group in plan.groups() {
            self.sample_group(group, draws, &mut beam, &mut targets)?;
        }

        for c in OVERRIDABLE {
            self.apply_override(c, &config.beam_params, &mut targets)?;
        }

        for (&c, target) in &targets {
            let std = target.std.value_in(&c.unit())?;
            let (mean, realized) = normalize_moments(beam.values_mut(c), std).ok_or_else(|| {
                Error::InvalidParameters(format!("sampled coordinate '{c}' has non-finite values"))
            })?;
            debug!(coordinate = %c, mean, std = realized, target = std, "moment correction");
        }

        if let Some(angle) = config.beam_params.optional_quantity("rotate_xy")? {
            let angle = angle.value_in(&Unit::radian())?;
            self.note(1, format_args!("Rotating (x, y) by {angle:.3} rad."));
            rotate_xy(&mut beam, angle);
        }

        for (&c, target) in &targets {
            let avg = target.avg.value_in(&c.unit())?;
            for v in beam.values_mut(c) {
                *v += avg;
            }
        }

        match config.start_type {
            StartType::Cathode => {
                for pz in beam.values_mut(Coordinate::Pz) {
                    *pz = pz.abs();
                }
                self.note(1, format_args!("Cathode start: fixing pz momenta to forward hemisphere"));
                if self.verbose > 0 {
                    let pz = beam.coordinate(Coordinate::Pz);
                    if let (Some(avg), Some(std)) = (pz.mean(), pz.std()) {
                        self.note(2, format_args!("avg_pz -> {avg:.3}, sigma_pz -> {std:.3}"));
                    }
                }
            }
        }

        self.note(0, format_args!("...done. Time Elapsed: {:.3?}.", watch.elapsed()));
        Ok(beam)
    }

    fn sample_group(
        &self,
        group: &SamplingGroup,
        draws: &RandomMatrix,
        beam: &mut Beam,
        targets: &mut BTreeMap<Coordinate, Target>,
    ) -> Result<()> {
        match group {
            SamplingGroup::Radial {
                r,
                theta,
                rrms,
                rows,
            } => {
                self.note(1, format_args!("r distribution: {r}"));
                let rs = r.cdfinv(row(draws, rows.start)?);
                let u_theta = row(draws, rows.start + 1)?;
                let thetas = match theta {
                    Some(theta) => {
                        self.note(1, format_args!("theta distribution: {theta}"));
                        theta.cdfinv(u_theta).values_in(&Unit::radian())?
                    }
                    None => {
                        self.note(2, format_args!("Assuming cylindrical symmetry..."));
                        u_theta.iter().map(|u| TAU * u).collect()
                    }
                };
                let (x, y): (Vec<f64>, Vec<f64>) = rs
                    .values()
                    .iter()
                    .zip(&thetas)
                    .map(|(r, th)| {
                        let (sin, cos) = th.sin_cos();
                        (r * cos, r * sin)
                    })
                    .unzip();
                beam.set_coordinate(Coordinate::X, QuantityVec::new(x, rs.unit().clone()))?;
                beam.set_coordinate(Coordinate::Y, QuantityVec::new(y, rs.unit().clone()))?;

                for c in [Coordinate::X, Coordinate::Y] {
                    let target = match theta {
                        // <cos θ> = <sin θ> = 0, <cos² θ> = <sin² θ> = 1/2
                        None => Target {
                            avg: Quantity::new(0.0, rrms.unit().clone()),
                            std: rrms.clone() * FRAC_1_SQRT_2,
                        },
                        Some(_) => realized_target(beam, c)?,
                    };
                    targets.insert(c, target);
                }
            }
            SamplingGroup::Joint { dist, rows } => {
                let source = dist
                    .source()
                    .map_or_else(|| "<memory>".to_string(), |p| p.display().to_string());
                let (rows_n, cols_n) = dist.shape();
                self.note(
                    1,
                    format_args!("xy distribution: file '{source}' ({rows_n}×{cols_n})"),
                );
                let (x, y) = dist.cdfinv(row(draws, rows.start)?, row(draws, rows.start + 1)?);
                beam.set_coordinate(Coordinate::X, x)?;
                beam.set_coordinate(Coordinate::Y, y)?;
                // Spread is the realized one; the file's centring is not kept.
                for c in [Coordinate::X, Coordinate::Y] {
                    let realized = realized_target(beam, c)?;
                    let target = Target {
                        avg: Quantity::new(0.0, c.unit()),
                        std: realized.std,
                    };
                    targets.insert(c, target);
                }
            }
            SamplingGroup::Single {
                coordinate,
                dist,
                target,
                row: index,
            } => {
                self.note(1, format_args!("{coordinate} distribution: {dist}"));
                beam.set_coordinate(*coordinate, dist.cdfinv(row(draws, *index)?))?;
                targets.insert(*coordinate, target.clone());
            }
        }
        Ok(())
    }

    fn apply_override(
        &self,
        c: Coordinate,
        beam_params: &ParamMap,
        targets: &mut BTreeMap<Coordinate, Target>,
    ) -> Result<()> {
        let Some(target) = targets.get_mut(&c) else {
            return Ok(());
        };
        let unit = c.unit();
        if let Some(avg) = beam_params.optional_quantity(&format!("avg_{c}"))? {
            if avg.value_in(&unit)? != target.avg.value_in(&unit)? {
                self.note(1, format_args!("Overwriting distribution avg {c} with user defined value"));
                target.avg = avg.clone();
            }
        }
        if let Some(std) = beam_params.optional_quantity(&format!("sigma_{c}"))? {
            if std.value_in(&unit)? != target.std.value_in(&unit)? {
                self.note(1, format_args!("Overwriting distribution sigma {c} with user defined value"));
                target.std = std.clone();
            }
        }
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Momentum spread of cathode emission, `sqrt(2·MTE/mc²)·mc`.
///
/// # Errors
/// - [`Error::Config`] for unknown species.
/// - [`Error::Unit`] if `mte` is not an energy.
/// - [`Error::InvalidParameters`] if `mte` is negative.
pub fn thermal_momentum_spread(
    constants: &PhysicalConstants,
    species: &str,
    mte: &Quantity,
) -> Result<Quantity> {
    let unknown = || Error::Config(format!("unsupported species '{species}'"));
    let mc2 = constants.rest_energy(species).ok_or_else(unknown)?;
    let mc = constants.rest_momentum(species).ok_or_else(unknown)?;
    let ratio = (mte / &mc2).value_in(&Unit::dimensionless())?;
    if ratio.is_nan() || ratio < 0.0 {
        return Err(Error::InvalidParameters(format!(
            "MTE must be non-negative, got {mte}"
        )));
    }
    Ok(mc * (2.0 * ratio).sqrt())
}

/// Shifts `values` to zero mean and scales them to spread `target_std`.
///
/// Values with zero spread are only shifted. Returns the realized
/// `(mean, std)` before the correction, or `None` if `values` is empty or
/// not finite.
///
/// # Complexity
/// Time: O(n), Space: O(1)
pub fn normalize_moments(values: &mut [f64], target_std: f64) -> Option<(f64, f64)> {
    let mean = stats::mean(values)?;
    let std = stats::population_std_dev(values)?;
    let scale = if std > 0.0 { target_std / std } else { 1.0 };
    for v in values.iter_mut() {
        *v = (*v - mean) * scale;
    }
    Some((mean, std))
}

/// Rotates (x, y) counter-clockwise by `angle` radians.
fn rotate_xy(beam: &mut Beam, angle: f64) {
    let (sin, cos) = angle.sin_cos();
    let x = beam.coordinate(Coordinate::X).values().to_vec();
    let y = beam.coordinate(Coordinate::Y).values().to_vec();
    for (xi, (&x0, &y0)) in beam.values_mut(Coordinate::X).iter_mut().zip(x.iter().zip(&y)) {
        *xi = cos * x0 - sin * y0;
    }
    for (yi, (&x0, &y0)) in beam.values_mut(Coordinate::Y).iter_mut().zip(x.iter().zip(&y)) {
        *yi = sin * x0 + cos * y0;
    }
}

fn row(draws: &RandomMatrix, index: usize) -> Result<&[f64]> {
    draws.row(index).ok_or_else(|| {
        Error::InvalidParameters(format!("draw matrix has no row {index}"))
    })
}

fn realized_target(beam: &Beam, c: Coordinate) -> Result<Target> {
    let values = beam.coordinate(c);
    match (values.mean(), values.std()) {
        (Some(avg), Some(std)) => Ok(Target { avg, std }),
        _ => Err(Error::InvalidParameters(format!(
            "sampled coordinate '{c}' has non-finite values"
        ))),
    }
}

fn check_transverse(dists: &BTreeMap<String, DistributionSpec>) -> Result<()> {
    let has = |var: &str| dists.contains_key(var);
    for axis in ["x", "y"] {
        let count = ["r", axis, "xy"].into_iter().filter(|&v| has(v)).count();
        if count > 1 {
            return Err(Error::Config(format!(
                "specify only one of r_dist, {axis}_dist or xy_dist"
            )));
        }
    }
    if has("theta") && !has("r") {
        return Err(Error::Config("theta_dist requires r_dist".into()));
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(40))]

        #[test]
        fn moment_correction_is_exact(
            n in 2_usize..400,
            seed in any::<u64>(),
            avg in -5.0_f64..5.0,
            sigma in 0.01_f64..5.0,
        ) {
            let json = format!(
                r#"{{
                    "beam": {{
                        "particle_count": {n}, "rand_type": "random", "random_seed": {seed},
                        "start_type": "cathode",
                        "params": {{
                            "total_charge": {{"value": 1, "units": "nC"}},
                            "MTE": {{"value": 100, "units": "meV"}}
                        }}
                    }},
                    "z_dist": {{"type": "g", "params": {{
                        "avg_z": {{"value": {avg}, "units": "mm"}},
                        "sigma_z": {{"value": {sigma}, "units": "mm"}}}}}}
                }}"#
            );
            let constants = PhysicalConstants::codata2018();
            let generator = Generator::new(&constants, 0);
            let beam = generator
                .generate(GeneratorInput::from_json_str(&json).unwrap())
                .unwrap();
            let mm = Unit::parse("mm").unwrap();
            let m = beam.avg("z", Some(&mm)).unwrap().value();
            let s = beam.std("z", Some(&mm)).unwrap().value();
            prop_assert!((m - avg).abs() < 1e-9 * (1.0 + avg.abs()), "mean {m} vs {avg}");
            prop_assert!((s - sigma).abs() < 1e-9 * sigma, "std {s} vs {sigma}");
        }

        #[test]
        fn normalize_moments_hits_target(
            values in prop::collection::vec(-1e3_f64..1e3, 2..200),
            target in 0.001_f64..100.0,
        ) {
            let mut v = values.clone();
            let (_, std) = normalize_moments(&mut v, target).unwrap();
            if std > 1e-3 {
                let mean = stats::mean(&v).unwrap();
                let spread = stats::population_std_dev(&v).unwrap();
                prop_assert!(mean.abs() < 1e-9 * (1.0 + target));
                prop_assert!((spread - target).abs() < 1e-8 * target);
            }
        }
    }
}
