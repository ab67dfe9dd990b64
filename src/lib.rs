//! # u-beamgen
//!
//! Initial phase-space particle distributions for beam-physics simulations.
//!
//! Users describe each coordinate (or coordinate group) by a statistical
//! model with physical units; the generator samples the models by inverse
//! CDF, corrects sampling noise so every coordinate hits its requested
//! average and spread exactly, and returns a macroparticle [`Beam`].
//!
//! ## Modules
//!
//! - [`units`]: units, unit-carrying scalars and arrays, physical constants
//! - [`special`]: error function and normal distribution helpers
//! - [`stats`]: descriptive statistics with numerical stability guarantees
//! - [`integrate`]: trapezoidal, rectangular and radial integration,
//!   interpolation
//! - [`random`]: pseudo-random and Hammersley draw matrices
//! - [`distributions`]: analytic models and the unit-carrying
//!   [`Distribution`]
//! - [`tabulated`]: file-based 1D, radial and 2D models
//! - [`pulse_stacking`]: birefringent crystal laser pulse shaping
//! - [`input`]: JSON input records and typed parameters
//! - [`beam`]: the particle container and its output record
//! - [`generator`]: validation, sampling plan and the sampling pipeline
//!
//! ## Design Philosophy
//!
//! - **Numerical stability first**: Welford's algorithm for variance,
//!   Kahan summation for accumulation
//! - **Errors before sampling**: every model and file is built and checked
//!   before the first random number is drawn
//! - **Property-based testing**: mathematical invariants verified via proptest

pub mod beam;
pub mod distributions;
pub mod error;
pub mod generator;
pub mod input;
pub mod integrate;
pub mod pulse_stacking;
pub mod random;
pub mod special;
pub mod stats;
pub mod tabulated;
pub mod units;

pub use beam::{Beam, BeamData, Coordinate};
pub use distributions::{Distribution, DistributionKind, Univariate};
pub use error::{Error, Result};
pub use generator::{BeamConfig, Generator, SamplingPlan};
pub use input::GeneratorInput;
pub use units::{PhysicalConstants, Quantity, QuantityVec, Unit};
