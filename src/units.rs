//! Physical units, unit-carrying values and physical constants.
//!
//! A [`Unit`] is a scale factor to SI plus a [`Dimension`] (exponents of
//! length, mass, time and charge). Angles are dimensionless: `rad` has
//! scale 1 and `deg` scale π/180. Arithmetic that would mix incompatible
//! dimensions goes through checked methods returning [`UnitError`].
//!
//! # Unit strings
//!
//! Products and quotients of base symbols with optional SI prefixes and
//! integer powers, evaluated left to right:
//!
//! | Input | Meaning |
//! |---|---|
//! | `mm`, `um`, `µm` | millimetre, micrometre |
//! | `ps`, `fs` | picosecond, femtosecond |
//! | `nC`, `pC` | nanocoulomb, picocoulomb |
//! | `eV/c`, `keV/c` | momentum |
//! | `meV`, `MeV` | energy |
//! | `1/mm^2`, `1/mm**2` | areal density |
//! | `rad`, `mrad`, `deg` | angles (dimensionless) |
//! | `c` | the speed of light |
//!
//! # Examples
//! ```
//! use u_beamgen::units::{Quantity, Unit};
//! let sigma = Quantity::parse(1.5, "mm").unwrap();
//! let metres = sigma.to(&Unit::parse("m").unwrap()).unwrap();
//! assert!((metres.value() - 1.5e-3).abs() < 1e-15);
//! ```

use std::fmt;
use std::ops::{Div, Mul, Neg};

use thiserror::Error;

use crate::stats;

/// Speed of light in vacuum [m/s].
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;
/// Elementary charge [C].
pub const ELEMENTARY_CHARGE: f64 = 1.602_176_634e-19;
/// Electron rest energy [eV] (CODATA 2018).
pub const ELECTRON_REST_ENERGY_EV: f64 = 510_998.950_00;
/// Proton rest energy [eV] (CODATA 2018).
pub const PROTON_REST_ENERGY_EV: f64 = 938_272_088.16;

/// Unit parsing and dimensional errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnitError {
    /// The unit string contains an unknown symbol or malformed power.
    #[error("could not parse unit '{0}'")]
    Parse(String),

    /// The two units have different physical dimensions.
    #[error("cannot convert from '{from}' to '{to}': incompatible dimensions")]
    Incompatible { from: String, to: String },

    /// Square root of a unit with an odd exponent.
    #[error("unit '{0}' has no square root with integral exponents")]
    NonIntegralPower(String),
}

// ============================================================================
// Dimension
// ============================================================================

/// Exponents of the base dimensions length, mass, time and charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dimension {
    pub length: i8,
    pub mass: i8,
    pub time: i8,
    pub charge: i8,
}

impl Dimension {
    pub const NONE: Dimension = Dimension::new(0, 0, 0, 0);
    pub const LENGTH: Dimension = Dimension::new(1, 0, 0, 0);
    pub const MASS: Dimension = Dimension::new(0, 1, 0, 0);
    pub const TIME: Dimension = Dimension::new(0, 0, 1, 0);
    pub const CHARGE: Dimension = Dimension::new(0, 0, 0, 1);
    pub const VELOCITY: Dimension = Dimension::new(1, 0, -1, 0);
    pub const MOMENTUM: Dimension = Dimension::new(1, 1, -1, 0);
    pub const ENERGY: Dimension = Dimension::new(2, 1, -2, 0);

    pub const fn new(length: i8, mass: i8, time: i8, charge: i8) -> Self {
        Self {
            length,
            mass,
            time,
            charge,
        }
    }

    pub fn is_dimensionless(&self) -> bool {
        *self == Self::NONE
    }

    fn combine(self, other: Self, sign: i8) -> Self {
        Self::new(
            self.length + sign * other.length,
            self.mass + sign * other.mass,
            self.time + sign * other.time,
            self.charge + sign * other.charge,
        )
    }

    fn powi(self, n: i8) -> Self {
        Self::new(
            self.length * n,
            self.mass * n,
            self.time * n,
            self.charge * n,
        )
    }

    fn halved(self) -> Option<Self> {
        let even = |e: i8| e % 2 == 0;
        if even(self.length) && even(self.mass) && even(self.time) && even(self.charge) {
            Some(Self::new(
                self.length / 2,
                self.mass / 2,
                self.time / 2,
                self.charge / 2,
            ))
        } else {
            None
        }
    }
}

// ============================================================================
// Unit
// ============================================================================

const BASE_UNITS: &[(&str, f64, Dimension)] = &[
    ("m", 1.0, Dimension::LENGTH),
    ("s", 1.0, Dimension::TIME),
    ("g", 1e-3, Dimension::MASS),
    ("C", 1.0, Dimension::CHARGE),
    ("eV", ELEMENTARY_CHARGE, Dimension::ENERGY),
    ("J", 1.0, Dimension::ENERGY),
    ("rad", 1.0, Dimension::NONE),
    ("deg", std::f64::consts::PI / 180.0, Dimension::NONE),
    ("c", SPEED_OF_LIGHT, Dimension::VELOCITY),
    ("meter", 1.0, Dimension::LENGTH),
    ("second", 1.0, Dimension::TIME),
    ("coulomb", 1.0, Dimension::CHARGE),
    ("radian", 1.0, Dimension::NONE),
    ("degree", std::f64::consts::PI / 180.0, Dimension::NONE),
];

const PREFIXES: &[(&str, f64)] = &[
    ("f", 1e-15),
    ("p", 1e-12),
    ("n", 1e-9),
    ("u", 1e-6),
    ("µ", 1e-6),
    ("μ", 1e-6),
    ("m", 1e-3),
    ("c", 1e-2),
    ("k", 1e3),
    ("M", 1e6),
    ("G", 1e9),
    ("T", 1e12),
];

fn lookup_base(symbol: &str) -> Option<(f64, Dimension)> {
    BASE_UNITS
        .iter()
        .find(|(s, _, _)| *s == symbol)
        .map(|&(_, scale, dim)| (scale, dim))
}

fn lookup_symbol(symbol: &str) -> Option<(f64, Dimension)> {
    if let Some(found) = lookup_base(symbol) {
        return Some(found);
    }
    PREFIXES.iter().find_map(|&(prefix, factor)| {
        symbol
            .strip_prefix(prefix)
            .filter(|rest| !rest.is_empty())
            .and_then(lookup_base)
            .map(|(scale, dim)| (factor * scale, dim))
    })
}

/// A physical unit: scale factor to SI and dimension.
///
/// Two units compare equal when their dimensions match and their scales
/// agree to a relative tolerance of 1e-12; the display symbol is ignored.
#[derive(Debug, Clone)]
pub struct Unit {
    scale: f64,
    dim: Dimension,
    symbol: String,
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.dim == other.dim
            && (self.scale - other.scale).abs() <= 1e-12 * self.scale.abs().max(other.scale.abs())
    }
}

impl Unit {
    /// The dimensionless unit with scale 1.
    pub fn dimensionless() -> Self {
        Self {
            scale: 1.0,
            dim: Dimension::NONE,
            symbol: String::new(),
        }
    }

    fn named(scale: f64, dim: Dimension, symbol: &str) -> Self {
        Self {
            scale,
            dim,
            symbol: symbol.to_string(),
        }
    }

    pub fn metre() -> Self {
        Self::named(1.0, Dimension::LENGTH, "m")
    }

    pub fn second() -> Self {
        Self::named(1.0, Dimension::TIME, "s")
    }

    pub fn coulomb() -> Self {
        Self::named(1.0, Dimension::CHARGE, "C")
    }

    pub fn radian() -> Self {
        Self::named(1.0, Dimension::NONE, "rad")
    }

    pub fn electron_volt() -> Self {
        Self::named(ELEMENTARY_CHARGE, Dimension::ENERGY, "eV")
    }

    /// Momentum unit eV/c.
    pub fn ev_per_c() -> Self {
        Self::named(ELEMENTARY_CHARGE / SPEED_OF_LIGHT, Dimension::MOMENTUM, "eV/c")
    }

    /// Parses a unit string such as `"mm"`, `"eV/c"`, `"1/mm^2"` or
    /// `"mm*(1/ps)"`. Every symbol produced by [`Display`](fmt::Display)
    /// parses back to an equal unit.
    ///
    /// # Errors
    /// Returns [`UnitError::Parse`] for unknown symbols or malformed powers.
    pub fn parse(text: &str) -> Result<Self, UnitError> {
        let normalized = text.trim().replace("**", "^");
        if normalized.is_empty() || normalized == "1" || normalized == "dimensionless" {
            return Ok(Self::dimensionless());
        }

        let mut parser = UnitParser {
            text,
            chars: normalized.chars().peekable(),
        };
        let (scale, dim) = parser.product()?;
        parser.skip_whitespace();
        if parser.chars.next().is_some() {
            return Err(UnitError::Parse(text.into()));
        }

        Ok(Self {
            scale,
            dim,
            symbol: text.trim().to_string(),
        })
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn dimension(&self) -> Dimension {
        self.dim
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn is_dimensionless(&self) -> bool {
        self.dim.is_dimensionless()
    }

    /// True when values in `self` can be converted to `other`.
    pub fn is_compatible(&self, other: &Unit) -> bool {
        self.dim == other.dim
    }

    /// Multiplicative factor converting a value in `self` to `other`.
    ///
    /// # Errors
    /// Returns [`UnitError::Incompatible`] if the dimensions differ.
    pub fn factor_to(&self, other: &Unit) -> Result<f64, UnitError> {
        if !self.is_compatible(other) {
            return Err(UnitError::Incompatible {
                from: self.to_string(),
                to: other.to_string(),
            });
        }
        Ok(self.scale / other.scale)
    }

    /// Integer power of the unit.
    pub fn powi(&self, n: i8) -> Self {
        Self {
            scale: self.scale.powi(n as i32),
            dim: self.dim.powi(n),
            symbol: format!("{}^{n}", wrap(&self.symbol)),
        }
    }

    /// Square root of the unit.
    ///
    /// # Errors
    /// Returns [`UnitError::NonIntegralPower`] if any exponent is odd.
    pub fn sqrt(&self) -> Result<Self, UnitError> {
        let dim = self
            .dim
            .halved()
            .ok_or_else(|| UnitError::NonIntegralPower(self.to_string()))?;
        Ok(Self {
            scale: self.scale.sqrt(),
            dim,
            symbol: format!("sqrt({})", self.symbol),
        })
    }

    /// Reciprocal unit.
    pub fn recip(&self) -> Self {
        &Unit::dimensionless() / self
    }
}

/// Recursive-descent reader for `product := power (('*' | '/') power)*`,
/// `power := atom ('^' int)?`, `atom := '(' product ')' | 'sqrt(' product ')' | symbol`.
struct UnitParser<'a> {
    text: &'a str,
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl UnitParser<'_> {
    fn error(&self) -> UnitError {
        UnitError::Parse(self.text.into())
    }

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|c| c.is_whitespace()).is_some() {}
    }

    fn expect(&mut self, want: char) -> Result<(), UnitError> {
        self.skip_whitespace();
        match self.chars.next() {
            Some(c) if c == want => Ok(()),
            _ => Err(self.error()),
        }
    }

    fn product(&mut self) -> Result<(f64, Dimension), UnitError> {
        let (mut scale, mut dim) = self.power()?;
        loop {
            self.skip_whitespace();
            let sign = match self.chars.next_if(|&c| c == '*' || c == '/') {
                Some('*') => 1,
                Some(_) => -1,
                None => return Ok((scale, dim)),
            };
            let (f_scale, f_dim) = self.power()?;
            if sign > 0 {
                scale *= f_scale;
            } else {
                scale /= f_scale;
            }
            dim = dim.combine(f_dim, sign);
        }
    }

    fn power(&mut self) -> Result<(f64, Dimension), UnitError> {
        let (scale, dim) = self.atom()?;
        self.skip_whitespace();
        if self.chars.next_if_eq(&'^').is_none() {
            return Ok((scale, dim));
        }
        self.skip_whitespace();
        let mut digits = String::new();
        if let Some(minus) = self.chars.next_if_eq(&'-') {
            digits.push(minus);
        }
        while let Some(d) = self.chars.next_if(char::is_ascii_digit) {
            digits.push(d);
        }
        let n: i8 = digits.parse().map_err(|_| self.error())?;
        Ok((scale.powi(n as i32), dim.powi(n)))
    }

    fn atom(&mut self) -> Result<(f64, Dimension), UnitError> {
        self.skip_whitespace();
        if self.chars.next_if_eq(&'(').is_some() {
            let inner = self.product()?;
            self.expect(')')?;
            return Ok(inner);
        }
        let mut symbol = String::new();
        while let Some(c) = self
            .chars
            .next_if(|c| !c.is_whitespace() && !"*/^()".contains(*c))
        {
            symbol.push(c);
        }
        match symbol.as_str() {
            "" => Err(self.error()),
            "1" => Ok((1.0, Dimension::NONE)),
            "sqrt" => {
                self.expect('(')?;
                let (scale, dim) = self.product()?;
                self.expect(')')?;
                let dim = dim
                    .halved()
                    .ok_or_else(|| UnitError::NonIntegralPower(self.text.into()))?;
                Ok((scale.sqrt(), dim))
            }
            other => lookup_symbol(other).ok_or_else(|| self.error()),
        }
    }
}

fn wrap(symbol: &str) -> String {
    if symbol.contains(&['*', '/', '^'][..]) {
        format!("({symbol})")
    } else {
        symbol.to_string()
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.symbol.is_empty() {
            write!(f, "dimensionless")
        } else {
            write!(f, "{}", self.symbol)
        }
    }
}

impl Mul for &Unit {
    type Output = Unit;

    fn mul(self, rhs: &Unit) -> Unit {
        let symbol = match (self.symbol.is_empty(), rhs.symbol.is_empty()) {
            (true, _) => rhs.symbol.clone(),
            (false, true) => self.symbol.clone(),
            (false, false) => format!("{}*{}", self.symbol, wrap(&rhs.symbol)),
        };
        Unit {
            scale: self.scale * rhs.scale,
            dim: self.dim.combine(rhs.dim, 1),
            symbol,
        }
    }
}

impl Div for &Unit {
    type Output = Unit;

    fn div(self, rhs: &Unit) -> Unit {
        let symbol = match (self.symbol.is_empty(), rhs.symbol.is_empty()) {
            (_, true) => self.symbol.clone(),
            (true, false) => format!("1/{}", wrap(&rhs.symbol)),
            (false, false) => format!("{}/{}", self.symbol, wrap(&rhs.symbol)),
        };
        Unit {
            scale: self.scale / rhs.scale,
            dim: self.dim.combine(rhs.dim, -1),
            symbol,
        }
    }
}

// ============================================================================
// Quantity
// ============================================================================

/// A scalar value paired with a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    value: f64,
    unit: Unit,
}

impl Quantity {
    pub fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    /// Creates a quantity from a value and a unit string.
    pub fn parse(value: f64, unit: &str) -> Result<Self, UnitError> {
        Ok(Self::new(value, Unit::parse(unit)?))
    }

    pub fn dimensionless(value: f64) -> Self {
        Self::new(value, Unit::dimensionless())
    }

    /// Magnitude in the quantity's own unit.
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    /// Converts to `unit`.
    ///
    /// # Errors
    /// Returns [`UnitError::Incompatible`] if the dimensions differ.
    pub fn to(&self, unit: &Unit) -> Result<Self, UnitError> {
        Ok(Self::new(self.value_in(unit)?, unit.clone()))
    }

    /// Converts to a unit given as a string.
    pub fn to_units(&self, unit: &str) -> Result<Self, UnitError> {
        self.to(&Unit::parse(unit)?)
    }

    /// Magnitude expressed in `unit`.
    pub fn value_in(&self, unit: &Unit) -> Result<f64, UnitError> {
        Ok(self.value * self.unit.factor_to(unit)?)
    }

    /// Sum expressed in `self`'s unit.
    pub fn checked_add(&self, other: &Quantity) -> Result<Self, UnitError> {
        Ok(Self::new(self.value + other.value_in(&self.unit)?, self.unit.clone()))
    }

    /// Difference expressed in `self`'s unit.
    pub fn checked_sub(&self, other: &Quantity) -> Result<Self, UnitError> {
        Ok(Self::new(self.value - other.value_in(&self.unit)?, self.unit.clone()))
    }

    pub fn sqrt(&self) -> Result<Self, UnitError> {
        Ok(Self::new(self.value.sqrt(), self.unit.sqrt()?))
    }

    pub fn abs(&self) -> Self {
        Self::new(self.value.abs(), self.unit.clone())
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match f.precision() {
            Some(p) => write!(f, "{:.*} {}", p, self.value, self.unit),
            None => write!(f, "{} {}", self.value, self.unit),
        }
    }
}

impl Mul for &Quantity {
    type Output = Quantity;

    fn mul(self, rhs: &Quantity) -> Quantity {
        Quantity::new(self.value * rhs.value, &self.unit * &rhs.unit)
    }
}

impl Div for &Quantity {
    type Output = Quantity;

    fn div(self, rhs: &Quantity) -> Quantity {
        Quantity::new(self.value / rhs.value, &self.unit / &rhs.unit)
    }
}

impl Mul<f64> for Quantity {
    type Output = Quantity;

    fn mul(self, rhs: f64) -> Quantity {
        Quantity::new(self.value * rhs, self.unit)
    }
}

impl Div<f64> for Quantity {
    type Output = Quantity;

    fn div(self, rhs: f64) -> Quantity {
        Quantity::new(self.value / rhs, self.unit)
    }
}

impl Neg for Quantity {
    type Output = Quantity;

    fn neg(self) -> Quantity {
        Quantity::new(-self.value, self.unit)
    }
}

// ============================================================================
// QuantityVec
// ============================================================================

/// An array of values sharing one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantityVec {
    values: Vec<f64>,
    unit: Unit,
}

impl QuantityVec {
    pub fn new(values: Vec<f64>, unit: Unit) -> Self {
        Self { values, unit }
    }

    pub fn zeros(n: usize, unit: Unit) -> Self {
        Self::new(vec![0.0; n], unit)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Quantity> {
        self.values
            .get(index)
            .map(|&v| Quantity::new(v, self.unit.clone()))
    }

    /// Converts every element to `unit`.
    pub fn to(&self, unit: &Unit) -> Result<Self, UnitError> {
        Ok(Self::new(self.values_in(unit)?, unit.clone()))
    }

    /// Magnitudes expressed in `unit`.
    pub fn values_in(&self, unit: &Unit) -> Result<Vec<f64>, UnitError> {
        let factor = self.unit.factor_to(unit)?;
        Ok(self.values.iter().map(|v| v * factor).collect())
    }

    /// Applies `f` to every magnitude, keeping the unit.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self::new(self.values.iter().map(|&v| f(v)).collect(), self.unit.clone())
    }

    /// Arithmetic mean, or `None` if empty or non-finite.
    pub fn mean(&self) -> Option<Quantity> {
        stats::mean(&self.values).map(|m| Quantity::new(m, self.unit.clone()))
    }

    /// Population standard deviation, or `None` if empty or non-finite.
    pub fn std(&self) -> Option<Quantity> {
        stats::population_std_dev(&self.values).map(|s| Quantity::new(s, self.unit.clone()))
    }
}

// ============================================================================
// Physical constants
// ============================================================================

/// Physical constants needed by the generator.
///
/// Built once (usually via [`PhysicalConstants::codata2018`]) and shared by
/// reference; nothing mutates it.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalConstants {
    speed_of_light: Quantity,
    elementary_charge: Quantity,
    rest_energies: Vec<(&'static str, f64)>,
}

impl PhysicalConstants {
    /// CODATA 2018 values.
    pub fn codata2018() -> Self {
        Self {
            speed_of_light: Quantity::new(SPEED_OF_LIGHT, &Unit::metre() / &Unit::second()),
            elementary_charge: Quantity::new(ELEMENTARY_CHARGE, Unit::coulomb()),
            rest_energies: vec![
                ("electron", ELECTRON_REST_ENERGY_EV),
                ("positron", ELECTRON_REST_ENERGY_EV),
                ("proton", PROTON_REST_ENERGY_EV),
            ],
        }
    }

    pub fn speed_of_light(&self) -> &Quantity {
        &self.speed_of_light
    }

    pub fn elementary_charge(&self) -> &Quantity {
        &self.elementary_charge
    }

    /// Rest energy m·c² of `species` in eV, or `None` if unknown.
    pub fn rest_energy(&self, species: &str) -> Option<Quantity> {
        self.rest_energies
            .iter()
            .find(|(name, _)| *name == species)
            .map(|&(_, ev)| Quantity::new(ev, Unit::electron_volt()))
    }

    /// Rest momentum m·c of `species` in eV/c, or `None` if unknown.
    pub fn rest_momentum(&self, species: &str) -> Option<Quantity> {
        self.rest_energy(species)
            .and_then(|mc2| (&mc2 / &self.speed_of_light).to(&Unit::ev_per_c()).ok())
    }
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self::codata2018()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(s: &str) -> Unit {
        Unit::parse(s).unwrap()
    }

    #[test]
    fn test_parse_prefixed_lengths() {
        assert!((unit("mm").scale() - 1e-3).abs() < 1e-18);
        assert!((unit("um").scale() - 1e-6).abs() < 1e-21);
        assert!((unit("µm").scale() - 1e-6).abs() < 1e-21);
        assert!((unit("cm").scale() - 1e-2).abs() < 1e-17);
        assert_eq!(unit("mm").dimension(), Dimension::LENGTH);
    }

    #[test]
    fn test_parse_speed_of_light_vs_centi() {
        assert_eq!(unit("c").dimension(), Dimension::VELOCITY);
        assert_eq!(unit("cm").dimension(), Dimension::LENGTH);
    }

    #[test]
    fn test_parse_momentum() {
        let u = unit("eV/c");
        assert_eq!(u.dimension(), Dimension::MOMENTUM);
        let kev = unit("keV/c");
        assert!((kev.factor_to(&u).unwrap() - 1e3).abs() < 1e-9);
    }

    #[test]
    fn test_parse_powers() {
        let a = unit("1/mm^2");
        let b = unit("1/mm**2");
        assert_eq!(a, b);
        assert_eq!(a.dimension(), Dimension::new(-2, 0, 0, 0));
        assert!((a.scale() - 1e6).abs() < 1e-6);
    }

    #[test]
    fn test_display_parses_back() {
        let ps = unit("ps");
        let derived = [
            &unit("mm") * &unit("1/ps"),
            &unit("mm") / &(&unit("ps") * &unit("eV/c")),
            unit("eV/c").powi(2),
            unit("mm^2").sqrt().unwrap(),
            ps.recip(),
            Unit::dimensionless(),
        ];
        for u in derived {
            let symbol = u.to_string();
            let back = Unit::parse(&symbol).unwrap_or_else(|e| panic!("{symbol}: {e}"));
            assert_eq!(back, u, "{symbol}");
        }
    }

    #[test]
    fn test_parse_rejects_malformed_groups() {
        assert!(Unit::parse("(mm").is_err());
        assert!(Unit::parse("mm)").is_err());
        assert!(Unit::parse("mm^").is_err());
        assert!(Unit::parse("mm*").is_err());
        assert!(matches!(Unit::parse("sqrt(mm)"), Err(UnitError::NonIntegralPower(_))));
    }

    #[test]
    fn test_parse_dimensionless_aliases() {
        assert!(unit("").is_dimensionless());
        assert!(unit("dimensionless").is_dimensionless());
        assert!(unit("rad").is_dimensionless());
        assert!(unit("mrad").is_dimensionless());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Unit::parse("furlong").is_err());
        assert!(Unit::parse("mm^x").is_err());
        assert!(Unit::parse("mm/").is_err());
    }

    #[test]
    fn test_incompatible_conversion() {
        let q = Quantity::parse(1.0, "mm").unwrap();
        let err = q.to(&unit("ps")).unwrap_err();
        assert!(matches!(err, UnitError::Incompatible { .. }));
    }

    #[test]
    fn test_degrees_to_radians() {
        let q = Quantity::parse(180.0, "deg").unwrap();
        let r = q.to(&unit("rad")).unwrap();
        assert!((r.value() - std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn test_product_units() {
        let delay = Quantity::parse(0.8, "ps/mm").unwrap();
        let length = Quantity::parse(2.0, "mm").unwrap();
        let t = (&delay * &length).to_units("ps").unwrap();
        assert!((t.value() - 1.6).abs() < 1e-12);
    }

    #[test]
    fn test_checked_add_mixed_units() {
        let a = Quantity::parse(1.0, "mm").unwrap();
        let b = Quantity::parse(1.0, "um").unwrap();
        let s = a.checked_add(&b).unwrap();
        assert!((s.value() - 1.001).abs() < 1e-12);
        assert_eq!(s.unit(), &unit("mm"));
        assert!(a.checked_sub(&Quantity::parse(1.0, "s").unwrap()).is_err());
    }

    #[test]
    fn test_sqrt() {
        let area = Quantity::parse(4.0, "mm^2").unwrap();
        let side = area.sqrt().unwrap();
        assert!((side.value() - 2.0).abs() < 1e-15);
        assert_eq!(side.unit(), &unit("mm"));
        assert!(Quantity::parse(4.0, "mm").unwrap().sqrt().is_err());
    }

    #[test]
    fn test_display_precision() {
        let q = Quantity::parse(1.23456, "mm").unwrap();
        assert_eq!(format!("{q:.2}"), "1.23 mm");
        assert_eq!(Quantity::dimensionless(2.0).to_string(), "2 dimensionless");
    }

    #[test]
    fn test_quantity_vec_stats() {
        let v = QuantityVec::new(vec![1.0, 2.0, 3.0], unit("mm"));
        assert!((v.mean().unwrap().value() - 2.0).abs() < 1e-15);
        let expected = (2.0_f64 / 3.0).sqrt();
        assert!((v.std().unwrap().value() - expected).abs() < 1e-15);
        let m = v.to(&unit("m")).unwrap();
        assert!((m.values()[2] - 3e-3).abs() < 1e-18);
    }

    #[test]
    fn test_default_constants_are_codata2018() {
        let constants = PhysicalConstants::default();
        assert_eq!(constants, PhysicalConstants::codata2018());
        assert!(constants.rest_energy("electron").is_some());
    }

    #[test]
    fn test_electron_rest_momentum() {
        let constants = PhysicalConstants::codata2018();
        let mc = constants.rest_momentum("electron").unwrap();
        assert!((mc.value() - ELECTRON_REST_ENERGY_EV).abs() < 1e-6);
        assert_eq!(mc.unit().dimension(), Dimension::MOMENTUM);
        assert!(constants.rest_energy("muon").is_none());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn conversion_is_invertible(value in -1e6_f64..1e6) {
            let q = Quantity::parse(value, "mm").unwrap();
            let back = q
                .to(&Unit::parse("um").unwrap())
                .and_then(|u| u.to(&Unit::parse("mm").unwrap()))
                .unwrap();
            prop_assert!((back.value() - value).abs() <= 1e-9 * value.abs().max(1.0));
        }
    }
}
