//! Tabulated distributions read from text files.
//!
//! # File formats
//!
//! One-dimensional and radial tables are two whitespace-separated columns
//! (coordinate, density). Blank lines and lines starting with `#` are
//! skipped. Units come from the `file` parameter, not the file.
//!
//! Joint (x, y) tables start with two header lines, one per axis:
//!
//! ```text
//! x 2.0 0.0 [mm]
//! y 1.0 0.5 [mm]
//! 0 1 0
//! 1 2 1
//! ```
//!
//! Each header gives the axis name, full width, centre and unit. The grid
//! follows with one row per y value (ascending) and one column per x value
//! (ascending); sample positions span `centre ± width/2`.
//!
//! # Inversion
//!
//! [`Tabulated1d`] integrates with the trapezoid rule and inverts the
//! cumulative table by linear interpolation. [`RadialFile`] and
//! [`File2d`] treat the density as constant within each sample's bin and
//! invert within the bin exactly (area-uniform for radial bins).

use std::fs;
use std::path::{Path, PathBuf};

use crate::distributions::Univariate;
use crate::error::{Error, Result};
use crate::integrate;
use crate::units::{Quantity, QuantityVec, Unit};

fn invalid(msg: impl Into<String>) -> Error {
    Error::InvalidParameters(msg.into())
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn file_format(path: &Path, reason: impl Into<String>) -> Error {
    Error::FileFormat {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Lines that carry data: non-blank and not `#` comments, with 1-based
/// line numbers.
fn data_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

fn parse_row(path: &Path, line_no: usize, line: &str) -> Result<Vec<f64>> {
    line.split_whitespace()
        .map(|token| {
            token.parse::<f64>().map_err(|_| {
                file_format(path, format!("line {line_no}: '{token}' is not a number"))
            })
        })
        .collect()
}

/// Reads a two-column table. Columns past the second are ignored.
///
/// # Errors
/// [`Error::Io`] if the file cannot be read, [`Error::FileFormat`] for
/// rows with fewer than two numeric columns.
pub fn read_columns(path: impl AsRef<Path>) -> Result<(Vec<f64>, Vec<f64>)> {
    let path = path.as_ref();
    let text = read_text(path)?;
    let mut xs = Vec::new();
    let mut fs = Vec::new();
    for (line_no, line) in data_lines(&text) {
        let leading: String = line.split_whitespace().take(2).collect::<Vec<_>>().join(" ");
        let row = parse_row(path, line_no, &leading)?;
        if row.len() < 2 {
            return Err(file_format(path, format!("line {line_no}: expected two columns")));
        }
        xs.push(row[0]);
        fs.push(row[1]);
    }
    Ok((xs, fs))
}

fn check_density(density: &[f64]) -> Result<()> {
    if density.iter().any(|p| !p.is_finite() || *p < 0.0) {
        return Err(invalid("densities must be finite and non-negative"));
    }
    Ok(())
}

/// Index of the bin holding cumulative probability `u`: the smallest `i`
/// with `cum[i + 1] ≥ u`. `cum` has one more entry than there are bins.
fn locate(cum: &[f64], u: f64) -> usize {
    let bins = cum.len().saturating_sub(1);
    cum[1..].partition_point(|&c| c < u).min(bins.saturating_sub(1))
}

fn normalize(values: &mut [f64]) {
    if let Some(&last) = values.last() {
        if last > 0.0 {
            values.iter_mut().for_each(|v| *v /= last);
        }
    }
}

// ============================================================================
// Tabulated 1D
// ============================================================================

/// A 1D density sampled on a strictly increasing grid.
///
/// # Examples
/// ```
/// use u_beamgen::distributions::Univariate;
/// use u_beamgen::tabulated::Tabulated1d;
/// // Triangle on [0, 2] peaking at 1.
/// let t = Tabulated1d::new(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 0.0]).unwrap();
/// assert!((t.cdf(1.0) - 0.5).abs() < 1e-12);
/// assert!((t.mean() - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Tabulated1d {
    xs: Vec<f64>,
    pdf: Vec<f64>,
    cdf: Vec<f64>,
    mean: f64,
    std_dev: f64,
}

impl Tabulated1d {
    /// # Errors
    /// Returns [`Error::InvalidParameters`] for fewer than two points,
    /// mismatched lengths, a grid that is not strictly increasing, negative
    /// densities, or zero total probability.
    pub fn new(xs: Vec<f64>, density: Vec<f64>) -> Result<Self> {
        if xs.len() < 2 || xs.len() != density.len() {
            return Err(invalid(format!(
                "tabulated distribution needs at least two (x, density) pairs, got {} and {}",
                xs.len(),
                density.len()
            )));
        }
        if xs.iter().any(|x| !x.is_finite()) || xs.windows(2).any(|w| w[1] <= w[0]) {
            return Err(invalid("tabulated grid must be finite and strictly increasing"));
        }
        check_density(&density)?;
        let total = integrate::trapz(&density, &xs);
        if total <= 0.0 {
            return Err(invalid("tabulated density integrates to zero"));
        }
        let pdf: Vec<f64> = density.iter().map(|p| p / total).collect();
        let mut cdf = integrate::cumtrapz(&pdf, &xs);
        normalize(&mut cdf);

        let first: Vec<f64> = xs.iter().zip(&pdf).map(|(x, p)| x * p).collect();
        let mean = integrate::trapz(&first, &xs);
        let second: Vec<f64> = xs
            .iter()
            .zip(&pdf)
            .map(|(x, p)| (x - mean) * (x - mean) * p)
            .collect();
        let std_dev = integrate::trapz(&second, &xs).max(0.0).sqrt();

        Ok(Self {
            xs,
            pdf,
            cdf,
            mean,
            std_dev,
        })
    }

    /// Reads a two-column table.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let (xs, density) = read_columns(path)?;
        Self::new(xs, density).map_err(|e| file_format(path, e.to_string()))
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    pub fn xs(&self) -> &[f64] {
        &self.xs
    }
}

impl Univariate for Tabulated1d {
    fn mean(&self) -> f64 {
        self.mean
    }

    fn std_dev(&self) -> f64 {
        self.std_dev
    }

    fn pdf(&self, x: f64) -> f64 {
        match (self.xs.first(), self.xs.last()) {
            (Some(&lo), Some(&hi)) if x >= lo && x <= hi => integrate::interp(x, &self.xs, &self.pdf),
            _ => 0.0,
        }
    }

    fn cdf(&self, x: f64) -> f64 {
        integrate::interp(x, &self.xs, &self.cdf)
    }

    fn quantile(&self, u: f64) -> f64 {
        let u = if u.is_nan() { 0.5 } else { u.clamp(0.0, 1.0) };
        integrate::interp(u, &self.cdf, &self.xs)
    }
}

// ============================================================================
// Radial file
// ============================================================================

/// Areal density `P(r)` of a round beam, tabulated against radius.
///
/// The radial probability density is `r·P(r)` normalized so that
/// `∫ P(r) r dr = 1`. Each sample owns the annulus between the midpoints
/// to its neighbours; the innermost and outermost annuli end at the first
/// and last radius.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialFile {
    r: Vec<f64>,
    density: Vec<f64>,
    edges: Vec<f64>,
    cdf: Vec<f64>,
    mean: f64,
    mean_square: f64,
}

impl RadialFile {
    /// # Errors
    /// Returns [`Error::InvalidParameters`] for fewer than two points,
    /// mismatched lengths, negative or decreasing radii, negative
    /// densities, or zero total probability.
    pub fn new(r: Vec<f64>, density: Vec<f64>) -> Result<Self> {
        if r.len() < 2 || r.len() != density.len() {
            return Err(invalid(format!(
                "radial distribution needs at least two (r, density) pairs, got {} and {}",
                r.len(),
                density.len()
            )));
        }
        if r.iter().any(|v| !v.is_finite() || *v < 0.0) || r.windows(2).any(|w| w[1] < w[0]) {
            return Err(invalid("radii must be non-negative and non-decreasing"));
        }
        check_density(&density)?;
        let total = integrate::radint(&density, &r);
        if total <= 0.0 {
            return Err(invalid("radial density integrates to zero"));
        }
        let density: Vec<f64> = density.iter().map(|p| p / total).collect();
        let (mut cdf, edges) = integrate::radcumint(&density, &r);
        normalize(&mut cdf);

        let (mut mean, mut mean_square) = (0.0, 0.0);
        for (p, e) in density.iter().zip(edges.windows(2)) {
            let (a, b) = (e[0], e[1]);
            mean += p * (b.powi(3) - a.powi(3)) / 3.0;
            mean_square += p * (b.powi(4) - a.powi(4)) / 4.0;
        }

        Ok(Self {
            r,
            density,
            edges,
            cdf,
            mean,
            mean_square,
        })
    }

    /// Reads a two-column `(r, P(r))` table.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let (r, density) = read_columns(path)?;
        Self::new(r, density).map_err(|e| file_format(path, e.to_string()))
    }

    pub fn len(&self) -> usize {
        self.r.len()
    }

    pub fn is_empty(&self) -> bool {
        self.r.is_empty()
    }

    /// Normalized areal density of the bin containing `r`.
    pub fn areal_density(&self, r: f64) -> f64 {
        let inside = matches!(
            (self.edges.first(), self.edges.last()),
            (Some(&lo), Some(&hi)) if r >= lo && r <= hi
        );
        if !inside {
            return 0.0;
        }
        integrate::nearest_neighbor(&self.r, r).map_or(0.0, |i| self.density[i])
    }
}

impl Univariate for RadialFile {
    fn mean(&self) -> f64 {
        self.mean
    }

    fn std_dev(&self) -> f64 {
        (self.mean_square - self.mean * self.mean).max(0.0).sqrt()
    }

    fn rms(&self) -> f64 {
        self.mean_square.sqrt()
    }

    fn pdf(&self, r: f64) -> f64 {
        r * self.areal_density(r)
    }

    fn cdf(&self, r: f64) -> f64 {
        let n = self.density.len();
        if r <= self.edges[0] {
            return 0.0;
        }
        if r >= self.edges[n] {
            return 1.0;
        }
        let i = self.edges[1..].partition_point(|&e| e < r).min(n - 1);
        let a = self.edges[i];
        (self.cdf[i] + self.density[i] * 0.5 * (r * r - a * a)).min(1.0)
    }

    fn quantile(&self, u: f64) -> f64 {
        let u = if u.is_nan() { 0.5 } else { u.clamp(0.0, 1.0) };
        let i = locate(&self.cdf, u);
        let (a, b) = (self.edges[i], self.edges[i + 1]);
        let width = self.cdf[i + 1] - self.cdf[i];
        if width <= 0.0 {
            return a;
        }
        let t = ((u - self.cdf[i]) / width).clamp(0.0, 1.0);
        (a * a + t * (b * b - a * a)).sqrt()
    }
}

// ============================================================================
// 2D file
// ============================================================================

/// Joint (x, y) density on a rectangular grid.
///
/// Sampling is marginal-then-conditional: the first uniform draw selects
/// a y position from the row-marginal CDF, the second an x position from
/// that row's conditional CDF. Within a bin the position is linear in the
/// draw.
#[derive(Debug, Clone, PartialEq)]
pub struct File2d {
    x_name: String,
    y_name: String,
    x_unit: Unit,
    y_unit: Unit,
    xs: Vec<f64>,
    ys: Vec<f64>,
    grid: Vec<Vec<f64>>,
    total: f64,
    x_edges: Vec<f64>,
    y_edges: Vec<f64>,
    row_cdf: Vec<f64>,
    col_cdfs: Vec<Vec<f64>>,
    source: Option<PathBuf>,
}

/// One header line of a 2D table.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisHeader {
    pub name: String,
    pub width: f64,
    pub centre: f64,
    pub unit: Unit,
}

impl AxisHeader {
    fn parse(path: &Path, line_no: usize, line: &str) -> Result<Self> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 4 {
            return Err(file_format(
                path,
                format!("line {line_no}: header must be '<name> <width> <centre> [<unit>]'"),
            ));
        }
        let number = |token: &str| {
            token.parse::<f64>().map_err(|_| {
                file_format(path, format!("line {line_no}: '{token}' is not a number"))
            })
        };
        let unit_text = tokens[3..].join(" ");
        let unit_str = unit_text
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .ok_or_else(|| {
                file_format(path, format!("line {line_no}: unit must be written as [unit]"))
            })?;
        Ok(Self {
            name: tokens[0].to_string(),
            width: number(tokens[1])?,
            centre: number(tokens[2])?,
            unit: Unit::parse(unit_str)?,
        })
    }

    /// `n` evenly spaced grid positions spanning `width` around `centre`.
    fn positions(&self, n: usize) -> Result<QuantityVec> {
        let half = self.width / 2.0;
        let start = Quantity::new(self.centre - half, self.unit.clone());
        let stop = Quantity::new(self.centre + half, self.unit.clone());
        Ok(integrate::linspace_quantity(&start, &stop, n)?)
    }
}

impl File2d {
    /// Builds the model from axis positions and a row-major grid
    /// (`grid[j][i]` is the density at `(xs[i], ys[j])`).
    ///
    /// # Errors
    /// Returns [`Error::InvalidParameters`] for grids smaller than 2×2,
    /// ragged rows, axes that are not strictly increasing, negative
    /// densities, or zero total probability.
    pub fn new(
        xs: QuantityVec,
        ys: QuantityVec,
        grid: Vec<Vec<f64>>,
    ) -> Result<Self> {
        let (x_unit, y_unit) = (xs.unit().clone(), ys.unit().clone());
        let (xs, ys) = (xs.into_values(), ys.into_values());
        if xs.len() < 2 || ys.len() < 2 {
            return Err(invalid("2D distribution needs at least two rows and two columns"));
        }
        if grid.len() != ys.len() || grid.iter().any(|row| row.len() != xs.len()) {
            return Err(invalid(format!(
                "2D grid must be {} rows of {} values",
                ys.len(),
                xs.len()
            )));
        }
        for axis in [&xs, &ys] {
            if axis.iter().any(|v| !v.is_finite()) || axis.windows(2).any(|w| w[1] <= w[0]) {
                return Err(invalid("2D axes must be finite and strictly increasing"));
            }
        }
        for row in &grid {
            check_density(row)?;
        }

        let row_mass: Vec<f64> = grid.iter().map(|row| integrate::rectint(row, &xs)).collect();
        let (mut row_cdf, y_edges) = integrate::cumrectint(&row_mass, &ys);
        let total = row_cdf.last().copied().unwrap_or(0.0);
        if total <= 0.0 {
            return Err(invalid("2D density integrates to zero"));
        }
        normalize(&mut row_cdf);

        let x_edges = integrate::bin_edges(&xs);
        let col_cdfs = grid
            .iter()
            .map(|row| {
                let (mut c, _) = integrate::cumrectint(row, &xs);
                normalize(&mut c);
                c
            })
            .collect();

        Ok(Self {
            x_name: "x".into(),
            y_name: "y".into(),
            x_unit,
            y_unit,
            xs,
            ys,
            grid,
            total,
            x_edges,
            y_edges,
            row_cdf,
            col_cdfs,
            source: None,
        })
    }

    /// Reads a table with two axis headers followed by the density grid.
    ///
    /// # Errors
    /// [`Error::Io`] if unreadable, [`Error::FileFormat`] for malformed
    /// headers or rows, [`Error::Unit`] for unknown header units.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = read_text(path)?;
        let mut lines = data_lines(&text);
        let mut header = |axis: &str| -> Result<AxisHeader> {
            let (line_no, line) = lines
                .next()
                .ok_or_else(|| file_format(path, format!("missing {axis} header")))?;
            AxisHeader::parse(path, line_no, line)
        };
        let x_header = header("x")?;
        let y_header = header("y")?;
        let grid = lines
            .map(|(line_no, line)| parse_row(path, line_no, line))
            .collect::<Result<Vec<_>>>()?;
        let ncols = grid.first().map_or(0, Vec::len);

        let xs = x_header.positions(ncols)?;
        let ys = y_header.positions(grid.len())?;
        let mut model = Self::new(xs, ys, grid).map_err(|e| match e {
            Error::InvalidParameters(reason) => file_format(path, reason),
            other => other,
        })?;
        model.x_name = x_header.name;
        model.y_name = y_header.name;
        model.source = Some(path.to_path_buf());
        Ok(model)
    }

    pub fn x_unit(&self) -> &Unit {
        &self.x_unit
    }

    pub fn y_unit(&self) -> &Unit {
        &self.y_unit
    }

    /// Axis names from the file headers.
    pub fn names(&self) -> (&str, &str) {
        (&self.x_name, &self.y_name)
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Grid dimensions as (rows, columns).
    pub fn shape(&self) -> (usize, usize) {
        (self.ys.len(), self.xs.len())
    }

    /// Maps one pair of uniform draws to an (x, y) position.
    pub fn sample(&self, u_row: f64, u_col: f64) -> (f64, f64) {
        let clamp = |u: f64| if u.is_nan() { 0.5 } else { u.clamp(0.0, 1.0) };
        let (j, y) = invert_bin(&self.row_cdf, &self.y_edges, clamp(u_row));
        let (_, x) = invert_bin(&self.col_cdfs[j], &self.x_edges, clamp(u_col));
        (x, y)
    }

    /// Maps two rows of uniform draws to x and y coordinates.
    ///
    /// `u_rows` selects the y position (grid row), `u_cols` the x position
    /// within that row. Surplus draws in the longer slice are ignored.
    pub fn cdfinv(&self, u_rows: &[f64], u_cols: &[f64]) -> (QuantityVec, QuantityVec) {
        let (xs, ys): (Vec<f64>, Vec<f64>) = u_rows
            .iter()
            .zip(u_cols)
            .map(|(&ur, &uc)| self.sample(ur, uc))
            .unzip();
        (
            QuantityVec::new(xs, self.x_unit.clone()),
            QuantityVec::new(ys, self.y_unit.clone()),
        )
    }

    /// Normalized density at the grid point nearest `(x, y)`, in units of
    /// `1/(x_unit·y_unit)`. Zero outside the grid's bins.
    ///
    /// # Errors
    /// Returns [`Error::Unit`] if `x` or `y` have the wrong dimension.
    pub fn pdf(&self, x: &Quantity, y: &Quantity) -> Result<Quantity> {
        let (xv, yv) = (x.value_in(&self.x_unit)?, y.value_in(&self.y_unit)?);
        let unit = (&self.x_unit * &self.y_unit).recip();
        let within = |v: f64, edges: &[f64]| v >= edges[0] && v <= edges[edges.len() - 1];
        if !within(xv, &self.x_edges) || !within(yv, &self.y_edges) {
            return Ok(Quantity::new(0.0, unit));
        }
        let value = match (
            integrate::nearest_neighbor(&self.xs, xv),
            integrate::nearest_neighbor(&self.ys, yv),
        ) {
            (Some(i), Some(j)) => self.grid[j][i] / self.total,
            _ => 0.0,
        };
        Ok(Quantity::new(value, unit))
    }

    fn marginal_moments(&self) -> ((f64, f64), (f64, f64)) {
        let mut wx = vec![0.0; self.xs.len()];
        let mut wy = vec![0.0; self.ys.len()];
        for (j, row) in self.grid.iter().enumerate() {
            let dy = self.y_edges[j + 1] - self.y_edges[j];
            for (i, p) in row.iter().enumerate() {
                let mass = p * dy * (self.x_edges[i + 1] - self.x_edges[i]);
                wx[i] += mass;
                wy[j] += mass;
            }
        }
        let moments = |values: &[f64], weights: &[f64]| {
            let m = crate::stats::weighted_mean(values, weights).unwrap_or(0.0);
            let s = crate::stats::weighted_std_dev(values, weights).unwrap_or(0.0);
            (m, s)
        };
        (moments(&self.xs, &wx), moments(&self.ys, &wy))
    }

    /// Means of the x and y marginals over the grid points.
    pub fn avg(&self) -> (Quantity, Quantity) {
        let ((mx, _), (my, _)) = self.marginal_moments();
        (
            Quantity::new(mx, self.x_unit.clone()),
            Quantity::new(my, self.y_unit.clone()),
        )
    }

    /// Standard deviations of the x and y marginals over the grid points.
    pub fn std(&self) -> (Quantity, Quantity) {
        let ((_, sx), (_, sy)) = self.marginal_moments();
        (
            Quantity::new(sx, self.x_unit.clone()),
            Quantity::new(sy, self.y_unit.clone()),
        )
    }
}

/// Locates the bin holding `u` and interpolates linearly inside it.
fn invert_bin(cum: &[f64], edges: &[f64], u: f64) -> (usize, f64) {
    let i = locate(cum, u);
    let (a, b) = (edges[i], edges[i + 1]);
    let width = cum[i + 1] - cum[i];
    if width <= 0.0 {
        return (i, a);
    }
    let t = ((u - cum[i]) / width).clamp(0.0, 1.0);
    (i, a + t * (b - a))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    fn mm() -> Unit {
        Unit::parse("mm").unwrap()
    }

    // --- read_columns ---

    #[test]
    fn test_read_columns_skips_comments() {
        let f = write_file("# r P\n\n0.0 1.0\n0.5   2.0\n1.0\t3.0 extra\n");
        let (xs, ps) = read_columns(f.path()).unwrap();
        assert_eq!(xs, vec![0.0, 0.5, 1.0]);
        assert_eq!(ps, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_read_columns_errors() {
        let f = write_file("0.0 1.0\n0.5\n");
        assert!(matches!(read_columns(f.path()), Err(Error::FileFormat { .. })));
        let f = write_file("0.0 abc\n");
        assert!(matches!(read_columns(f.path()), Err(Error::FileFormat { .. })));
        assert!(matches!(read_columns("/nonexistent/table.txt"), Err(Error::Io { .. })));
    }

    // --- Tabulated1d ---

    #[test]
    fn test_tabulated_uniform_matches_analytic() {
        let xs = integrate::linspace(-1.0, 1.0, 201);
        let t = Tabulated1d::new(xs, vec![1.0; 201]).unwrap();
        assert!(t.mean().abs() < 1e-12);
        assert!((t.std_dev() - 1.0 / 3.0_f64.sqrt()).abs() < 1e-4);
        assert!((t.quantile(0.25) + 0.5).abs() < 1e-12);
        assert!((t.pdf(0.3) - 0.5).abs() < 1e-12);
        assert_eq!(t.pdf(1.5), 0.0);
        assert_eq!(t.cdf(-2.0), 0.0);
        assert_eq!(t.cdf(2.0), 1.0);
    }

    #[test]
    fn test_tabulated_invalid() {
        assert!(Tabulated1d::new(vec![0.0], vec![1.0]).is_err());
        assert!(Tabulated1d::new(vec![0.0, 1.0], vec![1.0]).is_err());
        assert!(Tabulated1d::new(vec![1.0, 0.0], vec![1.0, 1.0]).is_err());
        assert!(Tabulated1d::new(vec![0.0, 1.0], vec![-1.0, 1.0]).is_err());
        assert!(Tabulated1d::new(vec![0.0, 1.0], vec![0.0, 0.0]).is_err());
    }

    #[test]
    fn test_tabulated_from_file_reports_path() {
        let f = write_file("0 1\n0 1\n");
        match Tabulated1d::from_file(f.path()) {
            Err(Error::FileFormat { path, .. }) => assert_eq!(path, f.path()),
            other => panic!("expected FileFormat error, got {other:?}"),
        }
    }

    // --- RadialFile ---

    #[test]
    fn test_radial_file_uniform_disk_median() {
        let radius = 2.0;
        let r = integrate::linspace(0.0, radius, 1001);
        let p = vec![1.0; r.len()];
        let model = RadialFile::new(r, p).unwrap();
        let median = model.quantile(0.5);
        assert!(
            (median - radius / 2.0_f64.sqrt()).abs() < 1e-9,
            "median {median}"
        );
        // Uniform disk: <r> = 2R/3, <r²> = R²/2.
        assert!((model.mean() - 2.0 * radius / 3.0).abs() < 1e-9);
        assert!((model.rms() - radius / 2.0_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_radial_file_from_file() {
        let mut text = String::from("# r [mm]   P\n");
        for i in 0..=100 {
            let r = i as f64 * 0.01;
            text.push_str(&format!("{r} {}\n", (-r * r / 0.08).exp()));
        }
        let f = write_file(&text);
        let model = RadialFile::from_file(f.path()).unwrap();
        assert_eq!(model.len(), 101);
        assert_eq!(model.quantile(0.0), 0.0);
        assert!((model.quantile(1.0) - 1.0).abs() < 1e-12);
        assert!(model.pdf(1.5) == 0.0);
    }

    #[test]
    fn test_radial_file_invalid() {
        assert!(RadialFile::new(vec![-1.0, 1.0], vec![1.0, 1.0]).is_err());
        assert!(RadialFile::new(vec![1.0, 0.5], vec![1.0, 1.0]).is_err());
        assert!(RadialFile::new(vec![0.0, 1.0], vec![0.0, 0.0]).is_err());
    }

    // --- File2d ---

    fn sample_2d_text() -> &'static str {
        "x 2.0 0.0 [mm]\n\
         y 1.0 0.5 [mm]\n\
         0 1 0\n\
         1 2 1\n\
         0 1 0\n"
    }

    #[test]
    fn test_file2d_header_and_axes() {
        let f = write_file(sample_2d_text());
        let model = File2d::from_file(f.path()).unwrap();
        assert_eq!(model.shape(), (3, 3));
        assert_eq!(model.names(), ("x", "y"));
        assert_eq!(model.x_unit(), &mm());
        assert_eq!(model.source(), Some(f.path()));
        let (avg_x, avg_y) = model.avg();
        assert!(avg_x.value().abs() < 1e-12);
        assert!((avg_y.value() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_file2d_samples_stay_in_support() {
        let f = write_file(sample_2d_text());
        let model = File2d::from_file(f.path()).unwrap();
        let u: Vec<f64> = (0..200).map(|i| (i as f64 + 0.5) / 200.0).collect();
        let v: Vec<f64> = u.iter().rev().copied().collect();
        let (x, y) = model.cdfinv(&u, &v);
        assert_eq!(x.len(), 200);
        // Bins extend half a spacing past the outer samples.
        assert!(x.values().iter().all(|&v| (-1.5..=1.5).contains(&v)));
        assert!(y.values().iter().all(|&v| (-0.25..=1.25).contains(&v)));
    }

    #[test]
    fn test_file2d_zero_rows_never_selected() {
        let xs = QuantityVec::new(vec![0.0, 1.0], mm());
        let ys = QuantityVec::new(vec![0.0, 1.0, 2.0], mm());
        let grid = vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![0.0, 0.0]];
        let model = File2d::new(xs, ys, grid).unwrap();
        for k in 1..100 {
            let (_, y) = model.sample(k as f64 / 100.0, 0.5);
            assert!((0.5..=1.5).contains(&y), "y = {y}");
        }
    }

    #[test]
    fn test_file2d_pdf_nearest_neighbor() {
        let f = write_file(sample_2d_text());
        let model = File2d::from_file(f.path()).unwrap();
        let at = |x: f64, y: f64| {
            model
                .pdf(
                    &Quantity::parse(x, "mm").unwrap(),
                    &Quantity::parse(y, "mm").unwrap(),
                )
                .unwrap()
                .value()
        };
        assert!(at(0.0, 0.5) > at(1.0, 0.5));
        assert_eq!(at(5.0, 0.5), 0.0);
        let p = model
            .pdf(&Quantity::parse(0.0, "ps").unwrap(), &Quantity::parse(0.0, "mm").unwrap());
        assert!(p.is_err());
    }

    #[test]
    fn test_file2d_malformed() {
        let f = write_file("x 2.0 0.0 mm\ny 1.0 0.0 [mm]\n1 1\n1 1\n");
        assert!(matches!(File2d::from_file(f.path()), Err(Error::FileFormat { .. })));
        let f = write_file("x 2.0 0.0 [mm]\ny 1.0 0.0 [mm]\n1 1\n1\n");
        assert!(matches!(File2d::from_file(f.path()), Err(Error::FileFormat { .. })));
        let f = write_file("x 2.0 0.0 [mm]\n");
        assert!(matches!(File2d::from_file(f.path()), Err(Error::FileFormat { .. })));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn tabulated_quantile_roundtrip(
            density in proptest::collection::vec(0.1_f64..10.0, 3..40),
            u in 0.0_f64..=1.0,
        ) {
            let xs = integrate::linspace(0.0, 1.0, density.len());
            let t = Tabulated1d::new(xs, density).unwrap();
            let back = t.cdf(t.quantile(u));
            prop_assert!((back - u).abs() < 1e-9, "u={u} back={back}");
        }

        #[test]
        fn radial_file_quantile_roundtrip(
            density in proptest::collection::vec(0.1_f64..10.0, 3..40),
            u in 0.0_f64..=1.0,
        ) {
            let r = integrate::linspace(0.0, 1.0, density.len());
            let model = RadialFile::new(r, density).unwrap();
            let q = model.quantile(u);
            prop_assert!((0.0..=1.0 + 1e-12).contains(&q));
            let back = model.cdf(q);
            prop_assert!((back - u).abs() < 1e-9, "u={u} back={back}");
        }
    }
}
