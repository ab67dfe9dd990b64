//! Input records and parameter conversion.
//!
//! A generator input is a JSON document with a `beam` block, an optional
//! `output` block and one `<var>_dist` block per sampled coordinate group.
//! Parameter values are written as `{"value": 1.0, "units": "mm"}`, bare
//! numbers, strings, or file references `{"file": "...", "units": "mm"}`.
//!
//! # Examples
//! ```
//! use u_beamgen::input::GeneratorInput;
//! let input = GeneratorInput::from_json_str(r#"{
//!     "beam": {
//!         "particle_count": 1000,
//!         "start_type": "cathode",
//!         "params": {
//!             "total_charge": {"value": 10, "units": "pC"},
//!             "MTE": {"value": 150, "units": "meV"}
//!         }
//!     },
//!     "t_dist": {"type": "g", "params": {"sigma_t": {"value": 2, "units": "ps"}}}
//! }"#).unwrap();
//! assert_eq!(input.beam.particle_count, 1000);
//! assert!(input.distributions.contains_key("t_dist"));
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::units::{Quantity, Unit};

// ============================================================================
// Raw (deserialized) records
// ============================================================================

/// Top-level input document.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorInput {
    pub beam: BeamInput,
    #[serde(default)]
    pub output: Option<OutputInput>,
    /// Every other top-level key, expected to be `<var>_dist`.
    #[serde(flatten)]
    pub distributions: BTreeMap<String, DistributionInput>,
}

impl GeneratorInput {
    /// Parses an input document from a JSON string.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads and parses an input document from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }
}

/// The `beam` block.
#[derive(Debug, Clone, Deserialize)]
pub struct BeamInput {
    pub particle_count: usize,
    #[serde(default)]
    pub rand_type: Option<String>,
    pub start_type: String,
    #[serde(default)]
    pub species: Option<String>,
    #[serde(default)]
    pub random_seed: Option<u64>,
    #[serde(default)]
    pub params: BTreeMap<String, RawParam>,
}

/// The `output` block.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputInput {
    #[serde(rename = "type")]
    pub format: String,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// One `<var>_dist` block.
#[derive(Debug, Clone, Deserialize)]
pub struct DistributionInput {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub params: BTreeMap<String, RawParam>,
}

/// A parameter value as written in the input.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawParam {
    Quantity {
        value: f64,
        units: String,
    },
    File {
        file: PathBuf,
        #[serde(default)]
        units: Option<String>,
    },
    Number(f64),
    Text(String),
}

// ============================================================================
// Converted parameters
// ============================================================================

/// Reference to a distribution table on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRef {
    pub path: PathBuf,
    pub units: Option<Unit>,
}

/// A parameter after unit parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Quantity(Quantity),
    File(FileRef),
    Text(String),
}

impl Param {
    fn kind(&self) -> &'static str {
        match self {
            Param::Quantity(_) => "quantity",
            Param::File(_) => "file reference",
            Param::Text(_) => "text",
        }
    }
}

impl TryFrom<&RawParam> for Param {
    type Error = Error;

    fn try_from(raw: &RawParam) -> Result<Self> {
        Ok(match raw {
            RawParam::Quantity { value, units } => Param::Quantity(Quantity::parse(*value, units)?),
            RawParam::Number(v) => Param::Quantity(Quantity::dimensionless(*v)),
            RawParam::Text(s) => Param::Text(s.clone()),
            RawParam::File { file, units } => Param::File(FileRef {
                path: file.clone(),
                units: units.as_deref().map(Unit::parse).transpose()?,
            }),
        })
    }
}

/// Named parameters of one distribution (or of the beam block).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamMap {
    entries: BTreeMap<String, Param>,
}

impl ParamMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Converts raw parameters, parsing every unit string.
    ///
    /// # Errors
    /// Returns [`Error::Unit`] for the first unparseable unit.
    pub fn from_raw(raw: &BTreeMap<String, RawParam>) -> Result<Self> {
        let entries = raw
            .iter()
            .map(|(name, value)| Ok((name.clone(), Param::try_from(value)?)))
            .collect::<Result<_>>()?;
        Ok(Self { entries })
    }

    pub fn insert(&mut self, name: impl Into<String>, param: Param) {
        self.entries.insert(name.into(), param);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Param> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Param)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// A required quantity parameter.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the parameter is missing or is not a
    /// quantity.
    pub fn quantity(&self, name: &str) -> Result<&Quantity> {
        self.optional_quantity(name)?
            .ok_or_else(|| Error::Config(format!("missing required parameter '{name}'")))
    }

    /// An optional quantity parameter.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the parameter is present but is not a
    /// quantity.
    pub fn optional_quantity(&self, name: &str) -> Result<Option<&Quantity>> {
        match self.entries.get(name) {
            None => Ok(None),
            Some(Param::Quantity(q)) => Ok(Some(q)),
            Some(other) => Err(Error::Config(format!(
                "parameter '{name}' must be a quantity, found {}",
                other.kind()
            ))),
        }
    }

    /// A required file reference parameter.
    pub fn file(&self, name: &str) -> Result<&FileRef> {
        match self.entries.get(name) {
            Some(Param::File(f)) => Ok(f),
            Some(other) => Err(Error::Config(format!(
                "parameter '{name}' must be a file reference, found {}",
                other.kind()
            ))),
            None => Err(Error::Config(format!("missing required parameter '{name}'"))),
        }
    }

    /// Quantities whose names are `prefix` followed by an integer index,
    /// sorted by that index.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if a suffix is not an integer or a matching
    /// parameter is not a quantity.
    pub fn indexed_quantities(&self, prefix: &str) -> Result<Vec<(u32, &Quantity)>> {
        let mut out = Vec::new();
        for (name, param) in &self.entries {
            let Some(suffix) = name.strip_prefix(prefix) else {
                continue;
            };
            let index: u32 = suffix.parse().map_err(|_| {
                Error::Config(format!("parameter '{name}' must end in an integer index"))
            })?;
            match param {
                Param::Quantity(q) => out.push((index, q)),
                other => {
                    return Err(Error::Config(format!(
                        "parameter '{name}' must be a quantity, found {}",
                        other.kind()
                    )))
                }
            }
        }
        out.sort_by_key(|&(i, _)| i);
        Ok(out)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_params(json: &str) -> BTreeMap<String, RawParam> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_raw_param_forms() {
        let raw = raw_params(
            r#"{
                "sigma_x": {"value": 1.5, "units": "mm"},
                "truncation_fraction": 0.5,
                "label": "laser",
                "file": {"file": "dist.txt", "units": "um"}
            }"#,
        );
        assert!(matches!(raw["sigma_x"], RawParam::Quantity { .. }));
        assert_eq!(raw["truncation_fraction"], RawParam::Number(0.5));
        assert_eq!(raw["label"], RawParam::Text("laser".into()));
        assert!(matches!(raw["file"], RawParam::File { .. }));
    }

    #[test]
    fn test_param_map_conversion() {
        let raw = raw_params(
            r#"{
                "sigma_x": {"value": 1.5, "units": "mm"},
                "f": 0.5,
                "file": {"file": "dist.txt", "units": "um"}
            }"#,
        );
        let params = ParamMap::from_raw(&raw).unwrap();
        let sigma = params.quantity("sigma_x").unwrap();
        assert!((sigma.value_in(&Unit::metre()).unwrap() - 1.5e-3).abs() < 1e-15);
        assert!(params.quantity("f").unwrap().unit().is_dimensionless());
        let file = params.file("file").unwrap();
        assert_eq!(file.path, PathBuf::from("dist.txt"));
        assert_eq!(file.units, Some(Unit::parse("um").unwrap()));
    }

    #[test]
    fn test_param_map_errors() {
        let raw = raw_params(r#"{"name": "x", "sigma_x": {"value": 1, "units": "mm"}}"#);
        let params = ParamMap::from_raw(&raw).unwrap();
        assert!(matches!(params.quantity("missing"), Err(Error::Config(_))));
        assert!(matches!(params.quantity("name"), Err(Error::Config(_))));
        assert!(matches!(params.file("sigma_x"), Err(Error::Config(_))));
        assert!(params.optional_quantity("missing").unwrap().is_none());

        let bad = raw_params(r#"{"sigma_x": {"value": 1, "units": "furlong"}}"#);
        assert!(matches!(ParamMap::from_raw(&bad), Err(Error::Unit(_))));
    }

    #[test]
    fn test_indexed_quantities_sorted() {
        let raw = raw_params(
            r#"{
                "crystal_length_2": {"value": 2, "units": "mm"},
                "crystal_length_1": {"value": 1, "units": "mm"},
                "crystal_angle_1": {"value": 45, "units": "deg"}
            }"#,
        );
        let params = ParamMap::from_raw(&raw).unwrap();
        let lengths = params.indexed_quantities("crystal_length_").unwrap();
        assert_eq!(lengths.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![1, 2]);
        assert!((lengths[1].1.value() - 2.0).abs() < 1e-15);

        let raw = raw_params(r#"{"crystal_length_a": {"value": 1, "units": "mm"}}"#);
        let params = ParamMap::from_raw(&raw).unwrap();
        assert!(params.indexed_quantities("crystal_length_").is_err());
    }

    #[test]
    fn test_generator_input_flatten() {
        let input = GeneratorInput::from_json_str(
            r#"{
                "beam": {"particle_count": 10, "start_type": "cathode"},
                "output": {"type": "gpt", "file": "beam.txt"},
                "r_dist": {"type": "rg", "params": {"sigma_xy": {"value": 1, "units": "mm"}}},
                "t_dist": {"type": "u", "params": {}}
            }"#,
        )
        .unwrap();
        assert_eq!(input.distributions.len(), 2);
        assert_eq!(input.distributions["r_dist"].kind, "rg");
        let output = input.output.unwrap();
        assert_eq!(output.format, "gpt");
        assert_eq!(output.file, Some(PathBuf::from("beam.txt")));
        assert!(input.beam.rand_type.is_none());
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = GeneratorInput::from_path("/nonexistent/input.json").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_from_path_reads_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.json");
        fs::write(
            &path,
            r#"{"beam": {"particle_count": 5, "start_type": "cathode"}}"#,
        )
        .unwrap();
        let input = GeneratorInput::from_path(&path).unwrap();
        assert_eq!(input.beam.particle_count, 5);
        assert!(input.distributions.is_empty());
    }
}
