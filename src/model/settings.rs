//! Raw and resolved simulation settings.
//!
//! A [`SettingsMap`] is the sparse, JSON-shaped mapping a caller hands in.
//! [`ResolvedSettings`] is the complete, immutable configuration produced from
//! it by [`normalize`](crate::normalize) and consumed by every later step.

use super::force_field::ForceField;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Raw user settings keyed by setting name.
pub type SettingsMap = BTreeMap<String, SettingValue>;

/// A single raw setting value: a scalar, a sequence, or a nested record.
///
/// Deserialises untagged, so any JSON object of scalars, arrays and
/// sub-objects is a valid [`SettingsMap`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Sequence(Vec<SettingValue>),
    Table(BTreeMap<String, SettingValue>),
}

impl SettingValue {
    /// Numeric view of an integer or float value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SettingValue::Integer(i) => Some(*i as f64),
            SettingValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Non-negative integer view; floats qualify only when integral.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            SettingValue::Integer(i) => u64::try_from(*i).ok(),
            SettingValue::Float(f) if *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64 => {
                Some(*f as u64)
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[SettingValue]> {
        match self {
            SettingValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            SettingValue::Bool(_) => "boolean",
            SettingValue::Integer(_) => "integer",
            SettingValue::Float(_) => "float",
            SettingValue::Text(_) => "string",
            SettingValue::Sequence(_) => "sequence",
            SettingValue::Table(_) => "record",
        }
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Bool(value)
    }
}

impl From<i32> for SettingValue {
    fn from(value: i32) -> Self {
        SettingValue::Integer(value.into())
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        SettingValue::Integer(value)
    }
}

impl From<u64> for SettingValue {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(i) => SettingValue::Integer(i),
            Err(_) => SettingValue::Float(value as f64),
        }
    }
}

impl From<f64> for SettingValue {
    fn from(value: f64) -> Self {
        SettingValue::Float(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::Text(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        SettingValue::Text(value)
    }
}

impl<T: Into<SettingValue>> From<Vec<T>> for SettingValue {
    fn from(values: Vec<T>) -> Self {
        SettingValue::Sequence(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<SettingValue>, const N: usize> From<[T; N]> for SettingValue {
    fn from(values: [T; N]) -> Self {
        SettingValue::Sequence(values.into_iter().map(Into::into).collect())
    }
}

/// Error returned when a setting string names no known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} '{value}'")]
pub struct ParseSettingError {
    kind: &'static str,
    value: String,
}

impl ParseSettingError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Statistical ensemble of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Ensemble {
    /// Constant particle count, volume and energy.
    Nve,
    /// Constant particle count, volume and temperature.
    Nvt,
    /// Constant particle count, pressure and temperature.
    Npt,
    /// Constant particle count, pressure and enthalpy.
    Nph,
    /// Energy minimisation with box relaxation instead of dynamics.
    Minimize,
}

impl Ensemble {
    pub const ALL: [Ensemble; 5] = [
        Ensemble::Nve,
        Ensemble::Nvt,
        Ensemble::Npt,
        Ensemble::Nph,
        Ensemble::Minimize,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Ensemble::Nve => "nve",
            Ensemble::Nvt => "nvt",
            Ensemble::Npt => "npt",
            Ensemble::Nph => "nph",
            Ensemble::Minimize => "minimize",
        }
    }
}

impl fmt::Display for Ensemble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Ensemble {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Ensemble::ALL
            .into_iter()
            .find(|e| e.as_str() == lowered)
            .ok_or_else(|| ParseSettingError::new("ensemble", s))
    }
}

/// Temperature coupling algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Thermostat {
    Langevin,
    NoseHoover,
}

impl Thermostat {
    pub const ALL: [Thermostat; 2] = [Thermostat::Langevin, Thermostat::NoseHoover];

    pub fn as_str(&self) -> &'static str {
        match self {
            Thermostat::Langevin => "langevin",
            Thermostat::NoseHoover => "nose-hoover",
        }
    }
}

impl fmt::Display for Thermostat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Thermostat {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase().replace('_', "-");
        Thermostat::ALL
            .into_iter()
            .find(|t| t.as_str() == lowered)
            .ok_or_else(|| ParseSettingError::new("thermostat", s))
    }
}

/// Pressure coupling algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Barostat {
    Berendsen,
    NoseHoover,
    Langevin,
}

impl Barostat {
    pub const ALL: [Barostat; 3] = [Barostat::Berendsen, Barostat::NoseHoover, Barostat::Langevin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Barostat::Berendsen => "berendsen",
            Barostat::NoseHoover => "nose-hoover",
            Barostat::Langevin => "langevin",
        }
    }
}

impl fmt::Display for Barostat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Barostat {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase().replace('_', "-");
        Barostat::ALL
            .into_iter()
            .find(|b| b.as_str() == lowered)
            .ok_or_else(|| ParseSettingError::new("barostat", s))
    }
}

/// Whether pressure is coupled isotropically or per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PressureSymmetry {
    Iso,
    Aniso,
}

impl PressureSymmetry {
    pub fn as_str(&self) -> &'static str {
        match self {
            PressureSymmetry::Iso => "iso",
            PressureSymmetry::Aniso => "aniso",
        }
    }
}

impl fmt::Display for PressureSymmetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One pressure endpoint: a single value, or independent x/y/z components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pressure {
    Scalar(f64),
    Axes([f64; 3]),
}

impl Pressure {
    #[inline]
    pub fn is_anisotropic(&self) -> bool {
        matches!(self, Pressure::Axes(_))
    }

    /// Per-axis components; a scalar is broadcast to all three axes.
    pub fn components(&self) -> [f64; 3] {
        match *self {
            Pressure::Scalar(p) => [p, p, p],
            Pressure::Axes(axes) => axes,
        }
    }

    /// The isotropic value; for per-axis pressure this is the x component.
    pub fn scalar(&self) -> f64 {
        match *self {
            Pressure::Scalar(p) => p,
            Pressure::Axes(axes) => axes[0],
        }
    }

    fn to_setting(self) -> SettingValue {
        match self {
            Pressure::Scalar(p) => SettingValue::Float(p),
            Pressure::Axes(axes) => SettingValue::from(axes),
        }
    }
}

/// Start and end value of a linearly ramped quantity.
///
/// Only the endpoints of a user-supplied ramp survive resolution; any
/// intermediate points are discarded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ramp<T> {
    pub start: T,
    pub end: T,
}

impl<T: Copy> Ramp<T> {
    pub fn new(start: T, end: T) -> Self {
        Self { start, end }
    }

    pub fn constant(value: T) -> Self {
        Self {
            start: value,
            end: value,
        }
    }
}

/// Complete, validated configuration for one input deck.
///
/// Produced once per invocation and passed by value; nothing downstream
/// mutates it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSettings {
    pub atom_style: String,
    pub dimension: u8,
    pub boundary: String,
    pub units: String,
    pub ensemble: Ensemble,
    pub thermostat: Thermostat,
    pub barostat: Barostat,
    /// Temperature in K.
    pub temperature: Ramp<f64>,
    /// Pressure in bar.
    pub pressure: Ramp<Pressure>,
    /// Timestep in ps.
    pub timestep: f64,
    pub n_steps: u64,
    /// Damping time shared by thermostat and barostat, in ps.
    pub friction: f64,
    /// Energy and force tolerance for minimisation.
    pub tol: f64,
    pub seed: u64,
    pub log_interval: u64,
    pub traj_interval: u64,
    /// Force field supplied alongside the settings, if any.
    pub force_field: Option<ForceField>,
    /// Species symbols in atom-type order, when known.
    pub species: Vec<String>,
    pub data_file: String,
    pub dump_file: String,
    pub restart_file: String,
}

impl ResolvedSettings {
    /// [`PressureSymmetry::Aniso`] when either pressure endpoint has per-axis components.
    pub fn pressure_symmetry(&self) -> PressureSymmetry {
        if self.pressure.start.is_anisotropic() || self.pressure.end.is_anisotropic() {
            PressureSymmetry::Aniso
        } else {
            PressureSymmetry::Iso
        }
    }

    /// Renders every recognised setting back into a raw map.
    ///
    /// Normalising the result again yields an identical [`ResolvedSettings`].
    pub fn to_settings_map(&self) -> SettingsMap {
        let mut map = SettingsMap::new();
        let mut put = |key: &str, value: SettingValue| {
            map.insert(key.to_string(), value);
        };

        put("atom_style", self.atom_style.as_str().into());
        put("dimension", i64::from(self.dimension).into());
        put("boundary", self.boundary.as_str().into());
        put("units", self.units.as_str().into());
        put("ensemble", self.ensemble.as_str().into());
        put("thermostat", self.thermostat.as_str().into());
        put("barostat", self.barostat.as_str().into());
        put("start_temp", self.temperature.start.into());
        put("end_temp", self.temperature.end.into());
        put("start_pressure", self.pressure.start.to_setting());
        put("end_pressure", self.pressure.end.to_setting());
        put("timestep", self.timestep.into());
        put("n_steps", self.n_steps.into());
        put("friction", self.friction.into());
        put("tol", self.tol.into());
        put("seed", self.seed.into());
        put("log_interval", self.log_interval.into());
        put("traj_interval", self.traj_interval.into());
        put("data_file", self.data_file.as_str().into());
        put("dump_file", self.dump_file.as_str().into());
        put("restart_file", self.restart_file.as_str().into());
        put(
            "species",
            SettingValue::from(self.species.iter().map(String::as_str).collect::<Vec<_>>()),
        );
        if let Some(ff) = &self.force_field {
            put("force_field", ff.to_setting());
        }

        map
    }
}
