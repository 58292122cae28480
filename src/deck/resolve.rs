//! Normalisation of raw settings into [`ResolvedSettings`].
//!
//! Every recognised key is taken from the raw map when present and from the
//! defaults table otherwise. Temperature and pressure collapse to their
//! endpoints; a structured force field is validated and reduced; an unstable
//! friction coefficient is raised to the timestep.

use super::defaults::{DefaultSettings, Defaults};
use super::error::Error;
use crate::model::force_field::ForceField;
use crate::model::settings::{Pressure, Ramp, ResolvedSettings, SettingValue, SettingsMap};
use log::warn;
use std::str::FromStr;

/// Setting names the resolver understands.
pub const RECOGNIZED_KEYS: &[&str] = &[
    "atom_style",
    "dimension",
    "boundary",
    "units",
    "ensemble",
    "thermostat",
    "barostat",
    "temperature",
    "start_temp",
    "end_temp",
    "pressure",
    "start_pressure",
    "end_pressure",
    "timestep",
    "n_steps",
    "nsteps",
    "friction",
    "tol",
    "seed",
    "log_interval",
    "traj_interval",
    "force_field",
    "species",
    "data_file",
    "dump_file",
    "restart_file",
];

/// Resolves a sparse settings map against a defaults table.
///
/// Pure: neither `raw` nor `defaults` is modified, and the same inputs always
/// produce the same result.
///
/// # Errors
///
/// [`Error::InvalidSetting`] for a value of the wrong type or range, whether
/// it comes from `raw` or from `defaults`, and
/// [`Error::MalformedForceField`] for a force-field record missing
/// `pair_style`, `pair_coeff` or `species`.
pub fn normalize(raw: &SettingsMap, defaults: &Defaults) -> Result<ResolvedSettings, Error> {
    let d = &defaults.settings;

    for key in raw.keys() {
        if !RECOGNIZED_KEYS.contains(&key.as_str()) {
            warn!("ignoring unrecognised setting '{}'", key);
        }
    }

    let timestep = number(raw, "timestep")?.unwrap_or(d.timestep);
    if !(timestep.is_finite() && timestep > 0.0) {
        return Err(Error::invalid_setting(
            "timestep",
            format!("must be positive, got {}", timestep),
        ));
    }

    let friction = number(raw, "friction")?.unwrap_or(d.friction);
    if !(friction.is_finite() && friction >= 0.0) {
        return Err(Error::invalid_setting(
            "friction",
            format!("must be a non-negative number, got {}", friction),
        ));
    }
    let friction = stabilize_friction(friction, timestep);

    let dimension = match count(raw, "dimension")?.unwrap_or(u64::from(d.dimension)) {
        dim @ (2 | 3) => dim as u8,
        other => {
            return Err(Error::invalid_setting(
                "dimension",
                format!("must be 2 or 3, got {}", other),
            ));
        }
    };

    let temperature = temperature(raw, d)?;
    for (end, value) in [("start_temp", temperature.start), ("end_temp", temperature.end)] {
        if !(value.is_finite() && value >= 0.0) {
            return Err(Error::invalid_setting(
                end,
                format!("must be a non-negative temperature, got {}", value),
            ));
        }
    }
    let pressure = pressure(raw, d)?;
    for (end, value) in [("start_pressure", &pressure.start), ("end_pressure", &pressure.end)] {
        if !value.components().iter().all(|p| p.is_finite()) {
            return Err(Error::invalid_setting(end, "must be finite"));
        }
    }
    let tol = number(raw, "tol")?.unwrap_or(d.tol);
    if !(tol.is_finite() && tol >= 0.0) {
        return Err(Error::invalid_setting(
            "tol",
            format!("must be a non-negative number, got {}", tol),
        ));
    }

    let n_steps = match count(raw, "n_steps")? {
        Some(n) => n,
        None => count(raw, "nsteps")?.unwrap_or(d.n_steps),
    };

    let force_field = raw.get("force_field").map(force_field).transpose()?;
    let species = species(raw, force_field.as_ref())?;

    Ok(ResolvedSettings {
        atom_style: text(raw, "atom_style")?.unwrap_or_else(|| d.atom_style.clone()),
        dimension,
        boundary: text(raw, "boundary")?.unwrap_or_else(|| d.boundary.clone()),
        units: text(raw, "units")?.unwrap_or_else(|| d.units.clone()),
        ensemble: parsed(raw, "ensemble")?.unwrap_or(d.ensemble),
        thermostat: parsed(raw, "thermostat")?.unwrap_or(d.thermostat),
        barostat: parsed(raw, "barostat")?.unwrap_or(d.barostat),
        temperature,
        pressure,
        timestep,
        n_steps,
        friction,
        tol,
        seed: count(raw, "seed")?.unwrap_or(d.seed),
        log_interval: interval(raw, "log_interval", d.log_interval)?,
        traj_interval: interval(raw, "traj_interval", d.traj_interval)?,
        force_field,
        species,
        data_file: text(raw, "data_file")?.unwrap_or_else(|| d.data_file.clone()),
        dump_file: text(raw, "dump_file")?.unwrap_or_else(|| d.dump_file.clone()),
        restart_file: text(raw, "restart_file")?.unwrap_or_else(|| d.restart_file.clone()),
    })
}

/// Raises a friction coefficient at or below a tenth of the timestep to the
/// timestep itself.
///
/// Correcting an already-corrected value is a no-op.
pub fn stabilize_friction(friction: f64, timestep: f64) -> f64 {
    if friction * 10.0 <= timestep {
        warn!(
            "friction {} is below the stability threshold for timestep {}; using {}",
            friction, timestep, timestep
        );
        timestep
    } else {
        friction
    }
}

/// Species in atom-type order.
///
/// A structured record's `species` always wins, so `pair_coeff` and the
/// atom types cannot disagree; a conflicting `species` key is ignored with a
/// warning. For a literal block the key must match the species its
/// `pair_coeff` line names, and is only used as-is when none can be read off.
fn species(raw: &SettingsMap, force_field: Option<&ForceField>) -> Result<Vec<String>, Error> {
    let named = force_field.map(ForceField::species).unwrap_or_default();
    let Some(value) = raw.get("species") else {
        return Ok(named);
    };
    let listed = symbol_list("species", value)?;
    match force_field {
        Some(ForceField::Structured { .. }) if listed != named => {
            warn!(
                "ignoring 'species' {:?}: the force-field record maps {:?}",
                listed, named
            );
            Ok(named)
        }
        Some(ForceField::Literal(_)) if !named.is_empty() && listed != named => {
            Err(Error::invalid_setting(
                "species",
                format!(
                    "{:?} disagrees with the species {:?} named by pair_coeff",
                    listed, named
                ),
            ))
        }
        _ => Ok(listed),
    }
}

fn temperature(raw: &SettingsMap, d: &DefaultSettings) -> Result<Ramp<f64>, Error> {
    if let Some(value) = raw.get("temperature") {
        if raw.contains_key("start_temp") || raw.contains_key("end_temp") {
            warn!("'temperature' overrides 'start_temp'/'end_temp'");
        }
        return scalar_ramp("temperature", value);
    }

    let start = number(raw, "start_temp")?;
    let end = number(raw, "end_temp")?;
    Ok(match (start, end) {
        (Some(s), Some(e)) => Ramp::new(s, e),
        (Some(s), None) => Ramp::constant(s),
        (None, Some(e)) => Ramp::new(d.start_temp, e),
        (None, None) => Ramp::new(d.start_temp, d.end_temp),
    })
}

fn pressure(raw: &SettingsMap, d: &DefaultSettings) -> Result<Ramp<Pressure>, Error> {
    if let Some(value) = raw.get("pressure") {
        if raw.contains_key("start_pressure") || raw.contains_key("end_pressure") {
            warn!("'pressure' overrides 'start_pressure'/'end_pressure'");
        }
        return pressure_ramp("pressure", value);
    }

    let start = raw
        .get("start_pressure")
        .map(|v| pressure_point("start_pressure", v))
        .transpose()?;
    let end = raw
        .get("end_pressure")
        .map(|v| pressure_point("end_pressure", v))
        .transpose()?;
    Ok(match (start, end) {
        (Some(s), Some(e)) => Ramp::new(s, e),
        (Some(s), None) => Ramp::constant(s),
        (None, Some(e)) => Ramp::new(Pressure::Scalar(d.start_pressure), e),
        (None, None) => Ramp::new(
            Pressure::Scalar(d.start_pressure),
            Pressure::Scalar(d.end_pressure),
        ),
    })
}

/// Scalar → constant ramp; sequence → (first, last).
fn scalar_ramp(key: &str, value: &SettingValue) -> Result<Ramp<f64>, Error> {
    match value {
        SettingValue::Sequence(items) => {
            let (Some(first), Some(last)) = (items.first(), items.last()) else {
                return Err(Error::invalid_setting(key, "sequence must not be empty"));
            };
            Ok(Ramp::new(as_number(key, first)?, as_number(key, last)?))
        }
        other => Ok(Ramp::constant(as_number(key, other)?)),
    }
}

fn pressure_ramp(key: &str, value: &SettingValue) -> Result<Ramp<Pressure>, Error> {
    match value {
        SettingValue::Sequence(items) => {
            let (Some(first), Some(last)) = (items.first(), items.last()) else {
                return Err(Error::invalid_setting(key, "sequence must not be empty"));
            };
            Ok(Ramp::new(
                pressure_point(key, first)?,
                pressure_point(key, last)?,
            ))
        }
        other => Ok(Ramp::constant(Pressure::Scalar(as_number(key, other)?))),
    }
}

/// A single pressure endpoint: a number, or exactly three per-axis numbers.
fn pressure_point(key: &str, value: &SettingValue) -> Result<Pressure, Error> {
    match value {
        SettingValue::Sequence(axes) => {
            let [x, y, z] = axes.as_slice() else {
                return Err(Error::invalid_setting(
                    key,
                    format!(
                        "anisotropic pressure needs exactly 3 components, got {}",
                        axes.len()
                    ),
                ));
            };
            Ok(Pressure::Axes([
                as_number(key, x)?,
                as_number(key, y)?,
                as_number(key, z)?,
            ]))
        }
        other => Ok(Pressure::Scalar(as_number(key, other)?)),
    }
}

fn force_field(value: &SettingValue) -> Result<ForceField, Error> {
    match value {
        SettingValue::Text(text) if text.trim().is_empty() => {
            Err(Error::malformed_force_field("command string is empty"))
        }
        SettingValue::Text(text) => Ok(ForceField::Literal(text.clone())),
        SettingValue::Table(record) => {
            let field = |name: &str| {
                record.get(name).ok_or_else(|| {
                    Error::malformed_force_field(format!("record is missing '{}'", name))
                })
            };
            let string_field = |name: &str| -> Result<String, Error> {
                field(name)?.as_str().map(str::to_string).ok_or_else(|| {
                    Error::malformed_force_field(format!("'{}' must be a string", name))
                })
            };

            let pair_style = string_field("pair_style")?;
            let pair_coeff = string_field("pair_coeff")?;
            let species = field("species")?
                .as_sequence()
                .and_then(|items| {
                    items
                        .iter()
                        .map(|s| s.as_str().map(str::to_string))
                        .collect::<Option<Vec<_>>>()
                })
                .ok_or_else(|| {
                    Error::malformed_force_field("'species' must be a list of element symbols")
                })?;

            Ok(ForceField::Structured {
                pair_style,
                pair_coeff,
                species,
            })
        }
        other => Err(Error::malformed_force_field(format!(
            "expected a command string or a {{pair_style, pair_coeff, species}} record, got {}",
            other.kind()
        ))),
    }
}

fn as_number(key: &str, value: &SettingValue) -> Result<f64, Error> {
    value
        .as_f64()
        .ok_or_else(|| Error::invalid_setting(key, format!("expected a number, got {}", value.kind())))
}

fn number(raw: &SettingsMap, key: &str) -> Result<Option<f64>, Error> {
    raw.get(key).map(|v| as_number(key, v)).transpose()
}

fn count(raw: &SettingsMap, key: &str) -> Result<Option<u64>, Error> {
    raw.get(key)
        .map(|v| {
            v.as_u64().ok_or_else(|| {
                Error::invalid_setting(key, "expected a non-negative integer")
            })
        })
        .transpose()
}

fn interval(raw: &SettingsMap, key: &str, default: u64) -> Result<u64, Error> {
    match count(raw, key)?.unwrap_or(default) {
        0 => Err(Error::invalid_setting(key, "must be at least 1")),
        n => Ok(n),
    }
}

fn text(raw: &SettingsMap, key: &str) -> Result<Option<String>, Error> {
    raw.get(key)
        .map(|v| match v {
            SettingValue::Text(s) => Ok(s.clone()),
            SettingValue::Integer(i) => Ok(i.to_string()),
            other => Err(Error::invalid_setting(
                key,
                format!("expected a string, got {}", other.kind()),
            )),
        })
        .transpose()
}

fn parsed<T>(raw: &SettingsMap, key: &str) -> Result<Option<T>, Error>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.get(key)
        .map(|v| {
            let s = v.as_str().ok_or_else(|| {
                Error::invalid_setting(key, format!("expected a string, got {}", v.kind()))
            })?;
            s.parse::<T>()
                .map_err(|e| Error::invalid_setting(key, e.to_string()))
        })
        .transpose()
}

fn symbol_list(key: &str, value: &SettingValue) -> Result<Vec<String>, Error> {
    match value {
        SettingValue::Text(s) => Ok(s.split_whitespace().map(str::to_string).collect()),
        SettingValue::Sequence(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| Error::invalid_setting(key, "expected a list of symbols"))
            })
            .collect(),
        other => Err(Error::invalid_setting(
            key,
            format!("expected a list of symbols, got {}", other.kind()),
        )),
    }
}
