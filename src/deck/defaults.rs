use super::error::Error;
use crate::model::settings::{Barostat, Ensemble, Thermostat};
use serde::Deserialize;
use std::path::Path;
use std::sync::OnceLock;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../../resources/default.settings.toml");

/// Highest defaults-table version this crate reads.
pub const DEFAULTS_VERSION: u32 = 1;

static DEFAULTS: OnceLock<Defaults> = OnceLock::new();

/// Versioned table of default setting values (metal units).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Defaults {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub settings: DefaultSettings,
}

fn default_version() -> u32 {
    DEFAULTS_VERSION
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            version: DEFAULTS_VERSION,
            settings: DefaultSettings::default(),
        }
    }
}

/// A default for every recognised setting.
///
/// Keys absent from a custom table keep the built-in value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DefaultSettings {
    pub atom_style: String,
    pub dimension: u8,
    pub boundary: String,
    pub units: String,
    pub ensemble: Ensemble,
    pub thermostat: Thermostat,
    pub barostat: Barostat,
    pub start_temp: f64,
    pub end_temp: f64,
    pub start_pressure: f64,
    pub end_pressure: f64,
    pub timestep: f64,
    pub n_steps: u64,
    pub friction: f64,
    pub tol: f64,
    pub seed: u64,
    pub log_interval: u64,
    pub traj_interval: u64,
    pub data_file: String,
    pub dump_file: String,
    pub restart_file: String,
}

impl Default for DefaultSettings {
    fn default() -> Self {
        Self {
            atom_style: "atomic".into(),
            dimension: 3,
            boundary: "p p p".into(),
            units: "metal".into(),
            ensemble: Ensemble::Nvt,
            thermostat: Thermostat::NoseHoover,
            barostat: Barostat::NoseHoover,
            start_temp: 300.0,
            end_temp: 300.0,
            start_pressure: 0.0,
            end_pressure: 0.0,
            timestep: 0.001,
            n_steps: 1000,
            friction: 0.1,
            tol: 1.0e-8,
            seed: 12345,
            log_interval: 100,
            traj_interval: 100,
            data_file: "system.data".into(),
            dump_file: "traj.dump".into(),
            restart_file: "final.restart".into(),
        }
    }
}

/// Parses a custom defaults table, or returns a copy of the built-in one.
pub fn load_defaults(custom_toml: Option<&str>) -> Result<Defaults, Error> {
    match custom_toml {
        Some(toml) => {
            let defaults: Defaults = toml::from_str(toml)?;
            check_version(defaults)
        }
        None => Ok(default_table().clone()),
    }
}

/// Reads and parses a defaults table from disk.
pub fn load_defaults_file(path: impl AsRef<Path>) -> Result<Defaults, Error> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| Error::DefaultsRead {
        path: path.to_path_buf(),
        source,
    })?;
    load_defaults(Some(&text))
}

/// The built-in defaults table, parsed once and shared read-only.
pub fn default_table() -> &'static Defaults {
    DEFAULTS.get_or_init(|| {
        toml::from_str(DEFAULT_SETTINGS_TOML)
            .expect("Failed to parse embedded default settings. This is a library bug.")
    })
}

fn check_version(defaults: Defaults) -> Result<Defaults, Error> {
    if defaults.version == 0 || defaults.version > DEFAULTS_VERSION {
        return Err(Error::UnsupportedDefaultsVersion(defaults.version));
    }
    Ok(defaults)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_table_matches_builtin_values() {
        assert_eq!(default_table(), &Defaults::default());
    }

    #[test]
    fn embedded_table_is_metal_units() {
        let d = &default_table().settings;
        assert_eq!(d.units, "metal");
        assert_eq!(d.timestep, 0.001);
        assert_eq!(d.ensemble, Ensemble::Nvt);
    }

    #[test]
    fn partial_custom_table_keeps_other_defaults() {
        let custom = r#"
            version = 1

            [settings]
            timestep = 0.002
            thermostat = "langevin"
        "#;
        let defaults = load_defaults(Some(custom)).unwrap();
        assert_eq!(defaults.settings.timestep, 0.002);
        assert_eq!(defaults.settings.thermostat, Thermostat::Langevin);
        assert_eq!(defaults.settings.n_steps, 1000);
        assert_eq!(defaults.settings.units, "metal");
    }

    #[test]
    fn errors_on_invalid_custom_toml() {
        assert!(matches!(
            load_defaults(Some("not valid [[[toml")),
            Err(Error::DefaultsParse(_))
        ));
    }

    #[test]
    fn errors_on_unknown_ensemble_name() {
        let custom = "[settings]\nensemble = \"nvx\"\n";
        assert!(load_defaults(Some(custom)).is_err());
    }

    #[test]
    fn rejects_future_versions() {
        assert!(matches!(
            load_defaults(Some("version = 2\n")),
            Err(Error::UnsupportedDefaultsVersion(2))
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_defaults_file("/nonexistent/defaults.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/defaults.toml"));
    }

    #[test]
    fn loaded_copies_are_independent() {
        let mut a = load_defaults(None).unwrap();
        a.settings.timestep = 0.5;
        let b = load_defaults(None).unwrap();
        assert_eq!(b.settings.timestep, 0.001);
        assert_eq!(default_table().settings.timestep, 0.001);
    }
}
