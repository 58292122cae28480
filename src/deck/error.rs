//! Error types for settings resolution and stage assembly.
//!
//! Every failure is a local validation error raised before any document is
//! returned. Conditions that are auto-corrected (such as an unstable
//! friction coefficient) are logged, not reported here.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving settings or assembling a deck.
#[derive(Debug, Error)]
pub enum Error {
    /// A structured force-field record is missing a field or has the wrong shape.
    #[error("malformed force field: {detail}")]
    MalformedForceField {
        /// Description of the problem.
        detail: String,
    },

    /// No fix table entry exists for the requested coupling combination.
    #[error(
        "unsupported ensemble combination: ensemble '{ensemble}' with thermostat '{thermostat}' and barostat '{barostat}'"
    )]
    UnsupportedEnsembleCombination {
        ensemble: String,
        thermostat: String,
        barostat: String,
    },

    /// Neither an explicit force field nor one embedded in the atomic data.
    #[error(
        "no force field supplied: provide one explicitly or embed it in the atomic-data payload"
    )]
    MissingForceField,

    /// A setting has the wrong type or an out-of-range value.
    #[error("invalid setting '{key}': {detail}")]
    InvalidSetting {
        /// The offending setting name.
        key: String,
        /// Description of the problem.
        detail: String,
    },

    /// A structure species has no atom type in the force field.
    #[error("species '{species}' in the structure is not mapped by the force field")]
    UnknownSpecies { species: String },

    /// Failed to parse a defaults table.
    #[error("failed to parse defaults table: {0}")]
    DefaultsParse(#[from] toml::de::Error),

    /// Failed to read a defaults table from disk.
    #[error("failed to read defaults table '{}': {source}", path.display())]
    DefaultsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The defaults table declares a version this crate does not understand.
    #[error("unsupported defaults table version {0}")]
    UnsupportedDefaultsVersion(u32),

    /// Rendering an output file failed.
    #[error(transparent)]
    Io(#[from] crate::io::error::Error),
}

impl Error {
    /// Creates a [`MalformedForceField`](Error::MalformedForceField) error.
    pub fn malformed_force_field(detail: impl Into<String>) -> Self {
        Self::MalformedForceField {
            detail: detail.into(),
        }
    }

    /// Creates an [`InvalidSetting`](Error::InvalidSetting) error.
    ///
    /// # Arguments
    ///
    /// * `key` – Name of the offending setting
    /// * `detail` – Description of the problem
    pub fn invalid_setting(key: &str, detail: impl Into<String>) -> Self {
        Self::InvalidSetting {
            key: key.to_string(),
            detail: detail.into(),
        }
    }

    /// Creates an [`UnsupportedEnsembleCombination`](Error::UnsupportedEnsembleCombination) error.
    pub fn unsupported_combination(
        ensemble: impl ToString,
        thermostat: impl ToString,
        barostat: impl ToString,
    ) -> Self {
        Self::UnsupportedEnsembleCombination {
            ensemble: ensemble.to_string(),
            thermostat: thermostat.to_string(),
            barostat: barostat.to_string(),
        }
    }
}
