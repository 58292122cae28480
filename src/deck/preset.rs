//! Ready-made settings for the common run types.

use crate::model::settings::{Ensemble, SettingsMap};
use std::fmt;

/// A named starting point for a run, layered under caller settings.
///
/// # Examples
///
/// ```
/// use lammps_deck::{Ensemble, Preset, SettingsMap, normalize, default_table};
///
/// let mut overrides = SettingsMap::new();
/// overrides.insert("timestep".into(), 0.005.into());
/// let r = normalize(&Preset::Nvt.with(overrides), default_table())?;
/// assert_eq!(r.ensemble, Ensemble::Nvt);
/// assert_eq!(r.timestep, 0.005);
/// # Ok::<(), lammps_deck::DeckError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    Nvt,
    Npt,
    Minimize,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Nvt, Preset::Npt, Preset::Minimize];

    pub fn ensemble(&self) -> Ensemble {
        match self {
            Preset::Nvt => Ensemble::Nvt,
            Preset::Npt => Ensemble::Npt,
            Preset::Minimize => Ensemble::Minimize,
        }
    }

    /// The preset alone, as a settings map.
    pub fn settings(&self) -> SettingsMap {
        let mut map = SettingsMap::new();
        map.insert("ensemble".into(), self.ensemble().as_str().into());
        map
    }

    /// The preset with `overrides` laid over it; every overriding key wins.
    pub fn with(&self, overrides: SettingsMap) -> SettingsMap {
        let mut map = self.settings();
        map.extend(overrides);
        map
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ensemble().as_str())
    }
}
