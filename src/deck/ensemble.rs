//! Ensemble dispatch: coupling combination → ordered fix styles.
//!
//! The supported combinations are an explicit table keyed by
//! [`CouplingKey`]. A key ignores the couplings its ensemble does not use,
//! so an NVE run is the same key whatever thermostat the settings name.

use super::error::Error;
use crate::model::settings::{
    Barostat, Ensemble, Pressure, PressureSymmetry, Ramp, ResolvedSettings, Thermostat,
};

/// Maximum box-size change per minimisation iteration.
const BOX_RELAX_VMAX: f64 = 0.001;

/// Ensemble plus the couplings relevant to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CouplingKey {
    pub ensemble: Ensemble,
    pub thermostat: Option<Thermostat>,
    pub barostat: Option<Barostat>,
}

impl CouplingKey {
    /// Builds the key for a combination, dropping couplings the ensemble ignores.
    pub fn new(ensemble: Ensemble, thermostat: Thermostat, barostat: Barostat) -> Self {
        let (thermostat, barostat) = match ensemble {
            Ensemble::Nvt => (Some(thermostat), None),
            Ensemble::Npt => (None, Some(barostat)),
            Ensemble::Nve | Ensemble::Nph | Ensemble::Minimize => (None, None),
        };
        Self {
            ensemble,
            thermostat,
            barostat,
        }
    }
}

/// Integration scheme selected by a [`CouplingKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Integrator {
    /// Plain velocity-Verlet.
    Nve,
    /// Nose-Hoover thermostatted NVT.
    NoseHooverNvt,
    /// Plain integration plus a Langevin thermostat.
    LangevinNvt,
    /// Nose-Hoover thermostatted and barostatted NPT.
    NoseHooverNpt,
    /// Plain integration plus Berendsen pressure rescaling.
    BerendsenNpt,
    /// Plain integration plus Nose-Hoover barostat without thermostat.
    Nph,
    /// Conjugate-gradient minimisation with box relaxation.
    BoxRelax,
}

const fn key(
    ensemble: Ensemble,
    thermostat: Option<Thermostat>,
    barostat: Option<Barostat>,
) -> CouplingKey {
    CouplingKey {
        ensemble,
        thermostat,
        barostat,
    }
}

/// Every supported combination.
pub const INTEGRATORS: [(CouplingKey, Integrator); 7] = [
    (key(Ensemble::Nve, None, None), Integrator::Nve),
    (
        key(Ensemble::Nvt, Some(Thermostat::NoseHoover), None),
        Integrator::NoseHooverNvt,
    ),
    (
        key(Ensemble::Nvt, Some(Thermostat::Langevin), None),
        Integrator::LangevinNvt,
    ),
    (
        key(Ensemble::Npt, None, Some(Barostat::NoseHoover)),
        Integrator::NoseHooverNpt,
    ),
    (
        key(Ensemble::Npt, None, Some(Barostat::Berendsen)),
        Integrator::BerendsenNpt,
    ),
    (key(Ensemble::Nph, None, None), Integrator::Nph),
    (key(Ensemble::Minimize, None, None), Integrator::BoxRelax),
];

/// Looks up the integrator for a combination.
///
/// # Errors
///
/// [`Error::UnsupportedEnsembleCombination`] when the table has no entry;
/// there is no fallback ensemble.
pub fn lookup(
    ensemble: Ensemble,
    thermostat: Thermostat,
    barostat: Barostat,
) -> Result<Integrator, Error> {
    let wanted = CouplingKey::new(ensemble, thermostat, barostat);
    INTEGRATORS
        .iter()
        .find(|(k, _)| *k == wanted)
        .map(|&(_, integrator)| integrator)
        .ok_or_else(|| Error::unsupported_combination(ensemble, thermostat, barostat))
}

/// Ordered fix styles for one run, plain integrator first.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFixSet {
    pub integrator: Integrator,
    pub fixes: Vec<String>,
}

/// Resolves the fix styles for a set of resolved settings.
pub fn resolve_fixes(settings: &ResolvedSettings) -> Result<ResolvedFixSet, Error> {
    let integrator = lookup(settings.ensemble, settings.thermostat, settings.barostat)?;
    let fixes = integrator.fixes(settings, settings.pressure_symmetry());
    Ok(ResolvedFixSet { integrator, fixes })
}

impl Integrator {
    #[inline]
    pub fn is_minimization(&self) -> bool {
        matches!(self, Integrator::BoxRelax)
    }

    /// Fix styles (without fix id and group) for this integrator.
    pub fn fixes(&self, s: &ResolvedSettings, symmetry: PressureSymmetry) -> Vec<String> {
        let t = &s.temperature;
        let f = s.friction;
        match self {
            Integrator::Nve => vec!["nve".to_string()],
            Integrator::NoseHooverNvt => {
                vec![format!("nvt temp {} {} {}", t.start, t.end, f)]
            }
            Integrator::LangevinNvt => vec![
                "nve".to_string(),
                format!("langevin {} {} {} {}", t.start, t.end, f, s.seed),
            ],
            Integrator::NoseHooverNpt => vec![format!(
                "npt temp {} {} {} {}",
                t.start,
                t.end,
                f,
                barostat_args(symmetry, &s.pressure, f)
            )],
            Integrator::BerendsenNpt => vec![
                "nve".to_string(),
                format!("press/berendsen {}", barostat_args(symmetry, &s.pressure, f)),
            ],
            Integrator::Nph => vec![
                "nve".to_string(),
                format!(
                    "nph {} {} {} {}",
                    t.start,
                    t.end,
                    f,
                    barostat_args(symmetry, &s.pressure, f)
                ),
            ],
            Integrator::BoxRelax => vec![format!(
                "box/relax {} vmax {}",
                relax_args(symmetry, &s.pressure.start),
                BOX_RELAX_VMAX
            )],
        }
    }
}

/// `iso <start> <end> <damp>`, or one `<axis> <start> <end> <damp>` group per axis.
fn barostat_args(symmetry: PressureSymmetry, pressure: &Ramp<Pressure>, damp: f64) -> String {
    match symmetry {
        PressureSymmetry::Iso => format!(
            "{} {} {} {}",
            symmetry,
            pressure.start.scalar(),
            pressure.end.scalar(),
            damp
        ),
        PressureSymmetry::Aniso => {
            let start = pressure.start.components();
            let end = pressure.end.components();
            ["x", "y", "z"]
                .iter()
                .enumerate()
                .map(|(i, axis)| format!("{} {} {} {}", axis, start[i], end[i], damp))
                .collect::<Vec<_>>()
                .join(" ")
        }
    }
}

fn relax_args(symmetry: PressureSymmetry, target: &Pressure) -> String {
    match symmetry {
        PressureSymmetry::Iso => format!("{} {}", symmetry, target.scalar()),
        PressureSymmetry::Aniso => {
            let p = target.components();
            format!("x {} y {} z {}", p[0], p[1], p[2])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::defaults::Defaults;
    use crate::deck::resolve::normalize;
    use crate::model::settings::SettingsMap;

    fn resolved(json: &str) -> ResolvedSettings {
        let raw: SettingsMap = serde_json::from_str(json).unwrap();
        normalize(&raw, &Defaults::default()).unwrap()
    }

    fn fixes(json: &str) -> Vec<String> {
        resolve_fixes(&resolved(json)).unwrap().fixes
    }

    #[test]
    fn every_combination_is_in_the_table_or_rejected() {
        let mut supported = 0;
        for ensemble in Ensemble::ALL {
            for thermostat in Thermostat::ALL {
                for barostat in Barostat::ALL {
                    match lookup(ensemble, thermostat, barostat) {
                        Ok(_) => supported += 1,
                        Err(Error::UnsupportedEnsembleCombination { .. }) => {
                            assert_eq!(ensemble, Ensemble::Npt);
                            assert_eq!(barostat, Barostat::Langevin);
                        }
                        Err(other) => panic!("unexpected error: {other}"),
                    }
                }
            }
        }
        assert_eq!(supported, 5 * 2 * 3 - 2);
    }

    #[test]
    fn table_keys_are_unique_and_canonical() {
        for (i, (a, _)) in INTEGRATORS.iter().enumerate() {
            for (b, _) in &INTEGRATORS[i + 1..] {
                assert_ne!(a, b);
            }
            let thermostat = a.thermostat.unwrap_or(Thermostat::NoseHoover);
            let barostat = a.barostat.unwrap_or(Barostat::NoseHoover);
            assert_eq!(CouplingKey::new(a.ensemble, thermostat, barostat), *a);
        }
    }

    #[test]
    fn nve_is_a_single_fix() {
        assert_eq!(fixes(r#"{"ensemble": "nve", "thermostat": "langevin"}"#), vec!["nve"]);
    }

    #[test]
    fn nose_hoover_nvt() {
        assert_eq!(
            fixes(r#"{"ensemble": "nvt", "thermostat": "nose-hoover", "temperature": [300, 1000]}"#),
            vec!["nvt temp 300 1000 0.1"]
        );
    }

    #[test]
    fn langevin_nvt_puts_integrator_first() {
        let set = resolve_fixes(&resolved(
            r#"{"ensemble": "nvt", "thermostat": "langevin", "seed": 7}"#,
        ))
        .unwrap();
        assert_eq!(set.integrator, Integrator::LangevinNvt);
        assert_eq!(set.fixes, vec!["nve", "langevin 300 300 0.1 7"]);
    }

    #[test]
    fn nose_hoover_npt() {
        assert_eq!(
            fixes(r#"{"ensemble": "npt", "pressure": [1, 10]}"#),
            vec!["npt temp 300 300 0.1 iso 1 10 0.1"]
        );
    }

    #[test]
    fn berendsen_npt_with_friction_correction() {
        assert_eq!(
            fixes(
                r#"{"ensemble": "npt", "barostat": "berendsen", "pressure": [0, 100], "timestep": 0.001, "friction": 0.0001}"#
            ),
            vec!["nve", "press/berendsen iso 0 100 0.001"]
        );
    }

    #[test]
    fn anisotropic_npt_writes_per_axis_groups() {
        assert_eq!(
            fixes(r#"{"ensemble": "npt", "pressure": [[0, 100, 0], [100, 100, 0]]}"#),
            vec!["npt temp 300 300 0.1 x 0 100 0.1 y 100 100 0.1 z 0 0 0.1"]
        );
    }

    #[test]
    fn nph_couples_pressure_after_plain_integrator() {
        assert_eq!(
            fixes(r#"{"ensemble": "nph", "pressure": 5}"#),
            vec!["nve", "nph 300 300 0.1 iso 5 5 0.1"]
        );
    }

    #[test]
    fn minimize_relaxes_the_box() {
        let set = resolve_fixes(&resolved(r#"{"ensemble": "minimize", "pressure": [2, 9]}"#))
            .unwrap();
        assert!(set.integrator.is_minimization());
        assert_eq!(set.fixes, vec!["box/relax iso 2 vmax 0.001"]);

        assert_eq!(
            fixes(r#"{"ensemble": "minimize", "pressure": [[1, 2, 3], [4, 5, 6]]}"#),
            vec!["box/relax x 1 y 2 z 3 vmax 0.001"]
        );
    }

    #[test]
    fn npt_with_langevin_barostat_is_unsupported() {
        let err = resolve_fixes(&resolved(r#"{"ensemble": "npt", "barostat": "langevin"}"#))
            .unwrap_err();
        assert!(err.to_string().contains("'langevin'"));
    }

    #[test]
    fn dispatch_is_deterministic() {
        let json = r#"{"ensemble": "nvt", "thermostat": "langevin", "temperature": [10, 20]}"#;
        let first = fixes(json);
        for _ in 0..10 {
            assert_eq!(fixes(json), first);
        }
    }
}
