//! Builds LAMMPS molecular-dynamics input decks from a compact physical
//! description of a run.
//!
//! A caller supplies a settings map (ensemble, temperature and pressure
//! ramps, coupling choices, step counts), an atomic structure and a force
//! field. The crate turns them into a stage-ordered input script and the
//! matching atomic-data file.
//!
//! # Pipeline
//!
//! 1. [`normalize`] merges the raw settings with a versioned defaults table,
//!    validates them, and corrects a friction coefficient too small for the
//!    timestep.
//! 2. [`derive_stage_commands`] maps the resolved configuration onto
//!    commands per stage, selecting fix styles from a fixed table keyed by
//!    ensemble, thermostat and barostat ([`lookup`]).
//! 3. [`apply`] patches those commands into a template [`StageDocument`].
//!    Patching is idempotent, and stages that do not apply are removed.
//! 4. [`io::data`] renders the atomic-data file.
//!
//! [`generate`] runs all four steps.
//!
//! # Quick Start
//!
//! ```
//! use lammps_deck::{AtomicData, GenerateOptions, SettingsMap, Site, Structure};
//! use lammps_deck::{DeckError, generate};
//!
//! let settings: SettingsMap = serde_json::from_str(r#"{
//!     "ensemble": "nvt",
//!     "thermostat": "langevin",
//!     "temperature": [300, 900],
//!     "timestep": 0.001,
//!     "friction": 0.0001,
//!     "force_field": {
//!         "pair_style": "tersoff",
//!         "pair_coeff": "* * Si.tersoff",
//!         "species": ["Si"]
//!     }
//! }"#).unwrap();
//!
//! let silicon = AtomicData::new(
//!     Structure::periodic([[5.43, 0.0, 0.0], [0.0, 5.43, 0.0], [0.0, 0.0, 5.43]])
//!         .with_site(Site::new("Si", [0.0, 0.0, 0.0]))
//!         .with_site(Site::new("Si", [1.3575, 1.3575, 1.3575])),
//! );
//!
//! let deck = generate(&settings, &silicon, &GenerateOptions::default())?;
//!
//! // The friction is raised to the timestep, and a Langevin run couples a
//! // plain integrator with the thermostat fix.
//! assert_eq!(deck.settings.friction, 0.001);
//! assert_eq!(
//!     deck.script.args_of("fix"),
//!     vec!["1 all nve", "2 all langevin 300 900 0.001 12345"]
//! );
//! assert!(deck.script_text().contains("pair_coeff * * Si.tersoff Si\n"));
//! assert!(deck.data.contains("2 atoms\n1 atom types\n"));
//! # Ok::<(), DeckError>(())
//! ```
//!
//! # Module Organization
//!
//! - [`io`] – Stage-script reader/writer and the atomic-data file writer
//! - [`generate`] – End-to-end pipeline
//! - [`normalize`], [`derive_stage_commands`], [`apply`] – Individual steps
//!
//! # Data Types
//!
//! - [`SettingsMap`] / [`SettingValue`] – Raw settings, deserializable from JSON
//! - [`Preset`] – NVT, NPT and minimisation starting points for a settings map
//! - [`ResolvedSettings`] – Validated, immutable configuration
//! - [`ForceField`] – Literal script text or a structured pair style
//! - [`StageDocument`] / [`Stage`] / [`Command`] – Stage-ordered script model
//! - [`StageCommands`] – Stage-keyed commands to patch into a document
//! - [`Structure`] / [`Site`] / [`AtomicData`] – Atomic payload
//! - [`InputSet`] – Script, data file and auxiliary files for one run

mod deck;
mod model;

pub mod io;

pub use model::element::{atomic_mass, is_element_symbol};
pub use model::force_field::ForceField;
pub use model::settings::{
    Barostat, Ensemble, ParseSettingError, Pressure, PressureSymmetry, Ramp, ResolvedSettings,
    SettingValue, SettingsMap, Thermostat,
};
pub use model::stage::{
    Command, ParseStageNameError, Stage, StageCommands, StageDocument, StageName, is_repeatable,
};
pub use model::structure::{AtomicData, Site, Structure};

pub use deck::{
    AssembleMode, AssembleOptions, Assembled, AssemblyPayloads, CouplingKey, DEFAULTS_VERSION,
    DUMP_FIELDS, DefaultSettings, Defaults, GenerateOptions, INTEGRATORS, InputSet, Integrator,
    MAX_EVALUATIONS, Preset, RECOGNIZED_KEYS, ResolvedFixSet, SCRIPT_FILE, apply, atom_type_order,
    default_table, derive_stage_commands, generate, load_defaults, load_defaults_file, lookup,
    normalize, relabel_args, resolve_fixes, stabilize_friction,
};

pub use deck::Error as DeckError;
