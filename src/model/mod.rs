//! Core data structures flowing through `lammps-deck`.
//!
//! - [`settings`] – Raw settings maps and the resolved, immutable configuration.
//! - [`force_field`] – Literal or structured interatomic potentials.
//! - [`stage`] – Stage-ordered script documents and stage-keyed command sets.
//! - [`structure`] – Atomic structures and the atomic-data payload.
//! - [`element`] – Element symbols and atomic masses.
//!
//! The model separates what the caller asked for ([`SettingsMap`]) from what
//! a deck is built from ([`ResolvedSettings`]), so the resolver is the only
//! place where defaults and corrections are applied.
//!
//! [`SettingsMap`]: settings::SettingsMap
//! [`ResolvedSettings`]: settings::ResolvedSettings

pub mod element;
pub mod force_field;
pub mod settings;
pub mod stage;
pub mod structure;
