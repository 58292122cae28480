//! Text formats read and written by the deck builder.
//!
//! - [`script`] – Stage-ordered input scripts (`# <Stage>` headers).
//! - [`data`] – LAMMPS atomic-data files.

use std::fmt;

pub mod data;
pub mod error;
pub mod script;

pub use error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Script,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Script => write!(f, "stage script"),
        }
    }
}
