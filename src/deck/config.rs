//! Options controlling assembly and the end-to-end pipeline.

use super::defaults::Defaults;
use crate::model::stage::StageDocument;

/// How [`apply`](crate::apply) treats the supplied document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssembleMode {
    /// Patch resolved commands into the document.
    #[default]
    Patch,
    /// Return the document and payloads untouched. Only the force-field
    /// check still runs.
    Override,
}

/// Options for [`apply`](crate::apply).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembleOptions {
    pub mode: AssembleMode,
    /// Logical name under which additional data is persisted and included.
    pub additional_data_file: String,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            mode: AssembleMode::Patch,
            additional_data_file: "additional.data".into(),
        }
    }
}

/// Options for [`generate`](crate::generate).
///
/// # Examples
///
/// ```
/// use lammps_deck::{AssembleMode, AssembleOptions, GenerateOptions};
///
/// let opts = GenerateOptions {
///     assemble: AssembleOptions {
///         mode: AssembleMode::Override,
///         ..Default::default()
///     },
///     ..Default::default()
/// };
/// assert!(opts.template.is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Defaults table; the embedded one when `None`.
    pub defaults: Option<Defaults>,
    /// Document to patch; the embedded MD template when `None`.
    pub template: Option<StageDocument>,
    /// Extra script text included from its own file.
    pub additional_data: Option<String>,
    pub assemble: AssembleOptions,
}
