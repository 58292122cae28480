mod assemble;
mod commands;
mod config;
mod defaults;
mod ensemble;
mod error;
mod preset;
mod resolve;

pub use assemble::{Assembled, AssemblyPayloads, apply, atom_type_order};
pub use commands::{DUMP_FIELDS, MAX_EVALUATIONS, derive_stage_commands, relabel_args};
pub use config::{AssembleMode, AssembleOptions, GenerateOptions};
pub use defaults::{
    DEFAULTS_VERSION, DefaultSettings, Defaults, default_table, load_defaults, load_defaults_file,
};
pub use ensemble::{CouplingKey, INTEGRATORS, Integrator, ResolvedFixSet, lookup, resolve_fixes};
pub use error::Error;
pub use preset::Preset;
pub use resolve::{RECOGNIZED_KEYS, normalize, stabilize_friction};

use crate::io;
use crate::model::settings::{ResolvedSettings, SettingsMap};
use crate::model::stage::StageDocument;
use crate::model::structure::AtomicData;
use log::debug;
use std::collections::BTreeMap;
use std::path::Path;

/// File name the script is written under by [`InputSet::write_to`].
pub const SCRIPT_FILE: &str = "in.lammps";

/// Everything needed to launch one run.
#[derive(Debug, Clone, PartialEq)]
pub struct InputSet {
    pub settings: ResolvedSettings,
    pub script: StageDocument,
    /// Rendered atomic-data file.
    pub data: String,
    /// Name the script's `read_data` expects for [`data`](Self::data).
    pub data_file: String,
    /// Auxiliary files keyed by file name.
    pub aux: BTreeMap<String, String>,
}

impl InputSet {
    /// Rendered input script.
    pub fn script_text(&self) -> String {
        self.script.to_string()
    }

    /// Writes the script, data file and auxiliary files into `dir`.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<(), Error> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(io::Error::from)?;
        let files = [
            (SCRIPT_FILE, self.script_text()),
            (self.data_file.as_str(), self.data.clone()),
        ];
        let aux = self.aux.iter().map(|(name, text)| (name.as_str(), text.clone()));
        for (name, text) in files.into_iter().chain(aux) {
            std::fs::write(dir.join(name), text).map_err(io::Error::from)?;
        }
        Ok(())
    }
}

/// Builds a complete input set: resolves `raw` against the defaults, derives
/// stage commands, patches them into the template and renders the data file.
pub fn generate(
    raw: &SettingsMap,
    data: &AtomicData,
    options: &GenerateOptions,
) -> Result<InputSet, Error> {
    let defaults = match &options.defaults {
        Some(defaults) => defaults,
        None => default_table(),
    };
    let settings = normalize(raw, defaults)?;
    let stage_commands = derive_stage_commands(&settings)?;

    let template = options
        .template
        .clone()
        .unwrap_or_else(|| io::script::default_template().clone());
    let mut payloads = AssemblyPayloads::new(data);
    if let Some(extra) = options.additional_data.as_deref() {
        payloads = payloads.with_additional_data(extra);
    }
    let assembled = apply(template, &stage_commands, &payloads, &options.assemble)?;

    let data_text = io::data::render(data, &settings.atom_style, &assembled.type_order)?;
    debug!(
        "generated deck with {} stages and {} atoms",
        assembled.document.stages().len(),
        data.structure.site_count()
    );

    Ok(InputSet {
        data_file: settings.data_file.clone(),
        settings,
        script: assembled.document,
        data: data_text,
        aux: assembled.aux,
    })
}
