//! Patching stage-keyed commands into a [`StageDocument`].
//!
//! Patching is idempotent: a command already present in its stage is
//! overwritten in place, and a repeatable command (such as `fix`) has every
//! existing instance replaced by the new block. Applying the same commands
//! twice therefore yields the same document as applying them once.

use super::commands::relabel_args;
use super::config::{AssembleMode, AssembleOptions};
use super::error::Error;
use crate::model::stage::{Command, Stage, StageCommands, StageDocument, StageName, is_repeatable};
use crate::model::structure::{AtomicData, Structure};
use log::{debug, warn};
use std::collections::BTreeMap;

/// Payloads read (never modified) during assembly.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyPayloads<'a> {
    pub data: &'a AtomicData,
    /// Extra script text persisted as its own file and included.
    pub additional_data: Option<&'a str>,
}

impl<'a> AssemblyPayloads<'a> {
    pub fn new(data: &'a AtomicData) -> Self {
        Self {
            data,
            additional_data: None,
        }
    }

    pub fn with_additional_data(mut self, text: &'a str) -> Self {
        self.additional_data = Some(text);
        self
    }
}

/// A patched document plus the auxiliary files it refers to.
#[derive(Debug, Clone, PartialEq)]
pub struct Assembled {
    pub document: StageDocument,
    /// Auxiliary file contents keyed by file name.
    pub aux: BTreeMap<String, String>,
    /// Species in atom-type order, as used for relabelling and the data file.
    pub type_order: Vec<String>,
}

/// Patches `commands` into `doc`.
///
/// Stages are pruned before patching: `AdditionalData` when no additional
/// data is supplied, `ForceField` when the force field is not supplied
/// explicitly, and any stage `commands` marks as removed. Commands marked as
/// cleared are deleted from their stage. When the structure carries species,
/// the `Outputs` stage gets a `dump_modify` relabelling them in atom-type
/// order.
///
/// In [`AssembleMode::Override`] the document is returned untouched once the
/// force-field check passes; a `pair_style` already in `doc` counts as a
/// force field there.
///
/// # Errors
///
/// [`Error::MissingForceField`] when neither `commands` nor the atomic data
/// carries a force field (nor, in override mode, `doc` itself), and [`Error::UnknownSpecies`] when the structure
/// holds a species the force field does not map. Both are raised before the
/// document is touched.
pub fn apply(
    mut doc: StageDocument,
    commands: &StageCommands,
    payloads: &AssemblyPayloads<'_>,
    options: &AssembleOptions,
) -> Result<Assembled, Error> {
    let explicit_ff = commands.has_commands(StageName::ForceField);
    let embedded_ff = payloads.data.has_embedded_force_field();

    if options.mode == AssembleMode::Override {
        if !explicit_ff && !embedded_ff && !doc.contains_command("pair_style") {
            return Err(Error::MissingForceField);
        }
        debug!("override mode: returning the supplied document unmodified");
        return Ok(Assembled {
            document: doc,
            aux: additional_payload(payloads, options),
            type_order: payloads.data.structure.species(),
        });
    }

    if !explicit_ff && !embedded_ff {
        return Err(Error::MissingForceField);
    }
    if explicit_ff && embedded_ff {
        warn!("explicit force field takes precedence over the one embedded in the atomic data");
    }
    let type_order = atom_type_order(&payloads.data.structure, &commands.species)?;

    if payloads.additional_data.is_none() {
        prune(&mut doc, StageName::AdditionalData, "no additional data");
    }
    if !explicit_ff {
        prune(&mut doc, StageName::ForceField, "force field embedded in atomic data");
    }
    for &stage in &commands.removed {
        prune(&mut doc, stage, "not used by this run");
    }

    for (&stage, names) in &commands.cleared {
        if let Some(target) = doc.stage_mut(stage) {
            for name in names {
                if target.remove_all(name).is_some() {
                    debug!("cleared stale '{}' from {}", name, stage);
                }
            }
        }
    }

    for (&stage, stage_commands) in &commands.commands {
        if stage_commands.is_empty() || commands.removed.contains(&stage) {
            continue;
        }
        patch_stage(doc.ensure_stage(stage), stage_commands);
    }

    if payloads.additional_data.is_some() {
        patch_stage(
            doc.ensure_stage(StageName::AdditionalData),
            &[Command::new("include", options.additional_data_file.as_str())],
        );
    }

    if !type_order.is_empty() {
        patch_stage(
            doc.ensure_stage(StageName::Outputs),
            &[Command::new("dump_modify", relabel_args(&type_order))],
        );
    }

    Ok(Assembled {
        document: doc,
        aux: additional_payload(payloads, options),
        type_order,
    })
}

/// Species in atom-type order.
///
/// The force field's species order wins when known, and every structure
/// species must appear in it; otherwise species are numbered in order of
/// first appearance in the structure.
pub fn atom_type_order(structure: &Structure, known: &[String]) -> Result<Vec<String>, Error> {
    let present = structure.species();
    if known.is_empty() {
        return Ok(present);
    }
    if let Some(species) = present.into_iter().find(|s| !known.contains(s)) {
        return Err(Error::UnknownSpecies { species });
    }
    Ok(known.to_vec())
}

fn additional_payload(
    payloads: &AssemblyPayloads<'_>,
    options: &AssembleOptions,
) -> BTreeMap<String, String> {
    payloads
        .additional_data
        .map(|text| (options.additional_data_file.clone(), text.to_string()))
        .into_iter()
        .collect()
}

fn prune(doc: &mut StageDocument, stage: StageName, reason: &str) {
    if doc.remove_stage(stage).is_some() {
        debug!("removed {} stage: {}", stage, reason);
    }
}

/// Writes `commands` into `stage`.
///
/// A command already in the stage is updated where it stands. A missing one
/// is inserted before the first existing command that follows it in
/// `commands`, so relative order matches the derived order.
fn patch_stage(stage: &mut Stage, commands: &[Command]) {
    let mut done: Vec<&str> = Vec::new();
    for (i, command) in commands.iter().enumerate() {
        let name = command.name.as_str();
        if done.contains(&name) {
            continue;
        }
        done.push(name);

        let block: Vec<&str> = if is_repeatable(name) {
            commands
                .iter()
                .filter(|c| c.name == name)
                .map(|c| c.args.as_str())
                .collect()
        } else {
            let last = commands
                .iter()
                .rev()
                .find(|c| c.name == name)
                .map_or("", |c| c.args.as_str());
            vec![last]
        };

        if stage.contains(name) {
            if is_repeatable(name) {
                stage.replace_all(name, block);
            } else {
                stage.set(name, block[0]);
            }
            continue;
        }

        let later = &commands[i + 1..];
        let at = stage
            .commands
            .iter()
            .position(|c| c.name != name && later.iter().any(|l| l.name == c.name))
            .unwrap_or(stage.commands.len());
        let new_commands: Vec<Command> = block.into_iter().map(|a| Command::new(name, a)).collect();
        stage.commands.splice(at..at, new_commands);
    }
}
