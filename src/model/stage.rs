//! Stage-ordered model of an input script.
//!
//! A [`StageDocument`] is an ordered list of named [`Stage`]s, each holding
//! an ordered list of [`Command`]s. [`StageCommands`] is the stage-keyed
//! dictionary of commands to patch into such a document.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Named section of an input script, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StageName {
    Initialization,
    AtomDefinition,
    ForceField,
    AdditionalData,
    Velocities,
    Ensemble,
    Outputs,
    Actions,
}

impl StageName {
    pub const ALL: [StageName; 8] = [
        StageName::Initialization,
        StageName::AtomDefinition,
        StageName::ForceField,
        StageName::AdditionalData,
        StageName::Velocities,
        StageName::Ensemble,
        StageName::Outputs,
        StageName::Actions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageName::Initialization => "Initialization",
            StageName::AtomDefinition => "AtomDefinition",
            StageName::ForceField => "ForceField",
            StageName::AdditionalData => "AdditionalData",
            StageName::Velocities => "Velocities",
            StageName::Ensemble => "Ensemble",
            StageName::Outputs => "Outputs",
            StageName::Actions => "Actions",
        }
    }

    /// The stage a command belongs to when no stage is given explicitly.
    pub fn for_command(command: &str) -> Option<StageName> {
        COMMAND_STAGES
            .iter()
            .find(|(name, _)| *name == command)
            .map(|&(_, stage)| stage)
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown stage name: '{0}'")]
pub struct ParseStageNameError(String);

impl FromStr for StageName {
    type Err = ParseStageNameError;

    /// Accepts the canonical name in any case, with or without separators
    /// (`"Atom Definition"`, `"atom_definition"`, `"AtomDefinition"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_ascii_lowercase();
        StageName::ALL
            .into_iter()
            .find(|stage| stage.as_str().to_ascii_lowercase() == key)
            .ok_or_else(|| ParseStageNameError(s.to_string()))
    }
}

/// Static command-to-stage table.
const COMMAND_STAGES: &[(&str, StageName)] = &[
    ("units", StageName::Initialization),
    ("atom_style", StageName::Initialization),
    ("dimension", StageName::Initialization),
    ("boundary", StageName::Initialization),
    ("newton", StageName::Initialization),
    ("processors", StageName::Initialization),
    ("read_data", StageName::AtomDefinition),
    ("read_restart", StageName::AtomDefinition),
    ("create_box", StageName::AtomDefinition),
    ("create_atoms", StageName::AtomDefinition),
    ("mass", StageName::AtomDefinition),
    ("pair_style", StageName::ForceField),
    ("pair_coeff", StageName::ForceField),
    ("pair_modify", StageName::ForceField),
    ("bond_style", StageName::ForceField),
    ("angle_style", StageName::ForceField),
    ("kspace_style", StageName::ForceField),
    ("neighbor", StageName::ForceField),
    ("neigh_modify", StageName::ForceField),
    ("include", StageName::AdditionalData),
    ("velocity", StageName::Velocities),
    ("timestep", StageName::Ensemble),
    ("fix", StageName::Ensemble),
    ("unfix", StageName::Ensemble),
    ("min_style", StageName::Ensemble),
    ("min_modify", StageName::Ensemble),
    ("thermo", StageName::Outputs),
    ("thermo_style", StageName::Outputs),
    ("thermo_modify", StageName::Outputs),
    ("dump", StageName::Outputs),
    ("dump_modify", StageName::Outputs),
    ("compute", StageName::Outputs),
    ("run", StageName::Actions),
    ("minimize", StageName::Actions),
    ("write_restart", StageName::Actions),
    ("write_data", StageName::Actions),
];

/// Commands that may legitimately appear several times within one stage.
const REPEATABLE_COMMANDS: &[&str] = &[
    "fix", "unfix", "pair_coeff", "include", "compute", "variable", "group", "region",
];

/// Returns `true` if `command` may repeat within a stage.
pub fn is_repeatable(command: &str) -> bool {
    REPEATABLE_COMMANDS.contains(&command)
}

/// A single script line: command name and its argument string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Command {
    pub name: String,
    pub args: String,
}

impl Command {
    pub fn new(name: impl Into<String>, args: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: args.into(),
        }
    }

    /// Splits a script line at the first run of whitespace.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        match line.split_once(char::is_whitespace) {
            Some((name, args)) => Self::new(name, args.trim()),
            None => Self::new(line, ""),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{} {}", self.name, self.args)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub name: StageName,
    pub commands: Vec<Command>,
}

impl Stage {
    pub fn new(name: StageName) -> Self {
        Self {
            name,
            commands: Vec::new(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn contains(&self, command: &str) -> bool {
        self.commands.iter().any(|c| c.name == command)
    }

    /// Argument strings of every instance of `command`, in order.
    pub fn args_of(&self, command: &str) -> Vec<&str> {
        self.commands
            .iter()
            .filter(|c| c.name == command)
            .map(|c| c.args.as_str())
            .collect()
    }

    /// Overwrites the arguments of `command` in place, or appends it.
    ///
    /// Any further instances of the same command are dropped so exactly one
    /// remains.
    pub fn set(&mut self, command: &str, args: &str) {
        match self.commands.iter().position(|c| c.name == command) {
            Some(first) => {
                self.commands[first].args = args.to_string();
                let mut index = 0;
                self.commands.retain(|c| {
                    let keep = index <= first || c.name != command;
                    index += 1;
                    keep
                });
            }
            None => self.commands.push(Command::new(command, args)),
        }
    }

    /// Removes every instance of `command`, returning the index of the first.
    pub fn remove_all(&mut self, command: &str) -> Option<usize> {
        let first = self.commands.iter().position(|c| c.name == command)?;
        self.commands.retain(|c| c.name != command);
        Some(first)
    }

    /// Replaces every instance of `command` with one instance per argument
    /// string, in the given order.
    ///
    /// The new block takes the position of the first removed instance, or is
    /// appended when the stage did not contain the command.
    pub fn replace_all<'a>(&mut self, command: &str, args: impl IntoIterator<Item = &'a str>) {
        let at = self.remove_all(command).unwrap_or(self.commands.len());
        let block: Vec<Command> = args
            .into_iter()
            .map(|a| Command::new(command, a))
            .collect();
        self.commands.splice(at..at, block);
    }
}

/// Ordered sequence of stages making up an input script.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StageDocument {
    stages: Vec<Stage>,
}

impl StageDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage_names(&self) -> Vec<StageName> {
        self.stages.iter().map(|s| s.name).collect()
    }

    pub fn stage(&self, name: StageName) -> Option<&Stage> {
        self.stages.iter().find(|s| s.name == name)
    }

    pub fn stage_mut(&mut self, name: StageName) -> Option<&mut Stage> {
        self.stages.iter_mut().find(|s| s.name == name)
    }

    #[inline]
    pub fn has_stage(&self, name: StageName) -> bool {
        self.stage(name).is_some()
    }

    /// Deletes a stage, leaving the order of the others untouched.
    pub fn remove_stage(&mut self, name: StageName) -> Option<Stage> {
        let index = self.stages.iter().position(|s| s.name == name)?;
        Some(self.stages.remove(index))
    }

    /// Returns the named stage, inserting an empty one at its canonical
    /// position if the document lacks it.
    pub fn ensure_stage(&mut self, name: StageName) -> &mut Stage {
        let index = match self.stages.iter().position(|s| s.name == name) {
            Some(index) => index,
            None => {
                let at = self
                    .stages
                    .iter()
                    .position(|s| s.name > name)
                    .unwrap_or(self.stages.len());
                self.stages.insert(at, Stage::new(name));
                at
            }
        };
        &mut self.stages[index]
    }

    /// Returns the named stage, appending an empty one at the end of the
    /// document if it is missing. Readers use this to keep file order.
    pub fn append_stage(&mut self, name: StageName) -> &mut Stage {
        let index = match self.stages.iter().position(|s| s.name == name) {
            Some(index) => index,
            None => {
                self.stages.push(Stage::new(name));
                self.stages.len() - 1
            }
        };
        &mut self.stages[index]
    }

    /// Appends a command to a stage, creating the stage if needed.
    pub fn push(&mut self, stage: StageName, command: Command) {
        self.ensure_stage(stage).commands.push(command);
    }

    /// `true` if any stage contains `command`.
    pub fn contains_command(&self, command: &str) -> bool {
        self.stages.iter().any(|s| s.contains(command))
    }

    /// Argument strings of every instance of `command` across all stages.
    pub fn args_of(&self, command: &str) -> Vec<&str> {
        self.stages
            .iter()
            .flat_map(|s| s.args_of(command))
            .collect()
    }
}

impl fmt::Display for StageDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stage) in self.stages.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "# {}", stage.name)?;
            for command in &stage.commands {
                writeln!(f, "{}", command)?;
            }
        }
        Ok(())
    }
}

/// Stage-keyed commands to patch into a [`StageDocument`].
///
/// Besides the commands to write, it records commands to clear from a stage
/// (leftovers of a different run type) and whole stages to remove.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StageCommands {
    pub commands: BTreeMap<StageName, Vec<Command>>,
    pub cleared: BTreeMap<StageName, Vec<String>>,
    pub removed: BTreeSet<StageName>,
    /// Force-field species in atom-type order, when known.
    pub species: Vec<String>,
}

impl StageCommands {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, stage: StageName, name: &str, args: impl Into<String>) {
        self.commands
            .entry(stage)
            .or_default()
            .push(Command::new(name, args));
    }

    pub fn extend(&mut self, stage: StageName, commands: impl IntoIterator<Item = Command>) {
        self.commands.entry(stage).or_default().extend(commands);
    }

    /// Marks `name` for removal from `stage` before patching.
    pub fn clear(&mut self, stage: StageName, name: &str) {
        self.cleared
            .entry(stage)
            .or_default()
            .push(name.to_string());
    }

    pub fn remove_stage(&mut self, stage: StageName) {
        self.removed.insert(stage);
    }

    /// Commands destined for `stage`; empty if none.
    pub fn get(&self, stage: StageName) -> &[Command] {
        self.commands.get(&stage).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_commands(&self, stage: StageName) -> bool {
        !self.get(stage).is_empty()
    }

    /// Argument strings of every `name` command destined for `stage`.
    pub fn args_of(&self, stage: StageName, name: &str) -> Vec<&str> {
        self.get(stage)
            .iter()
            .filter(|c| c.name == name)
            .map(|c| c.args.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage_with(name: StageName, lines: &[&str]) -> Stage {
        Stage {
            name,
            commands: lines.iter().map(|l| Command::parse(l)).collect(),
        }
    }

    #[test]
    fn stage_names_parse_loosely() {
        assert_eq!(
            "Atom Definition".parse::<StageName>().unwrap(),
            StageName::AtomDefinition
        );
        assert_eq!(
            "force_field".parse::<StageName>().unwrap(),
            StageName::ForceField
        );
        assert_eq!("OUTPUTS".parse::<StageName>().unwrap(), StageName::Outputs);
        assert!("Setup".parse::<StageName>().is_err());
    }

    #[test]
    fn command_table_places_known_commands() {
        assert_eq!(StageName::for_command("units"), Some(StageName::Initialization));
        assert_eq!(StageName::for_command("fix"), Some(StageName::Ensemble));
        assert_eq!(StageName::for_command("minimize"), Some(StageName::Actions));
        assert_eq!(StageName::for_command("print"), None);
    }

    #[test]
    fn command_parse_and_display() {
        let c = Command::parse("  fix 1 all   nve ");
        assert_eq!(c.name, "fix");
        assert_eq!(c.args, "1 all   nve");
        assert_eq!(Command::parse("run").to_string(), "run");
    }

    #[test]
    fn set_overwrites_in_place_and_collapses_duplicates() {
        let mut stage = stage_with(
            StageName::Ensemble,
            &["timestep 0.002", "fix 1 all nve", "timestep 0.003"],
        );
        stage.set("timestep", "0.001");
        assert_eq!(stage.commands.len(), 2);
        assert_eq!(stage.commands[0], Command::new("timestep", "0.001"));
        assert_eq!(stage.commands[1].name, "fix");

        stage.set("min_style", "cg");
        assert_eq!(stage.commands.last().unwrap().name, "min_style");
    }

    #[test]
    fn replace_all_keeps_block_position() {
        let mut stage = stage_with(
            StageName::Ensemble,
            &[
                "timestep 0.001",
                "fix 1 all nve",
                "fix 2 all langevin 300 300 0.1 1",
                "min_style cg",
            ],
        );
        stage.replace_all("fix", ["1 all nvt temp 300 300 0.1"]);
        let names: Vec<_> = stage.commands.iter().map(|c| c.to_string()).collect();
        assert_eq!(
            names,
            vec!["timestep 0.001", "fix 1 all nvt temp 300 300 0.1", "min_style cg"]
        );
    }

    #[test]
    fn replace_all_appends_when_absent() {
        let mut stage = stage_with(StageName::Ensemble, &["timestep 0.001"]);
        stage.replace_all("fix", ["1 all nve", "2 all langevin 1 1 0.1 7"]);
        assert_eq!(stage.args_of("fix"), vec!["1 all nve", "2 all langevin 1 1 0.1 7"]);
    }

    #[test]
    fn ensure_stage_inserts_in_canonical_order() {
        let mut doc = StageDocument::new();
        doc.ensure_stage(StageName::Actions);
        doc.ensure_stage(StageName::Initialization);
        doc.ensure_stage(StageName::Ensemble);
        doc.ensure_stage(StageName::Ensemble);
        assert_eq!(
            doc.stage_names(),
            vec![StageName::Initialization, StageName::Ensemble, StageName::Actions]
        );
    }

    #[test]
    fn remove_stage_preserves_remaining_order() {
        let mut doc = StageDocument::new();
        for stage in StageName::ALL {
            doc.ensure_stage(stage);
        }
        assert!(doc.remove_stage(StageName::Velocities).is_some());
        assert!(doc.remove_stage(StageName::Velocities).is_none());
        let mut expected = StageName::ALL.to_vec();
        expected.retain(|s| *s != StageName::Velocities);
        assert_eq!(doc.stage_names(), expected);
    }

    #[test]
    fn display_renders_headers_and_commands() {
        let mut doc = StageDocument::new();
        doc.push(StageName::Initialization, Command::new("units", "metal"));
        doc.push(StageName::Actions, Command::new("run", "100"));
        assert_eq!(doc.to_string(), "# Initialization\nunits metal\n\n# Actions\nrun 100\n");
    }

    #[test]
    fn stage_commands_accumulate() {
        let mut commands = StageCommands::new();
        commands.push(StageName::Ensemble, "fix", "1 all nve");
        commands.push(StageName::Ensemble, "fix", "2 all langevin 1 1 0.1 7");
        commands.clear(StageName::Actions, "run");
        commands.remove_stage(StageName::Velocities);

        assert_eq!(commands.args_of(StageName::Ensemble, "fix").len(), 2);
        assert!(!commands.has_commands(StageName::Outputs));
        assert_eq!(commands.cleared[&StageName::Actions], vec!["run".to_string()]);
        assert!(commands.removed.contains(&StageName::Velocities));
    }

    #[test]
    fn repeatable_commands() {
        assert!(is_repeatable("fix"));
        assert!(is_repeatable("pair_coeff"));
        assert!(!is_repeatable("timestep"));
        assert!(!is_repeatable("dump_modify"));
    }
}
