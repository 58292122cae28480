//! Interatomic potential supplied alongside the settings.

use super::element::is_element_symbol;
use super::settings::SettingValue;
use super::stage::Command;
use std::collections::BTreeMap;

/// A force field given either as ready-made commands or as a structured record.
#[derive(Debug, Clone, PartialEq)]
pub enum ForceField {
    /// Pre-formatted command block, e.g. `"pair_style tersoff\npair_coeff * * Si.tersoff Si"`.
    Literal(String),
    /// Pair style, pair coefficient string and the species mapped onto atom types.
    Structured {
        pair_style: String,
        pair_coeff: String,
        species: Vec<String>,
    },
}

impl ForceField {
    /// The command-block form of this force field.
    ///
    /// A structured record reduces to a `pair_style` line followed by a
    /// `pair_coeff` line with the species appended.
    pub fn to_literal(&self) -> String {
        match self {
            ForceField::Literal(text) => text.clone(),
            ForceField::Structured {
                pair_style,
                pair_coeff,
                species,
            } => {
                let mut coeff = pair_coeff.trim().to_string();
                if !species.is_empty() {
                    coeff.push(' ');
                    coeff.push_str(&species.join(" "));
                }
                format!("pair_style {}\npair_coeff {}", pair_style.trim(), coeff)
            }
        }
    }

    /// Commands of the literal form, one per non-blank, non-comment line.
    pub fn commands(&self) -> Vec<Command> {
        self.to_literal()
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(Command::parse)
            .collect()
    }

    /// Species mapped onto atom types by this force field.
    ///
    /// For a literal block these are the trailing element-symbol tokens of the
    /// first `pair_coeff * * ...` line; a block without such a line names no
    /// species.
    pub fn species(&self) -> Vec<String> {
        match self {
            ForceField::Structured { species, .. } => species.clone(),
            ForceField::Literal(_) => self
                .commands()
                .iter()
                .find(|c| c.name == "pair_coeff" && c.args.starts_with("* *"))
                .map(|c| trailing_species(&c.args))
                .unwrap_or_default(),
        }
    }

    pub(crate) fn to_setting(&self) -> SettingValue {
        match self {
            ForceField::Literal(text) => SettingValue::Text(text.clone()),
            ForceField::Structured {
                pair_style,
                pair_coeff,
                species,
            } => {
                let mut record = BTreeMap::new();
                record.insert("pair_style".to_string(), pair_style.as_str().into());
                record.insert("pair_coeff".to_string(), pair_coeff.as_str().into());
                record.insert(
                    "species".to_string(),
                    SettingValue::from(species.iter().map(String::as_str).collect::<Vec<_>>()),
                );
                SettingValue::Table(record)
            }
        }
    }
}

fn trailing_species(args: &str) -> Vec<String> {
    let tokens: Vec<&str> = args.split_whitespace().skip(2).collect();
    let first_species = tokens
        .iter()
        .rposition(|t| !is_element_symbol(t))
        .map_or(0, |i| i + 1);
    tokens[first_species..]
        .iter()
        .map(|t| t.to_string())
        .collect()
}
