use super::ensemble::resolve_fixes;
use super::error::Error;
use crate::model::settings::ResolvedSettings;
use crate::model::stage::{StageCommands, StageName};

/// Maximum force/energy evaluations allowed for a minimisation.
pub const MAX_EVALUATIONS: u64 = 100_000;

/// Per-atom fields written to the trajectory dump.
pub const DUMP_FIELDS: &str = "id element x y z vx vy vz fx fy fz";

/// Id of the trajectory dump, referenced by `dump_modify`.
const DUMP_ID: &str = "1";

const THERMO_STYLE: &str = "custom step temp pe ke etotal press vol";

/// Derives the stage-keyed commands for a resolved configuration.
///
/// Besides the commands to write, the result names commands left over from a
/// different run type that must be cleared (`run` for a minimisation,
/// `minimize`/`min_style` for dynamics) and drops the velocity stage for
/// minimisations.
pub fn derive_stage_commands(s: &ResolvedSettings) -> Result<StageCommands, Error> {
    let fix_set = resolve_fixes(s)?;
    let minimizing = fix_set.integrator.is_minimization();
    let mut out = StageCommands::new();
    out.species = s.species.clone();

    out.push(StageName::Initialization, "units", s.units.as_str());
    out.push(StageName::Initialization, "atom_style", s.atom_style.as_str());
    out.push(StageName::Initialization, "dimension", s.dimension.to_string());
    out.push(StageName::Initialization, "boundary", s.boundary.as_str());

    out.push(StageName::AtomDefinition, "read_data", s.data_file.as_str());

    if let Some(ff) = &s.force_field {
        out.extend(StageName::ForceField, ff.commands());
    }

    if minimizing {
        out.remove_stage(StageName::Velocities);
    } else {
        out.push(
            StageName::Velocities,
            "velocity",
            format!(
                "all create {} {} mom yes rot yes dist gaussian",
                s.temperature.start, s.seed
            ),
        );
    }

    out.push(StageName::Ensemble, "timestep", s.timestep.to_string());
    for (i, style) in fix_set.fixes.iter().enumerate() {
        out.push(StageName::Ensemble, "fix", format!("{} all {}", i + 1, style));
    }
    if minimizing {
        out.push(StageName::Ensemble, "min_style", "cg");
    } else {
        out.clear(StageName::Ensemble, "min_style");
    }

    out.push(StageName::Outputs, "thermo_style", THERMO_STYLE);
    out.push(StageName::Outputs, "thermo", s.log_interval.to_string());
    out.push(
        StageName::Outputs,
        "dump",
        format!(
            "{} all custom {} {} {}",
            DUMP_ID, s.traj_interval, s.dump_file, DUMP_FIELDS
        ),
    );
    if s.species.is_empty() {
        out.clear(StageName::Outputs, "dump_modify");
    } else {
        out.push(StageName::Outputs, "dump_modify", relabel_args(&s.species));
    }

    if minimizing {
        out.push(
            StageName::Actions,
            "minimize",
            format!("{} {} {} {}", s.tol, s.tol, s.n_steps, MAX_EVALUATIONS),
        );
        out.clear(StageName::Actions, "run");
    } else {
        out.push(StageName::Actions, "run", s.n_steps.to_string());
        out.clear(StageName::Actions, "minimize");
    }
    out.push(StageName::Actions, "write_restart", s.restart_file.as_str());

    Ok(out)
}

/// `dump_modify` arguments sorting the dump by atom id and labelling types.
pub fn relabel_args(species: &[String]) -> String {
    format!("{} sort id element {}", DUMP_ID, species.join(" "))
}
