//! LAMMPS atomic-data file writer.
//!
//! Periodic cells are rotated into the upper-triangular form LAMMPS requires
//! (`a` along x, `b` in the xy plane), with sites wrapped into the cell.
//! Structures without a lattice get an axis-aligned box padded around the
//! sites.

use crate::io::error::Error;
use crate::model::element::atomic_mass;
use crate::model::structure::{AtomicData, Structure};
use std::io::Write;

/// Margin (Å) added on every side of a non-periodic structure's bounding box.
pub const NONPERIODIC_PADDING: f64 = 5.0;

const TILT_TOLERANCE: f64 = 1e-10;
const DEGENERATE_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AtomStyle {
    Atomic,
    Charge,
}

impl AtomStyle {
    fn parse(style: &str) -> Result<Self, Error> {
        match style.trim() {
            "atomic" => Ok(AtomStyle::Atomic),
            "charge" => Ok(AtomStyle::Charge),
            other => Err(Error::UnsupportedAtomStyle(other.to_string())),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            AtomStyle::Atomic => "atomic",
            AtomStyle::Charge => "charge",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct SimulationBox {
    lo: [f64; 3],
    hi: [f64; 3],
    /// `xy xz yz`; `None` for an orthogonal box.
    tilt: Option<[f64; 3]>,
}

/// Writes `data` as a data file with atom types numbered by `type_order`.
pub fn write<W: Write>(
    mut writer: W,
    data: &AtomicData,
    atom_style: &str,
    type_order: &[String],
) -> Result<(), Error> {
    let style = AtomStyle::parse(atom_style)?;
    let structure = &data.structure;
    if structure.sites.is_empty() {
        return Err(Error::Conversion("structure has no sites".into()));
    }

    let masses = type_order
        .iter()
        .map(|s| atomic_mass(s).ok_or_else(|| Error::UnknownElement(s.clone())))
        .collect::<Result<Vec<_>, _>>()?;
    let types = structure
        .sites
        .iter()
        .map(|site| {
            type_order
                .iter()
                .position(|s| *s == site.species)
                .map(|i| i + 1)
                .ok_or_else(|| {
                    Error::Conversion(format!("species '{}' has no atom type", site.species))
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let (bounds, positions) = match &structure.lattice {
        Some(lattice) => periodic_box(lattice, structure)?,
        None => bounding_box(structure),
    };

    writeln!(writer, "LAMMPS data file written by lammps-deck")?;
    writeln!(writer)?;
    writeln!(writer, "{} atoms", structure.sites.len())?;
    writeln!(writer, "{} atom types", type_order.len())?;
    writeln!(writer)?;
    for (axis, name) in ["x", "y", "z"].iter().enumerate() {
        writeln!(
            writer,
            "{:.8} {:.8} {}lo {}hi",
            bounds.lo[axis], bounds.hi[axis], name, name
        )?;
    }
    if let Some([xy, xz, yz]) = bounds.tilt {
        writeln!(writer, "{:.8} {:.8} {:.8} xy xz yz", xy, xz, yz)?;
    }
    writeln!(writer)?;

    writeln!(writer, "Masses")?;
    writeln!(writer)?;
    for (i, (species, mass)) in type_order.iter().zip(&masses).enumerate() {
        writeln!(writer, "{} {} # {}", i + 1, mass, species)?;
    }
    writeln!(writer)?;

    writeln!(writer, "Atoms # {}", style.as_str())?;
    writeln!(writer)?;
    for (i, ((site, ty), pos)) in structure.sites.iter().zip(&types).zip(&positions).enumerate() {
        match style {
            AtomStyle::Atomic => writeln!(
                writer,
                "{} {} {:.8} {:.8} {:.8}",
                i + 1,
                ty,
                pos[0],
                pos[1],
                pos[2]
            )?,
            AtomStyle::Charge => writeln!(
                writer,
                "{} {} {:.6} {:.8} {:.8} {:.8}",
                i + 1,
                ty,
                site.charge,
                pos[0],
                pos[1],
                pos[2]
            )?,
        }
    }

    if let Some(sections) = data
        .embedded_force_field
        .as_deref()
        .filter(|s| !s.trim().is_empty())
    {
        writeln!(writer)?;
        writeln!(writer, "{}", sections.trim_end())?;
    }

    writer.flush()?;
    Ok(())
}

/// Renders a data file into a string.
pub fn render(data: &AtomicData, atom_style: &str, type_order: &[String]) -> Result<String, Error> {
    let mut buf = Vec::new();
    write(&mut buf, data, atom_style, type_order)?;
    String::from_utf8(buf).map_err(|e| Error::Conversion(e.to_string()))
}

fn periodic_box(
    lattice: &[[f64; 3]; 3],
    structure: &Structure,
) -> Result<(SimulationBox, Vec<[f64; 3]>), Error> {
    let [a, b, c] = lattice;
    let volume = dot(a, &cross(b, c));
    if volume.abs() < DEGENERATE_TOLERANCE {
        return Err(Error::Conversion("lattice vectors are degenerate".into()));
    }
    if volume < 0.0 {
        return Err(Error::Conversion("lattice vectors are left-handed".into()));
    }
    let cell = lammps_cell(lattice)?;

    let reciprocal = [cross(b, c), cross(c, a), cross(a, b)];
    let positions = structure
        .sites
        .iter()
        .map(|site| {
            let frac = reciprocal.map(|r| wrap(dot(&site.position, &r) / volume));
            let mut out = [0.0; 3];
            for (f, row) in frac.iter().zip(&cell) {
                for axis in 0..3 {
                    out[axis] += f * row[axis];
                }
            }
            out
        })
        .collect();

    let [xy, xz, yz] = [cell[1][0], cell[2][0], cell[2][1]];
    let tilted = [xy, xz, yz].iter().any(|t| t.abs() > TILT_TOLERANCE);
    let bounds = SimulationBox {
        lo: [0.0; 3],
        hi: [cell[0][0], cell[1][1], cell[2][2]],
        tilt: tilted.then_some([xy, xz, yz]),
    };
    Ok((bounds, positions))
}

/// Rotates lattice vectors into LAMMPS' restricted triclinic form.
fn lammps_cell(lattice: &[[f64; 3]; 3]) -> Result<[[f64; 3]; 3], Error> {
    let [a, b, c] = lattice;
    let ax = dot(a, a).sqrt();
    let a_hat = a.map(|v| v / ax);
    let bx = dot(b, &a_hat);
    let by = (dot(b, b) - bx * bx).sqrt();
    if by.is_nan() || by < DEGENERATE_TOLERANCE {
        return Err(Error::Conversion("lattice vectors a and b are parallel".into()));
    }
    let cx = dot(c, &a_hat);
    let cy = (dot(b, c) - bx * cx) / by;
    let cz = (dot(c, c) - cx * cx - cy * cy).sqrt();
    Ok([[ax, 0.0, 0.0], [bx, by, 0.0], [cx, cy, cz]])
}

fn bounding_box(structure: &Structure) -> (SimulationBox, Vec<[f64; 3]>) {
    let mut lo = [f64::INFINITY; 3];
    let mut hi = [f64::NEG_INFINITY; 3];
    for site in &structure.sites {
        for axis in 0..3 {
            lo[axis] = lo[axis].min(site.position[axis]);
            hi[axis] = hi[axis].max(site.position[axis]);
        }
    }
    let bounds = SimulationBox {
        lo: lo.map(|v| v - NONPERIODIC_PADDING),
        hi: hi.map(|v| v + NONPERIODIC_PADDING),
        tilt: None,
    };
    let positions = structure.sites.iter().map(|s| s.position).collect();
    (bounds, positions)
}

fn wrap(f: f64) -> f64 {
    let w = f - f.floor();
    if w >= 1.0 { 0.0 } else { w }
}

fn dot(u: &[f64; 3], v: &[f64; 3]) -> f64 {
    u[0] * v[0] + u[1] * v[1] + u[2] * v[2]
}

fn cross(u: &[f64; 3], v: &[f64; 3]) -> [f64; 3] {
    [
        u[1] * v[2] - u[2] * v[1],
        u[2] * v[0] - u[0] * v[2],
        u[0] * v[1] - u[1] * v[0],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::structure::Site;

    fn species(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn cubic(a: f64) -> Structure {
        Structure::periodic([[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]])
    }

    fn section<'a>(text: &'a str, header: &str) -> Vec<&'a str> {
        text.lines()
            .skip_while(|l| !l.starts_with(header))
            .skip(2)
            .take_while(|l| !l.is_empty())
            .collect()
    }

    fn coords(line: &str) -> [f64; 3] {
        let fields: Vec<f64> = line
            .split_whitespace()
            .rev()
            .take(3)
            .map(|t| t.parse().unwrap())
            .collect();
        [fields[2], fields[1], fields[0]]
    }

    fn close(a: [f64; 3], b: [f64; 3]) -> bool {
        a.iter().zip(&b).all(|(x, y)| (x - y).abs() < 1e-6)
    }

    #[test]
    fn writes_header_masses_and_atoms() {
        let data = AtomicData::new(
            cubic(5.43)
                .with_site(Site::new("Si", [0.0, 0.0, 0.0]))
                .with_site(Site::new("C", [1.3575, 1.3575, 1.3575])),
        );
        let text = render(&data, "atomic", &species(&["Si", "C"])).unwrap();

        assert!(text.contains("\n2 atoms\n2 atom types\n"));
        assert!(text.contains("0.00000000 5.43000000 xlo xhi\n"));
        assert!(text.contains("0.00000000 5.43000000 zlo zhi\n"));
        assert!(!text.contains("xy xz yz"));
        assert_eq!(section(&text, "Masses"), vec!["1 28.085 # Si", "2 12.011 # C"]);

        let atoms = section(&text, "Atoms # atomic");
        assert_eq!(atoms.len(), 2);
        assert!(atoms[0].starts_with("1 1 "));
        assert!(atoms[1].starts_with("2 2 "));
        assert!(close(coords(atoms[1]), [1.3575, 1.3575, 1.3575]));
    }

    #[test]
    fn charge_style_writes_charges() {
        let data = AtomicData::new(
            cubic(4.0)
                .with_site(Site::new("Na", [0.0, 0.0, 0.0]).with_charge(1.0))
                .with_site(Site::new("Cl", [2.0, 2.0, 2.0]).with_charge(-1.0)),
        );
        let text = render(&data, "charge", &species(&["Na", "Cl"])).unwrap();
        let atoms = section(&text, "Atoms # charge");
        assert!(atoms[0].starts_with("1 1 1.000000 "));
        assert!(atoms[1].starts_with("2 2 -1.000000 "));
    }

    #[test]
    fn sites_are_wrapped_into_the_cell() {
        let data = AtomicData::new(cubic(5.0).with_site(Site::new("Ar", [6.0, -1.0, 2.0])));
        let text = render(&data, "atomic", &species(&["Ar"])).unwrap();
        let atoms = section(&text, "Atoms");
        assert!(close(coords(atoms[0]), [1.0, 4.0, 2.0]));
    }

    #[test]
    fn rotated_cell_becomes_upper_triangular() {
        let structure = Structure::periodic([[0.0, 5.0, 0.0], [-5.0, 0.0, 0.0], [0.0, 0.0, 5.0]])
            .with_site(Site::new("Cu", [0.0, 1.0, 0.0]));
        let text = render(&AtomicData::new(structure), "atomic", &species(&["Cu"])).unwrap();
        assert!(text.contains("0.00000000 5.00000000 xlo xhi\n"));
        assert!(text.contains("0.00000000 5.00000000 ylo yhi\n"));
        assert!(!text.contains("xy xz yz"));
        let atoms = section(&text, "Atoms");
        assert!(close(coords(atoms[0]), [1.0, 0.0, 0.0]));
    }

    #[test]
    fn hexagonal_cell_writes_tilt_factors() {
        let h = 3.0 * 3f64.sqrt() / 2.0;
        let structure = Structure::periodic([[3.0, 0.0, 0.0], [-1.5, h, 0.0], [0.0, 0.0, 5.0]])
            .with_site(Site::new("C", [0.0, 0.0, 0.0]));
        let text = render(&AtomicData::new(structure), "atomic", &species(&["C"])).unwrap();
        let tilt = text.lines().find(|l| l.ends_with("xy xz yz")).unwrap();
        assert!(tilt.starts_with("-1.50000000 0.00000000 0.00000000"));
    }

    #[test]
    fn left_handed_lattice_is_rejected() {
        let structure = Structure::periodic([[1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]])
            .with_site(Site::new("H", [0.0; 3]));
        let err = render(&AtomicData::new(structure), "atomic", &species(&["H"])).unwrap_err();
        assert!(matches!(err, Error::Conversion(_)));
    }

    #[test]
    fn molecule_gets_padded_bounding_box() {
        let structure = Structure::new()
            .with_site(Site::new("O", [0.0, 0.0, 0.0]))
            .with_site(Site::new("H", [0.96, 0.0, 0.0]))
            .with_site(Site::new("H", [-0.24, 0.93, 0.0]));
        let text = render(&AtomicData::new(structure), "atomic", &species(&["O", "H"])).unwrap();
        assert!(text.contains("-5.24000000 5.96000000 xlo xhi\n"));
        assert!(text.contains("-5.00000000 5.93000000 ylo yhi\n"));
        assert!(text.contains("-5.00000000 5.00000000 zlo zhi\n"));
        let atoms = section(&text, "Atoms");
        assert!(atoms[2].starts_with("3 2 "));
    }

    #[test]
    fn embedded_force_field_is_appended() {
        let data = AtomicData::new(cubic(5.0).with_site(Site::new("Ar", [0.0; 3])))
            .with_embedded_force_field("Pair Coeffs # lj/cut\n\n1 0.0104 3.4\n\n");
        let text = render(&data, "atomic", &species(&["Ar"])).unwrap();
        assert!(text.ends_with("\n\nPair Coeffs # lj/cut\n\n1 0.0104 3.4\n"));
    }

    #[test]
    fn rejects_bad_inputs() {
        let data = AtomicData::new(cubic(5.0).with_site(Site::new("Ar", [0.0; 3])));
        assert!(matches!(
            render(&data, "full", &species(&["Ar"])),
            Err(Error::UnsupportedAtomStyle(s)) if s == "full"
        ));
        assert!(matches!(
            render(&data, "atomic", &species(&["Ar", "Xx"])),
            Err(Error::UnknownElement(s)) if s == "Xx"
        ));
        assert!(matches!(
            render(&data, "atomic", &species(&["Kr"])),
            Err(Error::Conversion(_))
        ));
        assert!(matches!(
            render(&AtomicData::new(cubic(5.0)), "atomic", &species(&["Ar"])),
            Err(Error::Conversion(_))
        ));
    }
}
