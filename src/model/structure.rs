//! Atomic structure and the atomic-data payload built from it.

/// One atom: species symbol, Cartesian position (Å) and partial charge (e).
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    pub species: String,
    pub position: [f64; 3],
    pub charge: f64,
}

impl Site {
    pub fn new(species: impl Into<String>, position: [f64; 3]) -> Self {
        Self {
            species: species.into(),
            position,
            charge: 0.0,
        }
    }

    pub fn with_charge(mut self, charge: f64) -> Self {
        self.charge = charge;
        self
    }
}

/// A set of sites, optionally inside a periodic cell.
///
/// `lattice` rows are the cell vectors **a**, **b**, **c** in Å.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Structure {
    pub lattice: Option<[[f64; 3]; 3]>,
    pub sites: Vec<Site>,
}

impl Structure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn periodic(lattice: [[f64; 3]; 3]) -> Self {
        Self {
            lattice: Some(lattice),
            sites: Vec::new(),
        }
    }

    pub fn with_site(mut self, site: Site) -> Self {
        self.sites.push(site);
        self
    }

    #[inline]
    pub fn site_count(&self) -> usize {
        self.sites.len()
    }

    /// Distinct species symbols in order of first appearance.
    pub fn species(&self) -> Vec<String> {
        let mut species: Vec<String> = Vec::new();
        for site in &self.sites {
            if !species.contains(&site.species) {
                species.push(site.species.clone());
            }
        }
        species
    }
}

/// Structure plus anything else destined for the atomic-data file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AtomicData {
    pub structure: Structure,
    /// Force-field sections (e.g. `Pair Coeffs`) written verbatim into the
    /// data file, making a separate force-field stage unnecessary.
    pub embedded_force_field: Option<String>,
}

impl AtomicData {
    pub fn new(structure: Structure) -> Self {
        Self {
            structure,
            embedded_force_field: None,
        }
    }

    pub fn with_embedded_force_field(mut self, sections: impl Into<String>) -> Self {
        self.embedded_force_field = Some(sections.into());
        self
    }

    pub fn has_embedded_force_field(&self) -> bool {
        self.embedded_force_field
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn species_follow_first_appearance() {
        let structure = Structure::new()
            .with_site(Site::new("O", [0.0, 0.0, 0.0]))
            .with_site(Site::new("H", [0.0, 0.0, 1.0]))
            .with_site(Site::new("O", [1.0, 0.0, 0.0]))
            .with_site(Site::new("H", [0.0, 1.0, 0.0]));
        assert_eq!(structure.species(), vec!["O".to_string(), "H".to_string()]);
        assert_eq!(structure.site_count(), 4);
        assert!(structure.lattice.is_none());
    }

    #[test]
    fn blank_embedded_force_field_does_not_count() {
        let data = AtomicData::new(Structure::new()).with_embedded_force_field("  \n");
        assert!(!data.has_embedded_force_field());

        let data = AtomicData::new(Structure::new())
            .with_embedded_force_field("Pair Coeffs\n\n1 0.0104 3.4\n");
        assert!(data.has_embedded_force_field());
    }

    #[test]
    fn charged_site() {
        let site = Site::new("Na", [0.0; 3]).with_charge(1.0);
        assert_eq!(site.charge, 1.0);
    }
}
