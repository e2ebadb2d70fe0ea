//! Topological descriptors and drug-likeness for a parsed molecule.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::element;
use crate::molecule::{BondOrder, Molecule};
use crate::rings::RingInfo;

/// Descriptors computed from the molecular graph alone.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptors {
    pub formula: String,
    pub molecular_weight: f64,
    pub heavy_atoms: usize,
    pub rings: usize,
    pub aromatic_rings: usize,
    pub hbd: usize,
    pub hba: usize,
    pub rotatable_bonds: usize,
}

/// Rule-of-five style check. logP is not estimated, so only MW, HBD and
/// HBA take part.
#[derive(Debug, Clone, PartialEq)]
pub struct LipinskiCheck {
    pub mw_ok: bool,
    pub hbd_ok: bool,
    pub hba_ok: bool,
    pub violations: u32,
}

impl LipinskiCheck {
    /// At most one violation is tolerated.
    pub fn passes(&self) -> bool {
        self.violations <= 1
    }
}

impl Descriptors {
    pub fn compute(mol: &Molecule) -> Self {
        let rings = RingInfo::perceive(mol);
        let aromatic_rings = rings
            .rings
            .iter()
            .filter(|ring| ring.iter().all(|&a| mol.atoms[a].aromatic))
            .count();

        Self {
            formula: molecular_formula(mol),
            molecular_weight: molecular_weight(mol),
            heavy_atoms: mol.heavy_atom_count(),
            rings: rings.ring_count(),
            aromatic_rings,
            hbd: h_bond_donors(mol),
            hba: h_bond_acceptors(mol),
            rotatable_bonds: rotatable_bonds(mol, &rings),
        }
    }

    pub fn lipinski(&self) -> LipinskiCheck {
        let mw_ok = self.molecular_weight <= 500.0;
        let hbd_ok = self.hbd <= 5;
        let hba_ok = self.hba <= 10;
        let violations = [mw_ok, hbd_ok, hba_ok].iter().filter(|ok| !**ok).count() as u32;
        LipinskiCheck { mw_ok, hbd_ok, hba_ok, violations }
    }
}

/// Hill-order formula: C, H, then alphabetical; alphabetical throughout
/// when there is no carbon.
pub fn molecular_formula(mol: &Molecule) -> String {
    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    let mut hydrogens = 0usize;
    for atom in &mol.atoms {
        if atom.element == element::HYDROGEN {
            hydrogens += 1;
        } else if atom.element != 0 {
            *counts.entry(atom.symbol()).or_default() += 1;
        }
        hydrogens += atom.hydrogens as usize;
    }
    if hydrogens > 0 {
        counts.insert("H", hydrogens);
    }

    let mut formula = String::new();
    let mut push = |symbol: &str, n: usize| {
        formula.push_str(symbol);
        if n > 1 {
            let _ = write!(formula, "{}", n);
        }
    };
    if let Some(c) = counts.remove("C") {
        push("C", c);
        if let Some(h) = counts.remove("H") {
            push("H", h);
        }
    }
    for (symbol, n) in counts {
        push(symbol, n);
    }
    formula
}

/// Average molecular weight in g/mol, implicit hydrogens included.
pub fn molecular_weight(mol: &Molecule) -> f64 {
    let h = element::average_mass(element::HYDROGEN);
    mol.atoms
        .iter()
        .map(|a| element::average_mass(a.element) + a.hydrogens as f64 * h)
        .sum()
}

/// N and O atoms carrying at least one hydrogen.
pub fn h_bond_donors(mol: &Molecule) -> usize {
    (0..mol.atom_count())
        .filter(|&i| is_n_or_o(mol.atoms[i].element) && mol.total_hydrogens(i) > 0)
        .count()
}

/// All N and O atoms (Lipinski's original definition).
pub fn h_bond_acceptors(mol: &Molecule) -> usize {
    mol.atoms.iter().filter(|a| is_n_or_o(a.element)).count()
}

/// Non-ring single bonds between two non-terminal heavy atoms.
pub fn rotatable_bonds(mol: &Molecule, rings: &RingInfo) -> usize {
    let heavy_degree = |atom: usize| {
        mol.neighbors(atom)
            .filter(|&n| mol.atoms[n].element != element::HYDROGEN)
            .count()
    };
    mol.bonds
        .iter()
        .enumerate()
        .filter(|(bi, bond)| {
            bond.order == BondOrder::Single
                && !rings.ring_bond[*bi]
                && mol.atoms[bond.begin].element != element::HYDROGEN
                && mol.atoms[bond.end].element != element::HYDROGEN
                && heavy_degree(bond.begin) > 1
                && heavy_degree(bond.end) > 1
                && !touches_triple(mol, bond.begin)
                && !touches_triple(mol, bond.end)
        })
        .count()
}

fn touches_triple(mol: &Molecule, atom: usize) -> bool {
    mol.edges(atom)
        .iter()
        .any(|&(_, bi)| mol.bonds[bi].order == BondOrder::Triple)
}

fn is_n_or_o(z: u8) -> bool {
    z == element::NITROGEN || z == element::OXYGEN
}

/// Markdown analysis report for a structure.
pub fn analysis_report(smiles: &str, descriptors: &Descriptors) -> String {
    let lipinski = descriptors.lipinski();
    let mark = |ok: bool| if ok { "yes" } else { "no" };
    let mut out = String::new();
    let _ = writeln!(out, "**Molecular Analysis Report**");
    let _ = writeln!(out);
    let _ = writeln!(out, "**Structure:** `{}`", smiles);
    let _ = writeln!(out);
    let _ = writeln!(out, "**Structure Analysis:**");
    let _ = writeln!(out, "- Molecular Formula: {}", descriptors.formula);
    let _ = writeln!(out, "- Molecular Weight: {:.2} g/mol", descriptors.molecular_weight);
    let _ = writeln!(out, "- Heavy Atoms: {}", descriptors.heavy_atoms);
    let _ = writeln!(out, "- Rings: {} ({} aromatic)", descriptors.rings, descriptors.aromatic_rings);
    let _ = writeln!(out, "- Hydrogen Bond Donors: {}", descriptors.hbd);
    let _ = writeln!(out, "- Hydrogen Bond Acceptors: {}", descriptors.hba);
    let _ = writeln!(out, "- Rotatable Bonds: {}", descriptors.rotatable_bonds);
    let _ = writeln!(out);
    let _ = writeln!(out, "**Drug-likeness Assessment:**");
    let _ = writeln!(out, "- Molecular Weight <= 500: {}", mark(lipinski.mw_ok));
    let _ = writeln!(out, "- H-Bond Donors <= 5: {}", mark(lipinski.hbd_ok));
    let _ = writeln!(out, "- H-Bond Acceptors <= 10: {}", mark(lipinski.hba_ok));
    let _ = writeln!(
        out,
        "- Lipinski's Rule of Five: {} ({} violation{}, logP not estimated)",
        if lipinski.passes() { "PASSED" } else { "FAILED" },
        lipinski.violations,
        if lipinski.violations == 1 { "" } else { "s" }
    );
    out.trim_end().to_string()
}

/// Report returned when the structure cannot be parsed.
pub fn unparseable_report(smiles: &str, reason: &str) -> String {
    format!(
        "**Molecular Analysis Report**\n\n**Structure:** `{}`\n\n**Error:** the structure could not be parsed: {}",
        smiles, reason
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::parse_smiles;

    fn descriptors(smiles: &str) -> Descriptors {
        Descriptors::compute(&parse_smiles(smiles).unwrap())
    }

    #[test]
    fn test_ethanol() {
        let d = descriptors("CCO");
        assert_eq!(d.formula, "C2H6O");
        assert!((d.molecular_weight - 46.07).abs() < 0.01);
        assert_eq!(d.heavy_atoms, 3);
        assert_eq!(d.hbd, 1);
        assert_eq!(d.hba, 1);
        assert_eq!(d.rotatable_bonds, 0);
        assert_eq!(d.rings, 0);
    }

    #[test]
    fn test_aspirin() {
        let d = descriptors("CC(=O)Oc1ccccc1C(=O)O");
        assert_eq!(d.formula, "C9H8O4");
        assert!((d.molecular_weight - 180.16).abs() < 0.01);
        assert_eq!(d.rings, 1);
        assert_eq!(d.aromatic_rings, 1);
        assert_eq!(d.hbd, 1);
        assert_eq!(d.hba, 4);
        assert!(d.lipinski().passes());
        assert_eq!(d.lipinski().violations, 0);
    }

    #[test]
    fn test_formula_without_carbon_is_alphabetical() {
        assert_eq!(descriptors("O").formula, "H2O");
        assert_eq!(descriptors("N").formula, "H3N");
        assert_eq!(descriptors("[Na+].[Cl-]").formula, "ClNa");
    }

    #[test]
    fn test_rotatable_bonds_skip_rings_and_terminals() {
        // butane: only the central bond rotates
        assert_eq!(descriptors("CCCC").rotatable_bonds, 1);
        assert_eq!(descriptors("C1CCCCC1").rotatable_bonds, 0);
        // biphenyl link
        assert_eq!(descriptors("c1ccccc1-c2ccccc2").rotatable_bonds, 1);
    }

    #[test]
    fn test_lipinski_counts_violations() {
        let d = Descriptors {
            formula: String::new(),
            molecular_weight: 612.0,
            heavy_atoms: 40,
            rings: 3,
            aromatic_rings: 2,
            hbd: 6,
            hba: 8,
            rotatable_bonds: 9,
        };
        let check = d.lipinski();
        assert!(!check.mw_ok && !check.hbd_ok && check.hba_ok);
        assert_eq!(check.violations, 2);
        assert!(!check.passes());
    }

    #[test]
    fn test_report_mentions_descriptors() {
        let report = analysis_report("CCO", &descriptors("CCO"));
        assert!(report.contains("C2H6O"));
        assert!(report.contains("46.07 g/mol"));
        assert!(report.contains("PASSED"));
        let failed = unparseable_report("C1CC", "ring closure 1 is never closed");
        assert!(failed.contains("could not be parsed"));
        assert!(failed.contains("C1CC"));
    }
}
