//! Molecular graph representation.

use crate::element;

/// Tetrahedral chirality tag as written in SMILES.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Chirality {
    #[default]
    None,
    /// `@`
    CounterClockwise,
    /// `@@`
    Clockwise,
}

/// Directional single-bond marker used for cis/trans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BondStereo {
    #[default]
    None,
    /// `/`
    Up,
    /// `\`
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Quadruple,
    Aromatic,
}

impl BondOrder {
    /// Contribution to the explicit valence of each endpoint. Aromatic bonds
    /// count as one; the extra aromatic electron is handled per atom.
    pub fn valence(self) -> u8 {
        match self {
            BondOrder::Single | BondOrder::Aromatic => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Quadruple => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Atomic number, 0 for the `*` wildcard.
    pub element: u8,
    pub aromatic: bool,
    pub charge: i8,
    pub isotope: Option<u16>,
    /// Implicit (organic subset) or explicit (bracket) hydrogen count.
    pub hydrogens: u8,
    /// Written as a bracket atom; such atoms never gain implicit hydrogens.
    pub bracket: bool,
    pub chirality: Chirality,
    pub class: Option<u16>,
}

impl Atom {
    pub fn organic(element: u8, aromatic: bool) -> Self {
        Self {
            element,
            aromatic,
            charge: 0,
            isotope: None,
            hydrogens: 0,
            bracket: false,
            chirality: Chirality::None,
            class: None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        element::symbol(self.element)
    }

    pub fn is_heteroatom(&self) -> bool {
        !matches!(self.element, element::CARBON | element::HYDROGEN)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bond {
    pub begin: usize,
    pub end: usize,
    pub order: BondOrder,
    pub stereo: BondStereo,
}

impl Bond {
    /// The endpoint opposite to `atom`.
    pub fn other(&self, atom: usize) -> usize {
        if self.begin == atom { self.end } else { self.begin }
    }
}

/// A molecular graph with atoms, bonds, and adjacency information.
#[derive(Debug, Clone, Default)]
pub struct Molecule {
    pub atoms: Vec<Atom>,
    pub bonds: Vec<Bond>,
    /// adjacency[atom] = [(neighbor, bond index)] in insertion order
    adjacency: Vec<Vec<(usize, usize)>>,
}

impl Molecule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_atom(&mut self, atom: Atom) -> usize {
        self.atoms.push(atom);
        self.adjacency.push(Vec::new());
        self.atoms.len() - 1
    }

    /// Add a bond; returns `None` if the atoms are already bonded or identical.
    pub fn add_bond(&mut self, begin: usize, end: usize, order: BondOrder, stereo: BondStereo) -> Option<usize> {
        if begin == end || self.bond_between(begin, end).is_some() {
            return None;
        }
        let idx = self.bonds.len();
        self.bonds.push(Bond { begin, end, order, stereo });
        self.adjacency[begin].push((end, idx));
        self.adjacency[end].push((begin, idx));
        Some(idx)
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn heavy_atom_count(&self) -> usize {
        self.atoms.iter().filter(|a| a.element != element::HYDROGEN).count()
    }

    /// (neighbor, bond index) pairs for an atom.
    pub fn edges(&self, atom: usize) -> &[(usize, usize)] {
        &self.adjacency[atom]
    }

    pub fn neighbors(&self, atom: usize) -> impl Iterator<Item = usize> + '_ {
        self.adjacency[atom].iter().map(|&(n, _)| n)
    }

    pub fn degree(&self, atom: usize) -> usize {
        self.adjacency[atom].len()
    }

    pub fn bond_between(&self, a: usize, b: usize) -> Option<usize> {
        self.adjacency
            .get(a)?
            .iter()
            .find(|&&(n, _)| n == b)
            .map(|&(_, bi)| bi)
    }

    /// Sum of bond valences around an atom, excluding hydrogens.
    pub fn explicit_valence(&self, atom: usize) -> u32 {
        self.adjacency[atom]
            .iter()
            .map(|&(_, bi)| u32::from(self.bonds[bi].order.valence()))
            .sum()
    }

    /// Hydrogens attached to an atom, as count or as explicit `[H]` neighbours.
    pub fn total_hydrogens(&self, atom: usize) -> usize {
        let explicit = self
            .neighbors(atom)
            .filter(|&n| self.atoms[n].element == element::HYDROGEN)
            .count();
        self.atoms[atom].hydrogens as usize + explicit
    }

    /// Connected components as sorted atom index lists, ordered by their lowest atom.
    pub fn components(&self) -> Vec<Vec<usize>> {
        let mut seen = vec![false; self.atoms.len()];
        let mut components = Vec::new();
        for start in 0..self.atoms.len() {
            if seen[start] {
                continue;
            }
            let mut stack = vec![start];
            let mut members = Vec::new();
            seen[start] = true;
            while let Some(u) = stack.pop() {
                members.push(u);
                for v in self.neighbors(u) {
                    if !seen[v] {
                        seen[v] = true;
                        stack.push(v);
                    }
                }
            }
            members.sort_unstable();
            components.push(members);
        }
        components
    }
}
