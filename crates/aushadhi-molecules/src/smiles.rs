//! SMILES parser (OpenSMILES subset).
//!
//! Supports the organic subset, bracket atoms with isotope / chirality /
//! hydrogen count / charge / class, all bond symbols, branches, ring closures
//! (`0-9`, `%nn`) and `.` disconnections. Implicit hydrogens are assigned
//! from default valences; over-valent atoms and aromatic atoms outside rings
//! are rejected.

use std::collections::BTreeMap;
use thiserror::Error;

use crate::element;
use crate::molecule::{Atom, BondOrder, BondStereo, Chirality, Molecule};
use crate::rings::RingInfo;

/// Largest structure accepted for parsing.
pub const MAX_ATOMS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SmilesError {
    #[error("empty SMILES string")]
    Empty,

    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { pos: usize, ch: char },

    #[error("unknown element '{symbol}' at position {pos}")]
    UnknownElement { pos: usize, symbol: String },

    #[error("invalid bracket atom at position {pos}: {reason}")]
    BracketAtom { pos: usize, reason: &'static str },

    #[error("unbalanced parenthesis at position {pos}")]
    UnbalancedParenthesis { pos: usize },

    #[error("bond at position {pos} is not followed by an atom")]
    DanglingBond { pos: usize },

    #[error("ring closure {label} is never closed")]
    UnclosedRing { label: u16 },

    #[error("invalid ring closure {label} at position {pos}: {reason}")]
    RingClosure { pos: usize, label: u16, reason: &'static str },

    #[error("atom {atom} ({symbol}) exceeds its allowed valence with {valence} bonds")]
    Valence { atom: usize, symbol: &'static str, valence: u32 },

    #[error("atom {atom} ({symbol}) is marked aromatic but is not in a ring")]
    AromaticOutsideRing { atom: usize, symbol: &'static str },

    #[error("structure exceeds {limit} atoms")]
    TooLarge { limit: usize },
}

pub type Result<T> = std::result::Result<T, SmilesError>;

/// Parse a SMILES string into a molecular graph.
pub fn parse_smiles(smiles: &str) -> Result<Molecule> {
    let input = smiles.trim();
    if input.is_empty() {
        return Err(SmilesError::Empty);
    }
    let mut mol = Parser::new(input).run()?;
    assign_hydrogens(&mut mol)?;
    check_aromatic_rings(&mol)?;
    Ok(mol)
}

#[derive(Debug, Clone, Copy)]
struct BondSpec {
    order: BondOrder,
    stereo: BondStereo,
    pos: usize,
}

#[derive(Debug, Clone, Copy)]
struct RingOpening {
    atom: usize,
    bond: Option<BondSpec>,
}

struct Parser<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    mol: Molecule,
    prev: Option<usize>,
    pending: Option<BondSpec>,
    branches: Vec<(Option<usize>, usize)>,
    rings: BTreeMap<u16, RingOpening>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            mol: Molecule::new(),
            prev: None,
            pending: None,
            branches: Vec::new(),
            rings: BTreeMap::new(),
        }
    }

    fn run(mut self) -> Result<Molecule> {
        while self.pos < self.bytes.len() {
            let c = self.bytes[self.pos];
            match c {
                b'(' => self.open_branch()?,
                b')' => self.close_branch()?,
                b'.' => {
                    self.expect_no_pending()?;
                    self.prev = None;
                    self.pos += 1;
                }
                b'-' | b'=' | b'#' | b'$' | b':' | b'/' | b'\\' => self.bond_symbol(c)?,
                b'0'..=b'9' | b'%' => self.ring_closure()?,
                b'[' => self.bracket_atom()?,
                b'*' | b'A'..=b'Z' | b'a'..=b'z' => self.organic_atom()?,
                _ => return Err(self.unexpected()),
            }
        }

        self.expect_no_pending()?;
        if let Some(&(_, pos)) = self.branches.last() {
            return Err(SmilesError::UnbalancedParenthesis { pos });
        }
        if let Some((&label, _)) = self.rings.iter().next() {
            return Err(SmilesError::UnclosedRing { label });
        }
        if self.mol.is_empty() {
            return Err(SmilesError::Empty);
        }
        Ok(self.mol)
    }

    fn unexpected(&self) -> SmilesError {
        let ch = self.input[self.pos..].chars().next().unwrap_or('\0');
        SmilesError::UnexpectedChar { pos: self.pos, ch }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn expect_no_pending(&self) -> Result<()> {
        match self.pending {
            Some(spec) => Err(SmilesError::DanglingBond { pos: spec.pos }),
            None => Ok(()),
        }
    }

    fn open_branch(&mut self) -> Result<()> {
        if self.prev.is_none() || self.pending.is_some() {
            return Err(self.unexpected());
        }
        self.branches.push((self.prev, self.pos));
        self.pos += 1;
        if self.peek() == Some(b')') {
            return Err(self.unexpected());
        }
        Ok(())
    }

    fn close_branch(&mut self) -> Result<()> {
        self.expect_no_pending()?;
        match self.branches.pop() {
            Some((anchor, _)) => {
                self.prev = anchor;
                self.pos += 1;
                Ok(())
            }
            None => Err(SmilesError::UnbalancedParenthesis { pos: self.pos }),
        }
    }

    fn bond_symbol(&mut self, c: u8) -> Result<()> {
        if self.pending.is_some() || self.prev.is_none() {
            return Err(self.unexpected());
        }
        let (order, stereo) = match c {
            b'-' => (BondOrder::Single, BondStereo::None),
            b'=' => (BondOrder::Double, BondStereo::None),
            b'#' => (BondOrder::Triple, BondStereo::None),
            b'$' => (BondOrder::Quadruple, BondStereo::None),
            b':' => (BondOrder::Aromatic, BondStereo::None),
            b'/' => (BondOrder::Single, BondStereo::Up),
            _ => (BondOrder::Single, BondStereo::Down),
        };
        self.pending = Some(BondSpec { order, stereo, pos: self.pos });
        self.pos += 1;
        Ok(())
    }

    fn default_order(&self, a: usize, b: usize) -> BondOrder {
        if self.mol.atoms[a].aromatic && self.mol.atoms[b].aromatic {
            BondOrder::Aromatic
        } else {
            BondOrder::Single
        }
    }

    fn attach(&mut self, atom: Atom) -> Result<()> {
        if self.mol.atom_count() >= MAX_ATOMS {
            return Err(SmilesError::TooLarge { limit: MAX_ATOMS });
        }
        let idx = self.mol.add_atom(atom);
        match (self.prev, self.pending.take()) {
            (Some(prev), spec) => {
                let (order, stereo) = match spec {
                    Some(s) => (s.order, s.stereo),
                    None => (self.default_order(prev, idx), BondStereo::None),
                };
                // A freshly added atom has no bonds, so this cannot collide.
                self.mol.add_bond(prev, idx, order, stereo);
            }
            (None, Some(spec)) => return Err(SmilesError::DanglingBond { pos: spec.pos }),
            (None, None) => {}
        }
        self.prev = Some(idx);
        Ok(())
    }

    fn organic_atom(&mut self) -> Result<()> {
        let start = self.pos;
        let c = self.bytes[start];
        let next = self.bytes.get(start + 1).copied();
        let (symbol, aromatic, len) = match (c, next) {
            (b'C', Some(b'l')) => ("Cl", false, 2),
            (b'B', Some(b'r')) => ("Br", false, 2),
            (b'B', _) => ("B", false, 1),
            (b'C', _) => ("C", false, 1),
            (b'N', _) => ("N", false, 1),
            (b'O', _) => ("O", false, 1),
            (b'P', _) => ("P", false, 1),
            (b'S', _) => ("S", false, 1),
            (b'F', _) => ("F", false, 1),
            (b'I', _) => ("I", false, 1),
            (b'*', _) => ("*", false, 1),
            (b'b', _) => ("B", true, 1),
            (b'c', _) => ("C", true, 1),
            (b'n', _) => ("N", true, 1),
            (b'o', _) => ("O", true, 1),
            (b'p', _) => ("P", true, 1),
            (b's', _) => ("S", true, 1),
            _ => {
                return Err(SmilesError::UnknownElement {
                    pos: start,
                    symbol: (c as char).to_string(),
                })
            }
        };
        let z = element::atomic_number(symbol).ok_or_else(|| SmilesError::UnknownElement {
            pos: start,
            symbol: symbol.to_string(),
        })?;
        self.pos += len;
        self.attach(Atom::organic(z, aromatic))
    }

    /// Digits at the cursor, if any. `open` locates the enclosing bracket atom.
    fn read_number(&mut self, open: usize) -> Result<Option<u32>> {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.pos == start {
            return Ok(None);
        }
        self.input[start..self.pos]
            .parse()
            .map(Some)
            .map_err(|_| SmilesError::BracketAtom { pos: open, reason: "number out of range" })
    }

    fn bracket_atom(&mut self) -> Result<()> {
        let open = self.pos;
        let close = self.input[open..]
            .find(']')
            .map(|i| open + i)
            .ok_or(SmilesError::BracketAtom { pos: open, reason: "missing ']'" })?;
        self.pos += 1;

        let isotope = match self.read_number(open)? {
            Some(n) => Some(u16::try_from(n).map_err(|_| SmilesError::BracketAtom {
                pos: open,
                reason: "isotope out of range",
            })?),
            None => None,
        };

        let (z, aromatic) = self.bracket_symbol(close)?;

        let mut chirality = Chirality::None;
        if self.peek() == Some(b'@') {
            self.pos += 1;
            chirality = Chirality::CounterClockwise;
            if self.peek() == Some(b'@') {
                self.pos += 1;
                chirality = Chirality::Clockwise;
            }
        }

        let mut hydrogens = 0u8;
        if self.peek() == Some(b'H') {
            self.pos += 1;
            hydrogens = match self.peek() {
                Some(d) if d.is_ascii_digit() => {
                    self.pos += 1;
                    d - b'0'
                }
                _ => 1,
            };
        }

        let mut charge: i32 = 0;
        if let Some(sign @ (b'+' | b'-')) = self.peek() {
            let unit = if sign == b'+' { 1 } else { -1 };
            self.pos += 1;
            charge = unit;
            if let Some(n) = self.read_number(open)? {
                charge = unit * i32::try_from(n).unwrap_or(i32::MAX);
            } else {
                while self.peek() == Some(sign) {
                    self.pos += 1;
                    charge += unit;
                }
            }
        }
        let charge = i8::try_from(charge)
            .ok()
            .filter(|c| c.abs() <= 15)
            .ok_or(SmilesError::BracketAtom { pos: open, reason: "charge out of range" })?;

        let mut class = None;
        if self.peek() == Some(b':') {
            self.pos += 1;
            let n = self.read_number(open)?.ok_or(SmilesError::BracketAtom {
                pos: open,
                reason: "atom class must be numeric",
            })?;
            class = Some(u16::try_from(n).map_err(|_| SmilesError::BracketAtom {
                pos: open,
                reason: "atom class out of range",
            })?);
        }

        if self.pos != close {
            return Err(SmilesError::BracketAtom { pos: self.pos, reason: "unexpected content" });
        }
        self.pos = close + 1;

        self.attach(Atom {
            element: z,
            aromatic,
            charge,
            isotope,
            hydrogens,
            bracket: true,
            chirality,
            class,
        })
    }

    fn bracket_symbol(&mut self, close: usize) -> Result<(u8, bool)> {
        let start = self.pos;
        let rest = &self.input[start..close];
        if rest.starts_with('*') {
            self.pos += 1;
            return Ok((0, false));
        }
        for aromatic in ["se", "as", "te", "b", "c", "n", "o", "p", "s"] {
            if rest.starts_with(aromatic) {
                let mut upper = aromatic.to_string();
                upper[..1].make_ascii_uppercase();
                self.pos += aromatic.len();
                let z = element::atomic_number(&upper).unwrap_or(0);
                return Ok((z, true));
            }
        }
        let mut chars = rest.chars();
        match chars.next() {
            Some(first) if first.is_ascii_uppercase() => {
                if let Some(second) = chars.next().filter(|c| c.is_ascii_lowercase()) {
                    let two: String = [first, second].iter().collect();
                    if let Some(z) = element::atomic_number(&two) {
                        self.pos += 2;
                        return Ok((z, false));
                    }
                }
                let one = first.to_string();
                match element::atomic_number(&one) {
                    Some(z) => {
                        self.pos += 1;
                        Ok((z, false))
                    }
                    None => Err(SmilesError::UnknownElement { pos: start, symbol: one }),
                }
            }
            _ => Err(SmilesError::BracketAtom { pos: start, reason: "missing element symbol" }),
        }
    }

    fn ring_closure(&mut self) -> Result<()> {
        let pos = self.pos;
        let current = match self.prev {
            Some(p) => p,
            None => return Err(self.unexpected()),
        };
        let label = if self.bytes[pos] == b'%' {
            let digits = self
                .input
                .get(pos + 1..pos + 3)
                .filter(|d| d.bytes().all(|b| b.is_ascii_digit()))
                .ok_or(SmilesError::RingClosure { pos, label: 0, reason: "'%' needs two digits" })?;
            self.pos += 3;
            digits.parse::<u16>().unwrap_or(0)
        } else {
            self.pos += 1;
            (self.bytes[pos] - b'0') as u16
        };
        let spec = self.pending.take();

        match self.rings.remove(&label) {
            Some(opening) => {
                if opening.atom == current {
                    return Err(SmilesError::RingClosure { pos, label, reason: "atom bonded to itself" });
                }
                let (order, stereo) = match (opening.bond, spec) {
                    (Some(a), Some(b)) if a.order != b.order => {
                        return Err(SmilesError::RingClosure { pos, label, reason: "conflicting bond orders" })
                    }
                    (_, Some(s)) | (Some(s), None) => (s.order, s.stereo),
                    (None, None) => (self.default_order(opening.atom, current), BondStereo::None),
                };
                self.mol
                    .add_bond(opening.atom, current, order, stereo)
                    .ok_or(SmilesError::RingClosure { pos, label, reason: "duplicate bond" })?;
            }
            None => {
                self.rings.insert(label, RingOpening { atom: current, bond: spec });
            }
        }
        Ok(())
    }
}

/// Fill implicit hydrogens for organic-subset atoms and reject impossible valences.
fn assign_hydrogens(mol: &mut Molecule) -> Result<()> {
    for idx in 0..mol.atom_count() {
        let atom = &mol.atoms[idx];
        if atom.bracket {
            continue;
        }
        let valences = element::default_valences(atom.element);
        let Some(&max) = valences.last() else {
            continue;
        };
        let bonded = mol.explicit_valence(idx);
        if bonded > u32::from(max) {
            return Err(SmilesError::Valence { atom: idx, symbol: atom.symbol(), valence: bonded });
        }
        // Bounded by `max` from here on.
        let bonded = bonded as u8;
        let lowest = valences[0];
        let hydrogens = if atom.aromatic {
            if bonded >= lowest { 0 } else { lowest - bonded - 1 }
        } else {
            valences
                .iter()
                .find(|&&v| v >= bonded)
                .map(|&v| v - bonded)
                .unwrap_or(0)
        };
        mol.atoms[idx].hydrogens = hydrogens;
    }
    Ok(())
}

fn check_aromatic_rings(mol: &Molecule) -> Result<()> {
    if !mol.atoms.iter().any(|a| a.aromatic) {
        return Ok(());
    }
    let rings = RingInfo::perceive(mol);
    match mol
        .atoms
        .iter()
        .enumerate()
        .find(|(i, a)| a.aromatic && !rings.is_ring_atom(*i))
    {
        Some((atom, a)) => Err(SmilesError::AromaticOutsideRing { atom, symbol: a.symbol() }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{CARBON, NITROGEN, OXYGEN};

    fn hydrogens(smiles: &str) -> Vec<u8> {
        parse_smiles(smiles).unwrap().atoms.iter().map(|a| a.hydrogens).collect()
    }

    #[test]
    fn test_simple_chain_with_branch() {
        let mol = parse_smiles("CC(=O)O").unwrap();
        assert_eq!(mol.atom_count(), 4);
        assert_eq!(mol.bond_count(), 3);
        assert_eq!(mol.atoms[2].element, OXYGEN);
        let double = mol.bond_between(1, 2).unwrap();
        assert_eq!(mol.bonds[double].order, BondOrder::Double);
        assert_eq!(hydrogens("CC(=O)O"), vec![3, 0, 0, 1]);
    }

    #[test]
    fn test_aromatic_ring_closure() {
        let mol = parse_smiles("c1ccccc1").unwrap();
        assert_eq!(mol.atom_count(), 6);
        assert_eq!(mol.bond_count(), 6);
        assert!(mol.bonds.iter().all(|b| b.order == BondOrder::Aromatic));
        assert_eq!(hydrogens("c1ccccc1"), vec![1; 6]);
    }

    #[test]
    fn test_aromatic_nitrogen_hydrogens() {
        // pyridine nitrogen and the substituted indole nitrogen carry no H
        let mol = parse_smiles("c1ccncc1").unwrap();
        assert_eq!(mol.atoms[3].element, NITROGEN);
        assert_eq!(mol.atoms[3].hydrogens, 0);
        let indole = parse_smiles("Cn1ccc2ccccc21").unwrap();
        assert_eq!(indole.atoms[1].hydrogens, 0);
    }

    #[test]
    fn test_two_letter_organic_atoms() {
        let mol = parse_smiles("ClCBr").unwrap();
        let symbols: Vec<&str> = mol.atoms.iter().map(|a| a.symbol()).collect();
        assert_eq!(symbols, vec!["Cl", "C", "Br"]);
        assert_eq!(mol.atoms[1].hydrogens, 2);
    }

    #[test]
    fn test_bracket_atom_fields() {
        let mol = parse_smiles("[13CH3:7][N+](C)(C)C.[Cl-]").unwrap();
        let c = &mol.atoms[0];
        assert_eq!(c.element, CARBON);
        assert_eq!(c.isotope, Some(13));
        assert_eq!(c.hydrogens, 3);
        assert_eq!(c.class, Some(7));
        assert_eq!(mol.atoms[1].charge, 1);
        assert_eq!(mol.atoms[5].charge, -1);
        assert_eq!(mol.components().len(), 2);
        let chiral = parse_smiles("N[C@@H](C)C(=O)O").unwrap();
        assert_eq!(chiral.atoms[1].chirality, Chirality::Clockwise);
        assert_eq!(parse_smiles("[Fe++]").unwrap().atoms[0].charge, 2);
        assert!(parse_smiles("[nH]1cccc1").unwrap().atoms[0].aromatic);
    }

    #[test]
    fn test_ring_closure_bond_orders() {
        let mol = parse_smiles("C=1CCCCC1").unwrap();
        let bi = mol.bond_between(0, 5).unwrap();
        assert_eq!(mol.bonds[bi].order, BondOrder::Double);
        let mol = parse_smiles("C%12CC%12").unwrap();
        assert_eq!(mol.bond_count(), 3);
        assert_eq!(
            parse_smiles("C=1CC#1").unwrap_err(),
            SmilesError::RingClosure { pos: 6, label: 1, reason: "conflicting bond orders" }
        );
    }

    #[test]
    fn test_stereo_bonds_parse() {
        let mol = parse_smiles("F/C=C/F").unwrap();
        assert_eq!(mol.bonds[0].stereo, BondStereo::Up);
        assert_eq!(mol.bonds[1].order, BondOrder::Double);
    }

    #[test]
    fn test_catalog_structures_parse() {
        for smiles in [
            "CN1C=NC2=C1C(=O)N(C(=O)N2C)C",
            "COc1cc2ncnc(Nc3ccc(F)c(Cl)c3)c2cc1OCCCN4CCOCC4",
            "CN(C)C/C=C/C(=O)Nc1cc2c(Nc3ccc(F)c(Cl)c3)ncnc2cc1OC",
            "C#Cc1cccc(Nc2ncnc3cc(OCCOC)c(OCCOC)cc23)c1",
            "Cc1cc(nc(n1)Nc2ccc(cc2)S(=O)(=O)NC)c3cccc(F)c3",
        ] {
            assert!(parse_smiles(smiles).is_ok(), "{} should parse", smiles);
        }
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(parse_smiles("").unwrap_err(), SmilesError::Empty);
        assert_eq!(parse_smiles("   ").unwrap_err(), SmilesError::Empty);
        assert!(matches!(parse_smiles("C1CC").unwrap_err(), SmilesError::UnclosedRing { label: 1 }));
        assert!(matches!(parse_smiles("C(C").unwrap_err(), SmilesError::UnbalancedParenthesis { .. }));
        assert!(matches!(parse_smiles("CC)").unwrap_err(), SmilesError::UnbalancedParenthesis { .. }));
        assert!(matches!(parse_smiles("CC=").unwrap_err(), SmilesError::DanglingBond { .. }));
        assert!(matches!(parse_smiles("=CC").unwrap_err(), SmilesError::UnexpectedChar { .. }));
        assert!(matches!(parse_smiles("C[Xx]").unwrap_err(), SmilesError::UnknownElement { .. }));
        assert!(matches!(parse_smiles("C[C").unwrap_err(), SmilesError::BracketAtom { .. }));
        assert!(matches!(parse_smiles("not-a-smiles").unwrap_err(), SmilesError::UnknownElement { .. }));
        assert!(matches!(parse_smiles("C C").unwrap_err(), SmilesError::UnexpectedChar { ch: ' ', .. }));
        assert!(matches!(parse_smiles("C11").unwrap_err(), SmilesError::RingClosure { .. }));
        assert!(matches!(parse_smiles("C12CC12").unwrap_err(), SmilesError::RingClosure { .. }));
    }

    #[test]
    fn test_oversized_bracket_numbers_are_rejected() {
        for input in ["[C+99999999999]", "[99999999999C]", "[CH4:99999999999]"] {
            assert_eq!(
                parse_smiles(input).unwrap_err(),
                SmilesError::BracketAtom { pos: 0, reason: "number out of range" },
                "{input}"
            );
        }
        assert_eq!(
            parse_smiles("[C+4294967295]").unwrap_err(),
            SmilesError::BracketAtom { pos: 0, reason: "charge out of range" }
        );
    }

    #[test]
    fn test_chemistry_rejections() {
        assert!(matches!(
            parse_smiles("C(C)(C)(C)(C)C").unwrap_err(),
            SmilesError::Valence { atom: 0, .. }
        ));
        assert!(matches!(
            parse_smiles(&format!("C{}", "($C)".repeat(64))).unwrap_err(),
            SmilesError::Valence { atom: 0, valence: 256, .. }
        ));
        assert!(matches!(
            parse_smiles("cc").unwrap_err(),
            SmilesError::AromaticOutsideRing { .. }
        ));
    }

    #[test]
    fn test_atom_limit() {
        let huge = "C".repeat(MAX_ATOMS + 1);
        assert_eq!(parse_smiles(&huge).unwrap_err(), SmilesError::TooLarge { limit: MAX_ATOMS });
    }
}
