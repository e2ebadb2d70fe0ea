//! Ring perception: ring bonds, a smallest set of smallest rings and ring systems.

use std::collections::{BTreeSet, VecDeque};

use crate::molecule::Molecule;

/// Rings found in a molecule. Each ring is an ordered cycle of atom indices.
#[derive(Debug, Clone, Default)]
pub struct RingInfo {
    pub rings: Vec<Vec<usize>>,
    pub ring_bond: Vec<bool>,
    /// atom -> indices into `rings`
    pub atom_rings: Vec<Vec<usize>>,
}

impl RingInfo {
    pub fn perceive(mol: &Molecule) -> Self {
        let mut ring_bond = vec![false; mol.bond_count()];
        let mut candidates: Vec<Vec<usize>> = Vec::new();
        let mut seen: BTreeSet<Vec<usize>> = BTreeSet::new();

        for (bi, bond) in mol.bonds.iter().enumerate() {
            if let Some(path) = shortest_path(mol, bond.begin, bond.end, Some(bi)) {
                ring_bond[bi] = true;
                let mut key = path.clone();
                key.sort_unstable();
                if seen.insert(key) {
                    candidates.push(path);
                }
            }
        }

        // Keep the smallest linearly independent cycles (GF(2) over bonds).
        candidates.sort_by_key(|ring| ring.len());
        let target = cyclomatic_number(mol);
        let mut basis = Gf2Basis::new(mol.bond_count());
        let mut rings = Vec::new();
        for ring in candidates {
            if rings.len() == target {
                break;
            }
            if basis.insert(ring_bond_vector(mol, &ring)) {
                rings.push(ring);
            }
        }

        let mut atom_rings = vec![Vec::new(); mol.atom_count()];
        for (ri, ring) in rings.iter().enumerate() {
            for &a in ring {
                atom_rings[a].push(ri);
            }
        }

        Self { rings, ring_bond, atom_rings }
    }

    pub fn is_ring_atom(&self, atom: usize) -> bool {
        !self.atom_rings[atom].is_empty()
    }

    pub fn ring_count(&self) -> usize {
        self.rings.len()
    }

    /// Groups of ring indices that share at least one atom (fused, spiro or bridged).
    pub fn ring_systems(&self) -> Vec<Vec<usize>> {
        let n = self.rings.len();
        let mut parent: Vec<usize> = (0..n).collect();

        fn find(parent: &mut [usize], mut x: usize) -> usize {
            while parent[x] != x {
                parent[x] = parent[parent[x]];
                x = parent[x];
            }
            x
        }

        for rings in &self.atom_rings {
            for pair in rings.windows(2) {
                let a = find(&mut parent, pair[0]);
                let b = find(&mut parent, pair[1]);
                if a != b {
                    parent[a.max(b)] = a.min(b);
                }
            }
        }

        let mut systems: Vec<Vec<usize>> = Vec::new();
        let mut root_slot: Vec<Option<usize>> = vec![None; n];
        for ri in 0..n {
            let root = find(&mut parent, ri);
            match root_slot[root] {
                Some(slot) => systems[slot].push(ri),
                None => {
                    root_slot[root] = Some(systems.len());
                    systems.push(vec![ri]);
                }
            }
        }
        systems
    }
}

fn cyclomatic_number(mol: &Molecule) -> usize {
    (mol.bond_count() + mol.components().len()).saturating_sub(mol.atom_count())
}

/// BFS path from `from` to `to`, optionally avoiding bond `skip`.
pub(crate) fn shortest_path(mol: &Molecule, from: usize, to: usize, skip: Option<usize>) -> Option<Vec<usize>> {
    let mut prev: Vec<Option<usize>> = vec![None; mol.atom_count()];
    let mut visited = vec![false; mol.atom_count()];
    let mut queue = VecDeque::new();
    visited[from] = true;
    queue.push_back(from);

    while let Some(u) = queue.pop_front() {
        if u == to {
            let mut path = vec![to];
            let mut cur = to;
            while let Some(p) = prev[cur] {
                path.push(p);
                cur = p;
            }
            path.reverse();
            return Some(path);
        }
        for &(v, bi) in mol.edges(u) {
            if skip == Some(bi) || visited[v] {
                continue;
            }
            visited[v] = true;
            prev[v] = Some(u);
            queue.push_back(v);
        }
    }
    None
}

fn ring_bond_vector(mol: &Molecule, ring: &[usize]) -> Vec<u64> {
    let mut bits = vec![0u64; mol.bond_count().div_ceil(64).max(1)];
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        if let Some(bi) = mol.bond_between(a, b) {
            bits[bi / 64] |= 1 << (bi % 64);
        }
    }
    bits
}

/// Incremental row-echelon basis over GF(2).
struct Gf2Basis {
    rows: Vec<(usize, Vec<u64>)>,
    width: usize,
}

impl Gf2Basis {
    fn new(width: usize) -> Self {
        Self { rows: Vec::new(), width }
    }

    /// Returns true if `v` was independent of the current basis and got added.
    fn insert(&mut self, mut v: Vec<u64>) -> bool {
        for (pivot, row) in &self.rows {
            if v[pivot / 64] & (1 << (pivot % 64)) != 0 {
                for (x, r) in v.iter_mut().zip(row) {
                    *x ^= *r;
                }
            }
        }
        match (0..self.width).find(|&bit| v[bit / 64] & (1 << (bit % 64)) != 0) {
            Some(pivot) => {
                // Keep existing rows reduced against the new pivot.
                for (_, row) in self.rows.iter_mut() {
                    if row[pivot / 64] & (1 << (pivot % 64)) != 0 {
                        for (r, x) in row.iter_mut().zip(&v) {
                            *r ^= *x;
                        }
                    }
                }
                self.rows.push((pivot, v));
                true
            }
            None => false,
        }
    }
}
