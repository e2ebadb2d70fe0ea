//! Deterministic 2D coordinate generation.
//!
//! Ring systems are laid out as regular polygons (fused rings grown on their
//! shared edge). Bridged systems are drawn on their longest cycle with the
//! bridges threaded across it. Acyclic atoms are placed breadth-first with
//! unit bond length and 120° zig-zag chains, then substituents that land on
//! top of each other are mirrored or swung about their bond until they clear.
//! Coordinates depend only on the graph and the atom order, never on
//! randomness or hash ordering.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::f64::consts::PI;
use std::ops::{Add, Mul, Sub};

use crate::molecule::{BondOrder, Molecule};
use crate::rings::{shortest_path, RingInfo};

pub const BOND_LENGTH: f64 = 1.0;
const COMPONENT_GAP: f64 = 1.5;

/// Non-bonded atoms closer than this count as a clash.
const CLASH_DISTANCE: f64 = 0.8;
const UNTANGLE_PASSES: usize = 64;
/// Upper bound on candidate moves scored per component.
const UNTANGLE_BUDGET: usize = 4096;
const CYCLE_SEARCH_BUDGET: usize = 20_000;
/// Sideways offsets tried for a bridge, in bond lengths.
const BRIDGE_OFFSETS: [f64; 9] = [0.0, 0.5, -0.5, 1.0, -1.0, 1.5, -1.5, 2.0, -2.0];
const SWING_ANGLES: [f64; 4] = [PI / 6.0, -PI / 6.0, PI / 3.0, -PI / 3.0];

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn polar(radius: f64, angle: f64) -> Self {
        Self::new(radius * angle.cos(), radius * angle.sin())
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }

    pub fn distance(self, other: Point) -> f64 {
        (self - other).length()
    }

    pub fn normalized(self) -> Option<Point> {
        let len = self.length();
        (len > 1e-9).then(|| self * (1.0 / len))
    }

    /// Rotated by +90°.
    pub fn perp(self) -> Point {
        Point::new(-self.y, self.x)
    }

    pub fn dot(self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn rotate(self, angle: f64) -> Point {
        let (s, c) = angle.sin_cos();
        Point::new(self.x * c - self.y * s, self.x * s + self.y * c)
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, o: Point) -> Point {
        Point::new(self.x + o.x, self.y + o.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, o: Point) -> Point {
        Point::new(self.x - o.x, self.y - o.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, k: f64) -> Point {
        Point::new(self.x * k, self.y * k)
    }
}

/// 2D coordinates for every atom plus the ring perception used to build them.
#[derive(Debug, Clone)]
pub struct Depiction {
    pub coords: Vec<Point>,
    pub rings: RingInfo,
}

impl Depiction {
    /// (min, max) corners of the coordinate bounding box.
    pub fn bounds(&self) -> (Point, Point) {
        bounds_of(self.coords.iter().copied())
    }

    pub fn ring_center(&self, ring: usize) -> Point {
        centroid(self.rings.rings[ring].iter().map(|&a| self.coords[a]))
    }
}

/// Compute a 2D depiction for a molecule.
pub fn compute_2d_coords(mol: &Molecule) -> Depiction {
    let rings = RingInfo::perceive(mol);
    let coords = {
        let mut layout = Layout::new(mol, &rings);
        let mut offset_x = 0.0;
        for component in mol.components() {
            layout.place_component(&component);
            layout.untangle(&component);
            let (min, max) = bounds_of(component.iter().filter_map(|&a| layout.pos[a]));
            let shift = Point::new(offset_x - min.x, -(min.y + max.y) / 2.0);
            for &a in &component {
                if let Some(p) = layout.pos[a].as_mut() {
                    *p = *p + shift;
                }
            }
            offset_x += (max.x - min.x) + COMPONENT_GAP;
        }
        layout.pos.into_iter().map(|p| p.unwrap_or_default()).collect()
    };
    Depiction { coords, rings }
}

fn bounds_of(points: impl Iterator<Item = Point>) -> (Point, Point) {
    let mut min = Point::new(f64::INFINITY, f64::INFINITY);
    let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in points {
        min = Point::new(min.x.min(p.x), min.y.min(p.y));
        max = Point::new(max.x.max(p.x), max.y.max(p.y));
    }
    if min.x > max.x {
        return (Point::ORIGIN, Point::ORIGIN);
    }
    (min, max)
}

fn centroid(points: impl Iterator<Item = Point>) -> Point {
    let (sum, n) = points.fold((Point::ORIGIN, 0usize), |(s, n), p| (s + p, n + 1));
    if n == 0 { Point::ORIGIN } else { sum * (1.0 / n as f64) }
}

/// Wrap an angle into (-PI, PI].
fn wrap(angle: f64) -> f64 {
    let mut a = angle % (2.0 * PI);
    if a <= -PI {
        a += 2.0 * PI;
    } else if a > PI {
        a -= 2.0 * PI;
    }
    a
}

fn polygon_radius(n: usize, edge: f64) -> f64 {
    edge / (2.0 * (PI / n as f64).sin())
}

fn polygon_apothem(n: usize, edge: f64) -> f64 {
    edge / (2.0 * (PI / n as f64).tan())
}

struct Layout<'a> {
    mol: &'a Molecule,
    rings: &'a RingInfo,
    systems: Vec<Vec<usize>>,
    atom_system: Vec<Option<usize>>,
    system_placed: Vec<bool>,
    pos: Vec<Option<Point>>,
    /// Sign of the turn taken when an atom was reached; chains alternate it.
    turn: Vec<f64>,
}

impl<'a> Layout<'a> {
    fn new(mol: &'a Molecule, rings: &'a RingInfo) -> Self {
        let systems = rings.ring_systems();
        let mut atom_system = vec![None; mol.atom_count()];
        for (si, system) in systems.iter().enumerate() {
            for &ri in system {
                for &a in &rings.rings[ri] {
                    atom_system[a] = Some(si);
                }
            }
        }
        Self {
            mol,
            rings,
            system_placed: vec![false; systems.len()],
            systems,
            atom_system,
            pos: vec![None; mol.atom_count()],
            turn: vec![1.0; mol.atom_count()],
        }
    }

    fn place_component(&mut self, atoms: &[usize]) {
        let Some(&root) = atoms.first() else {
            return;
        };
        let mut queue = VecDeque::new();
        match self.atom_system[root] {
            Some(sys) => {
                let placed = self.place_system(sys, root, Point::ORIGIN, Point::new(1.0, 0.0));
                queue.extend(placed);
            }
            None => {
                self.pos[root] = Some(Point::ORIGIN);
                queue.push_back(root);
            }
        }

        while let Some(u) = queue.pop_front() {
            let pending: Vec<usize> = self
                .mol
                .neighbors(u)
                .filter(|&n| self.pos[n].is_none())
                .collect();
            if pending.is_empty() {
                continue;
            }
            let Some(origin) = self.pos[u] else {
                continue;
            };
            let directions = self.free_directions(u, pending.len());
            let incoming = self.incoming_angle(u);

            for (v, angle) in pending.into_iter().zip(directions) {
                if self.pos[v].is_some() {
                    continue;
                }
                self.turn[v] = match incoming {
                    Some(inc) => {
                        let diff = wrap(angle - inc);
                        if diff.abs() < 1e-6 { self.turn[u] } else { diff.signum() }
                    }
                    None => -self.turn[u],
                };
                let dir = Point::polar(1.0, angle);
                let target = origin + dir * BOND_LENGTH;
                match self.atom_system[v] {
                    Some(sys) if !self.system_placed[sys] => {
                        let placed = self.place_system(sys, v, target, dir);
                        queue.extend(placed);
                    }
                    _ => {
                        self.pos[v] = Some(target);
                        queue.push_back(v);
                    }
                }
            }
        }
    }

    /// Direction of travel into `u` when it has exactly one placed neighbour.
    fn incoming_angle(&self, u: usize) -> Option<f64> {
        let origin = self.pos[u]?;
        let mut placed = self.mol.neighbors(u).filter_map(|n| self.pos[n]);
        let first = placed.next()?;
        if placed.next().is_some() {
            return None;
        }
        Some(wrap((first - origin).angle() + PI))
    }

    /// sp centres: a triple bond or two double bonds keep substituents collinear.
    fn is_linear(&self, u: usize) -> bool {
        let mut doubles = 0;
        for &(_, bi) in self.mol.edges(u) {
            match self.mol.bonds[bi].order {
                BondOrder::Triple | BondOrder::Quadruple => return true,
                BondOrder::Double => doubles += 1,
                _ => {}
            }
        }
        doubles >= 2
    }

    fn free_directions(&self, u: usize, k: usize) -> Vec<f64> {
        let origin = self.pos[u].unwrap_or_default();
        let mut occupied: Vec<f64> = self
            .mol
            .neighbors(u)
            .filter_map(|n| self.pos[n])
            .map(|p| (p - origin).angle())
            .collect();

        match occupied.len() {
            0 => match k {
                1 => vec![0.0],
                2 => vec![-PI / 6.0, PI + PI / 6.0],
                _ => (0..k).map(|i| PI / 2.0 + 2.0 * PI * i as f64 / k as f64).collect(),
            },
            1 => {
                let back = occupied[0];
                if k == 1 {
                    if self.is_linear(u) {
                        vec![wrap(back + PI)]
                    } else {
                        vec![wrap(back + PI - self.turn[u] * PI / 3.0)]
                    }
                } else {
                    (1..=k)
                        .map(|i| wrap(back + 2.0 * PI * i as f64 / (k + 1) as f64))
                        .collect()
                }
            }
            _ => {
                occupied.sort_by(|a, b| a.total_cmp(b));
                let (start, gap) = largest_gap(&occupied);
                (1..=k)
                    .map(|i| wrap(start + gap * i as f64 / (k + 1) as f64))
                    .collect()
            }
        }
    }

    /// Lay out a whole ring system so that `anchor` sits at `anchor_pos` and the
    /// system extends along `outward`. Returns the newly placed atoms in index order.
    fn place_system(&mut self, sys: usize, anchor: usize, anchor_pos: Point, outward: Point) -> Vec<usize> {
        self.system_placed[sys] = true;
        let local = self.system_local_coords(sys, anchor);
        let anchor_local = local.get(&anchor).copied().unwrap_or_default();
        let center = centroid(local.values().copied());
        // The incoming bond bisects the anchor's outer ring angle.
        let ring_neighbors: Vec<Point> = self
            .mol
            .neighbors(anchor)
            .filter_map(|n| local.get(&n).copied())
            .collect();
        let toward = if ring_neighbors.is_empty() { center } else { centroid(ring_neighbors.into_iter()) };
        let reach = (toward - anchor_local)
            .normalized()
            .or_else(|| (center - anchor_local).normalized())
            .unwrap_or(Point::new(1.0, 0.0));
        let rotation = outward.angle() - reach.angle();

        let mut placed = Vec::with_capacity(local.len());
        for (&atom, &p) in &local {
            if self.pos[atom].is_some() {
                continue;
            }
            self.pos[atom] = Some((p - anchor_local).rotate(rotation) + anchor_pos);
            placed.push(atom);
        }
        placed
    }

    fn system_local_coords(&self, sys: usize, anchor: usize) -> BTreeMap<usize, Point> {
        let ring_ids = &self.systems[sys];
        let rings = &self.rings.rings;
        let mut local: BTreeMap<usize, Point> = BTreeMap::new();
        let mut done = vec![false; rings.len()];

        let first = ring_ids
            .iter()
            .copied()
            .find(|&r| rings[r].contains(&anchor))
            .unwrap_or(ring_ids[0]);
        let n = rings[first].len();
        let radius = polygon_radius(n, BOND_LENGTH);
        for (i, &atom) in rings[first].iter().enumerate() {
            let angle = PI / 2.0 + 2.0 * PI * i as f64 / n as f64;
            local.insert(atom, Point::polar(radius, angle));
        }
        done[first] = true;

        loop {
            let next = ring_ids
                .iter()
                .copied()
                .filter(|&r| !done[r])
                .map(|r| (rings[r].iter().filter(|a| local.contains_key(a)).count(), r))
                .filter(|&(shared, _)| shared > 0)
                .max_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));
            let Some((_, r)) = next else {
                break;
            };
            if !place_ring(&rings[r], &mut local) {
                return self.bridged_local_coords(sys);
            }
            done[r] = true;
        }
        local
    }

    /// Longest cycle of the system as a polygon, remaining atoms threaded
    /// across it as bridges.
    fn bridged_local_coords(&self, sys: usize) -> BTreeMap<usize, Point> {
        let members: BTreeSet<usize> = self.systems[sys]
            .iter()
            .flat_map(|&r| self.rings.rings[r].iter().copied())
            .collect();
        let mut perimeter = longest_cycle(self.mol, &members);
        if perimeter.len() < 3 {
            perimeter = self.rings.rings[self.systems[sys][0]].clone();
        }

        let mut local = BTreeMap::new();
        let n = perimeter.len();
        let radius = polygon_radius(n, BOND_LENGTH);
        for (i, &atom) in perimeter.iter().enumerate() {
            local.insert(atom, Point::polar(radius, PI / 2.0 + 2.0 * PI * i as f64 / n as f64));
        }

        while local.len() < members.len() {
            let start = local.keys().find_map(|&s| {
                self.mol
                    .neighbors(s)
                    .find(|n| members.contains(n) && !local.contains_key(n))
                    .map(|u| (s, u))
            });
            let Some((s, u)) = start else {
                break;
            };
            let (run, end) = trace_bridge(self.mol, &members, &local, s, u);
            match end {
                Some(e) => {
                    let (a, b) = (local[&s], local[&e]);
                    place_bridge(a, b, &run, &mut local);
                }
                None => {
                    let mut cycle = Vec::with_capacity(run.len() + 1);
                    cycle.push(s);
                    cycle.extend(run);
                    if !place_ring(&cycle, &mut local) {
                        break;
                    }
                }
            }
        }
        local
    }

    /// Relieve clashes by mirroring or swinging the smaller side of an
    /// acyclic bond on the path between the clashing atoms.
    fn untangle(&mut self, atoms: &[usize]) {
        let mut budget = UNTANGLE_BUDGET;
        for _ in 0..UNTANGLE_PASSES {
            let clashes = self.clashes(atoms);
            if clashes.is_empty() {
                return;
            }
            let mut moved = None;
            for (i, j) in clashes {
                if budget == 0 {
                    return;
                }
                moved = self.best_move(atoms, i, j, &mut budget);
                if moved.is_some() {
                    break;
                }
            }
            let Some(moved) = moved else {
                return;
            };
            for (atom, p) in moved {
                self.pos[atom] = Some(p);
            }
        }
    }

    fn point(&self, atom: usize) -> Point {
        self.pos[atom].unwrap_or_default()
    }

    /// Clashing pairs, closest first.
    fn clashes(&self, atoms: &[usize]) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for (x, &i) in atoms.iter().enumerate() {
            for &j in &atoms[x + 1..] {
                let d = self.point(i).distance(self.point(j));
                if d < CLASH_DISTANCE {
                    pairs.push((d, i, j));
                }
            }
        }
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));
        pairs.into_iter().map(|(_, i, j)| (i, j)).collect()
    }

    /// The lowest-penalty move that separates `i` and `j`, if any improves.
    fn best_move(&self, atoms: &[usize], i: usize, j: usize, budget: &mut usize) -> Option<Vec<(usize, Point)>> {
        let path = shortest_path(self.mol, i, j, None)?;
        let mut best: Option<(f64, Vec<(usize, Point)>)> = None;

        for step in path.windows(2) {
            let (mut a, mut b) = (step[0], step[1]);
            let Some(bond) = self.mol.bond_between(a, b) else {
                continue;
            };
            if self.rings.ring_bond[bond] {
                continue;
            }
            let mut side = side_of(self.mol, b, bond);
            let side_len = atoms.iter().filter(|&&x| side[x]).count();
            if side_len * 2 > atoms.len() {
                for &x in atoms {
                    side[x] = !side[x];
                }
                std::mem::swap(&mut a, &mut b);
            }
            let pivot = self.point(a);
            let Some(axis) = (self.point(b) - pivot).normalized() else {
                continue;
            };
            let moving: Vec<usize> = atoms.iter().copied().filter(|&x| side[x]).collect();

            let mirror: Vec<(usize, Point)> = moving
                .iter()
                .map(|&x| {
                    let rel = self.point(x) - pivot;
                    (x, pivot + axis * (2.0 * rel.dot(axis)) - rel)
                })
                .collect();
            let swings = SWING_ANGLES.iter().map(|&angle| {
                moving
                    .iter()
                    .map(|&x| (x, pivot + (self.point(x) - pivot).rotate(angle)))
                    .collect::<Vec<_>>()
            });

            for candidate in std::iter::once(mirror).chain(swings) {
                if *budget == 0 {
                    break;
                }
                *budget -= 1;
                let delta: f64 = candidate
                    .iter()
                    .map(|&(x, p)| {
                        atoms
                            .iter()
                            .filter(|&&o| !side[o])
                            .map(|&o| {
                                let fixed = self.point(o);
                                clash_penalty(p.distance(fixed)) - clash_penalty(self.point(x).distance(fixed))
                            })
                            .sum::<f64>()
                    })
                    .sum();
                if best.as_ref().map_or(true, |(d, _)| delta < *d - 1e-12) {
                    best = Some((delta, candidate));
                }
            }
        }

        best.filter(|(delta, _)| *delta < -1e-9).map(|(_, moved)| moved)
    }
}

fn clash_penalty(d: f64) -> f64 {
    if d < CLASH_DISTANCE { (CLASH_DISTANCE - d).powi(2) } else { 0.0 }
}

/// Atoms reachable from `from` without crossing `bond`.
fn side_of(mol: &Molecule, from: usize, bond: usize) -> Vec<bool> {
    let mut side = vec![false; mol.atom_count()];
    let mut stack = vec![from];
    side[from] = true;
    while let Some(u) = stack.pop() {
        for &(v, bi) in mol.edges(u) {
            if bi != bond && !side[v] {
                side[v] = true;
                stack.push(v);
            }
        }
    }
    side
}

/// Longest simple cycle through `members`, searched depth-first under a step budget.
fn longest_cycle(mol: &Molecule, members: &BTreeSet<usize>) -> Vec<usize> {
    struct Search<'m> {
        mol: &'m Molecule,
        members: &'m BTreeSet<usize>,
        start: usize,
        path: Vec<usize>,
        on_path: Vec<bool>,
        best: Vec<usize>,
        steps: usize,
    }

    impl Search<'_> {
        fn exhausted(&self) -> bool {
            self.steps >= CYCLE_SEARCH_BUDGET || self.best.len() == self.members.len()
        }

        fn extend(&mut self, u: usize) {
            let mol = self.mol;
            for v in mol.neighbors(u) {
                if self.exhausted() {
                    return;
                }
                self.steps += 1;
                if v == self.start && self.path.len() >= 3 && self.path.len() > self.best.len() {
                    self.best = self.path.clone();
                }
                if v > self.start && self.members.contains(&v) && !self.on_path[v] {
                    self.path.push(v);
                    self.on_path[v] = true;
                    self.extend(v);
                    self.path.pop();
                    self.on_path[v] = false;
                }
            }
        }
    }

    let mut search = Search {
        mol,
        members,
        start: 0,
        path: Vec::new(),
        on_path: vec![false; mol.atom_count()],
        best: Vec::new(),
        steps: 0,
    };
    for &start in members {
        if search.exhausted() {
            break;
        }
        search.start = start;
        search.path = vec![start];
        search.on_path[start] = true;
        search.extend(start);
        search.on_path[start] = false;
    }
    search.best
}

/// Walk unplaced system atoms from `first` (bonded to placed `from`) to the
/// nearest other placed atom. Returns the run and its far end, or `None` as
/// the end when the run only loops back to `from`.
fn trace_bridge(
    mol: &Molecule,
    members: &BTreeSet<usize>,
    local: &BTreeMap<usize, Point>,
    from: usize,
    first: usize,
) -> (Vec<usize>, Option<usize>) {
    let mut prev: BTreeMap<usize, Option<usize>> = BTreeMap::new();
    prev.insert(first, None);
    let mut queue = VecDeque::from([first]);
    let mut end = None;
    let mut loop_back = None;

    'search: while let Some(x) = queue.pop_front() {
        for y in mol.neighbors(x) {
            if !members.contains(&y) {
                continue;
            }
            if local.contains_key(&y) {
                if y != from {
                    end = Some((x, y));
                    break 'search;
                }
                if x != first && loop_back.is_none() {
                    loop_back = Some(x);
                }
            } else if !prev.contains_key(&y) {
                prev.insert(y, Some(x));
                queue.push_back(y);
            }
        }
    }

    let (last, far) = match end {
        Some((x, y)) => (x, Some(y)),
        None => (loop_back.unwrap_or(first), None),
    };
    let mut run = vec![last];
    let mut cur = last;
    while let Some(&Some(p)) = prev.get(&cur) {
        run.push(p);
        cur = p;
    }
    run.reverse();
    (run, far)
}

/// Spread `run` between placed atoms `a` and `b`, bowed sideways by whichever
/// offset leaves the most room around the new atoms.
fn place_bridge(a: Point, b: Point, run: &[usize], local: &mut BTreeMap<usize, Point>) {
    let system_center = centroid(local.values().copied());
    let chord = b - a;
    let mid = (a + b) * 0.5;
    let mut normal = chord.perp().normalized().unwrap_or(Point::new(0.0, 1.0));
    if normal.dot(mid - system_center) < 0.0 {
        normal = normal * -1.0;
    }

    let steps = (run.len() + 1) as f64;
    let mut best: Option<(f64, Vec<Point>)> = None;
    for offset in BRIDGE_OFFSETS {
        let points: Vec<Point> = (1..=run.len())
            .map(|k| {
                let t = k as f64 / steps;
                a + chord * t + normal * (offset * (PI * t).sin())
            })
            .collect();
        let room = clearance(&points, local);
        if best.as_ref().map_or(true, |(c, _)| room > *c + 1e-9) {
            best = Some((room, points));
        }
    }
    if let Some((_, points)) = best {
        for (&atom, p) in run.iter().zip(points) {
            local.insert(atom, p);
        }
    }
}

/// Smallest distance from a new point to a placed atom or to another new point.
fn clearance(points: &[Point], local: &BTreeMap<usize, Point>) -> f64 {
    let mut best = f64::INFINITY;
    for (i, &p) in points.iter().enumerate() {
        for &q in local.values() {
            best = best.min(p.distance(q));
        }
        for &q in &points[i + 1..] {
            best = best.min(p.distance(q));
        }
    }
    best
}

/// Largest angular gap between sorted angles: (start angle, gap size).
fn largest_gap(sorted: &[f64]) -> (f64, f64) {
    let mut best = (sorted[0], 0.0);
    for i in 0..sorted.len() {
        let a = sorted[i];
        let b = if i + 1 < sorted.len() { sorted[i + 1] } else { sorted[0] + 2.0 * PI };
        let gap = b - a;
        if gap > best.1 + 1e-9 {
            best = (a, gap);
        }
    }
    best
}

/// Place the unplaced atoms of `cycle` relative to its already placed atoms.
/// Returns false, leaving `local` untouched, when the ring bridges the placed
/// atoms instead of sharing an edge or a single atom with them.
fn place_ring(cycle: &[usize], local: &mut BTreeMap<usize, Point>) -> bool {
    let n = cycle.len();
    let placed: Vec<bool> = cycle.iter().map(|a| local.contains_key(a)).collect();
    let count = placed.iter().filter(|&&p| p).count();
    if count == n {
        return true;
    }
    let system_center = centroid(local.values().copied());

    if count == 1 {
        // spiro
        let Some(i) = placed.iter().position(|&p| p) else {
            return false;
        };
        let p = local[&cycle[i]];
        let dir = (p - system_center).normalized().unwrap_or(Point::new(1.0, 0.0));
        let radius = polygon_radius(n, BOND_LENGTH);
        let center = p + dir * radius;
        let start = (p - center).angle();
        for k in 1..n {
            let atom = cycle[(i + k) % n];
            local.insert(atom, center + Point::polar(radius, start + 2.0 * PI * k as f64 / n as f64));
        }
        return true;
    }

    if count != 2 {
        return false;
    }
    let Some(i) = (0..n).find(|&i| placed[i] && placed[(i + 1) % n]) else {
        return false;
    };
    // fused on a shared edge
    let p = local[&cycle[i]];
    let q = local[&cycle[(i + 1) % n]];
    let edge = p.distance(q).max(1e-6);
    let mid = (p + q) * 0.5;
    let mut normal = (q - p).perp().normalized().unwrap_or(Point::new(0.0, 1.0));
    if normal.dot(mid - system_center) < 0.0 {
        normal = normal * -1.0;
    }
    let center = mid + normal * polygon_apothem(n, edge);
    let radius = polygon_radius(n, edge);
    let ang_q = (q - center).angle();
    let delta = wrap(ang_q - (p - center).angle());
    for k in 1..=n - 2 {
        let atom = cycle[(i + 1 + k) % n];
        local.insert(atom, center + Point::polar(radius, ang_q + delta * k as f64));
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::smiles::parse_smiles;

    fn depict(smiles: &str) -> (Molecule, Depiction) {
        let mol = parse_smiles(smiles).unwrap();
        let depiction = compute_2d_coords(&mol);
        (mol, depiction)
    }

    fn bond_lengths(mol: &Molecule, d: &Depiction) -> Vec<f64> {
        mol.bonds
            .iter()
            .map(|b| d.coords[b.begin].distance(d.coords[b.end]))
            .collect()
    }

    fn min_atom_distance(d: &Depiction) -> f64 {
        let mut best = f64::INFINITY;
        for i in 0..d.coords.len() {
            for j in i + 1..d.coords.len() {
                best = best.min(d.coords[i].distance(d.coords[j]));
            }
        }
        best
    }

    #[test]
    fn test_single_atom_at_origin() {
        let (_, d) = depict("C");
        assert_eq!(d.coords, vec![Point::ORIGIN]);
    }

    #[test]
    fn test_chain_has_unit_bonds_and_zigzag() {
        let (mol, d) = depict("CCCCCC");
        for len in bond_lengths(&mol, &d) {
            assert!((len - 1.0).abs() < 1e-9);
        }
        // 1-3 distance of a 120° zig-zag is sqrt(3)
        assert!((d.coords[0].distance(d.coords[2]) - 3f64.sqrt()).abs() < 1e-9);
        assert!((d.coords[1].distance(d.coords[3]) - 3f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_triple_bond_is_straight() {
        let (_, d) = depict("CC#CC");
        assert!((d.coords[0].distance(d.coords[3]) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_rings_are_regular() {
        let (mol, d) = depict("c1ccc2ccccc2c1");
        for len in bond_lengths(&mol, &d) {
            assert!((len - 1.0).abs() < 1e-6, "bond length {}", len);
        }
        let centers: Vec<Point> = (0..d.rings.ring_count()).map(|r| d.ring_center(r)).collect();
        assert!((centers[0].distance(centers[1]) - 3f64.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_layout_is_deterministic() {
        let smiles = "COc1ccc2c(c1)c(CC(=O)O)c(C)n2C(=O)c3ccc(Cl)cc3";
        let (_, a) = depict(smiles);
        let (_, b) = depict(smiles);
        assert_eq!(a.coords, b.coords);
    }

    #[test]
    fn test_substituted_rings_do_not_collapse() {
        for smiles in ["CC(=O)Oc1ccccc1C(=O)O", "CC(C)Cc1ccc(cc1)C(C)C(=O)O", "C1CCC2(CC1)CCCC2"] {
            let (_, d) = depict(smiles);
            assert!(min_atom_distance(&d) > 0.5, "{} has overlapping atoms", smiles);
        }
    }

    #[test]
    fn test_ortho_ester_and_acid_are_apart() {
        let (_, d) = depict("CC(=O)Oc1ccccc1C(=O)O");
        // acetyl carbonyl oxygen against the carboxyl carbon and its oxygens
        for other in [10, 11, 12] {
            assert!(d.coords[2].distance(d.coords[other]) > 0.5);
        }
    }

    #[test]
    fn test_builtin_structures_have_clear_atoms() {
        let catalog = Catalog::builtin();
        let all = catalog
            .targets()
            .iter()
            .chain(std::iter::once(catalog.resolve("unknown-xyz").record))
            .flat_map(|t| t.molecules.iter().map(|m| m.smiles.as_str()))
            .chain(catalog.alternates().iter().map(|a| a.smiles.as_str()));
        for smiles in all {
            let (_, d) = depict(smiles);
            let closest = min_atom_distance(&d);
            assert!(closest > 0.5, "{} has atoms {:.3} apart", smiles, closest);
        }
    }

    #[test]
    fn test_bridged_systems_keep_atoms_apart() {
        for smiles in [
            "C1CC2CCC1C2",
            "C12C3C4C1C5C2C3C45",
            "C1CC2CCC1CC2",
            "C1C2CC3CC1CC(C2)C3",
            "CN1C2CCC1CC(C2)OC(=O)C(CO)c3ccccc3",
        ] {
            let (mol, d) = depict(smiles);
            assert!(d.coords.iter().all(|p| p.x.is_finite() && p.y.is_finite()));
            let closest = min_atom_distance(&d);
            assert!(closest > 0.5, "{} has atoms {:.3} apart", smiles, closest);
            assert!(bond_lengths(&mol, &d).iter().all(|&len| len > 0.5));
        }
    }

    #[test]
    fn test_crowded_quaternary_chain_is_relieved() {
        let (_, d) = depict("CC(C)(C)C(C)(C)C(C)(C)C");
        assert!(min_atom_distance(&d) > 0.5);
    }

    #[test]
    fn test_components_are_side_by_side() {
        let (mol, d) = depict("c1ccccc1.CCO");
        let comps = mol.components();
        let max_first = comps[0].iter().map(|&a| d.coords[a].x).fold(f64::MIN, f64::max);
        let min_second = comps[1].iter().map(|&a| d.coords[a].x).fold(f64::MAX, f64::min);
        assert!(min_second - max_first >= COMPONENT_GAP - 1e-9);
    }

    #[test]
    fn test_every_atom_gets_finite_coordinates() {
        let (_, d) = depict("COc1cc2ncnc(Nc3ccc(F)c(Cl)c3)c2cc1OCCCN4CCOCC4");
        assert!(d.coords.iter().all(|p| p.x.is_finite() && p.y.is_finite()));
    }
}
