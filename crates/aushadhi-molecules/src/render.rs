//! Structure rendering: SMILES -> 2D depiction -> PNG.
//!
//! Drawing uses plotters' bitmap backend over an in-memory RGB buffer and
//! never draws text, so no system fonts are needed. PNG encoding goes
//! through `image`.

use std::io::Cursor;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ImageFormat, RgbImage};
use plotters::prelude::*;
use tracing::{debug, warn};

use aushadhi_common::{AushadhiError, Result};

use crate::element;
use crate::layout::{compute_2d_coords, Depiction, Point};
use crate::molecule::{BondOrder, Molecule};
use crate::smiles::parse_smiles;

const MAX_DIMENSION: u32 = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn validate(self) -> Result<Self> {
        if self.width == 0 || self.height == 0 || self.width > MAX_DIMENSION || self.height > MAX_DIMENSION {
            return Err(AushadhiError::Image(format!(
                "unsupported image size {}x{}",
                self.width, self.height
            )));
        }
        Ok(self)
    }
}

impl Default for ImageSize {
    fn default() -> Self {
        Self::new(300, 300)
    }
}

/// Turns a structure string into encoded image bytes.
pub trait StructureRenderer: Send + Sync {
    fn render(&self, smiles: &str, size: ImageSize) -> Result<Vec<u8>>;

    /// PNG bytes as standard padded base64.
    fn render_base64(&self, smiles: &str, size: ImageSize) -> Result<String> {
        self.render(smiles, size).map(|png| STANDARD.encode(png))
    }
}

/// Renderer backed by the built-in SMILES parser and 2D layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct DepictionRenderer;

impl DepictionRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl StructureRenderer for DepictionRenderer {
    fn render(&self, smiles: &str, size: ImageSize) -> Result<Vec<u8>> {
        let size = size.validate()?;
        let mol = parse_smiles(smiles)
            .map_err(|e| AushadhiError::invalid_structure(smiles, e.to_string()))?;
        let depiction = compute_2d_coords(&mol);
        let pixels = rasterize(&mol, &depiction, size)?;
        encode_png(pixels, size)
    }
}

/// Stand-in used when no rendering backend works; every call fails
/// recoverably so callers drop the image and keep the record.
#[derive(Debug, Clone)]
pub struct UnavailableRenderer {
    reason: String,
}

impl UnavailableRenderer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

impl StructureRenderer for UnavailableRenderer {
    fn render(&self, _smiles: &str, _size: ImageSize) -> Result<Vec<u8>> {
        Err(AushadhiError::RenderBackendUnavailable(self.reason.clone()))
    }
}

/// Render a small known structure at the serving size to check the backend
/// works here.
pub fn probe(renderer: &dyn StructureRenderer, size: ImageSize) -> Result<()> {
    let png = renderer.render("c1ccccc1O", size)?;
    if !png.starts_with(PNG_MAGIC) {
        return Err(AushadhiError::Image("probe produced a non-PNG payload".into()));
    }
    Ok(())
}

/// Pick the renderer for the process: the depiction backend when enabled
/// and working, otherwise a no-image renderer. Problems are logged once here.
pub fn select_renderer(enabled: bool, size: ImageSize) -> Arc<dyn StructureRenderer> {
    if !enabled {
        warn!("Structure rendering disabled by configuration; images will be omitted");
        return Arc::new(UnavailableRenderer::new("rendering disabled by configuration"));
    }
    let renderer = DepictionRenderer::new();
    match probe(&renderer, size) {
        Ok(()) => {
            debug!("Structure renderer probe succeeded");
            Arc::new(renderer)
        }
        Err(e) => {
            warn!("Structure renderer unavailable, images will be omitted: {}", e);
            Arc::new(UnavailableRenderer::new(e.to_string()))
        }
    }
}

pub const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

fn encode_png(pixels: Vec<u8>, size: ImageSize) -> Result<Vec<u8>> {
    let img = RgbImage::from_raw(size.width, size.height, pixels)
        .ok_or_else(|| AushadhiError::Image("pixel buffer does not match image size".into()))?;
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)
        .map_err(|e| AushadhiError::Image(e.to_string()))?;
    Ok(out.into_inner())
}

fn draw_err(e: impl std::fmt::Display) -> AushadhiError {
    AushadhiError::Image(e.to_string())
}

/// Maps layout coordinates (bond units, y up) onto pixels (y down).
struct Viewport {
    center: Point,
    scale: f64,
    half_w: f64,
    half_h: f64,
}

impl Viewport {
    fn fit(depiction: &Depiction, size: ImageSize) -> Self {
        let (w, h) = (size.width as f64, size.height as f64);
        let margin = (w.min(h) * 0.12).max(4.0);
        let (min, max) = depiction.bounds();
        let span_x = (max.x - min.x).max(1e-6);
        let span_y = (max.y - min.y).max(1e-6);
        let fit = ((w - 2.0 * margin) / span_x).min((h - 2.0 * margin) / span_y);
        // small molecules would otherwise fill the whole canvas
        let scale = fit.min(w.min(h) / 4.0).max(1.0);
        Self {
            center: (min + max) * 0.5,
            scale,
            half_w: w / 2.0,
            half_h: h / 2.0,
        }
    }

    fn map(&self, p: Point) -> Point {
        Point::new(
            self.half_w + (p.x - self.center.x) * self.scale,
            self.half_h - (p.y - self.center.y) * self.scale,
        )
    }
}

fn px(p: Point) -> (i32, i32) {
    (p.x.round() as i32, p.y.round() as i32)
}

fn rasterize(mol: &Molecule, depiction: &Depiction, size: ImageSize) -> Result<Vec<u8>> {
    let mut buffer = vec![0u8; size.width as usize * size.height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (size.width, size.height)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let view = Viewport::fit(depiction, size);
        let bond_px = view.scale;
        let ink = RGBColor(40, 40, 40);
        let stroke = ink.stroke_width(((bond_px / 25.0).round() as u32).max(1));
        let pos: Vec<Point> = depiction.coords.iter().map(|&p| view.map(p)).collect();

        for (bi, bond) in mol.bonds.iter().enumerate() {
            for (p, q) in bond_strokes(depiction, &pos, bi, (bond.begin, bond.end), bond.order, bond_px) {
                root.draw(&PathElement::new(vec![px(p), px(q)], stroke))
                    .map_err(draw_err)?;
            }
        }

        for (ri, ring) in depiction.rings.rings.iter().enumerate() {
            if !ring.iter().all(|&a| mol.atoms[a].aromatic) {
                continue;
            }
            let center = view.map(depiction.ring_center(ri));
            let apothem = ring
                .iter()
                .enumerate()
                .map(|(i, &a)| {
                    let next = ring[(i + 1) % ring.len()];
                    ((pos[a] + pos[next]) * 0.5).distance(center)
                })
                .fold(f64::INFINITY, f64::min);
            let radius = (apothem * 0.6).round() as i32;
            if radius > 1 {
                root.draw(&Circle::new(px(center), radius, stroke))
                    .map_err(draw_err)?;
            }
        }

        let halo = ((bond_px * 0.28).round() as i32).max(2);
        let disc = ((bond_px * 0.2).round() as i32).max(2);
        for (i, atom) in mol.atoms.iter().enumerate() {
            if !atom.is_heteroatom() {
                continue;
            }
            let (r, g, b) = element::cpk_color(atom.element);
            root.draw(&Circle::new(px(pos[i]), halo, WHITE.filled()))
                .map_err(draw_err)?;
            root.draw(&Circle::new(px(pos[i]), disc, RGBColor(r, g, b).filled()))
                .map_err(draw_err)?;
        }

        root.present().map_err(draw_err)?;
    }
    Ok(buffer)
}

/// Line segments for one bond, in pixel space.
fn bond_strokes(
    depiction: &Depiction,
    pos: &[Point],
    bond: usize,
    (ia, ib): (usize, usize),
    order: BondOrder,
    bond_px: f64,
) -> Vec<(Point, Point)> {
    let (a, b) = (pos[ia], pos[ib]);
    let Some(normal) = (b - a).perp().normalized() else {
        return Vec::new();
    };
    let gap = bond_px * 0.16;
    match order {
        BondOrder::Single | BondOrder::Aromatic => vec![(a, b)],
        BondOrder::Double => match ring_side(depiction, pos, bond, (ia, ib), normal) {
            Some(side) => {
                let shift = normal * (gap * side);
                let inset = (b - a) * 0.15;
                vec![(a, b), (a + inset + shift, b - inset + shift)]
            }
            None => {
                let shift = normal * (gap / 2.0);
                vec![(a + shift, b + shift), (a - shift, b - shift)]
            }
        },
        BondOrder::Triple | BondOrder::Quadruple => {
            let shift = normal * gap;
            vec![(a, b), (a + shift, b + shift), (a - shift, b - shift)]
        }
    }
}

/// +1 / -1 for the side of `normal` facing the centre of a ring holding the bond.
fn ring_side(depiction: &Depiction, pos: &[Point], bond: usize, (ia, ib): (usize, usize), normal: Point) -> Option<f64> {
    if !depiction.rings.ring_bond[bond] {
        return None;
    }
    let ring = depiction.rings.atom_rings[ia]
        .iter()
        .find(|r| depiction.rings.atom_rings[ib].contains(r))?;
    let center = centroid_px(&depiction.rings.rings[*ring], pos);
    let mid = (pos[ia] + pos[ib]) * 0.5;
    Some(if normal.dot(center - mid) >= 0.0 { 1.0 } else { -1.0 })
}

fn centroid_px(ring: &[usize], pos: &[Point]) -> Point {
    let sum = ring.iter().fold(Point::ORIGIN, |s, &a| s + pos[a]);
    sum * (1.0 / ring.len().max(1) as f64)
}
