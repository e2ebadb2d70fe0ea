//! AushadhiAI Molecules - structure rendering and target lookup.
//!
//! 1. Parsing SMILES into a molecular graph
//! 2. Laying the graph out as a 2D depiction
//! 3. Rasterizing the depiction to PNG / base64
//! 4. Resolving free-form target identifiers against the static catalog
//! 5. Assembling per-molecule lookup records with isolated render failures

pub mod element;
pub mod molecule;
pub mod smiles;
pub mod rings;
pub mod layout;
pub mod render;
pub mod properties;
pub mod catalog;
pub mod lookup;

pub use aushadhi_common::{AushadhiError, Result};
pub use catalog::{Catalog, MoleculeEntry, Resolution, TargetRecord};
pub use lookup::{LookupRecord, LookupService};
pub use molecule::Molecule;
pub use properties::Descriptors;
pub use render::{DepictionRenderer, ImageSize, StructureRenderer, UnavailableRenderer};
pub use smiles::parse_smiles;
