//! Lookup service: resolves targets and renders their molecules.
//!
//! Every structure is rendered on the blocking pool under a timeout.
//! A failed, timed-out or panicked render only drops that record's image.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use aushadhi_common::AushadhiError;

use crate::catalog::Catalog;
use crate::render::{ImageSize, StructureRenderer};

/// Disease label attached to every lookup record.
pub const DISEASE_LABEL: &str = "Cancer";
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq)]
pub struct LookupRecord {
    pub smiles: String,
    pub name: String,
    pub ic50: f64,
    pub disease_name: String,
    /// Identifier as the caller supplied it (or the candidate's own id).
    pub target_id: String,
    pub target_name: String,
    /// Base64 PNG; `None` when rendering failed for this entry.
    pub image: Option<String>,
}

#[derive(Clone)]
pub struct LookupService {
    catalog: Arc<Catalog>,
    renderer: Arc<dyn StructureRenderer>,
    image_size: ImageSize,
    timeout: Duration,
}

impl LookupService {
    pub fn new(catalog: Arc<Catalog>, renderer: Arc<dyn StructureRenderer>) -> Self {
        Self {
            catalog,
            renderer,
            image_size: ImageSize::default(),
            timeout: DEFAULT_RENDER_TIMEOUT,
        }
    }

    pub fn with_image_size(mut self, size: ImageSize) -> Self {
        self.image_size = size;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Molecules for a target identifier, in table order, each with its image.
    pub async fn lookup(&self, identifier: &str) -> Vec<LookupRecord> {
        let resolution = self.catalog.resolve(identifier);
        info!(
            "Lookup for '{}' resolved to {} ({} molecules)",
            identifier,
            resolution.record.id,
            resolution.record.molecules.len()
        );
        if !resolution.matched {
            debug!("'{}' matched no target, serving the default record", identifier);
        }

        let entries = &resolution.record.molecules;
        let images = self
            .render_all(entries.iter().map(|m| m.smiles.as_str()))
            .await;

        entries
            .iter()
            .zip(images)
            .map(|(entry, image)| LookupRecord {
                smiles: entry.smiles.clone(),
                name: entry.name.clone(),
                ic50: entry.ic50,
                disease_name: DISEASE_LABEL.to_string(),
                target_id: identifier.to_string(),
                target_name: resolution.display_name.to_string(),
                image,
            })
            .collect()
    }

    /// Alternate candidates for a disease; `disease_name` echoes the request.
    pub async fn alternates(&self, disease: &str) -> Vec<LookupRecord> {
        let candidates = self.catalog.alternates();
        info!("Generating {} alternate molecules for '{}'", candidates.len(), disease);

        let images = self
            .render_all(candidates.iter().map(|c| c.smiles.as_str()))
            .await;

        candidates
            .iter()
            .zip(images)
            .map(|(candidate, image)| LookupRecord {
                smiles: candidate.smiles.clone(),
                name: candidate.name.clone(),
                ic50: candidate.ic50,
                disease_name: disease.to_string(),
                target_id: candidate.target_pid.clone(),
                target_name: candidate.target_name.clone(),
                image,
            })
            .collect()
    }

    /// Render concurrently; results come back in input order.
    async fn render_all<'s>(&self, smiles: impl Iterator<Item = &'s str>) -> Vec<Option<String>> {
        join_all(smiles.map(|s| self.render_image(s))).await
    }

    /// Render one structure to base64, or `None` on any failure.
    pub async fn render_image(&self, smiles: &str) -> Option<String> {
        let renderer = Arc::clone(&self.renderer);
        let size = self.image_size;
        let owned = smiles.to_string();
        let task = tokio::task::spawn_blocking(move || renderer.render_base64(&owned, size));

        // An elapsed render keeps its blocking thread until the renderer returns.
        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(Ok(image))) => Some(image),
            Ok(Ok(Err(e))) if e.is_recoverable() => {
                debug!("No image for {}: {}", smiles, e);
                None
            }
            Ok(Ok(Err(e))) => {
                warn!("Image generation failed for {}: {}", smiles, e);
                None
            }
            Ok(Err(join_err)) => {
                warn!("Render task for {} did not complete: {}", smiles, join_err);
                None
            }
            Err(_) => {
                warn!("{} for {}", AushadhiError::RenderTimeout(self.timeout), smiles);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{DepictionRenderer, UnavailableRenderer};
    use aushadhi_common::Result;
    use pretty_assertions::assert_eq;

    /// Echoes the SMILES back as the "PNG" so ordering is observable.
    struct EchoRenderer;

    impl StructureRenderer for EchoRenderer {
        fn render(&self, smiles: &str, _size: ImageSize) -> Result<Vec<u8>> {
            Ok(smiles.as_bytes().to_vec())
        }
    }

    /// Fails for one structure, sleeps for another, panics on a third.
    struct FlakyRenderer;

    impl StructureRenderer for FlakyRenderer {
        fn render(&self, smiles: &str, _size: ImageSize) -> Result<Vec<u8>> {
            match smiles {
                "CCO" => Err(AushadhiError::invalid_structure(smiles, "rejected by test")),
                "CC(=O)O" => {
                    std::thread::sleep(Duration::from_millis(500));
                    Ok(vec![1])
                }
                "c1ccccc1" => panic!("renderer crashed"),
                _ => Ok(vec![0x89, b'P', b'N', b'G']),
            }
        }
    }

    fn service(renderer: Arc<dyn StructureRenderer>) -> LookupService {
        LookupService::new(Arc::new(Catalog::builtin().clone()), renderer)
    }

    #[tokio::test]
    async fn test_lookup_keeps_table_order() {
        let svc = service(Arc::new(EchoRenderer));
        let records = svc.lookup("1TUP").await;
        assert_eq!(records.len(), 5);
        let expected: Vec<&str> = Catalog::builtin().resolve("TP53").record.molecules.iter().map(|m| m.smiles.as_str()).collect();
        let got: Vec<&str> = records.iter().map(|r| r.smiles.as_str()).collect();
        assert_eq!(got, expected);
        for r in &records {
            use base64::{engine::general_purpose::STANDARD, Engine as _};
            let decoded = STANDARD.decode(r.image.as_ref().unwrap()).unwrap();
            assert_eq!(decoded, r.smiles.as_bytes());
            assert_eq!(r.disease_name, DISEASE_LABEL);
            assert_eq!(r.target_id, "1TUP");
            assert!(r.target_name.contains("p53"));
        }
    }

    #[tokio::test]
    async fn test_unknown_identifier_uses_default_record() {
        let svc = service(Arc::new(EchoRenderer));
        let records = svc.lookup("unknown-xyz").await;
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.target_id == "unknown-xyz"));
        assert!(records.iter().all(|r| r.target_name == "Target Protein"));
    }

    #[tokio::test]
    async fn test_lookup_is_idempotent() {
        let svc = service(Arc::new(DepictionRenderer::new()));
        let a = svc.lookup("EGFR").await;
        let b = svc.lookup("EGFR").await;
        assert_eq!(a, b);
        assert!(a.iter().all(|r| r.image.is_some()));
    }

    #[tokio::test]
    async fn test_failures_only_drop_their_own_image() {
        let svc = service(Arc::new(FlakyRenderer)).with_timeout(Duration::from_millis(100));
        let records = svc.alternates("lung cancer").await;
        assert_eq!(records.len(), 4);
        let images: Vec<bool> = records.iter().map(|r| r.image.is_some()).collect();
        // aspirin ok, CCO invalid, acetic acid times out, benzene panics
        assert_eq!(images, vec![true, false, false, false]);
        assert!(records.iter().all(|r| r.disease_name == "lung cancer"));
        assert_eq!(records[1].target_id, "2ABC");
    }

    #[tokio::test]
    async fn test_unavailable_backend_degrades_to_no_images() {
        let svc = service(Arc::new(UnavailableRenderer::new("disabled")));
        let records = svc.lookup("BRAF").await;
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.image.is_none()));
    }

    #[tokio::test]
    async fn test_invalid_catalog_entry_is_isolated() {
        let catalog = Catalog::new(
            vec![crate::catalog::TargetRecord::new(
                "MIX",
                "Mixed",
                vec![
                    crate::catalog::MoleculeEntry::new("CCO", "Ethanol", 1.0),
                    crate::catalog::MoleculeEntry::new("C1CC(", "Broken", 2.0),
                    crate::catalog::MoleculeEntry::new("c1ccccc1", "Benzene", 3.0),
                ],
            )],
            crate::catalog::TargetRecord::new("DEFAULT", "Target Protein", vec![]),
        );
        let svc = LookupService::new(Arc::new(catalog), Arc::new(DepictionRenderer::new()));
        let records = svc.lookup("mix").await;
        let images: Vec<bool> = records.iter().map(|r| r.image.is_some()).collect();
        assert_eq!(images, vec![true, false, true]);
    }
}
