//! Shared application state for the web server.

use std::sync::Arc;

use aushadhi_config::Settings;
use aushadhi_molecules::render::select_renderer;
use aushadhi_molecules::{Catalog, ImageSize, LookupService, StructureRenderer};

/// Shared state injected into every Axum handler. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub lookup: LookupService,
}

impl AppState {
    pub fn new(settings: Settings, renderer: Arc<dyn StructureRenderer>) -> Self {
        let lookup = LookupService::new(Arc::new(Catalog::builtin().clone()), renderer)
            .with_image_size(image_size(&settings))
            .with_timeout(settings.render.timeout());
        Self { settings, lookup }
    }

    /// Probe the configured renderer once and build the state around it.
    pub fn from_settings(settings: Settings) -> Self {
        let renderer = select_renderer(settings.render.enabled, image_size(&settings));
        Self::new(settings, renderer)
    }
}

fn image_size(settings: &Settings) -> ImageSize {
    ImageSize::new(settings.render.width, settings.render.height)
}

pub type SharedState = Arc<AppState>;
