//! Axum router — maps all URL paths to handlers.

use std::sync::Arc;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use aushadhi_config::CorsConfig;

use crate::handlers::{
    chembl::fetch_chembl_data,
    evaluation::find_evaluation_report,
    molecules::generate_alternate_molecules,
    protein::find_protein,
    system::{health_check, root},
};
use crate::state::{AppState, SharedState};

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.settings.cors);
    let shared: SharedState = Arc::new(state);

    Router::new()
        .route("/",       get(root))
        .route("/health", get(health_check))

        // API endpoints
        .route("/find_protien/",                 post(find_protein))
        .route("/fetch_chambl_data/",            post(fetch_chembl_data))
        .route("/alternate_molecule_generator/", post(generate_alternate_molecules))
        .route("/find_data_evaluation_report/",  post(find_evaluation_report))

        // Middleware
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

/// Configured origins with credentials; methods and headers mirror the request.
/// A `*` entry mirrors any origin, since credentials forbid a literal wildcard.
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origin = if config.allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::mirror_request()
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin: {}", o);
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}
