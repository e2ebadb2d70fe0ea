//! Disease -> target protein associations.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct ProteinRequest {
    pub disease: String,
}

#[derive(Debug, Serialize)]
pub struct ProteinResponse {
    pub disease_protien: String,
    pub protien_id: String,
    pub percentage_contro: f64,
    #[serde(rename = "Associated_pathway")]
    pub associated_pathway: String,
}

/// POST /find_protien/
pub async fn find_protein(
    State(state): State<SharedState>,
    Json(request): Json<ProteinRequest>,
) -> Result<Json<Vec<ProteinResponse>>, ApiError> {
    info!("Finding proteins for disease: {}", request.disease);

    let rows = state
        .lookup
        .catalog()
        .associations()
        .iter()
        .map(|a| ProteinResponse {
            disease_protien: a.protein.clone(),
            protien_id: a.protein_id.clone(),
            percentage_contro: a.contribution,
            associated_pathway: a.pathway.clone(),
        })
        .collect();

    Ok(Json(rows))
}
