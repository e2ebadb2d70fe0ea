//! Alternate molecule candidates for a disease.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct MoleculeRequest {
    pub disease: String,
}

#[derive(Debug, Serialize)]
pub struct MoleculeResponse {
    pub molecule: String,
    pub molecule_name: String,
    pub smile_string: String,
    pub ic50: f64,
    pub disease_name: String,
    pub disease_pid: String,
    pub disease_protien_name: String,
    pub molecule_image: Option<String>,
}

/// POST /alternate_molecule_generator/
pub async fn generate_alternate_molecules(
    State(state): State<SharedState>,
    Json(request): Json<MoleculeRequest>,
) -> Result<Json<Vec<MoleculeResponse>>, ApiError> {
    let rows = state
        .lookup
        .alternates(&request.disease)
        .await
        .into_iter()
        .map(|r| MoleculeResponse {
            molecule: r.smiles.clone(),
            molecule_name: r.name,
            smile_string: r.smiles,
            ic50: r.ic50,
            disease_name: r.disease_name,
            disease_pid: r.target_id,
            disease_protien_name: r.target_name,
            molecule_image: r.image,
        })
        .collect();

    Ok(Json(rows))
}
