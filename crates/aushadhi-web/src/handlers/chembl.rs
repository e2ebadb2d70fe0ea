//! Target identifier -> bioactive molecules with structure images.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct ChemblRequest {
    pub pdb_id_input: String,
}

#[derive(Debug, Serialize)]
pub struct ChemblResponse {
    pub molecule: String,
    pub canonical_smiles: String,
    pub ic50: f64,
    pub disease_name: String,
    pub disease_pid: String,
    pub disease_protien_name: String,
    pub molecule_image: Option<String>,
}

/// POST /fetch_chambl_data/
pub async fn fetch_chembl_data(
    State(state): State<SharedState>,
    Json(request): Json<ChemblRequest>,
) -> Result<Json<Vec<ChemblResponse>>, ApiError> {
    let records = state.lookup.lookup(&request.pdb_id_input).await;
    let with_images = records.iter().filter(|r| r.image.is_some()).count();
    info!(
        "Returning {} molecules for '{}' ({} with images)",
        records.len(),
        request.pdb_id_input,
        with_images
    );

    let rows = records
        .into_iter()
        .map(|r| ChemblResponse {
            molecule: r.smiles.clone(),
            canonical_smiles: r.smiles,
            ic50: r.ic50,
            disease_name: r.disease_name,
            disease_pid: r.target_id,
            disease_protien_name: r.target_name,
            molecule_image: r.image,
        })
        .collect();

    Ok(Json(rows))
}
