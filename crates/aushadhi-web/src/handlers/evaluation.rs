//! Structure evaluation: descriptors and a drug-likeness report.

use std::time::Duration;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use aushadhi_molecules::lookup::DISEASE_LABEL;
use aushadhi_molecules::parse_smiles;
use aushadhi_molecules::properties::{analysis_report, unparseable_report, Descriptors};

use crate::error::ApiError;
use crate::state::SharedState;

// Used when the structure is not in the catalog.
const PLACEHOLDER_NAME: &str = "Compound_A";
const PLACEHOLDER_IC50: f64 = 0.32;
const PLACEHOLDER_PID: &str = "1TUP";
const PLACEHOLDER_PROTEIN: &str = "TP53";

#[derive(Debug, Deserialize)]
pub struct EvaluationRequest {
    pub smiles: String,
}

#[derive(Debug, Serialize)]
pub struct EvaluationResponse {
    pub molecule: String,
    pub molecule_name: String,
    pub ic50: f64,
    pub disease_name: String,
    pub disease_pid: String,
    pub disease_protien_name: String,
    pub data_analysis_report: String,
}

/// POST /find_data_evaluation_report/
pub async fn find_evaluation_report(
    State(state): State<SharedState>,
    Json(request): Json<EvaluationRequest>,
) -> Result<Json<Vec<EvaluationResponse>>, ApiError> {
    info!("Evaluating molecule: {}", request.smiles);

    let smiles = request.smiles.clone();
    let deadline = state.settings.render.timeout();
    let report = blocking_with_deadline(deadline, move || match parse_smiles(&smiles) {
        Ok(mol) => analysis_report(&smiles, &Descriptors::compute(&mol)),
        Err(e) => {
            warn!("Cannot evaluate {}: {}", smiles, e);
            unparseable_report(&smiles, &e.to_string())
        }
    })
    .await?;

    let (name, ic50, pid, protein) = match state.lookup.catalog().find_by_smiles(&request.smiles) {
        Some((target, entry)) => (entry.name.clone(), entry.ic50, target.id.clone(), target.name.clone()),
        None => (
            PLACEHOLDER_NAME.to_string(),
            PLACEHOLDER_IC50,
            PLACEHOLDER_PID.to_string(),
            PLACEHOLDER_PROTEIN.to_string(),
        ),
    };

    Ok(Json(vec![EvaluationResponse {
        molecule: request.smiles,
        molecule_name: name,
        ic50,
        disease_name: DISEASE_LABEL.to_string(),
        disease_pid: pid,
        disease_protien_name: protein,
        data_analysis_report: report,
    }]))
}

/// Run `work` on the blocking pool, giving up after `deadline`.
///
/// Tokio cannot cancel blocking work: on timeout the thread runs `work` to
/// completion and its result is dropped.
async fn blocking_with_deadline<T, F>(deadline: Duration, work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let task = tokio::task::spawn_blocking(work);
    match tokio::time::timeout(deadline, task).await {
        Ok(joined) => Ok(joined?),
        Err(_) => {
            warn!("Evaluation abandoned after {:?}", deadline);
            Err(ApiError::Timeout(deadline))
        }
    }
}
