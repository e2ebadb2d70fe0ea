use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::IntoResponse,
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

use aushadhi_common::AushadhiError;
use aushadhi_config::Settings;
use aushadhi_molecules::render::PNG_MAGIC;
use aushadhi_molecules::{DepictionRenderer, StructureRenderer, UnavailableRenderer};
use aushadhi_web::{error::ApiError, router::build_router, state::AppState};

fn app_with(renderer: Arc<dyn StructureRenderer>) -> Router {
    build_router(AppState::new(Settings::default(), renderer))
}

fn app() -> Router {
    app_with(Arc::new(DepictionRenderer::new()))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

async fn post(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

#[tokio::test]
async fn test_root_and_health() {
    let (status, body) = get(app(), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "AushadhiAI API is running" }));

    let (status, body) = get(app(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "healthy" }));
}

#[tokio::test]
async fn test_find_protein_returns_association() {
    let (status, body) = post(app(), "/find_protien/", json!({ "disease": "lung cancer" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{
            "disease_protien": "TP53 (Tumor Protein P53)",
            "protien_id": "1TUP",
            "percentage_contro": 0.68,
            "Associated_pathway": "p53 ras"
        }])
    );
}

#[tokio::test]
async fn test_fetch_chembl_data_for_pdb_code() {
    let (status, body) = post(app(), "/fetch_chambl_data/", json!({ "pdb_id_input": "1TUP" })).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0]["molecule"], "CC(=O)Oc1ccccc1C(=O)O");
    for row in rows {
        assert_eq!(row["molecule"], row["canonical_smiles"]);
        assert_eq!(row["disease_name"], "Cancer");
        assert_eq!(row["disease_pid"], "1TUP");
        assert!(row["disease_protien_name"].as_str().unwrap().contains("p53"));
        let png = STANDARD.decode(row["molecule_image"].as_str().unwrap()).unwrap();
        assert!(png.starts_with(PNG_MAGIC));
    }
}

#[tokio::test]
async fn test_fetch_chembl_data_unknown_target_uses_default() {
    let (status, body) = post(app(), "/fetch_chambl_data/", json!({ "pdb_id_input": "unknown-xyz" })).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r["disease_protien_name"] == "Target Protein"));
    assert!(rows.iter().all(|r| r["disease_pid"] == "unknown-xyz"));
}

#[tokio::test]
async fn test_missing_renderer_gives_null_images() {
    let app = app_with(Arc::new(UnavailableRenderer::new("disabled")));
    let (status, body) = post(app, "/fetch_chambl_data/", json!({ "pdb_id_input": "EGFR" })).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 4);
    for row in rows {
        assert!(row.as_object().unwrap().contains_key("molecule_image"));
        assert!(row["molecule_image"].is_null());
    }
}

#[tokio::test]
async fn test_alternate_molecules_echo_disease() {
    let (status, body) = post(
        app(),
        "/alternate_molecule_generator/",
        json!({ "disease": "breast cancer" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    let names: Vec<&str> = rows.iter().map(|r| r["molecule_name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Aspirin_Analog_1", "Compound_A", "Compound_B", "Benzene_Derivative"]);
    let pids: Vec<&str> = rows.iter().map(|r| r["disease_pid"].as_str().unwrap()).collect();
    assert_eq!(pids, vec!["1TUP", "2ABC", "3DEF", "4GHI"]);
    for row in rows {
        assert_eq!(row["disease_name"], "breast cancer");
        assert_eq!(row["molecule"], row["smile_string"]);
        assert_eq!(row["disease_protien_name"], "TP53");
        assert!(row["molecule_image"].is_string());
    }
}

#[tokio::test]
async fn test_evaluation_for_catalog_structure() {
    let smiles = "CC(=O)Oc1ccccc1C(=O)O";
    let (status, body) = post(app(), "/find_data_evaluation_report/", json!({ "smiles": smiles })).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["molecule"], smiles);
    assert_eq!(rows[0]["molecule_name"], "Aspirin analog");
    assert_eq!(rows[0]["ic50"], 0.35);
    assert_eq!(rows[0]["disease_pid"], "TP53");
    let report = rows[0]["data_analysis_report"].as_str().unwrap();
    assert!(report.contains("C9H8O4"));
    assert!(report.contains("180.16 g/mol"));
}

#[tokio::test]
async fn test_evaluation_for_unknown_structure_uses_placeholder() {
    let (status, body) = post(app(), "/find_data_evaluation_report/", json!({ "smiles": "CCO" })).await;
    assert_eq!(status, StatusCode::OK);
    let row = &body.as_array().unwrap()[0];
    assert_eq!(row["molecule"], "CCO");
    assert_eq!(row["molecule_name"], "Compound_A");
    assert_eq!(row["ic50"], 0.32);
    assert_eq!(row["disease_name"], "Cancer");
    assert_eq!(row["disease_pid"], "1TUP");
    assert_eq!(row["disease_protien_name"], "TP53");
}

#[tokio::test]
async fn test_evaluation_of_unparseable_structure_still_returns_record() {
    let (status, body) = post(app(), "/find_data_evaluation_report/", json!({ "smiles": "C1CC(" })).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["molecule"], "C1CC(");
    assert!(rows[0]["data_analysis_report"].as_str().unwrap().contains("could not be parsed"));
}

#[tokio::test]
async fn test_malformed_body_is_client_error() {
    let response = app()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/fetch_chambl_data/")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"wrong_field": 1}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_cors_preflight_allows_configured_origin() {
    let response = app()
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/fetch_chambl_data/")
                .header(header::ORIGIN, "http://localhost:3000")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:3000");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
}

#[tokio::test]
async fn test_cors_rejects_unlisted_origin() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, "http://evil.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test]
async fn test_api_error_body_has_detail() {
    let response = ApiError::from(AushadhiError::Image("boom".into())).into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body, json!({ "detail": "Image encoding error: boom" }));
}

#[tokio::test]
async fn test_unusable_image_size_degrades_at_startup() {
    let mut settings = Settings::default();
    settings.render.width = 0;
    assert!(settings.validate().is_err());

    let app = build_router(AppState::from_settings(settings));
    let (status, body) = post(app, "/fetch_chambl_data/", json!({ "pdb_id_input": "BRAF" })).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r["molecule_image"].is_null()));
}
