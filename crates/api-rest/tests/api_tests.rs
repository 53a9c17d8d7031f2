//! Integration tests for the CellCount REST API.

use api_rest::{router, AppState};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use cellcount_auth::AuthConfig;
use cellcount_core::{CoreConfig, Panel};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const USERNAME: &str = "lab_user";
const PASSWORD: &str = "Counting1!";

/// Creates a router over a temporary data directory.
fn create_test_app() -> (Router, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let core = Arc::new(CoreConfig::new(
        temp_dir.path().to_path_buf(),
        Panel::WhiteDifferential,
    ));
    let auth = Arc::new(
        AuthConfig::new(
            temp_dir.path().join("credentials.yaml"),
            chrono::Duration::hours(1),
        )
        .with_hash_cost(4),
    );
    (router(AppState::new(core, auth)), temp_dir)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Vec<u8>, Option<String>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec(), content_type)
}

async fn send_json(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let (status, bytes, _) = send(app, method, uri, token, body).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register_and_login(app: &Router) -> String {
    let (status, _) = send_json(
        app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "username": USERNAME,
            "email": "lab@example.com",
            "first_name": "Ada",
            "last_name": "Lovelace",
            "password": PASSWORD,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send_json(
        app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "username": USERNAME, "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

async fn count(app: &Router, token: &str, cell: &str, times: usize) {
    for _ in 0..times {
        let (status, _) = send_json(
            app,
            Method::POST,
            "/session/increment",
            Some(token),
            Some(json!({ "cell_type": cell })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}

async fn save(app: &Router, token: &str) -> Value {
    let (status, body) = send_json(app, Method::POST, "/session/save", Some(token), None).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["record"].clone()
}

#[tokio::test]
async fn test_health_is_public() {
    let (app, _dir) = create_test_app();
    let (status, body) = send_json(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn test_session_requires_token() {
    let (app, _dir) = create_test_app();

    let (status, body) = send_json(&app, Method::GET, "/session", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let unknown = "550e8400e29b41d4a716446655440000";
    let (status, _) = send_json(&app, Method::GET, "/session", Some(unknown), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let (app, _dir) = create_test_app();
    register_and_login(&app).await;

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "username": USERNAME,
            "email": "other@example.com",
            "first_name": "Grace",
            "last_name": "Hopper",
            "password": PASSWORD,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains(USERNAME));
}

#[tokio::test]
async fn test_weak_password_is_rejected() {
    let (app, _dir) = create_test_app();
    let (status, _) = send_json(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "username": USERNAME,
            "email": "lab@example.com",
            "first_name": "Ada",
            "last_name": "Lovelace",
            "password": "password",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let (app, _dir) = create_test_app();
    register_and_login(&app).await;

    let (status, _) = send_json(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "username": USERNAME, "password": "Wrong1!pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_count_undo_and_milestone() {
    let (app, _dir) = create_test_app();
    let token = register_and_login(&app).await;

    count(&app, &token, "lymphocytes", 99).await;
    let (status, body) = send_json(
        &app,
        Method::POST,
        "/session/increment",
        Some(&token),
        Some(json!({ "cell_type": "monocytes" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 100);
    assert_eq!(body["milestone"], 100);

    let (status, body) = send_json(&app, Method::POST, "/session/undo", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "undone");
    assert_eq!(body["cell_type"], "monocytes");
    assert_eq!(body["total"], 99);
}

#[tokio::test]
async fn test_cell_outside_panel_is_rejected() {
    let (app, _dir) = create_test_app();
    let token = register_and_login(&app).await;

    let (status, _) = send_json(
        &app,
        Method::POST,
        "/session/increment",
        Some(&token),
        Some(json!({ "cell_type": "neutrophils" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/session/panel",
        Some(&token),
        Some(json!({ "panel": "simplified" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["panel"], "simplified");
    count(&app, &token, "neutrophils", 1).await;
}

#[tokio::test]
async fn test_undo_with_empty_history_is_not_an_error() {
    let (app, _dir) = create_test_app();
    let token = register_and_login(&app).await;

    let (status, body) = send_json(&app, Method::POST, "/session/undo", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "nothing_to_undo");
}

#[tokio::test]
async fn test_morphology_update_is_all_or_nothing() {
    let (app, _dir) = create_test_app();
    let token = register_and_login(&app).await;

    let (status, _) = send_json(
        &app,
        Method::PUT,
        "/session/morphology",
        Some(&token),
        Some(json!({ "grades": { "target_cells": "moderate", "sparkles": "mild" } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send_json(&app, Method::GET, "/session/morphology", Some(&token), None).await;
    let target = body["features"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["feature"] == "target_cells")
        .unwrap();
    assert_eq!(target["severity"], "none");
}

#[tokio::test]
async fn test_save_list_and_delete() {
    let (app, _dir) = create_test_app();
    let token = register_and_login(&app).await;

    let (status, _) = send_json(
        &app,
        Method::PUT,
        "/session/patient",
        Some(&token),
        Some(json!({ "patient_id": "P-17", "gender": "female", "birth_date": "01.02.1980" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    send_json(
        &app,
        Method::PUT,
        "/session/morphology",
        Some(&token),
        Some(json!({ "grades": { "target_cells": "moderate" } })),
    )
    .await;
    count(&app, &token, "segmented_neutrophils", 3).await;
    count(&app, &token, "lymphocytes", 1).await;

    let first = save(&app, &token).await;
    assert_eq!(first["patient_id"], "P-17");
    assert_eq!(first["total"], 4);
    assert_eq!(first["counts"]["segmented_neutrophils"], 3);
    assert_eq!(first["abnormal_findings"][0]["feature"], "target_cells");

    let (_, body) = send_json(
        &app,
        Method::PUT,
        "/session/patient",
        Some(&token),
        Some(json!({ "patient_id": "P-18" })),
    )
    .await;
    assert_eq!(body["patient"]["patient_id"], "P-18");
    let second = save(&app, &token).await;

    let (status, body) = send_json(&app, Method::GET, "/records", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let records = body["records"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["id"], second["id"]);
    assert_eq!(records[1]["id"], first["id"]);

    let (_, body) = send_json(
        &app,
        Method::GET,
        "/records?patient_id=P-17",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body["records"].as_array().unwrap().len(), 1);

    let (_, body) = send_json(&app, Method::GET, "/records/patients", Some(&token), None).await;
    assert_eq!(body["patient_ids"], json!(["P-17", "P-18"]));

    let uri = format!("/records/{}", first["id"].as_str().unwrap());
    let (status, body) = send_json(&app, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], true);

    let (status, _) = send_json(&app, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) =
        send_json(&app, Method::DELETE, "/records/not-an-id", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_save_rejects_future_birth_date() {
    let (app, _dir) = create_test_app();
    let token = register_and_login(&app).await;

    send_json(
        &app,
        Method::PUT,
        "/session/patient",
        Some(&token),
        Some(json!({ "birth_date": "01.01.2999" })),
    )
    .await;
    let (status, _) = send_json(&app, Method::POST, "/session/save", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send_json(&app, Method::GET, "/records", Some(&token), None).await;
    assert!(body["records"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_csv_export_and_pdf_report() {
    let (app, _dir) = create_test_app();
    let token = register_and_login(&app).await;

    count(&app, &token, "eosinophils", 2).await;
    let record = save(&app, &token).await;

    let (status, bytes, content_type) =
        send(&app, Method::GET, "/records/export.csv", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/csv"));
    let csv = String::from_utf8(bytes).unwrap();
    assert_eq!(csv.lines().count(), 2);
    assert!(csv.lines().next().unwrap().contains("eosinophils"));

    let uri = format!("/records/{}/report.pdf", record["id"].as_str().unwrap());
    let (status, bytes, content_type) = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/pdf"));
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_records_are_private_per_user() {
    let (app, _dir) = create_test_app();
    let token = register_and_login(&app).await;
    save(&app, &token).await;

    send_json(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "username": "second_user",
            "email": "second@example.com",
            "first_name": "Grace",
            "last_name": "Hopper",
            "password": PASSWORD,
        })),
    )
    .await;
    let (_, body) = send_json(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "username": "second_user", "password": PASSWORD })),
    )
    .await;
    let other = body["token"].as_str().unwrap().to_string();

    let (_, body) = send_json(&app, Method::GET, "/records", Some(&other), None).await;
    assert!(body["records"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_logout_discards_token() {
    let (app, _dir) = create_test_app();
    let token = register_and_login(&app).await;

    let (status, body) = send_json(&app, Method::POST, "/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    let (status, _) = send_json(&app, Method::GET, "/session", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_reference_bands_lookup() {
    let (app, _dir) = create_test_app();

    let (status, body) = send_json(
        &app,
        Method::GET,
        "/reference-bands?age=30&gender=female&panel=white_differential",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["gender"], "female");
    let bands = body["bands"].as_array().unwrap();
    assert_eq!(bands.len(), 8);
    assert_eq!(bands[0]["cell_type"], "segmented_neutrophils");
    assert_eq!(bands[0]["low"], 42.0);
    assert_eq!(bands[0]["high"], 77.0);

    let (status, _) = send_json(
        &app,
        Method::GET,
        "/reference-bands?gender=robot",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
