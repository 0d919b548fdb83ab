//! Attachment lifecycle tests.
//!
//! Drives records with images through the HTTP API and checks the blob store
//! and the record store never disagree in the wrong direction, including
//! when blob operations fail or stall.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use axum_test::multipart::MultipartForm;
use common::{build_test_app, build_test_app_with, image_part, test_config, FlakyBlobStore};
use keepsake::services::SweepMode;
use rstest::rstest;
use serde_json::{json, Value};

fn memory_form(title: &str, files: &[&str]) -> MultipartForm {
    let mut form = MultipartForm::new()
        .add_text("title", title)
        .add_text("description", "a few days away")
        .add_text("date", "2024-06-01")
        .add_text("sender", "alice");
    for file in files {
        form = form.add_part("images", image_part(file));
    }
    form
}

fn image_names(memory: &Value) -> Vec<String> {
    memory["images"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

// ============================================================================
// Create
// ============================================================================

#[rstest]
#[case(0)]
#[case(1)]
#[case(4)]
#[tokio::test]
async fn test_create_memory_stores_images_in_order(#[case] count: usize) {
    let app = build_test_app().await;
    let files: Vec<String> = (0..count).map(|i| format!("photo{}.png", i)).collect();
    let refs: Vec<&str> = files.iter().map(String::as_str).collect();

    let response = app
        .server
        .post("/api/memories")
        .multipart(memory_form("Trip", &refs))
        .await;

    response.assert_status_ok();
    let memory: Value = response.json();
    let images = image_names(&memory);
    assert_eq!(images.len(), count);
    assert_eq!(app.blobs.len().await, count);

    for (name, file) in images.iter().zip(&files) {
        assert!(name.ends_with(&format!("-{}", file)));
        let image = app.server.get(&format!("/uploads/{}", name)).await;
        image.assert_status_ok();
        assert_eq!(
            image.as_bytes().as_ref(),
            format!("image bytes of {}", file).as_bytes()
        );
    }
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(3)]
#[tokio::test]
async fn test_failed_put_rolls_back_batch(#[case] failing_put: usize) {
    let app = build_test_app().await;
    app.blobs.fail_put_number(failing_put);

    let response = app
        .server
        .post("/api/memories")
        .multipart(memory_form("Trip", &["a.png", "b.png", "c.png"]))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "BLOB_FAILURE");

    assert_eq!(app.blobs.len().await, 0);
    let listed: Value = app.server.get("/api/memories").await.json();
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn test_stalled_put_times_out_without_leftovers() {
    let mut config = test_config();
    config.operations.timeout = Duration::from_millis(100);
    let app = build_test_app_with(FlakyBlobStore::stalling(Duration::from_millis(500)), config).await;

    let response = app
        .server
        .post("/api/memories")
        .multipart(memory_form("Trip", &["a.png", "b.png"]))
        .await;

    response.assert_status(StatusCode::GATEWAY_TIMEOUT);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "TIMEOUT");

    assert_eq!(app.blobs.len().await, 0);
    let listed: Value = app.server.get("/api/memories").await.json();
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn test_failed_insert_leaves_blobs_for_reconciliation() {
    let app = build_test_app().await;
    app.state.close().await;

    let response = app
        .server
        .post("/api/memories")
        .multipart(memory_form("Trip", &["a.png", "b.png"]))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "STORE_FAILURE");
    assert_eq!(app.blobs.len().await, 2);
}

#[tokio::test]
async fn test_too_many_images_stores_nothing() {
    let mut config = test_config();
    config.storage.limits.max_files_per_memory = 2;
    let app = build_test_app_with(FlakyBlobStore::new(), config).await;

    let response = app
        .server
        .post("/api/memories")
        .multipart(memory_form("Trip", &["a.png", "b.png", "c.png"]))
        .await;

    response.assert_status_bad_request();
    assert_eq!(app.blobs.len().await, 0);
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_trip_memory_lifecycle() {
    let app = build_test_app().await;

    let created: Value = app
        .server
        .post("/api/memories")
        .multipart(memory_form("Trip", &["fileA.png", "fileB.png"]))
        .await
        .json();
    let id = created["_id"].as_str().unwrap().to_string();

    let listed: Value = app.server.get("/api/memories").await.json();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    let images = image_names(&listed[0]);
    assert!(images[0].ends_with("-fileA.png"));
    assert!(images[1].ends_with("-fileB.png"));

    let response = app.server.delete(&format!("/api/memories/{}", id)).await;
    response.assert_status_ok();
    response.assert_json(&json!({ "message": "Memory deleted successfully" }));

    for name in &images {
        app.server
            .get(&format!("/uploads/{}", name))
            .await
            .assert_status_not_found();
    }
    assert_eq!(app.blobs.len().await, 0);
    let listed: Value = app.server.get("/api/memories").await.json();
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn test_delete_memory_without_images() {
    let app = build_test_app().await;

    let created: Value = app
        .server
        .post("/api/memories")
        .multipart(memory_form("Quiet day", &[]))
        .await
        .json();
    let path = format!("/api/memories/{}", created["_id"].as_str().unwrap());

    app.server.delete(&path).await.assert_status_ok();
    app.server.delete(&path).await.assert_status_not_found();
}

#[tokio::test]
async fn test_delete_survives_blob_failures_and_sweep_cleans_up() {
    let app = build_test_app().await;

    let created: Value = app
        .server
        .post("/api/memories")
        .multipart(memory_form("Trip", &["a.png", "b.png"]))
        .await
        .json();
    let id = created["_id"].as_str().unwrap().to_string();

    app.blobs.set_fail_deletes(true);
    app.server
        .delete(&format!("/api/memories/{}", id))
        .await
        .assert_status_ok();
    let listed: Value = app.server.get("/api/memories").await.json();
    assert_eq!(listed, json!([]));
    assert_eq!(app.blobs.len().await, 2);

    app.blobs.set_fail_deletes(false);
    let report = app.state.reconcile.sweep(SweepMode::Repair).await.unwrap();
    assert_eq!(report.orphans.len(), 2);
    assert_eq!(report.deleted.len(), 2);
    assert!(report.dangling.is_empty());
    assert_eq!(app.blobs.len().await, 0);

    let status: Value = app.server.get("/status").await.json();
    assert_eq!(status["last_sweep"]["deleted"], 2);
}

// ============================================================================
// Backgrounds
// ============================================================================

#[tokio::test]
async fn test_replace_custom_background_releases_old_image() {
    let app = build_test_app().await;

    let form = MultipartForm::new()
        .add_text("backgroundType", "custom")
        .add_part("backgroundImage", image_part("first.png"));
    let created: Value = app
        .server
        .post("/api/background")
        .multipart(form)
        .await
        .json();
    let id = created["_id"].as_str().unwrap().to_string();
    let first = created["backgroundValue"].as_str().unwrap().to_string();

    let form = MultipartForm::new()
        .add_text("backgroundType", "custom")
        .add_part("backgroundImage", image_part("second.png"));
    let response = app
        .server
        .put(&format!("/api/background/{}", id))
        .multipart(form)
        .await;

    response.assert_status_ok();
    let replaced: Value = response.json();
    assert_eq!(replaced["_id"], id.as_str());
    let second = replaced["backgroundValue"].as_str().unwrap().to_string();
    assert!(second.ends_with("-second.png"));

    assert_eq!(app.blobs.names().await, vec![second.clone()]);
    app.server
        .get(&format!("/uploads/{}", first))
        .await
        .assert_status_not_found();

    let active: Value = app.server.get("/api/background").await.json();
    assert_eq!(active["backgroundValue"], second.as_str());
}

#[tokio::test]
async fn test_failed_replace_keeps_previous_background() {
    let app = build_test_app().await;

    let form = MultipartForm::new()
        .add_text("backgroundType", "custom")
        .add_part("backgroundImage", image_part("first.png"));
    let created: Value = app
        .server
        .post("/api/background")
        .multipart(form)
        .await
        .json();
    let id = created["_id"].as_str().unwrap().to_string();

    app.blobs.fail_put_number(1);
    let form = MultipartForm::new()
        .add_text("backgroundType", "custom")
        .add_part("backgroundImage", image_part("second.png"));
    app.server
        .put(&format!("/api/background/{}", id))
        .multipart(form)
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    let active: Value = app.server.get("/api/background").await.json();
    assert_eq!(active, created);
    assert_eq!(app.blobs.len().await, 1);
}

#[tokio::test]
async fn test_delete_custom_background_removes_image() {
    let app = build_test_app().await;

    let form = MultipartForm::new()
        .add_text("backgroundType", "custom")
        .add_part("backgroundImage", image_part("sky.png"));
    let created: Value = app
        .server
        .post("/api/background")
        .multipart(form)
        .await
        .json();

    let response = app
        .server
        .delete(&format!("/api/background/{}", created["_id"].as_str().unwrap()))
        .await;
    response.assert_status_ok();
    response.assert_json(&json!({ "message": "Background deleted successfully" }));

    assert_eq!(app.blobs.len().await, 0);
    app.server
        .get("/api/background")
        .await
        .assert_json(&json!({
            "backgroundType": "preset",
            "backgroundValue": "background1.jpg"
        }));
}
