use std::path::Path;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use pretty_assertions::assert_eq;
use rollup_fs::UploadStore;
use rollup_server::{build_router, AppState, ErrorResponse, UploadResponse};
use serde_json::Value;
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

const BOUNDARY: &str = "rollup-test-boundary";

fn app() -> (TempDir, Router) {
    let tmp = tempdir().expect("tempdir");
    let public = tmp.path().join("public");
    let store = UploadStore::new(public.join("uploads"));
    store.ensure_dir().expect("uploads dir");
    (tmp, build_router(AppState::new(store, public)))
}

fn multipart_body(field: &str, file_name: &str, content_type: &str, contents: &str) -> Body {
    Body::from(format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
         Content-Type: {content_type}\r\n\
         \r\n\
         {contents}\r\n\
         --{BOUNDARY}--\r\n"
    ))
}

fn upload_request(body: Body) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/v1/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(body)
        .expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

async fn body_bytes(resp: Response) -> Vec<u8> {
    to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body")
        .to_vec()
}

async fn error_body(resp: Response) -> ErrorResponse {
    serde_json::from_slice(&body_bytes(resp).await).expect("error json")
}

fn stored_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("read_dir")
        .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn upload_aggregates_and_serves_result() {
    let (tmp, app) = app();
    let csv = "department,sales\nElectronics,1000\nClothing,500\nElectronics,1500\nBooks,300\nClothing,200\n";

    let resp = app
        .clone()
        .oneshot(upload_request(multipart_body("file", "sales.csv", "text/csv", csv)))
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );

    let body: UploadResponse = serde_json::from_slice(&body_bytes(resp).await).expect("json");
    assert!(body.success);
    assert_eq!(body.message, "CSV file processed successfully");
    assert_eq!(body.total_departments, 3);
    assert_eq!(body.total_sales, 3500);
    assert!(
        body.download_url.starts_with("/public/uploads/result_")
            && body.download_url.ends_with(".csv"),
        "{}",
        body.download_url
    );
    assert!(chrono::DateTime::parse_from_rfc3339(&body.processed_at).is_ok());

    let files = stored_files(&tmp.path().join("public/uploads"));
    assert_eq!(files.len(), 2, "{files:?}");
    assert!(files.iter().any(|f| f.starts_with("upload_") && f.ends_with(".csv")));

    let resp = app
        .oneshot(get(&body.download_url))
        .await
        .expect("download");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
        Some("text/csv")
    );
    let text = String::from_utf8(body_bytes(resp).await).expect("utf8");
    let mut lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.remove(0), "Department Name,Total Number of Sales");
    lines.sort_unstable();
    assert_eq!(lines, vec!["Books,300", "Clothing,700", "Electronics,2500"]);
}

#[tokio::test]
async fn rejects_non_csv_extension() {
    let (_tmp, app) = app();
    let resp = app
        .oneshot(upload_request(multipart_body(
            "file",
            "sales.txt",
            "text/plain",
            "department,sales\nBooks,1\n",
        )))
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        error_body(resp).await,
        ErrorResponse {
            success: false,
            error: "only CSV files are allowed, got: .txt".to_string(),
            code: 400,
        }
    );
}

#[tokio::test]
async fn missing_file_field_is_bad_request() {
    let (_tmp, app) = app();
    let resp = app
        .oneshot(upload_request(multipart_body(
            "attachment",
            "sales.csv",
            "text/csv",
            "department,sales\nBooks,1\n",
        )))
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        error_body(resp).await.error,
        "No file uploaded or invalid file format"
    );
}

#[tokio::test]
async fn non_multipart_body_is_bad_request() {
    let (_tmp, app) = app();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/upload")
        .header(header::CONTENT_TYPE, "text/csv")
        .body(Body::from("department,sales\nBooks,1\n"))
        .expect("request");
    let resp = app.oneshot(req).await.expect("response");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_body(resp).await.code, 400);
}

#[tokio::test]
async fn core_failure_is_reported_with_its_message() {
    let (tmp, app) = app();
    let resp = app
        .oneshot(upload_request(multipart_body(
            "file",
            "people.csv",
            "text/csv",
            "name,age\nJohn,25\n",
        )))
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        error_body(resp).await,
        ErrorResponse {
            success: false,
            error: "Failed to process CSV file: department column not found in CSV header"
                .to_string(),
            code: 500,
        }
    );

    // The upload is kept; no result file is produced.
    let files = stored_files(&tmp.path().join("public/uploads"));
    assert_eq!(files.len(), 1, "{files:?}");
    assert!(files[0].starts_with("upload_"));
}

#[tokio::test]
async fn header_only_upload_is_empty_result() {
    let (_tmp, app) = app();
    let resp = app
        .oneshot(upload_request(multipart_body(
            "file",
            "sales.csv",
            "text/csv",
            "department,sales\n",
        )))
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        error_body(resp).await.error,
        "Failed to process CSV file: no valid data rows found in CSV file"
    );
}

#[tokio::test]
async fn health_reports_ok() {
    let (_tmp, app) = app();
    let resp = app.oneshot(get("/api/v1/health")).await.expect("response");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&body_bytes(resp).await).expect("json");
    assert_eq!(body, serde_json::json!({"status": "ok"}));
}

#[tokio::test]
async fn preflight_short_circuits_with_cors_headers() {
    let (_tmp, app) = app();
    let req = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/v1/upload")
        .body(Body::empty())
        .expect("request");
    let resp = app.oneshot(req).await.expect("response");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let header = |name: &str| {
        resp.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    assert_eq!(header("access-control-allow-origin").as_deref(), Some("*"));
    assert_eq!(
        header("access-control-allow-methods").as_deref(),
        Some("GET, POST, OPTIONS")
    );
    assert_eq!(
        header("access-control-allow-headers").as_deref(),
        Some("Content-Type")
    );
}

#[tokio::test]
async fn public_files_refuse_traversal_and_missing_files() {
    let (tmp, app) = app();
    std::fs::write(tmp.path().join("secret.txt"), "nope").expect("seed");

    let resp = app
        .clone()
        .oneshot(get("/public/../secret.txt"))
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app
        .oneshot(get("/public/uploads/result_missing.csv"))
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
