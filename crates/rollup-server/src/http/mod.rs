use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, Request, StatusCode};
use axum::middleware::{from_fn, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::AppState;

mod public;
mod response;
mod upload;

pub use response::{ErrorResponse, HealthResponse, UploadResponse};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/upload", post(upload::upload_csv_handler))
        .route("/api/v1/health", get(health_handler))
        .route("/public/*path", get(public::public_file_handler))
        // Uploads are not size-limited.
        .layer(DefaultBodyLimit::disable())
        .layer(from_fn(cors_middleware))
        .with_state(state)
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

fn insert_cors_headers(resp: &mut Response) {
    let headers = resp.headers_mut();
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("Content-Type"),
    );
}

async fn cors_middleware(req: Request<Body>, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        let mut resp = StatusCode::NO_CONTENT.into_response();
        insert_cors_headers(&mut resp);
        return resp;
    }

    let mut resp = next.run(req).await;
    insert_cors_headers(&mut resp);
    resp
}
