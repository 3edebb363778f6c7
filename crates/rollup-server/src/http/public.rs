use std::path::{Component, Path, PathBuf};

use axum::extract::{Path as UrlPath, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::AppState;

/// Join a request path onto the public root, refusing anything but plain file name components.
fn resolve_public_path(root: &Path, requested: &str) -> Option<PathBuf> {
    let requested = Path::new(requested);
    let mut out = root.to_path_buf();
    let mut any = false;
    for component in requested.components() {
        match component {
            Component::Normal(part) => {
                out.push(part);
                any = true;
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    any.then_some(out)
}

pub(crate) async fn public_file_handler(
    State(state): State<AppState>,
    UrlPath(requested): UrlPath<String>,
) -> Response {
    let Some(path) = resolve_public_path(&state.public_dir, &requested) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            let content_type = HeaderValue::from_str(mime.as_ref())
                .unwrap_or(HeaderValue::from_static("application/octet-stream"));
            ([(header::CONTENT_TYPE, content_type)], bytes).into_response()
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            StatusCode::NOT_FOUND.into_response()
        }
        Err(e) => {
            // Directories land here on most platforms.
            warn!(path = %path.display(), "failed to read public file: {e}");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}
