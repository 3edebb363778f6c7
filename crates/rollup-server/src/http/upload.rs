use std::io::BufReader;
use std::path::PathBuf;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use rollup_fs::{download_url, validate_upload, UploadStore};
use rollup_model::{aggregate_csv, Rollup};
use tracing::{info, warn};

use super::response::{ApiError, UploadResponse};
use crate::AppState;

const UPLOAD_FIELD: &str = "file";

struct UploadedFile {
    file_name: String,
    content_type: Option<String>,
    bytes: axum::body::Bytes,
}

async fn read_upload_field(multipart: &mut Multipart) -> Result<UploadedFile, ApiError> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Err(ApiError::MissingFile),
            Err(e) => {
                warn!("malformed multipart body: {e}");
                return Err(ApiError::MissingFile);
            }
        };
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(|e| {
            warn!("failed to read uploaded file: {e}");
            ApiError::MissingFile
        })?;
        return Ok(UploadedFile {
            file_name,
            content_type,
            bytes,
        });
    }
}

/// Runs on a blocking worker; the file handle is dropped when this returns.
fn process_upload(store: &UploadStore, path: PathBuf) -> Result<Rollup, ApiError> {
    let file = store.open(&path).map_err(ApiError::OpenUpload)?;
    aggregate_csv(BufReader::new(file)).map_err(ApiError::Process)
}

pub(crate) async fn upload_csv_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        warn!("upload request is not multipart: {e}");
        ApiError::MissingFile
    })?;
    let upload = read_upload_field(&mut multipart).await?;

    validate_upload(&upload.file_name, upload.content_type.as_deref())
        .map_err(ApiError::InvalidUpload)?;

    let store = state.store.clone();
    let (rollup, result_path) = tokio::task::spawn_blocking(move || {
        let input_path = store
            .save_upload(&upload.file_name, &upload.bytes)
            .map_err(ApiError::SaveUpload)?;
        let rollup = process_upload(&store, input_path)?;
        let result_path = store
            .save_result(&rollup.summaries)
            .map_err(ApiError::SaveResult)?;
        Ok::<_, ApiError>((rollup, result_path))
    })
    .await
    .map_err(ApiError::Worker)??;

    info!(
        result = %result_path.display(),
        departments = rollup.summaries.len(),
        rows_skipped = rollup.stats.rows_skipped(),
        "CSV processing completed successfully"
    );

    Ok(Json(UploadResponse {
        success: true,
        message: "CSV file processed successfully".to_string(),
        download_url: download_url(&result_path),
        total_departments: rollup.summaries.len(),
        total_sales: rollup.total(),
        processed_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    }))
}
