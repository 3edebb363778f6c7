#![forbid(unsafe_code)]

//! HTTP front end for the sales rollup.
//!
//! `POST /api/v1/upload` takes a multipart CSV, stores it, aggregates it with
//! [`rollup_model::aggregate_csv`] and answers with a download URL for the result file, which
//! is served from `/public/uploads/...`.

use std::path::PathBuf;

use rollup_fs::UploadStore;

mod config;
mod http;
mod telemetry;

pub use config::{ConfigError, ServerConfig};
pub use http::{build_router, ErrorResponse, HealthResponse, UploadResponse};
pub use telemetry::init_tracing;

pub const CRATE_NAME: &str = "rollup-server";

#[derive(Clone, Debug)]
pub struct AppState {
    pub store: UploadStore,
    /// Root served under `/public`.
    pub public_dir: PathBuf,
}

impl AppState {
    pub fn new(store: UploadStore, public_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            public_dir: public_dir.into(),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(UploadStore::new(config.uploads_dir()), &config.public_dir)
    }
}
