//! Storage for the sales rollup service.
//!
//! Uploaded CSVs and generated result files live side by side in one uploads directory, each
//! under a freshly generated `upload_<uuid>` / `result_<uuid>` name. Files are written to a temp
//! file first and persisted into place, so a download never observes a half-written file.

mod store;

pub use store::{
    download_url, validate_upload, write_result_file, StorageError, UploadStore, DOWNLOAD_PREFIX,
};
