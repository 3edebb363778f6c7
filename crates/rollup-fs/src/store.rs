use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use rollup_model::{write_summary_csv, GroupSummary};
use tempfile::NamedTempFile;
use thiserror::Error;
use uuid::Uuid;

/// URL prefix under which the uploads directory is served.
pub const DOWNLOAD_PREFIX: &str = "/public/uploads";

const ACCEPTED_CONTENT_TYPES: &[&str] = &["text/csv", "application/csv", "text/plain"];

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("only CSV files are allowed, got: {0}")]
    UnsupportedExtension(String),
    #[error("failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StorageError {
    fn io<'a>(action: &'static str, path: &'a Path) -> impl FnOnce(io::Error) -> StorageError + 'a {
        move |source| StorageError::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Check that an upload looks like a CSV file.
///
/// Only the extension is enforced. An unexpected content type is logged and accepted, since
/// browsers and HTTP clients disagree on what to send for `.csv`.
pub fn validate_upload(file_name: &str, content_type: Option<&str>) -> Result<(), StorageError> {
    let ext = extension_with_dot(file_name).to_ascii_lowercase();
    if ext != ".csv" {
        return Err(StorageError::UnsupportedExtension(ext));
    }

    let content_type = content_type.unwrap_or("");
    if !ACCEPTED_CONTENT_TYPES
        .iter()
        .any(|accepted| content_type.contains(accepted))
    {
        log::warn!("unexpected MIME type: {content_type}");
    }

    log::info!("file validation passed for file: {file_name}");
    Ok(())
}

/// Public URL of a stored file; only the final path component is used.
pub fn download_url(path: impl AsRef<Path>) -> String {
    let file_name = path
        .as_ref()
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    format!("{DOWNLOAD_PREFIX}/{file_name}")
}

/// Write a result file in the download format.
///
/// The content goes to a temp file next to `dest` and is persisted over it only once fully
/// written, so a download never observes a partial file. Missing parent directories are created.
pub fn write_result_file(dest: &Path, summaries: &[GroupSummary]) -> Result<(), StorageError> {
    persist_new(dest, |file| write_summary_csv(BufWriter::new(file), summaries))
        .map_err(StorageError::io("write result", dest))
}

fn persist_new(dest: &Path, write: impl FnOnce(&mut File) -> io::Result<()>) -> io::Result<()> {
    // `Path::parent` is `Some("")` for bare file names.
    let dir = match dest.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    // Dropping `tmp` on an early return removes it.
    let mut tmp = NamedTempFile::new_in(dir)?;
    write(tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| e.error)?;
    Ok(())
}

/// `.csv` for `report.csv`, empty when there is no extension.
fn extension_with_dot(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// Directory holding uploaded inputs and generated results.
#[derive(Clone, Debug)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the uploads directory (and parents) if missing.
    pub fn ensure_dir(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(StorageError::io("create directory", &self.dir))
    }

    /// Store an uploaded file as `upload_<uuid><ext>`, keeping the original extension.
    pub fn save_upload(&self, original_name: &str, bytes: &[u8]) -> Result<PathBuf, StorageError> {
        let name = format!("upload_{}{}", Uuid::new_v4(), extension_with_dot(original_name));
        let path = self.dir.join(name);

        persist_new(&path, |file| file.write_all(bytes))
            .map_err(StorageError::io("write upload", &path))?;

        log::info!("file saved successfully: {}", path.display());
        Ok(path)
    }

    /// Write summaries to a new `result_<uuid>.csv`.
    pub fn save_result(&self, summaries: &[GroupSummary]) -> Result<PathBuf, StorageError> {
        let path = self.dir.join(format!("result_{}.csv", Uuid::new_v4()));

        write_result_file(&path, summaries)?;

        log::info!("result file saved successfully: {}", path.display());
        Ok(path)
    }

    pub fn open(&self, path: &Path) -> Result<File, StorageError> {
        File::open(path).map_err(StorageError::io("open", path))
    }
}
