use crate::error::FloorplanError;
use crate::models::{HistoryEntry, RecordKind};
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Extensions accepted for uploads, compared case-insensitively.
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "bmp"];

/// Upper bound on `_1`, `_2`, ... suffixes tried for a same-second name.
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Wall-clock stamp used for upload and record names (`YYYYMMDD_HHMMSS`).
pub fn generate_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub path: PathBuf,
    pub filename: String,
    /// Reused as the timestamp of the record produced from this upload.
    pub timestamp: String,
}

/// Flat-directory storage for uploaded images and JSON result records.
#[derive(Debug, Clone)]
pub struct RecordStore {
    upload_dir: PathBuf,
    output_dir: PathBuf,
}

impl RecordStore {
    pub async fn new(
        upload_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self, FloorplanError> {
        let upload_dir = upload_dir.into();
        let output_dir = output_dir.into();
        fs::create_dir_all(&upload_dir).await?;
        fs::create_dir_all(&output_dir).await?;
        Ok(Self {
            upload_dir,
            output_dir,
        })
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Validate the client's file name, then store the bytes under
    /// `<timestamp>_<sanitized name>`.
    pub async fn save_upload(
        &self,
        bytes: &[u8],
        client_filename: &str,
    ) -> Result<StoredUpload, FloorplanError> {
        let extension = allowed_extension(client_filename)?;
        let timestamp = generate_timestamp();
        let base = format!("{}_{}", timestamp, sanitize_stem(client_filename));

        fs::create_dir_all(&self.upload_dir).await?;

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let filename = candidate_name(&base, attempt, &extension);
            let path = self.upload_dir.join(&filename);

            let file = fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;

            match file {
                Ok(mut file) => {
                    file.write_all(bytes).await?;
                    file.flush().await?;

                    tracing::info!(path = %path.display(), size = bytes.len(), "Image saved");
                    return Ok(StoredUpload {
                        path,
                        filename,
                        timestamp,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(name_exhausted(&base))
    }

    /// Serialize `record` with 2-space indentation into
    /// `<kind>_<timestamp>.json`, returning the file name actually used.
    ///
    /// The file is written under a hidden temporary name and then hard-linked
    /// into place, so listings never see partial JSON and an existing record
    /// is never replaced.
    pub async fn save_record<T: Serialize>(
        &self,
        kind: RecordKind,
        timestamp: &str,
        record: &T,
    ) -> Result<String, FloorplanError> {
        let json = serde_json::to_vec_pretty(record)?;
        fs::create_dir_all(&self.output_dir).await?;

        let temp_path = self.output_dir.join(format!(".{}.tmp", Uuid::new_v4()));
        let result = match fs::write(&temp_path, &json).await {
            Ok(()) => self.link_unique(kind, timestamp, &temp_path).await,
            Err(e) => Err(e.into()),
        };
        match fs::remove_file(&temp_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %temp_path.display(), error = %e, "Failed to remove temp file")
            }
        }

        let filename = result?;
        tracing::info!(record = %filename, "Record saved");
        Ok(filename)
    }

    async fn link_unique(
        &self,
        kind: RecordKind,
        timestamp: &str,
        temp_path: &Path,
    ) -> Result<String, FloorplanError> {
        let base = format!("{}_{}", kind, timestamp);

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let filename = candidate_name(&base, attempt, "json");
            match fs::hard_link(temp_path, self.output_dir.join(&filename)).await {
                Ok(()) => return Ok(filename),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(name_exhausted(&base))
    }

    /// Project every parseable `.json` file in the output directory. Files
    /// that cannot be read or parsed are skipped. Order is unspecified.
    pub async fn list_records(&self) -> Result<Vec<HistoryEntry>, FloorplanError> {
        let mut entries = Vec::new();

        let mut dir = match fs::read_dir(&self.output_dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(entries),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = dir.next_entry().await? {
            let Some(filename) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !filename.ends_with(".json") || filename.starts_with('.') {
                continue;
            }

            let value = match fs::read(entry.path()).await {
                Ok(bytes) => serde_json::from_slice::<serde_json::Value>(&bytes),
                Err(e) => {
                    tracing::debug!(file = %filename, error = %e, "Skipping unreadable record");
                    continue;
                }
            };

            match value {
                Ok(value) => {
                    if let Some(history_entry) = HistoryEntry::from_record_json(filename, &value) {
                        entries.push(history_entry);
                    }
                }
                Err(e) => {
                    tracing::debug!(file = %filename, error = %e, "Skipping unparseable record");
                }
            }
        }

        Ok(entries)
    }

    /// Raw bytes of an output-directory file. Any name that is not a plain
    /// file name, or that resolves outside the output directory, is
    /// reported as `NotFound`.
    pub async fn read_record_file(&self, filename: &str) -> Result<Vec<u8>, FloorplanError> {
        let path = self.resolve_output_file(filename).await?;
        fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => FloorplanError::NotFound(filename.to_string()),
            _ => FloorplanError::Storage(e),
        })
    }

    async fn resolve_output_file(&self, filename: &str) -> Result<PathBuf, FloorplanError> {
        let not_found = || FloorplanError::NotFound(filename.to_string());

        if !is_plain_filename(filename) {
            return Err(not_found());
        }

        let root = fs::canonicalize(&self.output_dir)
            .await
            .map_err(|_| not_found())?;
        let resolved = fs::canonicalize(root.join(filename))
            .await
            .map_err(|_| not_found())?;

        if resolved.parent() != Some(root.as_path()) {
            return Err(not_found());
        }
        let metadata = fs::metadata(&resolved).await.map_err(|_| not_found())?;
        if !metadata.is_file() {
            return Err(not_found());
        }

        Ok(resolved)
    }
}

/// A single visible path component: no separators, no `.`/`..`, not hidden.
fn is_plain_filename(name: &str) -> bool {
    if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\', '\0']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Lower-cased extension of `filename` if it is one of [`ALLOWED_EXTENSIONS`].
pub fn allowed_extension(filename: &str) -> Result<String, FloorplanError> {
    let invalid = || FloorplanError::InvalidFileType(filename.to_string());

    let (_, extension) = filename.rsplit_once('.').ok_or_else(invalid)?;
    let extension = extension.to_ascii_lowercase();

    if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(invalid())
    }
}

/// File-system safe stem of a client-supplied name: directory parts dropped,
/// whitespace turned into `_`, anything outside `[A-Za-z0-9._-]` removed.
pub fn sanitize_stem(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();
    let stem = base.rsplit_once('.').map_or(base, |(stem, _)| stem);

    let cleaned: String = stem
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}

fn candidate_name(base: &str, attempt: u32, extension: &str) -> String {
    if attempt == 0 {
        format!("{}.{}", base, extension)
    } else {
        format!("{}_{}.{}", base, attempt, extension)
    }
}

fn name_exhausted(base: &str) -> FloorplanError {
    FloorplanError::Storage(std::io::Error::new(
        ErrorKind::AlreadyExists,
        format!("no free file name for {}", base),
    ))
}
