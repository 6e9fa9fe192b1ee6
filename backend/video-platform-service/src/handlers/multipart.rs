/// Multipart form reading with files spooled to local disk
use crate::error::{AppError, Result};
use actix_multipart::Multipart;
use actix_web::http::header::{self, ContentDisposition};
use futures_util::StreamExt;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Largest accepted text field, in bytes
const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;

/// A file written to the upload directory. The file is removed on drop unless
/// something else (the uploader) already removed it.
#[derive(Debug)]
pub struct SpooledFile {
    path: PathBuf,
}

impl SpooledFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SpooledFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "removed spooled upload"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to remove spooled upload")
            }
        }
    }
}

/// Text fields and spooled files of one multipart request
#[derive(Debug, Default)]
pub struct MultipartForm {
    texts: HashMap<String, String>,
    files: HashMap<String, SpooledFile>,
}

impl MultipartForm {
    pub fn text(&self, name: &str) -> Option<&str> {
        self.texts.get(name).map(String::as_str)
    }

    pub fn file(&self, name: &str) -> Option<&SpooledFile> {
        self.files.get(name)
    }
}

fn field_name(headers: &header::HeaderMap) -> Option<(String, Option<String>)> {
    let raw = headers.get(header::CONTENT_DISPOSITION)?;
    let disposition = ContentDisposition::from_raw(raw).ok()?;
    let name = disposition.get_name()?.to_string();
    Some((name, disposition.get_filename().map(str::to_owned)))
}

fn extension(filename: Option<&str>) -> String {
    filename
        .and_then(|f| Path::new(f).extension())
        .and_then(|e| e.to_str())
        .filter(|e| e.len() <= 8 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default()
}

/// Read the whole form. Fields named in `file_fields` are streamed to `upload_dir`,
/// each at most `max_file_bytes` long; every other field is read as UTF-8 text.
/// Unnamed parts are skipped.
pub async fn read_form(
    mut payload: Multipart,
    upload_dir: &Path,
    file_fields: &[&str],
    max_file_bytes: u64,
) -> Result<MultipartForm> {
    let mut form = MultipartForm::default();

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::validation(format!("Malformed multipart body: {e}")))?;
        let Some((name, filename)) = field_name(field.headers()) else {
            continue;
        };

        if file_fields.contains(&name.as_str()) {
            tokio::fs::create_dir_all(upload_dir)
                .await
                .map_err(|e| AppError::Internal(e.into()))?;
            let path = upload_dir.join(format!(
                "{}{}",
                Uuid::new_v4(),
                extension(filename.as_deref())
            ));
            // Registered before writing so a failed write is still cleaned up.
            let spooled = SpooledFile { path: path.clone() };

            let mut file = tokio::fs::File::create(&path)
                .await
                .map_err(|e| AppError::Internal(e.into()))?;
            let mut written: u64 = 0;
            while let Some(chunk) = field.next().await {
                let chunk = chunk
                    .map_err(|e| AppError::validation(format!("Malformed multipart body: {e}")))?;
                written += chunk.len() as u64;
                if written > max_file_bytes {
                    return Err(AppError::validation(format!(
                        "File {name} exceeds the {max_file_bytes} byte limit"
                    )));
                }
                file.write_all(&chunk)
                    .await
                    .map_err(|e| AppError::Internal(e.into()))?;
            }
            file.flush()
                .await
                .map_err(|e| AppError::Internal(e.into()))?;

            form.files.insert(name, spooled);
        } else {
            let mut bytes = Vec::new();
            while let Some(chunk) = field.next().await {
                let chunk = chunk
                    .map_err(|e| AppError::validation(format!("Malformed multipart body: {e}")))?;
                if bytes.len() + chunk.len() > MAX_TEXT_FIELD_BYTES {
                    return Err(AppError::validation(format!("Field {name} is too large")));
                }
                bytes.extend_from_slice(&chunk);
            }
            let text = String::from_utf8(bytes)
                .map_err(|_| AppError::validation(format!("Field {name} must be UTF-8 text")))?;
            form.texts.insert(name, text);
        }
    }

    Ok(form)
}
