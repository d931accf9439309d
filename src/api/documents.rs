//! Document Upload
//!
//! Multipart attach of a file to an account. The server stores the bytes
//! and answers with the document record; `file_path` is its storage path.

use std::path::Path;

use log::info;
use reqwest::multipart::{Form, Part};

use super::family::{HttpRepository, RemoteEntity};
use crate::domain::{Document, SyncError, SyncResult};

/// Fallback content type for uploads with an unknown extension
const OCTET_STREAM: &str = "application/octet-stream";

/// Guess the upload content type from a file name
pub fn content_type_for(file_name: &str) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("csv") => "text/csv",
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => OCTET_STREAM,
    }
}

impl HttpRepository<Document> {
    /// Upload `bytes` as `file_name` and attach it to `account_id`
    pub async fn upload(
        &self,
        account_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> SyncResult<Document> {
        if account_id.is_empty() {
            return Err(SyncError::ValidationFailure("account_id is required".into()));
        }
        if file_name.trim().is_empty() {
            return Err(SyncError::ValidationFailure("file name is required".into()));
        }

        let size = bytes.len();
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type_for(file_name))
            .map_err(|e| SyncError::ValidationFailure(format!("bad content type: {}", e)))?;
        let form = Form::new().part("file", part);

        let path = format!("{}/upload?account_id={}", Document::FAMILY, account_id);
        let document: Document = self
            .client()
            .send_multipart(&path, form, Document::AUTHENTICATED)
            .await?;
        info!(
            "event=document_uploaded id={} account_id={} bytes={} file_path={}",
            document.id, account_id, size, document.file_path
        );
        Ok(document)
    }

    /// Read a local file and upload it
    pub async fn upload_file(&self, account_id: &str, path: &Path) -> SyncResult<Document> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| SyncError::ValidationFailure(format!("not a file: {}", path.display())))?
            .to_string();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| SyncError::Unknown(format!("failed to read {}: {}", path.display(), e)))?;
        self.upload(account_id, &file_name, bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_by_extension() {
        assert_eq!(content_type_for("MSA.PDF"), "application/pdf");
        assert_eq!(content_type_for("notes.md"), "text/markdown");
        assert_eq!(content_type_for("archive"), OCTET_STREAM);
    }
}
