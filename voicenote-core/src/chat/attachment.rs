//! Attachment staging and validation for outgoing messages.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::chat::Attachment;

/// Maximum accepted attachment size (10 MiB).
pub const MAX_ATTACHMENT_BYTES: u64 = 10 * 1024 * 1024;

/// MIME families accepted as attachments.
const ALLOWED_TYPES: &[&str] = &[
    "text/",
    "image/",
    "application/pdf",
    "application/json",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
];

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("{name}: file is {size} bytes, over the {MAX_ATTACHMENT_BYTES} byte limit")]
    TooLarge { name: String, size: u64 },

    #[error("{name}: unsupported attachment type {mime}")]
    UnsupportedType { name: String, mime: String },

    #[error("failed to read attachment: {0}")]
    Io(#[from] std::io::Error),
}

/// Validate a file and stage it as an attachment.
///
/// Text-like files get their content extracted so it can be inlined into the
/// prompt; binary files are staged by reference only.
pub fn stage_file(path: &Path) -> Result<Attachment, AttachmentError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mime = mime_for(path);

    let size = fs::metadata(path)?.len();
    if size > MAX_ATTACHMENT_BYTES {
        return Err(AttachmentError::TooLarge { name, size });
    }
    if !is_allowed(mime) {
        return Err(AttachmentError::UnsupportedType {
            name,
            mime: mime.to_string(),
        });
    }

    let text = if is_text_like(mime) {
        Some(fs::read_to_string(path)?)
    } else {
        None
    };

    Ok(Attachment {
        id: uuid::Uuid::new_v4().to_string(),
        name,
        mime_type: mime.to_string(),
        size,
        path: path.to_path_buf(),
        text,
    })
}

/// Stage a batch of files; the first invalid file fails the whole batch.
pub fn stage_files(paths: &[PathBuf]) -> Result<Vec<Attachment>, AttachmentError> {
    paths.iter().map(|p| stage_file(p)).collect()
}

fn is_allowed(mime: &str) -> bool {
    ALLOWED_TYPES.iter().any(|t| mime.starts_with(t))
}

fn is_text_like(mime: &str) -> bool {
    mime.starts_with("text/") || mime == "application/json"
}

/// Infer a MIME type from the file extension.
fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "txt" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn text_file_is_staged_with_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        fs::write(&path, "# shopping\nmilk").unwrap();

        let attachment = stage_file(&path).unwrap();
        assert_eq!(attachment.name, "notes.md");
        assert_eq!(attachment.mime_type, "text/markdown");
        assert_eq!(attachment.text.as_deref(), Some("# shopping\nmilk"));
        assert!(!attachment.is_image());
    }

    #[test]
    fn image_is_staged_by_reference() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let attachment = stage_file(&path).unwrap();
        assert!(attachment.is_image());
        assert!(attachment.text.is_none());
    }

    #[test]
    fn unknown_binary_type_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tool.exe");
        fs::write(&path, [0u8; 16]).unwrap();

        assert!(matches!(
            stage_file(&path),
            Err(AttachmentError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn oversized_file_is_rejected_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.txt");
        let file = fs::File::create(&path).unwrap();
        file.set_len(MAX_ATTACHMENT_BYTES + 1).unwrap();

        assert!(matches!(
            stage_file(&path),
            Err(AttachmentError::TooLarge { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ghost.txt");
        assert!(matches!(stage_file(&path), Err(AttachmentError::Io(_))));
    }

    #[test]
    fn batch_staging_fails_on_first_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("a.txt");
        let mut f = fs::File::create(&good).unwrap();
        writeln!(f, "fine").unwrap();
        let bad = dir.path().join("b.exe");
        fs::write(&bad, [0u8; 4]).unwrap();

        let result = stage_files(&[good.clone(), bad]);
        assert!(result.is_err());

        let staged = stage_files(&[good]).unwrap();
        assert_eq!(staged.len(), 1);
    }
}
