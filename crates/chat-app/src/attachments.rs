//! Turning picked files into [`Attachment`] values.
//!
//! Each file is read and encoded by its own future; a batch is fanned out with
//! `try_join_all` and comes back in the order it was requested.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::future::try_join_all;
use legends_llm::Attachment;
use snafu::{OptionExt, ResultExt, Snafu, ensure};

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AttachmentError {
    #[snafu(display("attachment path {path:?} has no file name"))]
    MissingFileName { stage: &'static str, path: PathBuf },
    #[snafu(display("attachment {path:?} has unsupported type '{mime_type}'"))]
    UnsupportedType {
        stage: &'static str,
        path: PathBuf,
        mime_type: String,
    },
    #[snafu(display("failed to read attachment {path:?} on `{stage}`: {source}"))]
    ReadFile {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type AttachmentResult<T> = Result<T, AttachmentError>;

/// Guesses a mime type from the file extension.
pub fn mime_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "pdf" => "application/pdf",
        "txt" | "text" | "log" => "text/plain",
        _ => FALLBACK_MIME_TYPE,
    }
}

/// Images, PDFs and plain text can be attached.
pub fn is_accepted(mime_type: &str) -> bool {
    mime_type.starts_with("image/") || matches!(mime_type, "application/pdf" | "text/plain")
}

pub fn encode_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
}

pub async fn load_attachment(path: impl AsRef<Path>) -> AttachmentResult<Attachment> {
    let path = path.as_ref();

    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .context(MissingFileNameSnafu {
            stage: "attachment-file-name",
            path: path.to_path_buf(),
        })?;

    let mime_type = mime_type_for(path);
    ensure!(
        is_accepted(mime_type),
        UnsupportedTypeSnafu {
            stage: "attachment-accept-filter",
            path: path.to_path_buf(),
            mime_type,
        }
    );

    let bytes = tokio::fs::read(path).await.context(ReadFileSnafu {
        stage: "read-attachment",
        path: path.to_path_buf(),
    })?;

    tracing::debug!(
        name = %name,
        mime_type,
        byte_len = bytes.len(),
        "attachment encoded"
    );

    Ok(Attachment::new(name, mime_type, encode_data_url(mime_type, &bytes)))
}

/// Loads every path concurrently. Fails on the first file that cannot be attached.
pub async fn load_attachments<I, P>(paths: I) -> AttachmentResult<Vec<Attachment>>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    try_join_all(paths.into_iter().map(load_attachment)).await
}
