//! Test file upload.
//!
//! Every upload lands in the system temp dir as `upload-*.png`, whatever its
//! real type, and is never cleaned up.

use std::io::Write;
use std::path::PathBuf;

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::Multipart;
use axum::http::Method;
use axum::response::Html;
use thiserror::Error;
use tracing::{info, warn};

/// Form field carrying the file.
pub const FILE_FIELD: &str = "myFile";

const UPLOAD_FORM: &str = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="UTF-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1.0" />
    <title>Upload</title>
  </head>
  <body>
    <form enctype="multipart/form-data" action="/upload" method="POST">
      <input type="file" name="myFile" multiple />
      <input type="submit" value="upload" />
    </form>
  </body>
</html>
"#;

#[derive(Debug, Error)]
enum UploadError {
    #[error("invalid multipart request: {0}")]
    Rejected(#[from] MultipartRejection),

    #[error("failed to read multipart form: {0}")]
    Multipart(#[from] MultipartError),

    #[error("no `myFile` field in form")]
    MissingFile,

    #[error("failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

/// `GET /upload`
pub async fn form() -> Html<&'static str> {
    Html(UPLOAD_FORM)
}

/// `POST /upload`. Failures are logged and answered with an empty 200.
pub async fn receive(multipart: Result<Multipart, MultipartRejection>) -> &'static str {
    info!("File Upload Endpoint Hit");

    match store(multipart).await {
        Ok(path) => {
            info!(path = %path.display(), "upload stored");
            "Successfully Uploaded File\n"
        }
        Err(e) => {
            warn!(error = %e, "Error Retrieving the File");
            ""
        }
    }
}

/// Any other method on `/upload`.
pub async fn unsupported(method: Method) -> String {
    format!("Method {method} not supported.")
}

async fn store(multipart: Result<Multipart, MultipartRejection>) -> Result<PathBuf, UploadError> {
    let mut multipart = multipart?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        info!(%file_name, size = bytes.len(), %content_type, "Uploaded File");

        let path = tokio::task::spawn_blocking(move || persist(&bytes))
            .await
            .map_err(std::io::Error::other)??;
        return Ok(path);
    }

    Err(UploadError::MissingFile)
}

fn persist(bytes: &[u8]) -> std::io::Result<PathBuf> {
    let mut file = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(".png")
        .tempfile()?;
    file.write_all(bytes)?;
    let (_, path) = file.keep().map_err(|e| e.error)?;
    Ok(path)
}
