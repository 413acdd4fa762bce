use std::path::{Path, PathBuf};

use crate::ClientError;

/// File extensions the ingestion service accepts for upload.
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["pdf", "svg", "txt", "doc", "docx"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Url(String),
    File(PathBuf),
}

/// Pick the submission path from the raw inputs.
///
/// A file wins over a URL when both are given. Empty inputs count as absent.
pub fn resolve_submission(
    url: Option<&str>,
    file: Option<&Path>,
) -> Result<Submission, ClientError> {
    if let Some(path) = file.filter(|path| !path.as_os_str().is_empty()) {
        check_extension(path)?;
        return Ok(Submission::File(path.to_path_buf()));
    }

    let Some(raw) = url.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Err(ClientError::validation(
            "Please enter a URL or choose a file to upload.",
        ));
    };

    let parsed = url::Url::parse(raw)
        .map_err(|err| ClientError::validation(format!("Invalid URL {raw:?}: {err}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ClientError::validation(format!(
            "Only http and https URLs can be crawled, got {:?}",
            parsed.scheme()
        )));
    }
    Ok(Submission::Url(raw.to_string()))
}

fn check_extension(path: &Path) -> Result<(), ClientError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(ClientError::validation(format!(
            "File type not allowed. Allowed types: {}",
            ALLOWED_EXTENSIONS.join(", ")
        ))),
    }
}
