use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ingest_engine::AtomicFileWriter;
use ingest_logging::{ingest_info, ingest_warn, redact};
use serde::{Deserialize, Serialize};

pub const SESSION_FILENAME: &str = "session.ron";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedSession {
    access_token: String,
}

/// Token saved by an earlier `login`, if one is readable.
pub(crate) fn load_token(state_dir: &Path) -> Option<String> {
    let path = state_dir.join(SESSION_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            ingest_warn!("Failed to read session from {:?}: {}", path, err);
            return None;
        }
    };

    match ron::from_str::<PersistedSession>(&content) {
        Ok(session) => {
            ingest_info!(
                "Loaded session token {} from {:?}",
                redact(&session.access_token),
                path
            );
            Some(session.access_token)
        }
        Err(err) => {
            ingest_warn!("Failed to parse session from {:?}: {}", path, err);
            None
        }
    }
}

pub(crate) fn save_token(state_dir: &Path, token: &str) -> Result<()> {
    let session = PersistedSession {
        access_token: token.to_string(),
    };
    let content = ron::ser::to_string_pretty(&session, ron::ser::PrettyConfig::new())
        .context("failed to serialize session")?;

    let writer = AtomicFileWriter::new(PathBuf::from(state_dir));
    let path = writer
        .write(SESSION_FILENAME, &content)
        .with_context(|| format!("failed to write session to {}", state_dir.display()))?;
    ingest_info!("Saved session token {} to {:?}", redact(token), path);
    Ok(())
}

/// A missing session file counts as cleared.
pub(crate) fn clear_token(state_dir: &Path) -> Result<()> {
    let writer = AtomicFileWriter::new(PathBuf::from(state_dir));
    let removed = writer
        .remove(SESSION_FILENAME)
        .with_context(|| format!("failed to remove session from {}", state_dir.display()))?;
    if removed {
        ingest_info!("Removed stored session from {:?}", state_dir);
    }
    Ok(())
}
