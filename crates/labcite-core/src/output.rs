//! Atomic YAML output for the final citation list.

use std::io::Write;
use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::record::Citation;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

/// Serialize citations to YAML and write them atomically: the content lands
/// in a temp file in the target directory, then replaces the target in one
/// rename, so a failed run never leaves a truncated citations file behind.
pub fn write_citations(path: &Path, citations: &[Citation]) -> Result<(), OutputError> {
    let yaml = serde_yaml::to_string(citations)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(yaml.as_bytes())?;
    tmp.persist(path).map_err(|e| OutputError::Io(e.error))?;

    info!(path = %path.display(), count = citations.len(), "wrote citations");
    Ok(())
}
