use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{EngineError, Result};

/// What to do when the target artifact already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Leave the existing artifact alone and report it.
    #[default]
    Idempotent,
    /// Replace it.
    Overwrite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "path", rename_all = "snake_case")]
pub enum WriteStatus {
    Written(PathBuf),
    /// Nothing was written because the path was already occupied.
    AlreadyExists(PathBuf),
}

impl WriteStatus {
    pub fn path(&self) -> &Path {
        match self {
            WriteStatus::Written(p) | WriteStatus::AlreadyExists(p) => p,
        }
    }

    pub fn was_written(&self) -> bool {
        matches!(self, WriteStatus::Written(_))
    }
}

/// Write `contents` to a temporary file beside `path`, then move it into place.
/// Readers never observe a half-written artifact.
pub fn write_atomic(path: &Path, contents: &[u8], mode: WriteMode) -> Result<WriteStatus> {
    if mode == WriteMode::Idempotent && path.exists() {
        info!(path = %path.display(), "artifact already exists; leaving it untouched");
        return Ok(WriteStatus::AlreadyExists(path.to_path_buf()));
    }

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| EngineError::io("creating directory", dir, e))?;

    // 1) stage next to the target so the final rename stays on one filesystem
    let mut tmp = NamedTempFile::new_in(dir)
        .map_err(|e| EngineError::io("creating temporary file in", dir, e))?;
    tmp.write_all(contents)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| EngineError::io("writing temporary file for", path, e))?;
    debug!(tmp = %tmp.path().display(), bytes = contents.len(), "staged artifact");

    // 2) move into place
    let persisted = match mode {
        WriteMode::Idempotent => tmp.persist_noclobber(path),
        WriteMode::Overwrite => tmp.persist(path),
    };
    match persisted {
        Ok(_) => {
            info!(path = %path.display(), bytes = contents.len(), "wrote artifact");
            Ok(WriteStatus::Written(path.to_path_buf()))
        }
        Err(e)
            if mode == WriteMode::Idempotent && e.error.kind() == io::ErrorKind::AlreadyExists =>
        {
            info!(path = %path.display(), "artifact appeared while writing; leaving it untouched");
            Ok(WriteStatus::AlreadyExists(path.to_path_buf()))
        }
        Err(e) => Err(EngineError::io("persisting", path, e.error)),
    }
}
