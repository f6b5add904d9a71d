use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use crate::error::{EngineError, Result};

/// Where a `RawInput` came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    File(PathBuf),
    Memory(String),
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::File(p) => write!(f, "{}", p.display()),
            Source::Memory(label) => write!(f, "<{}>", label),
        }
    }
}

/// Bytes handed to the loader, untouched.
#[derive(Debug, Clone)]
pub struct RawInput {
    source: Source,
    bytes: Vec<u8>,
}

impl RawInput {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| EngineError::io("reading", path, e))?;
        Ok(Self {
            source: Source::File(path.to_path_buf()),
            bytes,
        })
    }

    pub fn from_bytes(label: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            source: Source::Memory(label.into()),
            bytes,
        }
    }

    pub fn from_text(label: impl Into<String>, text: &str) -> Self {
        Self::from_bytes(label, text.as_bytes().to_vec())
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The bytes as UTF-8; a decoding failure is reported with its line.
    pub fn text(&self) -> Result<&str> {
        std::str::from_utf8(&self.bytes).map_err(|e| {
            let valid = &self.bytes[..e.valid_up_to()];
            let line = valid.iter().filter(|&&b| b == b'\n').count() + 1;
            EngineError::parse(line, "input is not valid UTF-8")
        })
    }
}
