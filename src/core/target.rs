//! The file being scanned.
//!
//! A [`ScanTarget`] is read from disk once at the start of an invocation and
//! handed by reference to every phase of the workflow: the digest, the upload
//! and the report all see the same bytes.

use crate::core::error::ScanError;

use std::path::{Path, PathBuf};

/// A local file loaded into memory for scanning.
///
/// # Examples
///
/// ```rust
/// use metascan::ScanTarget;
///
/// let target = ScanTarget::from_bytes("/tmp/sample.exe", vec![0x4D, 0x5A]);
/// assert_eq!(target.filename(), "sample.exe");
/// assert_eq!(target.len(), 2);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ScanTarget {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl std::fmt::Debug for ScanTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanTarget")
            .field("path", &self.path)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ScanTarget {
    /// Reads the file at `path` into memory.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ScanError> {
        let path = path.into();
        let bytes = std::fs::read(&path).map_err(|source| ScanError::FileUnreadable {
            path: path.clone(),
            source,
        })?;

        Ok(Self { path, bytes })
    }

    /// Builds a target from bytes already in memory.
    pub fn from_bytes(path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            bytes: bytes.into(),
        }
    }

    /// Returns the path the target was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the file content.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the file size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if the file is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the base name of the file, as sent to the service.
    ///
    /// Falls back to the full path text when the path has no final
    /// component (e.g. `..`).
    pub fn filename(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}
