use crate::error::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::trace;

/// Bytes inspected when sniffing for binary content.
const SNIFF_LEN: usize = 8192;

/// A file the user selected for documentation.
///
/// The identity is `"{name}-{modified_ms}"`. Two selections of the same
/// unmodified file share an identity; they still coexist as separate entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    id: String,
    name: String,
    path: PathBuf,
}

impl UploadedFile {
    /// Creates an entry from its parts.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>, modified_ms: u128) -> Self {
        let name = name.into();
        Self {
            id: format!("{name}-{modified_ms}"),
            name,
            path: path.into(),
        }
    }

    /// Creates an entry for a file on disk, using its modification time.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not exist or is not a regular file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path).map_err(|e| Error::io(path, e))?;

        if !metadata.is_file() {
            return Err(Error::io(
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
            ));
        }

        // Platforms without mtime support report 0.
        let modified_ms = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
            .map_or(0, |d| d.as_millis());

        let name = path
            .file_name()
            .map_or_else(|| path.to_string_lossy(), |n| n.to_string_lossy())
            .into_owned();

        Ok(Self::new(path, name, modified_ms))
    }

    /// Identity used for removal.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name (the file name component).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Location of the file contents.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the file as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileRead`] if the file cannot be read, looks binary,
    /// or is not valid UTF-8.
    pub async fn read_text(&self) -> Result<SourceFile> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| Error::file_read(&self.name, e.to_string()))?;

        if is_binary(&bytes) {
            return Err(Error::file_read(&self.name, "file appears to be binary"));
        }

        let content = String::from_utf8(bytes)
            .map_err(|_| Error::file_read(&self.name, "invalid UTF-8 encoding"))?;

        trace!("Read {} ({} bytes)", self.name, content.len());

        Ok(SourceFile {
            name: self.name.clone(),
            content,
        })
    }
}

/// A file's name and decoded text, ready for prompt assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFile {
    /// File name shown in the prompt block header
    pub name: String,

    /// Full text content
    pub content: String,
}

impl SourceFile {
    /// Creates a new source file.
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Returns the size in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.content.len()
    }
}

/// Reads every file concurrently and returns the texts in input order.
///
/// # Errors
///
/// Fails as a whole if any single read fails; no partial result is returned.
pub async fn read_sources(files: &[UploadedFile]) -> Result<Vec<SourceFile>> {
    futures::future::try_join_all(files.iter().map(|file| file.read_text())).await
}

/// A NUL byte near the start of the file marks it as binary.
fn is_binary(bytes: &[u8]) -> bool {
    let sample = &bytes[..bytes.len().min(SNIFF_LEN)];
    memchr::memchr(0, sample).is_some()
}
