//! Ordered, in-memory list of the files selected for a submission.

use crate::file::UploadedFile;
use tracing::debug;

/// Accumulates selected files in insertion order.
///
/// Insertion order is the order of file blocks in the prompt. Duplicate
/// identities are allowed; removal by identity drops every match.
#[derive(Debug, Clone, Default)]
pub struct FileCollector {
    files: Vec<UploadedFile>,
}

impl FileCollector {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends files to the end of the list, without any validation.
    pub fn add_files(&mut self, files: impl IntoIterator<Item = UploadedFile>) {
        let before = self.files.len();
        self.files.extend(files);
        debug!(
            "Added {} file(s), {} total",
            self.files.len() - before,
            self.files.len()
        );
    }

    /// Removes every entry with the given identity and returns how many were removed.
    pub fn remove_file(&mut self, id: &str) -> usize {
        let before = self.files.len();
        self.files.retain(|f| f.id() != id);
        let removed = before - self.files.len();
        debug!("Removed {} file(s) with id {}", removed, id);
        removed
    }

    /// Returns the files in insertion order.
    #[must_use]
    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    /// Returns the number of collected files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true if no files are collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Drops all files.
    pub fn clear(&mut self) {
        self.files.clear();
    }
}
