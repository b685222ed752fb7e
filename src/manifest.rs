//! The static download table: which files must exist, and where.
//!
//! A [`Manifest`] is built once at startup and passed into
//! [`crate::runner::run`] by reference; nothing in the crate mutates it.

use crate::utils::FetchError;
use std::path::{Path, PathBuf};

/// One file to ensure on disk: a source URL plus an optional local
/// file name override.
#[derive(Clone, Debug)]
pub struct DownloadTarget {
    url: String,
    file_name: Option<String>,
}

impl DownloadTarget {
    /// Target whose local name is derived from the URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            file_name: None,
        }
    }

    /// Target saved under an explicit local file name.
    pub fn with_file_name(url: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            file_name: Some(file_name.into()),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// The local file name: the explicit override when one was given,
    /// otherwise the final path segment of the URL.
    pub fn file_name(&self) -> Result<&str, FetchError> {
        if let Some(ref name) = self.file_name {
            return Ok(name);
        }
        self.url
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .ok_or_else(|| FetchError::BadUrl(self.url.clone()))
    }
}

/// A destination folder and the targets that land in it, in order.
#[derive(Clone, Debug)]
pub struct FolderGroup {
    folder: PathBuf,
    targets: Vec<DownloadTarget>,
}

impl FolderGroup {
    pub fn new(folder: impl Into<PathBuf>, targets: Vec<DownloadTarget>) -> Self {
        Self {
            folder: folder.into(),
            targets,
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn targets(&self) -> &[DownloadTarget] {
        &self.targets
    }
}

/// The whole table. Group order and target order are preserved so runs
/// log in a stable order.
#[derive(Clone, Debug, Default)]
pub struct Manifest {
    groups: Vec<FolderGroup>,
}

impl Manifest {
    pub fn new(groups: Vec<FolderGroup>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[FolderGroup] {
        &self.groups
    }
}
