//! The fetch capability, and its aria2c-backed implementation.

use crate::utils::FetchError;
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

/// Fetch one file into `dest_dir/file_name`.
///
/// The runner only ever talks to this trait, so tests can substitute a
/// recording fake instead of spawning subprocesses.
pub trait Fetcher {
    fn fetch(&self, url: &str, dest_dir: &Path, file_name: &str) -> Result<(), FetchError>;
}

/// Shells out to aria2c for segmented, resumable downloads.
///
/// The subprocess blocks the calling thread until it exits; the 16-way
/// parallelism lives entirely inside aria2c.
#[derive(Clone, Debug)]
pub struct Aria2Fetcher {
    /// Executable name, resolved through `PATH`.
    pub program: String,
    /// Connections per server (`-x`).
    pub connections: u8,
    /// Number of download parts (`-s`).
    pub splits: u8,
    /// Segment size (`-k`), in aria2c notation.
    pub segment_size: String,
}

impl Default for Aria2Fetcher {
    fn default() -> Self {
        Self {
            program: "aria2c".to_string(),
            connections: 16,
            splits: 16,
            segment_size: "1M".to_string(),
        }
    }
}

impl Aria2Fetcher {
    fn args(&self, url: &str, dest_dir: &Path, file_name: &str) -> Vec<OsString> {
        vec![
            // Continue a partially downloaded file
            "-c".into(),
            "-x".into(),
            self.connections.to_string().into(),
            "-s".into(),
            self.splits.to_string().into(),
            "-k".into(),
            self.segment_size.as_str().into(),
            "-d".into(),
            dest_dir.into(),
            "-o".into(),
            file_name.into(),
            url.into(),
        ]
    }
}

impl Fetcher for Aria2Fetcher {
    fn fetch(&self, url: &str, dest_dir: &Path, file_name: &str) -> Result<(), FetchError> {
        let output = Command::new(&self.program)
            .args(self.args(url, dest_dir, file_name))
            .output()?;
        if output.status.success() {
            Ok(())
        } else {
            Err(FetchError::Downloader {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        }
    }
}
