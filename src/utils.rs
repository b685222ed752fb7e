//! Shared plumbing: the crate-wide error type and the blocking HTTP client.
use reqwest::blocking;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Debug, Error)]
/// All errors a fetch run can produce
pub enum FetchError {
    /// We failed to acquire the lock for a snapshot directory. Meaning
    /// another process is writing/downloading into it right now.
    #[error("Lock acquisition failed: {0}")]
    LockAcquisition(PathBuf),

    /// The external downloader exited with a non-zero status.
    /// Carries whatever the subprocess wrote to stderr.
    #[error("Downloader exited with {status}: {stderr}")]
    Downloader { status: ExitStatus, stderr: String },

    #[error("Hub error {0}")]
    HubError(String),

    /// A source URL with no usable final path segment.
    #[error("Cannot derive a file name from URL {0}")]
    BadUrl(String),

    /// I/O Error
    #[error("I/O error {0}")]
    IoError(#[from] std::io::Error),

    /// request error
    #[error("Request error {0}")]
    RequestError(#[from] reqwest::Error),
}

/// A static HTTP client for making blocking requests against the hub.
///
/// Lazily initialized so it is only built when the snapshot path of a run
/// is actually reached. Allows up to 10 redirects, which the hub needs for
/// LFS files served from a CDN.
pub(crate) static BLOCKING_CLIENT: LazyLock<blocking::Client> = LazyLock::new(|| {
    blocking::Client::builder()
        .user_agent(concat!("models-fetch/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .expect("Failed to build reqwest client")
});
