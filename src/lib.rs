#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

mod fslock;
mod utils;

pub mod fetcher;
pub mod hub;
pub mod manifest;
pub mod repo;
pub mod runner;

pub use fetcher::{Aria2Fetcher, Fetcher};
pub use hub::{HubClient, MultiProgressWrapper, Progress, ProgressUnit};
pub use manifest::{DownloadTarget, FolderGroup, Manifest};
pub use repo::Repo;
pub use runner::{RunReport, run};
pub use utils::FetchError;
