//! Snapshot retrieval: materialize the complete file set of a hub repo
//! into a local directory, as real files (no symlinks, no cache layout).

mod hf_api;

use crate::fslock;
use crate::repo::Repo;
use crate::utils::{BLOCKING_CLIENT, FetchError};
use indicatif::{
    MultiProgress as MultiProgressBar, ProgressBar, ProgressFinish, ProgressState, ProgressStyle,
};
use log::info;
use std::fmt;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub use hf_api::TreeEntry;

pub struct HubClient {
    endpoint: String,
    repo: Repo,
}

impl HubClient {
    pub fn new(repo: Repo) -> Self {
        Self {
            repo,
            endpoint: "https://huggingface.co".to_string(),
        }
    }

    pub fn new_with_endpoint(repo: Repo, endpoint: String) -> Self {
        Self { repo, endpoint }
    }

    pub fn repo(&self) -> &Repo {
        &self.repo
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Pull the whole snapshot into `local_dir`.
    pub fn pull(&self, local_dir: impl AsRef<Path>) -> Result<(), FetchError> {
        self.inner_pull(local_dir.as_ref(), None::<MultiProgressWrapper>)
    }

    pub fn pull_with_progress(
        &self,
        local_dir: impl AsRef<Path>,
        progress: impl Progress,
    ) -> Result<(), FetchError> {
        self.inner_pull(local_dir.as_ref(), Some(progress))
    }

    /// List the tree, then fetch every blob that is missing or has the
    /// wrong size. Sizes come from the listing; contents are never hashed.
    fn inner_pull(
        &self,
        local_dir: &Path,
        mut progress: Option<impl Progress>,
    ) -> Result<(), FetchError> {
        let entries = hf_api::get_tree_files(&self.endpoint, &self.repo)?;
        std::fs::create_dir_all(local_dir)?;
        let mut lock = fslock::FsLock::lock(local_dir.to_path_buf())?;

        for entry in &entries {
            let filepath = {
                let mut filepath = local_dir.to_path_buf();
                for part in entry.path.split('/') {
                    filepath.push(part);
                }
                filepath
            };

            if filepath.is_file()
                && std::fs::metadata(&filepath)?.len() == entry.blob_size()
            {
                info!("File already exists: {}", filepath.display());
                continue;
            }

            let file_url = format!("{}/{}", self.endpoint, self.repo.resolve_path(&entry.path));
            download_file(&file_url, &filepath, entry, &mut progress)?;
        }

        lock.unlock();
        Ok(())
    }
}

/// Files currently materialized under `local_dir`, as repo-relative paths
/// with forward slashes.
pub fn local_files(local_dir: impl AsRef<Path>) -> Result<Vec<String>, FetchError> {
    let base_path = local_dir.as_ref();
    let mut files = Vec::new();

    for entry in walkdir::WalkDir::new(base_path)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if entry.file_type().is_file() {
            let rel_path = entry
                .path()
                .strip_prefix(base_path)
                .map_err(|e| FetchError::HubError(e.to_string()))?
                .components()
                .collect::<PathBuf>();
            files.push(rel_path.to_string_lossy().replace('\\', "/"));
        }
    }

    files.sort();
    Ok(files)
}

/// Download one file into place through a temp file in the same directory,
/// so a killed run never leaves a half-written file under the final name.
fn download_file(
    file_url: &str,
    filepath: &Path,
    entry: &TreeEntry,
    progress: &mut Option<impl Progress>,
) -> Result<(), FetchError> {
    let parent = filepath
        .parent()
        .ok_or_else(|| FetchError::HubError("Invalid file path".into()))?;
    std::fs::create_dir_all(parent)?;
    let temp_file = NamedTempFile::new_in(parent)?;

    let response = BLOCKING_CLIENT.get(file_url).send()?;
    if !response.status().is_success() {
        return Err(FetchError::HubError(format!(
            "{} returned {}",
            entry.path,
            response.status()
        )));
    }
    let total_size = response.content_length().unwrap_or(entry.blob_size());

    let mut unit = ProgressUnit::new(entry.path.clone(), total_size);
    if let Some(prg) = progress.as_mut() {
        prg.on_start(&unit)?;
    }

    let mut downloaded: u64 = 0;
    let mut buf_write = io::BufWriter::new(temp_file.reopen()?);
    let mut buf_read = io::BufReader::new(response);
    let mut buf = vec![0u8; 8192];

    loop {
        let len = buf_read.read(&mut buf)?;
        if len == 0 {
            break;
        }
        buf_write.write_all(&buf[..len])?;
        downloaded += len as u64;

        if let Some(prg) = progress.as_mut() {
            unit.update(downloaded);
            prg.on_progress(&unit)?;
        }
    }

    buf_write.flush()?;
    temp_file
        .persist(filepath)
        .map_err(|e| FetchError::IoError(e.error))?;

    if let Some(prg) = progress.as_mut() {
        prg.on_finish(&unit)?;
    }
    Ok(())
}

#[derive(Default, Clone)]
pub struct ProgressUnit {
    filename: String,
    total_size: u64,
    current: u64,
}

impl ProgressUnit {
    pub fn new(filename: String, total_size: u64) -> Self {
        Self {
            filename,
            total_size,
            ..Default::default()
        }
    }

    pub fn update(&mut self, current: u64) {
        self.current = current;
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn current(&self) -> u64 {
        self.current
    }
}

/// Progress callbacks for snapshot downloads.
pub trait Progress: Clone + Send + Sync {
    fn on_start(&mut self, unit: &ProgressUnit) -> Result<(), FetchError>;

    fn on_progress(&mut self, unit: &ProgressUnit) -> Result<(), FetchError>;

    fn on_finish(&mut self, unit: &ProgressUnit) -> Result<(), FetchError>;
}

/// One indicatif bar per file, stacked under a shared `MultiProgress`.
#[derive(Default, Clone)]
pub struct MultiProgressWrapper {
    current_bar: Option<ProgressBar>,
    inner: MultiProgressBar,
}

impl MultiProgressWrapper {
    pub fn new() -> Self {
        Self {
            current_bar: None,
            inner: MultiProgressBar::new(),
        }
    }
}

impl Progress for MultiProgressWrapper {
    fn on_start(&mut self, unit: &ProgressUnit) -> Result<(), FetchError> {
        let pb = ProgressBar::new(unit.total_size()).with_finish(ProgressFinish::AndLeave);
        self.current_bar = Some(self.inner.add(pb.clone()));

        let filename = unit.filename().to_string();
        pb.set_style(ProgressStyle::with_template("{prefix:.bold.cyan} {spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .unwrap()
            .with_key("eta", |state: &ProgressState, w: &mut dyn fmt::Write| write!(w, "{:.1}s", state.eta().as_secs_f64()).unwrap())
            .progress_chars("#>-"));
        pb.set_prefix(filename);
        Ok(())
    }

    fn on_progress(&mut self, unit: &ProgressUnit) -> Result<(), FetchError> {
        if let Some(ref pb) = self.current_bar {
            pb.set_position(unit.current());
        }
        Ok(())
    }

    fn on_finish(&mut self, unit: &ProgressUnit) -> Result<(), FetchError> {
        if let Some(ref pb) = self.current_bar {
            pb.set_position(unit.current());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TREE_JSON: &str = r#"[
        {"type": "file", "oid": "a1b2c3", "size": 12, "path": "config.json"},
        {"type": "file", "oid": "d4e5f6", "size": 9, "path": "onnx/model.onnx"}
    ]"#;

    fn mock_tree(server: &mut mockito::Server) -> mockito::Mock {
        server
            .mock("GET", "/api/models/acme/tiny-net/tree/main?recursive=true")
            .with_header("content-type", "application/json")
            .with_body(TREE_JSON)
            .create()
    }

    #[test]
    fn pull_materializes_the_whole_tree() {
        let mut server = mockito::Server::new();
        let _tree = mock_tree(&mut server);
        let _config = server
            .mock("GET", "/acme/tiny-net/resolve/main/config.json")
            .with_body(r#"{"dim": 128}"#)
            .create();
        let _onnx = server
            .mock("GET", "/acme/tiny-net/resolve/main/onnx/model.onnx")
            .with_body("onnx data")
            .create();

        let tmp = tempfile::tempdir().unwrap();
        let local_dir = tmp.path().join("tiny-net");
        let client = HubClient::new_with_endpoint(Repo::model("acme/tiny-net"), server.url());
        client.pull(&local_dir).unwrap();

        assert_eq!(
            std::fs::read_to_string(local_dir.join("config.json")).unwrap(),
            r#"{"dim": 128}"#
        );
        assert_eq!(
            std::fs::read_to_string(local_dir.join("onnx").join("model.onnx")).unwrap(),
            "onnx data"
        );
        assert_eq!(
            local_files(&local_dir).unwrap(),
            ["config.json", "onnx/model.onnx"]
        );
    }

    #[test]
    fn same_size_file_is_not_refetched() {
        let mut server = mockito::Server::new();
        let _tree = mock_tree(&mut server);
        // 12 bytes, matching the listing, but different content
        let tmp = tempfile::tempdir().unwrap();
        let local_dir = tmp.path().join("tiny-net");
        std::fs::create_dir_all(&local_dir).unwrap();
        std::fs::write(local_dir.join("config.json"), r#"{"dim": 256}"#).unwrap();

        let config = server
            .mock("GET", "/acme/tiny-net/resolve/main/config.json")
            .with_body(r#"{"dim": 128}"#)
            .expect(0)
            .create();
        let _onnx = server
            .mock("GET", "/acme/tiny-net/resolve/main/onnx/model.onnx")
            .with_body("onnx data")
            .create();

        let client = HubClient::new_with_endpoint(Repo::model("acme/tiny-net"), server.url());
        client.pull(&local_dir).unwrap();

        config.assert();
        assert_eq!(
            std::fs::read_to_string(local_dir.join("config.json")).unwrap(),
            r#"{"dim": 256}"#
        );
    }

    #[test]
    fn wrong_size_file_is_replaced() {
        let mut server = mockito::Server::new();
        let _tree = mock_tree(&mut server);
        let tmp = tempfile::tempdir().unwrap();
        let local_dir = tmp.path().join("tiny-net");
        std::fs::create_dir_all(&local_dir).unwrap();
        std::fs::write(local_dir.join("config.json"), "stub").unwrap();

        let _config = server
            .mock("GET", "/acme/tiny-net/resolve/main/config.json")
            .with_body(r#"{"dim": 128}"#)
            .create();
        let _onnx = server
            .mock("GET", "/acme/tiny-net/resolve/main/onnx/model.onnx")
            .with_body("onnx data")
            .create();

        let client = HubClient::new_with_endpoint(Repo::model("acme/tiny-net"), server.url());
        client.pull(&local_dir).unwrap();

        assert_eq!(
            std::fs::read_to_string(local_dir.join("config.json")).unwrap(),
            r#"{"dim": 128}"#
        );
    }

    #[test]
    fn failing_blob_download_is_fatal() {
        let mut server = mockito::Server::new();
        let _tree = mock_tree(&mut server);
        let _config = server
            .mock("GET", "/acme/tiny-net/resolve/main/config.json")
            .with_status(500)
            .create();

        let tmp = tempfile::tempdir().unwrap();
        let client = HubClient::new_with_endpoint(Repo::model("acme/tiny-net"), server.url());
        let err = client.pull(tmp.path().join("tiny-net")).unwrap_err();
        assert!(matches!(err, FetchError::HubError(_)));
    }
}
