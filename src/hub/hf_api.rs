//! Hub tree-listing API wrapper.
//!
//! ```text
//! curl https://huggingface.co/api/models/openai/clip-vit-large-patch14/tree/main?recursive=true
//! ```

use crate::repo::Repo;
use crate::utils::{BLOCKING_CLIENT, FetchError};
use serde::Deserialize;

/// One entry of the recursive tree listing.
#[derive(Debug, Deserialize)]
pub struct TreeEntry {
    /// "file" or "directory"
    #[serde(rename = "type")]
    pub entry_type: String,

    /// Path relative to the repo root, forward slashes.
    pub path: String,

    #[serde(default)]
    pub size: u64,

    #[serde(default)]
    pub oid: Option<String>,

    /// Present for LFS-tracked files; `size` then refers to the pointer.
    #[serde(default)]
    pub lfs: Option<LfsInfo>,
}

#[derive(Debug, Deserialize)]
pub struct LfsInfo {
    pub oid: String,
    pub size: u64,

    #[serde(rename = "pointerSize", default)]
    pub pointer_size: u64,
}

impl TreeEntry {
    /// Size of the file as materialized on disk. LFS entries report the
    /// real blob size under `lfs.size`, not in the top-level `size`.
    pub fn blob_size(&self) -> u64 {
        self.lfs.as_ref().map(|lfs| lfs.size).unwrap_or(self.size)
    }
}

/// Fetch the recursive tree of a repo, keeping only file entries.
pub fn get_tree_files(endpoint: &str, repo: &Repo) -> Result<Vec<TreeEntry>, FetchError> {
    let url = format!("{}/{}?recursive=true", endpoint, repo.tree_api_path());
    let response = BLOCKING_CLIENT.get(&url).send()?;
    if !response.status().is_success() {
        return Err(FetchError::HubError(format!(
            "tree listing for {} returned {}",
            repo.repo_id(),
            response.status()
        )));
    }
    let entries: Vec<TreeEntry> = response.json()?;
    Ok(entries
        .into_iter()
        .filter(|entry| entry.entry_type == "file")
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TREE_JSON: &str = r#"[
        {"type": "file", "oid": "11d1ac2c", "size": 4519, "path": "README.md"},
        {"type": "directory", "oid": "8a2bc0", "size": 0, "path": "onnx"},
        {"type": "file", "oid": "3dca30", "size": 135,
         "lfs": {"oid": "9c0a2f", "size": 1710540580, "pointerSize": 135},
         "path": "model.safetensors"}
    ]"#;

    #[test]
    fn directories_are_filtered_out() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/api/models/acme/tiny-net/tree/main?recursive=true")
            .with_header("content-type", "application/json")
            .with_body(TREE_JSON)
            .create();

        let repo = Repo::model("acme/tiny-net");
        let files = get_tree_files(&server.url(), &repo).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, ["README.md", "model.safetensors"]);
    }

    #[test]
    fn lfs_entries_report_the_blob_size() {
        let entries: Vec<TreeEntry> = serde_json::from_str(TREE_JSON).unwrap();
        assert_eq!(entries[0].blob_size(), 4519);
        assert_eq!(entries[2].blob_size(), 1_710_540_580);
    }

    #[test]
    fn missing_repo_is_a_hub_error() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/api/models/acme/gone/tree/main?recursive=true")
            .with_status(404)
            .create();

        let repo = Repo::model("acme/gone");
        let err = get_tree_files(&server.url(), &repo).unwrap_err();
        assert!(matches!(err, FetchError::HubError(_)));
    }
}
