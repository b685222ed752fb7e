//! Identity of a repository on the hub and its URL paths.

/// The representation of a repo on the hub: an id of the form
/// `<namespace>/<name>` plus a revision.
#[derive(Clone, Debug)]
pub struct Repo {
    repo_id: String,
    revision: String,
}

impl Repo {
    const REVISION_MAIN: &str = "main";

    pub fn model(repo_id: impl Into<String>) -> Self {
        Self {
            repo_id: repo_id.into(),
            revision: Self::REVISION_MAIN.to_string(),
        }
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = revision.into();
        self
    }

    pub fn repo_id(&self) -> &str {
        &self.repo_id
    }

    pub fn revision(&self) -> &str {
        &self.revision
    }

    /// Local directory name derived from the id: the portion after the
    /// namespace slash.
    ///
    /// # Examples
    /// ```
    /// use models_fetch::Repo;
    /// let repo = Repo::model("openai/clip-vit-large-patch14");
    /// assert_eq!(repo.local_dir_name(), "clip-vit-large-patch14");
    /// ```
    pub fn local_dir_name(&self) -> &str {
        self.repo_id
            .split_once('/')
            .map(|(_, name)| name)
            .unwrap_or(&self.repo_id)
    }

    /// URL path of a raw file: `<repo_id>/resolve/<revision>/<file>`.
    pub fn resolve_path(&self, filename: &str) -> String {
        format!(
            "{}/resolve/{}/{}",
            self.repo_id,
            self.safe_revision_path(),
            filename
        )
    }

    /// URL path of the recursive tree listing for this repo.
    pub fn tree_api_path(&self) -> String {
        format!(
            "api/models/{}/tree/{}",
            self.repo_id,
            self.safe_revision_path()
        )
    }

    /// Revision needs to be url escaped before being used in a URL
    fn safe_revision_path(&self) -> String {
        self.revision.replace('/', "%2F")
    }
}
