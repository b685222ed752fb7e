use log::info;
use models_fetch::{
    Aria2Fetcher, DownloadTarget, FetchError, FolderGroup, HubClient, Manifest,
    MultiProgressWrapper, Repo, hub, run,
};
use std::path::Path;

/// The weight files this tool keeps on disk. Built fresh per invocation
/// and handed to the runner; there is no other configuration.
fn manifest() -> Manifest {
    Manifest::new(vec![FolderGroup::new(
        "models",
        vec![
            DownloadTarget::new(
                "https://huggingface.co/laion/CLIP-ViT-bigG-14-laion2B-39B-b160k/resolve/main/open_clip_pytorch_model.bin",
            ),
            DownloadTarget::with_file_name(
                "https://huggingface.co/Kijai/SUPIR_pruned/resolve/main/SUPIR-v0Q_fp16.safetensors",
                "v0Q.safetensors",
            ),
        ],
    )])
}

const SDXL_CLIP_REPO: &str = "openai/clip-vit-large-patch14";

fn main() -> Result<(), FetchError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Individual downloader failures are logged inside run(); only folder
    // creation can make this return Err.
    let report = run(&manifest(), &Aria2Fetcher::default())?;
    info!(
        "Table done: {} downloaded, {} skipped, {} failed",
        report.downloaded, report.skipped, report.failed
    );

    // Snapshot pull is fatal on failure, unlike the table loop.
    let repo = Repo::model(SDXL_CLIP_REPO);
    let local_dir = Path::new("models").join(repo.local_dir_name());
    info!("Downloading SDXL CLIP model: {}", repo.repo_id());
    HubClient::new(repo).pull_with_progress(&local_dir, MultiProgressWrapper::new())?;
    info!(
        "Snapshot {} contains {} files",
        local_dir.display(),
        hub::local_files(&local_dir)?.len()
    );

    Ok(())
}
