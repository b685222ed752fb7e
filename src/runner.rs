//! The table-driven loop: ensure folders exist, skip files already on
//! disk, fetch the rest one at a time.

use crate::fetcher::Fetcher;
use crate::manifest::Manifest;
use crate::utils::FetchError;
use log::{error, info};

/// What a run did, for the end-of-run summary line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Walk the manifest in order and ensure every target exists locally.
///
/// Folder creation failures are fatal and propagate. A downloader failure
/// is not: it is logged together with the captured stderr and the loop
/// moves on to the next target, so one dead mirror never blocks the rest
/// of the table.
///
/// The existence check is exactly that: a file of the right name is taken
/// as complete. A truncated earlier download will be skipped here; aria2c's
/// own `-c` resume only helps while its control file is still around.
pub fn run(manifest: &Manifest, fetcher: &impl Fetcher) -> Result<RunReport, FetchError> {
    let mut report = RunReport::default();

    for group in manifest.groups() {
        if group.folder().is_dir() {
            info!("Directory already exists: {}", group.folder().display());
        } else {
            std::fs::create_dir_all(group.folder())?;
            info!("Directory created: {}", group.folder().display());
        }

        for target in group.targets() {
            let file_name = match target.file_name() {
                Ok(name) => name,
                Err(err) => {
                    error!("Skipping target: {err}");
                    report.failed += 1;
                    continue;
                }
            };
            let dest = group.folder().join(file_name);
            if dest.exists() {
                info!("File already exists: {}", dest.display());
                report.skipped += 1;
                continue;
            }

            info!("Downloading {} to: {}", target.url(), dest.display());
            match fetcher.fetch(target.url(), group.folder(), file_name) {
                Ok(()) => {
                    info!("Downloaded {} to {}", file_name, group.folder().display());
                    report.downloaded += 1;
                }
                Err(err) => {
                    error!("Error downloading file: {err}");
                    report.failed += 1;
                }
            }
        }
    }

    Ok(report)
}
