//! Advisory lock on a snapshot directory, so two runs of the utility do
//! not download into the same tree at the same time.

use crate::utils::FetchError;
use std::fs::File;
use std::path::PathBuf;

const LOCK_RETRIES: u32 = 5;

pub struct FsLock {
    file: File,
    path: PathBuf,
}

impl FsLock {
    /// Lock `path` by creating a sibling `.lock` file and flocking it.
    /// Retries once per second before giving up.
    pub fn lock(path: PathBuf) -> Result<FsLock, FetchError> {
        let mut path = path;
        path.set_extension("lock");
        let file = File::create(&path)?;
        let mut res = lock(&file);
        for _ in 0..LOCK_RETRIES {
            if res == 0 {
                break;
            }
            std::thread::sleep(std::time::Duration::from_secs(1));
            res = lock(&file);
        }
        if res != 0 {
            Err(FetchError::LockAcquisition(path))
        } else {
            Ok(Self { file, path })
        }
    }

    pub fn unlock(&mut self) {
        unlock(&self.file);
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(target_family = "unix")]
mod unix {
    use std::os::fd::AsRawFd;

    pub(crate) fn lock(file: &std::fs::File) -> i32 {
        unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) }
    }
    pub(crate) fn unlock(file: &std::fs::File) -> i32 {
        unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_UN) }
    }
}
#[cfg(target_family = "unix")]
use unix::{lock, unlock};

#[cfg(target_family = "windows")]
mod windows {
    use std::os::windows::io::AsRawHandle;
    use windows_sys::Win32::Foundation::HANDLE;
    use windows_sys::Win32::Storage::FileSystem::{
        LOCKFILE_EXCLUSIVE_LOCK, LOCKFILE_FAIL_IMMEDIATELY, LockFileEx, UnlockFile,
    };

    pub(crate) fn lock(file: &std::fs::File) -> i32 {
        unsafe {
            let mut overlapped = std::mem::zeroed();
            let flags = LOCKFILE_EXCLUSIVE_LOCK | LOCKFILE_FAIL_IMMEDIATELY;
            let res = LockFileEx(
                file.as_raw_handle() as HANDLE,
                flags,
                0,
                !0,
                !0,
                &mut overlapped,
            );
            1 - res
        }
    }
    pub(crate) fn unlock(file: &std::fs::File) -> i32 {
        unsafe { UnlockFile(file.as_raw_handle() as HANDLE, 0, 0, !0, !0) }
    }
}
#[cfg(target_family = "windows")]
use windows::{lock, unlock};

#[cfg(not(any(target_family = "unix", target_family = "windows")))]
mod other {
    pub(crate) fn lock(_file: &std::fs::File) -> i32 {
        unimplemented!("not supported on this platform")
    }
    pub(crate) fn unlock(_file: &std::fs::File) -> i32 {
        unimplemented!("not supported on this platform")
    }
}
#[cfg(not(any(target_family = "unix", target_family = "windows")))]
use other::{lock, unlock};
