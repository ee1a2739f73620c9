use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use crate::core::error::{Error, ErrorKind, Result};
use crate::storage::layout::StorageLayout;

/// Single writer guarantee
///
/// Held for the whole duration of a build. The lock file lives beside the
/// index directory, so the build may wipe the directory while holding it.
/// The file outlives the lock: every writer must lock the same inode.
#[derive(Debug)]
pub struct IndexLock {
    file: File,
    path: PathBuf,
}

impl IndexLock {
    /// Fails with `Io` when another writer holds the lock, and with `Build`
    /// when the lock file cannot be created.
    pub fn acquire<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let path = StorageLayout::lock_path(&base_dir);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::from(e).into_build_error())?;
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| Error::from(e).into_build_error())?;

        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            use libc::{flock, LOCK_EX, LOCK_NB};

            let fd = file.as_raw_fd();
            let rc = unsafe { flock(fd, LOCK_EX | LOCK_NB) };
            if rc != 0 {
                return Err(Error::new(
                    ErrorKind::Io,
                    format!("index {} is being built by another writer", base_dir.as_ref().display()),
                ));
            }
        }

        Ok(IndexLock { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for IndexLock {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            use libc::{flock, LOCK_UN};

            let fd = self.file.as_raw_fd();
            unsafe {
                flock(fd, LOCK_UN);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn second_writer_is_refused() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("idx");

        let lock = IndexLock::acquire(&target).unwrap();
        assert!(lock.path().exists());
        let err = IndexLock::acquire(&target).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Io);

        drop(lock);
        assert!(dir.path().join("idx.lock").exists());
        IndexLock::acquire(&target).unwrap();
    }

    #[test]
    fn stale_lock_file_does_not_block() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("idx");
        fs::write(dir.path().join("idx.lock"), b"").unwrap();

        let lock = IndexLock::acquire(&target).unwrap();
        assert_eq!(IndexLock::acquire(&target).unwrap_err().kind, ErrorKind::Io);
        drop(lock);
    }

    #[test]
    fn unusable_parent_is_a_build_error() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("plain-file");
        fs::write(&file, b"not a directory").unwrap();

        let err = IndexLock::acquire(file.join("nested").join("idx")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Build);
    }
}
