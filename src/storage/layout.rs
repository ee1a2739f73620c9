use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use crate::core::error::{Error, ErrorKind, Result};
use crate::storage::segment::SegmentId;

/// Directory structure of one index
#[derive(Debug, Clone)]
pub struct StorageLayout {
    pub base_dir: PathBuf,      // Root directory
    pub segments_dir: PathBuf,  // Committed postings batches (.seg files)
    pub meta_dir: PathBuf,      // Manifest location
}

impl StorageLayout {
    fn at(base_dir: PathBuf) -> Self {
        StorageLayout {
            segments_dir: base_dir.join("segments"),
            meta_dir: base_dir.join("meta"),
            base_dir,
        }
    }

    /// Deletes whatever lives at `base_dir` and lays out an empty index.
    pub fn reset<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        if base_dir.exists() {
            debug!(path = %base_dir.display(), "removing previous index");
            fs::remove_dir_all(&base_dir)?;
        }

        let layout = Self::at(base_dir);
        fs::create_dir_all(&layout.segments_dir)?;
        fs::create_dir_all(&layout.meta_dir)?;
        Ok(layout)
    }

    /// Layout of an existing index; nothing is created.
    pub fn open<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let layout = Self::at(base_dir.as_ref().to_path_buf());
        if !layout.manifest_path().exists() {
            return Err(Error::new(
                ErrorKind::NotFound,
                format!("no index manifest under {}", layout.base_dir.display()),
            ));
        }
        Ok(layout)
    }

    pub fn segment_path(&self, id: &SegmentId) -> PathBuf {
        self.segments_dir.join(format!("{}.seg", id.0))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.meta_dir.join("manifest.bin")
    }

    /// Lock file sits next to the index so a reset cannot delete it.
    pub fn lock_path<P: AsRef<Path>>(base_dir: P) -> PathBuf {
        let base_dir = base_dir.as_ref();
        let name = base_dir.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "index".to_string());
        base_dir.with_file_name(format!("{}.lock", name))
    }
}

/// Writes `data` to `path` so readers see either the old or the new file.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    {
        use std::io::Write;
        let mut file = fs::File::create(&tmp)?;
        file.write_all(data)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    sync_dir(path)
}

fn sync_dir(path: &Path) -> Result<()> {
    #[cfg(unix)]
    if let Some(parent) = path.parent() {
        fs::File::open(parent)?.sync_all()?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_discards_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("idx");
        fs::create_dir_all(&base).unwrap();
        fs::write(base.join("stale.txt"), b"old").unwrap();

        let layout = StorageLayout::reset(&base).unwrap();
        assert!(!base.join("stale.txt").exists());
        assert!(layout.segments_dir.is_dir());
        assert!(layout.meta_dir.is_dir());
    }

    #[test]
    fn open_requires_a_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let err = StorageLayout::open(dir.path()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[test]
    fn lock_is_a_sibling() {
        let lock = StorageLayout::lock_path("/data/index/small");
        assert_eq!(lock, PathBuf::from("/data/index/small.lock"));
    }

    #[test]
    fn atomic_write_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.bin");
        write_atomic(&path, b"one").unwrap();
        write_atomic(&path, b"two").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"two");
        assert!(!path.with_extension("tmp").exists());
    }
}
