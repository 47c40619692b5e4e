//! Temporary files beneath a fixed base directory.

use crate::error::{ErrorKind, Result};
use crate::path::join_segments;
use std::fs;
use std::path::{Path, PathBuf};

/// Hands out paths and freshly created files under a base directory.
///
/// Downloaders use this to pick somewhere to write before handing the file
/// to [`FileStore::add`](crate::FileStore::add). The store's own provider
/// ([`FileStore::temporary_files`](crate::FileStore::temporary_files)) is
/// rooted at the staging subtree, so files land on the same volume as the
/// store and can be published without a copy.
#[derive(Debug, Clone)]
pub struct TemporaryFileProvider {
    base: PathBuf,
}

impl TemporaryFileProvider {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Path of `segments` beneath the base directory. Nothing is created.
    ///
    /// # Examples
    ///
    /// ```
    /// use depot_storage::TemporaryFileProvider;
    /// use std::path::Path;
    ///
    /// let provider = TemporaryFileProvider::new("/var/cache/depot/.staging");
    /// let path = provider.new_temporary_file(["downloads", "lib-1.0.jar"]).unwrap();
    /// assert_eq!(path, Path::new("/var/cache/depot/.staging/downloads/lib-1.0.jar"));
    /// assert!(provider.new_temporary_file(["..", "escape"]).is_err());
    /// ```
    pub fn new_temporary_file<I, S>(&self, segments: I) -> Result<PathBuf>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<Path>,
    {
        Ok(self.base.join(join_segments(segments)?))
    }

    /// Create the directory for `segments` and an empty, uniquely named file
    /// inside it (`<prefix><random><suffix>`). The file is kept on disk; the
    /// caller owns its cleanup.
    pub fn create_temporary_file<I, S>(&self, prefix: &str, suffix: Option<&str>, segments: I) -> Result<PathBuf>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<Path>,
    {
        let dir = self.base.join(join_segments(segments)?);
        fs::create_dir_all(&dir).map_err(|e| ErrorKind::io(e, &dir))?;
        let file = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(suffix.unwrap_or_default())
            .tempfile_in(&dir)
            .map_err(|e| ErrorKind::io(e, &dir))?;
        let (_, path) = file.keep().map_err(|e| ErrorKind::io(e.error, &dir))?;
        tracing::trace!(path = %path.display(), "Created temporary file");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_temporary_file_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let provider = TemporaryFileProvider::new(dir.path());
        let path = provider.new_temporary_file(["a", "b.tmp"]).unwrap();
        assert_eq!(path, dir.path().join("a/b.tmp"));
        assert!(!path.exists());
        assert!(!dir.path().join("a").exists());
    }

    #[test]
    fn test_new_temporary_file_without_segments() {
        let dir = tempfile::tempdir().unwrap();
        let provider = TemporaryFileProvider::new(dir.path());
        assert_eq!(provider.new_temporary_file(Vec::<&str>::new()).unwrap(), dir.path());
    }

    #[test]
    fn test_create_temporary_file() {
        let dir = tempfile::tempdir().unwrap();
        let provider = TemporaryFileProvider::new(dir.path());
        let first = provider.create_temporary_file("dl-", Some(".part"), ["maven"]).unwrap();
        let second = provider.create_temporary_file("dl-", Some(".part"), ["maven"]).unwrap();

        assert_ne!(first, second);
        for path in [&first, &second] {
            assert!(path.is_file());
            assert_eq!(path.parent().unwrap(), dir.path().join("maven"));
            let name = path.file_name().unwrap().to_str().unwrap();
            assert!(name.starts_with("dl-"));
            assert!(name.ends_with(".part"));
        }
    }

    #[test]
    fn test_create_temporary_file_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let provider = TemporaryFileProvider::new(dir.path().join("base"));
        let err = provider.create_temporary_file("x", None, ["..", ".."]).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }
}
