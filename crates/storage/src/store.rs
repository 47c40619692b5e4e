//! The content-addressed store itself.

use crate::coordinate::Coordinate;
use crate::error::{ErrorKind, Result};
use crate::external::{Candidates, ExternalArtifactCache, PatternBasedExternalArtifactCache};
use crate::hash::ContentHash;
use crate::path::{join_segments, validate as validate_path};
use crate::suffix::{RandomSuffix, SuffixSource, clamp};
use crate::temp::TemporaryFileProvider;
use depot_pattern::{PathPattern, substitute_token};
use exn::ResultExt;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::instrument;

/// Where artifacts live beneath the store root.
pub const ARTIFACT_PATTERN: &str =
    "[organisation]/[module](/[branch])/[revision]/[type]/[sha1]/[artifact]-[revision](-[classifier])(.[ext])";
/// [`ARTIFACT_PATTERN`] with the hash segment opened up to any directory.
pub const EXTERNAL_VIEW_PATTERN: &str =
    "[organisation]/[module](/[branch])/[revision]/[type]/*/[artifact]-[revision](-[classifier])(.[ext])";
/// The token filled in with the content hash once it is known.
pub const HASH_TOKEN: &str = "sha1";
/// Name of the staging subtree directly beneath the store root.
pub const STAGING_DIR: &str = ".staging";
pub const DEFAULT_STAGING_ATTEMPTS: u32 = 8;

/// What [`FileStore::add`] did with a staged file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Publish {
    /// The staged file now lives at this path.
    Added(PathBuf),
    /// Identical content was already stored here; the staged file was discarded.
    AlreadyPresent(PathBuf),
}
impl Publish {
    pub fn path(&self) -> &Path {
        match self {
            Self::Added(path) | Self::AlreadyPresent(path) => path,
        }
    }

    pub fn into_path(self) -> PathBuf {
        match self {
            Self::Added(path) | Self::AlreadyPresent(path) => path,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Self::Added(_))
    }
}

pub struct FileStoreBuilder {
    root: PathBuf,
    pattern: Option<String>,
    suffixes: Option<Arc<dyn SuffixSource>>,
    staging_attempts: u32,
}
impl FileStoreBuilder {
    /// Replace [`ARTIFACT_PATTERN`]. The pattern must contain `[sha1]`
    /// outside of any optional group.
    pub fn artifact_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn suffix_source(mut self, source: impl SuffixSource + 'static) -> Self {
        self.suffixes = Some(Arc::new(source));
        self
    }

    /// How many names [`FileStore::create_staging_file`] tries before giving
    /// up. Zero is treated as one.
    pub fn staging_attempts(mut self, attempts: u32) -> Self {
        self.staging_attempts = attempts.max(1);
        self
    }

    /// Validate the configuration and open the store, creating the root
    /// directory if it doesn't exist yet.
    ///
    /// # Errors
    ///
    /// [`InvalidPath`](ErrorKind::InvalidPath) if the root is relative or
    /// exists but is not a directory; [`Configuration`](ErrorKind::Configuration)
    /// if the pattern doesn't parse or has no mandatory `[sha1]` segment.
    pub fn build(self) -> Result<FileStore> {
        let root = self.root;
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        if root.exists() {
            if !root.is_dir() {
                exn::bail!(ErrorKind::InvalidPath(root));
            }
        } else {
            fs::create_dir_all(&root).map_err(|e| ErrorKind::io(e, &root))?;
        }

        let source = self.pattern.as_deref().unwrap_or(ARTIFACT_PATTERN);
        let pattern = source
            .parse::<PathPattern>()
            .or_raise(|| ErrorKind::Configuration(source.to_string()))?;
        if !pattern.requires_token(HASH_TOKEN) {
            exn::bail!(ErrorKind::Configuration(format!(
                "{pattern} (needs a [{HASH_TOKEN}] segment outside optional groups)"
            )));
        }
        if let Some(token) = pattern
            .tokens()
            .find(|token| *token != HASH_TOKEN && !Coordinate::TOKENS.iter().any(|known| known == token))
        {
            exn::bail!(ErrorKind::Configuration(format!("{pattern} (unknown token [{token}])")));
        }
        let external = pattern
            .replace_token(HASH_TOKEN, "*")
            .or_raise(|| ErrorKind::Configuration(pattern.to_string()))?;

        tracing::debug!(root = %root.display(), %pattern, "Opened file store");
        Ok(FileStore {
            root,
            pattern,
            external,
            suffixes: self.suffixes.unwrap_or_else(|| Arc::new(RandomSuffix)),
            staging_attempts: self.staging_attempts,
        })
    }
}

/// Content-addressed store for downloaded artifacts.
///
/// Files are published at a path rendered from their [`Coordinate`] and the
/// SHA-1 of their bytes, so two different downloads of "the same" artifact
/// end up side by side rather than overwriting each other. Once published a
/// file is never modified or removed by the store.
///
/// There is no in-process locking: any number of threads or processes may
/// publish into the same root at once, and the store is `Send + Sync`.
///
/// # Examples
///
/// ```no_run
/// use depot_storage::{Coordinate, FileStore};
/// use std::io::Write;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = FileStore::builder("/var/cache/depot").build()?;
/// let coordinate = Coordinate::new("org.example", "lib", "1.0", "jar", "lib")?.with_extension("jar")?;
///
/// let (staged, mut file) = store.create_staging_file(["downloads"])?;
/// file.write_all(b"...")?;
/// drop(file);
///
/// let published = store.add(&coordinate, &staged)?;
/// println!("stored at {}", published.path().display());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct FileStore {
    root: PathBuf,
    pattern: PathPattern,
    external: PathPattern,
    suffixes: Arc<dyn SuffixSource>,
    staging_attempts: u32,
}
impl FileStore {
    pub fn builder(root: impl Into<PathBuf>) -> FileStoreBuilder {
        FileStoreBuilder {
            root: root.into(),
            pattern: None,
            suffixes: None,
            staging_attempts: DEFAULT_STAGING_ATTEMPTS,
        }
    }

    /// Open a store at `root` with the default pattern and suffix source.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        Self::builder(root).build()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// Directory that staging paths and temporary files are allocated in.
    pub fn staging_dir(&self) -> PathBuf {
        self.root.join(STAGING_DIR)
    }

    /// Where content with `hash` for `coordinate` lives, relative to the root.
    pub fn artifact_path(&self, coordinate: &Coordinate, hash: &ContentHash) -> Result<PathBuf> {
        let rendered = self
            .pattern
            .render(coordinate)
            .or_raise(|| ErrorKind::Configuration(self.pattern.to_string()))?;
        let rendered = substitute_token(&rendered, HASH_TOKEN, hash.as_str());
        // Coordinates can't contain brackets, so any left over are placeholders
        // nothing filled in.
        if rendered.contains('[') {
            exn::bail!(ErrorKind::Configuration(format!("{} (left `{rendered}` unresolved)", self.pattern)));
        }
        let path = validate_path(rendered)?;
        // Artifacts must never land in the staging subtree.
        if path.starts_with(STAGING_DIR) {
            exn::bail!(ErrorKind::InvalidPath(path));
        }
        Ok(path)
    }

    /// Publish a staged file under `coordinate`.
    ///
    /// The file is hashed and moved to its canonical path. If that path is
    /// already occupied, by an earlier call or by a concurrent writer winning
    /// the race, the staged file is discarded and the existing path returned.
    /// The staged file is consumed either way.
    ///
    /// # Errors
    ///
    /// I/O errors reading the staged file carry its path.
    /// [`Publish`](ErrorKind::Publish) if relocation fails; the staged file
    /// may or may not still exist afterwards.
    #[instrument(skip_all, fields(coordinate = %coordinate, staged = %staged.as_ref().display()))]
    pub fn add(&self, coordinate: &Coordinate, staged: impl AsRef<Path>) -> Result<Publish> {
        let staged = staged.as_ref();
        let hash = ContentHash::of_file(staged)?;
        let destination = self.root.join(self.artifact_path(coordinate, &hash)?);

        if destination.try_exists().map_err(|e| ErrorKind::io(e, &destination))? {
            tracing::debug!(path = %destination.display(), %hash, "Content already stored");
            discard(staged);
            return Ok(Publish::AlreadyPresent(destination));
        }
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).or_raise(|| ErrorKind::Publish(destination.clone()))?;
        }
        let published = relocate(staged, destination)?;
        tracing::info!(path = %published.path().display(), %hash, added = published.is_new(), "Published artifact");
        Ok(published)
    }

    /// A fresh path beneath the staging directory. Nothing is created and
    /// nothing is checked; see [`create_staging_file`](Self::create_staging_file)
    /// for a collision-safe variant.
    pub fn allocate_staging_path<I, S>(&self, segments: I) -> Result<PathBuf>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<Path>,
    {
        Ok(self.staging_subdir(segments)?.join(self.next_suffix()))
    }

    /// Create and open a new, empty staging file.
    ///
    /// Names are drawn like [`allocate_staging_path`](Self::allocate_staging_path)
    /// but opened exclusively, retrying with a fresh name when one is taken.
    ///
    /// # Errors
    ///
    /// [`AlreadyExists`](ErrorKind::AlreadyExists) with the last name tried
    /// once every attempt collided.
    #[instrument(level = "debug", skip_all)]
    pub fn create_staging_file<I, S>(&self, segments: I) -> Result<(PathBuf, File)>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<Path>,
    {
        let dir = self.staging_subdir(segments)?;
        fs::create_dir_all(&dir).map_err(|e| ErrorKind::io(e, &dir))?;

        let mut last = dir.clone();
        for attempt in 1..=self.staging_attempts {
            let path = dir.join(self.next_suffix());
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    tracing::debug!(attempt, path = %path.display(), "Staging name taken, retrying");
                    last = path;
                },
                Err(e) => return Err(ErrorKind::io(e, &path)),
            }
        }
        exn::bail!(ErrorKind::AlreadyExists(last));
    }

    /// Temporary files rooted at the staging directory.
    pub fn temporary_files(&self) -> TemporaryFileProvider {
        TemporaryFileProvider::new(self.staging_dir())
    }

    /// Probe for stored variants of a coordinate without knowing their hash.
    pub fn external_cache(&self) -> PatternBasedExternalArtifactCache {
        PatternBasedExternalArtifactCache::new(self.root.clone(), self.external.clone())
    }

    fn staging_subdir<I, S>(&self, segments: I) -> Result<PathBuf>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<Path>,
    {
        Ok(self.staging_dir().join(join_segments(segments)?))
    }

    fn next_suffix(&self) -> String {
        clamp(self.suffixes.next_suffix()).to_string()
    }
}

impl ExternalArtifactCache for FileStore {
    fn probe(&self, coordinate: &Coordinate) -> Candidates {
        self.external_cache().probe(coordinate)
    }
}

impl fmt::Debug for FileStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStore")
            .field("root", &self.root)
            .field("pattern", &self.pattern.as_str())
            .field("staging_attempts", &self.staging_attempts)
            .finish_non_exhaustive()
    }
}

/// Move `staged` to `destination` without ever replacing an existing file.
///
/// A hard link fails if the destination exists, which makes it the no-clobber
/// primitive. Filesystems without hard links get a rename instead.
fn relocate(staged: &Path, destination: PathBuf) -> Result<Publish> {
    match fs::hard_link(staged, &destination) {
        Ok(()) => {
            discard(staged);
            Ok(Publish::Added(destination))
        },
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            tracing::debug!(path = %destination.display(), "Lost publish race");
            discard(staged);
            Ok(Publish::AlreadyPresent(destination))
        },
        Err(e) => {
            tracing::debug!(error = %e, "Hard link refused, falling back to rename");
            rename_into_place(staged, destination)
        },
    }
}

/// Rename cannot refuse to overwrite, so a destination that exists after a
/// failed rename means another writer published first.
fn rename_into_place(staged: &Path, destination: PathBuf) -> Result<Publish> {
    match fs::rename(staged, &destination) {
        Ok(()) => Ok(Publish::Added(destination)),
        Err(_) if destination.is_file() => {
            discard(staged);
            Ok(Publish::AlreadyPresent(destination))
        },
        Err(e) => Err(e).or_raise(|| ErrorKind::Publish(destination)),
    }
}

/// Remove a staged file that is no longer needed. Failure leaves an orphan in
/// the staging directory, which is worth a warning but not an error.
fn discard(staged: &Path) {
    if let Err(e) = fs::remove_file(staged)
        && e.kind() != io::ErrorKind::NotFound
    {
        tracing::warn!(path = %staged.display(), error = %e, "Could not remove staged file");
    }
}
