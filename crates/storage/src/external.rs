//! Probing the store for artifacts whose hash isn't known yet.

use crate::artifact::CachedArtifact;
use crate::coordinate::Coordinate;
use crate::error::{ErrorKind, Result};
use crate::hash::ContentHash;
use crate::path::validate as validate_path;
use depot_pattern::PathPattern;
use exn::ResultExt;
use std::ffi::OsString;
use std::fs::{self, ReadDir};
use std::io;
use std::iter;
use std::path::PathBuf;
use tracing::instrument;

/// A segment that stands for "every subdirectory here".
const WILDCARD: &str = "*";

/// Lazy, single-pass sequence of stored artifacts.
pub type Candidates = Box<dyn Iterator<Item = Result<CachedArtifact>> + Send>;

/// Something that can list the cached variants of a coordinate.
pub trait ExternalArtifactCache {
    /// Every stored artifact for `coordinate`, in filesystem order.
    ///
    /// Nothing is read until the sequence is advanced. Errors are yielded in
    /// place of the candidate they concern; a coordinate that can't be
    /// rendered at all yields that error as the only item.
    fn probe(&self, coordinate: &Coordinate) -> Candidates;

    /// The first candidate whose content matches `hash`.
    fn find(&self, coordinate: &Coordinate, hash: &ContentHash) -> Result<Option<CachedArtifact>> {
        for candidate in self.probe(coordinate) {
            let candidate = candidate?;
            if candidate.matches(hash) {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }
}

/// Resolves a wildcard pattern against the filesystem.
///
/// Each path segment that is exactly `*` matches every subdirectory at that
/// position. Missing directories along the way simply contribute nothing.
#[derive(Debug, Clone)]
pub struct PatternBasedExternalArtifactCache {
    root: PathBuf,
    pattern: PathPattern,
}
impl PatternBasedExternalArtifactCache {
    pub fn new(root: impl Into<PathBuf>, pattern: PathPattern) -> Self {
        Self { root: root.into(), pattern }
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    fn segments(&self, coordinate: &Coordinate) -> Result<Vec<OsString>> {
        let rendered = self
            .pattern
            .render(coordinate)
            .or_raise(|| ErrorKind::Configuration(self.pattern.to_string()))?;
        let relative = validate_path(rendered)?;
        Ok(relative.iter().map(ToOwned::to_owned).collect())
    }
}

impl ExternalArtifactCache for PatternBasedExternalArtifactCache {
    #[instrument(level = "debug", skip_all, fields(coordinate = %coordinate))]
    fn probe(&self, coordinate: &Coordinate) -> Candidates {
        match self.segments(coordinate) {
            Ok(segments) => {
                tracing::trace!(root = %self.root.display(), "Probing store");
                Box::new(Walk::new(self.root.clone(), segments))
            },
            Err(e) => Box::new(iter::once(Err(e))),
        }
    }
}

/// A directory whose entries are being expanded for a wildcard segment.
struct Listing {
    dir: PathBuf,
    entries: ReadDir,
    /// Index of the segment after the wildcard.
    resume: usize,
}

/// Depth-first expansion of wildcard segments.
///
/// Pending work is a stack of `(path so far, next segment index)`. Literal
/// segments are appended directly; a wildcard opens the directory and pushes
/// one entry per subdirectory. At most one directory handle is open at a time.
struct Walk {
    segments: Vec<OsString>,
    stack: Vec<(PathBuf, usize)>,
    listing: Option<Listing>,
}
impl Walk {
    fn new(root: PathBuf, segments: Vec<OsString>) -> Self {
        Self { segments, stack: vec![(root, 0)], listing: None }
    }
}

impl Iterator for Walk {
    type Item = Result<CachedArtifact>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(listing) = &mut self.listing {
                match listing.entries.next() {
                    Some(Ok(entry)) => {
                        let path = entry.path();
                        if path.is_dir() {
                            self.stack.push((path, listing.resume));
                        }
                    },
                    Some(Err(e)) => return Some(Err(ErrorKind::io(e, &listing.dir))),
                    None => self.listing = None,
                }
                continue;
            }

            let (mut path, mut index) = self.stack.pop()?;
            while index < self.segments.len() && self.segments[index] != WILDCARD {
                path.push(&self.segments[index]);
                index += 1;
            }

            if index == self.segments.len() {
                if path.is_file() {
                    return Some(CachedArtifact::from_path(path));
                }
                continue;
            }

            match fs::read_dir(&path) {
                Ok(entries) => self.listing = Some(Listing { dir: path, entries, resume: index + 1 }),
                Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {},
                Err(e) => return Some(Err(ErrorKind::io(e, &path))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEW: &str = "[organisation]/[module]/[revision]/*/[artifact]-[revision](.[ext])";

    fn lib() -> Coordinate {
        Coordinate::new("org.example", "lib", "1.0", "jar", "lib")
            .unwrap()
            .with_extension("jar")
            .unwrap()
    }

    fn cache(root: &std::path::Path, pattern: &str) -> PatternBasedExternalArtifactCache {
        PatternBasedExternalArtifactCache::new(root, pattern.parse().unwrap())
    }

    fn put(root: &std::path::Path, relative: &str, content: &[u8]) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn origins(candidates: Candidates) -> Vec<PathBuf> {
        let mut found: Vec<PathBuf> = candidates.map(|c| c.unwrap().origin().to_path_buf()).collect();
        found.sort();
        found
    }

    #[test]
    fn test_probe_expands_wildcard() {
        let dir = tempfile::tempdir().unwrap();
        let a = put(dir.path(), "org.example/lib/1.0/aaa/lib-1.0.jar", b"a");
        let b = put(dir.path(), "org.example/lib/1.0/bbb/lib-1.0.jar", b"b");
        // Noise that must not match.
        put(dir.path(), "org.example/lib/1.0/ccc/other-1.0.jar", b"c");
        put(dir.path(), "org.example/lib/1.0/stray-file", b"d");
        put(dir.path(), "org.example/lib/2.0/ddd/lib-2.0.jar", b"e");

        let found = origins(cache(dir.path(), VIEW).probe(&lib()));
        assert_eq!(found, vec![a, b]);
    }

    #[test]
    fn test_probe_missing_directories_yield_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(cache(dir.path(), VIEW).probe(&lib()).count(), 0);
        assert_eq!(cache(&dir.path().join("nope"), VIEW).probe(&lib()).count(), 0);
    }

    #[test]
    fn test_probe_skips_directories_at_leaf() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("org.example/lib/1.0/aaa/lib-1.0.jar")).unwrap();
        assert_eq!(cache(dir.path(), VIEW).probe(&lib()).count(), 0);
    }

    #[test]
    fn test_probe_multiple_wildcards() {
        let dir = tempfile::tempdir().unwrap();
        let expected = vec![
            put(dir.path(), "x/1/lib.jar", b"1"),
            put(dir.path(), "x/2/lib.jar", b"2"),
            put(dir.path(), "y/1/lib.jar", b"3"),
        ];
        put(dir.path(), "y/2/nope.jar", b"4");
        let found = origins(cache(dir.path(), "*/*/[artifact].[ext]").probe(&lib()));
        assert_eq!(found, expected);
    }

    #[test]
    fn test_probe_partial_wildcard_is_literal() {
        let dir = tempfile::tempdir().unwrap();
        put(dir.path(), "abc/lib.jar", b"x");
        let literal = put(dir.path(), "a*/lib.jar", b"y");
        let found = origins(cache(dir.path(), "a*/[artifact].[ext]").probe(&lib()));
        assert_eq!(found, vec![literal]);
    }

    #[test]
    fn test_probe_render_failure_is_single_item() {
        let dir = tempfile::tempdir().unwrap();
        let mut candidates = cache(dir.path(), "*/[classifier]/[artifact]").probe(&lib());
        let err = candidates.next().unwrap().unwrap_err();
        assert!(matches!(&*err, ErrorKind::Configuration(_)));
        assert!(candidates.next().is_none());
    }

    #[test]
    fn test_probe_is_lazy() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(dir.path(), VIEW);
        let candidates = cache.probe(&lib());
        // Created after probing, but before the first read.
        let path = put(dir.path(), "org.example/lib/1.0/aaa/lib-1.0.jar", b"late");
        assert_eq!(origins(candidates), vec![path]);
    }

    #[test]
    fn test_find() {
        let dir = tempfile::tempdir().unwrap();
        put(dir.path(), "org.example/lib/1.0/aaa/lib-1.0.jar", b"one");
        let two = put(dir.path(), "org.example/lib/1.0/bbb/lib-1.0.jar", b"two");
        let cache = cache(dir.path(), VIEW);

        let hit = cache.find(&lib(), &ContentHash::of_bytes(b"two")).unwrap().unwrap();
        assert_eq!(hit.origin(), two);
        assert!(cache.find(&lib(), &ContentHash::of_bytes(b"three")).unwrap().is_none());
    }
}
