//! Async facade over [`FileStore`].
//!
//! The store itself is synchronous filesystem code. This wraps it for use
//! inside a Tokio runtime, moving every blocking call onto the blocking
//! thread pool so hashing large downloads never stalls the executor.
//!
//! Requires the `async` feature.

use crate::artifact::CachedArtifact;
use crate::coordinate::Coordinate;
use crate::error::{ErrorKind, Result};
use crate::external::ExternalArtifactCache;
use crate::hash::ContentHash;
use crate::store::{FileStore, Publish};
use ::futures::Stream;
use async_stream::stream;
use exn::ResultExt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::spawn_blocking;

/// Cheaply cloneable handle that runs [`FileStore`] operations off the async
/// executor.
#[derive(Debug, Clone)]
pub struct AsyncFileStore {
    inner: Arc<FileStore>,
}
impl AsyncFileStore {
    pub fn new(store: FileStore) -> Self {
        Self { inner: Arc::new(store) }
    }

    /// The wrapped store, for the operations that never block
    /// (path allocation, pattern rendering).
    pub fn store(&self) -> &FileStore {
        &self.inner
    }

    /// See [`FileStore::add`].
    pub async fn add(&self, coordinate: Coordinate, staged: PathBuf) -> Result<Publish> {
        let store = Arc::clone(&self.inner);
        spawn_blocking(move || store.add(&coordinate, &staged))
            .await
            .or_raise(|| ErrorKind::Background)?
    }

    /// See [`ExternalArtifactCache::find`].
    pub async fn find(&self, coordinate: Coordinate, hash: ContentHash) -> Result<Option<CachedArtifact>> {
        let store = Arc::clone(&self.inner);
        spawn_blocking(move || store.find(&coordinate, &hash))
            .await
            .or_raise(|| ErrorKind::Background)?
    }

    /// See [`ExternalArtifactCache::probe`]. Each step of the walk, hashing
    /// included, runs on the blocking pool; nothing happens until the stream
    /// is polled.
    pub fn probe(&self, coordinate: &Coordinate) -> impl Stream<Item = Result<CachedArtifact>> + Send + 'static {
        let mut pending = Some(self.inner.probe(coordinate));
        stream! {
            while let Some(mut candidates) = pending.take() {
                match spawn_blocking(move || (candidates.next(), candidates)).await {
                    Ok((Some(item), candidates)) => {
                        pending = Some(candidates);
                        yield item;
                    },
                    Ok((None, _)) => {},
                    Err(e) => {
                        yield Err(exn::Exn::from(e).raise(ErrorKind::Background));
                    },
                }
            }
        }
    }
}

impl From<FileStore> for AsyncFileStore {
    fn from(store: FileStore) -> Self {
        Self::new(store)
    }
}
