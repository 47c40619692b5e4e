//! Content-addressed file store for downloaded build artifacts.
//!
//! A downloaded file is written somewhere under the store's staging
//! directory, then handed to [`FileStore::add`] together with its
//! [`Coordinate`]. The store hashes the bytes and publishes the file at a
//! path rendered from the coordinate and the hash:
//!
//! ```text
//! <root>/org.example/lib/1.0/jar/<sha1>/lib-1.0.jar
//! ```
//!
//! Different bytes for the same coordinate land in sibling hash directories,
//! so nothing is ever overwritten, and publishing the same bytes twice is a
//! no-op. When a resolver only knows the coordinate, the
//! [`ExternalArtifactCache`] view lists every stored variant as a
//! [`CachedArtifact`] for it to check against whatever hash it learns later.
//!
//! With the `async` feature, [`AsyncFileStore`] offers the same operations
//! for use inside a Tokio runtime.

mod artifact;
mod coordinate;
pub mod error;
mod external;
#[cfg(feature = "async")]
mod futures;
mod hash;
mod path;
mod store;
mod suffix;
mod temp;

pub use crate::artifact::CachedArtifact;
pub use crate::coordinate::Coordinate;
pub use crate::external::{Candidates, ExternalArtifactCache, PatternBasedExternalArtifactCache};
#[cfg(feature = "async")]
pub use crate::futures::AsyncFileStore;
pub use crate::hash::ContentHash;
pub use crate::path::validate as validate_path;
pub use crate::store::{
    ARTIFACT_PATTERN, DEFAULT_STAGING_ATTEMPTS, EXTERNAL_VIEW_PATTERN, FileStore, FileStoreBuilder, HASH_TOKEN,
    Publish, STAGING_DIR,
};
pub use crate::suffix::{RandomSuffix, SeededSuffix, SuffixSource};
pub use crate::temp::TemporaryFileProvider;
pub use depot_pattern::PathPattern;
