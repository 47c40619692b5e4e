//! Configuration Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// An explicitly requested configuration file doesn't exist.
    #[display("configuration file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// Only `.toml`, `.yaml`/`.yml` and `.json` files are understood.
    #[display("unsupported configuration format: {}", _0.display())]
    UnsupportedFormat(#[error(not(source))] PathBuf),
    /// The merged sources didn't produce valid settings.
    #[display("failed to load configuration")]
    Load,
    /// No root was configured and the platform has no cache directory for us.
    #[display("could not determine a cache directory")]
    CacheDirectory,
    /// Settings loaded fine but the store refused them.
    #[display("failed to open file store")]
    Store,
}
