//! Content hashing.

use crate::error::{Error, ErrorKind, Result};
use sha1::{Digest, Sha1};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

/// SHA-1 digest of a file's bytes, lowercase hex encoded.
///
/// Two files with equal hashes are treated as the same content; bytes are
/// never compared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash(String);

impl ContentHash {
    /// Length of the hex encoding (160 bits).
    pub const HEX_LEN: usize = 40;

    pub fn of_bytes(bytes: impl AsRef<[u8]>) -> Self {
        Self(hex::encode(Sha1::digest(bytes.as_ref())))
    }

    /// Hash everything `reader` yields without buffering it all in memory.
    pub fn of_reader(mut reader: impl Read) -> io::Result<Self> {
        let mut hasher = Sha1::new();
        io::copy(&mut reader, &mut hasher)?;
        Ok(Self(hex::encode(hasher.finalize())))
    }

    /// Hash the full contents of the file at `path`.
    pub fn of_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ErrorKind::io(e, path))?;
        Self::of_reader(file).map_err(|e| ErrorKind::io(e, path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ContentHash {
    type Err = Error;

    /// Accepts either case; the result is always lowercase.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.len() != Self::HEX_LEN || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            exn::bail!(ErrorKind::InvalidHash(s.to_string()));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContentHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
