//! Layered configuration for the artifact store.
//!
//! Settings are merged from, in increasing priority:
//!
//! 1. built-in defaults,
//! 2. an optional configuration file (TOML, YAML or JSON, chosen by extension),
//! 3. `DEPOT_`-prefixed environment variables (`DEPOT_ROOT`,
//!    `DEPOT_ARTIFACT_PATTERN`, `DEPOT_STAGING_ATTEMPTS`).
//!
//! ```toml
//! root = "/var/cache/depot"
//! staging_attempts = 16
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use depot_storage::{ARTIFACT_PATTERN, DEFAULT_STAGING_ATTEMPTS, FileStore};
use directories::ProjectDirs;
use exn::{OptionExt, ResultExt};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "DEPOT_";
/// Directory beneath the platform cache directory used when no root is set.
pub const DEFAULT_STORE_DIR: &str = "filestore";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Absolute store root. Defaults to `<platform cache dir>/filestore`.
    pub root: Option<PathBuf>,
    pub artifact_pattern: String,
    pub staging_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: None,
            artifact_pattern: ARTIFACT_PATTERN.to_string(),
            staging_attempts: DEFAULT_STAGING_ATTEMPTS,
        }
    }
}

impl Config {
    /// Load defaults, then `file` if given, then the environment.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let config = Self::from_figment(&Self::figment(file)?)?;
        tracing::debug!(?config, "Loaded configuration");
        Ok(config)
    }

    /// The provider stack behind [`load`](Self::load), for callers that want
    /// to merge in sources of their own.
    pub fn figment(file: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = file {
            if !path.is_file() {
                exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
            }
            figment = match path.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => figment.merge(Toml::file(path)),
                Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
                Some("json") => figment.merge(Json::file(path)),
                _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    pub fn from_figment(figment: &Figment) -> Result<Self> {
        figment.extract().or_raise(|| ErrorKind::Load)
    }

    /// The configured root, or the platform default.
    pub fn store_root(&self) -> Result<PathBuf> {
        if let Some(root) = &self.root {
            return Ok(root.clone());
        }
        let dirs = ProjectDirs::from("", "", "depot").ok_or_raise(|| ErrorKind::CacheDirectory)?;
        Ok(dirs.cache_dir().join(DEFAULT_STORE_DIR))
    }

    /// Open (creating if needed) the store these settings describe.
    pub fn open_store(&self) -> Result<FileStore> {
        FileStore::builder(self.store_root()?)
            .artifact_pattern(&self.artifact_pattern)
            .staging_attempts(self.staging_attempts)
            .build()
            .or_raise(|| ErrorKind::Store)
    }
}
