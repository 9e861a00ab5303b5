//! Local source port (driven/secondary port)
//!
//! Interface for turning a local directory into a [`ResourceTree`] snapshot
//! and for reading individual file contents during deployment. This is pure
//! I/O; the real implementation lives in `s7web-deploy::scanner`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::newtypes::ResourcePath;
use crate::domain::resource::ResourceTree;

/// Names and extensions skipped while scanning a local directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreConfig {
    /// Directory names skipped entirely (e.g. `.git`, `node_modules`)
    #[serde(default)]
    pub dir_names: Vec<String>,
    /// Exact file names skipped (e.g. `.DS_Store`)
    #[serde(default)]
    pub file_names: Vec<String>,
    /// File extensions skipped, without the dot (e.g. `tmp`, `bak`)
    #[serde(default)]
    pub extensions: Vec<String>,
}

impl IgnoreConfig {
    /// Whether a directory with this name should be skipped
    #[must_use]
    pub fn skips_dir(&self, name: &str) -> bool {
        self.dir_names.iter().any(|d| d == name)
    }

    /// Whether a file with this name should be skipped
    #[must_use]
    pub fn skips_file(&self, name: &str) -> bool {
        if self.file_names.iter().any(|f| f == name) {
            return true;
        }
        match name.rsplit_once('.') {
            Some((_, ext)) => self.extensions.iter().any(|e| e == ext),
            None => false,
        }
    }
}

/// Port trait for building resource trees from the local filesystem
#[async_trait::async_trait]
pub trait ILocalSource: Send + Sync {
    /// Scan `root` into a tree snapshot, honoring the ignore rules.
    async fn scan(&self, root: &Path, ignore: &IgnoreConfig) -> anyhow::Result<ResourceTree>;

    /// Read the bytes of the file at `path` below `root`.
    async fn read(&self, root: &Path, path: &ResourcePath) -> anyhow::Result<Vec<u8>>;
}
