//! Local directory scanner
//!
//! The [`ILocalSource`] implementation backing deployment: walks a directory
//! into a [`ResourceTree`] snapshot and serves file contents on demand.
//!
//! Modification times are truncated to whole seconds before they enter the
//! tree. The device stores second resolution, so keeping sub-second precision
//! locally would make every file look permanently modified.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use tracing::{debug, trace};

use s7web_core::domain::newtypes::ResourcePath;
use s7web_core::domain::resource::{FileAttrs, NodeIndex, ResourceTree};
use s7web_core::ports::local_source::{IgnoreConfig, ILocalSource};

/// Filesystem-backed local source
#[derive(Debug, Clone, Copy, Default)]
pub struct DirScanner;

impl DirScanner {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl ILocalSource for DirScanner {
    async fn scan(&self, root: &Path, ignore: &IgnoreConfig) -> Result<ResourceTree> {
        let root_name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "/".to_string());
        let mut tree = ResourceTree::new(root_name);

        // Iterative walk; entries are sorted per directory so the resulting
        // tree has deterministic insertion order
        let mut queue: VecDeque<(PathBuf, NodeIndex)> = VecDeque::new();
        queue.push_back((root.to_path_buf(), tree.root()));

        while let Some((dir, parent)) = queue.pop_front() {
            let mut entries = Vec::new();
            let mut reader = tokio::fs::read_dir(&dir)
                .await
                .with_context(|| format!("Failed to read directory {}", dir.display()))?;
            while let Some(entry) = reader.next_entry().await? {
                entries.push(entry);
            }
            entries.sort_by_key(|e| e.file_name());

            for entry in entries {
                let name = entry.file_name().to_string_lossy().into_owned();
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    if ignore.skips_dir(&name) {
                        trace!(name = %name, "Skipping ignored directory");
                        continue;
                    }
                    let idx = tree.add_directory(parent, name)?;
                    queue.push_back((entry.path(), idx));
                } else if file_type.is_file() {
                    if ignore.skips_file(&name) {
                        trace!(name = %name, "Skipping ignored file");
                        continue;
                    }
                    let metadata = entry.metadata().await?;
                    let mut attrs =
                        FileAttrs::new(metadata.len(), truncated_mtime(&metadata)?);
                    attrs.media_type = media_type_for(&name).map(str::to_string);
                    tree.add_file(parent, name, attrs)?;
                }
                // Symlinks and special files are not deployable, skip silently
            }
        }

        debug!(root = %root.display(), nodes = tree.len(), "Scanned local directory");
        Ok(tree)
    }

    async fn read(&self, root: &Path, path: &ResourcePath) -> Result<Vec<u8>> {
        let full = root.join(path.as_str());
        tokio::fs::read(&full)
            .await
            .with_context(|| format!("Failed to read {}", full.display()))
    }
}

/// Modification time truncated to second resolution
fn truncated_mtime(metadata: &std::fs::Metadata) -> Result<DateTime<Utc>> {
    let mtime = metadata.modified().context("Filesystem reports no mtime")?;
    let secs = mtime
        .duration_since(std::time::UNIX_EPOCH)
        .context("File mtime predates the Unix epoch")?
        .as_secs();
    Utc.timestamp_opt(secs as i64, 0)
        .single()
        .context("File mtime out of range")
}

/// Media type by extension, for the handful of types the device web server
/// cares about
#[must_use]
pub fn media_type_for(name: &str) -> Option<&'static str> {
    let ext = name.rsplit_once('.')?.1;
    let media = match ext.to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "gif" => "image/gif",
        "jpg" | "jpeg" => "image/jpeg",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        _ => return None,
    };
    Some(media)
}
