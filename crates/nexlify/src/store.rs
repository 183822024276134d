//! Flat directory of Markdown artifacts
//!
//! The directory listing is the source of truth; there is no index file.
//! Writes go to a hidden temp file in the same directory and are renamed
//! into place, so readers never observe a partially written artifact.

use crate::error::{Error, Result};
use crate::filename::{validate_filename, ARTIFACT_EXTENSION};
use crate::types::ArtifactInfo;
use chrono::{DateTime, Utc};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

const TEMP_PREFIX: &str = ".nexlify-";
const TEMP_SUFFIX: &str = ".tmp";

/// Artifact storage rooted at one directory
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store; the directory is created on first write
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `content` under `filename`, replacing any previous artifact
    pub async fn put(&self, filename: &str, content: &str) -> Result<()> {
        validate_filename(filename).map_err(Error::Validation)?;

        let root = self.root.clone();
        let target = self.root.join(filename);
        let bytes = content.as_bytes().to_vec();

        tokio::task::spawn_blocking(move || -> io::Result<()> {
            std::fs::create_dir_all(&root)?;
            let mut tmp = tempfile::Builder::new()
                .prefix(TEMP_PREFIX)
                .suffix(TEMP_SUFFIX)
                .tempfile_in(&root)?;
            tmp.write_all(&bytes)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| Error::Io(io::Error::other(e)))??;

        debug!(filename, bytes = content.len(), "artifact stored");
        Ok(())
    }

    /// Read the artifact stored under `filename`
    pub async fn get(&self, filename: &str) -> Result<String> {
        validate_filename(filename).map_err(Error::Validation)?;

        match tokio::fs::read_to_string(self.root.join(filename)).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(Error::NotFound(filename.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Sorted names of all stored artifacts
    pub async fn list(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .scan()
            .await?
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        names.sort();
        Ok(names)
    }

    /// Sorted artifact metadata
    pub async fn list_artifacts(&self) -> Result<Vec<ArtifactInfo>> {
        let mut artifacts: Vec<ArtifactInfo> = self
            .scan()
            .await?
            .into_iter()
            .map(|(filename, metadata)| ArtifactInfo {
                filename,
                size: metadata.len(),
                created_at: modified_at(&metadata),
            })
            .collect();
        artifacts.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(artifacts)
    }

    /// Delete artifacts last written more than `age` ago
    ///
    /// Returns the number of files removed. Files that disappear or cannot
    /// be removed are logged and skipped.
    pub async fn remove_older_than(&self, age: Duration) -> Result<usize> {
        let cutoff = SystemTime::now()
            .checked_sub(age)
            .unwrap_or(SystemTime::UNIX_EPOCH);
        let mut removed = 0;

        for (name, metadata) in self.scan().await? {
            let modified = metadata.modified().unwrap_or_else(|_| SystemTime::now());
            if modified >= cutoff {
                continue;
            }
            match tokio::fs::remove_file(self.root.join(&name)).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(filename = %name, error = %e, "failed to remove expired artifact"),
            }
        }

        if removed > 0 {
            info!(removed, "expired artifacts removed");
        }
        Ok(removed)
    }

    /// Regular `*.md` files in the root, unordered
    async fn scan(&self) -> Result<Vec<(String, std::fs::Metadata)>> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut found = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name.starts_with('.') || !name.ends_with(ARTIFACT_EXTENSION) {
                continue;
            }
            let metadata = entry.metadata().await?;
            if metadata.is_file() {
                found.push((name, metadata));
            }
        }
        Ok(found)
    }
}

fn modified_at(metadata: &std::fs::Metadata) -> DateTime<Utc> {
    metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
}
