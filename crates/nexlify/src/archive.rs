//! ZIP bundles of stored artifacts

use crate::error::{Error, Result};
use crate::store::FileStore;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::io::{Cursor, Write};
use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Build an in-memory ZIP of stored artifacts
///
/// `None` bundles every stored file. Entries sit at the archive root under
/// their stored names, sorted, Deflate-compressed.
pub async fn build_archive(store: &FileStore, filenames: Option<&[String]>) -> Result<Bytes> {
    let mut names = match filenames {
        Some(requested) => requested.to_vec(),
        None => store.list().await?,
    };
    names.sort();
    names.dedup();

    if names.is_empty() {
        return Err(Error::EmptyArchive);
    }

    // Read everything first so a missing name fails before any ZIP work
    let mut entries = Vec::with_capacity(names.len());
    for name in names {
        let content = store.get(&name).await?;
        entries.push((name, content));
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, content) in &entries {
        writer.start_file(name.as_str(), options)?;
        writer.write_all(content.as_bytes())?;
    }
    let buffer = writer.finish()?.into_inner();

    debug!(entries = entries.len(), bytes = buffer.len(), "archive built");
    Ok(Bytes::from(buffer))
}

/// Download name for a bulk archive built at `now`
pub fn archive_filename(now: DateTime<Utc>) -> String {
    format!("bulk_download_{}.zip", now.format("%Y%m%d_%H%M%S"))
}
