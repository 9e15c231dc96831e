use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::cache::{AssetHandle, MediaBlob};
use super::fetch::sniff_container;
use crate::config::APP_DIR;

#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("Failed to write video to {path}: {source}")]
    Spool {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to open {target}: {source}")]
    Open {
        target: String,
        source: std::io::Error,
    },
}

fn get_spool_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("media")
}

fn extension_for(blob: &MediaBlob) -> &'static str {
    match blob.content_type() {
        Some(ct) if ct.starts_with("video/mp4") => "mp4",
        Some(ct) if ct.starts_with("video/webm") => "webm",
        Some(ct) if ct.starts_with("video/quicktime") => "mov",
        _ => sniff_container(blob.bytes())
            .map(|c| c.extension())
            .unwrap_or("bin"),
    }
}

fn spool_path(dir: &Path, blob: &MediaBlob) -> PathBuf {
    dir.join(format!(
        "{}-{}.{}",
        blob.id(),
        blob.serial(),
        extension_for(blob)
    ))
}

/// Writes the blob under `dir`. Serials restart with every process, so an
/// existing file is always replaced rather than trusted.
pub fn spool_blob(dir: &Path, blob: &MediaBlob) -> Result<PathBuf, PlaybackError> {
    let path = spool_path(dir, blob);

    fs::create_dir_all(dir)
        .and_then(|_| fs::write(&path, blob.bytes()))
        .map_err(|source| PlaybackError::Spool {
            path: path.clone(),
            source,
        })?;

    Ok(path)
}

/// Hands a handle to the desktop's default player or browser.
pub fn open_handle(handle: &AssetHandle) -> Result<String, PlaybackError> {
    let target = match handle {
        AssetHandle::Remote(url) => url.clone(),
        AssetHandle::Blob(blob) => spool_blob(&get_spool_dir(), blob)?
            .to_string_lossy()
            .into_owned(),
    };

    log::info!("Opening {}", target);
    webbrowser::open(&target).map_err(|source| PlaybackError::Open {
        target: target.clone(),
        source,
    })?;

    Ok(target)
}
