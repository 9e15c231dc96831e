use bytes::BytesMut;
use reqwest::{Client, StatusCode};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use super::cache::{AssetHandle, MediaBlob};
use super::catalog::MediaAsset;

pub const DEFAULT_VERIFY_TIMEOUT: Duration = Duration::from_secs(10);

// Upper bound for buffer preallocation from a server-declared length.
const MAX_PREALLOC: u64 = 64 * 1024 * 1024;

const EBML_MAGIC: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Server returned an unsuccessful status code: {0}")]
    Status(StatusCode),
    #[error("Server returned an empty body")]
    EmptyBody,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("Unrecognized media container")]
    UnknownContainer,
    #[error("Media box at offset {0} runs past the end of the file")]
    Truncated(usize),
    #[error("Malformed media box at offset {0}")]
    Malformed(usize),
    #[error("No movie header box (moov), the file cannot be played")]
    MissingMovieBox,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    IsoBmff,
    Matroska,
}

impl Container {
    pub fn extension(self) -> &'static str {
        match self {
            Container::IsoBmff => "mp4",
            Container::Matroska => "webm",
        }
    }
}

/// Off-screen player check: resolves once the blob could play through
/// without stalling.
pub trait PlaybackProbe: Send + Sync {
    fn probe(&self, blob: &MediaBlob) -> impl Future<Output = Result<(), ProbeError>> + Send;
}

/// Accepts MP4/MOV files whose movie header is present and WebM/Matroska files.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerProbe;

impl PlaybackProbe for ContainerProbe {
    fn probe(&self, blob: &MediaBlob) -> impl Future<Output = Result<(), ProbeError>> + Send {
        let result = sniff_container(blob.bytes()).map(|_| ());
        async move { result }
    }
}

pub fn sniff_container(data: &[u8]) -> Result<Container, ProbeError> {
    if data.starts_with(&EBML_MAGIC) {
        return Ok(Container::Matroska);
    }
    if data.len() >= 8 && &data[4..8] == b"ftyp" {
        check_iso_boxes(data)?;
        return Ok(Container::IsoBmff);
    }
    Err(ProbeError::UnknownContainer)
}

fn check_iso_boxes(data: &[u8]) -> Result<(), ProbeError> {
    let mut offset = 0usize;
    let mut has_moov = false;

    while offset + 8 <= data.len() {
        let size = u32::from_be_bytes([
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ]) as u64;
        let kind = &data[offset + 4..offset + 8];

        let box_len = match size {
            0 => (data.len() - offset) as u64,
            1 => {
                if offset + 16 > data.len() {
                    return Err(ProbeError::Truncated(offset));
                }
                let mut large = [0u8; 8];
                large.copy_from_slice(&data[offset + 8..offset + 16]);
                let large = u64::from_be_bytes(large);
                if large < 16 {
                    return Err(ProbeError::Malformed(offset));
                }
                large
            }
            n if n < 8 => return Err(ProbeError::Malformed(offset)),
            n => n,
        };

        if kind == b"moov" {
            has_moov = true;
        }

        let end = (offset as u64).saturating_add(box_len);
        if end > data.len() as u64 {
            return Err(ProbeError::Truncated(offset));
        }
        offset = end as usize;
    }

    if has_moov {
        Ok(())
    } else {
        Err(ProbeError::MissingMovieBox)
    }
}

/// Result of one fetch. `degraded` is set whenever the handle is not a
/// verified download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub handle: AssetHandle,
    pub degraded: bool,
}

/// Downloads `asset` in full, then checks it with `probe`. Never fails: any
/// problem is logged and the best available handle is returned instead.
///
/// `on_progress(loaded, total)` is called as bytes arrive and once more when
/// the asset settles, always with `loaded == total` on that last call.
pub async fn fetch_and_verify<P, F>(
    client: &Client,
    asset: &MediaAsset,
    probe: &P,
    verify_timeout: Duration,
    mut on_progress: F,
) -> FetchOutcome
where
    P: PlaybackProbe,
    F: FnMut(u64, u64),
{
    let mut declared = None;
    let mut seen = 0u64;

    let blob = match download(client, asset, &mut declared, &mut seen, &mut on_progress).await {
        Ok(blob) => blob,
        Err(e) => {
            log::warn!("Failed to download video {}: {}", asset.id, e);
            // Settle at or above anything already reported for this asset.
            let settled = declared.unwrap_or(0).max(seen).max(1);
            on_progress(settled, settled);
            return FetchOutcome {
                handle: AssetHandle::Remote(asset.source_url.clone()),
                degraded: true,
            };
        }
    };

    let degraded = match tokio::time::timeout(verify_timeout, probe.probe(&blob)).await {
        Ok(Ok(())) => {
            log::info!("Video {} ready ({} bytes)", asset.id, blob.len());
            false
        }
        Ok(Err(e)) => {
            log::warn!("Video validation failed for {}, using blob anyway: {}", asset.id, e);
            true
        }
        Err(_) => {
            log::warn!(
                "Video {} playability check timed out after {:?}, proceeding",
                asset.id,
                verify_timeout
            );
            true
        }
    };

    let size = (blob.len() as u64).max(1);
    on_progress(size, size);

    FetchOutcome {
        handle: AssetHandle::Blob(blob),
        degraded,
    }
}

async fn download<F>(
    client: &Client,
    asset: &MediaAsset,
    declared: &mut Option<u64>,
    seen: &mut u64,
    on_progress: &mut F,
) -> Result<MediaBlob, FetchError>
where
    F: FnMut(u64, u64),
{
    let mut response = client.get(&asset.source_url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status));
    }

    let content_length = response.content_length().filter(|&n| n > 0);
    *declared = content_length;

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let mut buffer = BytesMut::with_capacity(content_length.unwrap_or(0).min(MAX_PREALLOC) as usize);
    let mut loaded = 0u64;

    on_progress(0, content_length.unwrap_or(1));

    while let Some(chunk) = response.chunk().await? {
        loaded += chunk.len() as u64;
        *seen = loaded;
        buffer.extend_from_slice(&chunk);

        // Without a declared length the total tracks what has arrived so far.
        let total = content_length.unwrap_or(loaded).max(loaded).max(1);
        log::trace!("{}: {}/{} bytes", asset.id, loaded, total);
        on_progress(loaded, total);
    }

    if buffer.is_empty() {
        return Err(FetchError::EmptyBody);
    }

    Ok(MediaBlob::new(asset.id.clone(), buffer.freeze(), content_type))
}
