use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::catalog::MediaId;

static NEXT_BLOB_SERIAL: AtomicU64 = AtomicU64::new(1);

/// A fully downloaded video held in memory.
#[derive(Debug, Clone)]
pub struct MediaBlob {
    id: MediaId,
    serial: u64,
    bytes: Bytes,
    content_type: Option<String>,
}

impl MediaBlob {
    pub fn new(id: MediaId, bytes: Bytes, content_type: Option<String>) -> Self {
        Self {
            id,
            serial: NEXT_BLOB_SERIAL.fetch_add(1, Ordering::Relaxed),
            bytes,
            content_type,
        }
    }

    pub fn id(&self) -> &MediaId {
        &self.id
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn locator(&self) -> String {
        format!("blob:tribute/{}/{}", self.id, self.serial)
    }
}

impl PartialEq for MediaBlob {
    fn eq(&self, other: &Self) -> bool {
        self.serial == other.serial && self.id == other.id
    }
}

impl Eq for MediaBlob {}

/// Something a player can be pointed at: either downloaded bytes or, as a
/// fallback, the original network location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetHandle {
    Blob(MediaBlob),
    Remote(String),
}

impl AssetHandle {
    pub fn locator(&self) -> String {
        match self {
            AssetHandle::Blob(blob) => blob.locator(),
            AssetHandle::Remote(url) => url.clone(),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, AssetHandle::Blob(_))
    }
}

/// Store of settled handles. Each key is written at most once and entries
/// live until the process exits.
#[derive(Clone, Default)]
pub struct HandleCache {
    inner: Arc<RwLock<HashMap<MediaId, AssetHandle>>>,
}

impl HandleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false (and keeps the existing entry) if `id` was already published.
    pub fn publish(&self, id: MediaId, handle: AssetHandle) -> bool {
        let mut handles = self.write();
        if handles.contains_key(&id) {
            log::warn!("Handle for {} already published, ignoring {}", id, handle.locator());
            return false;
        }
        log::debug!("Published {} -> {}", id, handle.locator());
        handles.insert(id, handle);
        true
    }

    pub fn get(&self, id: &MediaId) -> Option<AssetHandle> {
        self.read().get(id).cloned()
    }

    // Writers never panic while holding the lock, so a poisoned map is still
    // consistent.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<MediaId, AssetHandle>> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<MediaId, AssetHandle>> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(id: &str, data: &'static [u8]) -> MediaBlob {
        MediaBlob::new(MediaId::new(id), Bytes::from_static(data), Some("video/mp4".to_string()))
    }

    #[test]
    fn test_first_publish_wins() {
        let cache = HandleCache::new();
        let id = MediaId::new("video1");
        let first = AssetHandle::Blob(blob("video1", b"abc"));

        assert!(cache.publish(id.clone(), first.clone()));
        assert!(!cache.publish(id.clone(), AssetHandle::Remote("http://x/1.mp4".to_string())));
        assert_eq!(cache.get(&id), Some(first));
    }

    #[test]
    fn test_blob_identity_is_per_download() {
        let a = blob("video1", b"same");
        let b = blob("video1", b"same");
        assert_ne!(a, b);
        assert_ne!(a.locator(), b.locator());
        assert_eq!(a.clone(), a);
    }

    #[test]
    fn test_locator_format() {
        let b = blob("video2", b"x");
        assert_eq!(b.locator(), format!("blob:tribute/video2/{}", b.serial()));
        let remote = AssetHandle::Remote("http://host/2.mp4".to_string());
        assert_eq!(remote.locator(), "http://host/2.mp4");
        assert!(!remote.is_local());
    }

    #[test]
    fn test_clones_share_the_store() {
        let cache = HandleCache::new();
        let view = cache.clone();
        cache.publish(MediaId::new("video3"), AssetHandle::Remote("u".to_string()));
        assert_eq!(
            view.get(&MediaId::new("video3")),
            Some(AssetHandle::Remote("u".to_string()))
        );
    }
}
