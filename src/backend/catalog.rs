use std::fmt;
use std::sync::Arc;

use crate::config::TributeConfig;

/// Stable key naming one preloadable video.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MediaId(Arc<str>);

impl MediaId {
    pub fn new(id: &str) -> Self {
        MediaId(Arc::from(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MediaId {
    fn from(id: &str) -> Self {
        MediaId::new(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAsset {
    pub id: MediaId,
    pub source_url: String,
}

/// The fixed, ordered set of videos for this run.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    assets: Vec<MediaAsset>,
}

fn join_url(base: &str, file: &str) -> String {
    let encoded = file
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("{}/{}", base.trim_end_matches('/'), encoded)
}

impl Catalog {
    pub fn from_config(config: &TributeConfig) -> Self {
        let mut assets: Vec<MediaAsset> = Vec::with_capacity(config.media.len());

        for entry in &config.media {
            if assets.iter().any(|a| a.id.as_str() == entry.id) {
                log::warn!("Duplicate media id {} in config, keeping the first", entry.id);
                continue;
            }
            assets.push(MediaAsset {
                id: MediaId::new(&entry.id),
                source_url: join_url(&config.media_base_url, &entry.file),
            });
        }

        Self { assets }
    }

    pub fn assets(&self) -> &[MediaAsset] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
