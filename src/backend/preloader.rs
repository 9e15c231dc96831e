use futures::future::join_all;
use reqwest::Client;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;

use super::cache::{AssetHandle, HandleCache};
use super::catalog::{MediaAsset, MediaId};
use super::fetch::{fetch_and_verify, ContainerProbe, PlaybackProbe};
use super::progress::{PreloadProgress, ProgressTracker};

#[derive(Error, Debug)]
pub enum PreloadError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("Preload already started for this session")]
    AlreadyStarted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadSummary {
    pub settled: usize,
    pub degraded: Vec<MediaId>,
    pub progress: PreloadProgress,
}

fn build_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(concat!("tribute-tui/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Downloads every configured video once, reports combined progress, and
/// serves the resulting handles to the rest of the app.
pub struct PreloadCoordinator<P = ContainerProbe> {
    assets: Vec<MediaAsset>,
    client: Client,
    probe: P,
    verify_timeout: Duration,
    cache: HandleCache,
    started: AtomicBool,
    complete: AtomicBool,
}

impl<P: PlaybackProbe> PreloadCoordinator<P> {
    pub fn new(
        assets: Vec<MediaAsset>,
        probe: P,
        verify_timeout: Duration,
    ) -> Result<Self, PreloadError> {
        Ok(Self {
            assets,
            client: build_client()?,
            probe,
            verify_timeout,
            cache: HandleCache::new(),
            started: AtomicBool::new(false),
            complete: AtomicBool::new(false),
        })
    }

    /// Fetches all assets concurrently and resolves once every one of them has
    /// settled. `on_progress` sees a non-decreasing percent capped at 99,
    /// followed by exactly one report of 100.
    pub async fn preload_all<F>(&self, on_progress: F) -> Result<PreloadSummary, PreloadError>
    where
        F: Fn(PreloadProgress) + Send + Sync,
    {
        if self.started.swap(true, Ordering::SeqCst) {
            log::warn!("Ignoring repeated preload request");
            return Err(PreloadError::AlreadyStarted);
        }

        log::info!("Preloading {} videos", self.assets.len());
        let tracker = Mutex::new(ProgressTracker::new(self.assets.len()));

        let tracker = &tracker;
        let on_progress = &on_progress;

        let fetches = self.assets.iter().enumerate().map(move |(index, asset)| {
            async move {
                let outcome = fetch_and_verify(
                    &self.client,
                    asset,
                    &self.probe,
                    self.verify_timeout,
                    |loaded, total| {
                        // Report under the lock so observers see updates in order.
                        let mut tracker = lock(tracker);
                        on_progress(tracker.record(index, loaded, total));
                    },
                )
                .await;

                self.cache.publish(asset.id.clone(), outcome.handle.clone());
                (asset.id.clone(), outcome.degraded)
            }
        });

        let settled = join_all(fetches).await;

        let degraded: Vec<MediaId> = settled
            .iter()
            .filter(|(_, degraded)| *degraded)
            .map(|(id, _)| id.clone())
            .collect();

        self.complete.store(true, Ordering::SeqCst);

        let progress = {
            let mut tracker = lock(tracker);
            let progress = tracker.finish();
            on_progress(progress);
            progress
        };

        log::info!(
            "Preload complete: {} settled, {} degraded, {} bytes",
            settled.len(),
            degraded.len(),
            progress.loaded
        );

        Ok(PreloadSummary {
            settled: settled.len(),
            degraded,
            progress,
        })
    }
}

impl<P> PreloadCoordinator<P> {
    /// The cached handle for `id`, or its original location if it has not
    /// settled yet. `None` only for ids outside the catalog.
    pub fn handle(&self, id: &MediaId) -> Option<AssetHandle> {
        if let Some(handle) = self.cache.get(id) {
            return Some(handle);
        }
        self.assets
            .iter()
            .find(|a| &a.id == id)
            .map(|a| AssetHandle::Remote(a.source_url.clone()))
    }

    pub fn is_complete(&self) -> bool {
        self.complete.load(Ordering::SeqCst)
    }

    pub fn assets(&self) -> &[MediaAsset] {
        &self.assets
    }
}

fn lock(tracker: &Mutex<ProgressTracker>) -> MutexGuard<'_, ProgressTracker> {
    tracker.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fetch::DEFAULT_VERIFY_TIMEOUT;
    use crate::backend::test_server::{fake_mp4, serve, Route};
    use std::sync::Arc;

    fn assets(base: &str, names: &[&str]) -> Vec<MediaAsset> {
        names
            .iter()
            .map(|name| MediaAsset {
                id: MediaId::new(name),
                source_url: format!("{}/{}.mp4", base, name),
            })
            .collect()
    }

    fn recorder() -> (Arc<Mutex<Vec<PreloadProgress>>>, impl Fn(PreloadProgress) + Send + Sync) {
        let reports = Arc::new(Mutex::new(Vec::new()));
        let sink = reports.clone();
        (reports, move |p| sink.lock().unwrap().push(p))
    }

    #[tokio::test]
    async fn test_three_assets_with_one_failure() {
        let base = serve(vec![
            Route::ok("/a.mp4", fake_mp4(100)),
            Route::ok("/b.mp4", fake_mp4(200)).cut_after(50),
            Route::ok("/c.mp4", fake_mp4(300)),
        ])
        .await;
        let coordinator =
            PreloadCoordinator::new(assets(&base, &["a", "b", "c"]), ContainerProbe, DEFAULT_VERIFY_TIMEOUT)
                .unwrap();
        let (reports, on_progress) = recorder();

        let summary = coordinator.preload_all(on_progress).await.unwrap();

        assert_eq!(summary.settled, 3);
        assert_eq!(summary.degraded, vec![MediaId::new("b")]);
        assert_eq!(
            summary.progress,
            PreloadProgress { percent: 100, loaded: 600, total: 600 }
        );
        assert!(coordinator.is_complete());

        let b = MediaId::new("b");
        assert_eq!(
            coordinator.handle(&b),
            Some(AssetHandle::Remote(format!("{}/b.mp4", base)))
        );
        assert!(coordinator.handle(&MediaId::new("a")).unwrap().is_local());

        let reports = reports.lock().unwrap();
        assert_eq!(reports.last().map(|p| p.percent), Some(100));
        assert_eq!(reports.iter().filter(|p| p.percent == 100).count(), 1);
        assert!(reports[..reports.len() - 1].iter().all(|p| p.percent <= 99));
        assert!(reports.windows(2).all(|w| w[0].percent <= w[1].percent));
        assert!(reports.windows(2).all(|w| w[0].loaded <= w[1].loaded));
    }

    #[tokio::test]
    async fn test_loaded_bytes_never_shrink_on_unsized_failure() {
        let base = serve(vec![
            Route::ok("/a.mp4", fake_mp4(100)),
            Route::ok("/b.mp4", fake_mp4(200)).chunked().cut_after(50),
        ])
        .await;
        let coordinator =
            PreloadCoordinator::new(assets(&base, &["a", "b"]), ContainerProbe, DEFAULT_VERIFY_TIMEOUT)
                .unwrap();
        let (reports, on_progress) = recorder();

        let summary = coordinator.preload_all(on_progress).await.unwrap();

        assert_eq!(summary.degraded, vec![MediaId::new("b")]);
        assert_eq!(
            summary.progress,
            PreloadProgress { percent: 100, loaded: 150, total: 150 }
        );
        let reports = reports.lock().unwrap();
        assert!(reports.windows(2).all(|w| w[0].loaded <= w[1].loaded));
        assert!(reports.windows(2).all(|w| w[0].percent <= w[1].percent));
    }

    #[tokio::test]
    async fn test_handles_before_and_after_preload() {
        let base = serve(vec![Route::ok("/v1.mp4", fake_mp4(64))]).await;
        let coordinator =
            PreloadCoordinator::new(assets(&base, &["v1"]), ContainerProbe, DEFAULT_VERIFY_TIMEOUT)
                .unwrap();
        let id = MediaId::new("v1");

        assert!(!coordinator.is_complete());
        assert_eq!(
            coordinator.handle(&id),
            Some(AssetHandle::Remote(format!("{}/v1.mp4", base)))
        );

        coordinator.preload_all(|_| {}).await.unwrap();

        let first = coordinator.handle(&id).unwrap();
        let second = coordinator.handle(&id).unwrap();
        assert!(first.is_local());
        assert_eq!(first, second);
        assert_eq!(first.locator(), second.locator());
        assert!(coordinator.handle(&MediaId::new("missing")).is_none());
    }

    #[tokio::test]
    async fn test_completion_waits_for_slowest_asset() {
        let base = serve(vec![
            Route::ok("/fast.mp4", fake_mp4(64)),
            Route::ok("/slow.mp4", fake_mp4(64)).delayed(Duration::from_millis(300)),
        ])
        .await;
        let coordinator = PreloadCoordinator::new(
            assets(&base, &["fast", "slow"]),
            ContainerProbe,
            DEFAULT_VERIFY_TIMEOUT,
        )
        .unwrap();

        let summary = coordinator.preload_all(|_| {}).await.unwrap();

        assert_eq!(summary.settled, 2);
        assert!(summary.degraded.is_empty());
        assert!(coordinator.handle(&MediaId::new("fast")).unwrap().is_local());
        assert!(coordinator.handle(&MediaId::new("slow")).unwrap().is_local());
    }

    #[tokio::test]
    async fn test_second_session_is_rejected() {
        let base = serve(vec![Route::ok("/v.mp4", fake_mp4(64))]).await;
        let coordinator =
            PreloadCoordinator::new(assets(&base, &["v"]), ContainerProbe, DEFAULT_VERIFY_TIMEOUT)
                .unwrap();

        coordinator.preload_all(|_| {}).await.unwrap();
        let (reports, on_progress) = recorder();
        let again = coordinator.preload_all(on_progress).await;

        assert!(matches!(again, Err(PreloadError::AlreadyStarted)));
        assert!(reports.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_all_failures_still_complete() {
        let base = serve(vec![Route::status("/x.mp4", 503)]).await;
        let coordinator = PreloadCoordinator::new(
            assets(&base, &["x", "y"]),
            ContainerProbe,
            DEFAULT_VERIFY_TIMEOUT,
        )
        .unwrap();
        let (reports, on_progress) = recorder();

        let summary = coordinator.preload_all(on_progress).await.unwrap();

        assert_eq!(summary.settled, 2);
        assert_eq!(summary.degraded.len(), 2);
        assert_eq!(
            summary.progress,
            PreloadProgress { percent: 100, loaded: 2, total: 2 }
        );
        assert_eq!(reports.lock().unwrap().last().map(|p| p.percent), Some(100));
    }

    #[tokio::test]
    async fn test_empty_catalog_completes_immediately() {
        let coordinator =
            PreloadCoordinator::new(Vec::new(), ContainerProbe, DEFAULT_VERIFY_TIMEOUT).unwrap();
        let (reports, on_progress) = recorder();

        let summary = coordinator.preload_all(on_progress).await.unwrap();

        assert_eq!(summary.settled, 0);
        assert!(coordinator.is_complete());
        assert_eq!(
            *reports.lock().unwrap(),
            vec![PreloadProgress { percent: 100, loaded: 0, total: 0 }]
        );
    }

    #[tokio::test]
    async fn test_preload_runs_in_spawned_task() {
        let base = serve(vec![Route::ok("/s.mp4", fake_mp4(64))]).await;
        let coordinator = Arc::new(
            PreloadCoordinator::new(assets(&base, &["s"]), ContainerProbe, DEFAULT_VERIFY_TIMEOUT)
                .unwrap(),
        );

        let worker = coordinator.clone();
        let summary = tokio::spawn(async move { worker.preload_all(|_| {}).await })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(summary.settled, 1);
        assert!(coordinator.is_complete());
    }
}
