//! Tests for lazy grid tiles and the per-item download action.

use async_trait::async_trait;
use keepsake_core::{Environment, MediaItem, MediaType};
use keepsake_error::{DownloadError, DownloadErrorKind};
use keepsake_gallery::{
    ClickEvent, DownloadOutcome, GalleryGrid, GridContext, GridItem, LoadState, MediaDownloader,
    Platform, PlaybackSurface, PreviewNotice, PreviewOptions, ReadyState, Rect, SavedMedia,
    SeekError, TileMedia, VideoPreview, VideoSource, ViewportRegistry, VisibilityEntry,
};
use keepsake_logger::{LogLevel, Logger, MemoryCollector, NoopCollector};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[derive(Default)]
struct CountingDownloader {
    calls: AtomicUsize,
    fail: bool,
}

#[async_trait]
impl MediaDownloader for CountingDownloader {
    async fn download(&self, item: &MediaItem) -> Result<SavedMedia, DownloadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        if self.fail {
            Err(DownloadError::new(DownloadErrorKind::Upstream {
                status: 404,
                reason: "Not Found".to_string(),
            }))
        } else {
            Ok(SavedMedia::new(format!("/tmp/{}", item.suggested_filename()), 42))
        }
    }
}

fn item(index: usize, media_type: MediaType) -> MediaItem {
    MediaItem::builder()
        .id(format!("m-{index}"))
        .media_type(media_type)
        .media_url(format!("https://cdn.example.com/m-{index}"))
        .title(format!("Memory {index}"))
        .uploader_name("Dana")
        .build()
        .unwrap()
}

fn photos(count: usize) -> Vec<MediaItem> {
    (0..count).map(|i| item(i, MediaType::Photo)).collect()
}

fn column(index: usize) -> Rect {
    Rect::new(0.0, index as f64 * 300.0, 300.0, 250.0)
}

struct Fixture {
    registry: Arc<ViewportRegistry>,
    downloader: Arc<CountingDownloader>,
    collector: Arc<MemoryCollector>,
    context: GridContext,
}

fn fixture(viewport_width: u32, downloader: CountingDownloader) -> Fixture {
    let registry = Arc::new(ViewportRegistry::new());
    let downloader = Arc::new(downloader);
    let collector = Arc::new(MemoryCollector::new());
    let logger = Arc::new(Logger::new(Environment::Production, collector.clone()));
    let context = GridContext::new(registry.clone(), downloader.clone(), logger)
        .with_viewport_width(viewport_width);
    Fixture {
        registry,
        downloader,
        collector,
        context,
    }
}

#[test]
fn test_immediate_load_depends_on_viewport_width() {
    for (width, count) in [(320, 6), (767, 6), (768, 12), (1440, 12)] {
        let f = fixture(width, CountingDownloader::default());
        let grid = GalleryGrid::mount(photos(20), &f.context, column);

        for tile in grid.items() {
            assert_eq!(
                tile.should_load(),
                tile.index() < count,
                "width {width}, index {}",
                tile.index()
            );
            assert_eq!(tile.is_observing(), tile.index() >= count);
        }
        assert_eq!(f.registry.active(), 20 - count);
    }
}

#[test]
fn test_deferred_tile_loads_only_after_intersection() {
    let f = fixture(375, CountingDownloader::default());
    let mut tile = GridItem::mount(item(9, MediaType::Photo), 9, column(9), &f.context);

    assert_eq!(tile.load_state(), LoadState::Deferred);
    assert!(tile.view().media.is_none());

    assert!(!tile.on_visibility(VisibilityEntry {
        is_intersecting: false
    }));
    assert!(!tile.should_load());
    assert_eq!(f.registry.active(), 1);

    assert!(tile.on_visibility(VisibilityEntry {
        is_intersecting: true
    }));
    assert!(tile.should_load());
    assert!(!tile.is_observing());
    assert_eq!(f.registry.active(), 0);

    // One-shot: later reports are ignored.
    assert!(!tile.on_visibility(VisibilityEntry {
        is_intersecting: true
    }));
}

#[test]
fn test_viewport_scroll_triggers_only_visible_tiles() {
    let f = fixture(375, CountingDownloader::default());
    let mut grid = GalleryGrid::mount(photos(12), &f.context, column);

    // Tiles 6.. sit at y = 1800 and below.
    let above_fold = Rect::new(0.0, 0.0, 375.0, 800.0);
    assert!(grid.on_viewport(&above_fold).is_empty());

    let scrolled = Rect::new(0.0, 1700.0, 375.0, 800.0);
    let started = grid.on_viewport(&scrolled);
    assert_eq!(started, vec![6, 7, 8]);
    assert!(grid.item(9).is_some_and(|t| !t.should_load()));
    assert_eq!(f.registry.active(), 3);
}

#[test]
fn test_unmount_releases_subscriptions() {
    let f = fixture(1280, CountingDownloader::default());
    let grid = GalleryGrid::mount(photos(30), &f.context, column);
    assert_eq!(f.registry.active(), 18);

    drop(grid);

    assert_eq!(f.registry.active(), 0);
}

#[test]
fn test_skeleton_stays_until_loaded_or_failed() {
    let f = fixture(1280, CountingDownloader::default());
    let mut loaded = GridItem::mount(item(1, MediaType::Photo), 1, column(1), &f.context);
    let mut failed = GridItem::mount(item(5, MediaType::Video), 5, column(5), &f.context);

    let view = loaded.view();
    assert_eq!(view.skeleton.map(|s| s.height_px), Some(250));
    assert!(matches!(
        view.media,
        Some(TileMedia::Image {
            eager: true,
            priority: true,
            ..
        })
    ));
    assert_eq!(failed.view().skeleton.map(|s| s.height_px), Some(300));

    loaded.on_media_loaded();
    assert!(loaded.view().skeleton.is_none());

    failed.apply_preview_notice(PreviewNotice::Failed);
    assert_eq!(failed.load_state(), LoadState::Failed);
    assert!(failed.view().skeleton.is_none());
    assert!(matches!(failed.view().media, Some(TileMedia::Video { .. })));
}

/// Element that never gets past `HaveNothing`.
struct StalledElement;

impl PlaybackSurface for StalledElement {
    fn ready_state(&self) -> ReadyState {
        ReadyState::HaveNothing
    }

    fn seek(&mut self, _seconds: f64) -> Result<(), SeekError> {
        Ok(())
    }
}

#[test]
fn test_video_failsafe_clears_skeleton_but_images_wait() {
    let f = fixture(1280, CountingDownloader::default());
    let mut video = GridItem::mount(item(1, MediaType::Video), 1, column(1), &f.context);
    let photo = GridItem::mount(item(2, MediaType::Photo), 2, column(2), &f.context);
    assert_eq!(video.load_state(), LoadState::Loading);
    assert_eq!(photo.load_state(), LoadState::Loading);

    let mounted = Instant::now();
    let mut preview = VideoPreview::mount(
        VideoSource::mp4(video.item().media_url().as_str()),
        PreviewOptions::default(),
        Platform::desktop(),
        Box::new(StalledElement),
        Arc::new(Logger::new(Environment::Test, Arc::new(NoopCollector))),
        mounted,
    );

    // No media event ever arrives.
    let notice = preview.tick(mounted + Duration::from_secs(5));
    assert_eq!(notice, Some(PreviewNotice::Loaded));
    if let Some(notice) = notice {
        video.apply_preview_notice(notice);
    }
    assert_eq!(video.load_state(), LoadState::Loaded);
    assert!(video.view().skeleton.is_none());

    // Images have no failsafe: the skeleton stays until the image reports.
    assert_eq!(photo.load_state(), LoadState::Loading);
    assert!(photo.view().skeleton.is_some());
}

#[test]
fn test_image_loading_hints_by_index() {
    let f = fixture(1280, CountingDownloader::default());
    let grid = GalleryGrid::mount(photos(6), &f.context, column);
    let hints: Vec<(bool, bool)> = grid
        .view()
        .into_iter()
        .map(|v| match v.media {
            Some(TileMedia::Image {
                eager, priority, ..
            }) => (eager, priority),
            other => panic!("unexpected media {other:?}"),
        })
        .collect();
    assert_eq!(
        hints,
        vec![
            (true, true),
            (true, true),
            (true, false),
            (true, false),
            (false, false),
            (false, false),
        ]
    );
}

#[tokio::test]
async fn test_rapid_clicks_download_once() {
    let f = fixture(1280, CountingDownloader::default());
    let tile = GridItem::mount(item(0, MediaType::Photo), 0, column(0), &f.context);

    let mut first = ClickEvent::new();
    let mut second = ClickEvent::new();
    let (a, b) = tokio::join!(tile.download(&mut first), tile.download(&mut second));

    assert_eq!(f.downloader.calls.load(Ordering::SeqCst), 1);
    assert!(matches!(a, DownloadOutcome::Completed(_)));
    assert_eq!(b, DownloadOutcome::AlreadyInProgress);
    assert!(first.is_propagation_stopped());
    assert!(second.is_propagation_stopped());
    assert!(!tile.is_downloading());

    // Once idle, the button works again.
    let mut third = ClickEvent::new();
    tile.download(&mut third).await;
    assert_eq!(f.downloader.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_download_click_does_not_open_viewer() {
    let f = fixture(1280, CountingDownloader::default());
    let tile = GridItem::mount(item(0, MediaType::Photo), 0, column(0), &f.context);

    let plain = ClickEvent::new();
    assert_eq!(tile.open_viewer(&plain).map(|i| i.id().as_str()), Some("m-0"));

    let mut click = ClickEvent::new();
    tile.download(&mut click).await;
    assert!(tile.open_viewer(&click).is_none());
}

#[tokio::test]
async fn test_download_logs_item_identity() {
    let f = fixture(1280, CountingDownloader::default());
    let tile = GridItem::mount(item(3, MediaType::Video), 3, column(3), &f.context);

    tile.download(&mut ClickEvent::new()).await;

    let events = f.collector.events();
    assert_eq!(events.len(), 2);
    let clicked = events[0].context();
    assert_eq!(clicked.get("mediaId").and_then(|v| v.as_str()), Some("m-3"));
    assert_eq!(clicked.get("mediaType").and_then(|v| v.as_str()), Some("video"));
    assert_eq!(
        clicked.get("mediaUrl").and_then(|v| v.as_str()),
        Some("https://cdn.example.com/m-3")
    );
    assert_eq!(clicked.get("title").and_then(|v| v.as_str()), Some("Memory 3"));
    assert_eq!(clicked.get("uploaderName").and_then(|v| v.as_str()), Some("Dana"));
    assert_eq!(clicked.get("itemIndex").and_then(|v| v.as_u64()), Some(3));
    assert_eq!(events[1].message(), "User Action: Download completed successfully");
}

#[tokio::test]
async fn test_download_failure_is_logged_and_silent() {
    let f = fixture(
        1280,
        CountingDownloader {
            fail: true,
            ..CountingDownloader::default()
        },
    );
    let tile = GridItem::mount(item(2, MediaType::Photo), 2, column(2), &f.context);

    let outcome = tile.download(&mut ClickEvent::new()).await;

    assert_eq!(outcome, DownloadOutcome::Failed);
    assert!(!tile.is_downloading());
    let failure = f
        .collector
        .events()
        .into_iter()
        .find(|e| *e.level() == LogLevel::Error)
        .expect("failure logged");
    assert_eq!(failure.message(), "Download failed");
    assert_eq!(
        failure.context().get("errorMessage").and_then(|v| v.as_str()),
        Some("Failed to fetch file: 404 Not Found")
    );
    assert_eq!(failure.context().get("mediaId").and_then(|v| v.as_str()), Some("m-2"));
}

#[test]
fn test_media_loaded_logged_at_debug_only() {
    let f = fixture(1280, CountingDownloader::default());
    let mut tile = GridItem::mount(item(0, MediaType::Photo), 0, column(0), &f.context);

    tile.on_media_loaded();

    assert_eq!(tile.load_state(), LoadState::Loaded);
    // Debug events are not forwarded in production.
    assert!(f.collector.events().is_empty());
}
