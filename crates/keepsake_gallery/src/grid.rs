//! Lazily loaded gallery tiles.

use crate::{
    MediaDownloader, PreviewNotice, Rect, SavedMedia, Subscription, VisibilityEntry,
    VisibilityOptions, ViewportObserver,
};
use keepsake_core::{GallerySettings, MediaItem, MediaType};
use keepsake_logger::{LogContext, StructuredLog};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// How many leading tiles load without waiting to scroll into view.
///
/// ```
/// use keepsake_gallery::ImmediateLoadPolicy;
///
/// let policy = ImmediateLoadPolicy::default();
/// assert_eq!(policy.immediate_count(375), 6);
/// assert_eq!(policy.immediate_count(1280), 12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImmediateLoadPolicy {
    narrow_count: usize,
    wide_count: usize,
    breakpoint_px: u32,
}

impl Default for ImmediateLoadPolicy {
    fn default() -> Self {
        Self {
            narrow_count: 6,
            wide_count: 12,
            breakpoint_px: 768,
        }
    }
}

impl ImmediateLoadPolicy {
    /// Create a policy.
    pub fn new(narrow_count: usize, wide_count: usize, breakpoint_px: u32) -> Self {
        Self {
            narrow_count,
            wide_count,
            breakpoint_px,
        }
    }

    /// Policy from gallery settings.
    pub fn from_settings(settings: &GallerySettings) -> Self {
        Self::new(
            *settings.narrow_immediate_count(),
            *settings.wide_immediate_count(),
            *settings.wide_breakpoint_px(),
        )
    }

    /// Immediate count for a viewport `width` pixels wide.
    pub fn immediate_count(&self, width: u32) -> usize {
        if width < self.breakpoint_px {
            self.narrow_count
        } else {
            self.wide_count
        }
    }

    /// Whether tile `index` loads at mount.
    pub fn loads_immediately(&self, index: usize, width: u32) -> bool {
        index < self.immediate_count(width)
    }
}

/// Loading progress of one tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum LoadState {
    /// Waiting to become visible
    #[default]
    Deferred,
    /// Media requested, not yet loaded
    Loading,
    /// Media displayed
    Loaded,
    /// Media failed; the skeleton is dropped without retry
    Failed,
}

impl LoadState {
    /// Whether media has been requested.
    pub fn should_load(&self) -> bool {
        !matches!(self, LoadState::Deferred)
    }
}

/// A pointer click on a tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClickEvent {
    propagation_stopped: bool,
}

impl ClickEvent {
    /// A fresh click.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the click from reaching the tile.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Whether a nested control consumed the click.
    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// Result of pressing a tile's download button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The file was saved
    Completed(SavedMedia),
    /// The download failed and was logged
    Failed,
    /// Another download of this tile is still running
    AlreadyInProgress,
}

/// Shared dependencies for mounting tiles.
#[derive(Clone, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct GridContext {
    /// Viewport width at mount, in pixels
    viewport_width: u32,
    /// Immediate-load policy
    policy: ImmediateLoadPolicy,
    /// Visibility tuning
    visibility: VisibilityOptions,
    /// Visibility source for deferred tiles
    #[setters(skip)]
    observer: Arc<dyn ViewportObserver>,
    /// Performs downloads
    #[setters(skip)]
    downloader: Arc<dyn MediaDownloader>,
    /// Structured logger
    #[setters(skip)]
    logger: Arc<dyn StructuredLog>,
}

impl GridContext {
    /// Context with default policy and visibility options for a
    /// 1024 pixel viewport.
    pub fn new(
        observer: Arc<dyn ViewportObserver>,
        downloader: Arc<dyn MediaDownloader>,
        logger: Arc<dyn StructuredLog>,
    ) -> Self {
        Self {
            viewport_width: 1024,
            policy: ImmediateLoadPolicy::default(),
            visibility: VisibilityOptions::default(),
            observer,
            downloader,
            logger,
        }
    }

    /// Apply gallery settings.
    pub fn with_settings(self, settings: &GallerySettings) -> Self {
        self.with_policy(ImmediateLoadPolicy::from_settings(settings))
            .with_visibility(VisibilityOptions::from_settings(settings))
    }
}

/// Placeholder block shown until the tile settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Skeleton {
    /// Block height; staggered so the grid does not look uniform
    pub height_px: u32,
    /// Media type badge
    pub media_type: MediaType,
}

/// Media element rendered inside a tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TileMedia {
    /// An image
    Image {
        /// Image URL
        src: String,
        /// Alt text
        alt: String,
        /// Skip native lazy loading
        eager: bool,
        /// Preload as a high-priority resource
        priority: bool,
    },
    /// A video preview
    Video {
        /// MP4 URL
        mp4_url: String,
        /// Poster frame
        poster_url: Option<String>,
    },
}

/// Display model of one tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridItemView {
    /// Stable render key
    pub key: String,
    /// Skeleton overlay, while loading
    pub skeleton: Option<Skeleton>,
    /// Media element, once requested
    pub media: Option<TileMedia>,
    /// Caption
    pub title: Option<String>,
    /// Uploader credit
    pub uploader_name: Option<String>,
    /// Whether the download button shows its busy state
    pub download_busy: bool,
    /// Entrance animation delay
    pub entrance_delay_ms: u64,
}

/// Resets the download guard however the download ends.
struct DownloadGuard<'a>(&'a AtomicBool);

impl Drop for DownloadGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One mounted gallery tile.
pub struct GridItem {
    item: MediaItem,
    index: usize,
    target: Rect,
    visibility: VisibilityOptions,
    load_state: LoadState,
    subscription: Option<Subscription>,
    downloading: AtomicBool,
    downloader: Arc<dyn MediaDownloader>,
    logger: Arc<dyn StructuredLog>,
}

impl std::fmt::Debug for GridItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridItem")
            .field("id", self.item.id())
            .field("index", &self.index)
            .field("load_state", &self.load_state)
            .field("observing", &self.subscription.is_some())
            .field("downloading", &self.downloading.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl GridItem {
    /// Mount tile `index` occupying `target`.
    ///
    /// Tiles inside the immediate-load count start loading now; the rest
    /// subscribe to visibility.
    pub fn mount(item: MediaItem, index: usize, target: Rect, context: &GridContext) -> Self {
        let immediate = context
            .policy
            .loads_immediately(index, context.viewport_width);
        let (load_state, subscription) = if immediate {
            (LoadState::Loading, None)
        } else {
            (
                LoadState::Deferred,
                Some(context.observer.observe(target, context.visibility)),
            )
        };
        Self {
            item,
            index,
            target,
            visibility: context.visibility,
            load_state,
            subscription,
            downloading: AtomicBool::new(false),
            downloader: Arc::clone(&context.downloader),
            logger: Arc::clone(&context.logger),
        }
    }

    /// The media item.
    pub fn item(&self) -> &MediaItem {
        &self.item
    }

    /// Position in the grid.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Layout rectangle.
    pub fn target(&self) -> Rect {
        self.target
    }

    /// Loading progress.
    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    /// Whether media has been requested.
    pub fn should_load(&self) -> bool {
        self.load_state.should_load()
    }

    /// Whether a visibility subscription is still held.
    pub fn is_observing(&self) -> bool {
        self.subscription.is_some()
    }

    /// Whether a download is running.
    pub fn is_downloading(&self) -> bool {
        self.downloading.load(Ordering::Acquire)
    }

    /// Handle a visibility report. Returns `true` if it started loading.
    ///
    /// The first intersecting report releases the subscription.
    pub fn on_visibility(&mut self, entry: VisibilityEntry) -> bool {
        if self.load_state != LoadState::Deferred || !entry.is_intersecting {
            return false;
        }
        self.load_state = LoadState::Loading;
        if let Some(subscription) = self.subscription.take() {
            subscription.release();
        }
        true
    }

    /// Check the tile against `viewport`.
    pub fn on_viewport(&mut self, viewport: &Rect) -> bool {
        if !self.is_observing() {
            return false;
        }
        let entry = VisibilityEntry::compute(&self.visibility, &self.target, viewport);
        self.on_visibility(entry)
    }

    /// The media finished loading.
    pub fn on_media_loaded(&mut self) {
        self.load_state = LoadState::Loaded;
        self.logger.debug(
            "Media item loaded",
            LogContext::new()
                .with("component", "GridItem")
                .with("mediaId", self.item.id().as_str())
                .with("mediaType", self.item.media_type().as_str())
                .with("index", self.index)
                .with("url", self.item.media_url().as_str()),
        );
    }

    /// The media failed to load. The skeleton is dropped; no retry.
    pub fn on_media_error(&mut self) {
        self.load_state = LoadState::Failed;
        debug!(media_id = %self.item.id(), index = self.index, "Media item failed to load");
    }

    /// Forward a notice from this tile's video preview.
    pub fn apply_preview_notice(&mut self, notice: PreviewNotice) {
        match notice {
            PreviewNotice::Loaded => self.on_media_loaded(),
            PreviewNotice::Failed => self.on_media_error(),
        }
    }

    /// Item to open in the full viewer, unless a nested control handled the
    /// click.
    pub fn open_viewer(&self, click: &ClickEvent) -> Option<&MediaItem> {
        (!click.is_propagation_stopped()).then_some(&self.item)
    }

    fn identity(&self) -> LogContext {
        LogContext::new()
            .with("mediaId", self.item.id().as_str())
            .with("mediaType", self.item.media_type().as_str())
            .with("title", self.item.title().clone())
            .with("itemIndex", self.index)
    }

    /// Download the item.
    ///
    /// Stops `click` from opening the viewer. While a download runs, further
    /// presses do nothing. Failures are logged and otherwise silent.
    pub async fn download(&self, click: &mut ClickEvent) -> DownloadOutcome {
        click.stop_propagation();
        if self
            .downloading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return DownloadOutcome::AlreadyInProgress;
        }
        let _guard = DownloadGuard(&self.downloading);

        self.logger.user_action(
            "Download button clicked",
            self.identity()
                .with("mediaUrl", self.item.media_url().as_str())
                .with("uploaderName", self.item.uploader_name().clone())
                .with("shouldLoad", self.should_load())
                .with("mediaLoaded", self.load_state == LoadState::Loaded),
        );

        match self.downloader.download(&self.item).await {
            Ok(saved) => {
                self.logger.user_action(
                    "Download completed successfully",
                    self.identity().with("downloadLocation", "GridItem"),
                );
                DownloadOutcome::Completed(saved)
            }
            Err(e) => {
                let error: &(dyn std::error::Error + 'static) = &e;
                self.logger.error(
                    "Download failed",
                    Some(error),
                    self.identity()
                        .with("mediaUrl", self.item.media_url().as_str())
                        .with("errorMessage", e.kind.to_string()),
                );
                DownloadOutcome::Failed
            }
        }
    }

    /// Display model.
    pub fn view(&self) -> GridItemView {
        let settled = matches!(self.load_state, LoadState::Loaded | LoadState::Failed);
        let skeleton = (!settled).then(|| Skeleton {
            height_px: 200 + (self.index % 3) as u32 * 50,
            media_type: *self.item.media_type(),
        });
        let media = self.should_load().then(|| match self.item.media_type() {
            MediaType::Photo => TileMedia::Image {
                src: self.item.media_url().clone(),
                alt: self
                    .item
                    .title()
                    .clone()
                    .unwrap_or_else(|| "Gallery memory".to_string()),
                eager: self.index < 4,
                priority: self.index < 2,
            },
            MediaType::Video => TileMedia::Video {
                mp4_url: self.item.media_url().clone(),
                poster_url: self.item.thumbnail_url().clone(),
            },
        });
        GridItemView {
            key: format!("{}-{}", self.item.id(), self.index),
            skeleton,
            media,
            title: self.item.title().clone(),
            uploader_name: self.item.uploader_name().clone(),
            download_busy: self.is_downloading(),
            entrance_delay_ms: self.index as u64 * 100,
        }
    }
}

/// All tiles of a gallery, in order.
#[derive(Debug, Default)]
pub struct GalleryGrid {
    items: Vec<GridItem>,
}

impl GalleryGrid {
    /// Mount `items`, asking `layout` for each tile's rectangle.
    pub fn mount<L>(items: Vec<MediaItem>, context: &GridContext, layout: L) -> Self
    where
        L: Fn(usize) -> Rect,
    {
        let items = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| GridItem::mount(item, index, layout(index), context))
            .collect();
        Self { items }
    }

    /// Tiles in order.
    pub fn items(&self) -> &[GridItem] {
        &self.items
    }

    /// Tile at `index`.
    pub fn item(&self, index: usize) -> Option<&GridItem> {
        self.items.get(index)
    }

    /// Mutable tile at `index`.
    pub fn item_mut(&mut self, index: usize) -> Option<&mut GridItem> {
        self.items.get_mut(index)
    }

    /// Number of tiles.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the grid is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Deliver a viewport change to every observing tile. Returns the indices
    /// that started loading.
    pub fn on_viewport(&mut self, viewport: &Rect) -> Vec<usize> {
        self.items
            .iter_mut()
            .filter_map(|item| item.on_viewport(viewport).then_some(item.index))
            .collect()
    }

    /// Display models in order.
    pub fn view(&self) -> Vec<GridItemView> {
        self.items.iter().map(GridItem::view).collect()
    }
}
