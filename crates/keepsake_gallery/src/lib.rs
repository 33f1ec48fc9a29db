//! Gallery component state for Keepsake.
//!
//! Each component is modelled as plain state plus event handlers and a
//! derived display model, so it can be driven by any renderer and tested
//! without one.
//!
//! - [`VideoPreview`]: video lifecycle with a load failsafe and a playback
//!   fallback
//! - [`GridItem`] / [`GalleryGrid`]: lazily loaded tiles with per-item download
//! - [`GalleryHeader`]: media count and the time-gated "download all" action

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod download;
mod grid;
mod header;
mod platform;
mod video;
mod visibility;

pub use download::{MediaDownloader, ProxyDownloader, SavedMedia};
pub use grid::{
    ClickEvent, DownloadOutcome, GalleryGrid, GridContext, GridItem, GridItemView,
    ImmediateLoadPolicy, LoadState, Skeleton, TileMedia,
};
pub use header::{
    Clock, DownloadAllAction, GalleryHeader, HeaderView, ManualClock, SystemClock, TimeGate,
    watch_time_gate,
};
pub use platform::Platform;
pub use video::{
    DEFAULT_FAILSAFE, Effect, FIRST_FRAME_SECONDS, MediaError, PlaybackSurface, Preload,
    PreviewNotice, PreviewOptions, PreviewView, ReadyCause, ReadyState, SeekError, SourceEntry,
    Transition, VideoAttributes, VideoEvent, VideoPreview, VideoSource, VideoState, reduce,
};
pub use visibility::{
    Rect, Subscription, ViewportObserver, ViewportRegistry, VisibilityEntry, VisibilityOptions,
    is_intersecting,
};
