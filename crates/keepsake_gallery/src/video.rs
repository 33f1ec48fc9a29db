//! Video preview lifecycle.
//!
//! A preview moves through a small set of states driven by media element
//! events. [`reduce`] is the pure transition function; [`VideoPreview`] owns
//! the state for one mounted preview and carries out the side effects the
//! reducer asks for.

use crate::Platform;
use keepsake_logger::{LogContext, StructuredLog};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Position the preview seeks to so browsers paint the first frame.
pub const FIRST_FRAME_SECONDS: f64 = 0.001;

/// Default delay before a silent preview leaves its loading overlay.
pub const DEFAULT_FAILSAFE: Duration = Duration::from_secs(5);

/// Error reported by the media element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaError {
    /// `MediaError.code` (1 aborted, 2 network, 3 decode, 4 unsupported)
    pub code: Option<u16>,
    /// Browser-supplied message
    pub message: Option<String>,
}

impl MediaError {
    /// Create a media error.
    pub fn new(code: Option<u16>, message: Option<String>) -> Self {
        Self { code, message }
    }
}

impl std::fmt::Display for MediaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.message.as_deref().filter(|m| !m.is_empty()) {
            Some(message) => write!(f, "Video error: {}", message),
            None => write!(f, "Video error: Video load failed"),
        }
    }
}

impl std::error::Error for MediaError {}

/// Why a preview became ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReadyCause {
    /// Dimensions and duration are known
    Metadata,
    /// Enough data buffered to start playing
    CanPlay,
    /// No event arrived within the failsafe window
    Failsafe,
}

/// Lifecycle state of one preview.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoState {
    /// Mounted, nothing heard from the element yet
    #[default]
    Initial,
    /// The element started fetching
    Loading,
    /// Playable or forced out of loading
    Ready {
        /// First event that made the preview ready
        cause: ReadyCause,
        /// Whether the can-play side effects already ran
        can_play_applied: bool,
    },
    /// Playback failed; the placeholder replaces the video
    Fallback {
        /// What the element reported
        error: MediaError,
    },
}

impl VideoState {
    /// Whether the preview reached a state the loading overlay does not cover.
    pub fn is_settled(&self) -> bool {
        matches!(self, VideoState::Ready { .. } | VideoState::Fallback { .. })
    }
}

/// Media element events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoEvent {
    /// `loadstart`
    LoadStart,
    /// `loadedmetadata`
    MetadataLoaded,
    /// `canplay`
    CanPlay,
    /// `error`
    PlaybackError(MediaError),
    /// The failsafe window elapsed
    FailsafeElapsed,
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Seek to [`FIRST_FRAME_SECONDS`] if enough data is buffered
    SeekFirstFrame,
    /// Tell the owner the media loaded
    NotifyLoaded,
    /// Tell the owner the media failed
    NotifyFailed,
    /// Log the playback failure
    ReportError(MediaError),
}

/// Result of applying one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// New state
    pub state: VideoState,
    /// Effects to run, in order
    pub effects: Vec<Effect>,
}

impl Transition {
    fn stay(state: &VideoState) -> Self {
        Self {
            state: state.clone(),
            effects: Vec::new(),
        }
    }
}

/// Apply `event` to `state`.
///
/// - A fallback absorbs every event.
/// - Can-play runs its effects once; later can-play events change nothing.
/// - The failsafe only moves previews that are still initial or loading.
///
/// ```
/// use keepsake_gallery::{Effect, ReadyCause, VideoEvent, VideoState, reduce};
///
/// let t = reduce(&VideoState::Loading, VideoEvent::CanPlay);
/// assert_eq!(
///     t.state,
///     VideoState::Ready { cause: ReadyCause::CanPlay, can_play_applied: true }
/// );
/// assert_eq!(t.effects, vec![Effect::SeekFirstFrame, Effect::NotifyLoaded]);
///
/// let again = reduce(&t.state, VideoEvent::CanPlay);
/// assert!(again.effects.is_empty());
/// ```
pub fn reduce(state: &VideoState, event: VideoEvent) -> Transition {
    if matches!(state, VideoState::Fallback { .. }) {
        return Transition::stay(state);
    }

    match event {
        VideoEvent::PlaybackError(error) => Transition {
            state: VideoState::Fallback {
                error: error.clone(),
            },
            effects: vec![Effect::ReportError(error), Effect::NotifyFailed],
        },
        VideoEvent::LoadStart => match state {
            VideoState::Initial => Transition {
                state: VideoState::Loading,
                effects: Vec::new(),
            },
            _ => Transition::stay(state),
        },
        VideoEvent::MetadataLoaded => match state {
            VideoState::Initial | VideoState::Loading => Transition {
                state: VideoState::Ready {
                    cause: ReadyCause::Metadata,
                    can_play_applied: false,
                },
                effects: Vec::new(),
            },
            _ => Transition::stay(state),
        },
        VideoEvent::CanPlay => match state {
            VideoState::Ready {
                can_play_applied: true,
                ..
            } => Transition::stay(state),
            VideoState::Ready { cause, .. } => Transition {
                state: VideoState::Ready {
                    cause: *cause,
                    can_play_applied: true,
                },
                effects: vec![Effect::SeekFirstFrame, Effect::NotifyLoaded],
            },
            _ => Transition {
                state: VideoState::Ready {
                    cause: ReadyCause::CanPlay,
                    can_play_applied: true,
                },
                effects: vec![Effect::SeekFirstFrame, Effect::NotifyLoaded],
            },
        },
        VideoEvent::FailsafeElapsed => match state {
            VideoState::Initial | VideoState::Loading => Transition {
                state: VideoState::Ready {
                    cause: ReadyCause::Failsafe,
                    can_play_applied: false,
                },
                effects: vec![Effect::NotifyLoaded],
            },
            _ => Transition::stay(state),
        },
    }
}

/// `HTMLMediaElement.readyState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReadyState {
    /// No information
    HaveNothing,
    /// Metadata only
    HaveMetadata,
    /// Data for the current position
    HaveCurrentData,
    /// Data beyond the current position
    HaveFutureData,
    /// Enough to play through
    HaveEnoughData,
}

/// A seek the element refused.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("Seek failed: {}", message)]
pub struct SeekError {
    /// Why the seek failed
    pub message: String,
}

impl SeekError {
    /// Create a seek error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The media element a preview drives.
pub trait PlaybackSurface: Send + Sync {
    /// Current buffering level.
    fn ready_state(&self) -> ReadyState;

    /// Move the playback position.
    fn seek(&mut self, seconds: f64) -> Result<(), SeekError>;
}

/// Where a preview's media lives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSource {
    /// MP4 rendition, always offered
    pub mp4_url: String,
    /// Optional WebM rendition
    pub webm_url: Option<String>,
    /// Poster frame
    pub poster_url: Option<String>,
}

impl VideoSource {
    /// Source with only an MP4 rendition.
    pub fn mp4(url: impl Into<String>) -> Self {
        Self {
            mp4_url: url.into(),
            ..Self::default()
        }
    }

    /// Attach a poster.
    pub fn with_poster(mut self, poster_url: impl Into<String>) -> Self {
        self.poster_url = Some(poster_url.into());
        self
    }

    /// Attach a WebM rendition.
    pub fn with_webm(mut self, webm_url: impl Into<String>) -> Self {
        self.webm_url = Some(webm_url.into());
        self
    }

    fn has_poster(&self) -> bool {
        self.poster_url.as_deref().is_some_and(|p| !p.is_empty())
    }
}

/// Presentation options that reset the preview when changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PreviewOptions {
    /// Show native controls (full viewer) instead of a muted loop
    pub show_controls: bool,
    /// Start playing on load
    pub autoplay: bool,
    /// Keep a 16:9 box instead of filling the container
    pub fixed_aspect: bool,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            show_controls: false,
            autoplay: false,
            fixed_aspect: true,
        }
    }
}

/// `preload` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
pub enum Preload {
    /// Fetch only metadata
    #[display("metadata")]
    Metadata,
    /// Fetch eagerly
    #[display("auto")]
    Auto,
}

/// Attributes for the video element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoAttributes {
    /// Muted
    pub muted: bool,
    /// Loop playback
    pub looped: bool,
    /// Autoplay
    pub autoplay: bool,
    /// Native controls
    pub controls: bool,
    /// Preload hint
    pub preload: Preload,
}

/// One `<source>` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceEntry {
    /// Media URL
    pub url: String,
    /// MIME type
    pub mime: &'static str,
}

/// What a mounted preview should display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewView {
    /// Render the video element
    pub show_video: bool,
    /// Poster frame still covering the video
    pub poster_visible: bool,
    /// Loading spinner
    pub spinner_visible: bool,
    /// Play-icon overlay
    pub play_overlay_visible: bool,
    /// Generic placeholder after a failure
    pub placeholder_visible: bool,
    /// Poster image shown in place of a failed video
    pub error_poster_visible: bool,
}

/// Notification for the preview's owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreviewNotice {
    /// Media is playable
    Loaded,
    /// Media failed
    Failed,
}

/// One mounted video preview.
///
/// # Example
///
/// ```
/// use keepsake_core::Environment;
/// use keepsake_gallery::{
///     Platform, PlaybackSurface, PreviewNotice, PreviewOptions, ReadyState, SeekError,
///     VideoEvent, VideoPreview, VideoSource,
/// };
/// use keepsake_logger::{Logger, NoopCollector};
/// use std::sync::Arc;
/// use std::time::Instant;
///
/// struct Element;
///
/// impl PlaybackSurface for Element {
///     fn ready_state(&self) -> ReadyState {
///         ReadyState::HaveEnoughData
///     }
///     fn seek(&mut self, _seconds: f64) -> Result<(), SeekError> {
///         Ok(())
///     }
/// }
///
/// let logger = Arc::new(Logger::new(Environment::Test, Arc::new(NoopCollector)));
/// let now = Instant::now();
/// let mut preview = VideoPreview::mount(
///     VideoSource::mp4("https://cdn.example.com/clip.mp4"),
///     PreviewOptions::default(),
///     Platform::desktop(),
///     Box::new(Element),
///     logger,
///     now,
/// );
///
/// assert!(preview.view().spinner_visible);
/// assert_eq!(preview.handle(VideoEvent::CanPlay), Some(PreviewNotice::Loaded));
/// assert!(!preview.view().spinner_visible);
/// ```
pub struct VideoPreview {
    source: VideoSource,
    options: PreviewOptions,
    platform: Platform,
    state: VideoState,
    mounted_at: Instant,
    failsafe: Duration,
    surface: Box<dyn PlaybackSurface>,
    logger: Arc<dyn StructuredLog>,
}

impl std::fmt::Debug for VideoPreview {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoPreview")
            .field("source", &self.source)
            .field("options", &self.options)
            .field("platform", &self.platform)
            .field("state", &self.state)
            .field("failsafe", &self.failsafe)
            .finish_non_exhaustive()
    }
}

impl VideoPreview {
    /// Mount a preview at `now`.
    pub fn mount(
        source: VideoSource,
        options: PreviewOptions,
        platform: Platform,
        surface: Box<dyn PlaybackSurface>,
        logger: Arc<dyn StructuredLog>,
        now: Instant,
    ) -> Self {
        debug!(
            mp4_url = %source.mp4_url,
            has_poster = source.has_poster(),
            is_mobile = platform.is_mobile(),
            is_ios = platform.is_ios(),
            "Mounting video preview"
        );
        Self {
            source,
            options,
            platform,
            state: VideoState::Initial,
            mounted_at: now,
            failsafe: DEFAULT_FAILSAFE,
            surface,
            logger,
        }
    }

    /// Use a different failsafe window.
    pub fn with_failsafe(mut self, failsafe: Duration) -> Self {
        self.failsafe = failsafe;
        self
    }

    /// Current state.
    pub fn state(&self) -> &VideoState {
        &self.state
    }

    /// Media source.
    pub fn source(&self) -> &VideoSource {
        &self.source
    }

    /// Replace source and options; the preview restarts if either changed.
    pub fn set_source(&mut self, source: VideoSource, options: PreviewOptions, now: Instant) {
        if source == self.source && options == self.options {
            return;
        }
        debug!(mp4_url = %source.mp4_url, "Video source changed, resetting preview");
        self.source = source;
        self.options = options;
        self.state = VideoState::Initial;
        self.mounted_at = now;
    }

    /// Feed a media element event.
    pub fn handle(&mut self, event: VideoEvent) -> Option<PreviewNotice> {
        let Transition { state, effects } = reduce(&self.state, event);
        if state != self.state {
            debug!(from = ?self.state, to = ?state, mp4_url = %self.source.mp4_url, "Video preview transition");
        }
        self.state = state;

        let mut notice = None;
        for effect in effects {
            match effect {
                Effect::SeekFirstFrame => self.seek_first_frame(),
                Effect::NotifyLoaded => notice = Some(PreviewNotice::Loaded),
                Effect::NotifyFailed => notice = Some(PreviewNotice::Failed),
                Effect::ReportError(error) => self.report_error(&error),
            }
        }
        notice
    }

    /// Apply the failsafe if its window has elapsed.
    pub fn tick(&mut self, now: Instant) -> Option<PreviewNotice> {
        if self.state.is_settled() || now.duration_since(self.mounted_at) < self.failsafe {
            return None;
        }
        debug!(mp4_url = %self.source.mp4_url, "Failsafe timeout, hiding overlay");
        self.handle(VideoEvent::FailsafeElapsed)
    }

    /// Best effort: a refused seek leaves the poster frame in place.
    fn seek_first_frame(&mut self) {
        if self.surface.ready_state() < ReadyState::HaveCurrentData {
            return;
        }
        if let Err(e) = self.surface.seek(FIRST_FRAME_SECONDS) {
            debug!(error = %e, "Ignoring first-frame seek failure");
        }
    }

    fn report_error(&self, error: &MediaError) {
        let context = LogContext::new()
            .with("component", "VideoPreview")
            .with("mp4Url", self.source.mp4_url.as_str())
            .with("hasPoster", self.source.has_poster())
            .with("errorCode", error.code)
            .with("errorMessage", error.message.clone())
            .with("isMobile", self.platform.is_mobile())
            .with("isIOS", self.platform.is_ios());
        let error: &(dyn std::error::Error + 'static) = error;
        self.logger.error("Video failed to load", Some(error), context);
    }

    /// Derived display flags.
    pub fn view(&self) -> PreviewView {
        match &self.state {
            VideoState::Initial => PreviewView {
                show_video: true,
                poster_visible: true,
                spinner_visible: !self.platform.is_mobile(),
                play_overlay_visible: true,
                ..PreviewView::default()
            },
            VideoState::Loading => PreviewView {
                show_video: true,
                poster_visible: true,
                spinner_visible: true,
                play_overlay_visible: true,
                ..PreviewView::default()
            },
            VideoState::Ready { .. } => PreviewView {
                show_video: true,
                ..PreviewView::default()
            },
            VideoState::Fallback { .. } => PreviewView {
                placeholder_visible: true,
                error_poster_visible: self.source.has_poster(),
                ..PreviewView::default()
            },
        }
    }

    /// `<source>` entries in preference order. WebM is skipped on iOS.
    pub fn sources(&self) -> Vec<SourceEntry> {
        let webm = self
            .source
            .webm_url
            .as_ref()
            .filter(|_| !self.platform.is_ios())
            .map(|url| SourceEntry {
                url: url.clone(),
                mime: "video/webm",
            });
        webm.into_iter()
            .chain(std::iter::once(SourceEntry {
                url: self.source.mp4_url.clone(),
                mime: "video/mp4",
            }))
            .collect()
    }

    /// Element attributes for the current options.
    pub fn attributes(&self) -> VideoAttributes {
        let controls = self.options.show_controls;
        VideoAttributes {
            muted: !controls,
            looped: !controls,
            autoplay: self.options.autoplay,
            controls,
            preload: if controls {
                Preload::Auto
            } else {
                Preload::Metadata
            },
        }
    }
}
