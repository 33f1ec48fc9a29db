//! Gallery header with the time-gated "download all" action.
//!
//! The gate is evaluated on the client clock only. Anyone who sets their
//! clock forward sees the action early; the `/download` route is expected to
//! enforce its own checks.

use chrono::{DateTime, Utc};
use keepsake_core::GallerySettings;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Now.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Start at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Jump to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    /// Move forward by `by`.
    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Latch that opens once a fixed instant has passed and never closes.
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use keepsake_gallery::TimeGate;
///
/// let event = Utc.with_ymd_and_hms(2025, 9, 18, 17, 0, 0).unwrap();
/// let mut gate = TimeGate::new(event, Duration::hours(25));
///
/// assert!(!gate.check(event + Duration::hours(24)));
/// assert!(gate.check(event + Duration::hours(25)));
/// // A clock that goes backwards does not close it again.
/// assert!(gate.check(event));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeGate {
    opens_at: DateTime<Utc>,
    revealed: bool,
}

impl TimeGate {
    /// Gate opening `delay` after `event_time`. A delay past the end of
    /// representable time never opens.
    pub fn new(event_time: DateTime<Utc>, delay: chrono::Duration) -> Self {
        Self {
            opens_at: event_time
                .checked_add_signed(delay)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            revealed: false,
        }
    }

    /// Gate from gallery settings.
    pub fn from_settings(settings: &GallerySettings) -> Self {
        Self::new(*settings.event_time(), settings.reveal_after())
    }

    /// When the gate opens.
    pub fn opens_at(&self) -> DateTime<Utc> {
        self.opens_at
    }

    /// Whether the gate has opened.
    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    /// Evaluate at `now`; returns whether the gate is open.
    pub fn check(&mut self, now: DateTime<Utc>) -> bool {
        if !self.revealed && now >= self.opens_at {
            info!(opens_at = %self.opens_at, "Download-all unlocked");
            self.revealed = true;
        }
        self.revealed
    }
}

/// Navigation to the bulk download page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DownloadAllAction {
    /// Route to navigate to
    pub route: &'static str,
}

impl Default for DownloadAllAction {
    fn default() -> Self {
        Self { route: "/download" }
    }
}

/// Display model of the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeaderView {
    /// Number of shared memories
    pub media_count: usize,
    /// Present once the gate has opened
    pub download_all: Option<DownloadAllAction>,
}

/// Gallery header state.
#[derive(Debug, Clone)]
pub struct GalleryHeader {
    media_count: usize,
    gate: TimeGate,
}

impl GalleryHeader {
    /// Mount the header, checking the gate at `now`.
    pub fn mount(media_count: usize, mut gate: TimeGate, now: DateTime<Utc>) -> Self {
        gate.check(now);
        Self { media_count, gate }
    }

    /// Update the media count.
    pub fn set_media_count(&mut self, media_count: usize) {
        self.media_count = media_count;
    }

    /// Re-check the gate at `now` and render.
    pub fn view(&mut self, now: DateTime<Utc>) -> HeaderView {
        self.gate.check(now);
        self.render()
    }

    /// Render without re-checking the gate.
    pub fn render(&self) -> HeaderView {
        HeaderView {
            media_count: self.media_count,
            download_all: self
                .gate
                .is_revealed()
                .then(DownloadAllAction::default),
        }
    }

    /// Apply a reveal published by [`watch_time_gate`].
    pub fn reveal(&mut self) {
        self.gate.revealed = true;
    }
}

/// Check `gate` now and then every `every`, publishing `true` once it opens.
///
/// The receiver starts with the result of the immediate check. The task ends
/// after the gate opens or once every receiver is dropped.
pub fn watch_time_gate(
    mut gate: TimeGate,
    clock: Arc<dyn Clock>,
    every: Duration,
) -> (watch::Receiver<bool>, JoinHandle<()>) {
    let open = gate.check(clock.now());
    let (tx, rx) = watch::channel(open);

    let handle = tokio::spawn(async move {
        if open {
            return;
        }
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately and duplicates the check above.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = tx.closed() => {
                    debug!("Time gate watcher dropped");
                    return;
                }
            }
            if gate.check(clock.now()) {
                let _ = tx.send(true);
                return;
            }
        }
    });

    (rx, handle)
}
