//! Viewport intersection and one-shot visibility subscriptions.

use keepsake_core::GallerySettings;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Axis-aligned rectangle in CSS pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl Rect {
    /// Create a rectangle.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Surface area.
    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Grow by `margin` on every side.
    pub fn expand(&self, margin: f64) -> Self {
        Self {
            x: self.x - margin,
            y: self.y - margin,
            width: self.width + 2.0 * margin,
            height: self.height + 2.0 * margin,
        }
    }

    /// Overlap with `other`, if the two touch.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let bottom = (self.y + self.height).min(other.y + other.height);
        (right >= left && bottom >= top).then(|| Rect::new(left, top, right - left, bottom - top))
    }
}

/// Tuning for visibility checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisibilityOptions {
    /// Pixels added around the viewport before testing
    pub root_margin_px: f64,
    /// Fraction of the target that must overlap the expanded viewport
    pub threshold: f64,
}

impl Default for VisibilityOptions {
    fn default() -> Self {
        Self {
            root_margin_px: 50.0,
            threshold: 0.1,
        }
    }
}

impl VisibilityOptions {
    /// Options from gallery settings.
    pub fn from_settings(settings: &GallerySettings) -> Self {
        Self {
            root_margin_px: f64::from(*settings.root_margin_px()),
            threshold: *settings.visibility_threshold(),
        }
    }
}

/// Whether `target` counts as visible inside `viewport`.
///
/// The viewport is grown by the root margin; the target is visible when the
/// overlap covers at least `threshold` of its area.
///
/// ```
/// use keepsake_gallery::{Rect, VisibilityOptions, is_intersecting};
///
/// let viewport = Rect::new(0.0, 0.0, 400.0, 800.0);
/// let options = VisibilityOptions::default();
///
/// // Starts 10px below the fold: 40px of it falls inside the 50px margin.
/// assert!(is_intersecting(&options, &Rect::new(0.0, 810.0, 200.0, 250.0), &viewport));
/// // Far below the fold.
/// assert!(!is_intersecting(&options, &Rect::new(0.0, 2000.0, 200.0, 250.0), &viewport));
/// ```
pub fn is_intersecting(options: &VisibilityOptions, target: &Rect, viewport: &Rect) -> bool {
    let root = viewport.expand(options.root_margin_px);
    match target.intersection(&root) {
        Some(overlap) => {
            let area = target.area();
            let ratio = if area > 0.0 { overlap.area() / area } else { 1.0 };
            ratio >= options.threshold
        }
        None => false,
    }
}

/// Visibility report delivered to an observing component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityEntry {
    /// Whether the target crossed the threshold
    pub is_intersecting: bool,
}

impl VisibilityEntry {
    /// Compute an entry for `target` in `viewport`.
    pub fn compute(options: &VisibilityOptions, target: &Rect, viewport: &Rect) -> Self {
        Self {
            is_intersecting: is_intersecting(options, target, viewport),
        }
    }
}

/// A live observation. Dropping it stops the observation.
pub struct Subscription {
    id: u64,
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Wrap a release action.
    pub fn new(id: u64, release: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            id,
            release: Some(Box::new(release)),
        }
    }

    /// Observation identifier.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Stop observing now.
    pub fn release(mut self) {
        self.run_release();
    }

    fn run_release(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.release.is_some())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_release();
    }
}

/// Source of visibility observations.
pub trait ViewportObserver: Send + Sync {
    /// Start observing `target`.
    fn observe(&self, target: Rect, options: VisibilityOptions) -> Subscription;
}

#[derive(Debug, Clone, Copy)]
struct Observation {
    target: Rect,
    options: VisibilityOptions,
}

/// In-process [`ViewportObserver`] tracking every live observation.
#[derive(Debug, Clone, Default)]
pub struct ViewportRegistry {
    observations: Arc<Mutex<HashMap<u64, Observation>>>,
    next_id: Arc<AtomicU64>,
}

impl ViewportRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live observations.
    pub fn active(&self) -> usize {
        self.observations.lock().len()
    }

    /// Whether observation `id` is still live.
    pub fn is_observing(&self, id: u64) -> bool {
        self.observations.lock().contains_key(&id)
    }

    /// Live observations whose targets are visible in `viewport`.
    pub fn intersecting(&self, viewport: &Rect) -> Vec<u64> {
        let mut ids: Vec<u64> = self
            .observations
            .lock()
            .iter()
            .filter(|(_, o)| is_intersecting(&o.options, &o.target, viewport))
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }
}

impl ViewportObserver for ViewportRegistry {
    fn observe(&self, target: Rect, options: VisibilityOptions) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.observations
            .lock()
            .insert(id, Observation { target, options });
        let observations = Arc::downgrade(&self.observations);
        Subscription::new(id, move || {
            if let Some(observations) = observations.upgrade() {
                observations.lock().remove(&id);
            }
        })
    }
}
