//! Cursor motion smoothing.
//!
//! The control point is mapped through an [`ActiveRegion`] (the part of the
//! camera frame the hand comfortably covers), scaled to screen pixels and
//! filtered with an exponential moving average. Near the screen edges the
//! smoothing factor rises continuously toward `edge_alpha` so the cursor can
//! reach the border without the hand leaving the camera.

use std::collections::VecDeque;

use serde::Serialize;

use optik_core::config::{OptikConfig, RegionConfig, ScreenConfig, SmoothingConfig};
use optik_core::types::{CursorPosition, Point2};

/// Rectangle of the camera frame that is stretched onto the whole screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActiveRegion {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    grow_rate: f64,
    decay_rate: f64,
    min_span: f64,
}

impl ActiveRegion {
    pub fn new(config: &RegionConfig) -> Self {
        Self {
            min_x: config.inset,
            min_y: config.inset,
            max_x: 1.0 - config.inset,
            max_y: 1.0 - config.inset,
            grow_rate: config.grow_rate,
            decay_rate: config.decay_rate,
            min_span: config.min_span,
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Map a camera point into `[0,1]²` relative to the region.
    pub fn map(&self, p: Point2) -> Point2 {
        Point2::new(
            ((p.x - self.min_x) / self.width()).clamp(0.0, 1.0),
            ((p.y - self.min_y) / self.height()).clamp(0.0, 1.0),
        )
    }

    /// Adapt the region to an observed point: grow toward points outside it,
    /// then shrink by the decay rate.
    pub fn observe(&mut self, p: Point2) {
        if self.grow_rate > 0.0 {
            if p.x < self.min_x {
                self.min_x -= self.grow_rate * (self.min_x - p.x);
            }
            if p.x > self.max_x {
                self.max_x += self.grow_rate * (p.x - self.max_x);
            }
            if p.y < self.min_y {
                self.min_y -= self.grow_rate * (self.min_y - p.y);
            }
            if p.y > self.max_y {
                self.max_y += self.grow_rate * (p.y - self.max_y);
            }
            self.min_x = self.min_x.max(0.0);
            self.min_y = self.min_y.max(0.0);
            self.max_x = self.max_x.min(1.0);
            self.max_y = self.max_y.min(1.0);
        }

        if self.decay_rate > 0.0 {
            let (min_x, max_x) = shrink(self.min_x, self.max_x, self.decay_rate, self.min_span);
            let (min_y, max_y) = shrink(self.min_y, self.max_y, self.decay_rate, self.min_span);
            self.min_x = min_x;
            self.max_x = max_x;
            self.min_y = min_y;
            self.max_y = max_y;
        }
    }
}

/// Move both ends inward by `rate`, stopping at `min_span` around the center.
fn shrink(lo: f64, hi: f64, rate: f64, min_span: f64) -> (f64, f64) {
    if hi - lo <= min_span {
        return (lo, hi);
    }
    let (lo, hi) = (lo + rate, hi - rate);
    if hi - lo >= min_span {
        return (lo, hi);
    }
    let center = (lo + hi) / 2.0;
    (center - min_span / 2.0, center + min_span / 2.0)
}

/// Filter state, updated exactly once per processed frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CursorState {
    /// Last filtered position, screen pixels.
    pub smoothed: Point2,
    /// Last unfiltered (mapped) position, screen pixels.
    pub raw: Point2,
    /// Change of `smoothed` over the last frame, pixels per frame.
    pub velocity: Point2,
    pub seeded: bool,
}

#[derive(Debug, Clone)]
pub struct MotionSmoother {
    smoothing: SmoothingConfig,
    screen_width: f64,
    screen_height: f64,
    region: ActiveRegion,
    state: CursorState,
    /// Set while the hand is absent; the next sighting reseeds the filter.
    absent: bool,
}

impl MotionSmoother {
    pub fn new(smoothing: &SmoothingConfig, screen: &ScreenConfig) -> Self {
        let (w, h) = (f64::from(screen.width), f64::from(screen.height));
        let center = Point2::new(w / 2.0, h / 2.0);
        Self {
            smoothing: smoothing.clone(),
            screen_width: w,
            screen_height: h,
            region: ActiveRegion::new(&smoothing.region),
            state: CursorState {
                smoothed: center,
                raw: center,
                velocity: Point2::default(),
                seeded: false,
            },
            absent: true,
        }
    }

    pub fn from_config(config: &OptikConfig) -> Self {
        Self::new(&config.smoothing, &config.screen)
    }

    pub fn state(&self) -> &CursorState {
        &self.state
    }

    pub fn region(&self) -> &ActiveRegion {
        &self.region
    }

    /// Edge-boosted smoothing factor for a point mapped into `[0,1]²`.
    pub fn alpha_at(&self, mapped: Point2) -> f64 {
        let s = &self.smoothing;
        let d = mapped
            .x
            .min(1.0 - mapped.x)
            .min(mapped.y)
            .min(1.0 - mapped.y)
            .max(0.0);
        let boost = if s.edge_margin > 0.0 && d < s.edge_margin {
            (1.0 - d / s.edge_margin).powf(s.edge_curve)
        } else {
            0.0
        };
        s.alpha + (s.edge_alpha - s.alpha) * boost
    }

    /// Advance one frame. `None` means the hand is absent: the cursor holds.
    pub fn update(&mut self, control_point: Option<Point2>) -> CursorPosition {
        let Some(point) = control_point else {
            self.absent = true;
            self.state.velocity = Point2::default();
            return self.position();
        };

        self.region.observe(point);
        let mapped = self.region.map(point);
        let raw = Point2::new(mapped.x * self.screen_width, mapped.y * self.screen_height);
        self.state.raw = raw;

        if self.absent || !self.state.seeded {
            tracing::trace!(x = raw.x, y = raw.y, "Reseeding cursor filter");
            self.state.smoothed = raw;
            self.state.velocity = Point2::default();
            self.state.seeded = true;
            self.absent = false;
        } else {
            let alpha = self.alpha_at(mapped);
            let prev = self.state.smoothed;
            let next = Point2::new(
                prev.x + alpha * (raw.x - prev.x),
                prev.y + alpha * (raw.y - prev.y),
            );
            self.state.velocity = Point2::new(next.x - prev.x, next.y - prev.y);
            self.state.smoothed = next;
        }
        self.position()
    }

    /// Smoothed position in integer pixels, clamped to the screen.
    pub fn position(&self) -> CursorPosition {
        let clamp = |v: f64, extent: f64| v.round().clamp(0.0, (extent - 1.0).max(0.0)) as i32;
        CursorPosition {
            x: clamp(self.state.smoothed.x, self.screen_width),
            y: clamp(self.state.smoothed.y, self.screen_height),
        }
    }
}

/// Running mean of the last few cursor positions, applied on top of the
/// filter while a drag is held.
#[derive(Debug, Clone)]
pub struct DragAverager {
    window: usize,
    recent: VecDeque<CursorPosition>,
}

impl DragAverager {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            recent: VecDeque::with_capacity(window),
        }
    }

    /// Add `position` and return the mean of the window.
    pub fn push(&mut self, position: CursorPosition) -> CursorPosition {
        if self.window == 1 {
            return position;
        }
        if self.recent.len() == self.window {
            self.recent.pop_front();
        }
        self.recent.push_back(position);

        let n = self.recent.len() as f64;
        let (sx, sy) = self
            .recent
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + f64::from(p.x), sy + f64::from(p.y)));
        CursorPosition {
            x: (sx / n).round() as i32,
            y: (sy / n).round() as i32,
        }
    }

    pub fn clear(&mut self) {
        self.recent.clear();
    }

    pub fn len(&self) -> usize {
        self.recent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
