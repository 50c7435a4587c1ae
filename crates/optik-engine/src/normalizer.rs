//! Landmark normalization and feature extraction.
//!
//! Turns a raw detector frame into a [`FeatureVector`]: per-finger extension
//! flags, thumb pinch distances and the cursor control point, all in the
//! normalized `[0,1]²` image frame.

use serde::Serialize;

use optik_core::config::{CameraConfig, GestureConfig, OptikConfig};
use optik_core::types::{landmarks, Landmark, LandmarkFrame, Point2};

/// Geometry derived from one frame. Recomputed every frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector {
    pub index_extended: bool,
    pub middle_extended: bool,
    pub ring_extended: bool,
    pub pinky_extended: bool,
    /// Index tip to thumb tip, normalized units.
    pub index_pinch: f64,
    /// Middle tip to thumb tip, normalized units.
    pub middle_pinch: f64,
    pub control_point: Point2,
}

impl FeatureVector {
    pub fn extended_count(&self) -> usize {
        [
            self.index_extended,
            self.middle_extended,
            self.ring_extended,
            self.pinky_extended,
        ]
        .iter()
        .filter(|e| **e)
        .count()
    }
}

#[derive(Debug, Clone)]
pub struct LandmarkNormalizer {
    pixel_landmarks: bool,
    width: f64,
    height: f64,
    mirror_x: bool,
    min_confidence: f32,
    extension_ratio: f64,
    control_index: usize,
}

impl LandmarkNormalizer {
    pub fn new(camera: &CameraConfig, gestures: &GestureConfig) -> Self {
        Self {
            pixel_landmarks: camera.pixel_landmarks,
            width: f64::from(camera.width),
            height: f64::from(camera.height),
            mirror_x: camera.mirror_x,
            min_confidence: camera.min_confidence,
            extension_ratio: gestures.extension_ratio,
            control_index: gestures.control_point.landmark_index(),
        }
    }

    pub fn from_config(config: &OptikConfig) -> Self {
        Self::new(&config.camera, &config.gestures)
    }

    /// Rescale one landmark into the unit frame. Depth is dropped.
    pub fn normalize_point(&self, landmark: Landmark) -> Point2 {
        let (mut x, mut y) = (f64::from(landmark.x), f64::from(landmark.y));
        if self.pixel_landmarks {
            x /= self.width;
            y /= self.height;
        }
        if self.mirror_x {
            x = 1.0 - x;
        }
        Point2::new(x, y)
    }

    /// Features for the primary hand, or `None` when there is no usable hand.
    ///
    /// Low-confidence frames and frames with non-finite coordinates count as
    /// no hand.
    pub fn features(&self, frame: Option<&LandmarkFrame>) -> Option<FeatureVector> {
        let frame = frame?;
        if frame.confidence() < self.min_confidence {
            tracing::trace!(
                confidence = frame.confidence(),
                min = self.min_confidence,
                "Discarding low-confidence hand"
            );
            return None;
        }
        if !frame.is_finite() {
            tracing::debug!("Discarding hand with non-finite landmarks");
            return None;
        }

        let p = |i: usize| self.normalize_point(frame.point(i));
        let wrist = p(landmarks::WRIST);
        let thumb = p(landmarks::THUMB_TIP);
        let extended = |tip: usize, pip: usize| {
            p(tip).distance(&wrist) > p(pip).distance(&wrist) * self.extension_ratio
        };

        Some(FeatureVector {
            index_extended: extended(landmarks::INDEX_TIP, landmarks::INDEX_PIP),
            middle_extended: extended(landmarks::MIDDLE_TIP, landmarks::MIDDLE_PIP),
            ring_extended: extended(landmarks::RING_TIP, landmarks::RING_PIP),
            pinky_extended: extended(landmarks::PINKY_TIP, landmarks::PINKY_PIP),
            index_pinch: p(landmarks::INDEX_TIP).distance(&thumb),
            middle_pinch: p(landmarks::MIDDLE_TIP).distance(&thumb),
            control_point: p(self.control_index),
        })
    }
}
