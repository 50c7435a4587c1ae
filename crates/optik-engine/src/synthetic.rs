//! Deterministic hand poses for tests and benchmarks.
//!
//! The skeleton is an upright right hand, palm facing the camera, in
//! normalized image coordinates. Extended fingertips sit well above their PIP
//! joint and curled ones fold back below it, so the default
//! `extension_ratio` separates them with a wide margin.

use optik_core::config::ControlPoint;
use optik_core::types::{landmarks, Detection, Handedness, Landmark, LandmarkFrame, LANDMARK_COUNT};

const WRIST: (f32, f32) = (0.5, 0.8);
const FINGER_X: [f32; 4] = [0.42, 0.5, 0.58, 0.66];
const MCP_Y: f32 = 0.6;
const PIP_Y: f32 = 0.5;
const TIP_EXTENDED_Y: f32 = 0.38;
const TIP_CURLED_Y: f32 = 0.62;
const THUMB_TIP: (f32, f32) = (0.28, 0.6);
/// Thumb-to-fingertip gap of a closed pinch.
const PINCH_GAP: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finger {
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    fn slot(self) -> usize {
        match self {
            Finger::Index => 0,
            Finger::Middle => 1,
            Finger::Ring => 2,
            Finger::Pinky => 3,
        }
    }
}

/// Builder for a single synthetic hand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticHand {
    extended: [bool; 4],
    pinch: Option<Finger>,
    offset: (f32, f32),
    confidence: f32,
    handedness: Handedness,
}

impl SyntheticHand {
    /// Hand with the given fingers (index, middle, ring, pinky) extended.
    pub fn with_extended(index: bool, middle: bool, ring: bool, pinky: bool) -> Self {
        Self {
            extended: [index, middle, ring, pinky],
            pinch: None,
            offset: (0.0, 0.0),
            confidence: 0.95,
            handedness: Handedness::Right,
        }
    }

    pub fn fist() -> Self {
        Self::with_extended(false, false, false, false)
    }

    /// Index alone: the move pose.
    pub fn pointing() -> Self {
        Self::with_extended(true, false, false, false)
    }

    /// Index and middle: scroll down.
    pub fn two_fingers() -> Self {
        Self::with_extended(true, true, false, false)
    }

    /// Index, middle and ring: scroll up.
    pub fn three_fingers() -> Self {
        Self::with_extended(true, true, true, false)
    }

    /// All four fingers: dictation.
    pub fn open_palm() -> Self {
        Self::with_extended(true, true, true, true)
    }

    /// Touch the thumb tip to the tip of `finger`.
    pub fn pinching(mut self, finger: Finger) -> Self {
        self.pinch = Some(finger);
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn translated(mut self, dx: f32, dy: f32) -> Self {
        self.offset = (self.offset.0 + dx, self.offset.1 + dy);
        self
    }

    /// Shift the hand so that `control_point` lands on `(x, y)`.
    pub fn control_at(mut self, control_point: ControlPoint, x: f32, y: f32) -> Self {
        self.offset = (0.0, 0.0);
        let anchor = self.points()[control_point.landmark_index()];
        self.offset = (x - anchor.x, y - anchor.y);
        self
    }

    fn points(&self) -> [Landmark; LANDMARK_COUNT] {
        let (ox, oy) = self.offset;
        let at = |x: f32, y: f32| Landmark::new(x + ox, y + oy, 0.0);
        let mut points = [Landmark::default(); LANDMARK_COUNT];

        points[landmarks::WRIST] = at(WRIST.0, WRIST.1);
        points[landmarks::THUMB_CMC] = at(0.42, 0.74);
        points[landmarks::THUMB_MCP] = at(0.36, 0.68);
        points[landmarks::THUMB_IP] = at(0.31, 0.64);
        points[landmarks::THUMB_TIP] = at(THUMB_TIP.0, THUMB_TIP.1);

        for (slot, &x) in FINGER_X.iter().enumerate() {
            let base = landmarks::INDEX_MCP + slot * 4;
            let (dip_y, tip_y) = if self.extended[slot] {
                (0.45, TIP_EXTENDED_Y)
            } else {
                (0.56, TIP_CURLED_Y)
            };
            points[base] = at(x, MCP_Y);
            points[base + 1] = at(x, PIP_Y);
            points[base + 2] = at(x, dip_y);
            points[base + 3] = at(x, tip_y);
        }

        if let Some(finger) = self.pinch {
            let tip = points[landmarks::INDEX_TIP + finger.slot() * 4];
            points[landmarks::THUMB_TIP] = Landmark::new(tip.x + PINCH_GAP, tip.y, 0.0);
        }
        points
    }

    pub fn frame(&self) -> LandmarkFrame {
        LandmarkFrame::new(self.points(), self.handedness, self.confidence)
    }

    /// The same frame in pixel units of a `width` x `height` camera image.
    pub fn frame_in_pixels(&self, width: u32, height: u32) -> LandmarkFrame {
        let mut points = self.points();
        for p in points.iter_mut() {
            p.x *= width as f32;
            p.y *= height as f32;
        }
        LandmarkFrame::new(points, self.handedness, self.confidence)
    }

    pub fn detection(&self) -> Detection {
        vec![self.frame()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_at_places_landmark() {
        let frame = SyntheticHand::pointing()
            .control_at(ControlPoint::IndexTip, 0.25, 0.75)
            .frame();
        let tip = frame.point(landmarks::INDEX_TIP);
        assert!((tip.x - 0.25).abs() < 1e-6);
        assert!((tip.y - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_pinch_moves_thumb_to_fingertip() {
        let frame = SyntheticHand::pointing().pinching(Finger::Middle).frame();
        let thumb = frame.point(landmarks::THUMB_TIP);
        let middle = frame.point(landmarks::MIDDLE_TIP);
        assert!((thumb.x - middle.x - PINCH_GAP).abs() < 1e-6);
        assert_eq!(thumb.y, middle.y);
    }

    #[test]
    fn test_frame_in_pixels_scales() {
        let hand = SyntheticHand::fist();
        let px = hand.frame_in_pixels(640, 480);
        let wrist = px.point(landmarks::WRIST);
        assert!((wrist.x - 320.0).abs() < 1e-3);
        assert!((wrist.y - 384.0).abs() < 1e-3);
    }
}
