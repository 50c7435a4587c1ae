use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{OptikError, Result};

/// Number of landmarks in a hand skeleton (MediaPipe hand model).
pub const LANDMARK_COUNT: usize = 21;

/// Landmark indices of the MediaPipe hand model.
pub mod landmarks {
    pub const WRIST: usize = 0;
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_MCP: usize = 5;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_DIP: usize = 7;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_DIP: usize = 11;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_MCP: usize = 13;
    pub const RING_PIP: usize = 14;
    pub const RING_DIP: usize = 15;
    pub const RING_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_DIP: usize = 19;
    pub const PINKY_TIP: usize = 20;
}

// =============================================================================
// Geometry
// =============================================================================

/// A single detector landmark. Units are detector-defined (normalized or pixels).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    /// Relative depth. Carried through but never used for classification.
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// A 2-D point. Used both for normalized `[0,1]²` coordinates and screen pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point2) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Integer screen coordinate handed to the OS injection layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CursorPosition {
    pub x: i32,
    pub y: i32,
}

impl fmt::Display for CursorPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// =============================================================================
// Detector output
// =============================================================================

/// Which hand the detector believes it saw.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Handedness {
    Left,
    Right,
    #[default]
    Unknown,
}

/// One detected hand: exactly 21 landmarks plus handedness and confidence.
///
/// Stored inline (no heap allocation) so frames can be copied across the
/// capture/control boundary at camera rate.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    points: [Landmark; LANDMARK_COUNT],
    #[serde(default)]
    handedness: Handedness,
    #[serde(default = "default_confidence")]
    confidence: f32,
}

fn default_confidence() -> f32 {
    1.0
}

impl LandmarkFrame {
    /// Build a frame from a fixed-size landmark array.
    pub fn new(points: [Landmark; LANDMARK_COUNT], handedness: Handedness, confidence: f32) -> Self {
        Self {
            points,
            handedness,
            confidence,
        }
    }

    /// Build a frame from a detector-supplied slice, which must hold exactly 21 points.
    pub fn from_slice(points: &[Landmark], handedness: Handedness, confidence: f32) -> Result<Self> {
        let points: [Landmark; LANDMARK_COUNT] = points.try_into().map_err(|_| {
            OptikError::Landmark(format!(
                "expected {} points, got {}",
                LANDMARK_COUNT,
                points.len()
            ))
        })?;
        Ok(Self::new(points, handedness, confidence))
    }

    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.points
    }

    pub fn point(&self, index: usize) -> Landmark {
        self.points[index]
    }

    pub fn handedness(&self) -> Handedness {
        self.handedness
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Whether every coordinate is a finite number.
    pub fn is_finite(&self) -> bool {
        self.points.iter().all(Landmark::is_finite)
    }
}

/// Everything the detector reported for one captured image.
pub type Detection = Vec<LandmarkFrame>;

/// The first reported hand is authoritative; any others are ignored.
pub fn primary_hand(hands: &[LandmarkFrame]) -> Option<LandmarkFrame> {
    hands.first().copied()
}

// =============================================================================
// Gestures
// =============================================================================

/// Committed gesture label. Exactly one is active at any time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureState {
    /// No hand, or no recognized pose.
    #[default]
    Idle,
    /// Index finger alone: the cursor follows the hand.
    Move,
    /// Short pinch: lasts a single frame.
    Click,
    /// Pinch held past the hold threshold.
    Drag,
    /// Index and middle extended.
    Scroll,
    /// Index, middle and ring extended.
    ScrollUp,
    /// Middle finger pinched against the thumb.
    EnterKey,
    /// All four fingers extended.
    Dictation,
}

impl GestureState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Move => "move",
            Self::Click => "click",
            Self::Drag => "drag",
            Self::Scroll => "scroll",
            Self::ScrollUp => "scroll_up",
            Self::EnterKey => "enter_key",
            Self::Dictation => "dictation",
        }
    }
}

impl fmt::Display for GestureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Intents
// =============================================================================

/// Keys the dispatcher can press.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Enter,
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Enter => write!(f, "Enter"),
        }
    }
}

/// A discrete action produced by the dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Intent {
    MoveTo { x: i32, y: i32 },
    MouseDown,
    MouseUp,
    /// Scroll by whole wheel lines. Positive scrolls up.
    ScrollBy { dy: i32 },
    KeyPress { key: Key },
    DictationStart,
    DictationStop,
}

impl Intent {
    pub fn move_to(position: CursorPosition) -> Self {
        Intent::MoveTo {
            x: position.x,
            y: position.y,
        }
    }

    /// Whether this intent goes to the dictation collaborator rather than the input sink.
    pub fn is_dictation(&self) -> bool {
        matches!(self, Intent::DictationStart | Intent::DictationStop)
    }
}
