use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{OptikError, Result};
use crate::types::landmarks;

/// Top-level configuration for Optik.
///
/// Loaded from `~/.optik/config.toml` by default. The whole object is handed
/// to the engine at construction and never reloaded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptikConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub screen: ScreenConfig,
    #[serde(default)]
    pub smoothing: SmoothingConfig,
    #[serde(default)]
    pub gestures: GestureConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub dictation: DictationConfig,
}

impl OptikConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed. Values are not
    /// range-checked here; see [`OptikConfig::validate`].
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: OptikConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Check every section for out-of-range or inverted values.
    pub fn validate(&self) -> Result<()> {
        self.camera.validate()?;
        self.screen.validate()?;
        self.smoothing.validate()?;
        self.gestures.validate()?;
        self.dispatch.validate()?;
        self.dictation.validate()?;
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> OptikError {
    OptikError::Config(msg.into())
}

fn check_unit(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(invalid(format!("{} must be within [0, 1], got {}", name, value)));
    }
    Ok(())
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Camera and detector settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Target capture rate.
    pub fps: f64,
    /// Detector reports pixel coordinates instead of `[0,1]` values.
    pub pixel_landmarks: bool,
    /// Mirror the x axis (selfie view).
    pub mirror_x: bool,
    /// Detections below this confidence count as "no hand".
    pub min_confidence: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            width: 960,
            height: 540,
            fps: 30.0,
            pixel_landmarks: false,
            mirror_x: false,
            min_confidence: 0.5,
        }
    }
}

impl CameraConfig {
    fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(invalid(format!(
                "camera dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if !(self.fps > 0.0 && self.fps.is_finite()) {
            return Err(invalid(format!("camera.fps must be positive, got {}", self.fps)));
        }
        check_unit("camera.min_confidence", self.min_confidence as f64)
    }
}

/// Target screen settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

impl ScreenConfig {
    fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(invalid(format!(
                "screen dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

const MAX_DRAG_WINDOW: usize = 64;

/// Cursor smoothing and edge boost.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Base exponential smoothing factor, in `(0, 1]`.
    pub alpha: f64,
    /// Smoothing factor reached at the very edge of the screen.
    pub edge_alpha: f64,
    /// Distance from an edge (normalized) at which the boost begins.
    pub edge_margin: f64,
    /// Exponent shaping the boost ramp. 1.0 is linear.
    pub edge_curve: f64,
    /// Positions averaged while dragging. 1 disables the extra averaging.
    pub drag_window: usize,
    /// Camera sub-region mapped onto the full screen.
    #[serde(default)]
    pub region: RegionConfig,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            alpha: 0.35,
            edge_alpha: 0.85,
            edge_margin: 0.12,
            edge_curve: 1.5,
            drag_window: 1,
            region: RegionConfig::default(),
        }
    }
}

impl SmoothingConfig {
    fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(invalid(format!(
                "smoothing.alpha must be within (0, 1], got {}",
                self.alpha
            )));
        }
        if !(self.edge_alpha >= self.alpha && self.edge_alpha <= 1.0) {
            return Err(invalid(format!(
                "smoothing.edge_alpha must be within [alpha, 1], got {}",
                self.edge_alpha
            )));
        }
        if !(self.edge_margin >= 0.0 && self.edge_margin <= 0.5) {
            return Err(invalid(format!(
                "smoothing.edge_margin must be within [0, 0.5], got {}",
                self.edge_margin
            )));
        }
        if !(self.edge_curve > 0.0 && self.edge_curve.is_finite()) {
            return Err(invalid(format!(
                "smoothing.edge_curve must be positive, got {}",
                self.edge_curve
            )));
        }
        if !(1..=MAX_DRAG_WINDOW).contains(&self.drag_window) {
            return Err(invalid(format!(
                "smoothing.drag_window must be within [1, {}], got {}",
                MAX_DRAG_WINDOW, self.drag_window
            )));
        }
        self.region.validate()
    }
}

/// Active region of the camera frame that maps onto the screen.
///
/// Hands rarely reach the extreme borders of the camera image, so the region
/// starts inset from each side. With a non-zero `grow_rate` it expands toward
/// points seen outside it; with a non-zero `decay_rate` it drifts back inward.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    /// Initial inset from each camera edge, in normalized units.
    pub inset: f64,
    /// Fraction of the overshoot the region grows by per frame.
    pub grow_rate: f64,
    /// Amount the region shrinks per frame on each side.
    pub decay_rate: f64,
    /// Smallest allowed width/height of the region.
    pub min_span: f64,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            inset: 0.1,
            grow_rate: 0.0,
            decay_rate: 0.0,
            min_span: 0.5,
        }
    }
}

impl RegionConfig {
    fn validate(&self) -> Result<()> {
        if !(0.0..0.5).contains(&self.inset) {
            return Err(invalid(format!(
                "smoothing.region.inset must be within [0, 0.5), got {}",
                self.inset
            )));
        }
        check_unit("smoothing.region.grow_rate", self.grow_rate)?;
        if !(0.0..=0.05).contains(&self.decay_rate) {
            return Err(invalid(format!(
                "smoothing.region.decay_rate must be within [0, 0.05], got {}",
                self.decay_rate
            )));
        }
        if !(self.min_span > 0.0 && self.min_span <= 1.0 - 2.0 * self.inset) {
            return Err(invalid(format!(
                "smoothing.region.min_span must be within (0, {}], got {}",
                1.0 - 2.0 * self.inset,
                self.min_span
            )));
        }
        Ok(())
    }
}

/// Landmark used as the cursor control point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlPoint {
    #[default]
    IndexTip,
    IndexKnuckle,
    /// Stays put while pinching, which keeps clicks from jittering the cursor.
    MiddleKnuckle,
}

impl ControlPoint {
    pub fn landmark_index(&self) -> usize {
        match self {
            ControlPoint::IndexTip => landmarks::INDEX_TIP,
            ControlPoint::IndexKnuckle => landmarks::INDEX_MCP,
            ControlPoint::MiddleKnuckle => landmarks::MIDDLE_MCP,
        }
    }
}

/// Gesture classification thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Fingertip-to-thumb distance (normalized) below which a pinch closes.
    pub pinch_close: f64,
    /// Distance above which a closed pinch opens again.
    pub pinch_release: f64,
    /// Tip must be this many times farther from the wrist than the PIP joint.
    pub extension_ratio: f64,
    /// Consecutive frames a new candidate must persist before it is committed.
    pub min_dwell_frames: u32,
    /// Consecutive pinch frames after which a pinch becomes a drag.
    pub drag_hold_frames: u32,
    pub control_point: ControlPoint,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            pinch_close: 0.05,
            pinch_release: 0.07,
            extension_ratio: 1.15,
            min_dwell_frames: 3,
            drag_hold_frames: 9,
            control_point: ControlPoint::IndexTip,
        }
    }
}

impl GestureConfig {
    fn validate(&self) -> Result<()> {
        if !(self.pinch_close > 0.0 && self.pinch_close < 1.0) {
            return Err(invalid(format!(
                "gestures.pinch_close must be within (0, 1), got {}",
                self.pinch_close
            )));
        }
        if !(self.pinch_release >= self.pinch_close && self.pinch_release < 1.0) {
            return Err(invalid(format!(
                "gestures.pinch_release ({}) must not be below pinch_close ({})",
                self.pinch_release, self.pinch_close
            )));
        }
        if !(self.extension_ratio >= 1.0 && self.extension_ratio.is_finite()) {
            return Err(invalid(format!(
                "gestures.extension_ratio must be at least 1.0, got {}",
                self.extension_ratio
            )));
        }
        if self.min_dwell_frames == 0 {
            return Err(invalid("gestures.min_dwell_frames must be at least 1"));
        }
        if self.drag_hold_frames <= self.min_dwell_frames {
            return Err(invalid(format!(
                "gestures.drag_hold_frames ({}) must exceed min_dwell_frames ({})",
                self.drag_hold_frames, self.min_dwell_frames
            )));
        }
        Ok(())
    }
}

/// Intent dispatch tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Wheel lines per full frame height of vertical hand travel while scrolling.
    pub scroll_gain: f64,
    /// Lines per steady scroll pulse. 0 disables pulses.
    pub scroll_step: i32,
    /// Frames between steady scroll pulses.
    pub scroll_interval_frames: u32,
    /// Frames after an Enter press during which re-entering the gesture is ignored.
    pub enter_cooldown_frames: u32,
    /// Frames after a dictation start during which the gesture does not start
    /// another session.
    pub dictation_cooldown_frames: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            scroll_gain: 40.0,
            scroll_step: 1,
            scroll_interval_frames: 4,
            enter_cooldown_frames: 0,
            dictation_cooldown_frames: 0,
        }
    }
}

impl DispatchConfig {
    fn validate(&self) -> Result<()> {
        if !(self.scroll_gain >= 0.0 && self.scroll_gain.is_finite()) {
            return Err(invalid(format!(
                "dispatch.scroll_gain must be non-negative, got {}",
                self.scroll_gain
            )));
        }
        if self.scroll_step < 0 {
            return Err(invalid(format!(
                "dispatch.scroll_step must be non-negative, got {}",
                self.scroll_step
            )));
        }
        if self.scroll_interval_frames == 0 {
            return Err(invalid("dispatch.scroll_interval_frames must be at least 1"));
        }
        Ok(())
    }
}

/// Dictation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DictationConfig {
    /// Whether the dictation gesture starts a session.
    pub enabled: bool,
    /// A session stops on its own after this many seconds.
    pub max_duration_secs: u32,
    /// Sample rate handed to the transcription function.
    pub sample_rate: u32,
}

impl Default for DictationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_duration_secs: 30,
            sample_rate: 16_000,
        }
    }
}

impl DictationConfig {
    fn validate(&self) -> Result<()> {
        if self.max_duration_secs == 0 {
            return Err(invalid("dictation.max_duration_secs must be at least 1"));
        }
        if self.sample_rate == 0 {
            return Err(invalid("dictation.sample_rate must be positive"));
        }
        Ok(())
    }
}
