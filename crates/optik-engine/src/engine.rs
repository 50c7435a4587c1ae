//! The per-frame gesture pipeline.
//!
//! `GestureEngine` owns one normalizer, classifier, smoother and dispatcher
//! and runs them strictly in that order for every frame. It performs no I/O:
//! the intents it produces are applied by the [`crate::controller`].

use optik_core::config::OptikConfig;
use optik_core::error::Result;
use optik_core::types::{primary_hand, CursorPosition, GestureState, Intent, LandmarkFrame};

use crate::classifier::GestureClassifier;
use crate::dispatcher::{ActionDispatcher, DispatcherState};
use crate::normalizer::{FeatureVector, LandmarkNormalizer};
use crate::smoother::{CursorState, DragAverager, MotionSmoother};

/// Result of one processed frame. Borrows the engine's reusable intent buffer.
#[derive(Debug, Clone, Copy)]
pub struct EngineOutput<'a> {
    /// Engine frame number, starting at 1.
    pub frame: u64,
    pub previous: GestureState,
    pub state: GestureState,
    pub cursor: CursorPosition,
    pub hand_present: bool,
    pub features: Option<FeatureVector>,
    pub intents: &'a [Intent],
}

impl EngineOutput<'_> {
    pub fn transition(&self) -> Option<(GestureState, GestureState)> {
        (self.previous != self.state).then_some((self.previous, self.state))
    }
}

#[derive(Debug)]
pub struct GestureEngine {
    normalizer: LandmarkNormalizer,
    classifier: GestureClassifier,
    smoother: MotionSmoother,
    drag_average: DragAverager,
    dispatcher: ActionDispatcher,
    intents: Vec<Intent>,
    frames: u64,
}

impl GestureEngine {
    /// Build an engine. Fails with `OptikError::Config` on invalid settings.
    pub fn new(config: &OptikConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            normalizer: LandmarkNormalizer::from_config(config),
            classifier: GestureClassifier::new(&config.gestures),
            smoother: MotionSmoother::from_config(config),
            drag_average: DragAverager::new(config.smoothing.drag_window),
            dispatcher: ActionDispatcher::new(&config.dispatch),
            intents: Vec::with_capacity(8),
            frames: 0,
        })
    }

    /// Process one frame of the primary hand (`None` when no hand was seen).
    pub fn process(&mut self, frame: Option<&LandmarkFrame>) -> EngineOutput<'_> {
        self.frames += 1;
        self.intents.clear();

        let features = self.normalizer.features(frame);
        let previous = self.classifier.state();
        let state = self.classifier.update(features.as_ref());
        let mut cursor = self.smoother.update(features.map(|f| f.control_point));
        if state == GestureState::Drag {
            cursor = self.drag_average.push(cursor);
        } else {
            self.drag_average.clear();
        }
        self.dispatcher.dispatch(
            previous,
            state,
            cursor,
            self.classifier.control_point(),
            &mut self.intents,
        );

        tracing::trace!(
            frame = self.frames,
            state = %state,
            x = cursor.x,
            y = cursor.y,
            intents = self.intents.len(),
            "Frame processed"
        );

        EngineOutput {
            frame: self.frames,
            previous,
            state,
            cursor,
            hand_present: features.is_some(),
            features,
            intents: &self.intents,
        }
    }

    /// Process everything the detector reported; only the first hand counts.
    pub fn process_detection(&mut self, hands: &[LandmarkFrame]) -> EngineOutput<'_> {
        let primary = primary_hand(hands);
        self.process(primary.as_ref())
    }

    /// Force Idle and return the intents that release held resources.
    pub fn cancel(&mut self) -> &[Intent] {
        self.intents.clear();
        if self.classifier.state() != GestureState::Idle {
            tracing::debug!(from = %self.classifier.state(), "Gesture engine cancelled");
        }
        self.classifier.reset();
        self.drag_average.clear();
        self.dispatcher.cancel(&mut self.intents);
        &self.intents
    }

    pub fn state(&self) -> GestureState {
        self.classifier.state()
    }

    pub fn cursor(&self) -> CursorPosition {
        self.smoother.position()
    }

    pub fn cursor_state(&self) -> &CursorState {
        self.smoother.state()
    }

    pub fn dispatcher_state(&self) -> &DispatcherState {
        self.dispatcher.state()
    }

    /// Frames processed so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}
