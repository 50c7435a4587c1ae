//! Applies engine intents to the OS collaborators.
//!
//! The controller owns the [`GestureEngine`], an [`InputSink`] and a
//! [`DictationControl`]. Collaborator failures never stop the pipeline: they
//! are surfaced once through [`CollaboratorHealth`] and the frame loop goes
//! on. Releases are special. A failed `MouseUp` or `DictationStop` is retried
//! on every following frame until it succeeds, and new presses are held back
//! while a release is outstanding.

use serde::Serialize;

use optik_core::config::OptikConfig;
use optik_core::error::Result;
use optik_core::types::{CursorPosition, GestureState, Intent, LandmarkFrame};
use optik_dictation::DictationControl;
use optik_input::{apply_intent, InputSink};

use crate::engine::GestureEngine;
use crate::health::{Alert, Collaborator, CollaboratorHealth};

/// What happened on one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReport {
    pub frame: u64,
    pub state: GestureState,
    pub transition: Option<(GestureState, GestureState)>,
    pub cursor: CursorPosition,
    pub hand_present: bool,
    pub intents: Vec<Intent>,
}

pub struct Controller<I: InputSink, D: DictationControl> {
    engine: GestureEngine,
    input: I,
    dictation: D,
    input_health: CollaboratorHealth,
    dictation_health: CollaboratorHealth,
    alerts: Vec<Alert>,
    release_pending: bool,
    dictation_stop_pending: bool,
}

impl<I: InputSink, D: DictationControl> Controller<I, D> {
    pub fn new(config: &OptikConfig, input: I, dictation: D) -> Result<Self> {
        Ok(Self {
            engine: GestureEngine::new(config)?,
            input,
            dictation,
            input_health: CollaboratorHealth::new(Collaborator::Input),
            dictation_health: CollaboratorHealth::new(Collaborator::Dictation),
            alerts: Vec::new(),
            release_pending: false,
            dictation_stop_pending: false,
        })
    }

    /// Run one frame and apply its intents.
    pub fn process(&mut self, detection: &[LandmarkFrame]) -> FrameReport {
        self.retry_releases();

        let out = self.engine.process_detection(detection);
        let report = FrameReport {
            frame: out.frame,
            state: out.state,
            transition: out.transition(),
            cursor: out.cursor,
            hand_present: out.hand_present,
            intents: out.intents.to_vec(),
        };

        if let Some((from, to)) = report.transition {
            tracing::debug!(from = %from, to = %to, frame = report.frame, "Gesture changed");
        }
        for intent in &report.intents {
            self.apply(intent);
        }
        report
    }

    /// Cancel everything: force Idle, release the mouse button and stop dictation.
    pub fn stop(&mut self) -> Vec<Intent> {
        let intents = self.engine.cancel().to_vec();
        for intent in &intents {
            self.apply(intent);
        }
        self.retry_releases();
        tracing::info!(
            frames = self.engine.frames(),
            released = intents.len(),
            release_pending = self.release_pending,
            "Controller stopped"
        );
        intents
    }

    /// Drain the alerts surfaced since the last call.
    pub fn take_alerts(&mut self) -> Vec<Alert> {
        std::mem::take(&mut self.alerts)
    }

    /// Whether a mouse-button or dictation release is still outstanding.
    pub fn release_pending(&self) -> bool {
        self.release_pending || self.dictation_stop_pending
    }

    pub fn engine(&self) -> &GestureEngine {
        &self.engine
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    pub fn dictation(&self) -> &D {
        &self.dictation
    }

    pub fn dictation_mut(&mut self) -> &mut D {
        &mut self.dictation
    }

    fn apply(&mut self, intent: &Intent) {
        match intent {
            Intent::MouseDown if self.release_pending => {
                tracing::debug!("Holding back mouse down while a release is pending");
            }
            Intent::DictationStart if self.dictation_stop_pending => {
                tracing::debug!("Holding back dictation start while a stop is pending");
            }
            Intent::DictationStart => {
                let result = self.dictation.start();
                self.record(Collaborator::Dictation, result);
            }
            Intent::DictationStop => {
                let result = self.dictation.stop();
                self.dictation_stop_pending = result.is_err();
                self.record(Collaborator::Dictation, result);
            }
            _ => {
                let result = apply_intent(&mut self.input, intent);
                if *intent == Intent::MouseUp {
                    self.release_pending = result.is_err();
                }
                self.record(Collaborator::Input, result);
            }
        }
    }

    fn retry_releases(&mut self) {
        if self.release_pending {
            tracing::debug!("Retrying mouse up");
            let result = self.input.mouse_up();
            self.release_pending = result.is_err();
            self.record(Collaborator::Input, result);
        }
        if self.dictation_stop_pending {
            tracing::debug!("Retrying dictation stop");
            let result = self.dictation.stop();
            self.dictation_stop_pending = result.is_err();
            self.record(Collaborator::Dictation, result);
        }
    }

    fn record(&mut self, collaborator: Collaborator, result: Result<()>) {
        let frame = self.engine.frames();
        let health = match collaborator {
            Collaborator::Input => &mut self.input_health,
            Collaborator::Dictation => &mut self.dictation_health,
        };
        match result {
            Ok(()) => health.record_success(),
            Err(e) => {
                if let Some(alert) = health.record_failure(&e, frame) {
                    self.alerts.push(alert);
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
