//! Optik Dictation crate - voice dictation sessions triggered by gesture.
//!
//! The gesture engine only needs [`DictationControl`]: start, stop and an
//! activity query. [`DictationService`] implements it with a session state
//! machine (Idle -> Listening -> Processing -> Typing -> Idle), one worker
//! thread per session and text injection of the transcript.

pub mod engine;
pub mod service;
pub mod state;

use optik_core::error::{OptikError, Result};

pub use engine::{DictationEngine, DictationSession, TranscriptionFn};
pub use service::{DictationService, TextSinkFn};
pub use state::{DictationState, SessionEvent, StateMachine};

/// Start/stop handle for voice dictation. Both calls are idempotent.
pub trait DictationControl: Send {
    fn start(&mut self) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
    fn is_active(&self) -> bool;
}

/// In-memory dictation control for tests.
#[derive(Debug, Default)]
pub struct MockDictation {
    active: bool,
    starts: u32,
    stops: u32,
    failure: Option<String>,
    failures_left: Option<u32>,
}

impl MockDictation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of calls that actually started a session.
    pub fn starts(&self) -> u32 {
        self.starts
    }

    /// Number of calls that actually stopped a session.
    pub fn stops(&self) -> u32 {
        self.stops
    }

    pub fn fail_times(&mut self, times: u32, message: &str) {
        self.failure = Some(message.to_string());
        self.failures_left = Some(times);
    }

    pub fn fail_always(&mut self, message: &str) {
        self.failure = Some(message.to_string());
        self.failures_left = None;
    }

    pub fn recover(&mut self) {
        self.failure = None;
        self.failures_left = None;
    }

    fn check(&mut self) -> Result<()> {
        let Some(message) = self.failure.clone() else {
            return Ok(());
        };
        if let Some(left) = self.failures_left {
            if left <= 1 {
                self.recover();
            } else {
                self.failures_left = Some(left - 1);
            }
            if left == 0 {
                return Ok(());
            }
        }
        Err(OptikError::Dictation(message))
    }
}

impl DictationControl for MockDictation {
    fn start(&mut self) -> Result<()> {
        self.check()?;
        if !self.active {
            self.active = true;
            self.starts += 1;
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.check()?;
        if self.active {
            self.active = false;
            self.stops += 1;
        }
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
