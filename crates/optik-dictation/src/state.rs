//! Dictation session lifecycle, driven by events.
//!
//! ```text
//! Idle --Start--> Listening --Stop--> Processing --Transcribed--> Typing --Delivered--> Idle
//!                     |                   |
//!                     +------Cancel-------+--Cancel / Empty--> Idle
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use optik_core::error::{OptikError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DictationState {
    #[default]
    Idle,
    /// Collecting audio.
    Listening,
    /// Transcribing the captured audio.
    Processing,
    /// Typing the transcript into the focused window.
    Typing,
}

/// Something that happened to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEvent {
    Start,
    Stop,
    /// Transcription produced text.
    Transcribed,
    /// Transcription produced nothing worth typing.
    Empty,
    Delivered,
    Cancel,
}

impl fmt::Display for DictationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DictationState::Idle => "idle",
            DictationState::Listening => "listening",
            DictationState::Processing => "processing",
            DictationState::Typing => "typing",
        };
        f.write_str(name)
    }
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl DictationState {
    /// State reached from `self` on `event`, or `None` if the event is not
    /// accepted here.
    pub fn on(self, event: SessionEvent) -> Option<DictationState> {
        use DictationState::*;
        use SessionEvent::*;

        match (self, event) {
            (Idle, Start) => Some(Listening),
            (Listening, Stop) => Some(Processing),
            (Processing, Transcribed) => Some(Typing),
            (Processing, Empty) | (Typing, Delivered) => Some(Idle),
            (Listening | Processing, Cancel) => Some(Idle),
            _ => None,
        }
    }

    /// Whether a session exists in this state.
    pub fn is_busy(self) -> bool {
        self != DictationState::Idle
    }
}

/// Shared lifecycle cell. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct StateMachine {
    state: Arc<Mutex<DictationState>>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    // A poisoned lock still holds a valid value.
    fn lock(&self) -> MutexGuard<'_, DictationState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn current(&self) -> DictationState {
        *self.lock()
    }

    /// Apply `event` and return the new state.
    ///
    /// Rejected events leave the state untouched and fail with
    /// `OptikError::Dictation`.
    pub fn apply(&self, event: SessionEvent) -> Result<DictationState> {
        let mut state = self.lock();
        let from = *state;
        let Some(to) = from.on(event) else {
            return Err(OptikError::Dictation(format!(
                "{} not accepted while {}",
                event, from
            )));
        };
        tracing::debug!(from = %from, to = %to, event = %event, "Dictation state change");
        *state = to;
        Ok(to)
    }

    /// Force Idle after a failure mid-session.
    pub fn reset(&self) {
        let mut state = self.lock();
        if state.is_busy() {
            tracing::warn!(from = %*state, "Dictation state forced back to idle");
        }
        *state = DictationState::Idle;
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use DictationState::*;
    use SessionEvent::*;

    #[test]
    fn test_happy_path() {
        let sm = StateMachine::new();
        assert_eq!(sm.current(), Idle);
        assert_eq!(sm.apply(Start).unwrap(), Listening);
        assert_eq!(sm.apply(Stop).unwrap(), Processing);
        assert_eq!(sm.apply(Transcribed).unwrap(), Typing);
        assert!(sm.current().is_busy());
        assert_eq!(sm.apply(Delivered).unwrap(), Idle);
    }

    #[test]
    fn test_empty_transcript_skips_typing() {
        assert_eq!(Processing.on(Empty), Some(Idle));
        assert_eq!(Listening.on(Empty), None);
    }

    #[test]
    fn test_cancel_only_before_typing() {
        assert_eq!(Listening.on(Cancel), Some(Idle));
        assert_eq!(Processing.on(Cancel), Some(Idle));
        assert_eq!(Typing.on(Cancel), None);
        assert_eq!(Idle.on(Cancel), None);
    }

    #[test]
    fn test_rejected_event_keeps_state() {
        let sm = StateMachine::new();
        sm.apply(Start).unwrap();
        let err = sm.apply(Start).unwrap_err();
        match err {
            OptikError::Dictation(msg) => assert_eq!(msg, "Start not accepted while listening"),
            other => panic!("Expected Dictation error, got {:?}", other),
        }
        assert_eq!(sm.current(), Listening);
    }

    #[test]
    fn test_reset() {
        let sm = StateMachine::new();
        sm.apply(Start).unwrap();
        sm.apply(Stop).unwrap();
        sm.reset();
        assert_eq!(sm.current(), Idle);
        assert_eq!(sm.apply(Start).unwrap(), Listening);
    }

    #[test]
    fn test_clones_share_state() {
        let a = StateMachine::new();
        let b = a.clone();
        a.apply(Start).unwrap();
        assert_eq!(b.current(), Listening);
    }

    #[test]
    fn test_display() {
        assert_eq!(Processing.to_string(), "processing");
        assert_eq!(Transcribed.to_string(), "Transcribed");
    }
}
