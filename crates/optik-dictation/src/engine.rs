//! Dictation engine managing the session lifecycle.
//!
//! A `DictationEngine` drives one session at a time through the
//! [`StateMachine`], buffering audio while listening and handing the buffer to
//! an optional transcription function when the session stops.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use optik_core::error::{OptikError, Result};

use crate::state::{DictationState, SessionEvent, StateMachine};

/// Data for the active session.
#[derive(Debug, Clone)]
pub struct DictationSession {
    pub id: Uuid,
    pub start_time: DateTime<Utc>,
    /// Raw PCM samples captured so far.
    pub audio_buffer: Vec<f32>,
}

impl DictationSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            start_time: Utc::now(),
            audio_buffer: Vec::new(),
        }
    }

    /// Elapsed time since the session started, in seconds.
    pub fn elapsed_secs(&self) -> f32 {
        let elapsed = Utc::now() - self.start_time;
        elapsed.num_milliseconds() as f32 / 1000.0
    }

    pub fn push_audio(&mut self, samples: &[f32]) {
        self.audio_buffer.extend_from_slice(samples);
    }
}

impl Default for DictationSession {
    fn default() -> Self {
        Self::new()
    }
}

/// A function that transcribes audio samples to text.
///
/// Takes `(samples, sample_rate)` and returns the transcribed string or an error.
pub type TranscriptionFn = Box<dyn Fn(&[f32], u32) -> Result<String> + Send + Sync>;

/// Session lifecycle owner. Shareable across threads behind an `Arc`.
pub struct DictationEngine {
    state_machine: StateMachine,
    session: Mutex<Option<DictationSession>>,
    sample_rate: u32,
    transcription_fn: Option<TranscriptionFn>,
}

impl std::fmt::Debug for DictationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DictationEngine")
            .field("state_machine", &self.state_machine)
            .field("sample_rate", &self.sample_rate)
            .field("has_transcription_fn", &self.transcription_fn.is_some())
            .finish()
    }
}

impl DictationEngine {
    /// Engine without a transcription service: sessions produce no text.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            state_machine: StateMachine::new(),
            session: Mutex::new(None),
            sample_rate,
            transcription_fn: None,
        }
    }

    /// Engine that runs `transcription_fn` over the captured audio on stop.
    pub fn with_transcription(sample_rate: u32, transcription_fn: TranscriptionFn) -> Self {
        Self {
            transcription_fn: Some(transcription_fn),
            ..Self::new(sample_rate)
        }
    }

    pub fn current_state(&self) -> DictationState {
        self.state_machine.current()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn lock_session(&self) -> Result<MutexGuard<'_, Option<DictationSession>>> {
        self.session
            .lock()
            .map_err(|e| OptikError::Dictation(format!("Session mutex poisoned: {}", e)))
    }

    /// Start a new session. Fails unless the engine is Idle.
    pub fn start_dictation(&self) -> Result<Uuid> {
        self.state_machine.apply(SessionEvent::Start)?;

        let session = DictationSession::new();
        let id = session.id;
        tracing::info!(session_id = %id, "Dictation session started");

        *self.lock_session()? = Some(session);
        Ok(id)
    }

    /// Stop the session, transcribe its audio and hand any text to `deliver`.
    ///
    /// Moves through Processing and Typing back to Idle. The engine is Idle
    /// on return even when transcription or delivery fails. Returns the
    /// delivered text, or `None` when there was nothing to type.
    pub fn stop_dictation<F>(&self, deliver: F) -> Result<Option<String>>
    where
        F: FnOnce(&str) -> Result<()>,
    {
        self.state_machine.apply(SessionEvent::Stop)?;

        let session = self.lock_session()?.take();
        let text = match session {
            Some(session) => self.transcribe(&session),
            None => None,
        };

        let Some(text) = text else {
            self.state_machine.apply(SessionEvent::Empty)?;
            return Ok(None);
        };

        self.state_machine.apply(SessionEvent::Transcribed)?;
        let delivered = deliver(&text);
        self.state_machine.apply(SessionEvent::Delivered)?;
        delivered?;

        Ok(Some(text))
    }

    fn transcribe(&self, session: &DictationSession) -> Option<String> {
        tracing::info!(
            session_id = %session.id,
            elapsed_secs = session.elapsed_secs(),
            audio_samples = session.audio_buffer.len(),
            "Processing dictation audio"
        );

        if session.audio_buffer.is_empty() {
            return None;
        }
        let Some(ref transcribe) = self.transcription_fn else {
            tracing::debug!("No transcription service configured, discarding audio");
            return None;
        };

        match transcribe(&session.audio_buffer, self.sample_rate) {
            Ok(text) if !text.trim().is_empty() => {
                tracing::info!(text_len = text.len(), "Dictation transcribed");
                Some(text)
            }
            Ok(_) => {
                tracing::debug!("Transcription returned empty text");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Transcription failed");
                None
            }
        }
    }

    /// Discard the session. Valid from Listening or Processing.
    pub fn cancel_dictation(&self) -> Result<()> {
        self.state_machine.apply(SessionEvent::Cancel)?;

        if let Some(session) = self.lock_session()?.take() {
            tracing::info!(session_id = %session.id, "Dictation session cancelled");
        }
        Ok(())
    }

    /// Append audio to the session buffer. Only valid while Listening.
    pub fn push_audio(&self, samples: &[f32]) -> Result<()> {
        if self.state_machine.current() != DictationState::Listening {
            return Err(OptikError::Dictation(
                "Cannot push audio: not in Listening state".to_string(),
            ));
        }

        match self.lock_session()?.as_mut() {
            Some(session) => {
                session.push_audio(samples);
                Ok(())
            }
            None => Err(OptikError::Dictation(
                "No active session to push audio to".to_string(),
            )),
        }
    }

    pub fn current_session(&self) -> Result<Option<DictationSession>> {
        Ok(self.lock_session()?.clone())
    }

    /// Force Idle and drop any session.
    pub fn reset(&self) {
        self.state_machine.reset();
        if let Ok(mut guard) = self.lock_session() {
            *guard = None;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
