//! Optik Input crate - OS-level pointer and keyboard injection.
//!
//! The engine talks to the operating system through the [`InputSink`] trait.
//! [`NativeInput`] injects real events via Windows `SendInput`; [`LogInput`]
//! only logs (dry run); [`RecordingInput`] records calls for tests and can be
//! scripted to fail.

pub mod native;
pub mod text_inject;

use optik_core::error::{OptikError, Result};
use optik_core::types::{Intent, Key};

pub use native::NativeInput;
pub use text_inject::{plan_strokes, Stroke, TextInjector};

/// Receiver of pointer and keyboard events.
///
/// Calls are applied immediately and in order. Any failure (for example a
/// missing accessibility permission) is returned as `OptikError::Input`.
pub trait InputSink: Send {
    /// Move the pointer to an absolute screen position.
    fn move_to(&mut self, x: i32, y: i32) -> Result<()>;

    /// Press the primary mouse button.
    fn mouse_down(&mut self) -> Result<()>;

    /// Release the primary mouse button.
    fn mouse_up(&mut self) -> Result<()>;

    /// Scroll by whole wheel lines. Positive scrolls up.
    fn scroll_by(&mut self, dy: i32) -> Result<()>;

    /// Press and release a key.
    fn key_press(&mut self, key: Key) -> Result<()>;

    /// Type a run of text into the focused application.
    fn type_text(&mut self, text: &str) -> Result<()>;
}

/// Route a pointer/keyboard intent to the sink.
///
/// Dictation intents belong to the dictation collaborator and are rejected.
pub fn apply_intent<S: InputSink + ?Sized>(sink: &mut S, intent: &Intent) -> Result<()> {
    match *intent {
        Intent::MoveTo { x, y } => sink.move_to(x, y),
        Intent::MouseDown => sink.mouse_down(),
        Intent::MouseUp => sink.mouse_up(),
        Intent::ScrollBy { dy } => sink.scroll_by(dy),
        Intent::KeyPress { key } => sink.key_press(key),
        Intent::DictationStart | Intent::DictationStop => Err(OptikError::Input(format!(
            "{:?} is not an input event",
            intent
        ))),
    }
}

// =============================================================================
// Dry run
// =============================================================================

/// Sink that logs every event and never touches the OS.
#[derive(Debug, Default)]
pub struct LogInput;

impl InputSink for LogInput {
    fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
        tracing::trace!(x, y, "move_to");
        Ok(())
    }

    fn mouse_down(&mut self) -> Result<()> {
        tracing::info!("mouse_down");
        Ok(())
    }

    fn mouse_up(&mut self) -> Result<()> {
        tracing::info!("mouse_up");
        Ok(())
    }

    fn scroll_by(&mut self, dy: i32) -> Result<()> {
        tracing::debug!(dy, "scroll_by");
        Ok(())
    }

    fn key_press(&mut self, key: Key) -> Result<()> {
        tracing::info!(key = %key, "key_press");
        Ok(())
    }

    fn type_text(&mut self, text: &str) -> Result<()> {
        tracing::info!(text_len = text.len(), "type_text");
        Ok(())
    }
}

// =============================================================================
// Recording sink
// =============================================================================

/// Sink that records every successful call.
///
/// Failures can be scripted with [`RecordingInput::fail_times`] or
/// [`RecordingInput::fail_always`]; failed calls are not recorded.
#[derive(Debug, Default)]
pub struct RecordingInput {
    events: Vec<Intent>,
    typed: Vec<String>,
    failure: Option<String>,
    /// `None` with a failure set means fail forever.
    failures_left: Option<u32>,
    attempts: u32,
}

impl RecordingInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `times` calls with the given message.
    pub fn fail_times(&mut self, times: u32, message: &str) {
        self.failure = Some(message.to_string());
        self.failures_left = Some(times);
    }

    /// Fail every call until [`RecordingInput::recover`].
    pub fn fail_always(&mut self, message: &str) {
        self.failure = Some(message.to_string());
        self.failures_left = None;
    }

    pub fn recover(&mut self) {
        self.failure = None;
        self.failures_left = None;
    }

    /// Successfully applied events, in call order.
    pub fn events(&self) -> &[Intent] {
        &self.events
    }

    pub fn typed(&self) -> &[String] {
        &self.typed
    }

    /// Number of calls made, including failed ones.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn count(&self, wanted: &Intent) -> usize {
        self.events.iter().filter(|e| *e == wanted).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.typed.clear();
    }

    fn check(&mut self) -> Result<()> {
        self.attempts += 1;
        let Some(message) = self.failure.clone() else {
            return Ok(());
        };
        match self.failures_left {
            None => Err(OptikError::Input(message)),
            Some(0) => {
                self.failure = None;
                self.failures_left = None;
                Ok(())
            }
            Some(n) => {
                self.failures_left = Some(n - 1);
                if n == 1 {
                    self.failure = None;
                    self.failures_left = None;
                }
                Err(OptikError::Input(message))
            }
        }
    }

    fn record(&mut self, intent: Intent) -> Result<()> {
        self.check()?;
        self.events.push(intent);
        Ok(())
    }
}

impl InputSink for RecordingInput {
    fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
        self.record(Intent::MoveTo { x, y })
    }

    fn mouse_down(&mut self) -> Result<()> {
        self.record(Intent::MouseDown)
    }

    fn mouse_up(&mut self) -> Result<()> {
        self.record(Intent::MouseUp)
    }

    fn scroll_by(&mut self, dy: i32) -> Result<()> {
        self.record(Intent::ScrollBy { dy })
    }

    fn key_press(&mut self, key: Key) -> Result<()> {
        self.record(Intent::KeyPress { key })
    }

    fn type_text(&mut self, text: &str) -> Result<()> {
        self.check()?;
        self.typed.push(text.to_string());
        Ok(())
    }
}
