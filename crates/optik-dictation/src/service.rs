//! Background dictation service.
//!
//! Each session gets one worker thread. The worker waits for a stop signal
//! (or the maximum session length), then stops the engine and types the
//! transcribed text through the configured text sink.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use std::time::Duration;

use optik_core::config::DictationConfig;
use optik_core::error::{OptikError, Result};
use optik_input::TextInjector;

use crate::engine::{DictationEngine, TranscriptionFn};
use crate::DictationControl;

/// Receives the transcribed text of a finished session.
pub type TextSinkFn = Box<dyn Fn(&str) -> Result<()> + Send + Sync>;

struct Worker {
    stop_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

pub struct DictationService {
    engine: Arc<DictationEngine>,
    text_sink: Arc<TextSinkFn>,
    max_duration: Duration,
    enabled: bool,
    active: Arc<AtomicBool>,
    worker: Option<Worker>,
    sessions_started: u64,
}

impl std::fmt::Debug for DictationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DictationService")
            .field("engine", &self.engine)
            .field("max_duration", &self.max_duration)
            .field("enabled", &self.enabled)
            .field("active", &self.is_active())
            .field("sessions_started", &self.sessions_started)
            .finish()
    }
}

impl DictationService {
    /// Service that types into the focused window via [`TextInjector`].
    pub fn new(config: &DictationConfig, transcription_fn: Option<TranscriptionFn>) -> Self {
        let injector = TextInjector::new();
        Self::with_text_sink(
            config,
            transcription_fn,
            Box::new(move |text: &str| injector.inject(text)),
        )
    }

    pub fn with_text_sink(
        config: &DictationConfig,
        transcription_fn: Option<TranscriptionFn>,
        text_sink: TextSinkFn,
    ) -> Self {
        let engine = match transcription_fn {
            Some(f) => DictationEngine::with_transcription(config.sample_rate, f),
            None => DictationEngine::new(config.sample_rate),
        };
        Self {
            engine: Arc::new(engine),
            text_sink: Arc::new(text_sink),
            max_duration: Duration::from_secs(u64::from(config.max_duration_secs)),
            enabled: config.enabled,
            active: Arc::new(AtomicBool::new(false)),
            worker: None,
            sessions_started: 0,
        }
    }

    /// Override the automatic stop timeout.
    pub fn with_max_duration(mut self, max_duration: Duration) -> Self {
        self.max_duration = max_duration;
        self
    }

    pub fn engine(&self) -> &Arc<DictationEngine> {
        &self.engine
    }

    /// Feed microphone samples into the running session.
    pub fn push_audio(&self, samples: &[f32]) -> Result<()> {
        self.engine.push_audio(samples)
    }

    pub fn sessions_started(&self) -> u64 {
        self.sessions_started
    }

    /// Wait for the current worker, if any, to finish typing.
    ///
    /// Blocks until the session is stopped or times out.
    pub fn join(&mut self) {
        if let Some(Worker { stop_tx, handle }) = self.worker.take() {
            if handle.join().is_err() {
                tracing::error!("Dictation worker panicked");
                self.engine.reset();
            }
            drop(stop_tx);
        }
    }

    fn spawn_worker(&self) -> Result<Worker> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let engine = Arc::clone(&self.engine);
        let sink = Arc::clone(&self.text_sink);
        let active = Arc::clone(&self.active);
        let max_duration = self.max_duration;

        let handle = std::thread::Builder::new()
            .name("optik-dictation".into())
            .spawn(move || {
                match stop_rx.recv_timeout(max_duration) {
                    Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => {
                        tracing::debug!("Dictation worker received stop");
                    }
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        tracing::info!(
                            max_secs = max_duration.as_secs_f32(),
                            "Dictation reached maximum duration, stopping"
                        );
                    }
                }
                active.store(false, Ordering::SeqCst);

                match engine.stop_dictation(|text| (sink.as_ref())(text)) {
                    Ok(Some(text)) => {
                        tracing::info!(chars = text.chars().count(), "Dictated text typed");
                    }
                    Ok(None) => tracing::debug!("Dictation produced no text"),
                    Err(e) => {
                        tracing::error!(error = %e, "Dictation session failed");
                        engine.reset();
                    }
                }
            })?;

        Ok(Worker { stop_tx, handle })
    }
}

impl DictationControl for DictationService {
    fn start(&mut self) -> Result<()> {
        if !self.enabled {
            tracing::debug!("Dictation disabled in configuration, ignoring start");
            return Ok(());
        }
        if self.is_active() {
            return Ok(());
        }

        // The previous session may still be typing; never wait for it here.
        if let Some(worker) = &self.worker {
            if !worker.handle.is_finished() {
                tracing::info!("Previous dictation session still finishing, ignoring start");
                return Ok(());
            }
        }
        self.join();

        self.engine.start_dictation()?;
        match self.spawn_worker() {
            Ok(worker) => {
                self.worker = Some(worker);
                self.active.store(true, Ordering::SeqCst);
                self.sessions_started += 1;
                Ok(())
            }
            Err(e) => {
                self.engine.reset();
                Err(OptikError::Dictation(format!(
                    "Failed to start dictation worker: {}",
                    e
                )))
            }
        }
    }

    fn stop(&mut self) -> Result<()> {
        if !self.active.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        if let Some(worker) = &self.worker {
            // A send error means the worker already stopped on its own.
            let _ = worker.stop_tx.send(());
        }
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl Drop for DictationService {
    fn drop(&mut self) {
        let _ = self.stop();
        self.join();
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::state::DictationState;

    fn counting_transcriber() -> TranscriptionFn {
        Box::new(|samples: &[f32], _rate: u32| Ok(format!("heard {}", samples.len())))
    }

    fn capture_service(config: &DictationConfig) -> (DictationService, Arc<Mutex<Vec<String>>>) {
        let typed = Arc::new(Mutex::new(Vec::new()));
        let sink_typed = Arc::clone(&typed);
        let service = DictationService::with_text_sink(
            config,
            Some(counting_transcriber()),
            Box::new(move |text: &str| {
                sink_typed.lock().unwrap().push(text.to_string());
                Ok(())
            }),
        );
        (service, typed)
    }

    #[test]
    fn test_start_stop_types_transcript() {
        let (mut service, typed) = capture_service(&DictationConfig::default());

        service.start().unwrap();
        assert!(service.is_active());
        service.push_audio(&[0.1; 32]).unwrap();

        service.stop().unwrap();
        assert!(!service.is_active());
        service.join();

        assert_eq!(*typed.lock().unwrap(), vec!["heard 32".to_string()]);
        assert_eq!(service.engine().current_state(), DictationState::Idle);
    }

    #[test]
    fn test_start_and_stop_are_idempotent() {
        let (mut service, _typed) = capture_service(&DictationConfig::default());

        service.stop().unwrap();
        service.start().unwrap();
        service.start().unwrap();
        assert_eq!(service.sessions_started(), 1);

        service.stop().unwrap();
        service.stop().unwrap();
        service.join();
        assert!(!service.is_active());
    }

    #[test]
    fn test_auto_stop_after_max_duration() {
        let (service, typed) = capture_service(&DictationConfig::default());
        let mut service = service.with_max_duration(Duration::from_millis(200));

        service.start().unwrap();
        service.push_audio(&[0.0; 8]).unwrap();
        service.join();

        assert!(!service.is_active());
        assert_eq!(*typed.lock().unwrap(), vec!["heard 8".to_string()]);

        // A stop after the automatic one is a no-op.
        service.stop().unwrap();
    }

    #[test]
    fn test_restart_after_stop() {
        let (mut service, typed) = capture_service(&DictationConfig::default());

        service.start().unwrap();
        service.push_audio(&[0.0; 4]).unwrap();
        service.stop().unwrap();
        service.join();

        service.start().unwrap();
        service.push_audio(&[0.0; 6]).unwrap();
        service.stop().unwrap();
        service.join();

        assert_eq!(service.sessions_started(), 2);
        assert_eq!(
            *typed.lock().unwrap(),
            vec!["heard 4".to_string(), "heard 6".to_string()]
        );
    }

    #[test]
    fn test_start_while_previous_session_types_does_not_block() {
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let release_rx = Mutex::new(release_rx);
        let mut service = DictationService::with_text_sink(
            &DictationConfig::default(),
            Some(counting_transcriber()),
            Box::new(move |_text: &str| {
                let _ = release_rx.lock().unwrap().recv();
                Ok(())
            }),
        );

        service.start().unwrap();
        service.push_audio(&[0.0; 4]).unwrap();
        service.stop().unwrap();

        // The worker is held in the text sink, so this must return at once.
        service.start().unwrap();
        assert!(!service.is_active());
        assert_eq!(service.sessions_started(), 1);

        release_tx.send(()).unwrap();
        service.join();
        service.start().unwrap();
        assert!(service.is_active());
        assert_eq!(service.sessions_started(), 2);

        service.stop().unwrap();
        release_tx.send(()).unwrap();
        service.join();
    }

    #[test]
    fn test_disabled_service_ignores_start() {
        let config = DictationConfig {
            enabled: false,
            ..Default::default()
        };
        let (mut service, _typed) = capture_service(&config);
        service.start().unwrap();
        assert!(!service.is_active());
        assert_eq!(service.sessions_started(), 0);
    }
}
