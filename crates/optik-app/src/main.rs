//! Optik application binary - composition root.
//!
//! Ties the Optik crates together into a single executable:
//! 1. Load configuration from TOML and apply CLI overrides
//! 2. Start the capture thread publishing detections into the frame slot
//! 3. Run the control loop: engine -> OS input / dictation
//! 4. On Ctrl-C or end of stream, release everything and log a summary

mod cli;
mod display;

use std::io::{BufReader, Write};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use clap::Parser;

use optik_core::config::OptikConfig;
use optik_core::error::OptikError;
use optik_dictation::DictationService;
use optik_engine::{
    frame_slot, Controller, FrameConsumer, FrameProducer, FrameReport, LandmarkSource, ReplaySource,
};
use optik_input::{InputSink, LogInput, NativeInput};

use cli::{CliArgs, ScreenArg};

/// Counters logged at shutdown.
#[derive(Debug, Default)]
struct RunSummary {
    frames: u64,
    received: u64,
    dropped: u64,
    released: usize,
    alerts: usize,
}

/// Pull detections from `source` and publish them into the frame slot.
///
/// File replays are paced at the camera rate; a live stream on stdin is
/// published as fast as it arrives.
fn spawn_capture(
    mut source: Box<dyn LandmarkSource>,
    mut producer: FrameProducer,
    pace: Option<Duration>,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("optik-capture".to_string())
        .spawn(move || {
            tracing::info!(paced_ms = pace.map(|p| p.as_millis() as u64), "Capture thread started");
            let mut next_due = Instant::now();
            loop {
                if producer.is_closed() {
                    tracing::debug!("Control loop gone, stopping capture");
                    break;
                }
                match source.next_detection() {
                    Ok(Some(detection)) => {
                        producer.publish(detection);
                    }
                    Ok(None) => {
                        tracing::info!("Landmark stream ended");
                        break;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Landmark source failed");
                        break;
                    }
                }
                if let Some(period) = pace {
                    next_due += period;
                    let now = Instant::now();
                    if next_due > now {
                        std::thread::sleep(next_due - now);
                    } else {
                        next_due = now;
                    }
                }
            }
            tracing::info!(published = producer.published(), "Capture thread finished");
        })
}

/// Write one `--report` line.
fn write_report<W: Write>(writer: &mut W, report: &FrameReport) -> std::io::Result<()> {
    serde_json::to_writer(&mut *writer, report)?;
    writer.write_all(b"\n")?;
    writer.flush()
}

/// Run the control loop until the stream ends or Ctrl-C.
async fn control_loop<I: InputSink>(
    config: &OptikConfig,
    input: I,
    dictation: DictationService,
    mut consumer: FrameConsumer,
    mut report: bool,
) -> Result<RunSummary, OptikError> {
    let mut controller = Controller::new(config, input, dictation)?;
    let mut summary = RunSummary::default();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            frame = consumer.next() => {
                let Some(frame) = frame else {
                    tracing::info!("End of landmark stream");
                    break;
                };
                let out = controller.process(&frame.hands);
                tracing::trace!(
                    seq = frame.seq,
                    state = %out.state,
                    cursor = %out.cursor,
                    latency_us = frame.captured_at.elapsed().as_micros() as u64,
                    "Frame processed"
                );
                if report && (out.transition.is_some() || !out.intents.is_empty()) {
                    // A closed stdout must not skip the release in `stop()`.
                    if let Err(e) = write_report(&mut std::io::stdout().lock(), &out) {
                        tracing::warn!(error = %e, "Report output failed, reporting disabled");
                        report = false;
                    }
                }
                for alert in controller.take_alerts() {
                    summary.alerts += 1;
                    tracing::warn!(
                        collaborator = %alert.collaborator,
                        frame = alert.frame,
                        "{}",
                        alert.message
                    );
                }
            }
            _ = &mut ctrl_c => {
                tracing::info!("Ctrl-C received, stopping");
                break;
            }
        }
    }

    summary.released = controller.stop().len();
    // Let a running dictation session finish typing.
    controller.dictation_mut().join();

    summary.frames = controller.engine().frames();
    summary.received = consumer.received();
    summary.dropped = consumer.dropped();
    Ok(summary)
}

/// Logs go to stderr; stdout carries `--report` output.
fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config is read before tracing so its log level can seed the filter.
    let config_file = args.resolve_config_path();
    let (mut config, load_error) = if config_file.exists() {
        match OptikConfig::load(&config_file) {
            Ok(config) => (config, None),
            Err(e) => (OptikConfig::default(), Some(e)),
        }
    } else {
        (OptikConfig::default(), None)
    };

    let log_level = args
        .resolve_log_level()
        .unwrap_or_else(|| config.general.log_level.clone());
    init_tracing(&log_level);

    tracing::info!("Starting Optik v{}", env!("CARGO_PKG_VERSION"));
    match load_error {
        Some(e) => tracing::warn!(
            path = %config_file.display(),
            error = %e,
            "Failed to load config, using defaults"
        ),
        None if config_file.exists() => {
            tracing::info!(path = %config_file.display(), "Configuration loaded")
        }
        None => tracing::info!(path = %config_file.display(), "No config file, using defaults"),
    }

    match args.screen {
        Some(ScreenArg::Size { width, height }) => {
            config.screen.width = width;
            config.screen.height = height;
        }
        Some(ScreenArg::Auto) => match display::primary_screen_size() {
            Some((width, height)) => {
                config.screen.width = width;
                config.screen.height = height;
            }
            None => tracing::warn!("Could not query the primary display, keeping configured size"),
        },
        None => {}
    }
    config.validate()?;
    tracing::info!(
        width = config.screen.width,
        height = config.screen.height,
        dry_run = args.dry_run,
        "Screen configured"
    );

    // Landmark source.
    let (source, pace): (Box<dyn LandmarkSource>, Option<Duration>) = if args.replay_from_stdin() {
        tracing::info!("Reading landmarks from stdin");
        let reader = BufReader::new(std::io::stdin());
        (Box::new(ReplaySource::from_reader(reader)), None)
    } else {
        let source = ReplaySource::open(&args.replay)?;
        let period = Duration::from_secs_f64(1.0 / config.camera.fps);
        (Box::new(source), Some(period))
    };

    let (producer, consumer) = frame_slot();
    let capture = spawn_capture(source, producer, pace)?;

    // No speech-to-text backend ships with the binary; sessions record and
    // deliver nothing until one is plugged in through `TranscriptionFn`.
    let summary = if args.dry_run {
        let dictation = DictationService::with_text_sink(
            &config.dictation,
            None,
            Box::new(|text: &str| {
                tracing::info!(text_len = text.len(), "[dry-run] type dictated text");
                Ok(())
            }),
        );
        control_loop(&config, LogInput, dictation, consumer, args.report).await?
    } else {
        let input = NativeInput::new(config.screen.width, config.screen.height);
        let dictation = DictationService::new(&config.dictation, None);
        control_loop(&config, input, dictation, consumer, args.report).await?
    };

    // A file replay notices the closed slot and exits; stdin may be blocked in a read.
    if !args.replay_from_stdin() && capture.join().is_err() {
        tracing::error!("Capture thread panicked");
    }

    tracing::info!(
        frames = summary.frames,
        received = summary.received,
        dropped = summary.dropped,
        released = summary.released,
        alerts = summary.alerts,
        "Optik stopped"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use optik_core::types::{CursorPosition, GestureState, Intent};

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn sample_report() -> FrameReport {
        FrameReport {
            frame: 7,
            state: GestureState::Move,
            transition: Some((GestureState::Idle, GestureState::Move)),
            cursor: CursorPosition { x: 10, y: 20 },
            hand_present: true,
            intents: vec![Intent::move_to(CursorPosition { x: 10, y: 20 })],
        }
    }

    #[test]
    fn test_write_report_json_line() {
        let mut buf = Vec::new();
        write_report(&mut buf, &sample_report()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.ends_with('\n'));
        let value: serde_json::Value = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(value["frame"], 7);
        assert_eq!(value["hand_present"], true);
    }

    #[test]
    fn test_write_report_surfaces_broken_pipe() {
        let err = write_report(&mut ClosedPipe, &sample_report()).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::BrokenPipe);
    }
}
