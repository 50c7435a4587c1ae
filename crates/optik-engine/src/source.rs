//! Landmark sources.
//!
//! The hand-landmark detector is an external collaborator. The engine pulls
//! detections through [`LandmarkSource`]; [`ReplaySource`] plays back a JSON
//! Lines recording with one detection (an array of hands) per line.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use serde::Deserialize;

use optik_core::error::Result;
use optik_core::types::{Detection, LandmarkFrame};

/// Supplier of detections, one per captured image.
pub trait LandmarkSource: Send {
    /// Next detection, or `Ok(None)` at end of stream.
    fn next_detection(&mut self) -> Result<Option<Detection>>;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ReplayLine {
    Hands(Vec<LandmarkFrame>),
    Hand(LandmarkFrame),
}

/// Plays back a JSON Lines recording.
///
/// Blank lines and lines starting with `#` are skipped. A line that does not
/// parse is logged and replayed as "no hand".
#[derive(Debug)]
pub struct ReplaySource<R> {
    reader: R,
    line_no: usize,
    malformed: usize,
    buf: Vec<u8>,
}

impl ReplaySource<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        tracing::info!(path = %path.display(), "Opened landmark replay");
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> ReplaySource<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            malformed: 0,
            buf: Vec::new(),
        }
    }

    /// Lines that failed to parse so far.
    pub fn malformed(&self) -> usize {
        self.malformed
    }
}

impl<R: BufRead + Send> LandmarkSource for ReplaySource<R> {
    fn next_detection(&mut self) -> Result<Option<Detection>> {
        loop {
            self.buf.clear();
            if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            let parsed = match std::str::from_utf8(&self.buf) {
                Ok(text) => {
                    let line = text.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    serde_json::from_str::<ReplayLine>(line).map_err(|e| e.to_string())
                }
                Err(e) => Err(e.to_string()),
            };

            return match parsed {
                Ok(ReplayLine::Hands(hands)) => Ok(Some(hands)),
                Ok(ReplayLine::Hand(hand)) => Ok(Some(vec![hand])),
                Err(error) => {
                    self.malformed += 1;
                    tracing::warn!(line = self.line_no, %error, "Malformed replay line, treating as no hand");
                    Ok(Some(Vec::new()))
                }
            };
        }
    }
}

/// In-memory source, mostly for tests.
#[derive(Debug, Default)]
pub struct MemorySource {
    detections: VecDeque<Detection>,
}

impl MemorySource {
    pub fn new(detections: impl IntoIterator<Item = Detection>) -> Self {
        Self {
            detections: detections.into_iter().collect(),
        }
    }
}

impl LandmarkSource for MemorySource {
    fn next_detection(&mut self) -> Result<Option<Detection>> {
        Ok(self.detections.pop_front())
    }
}

/// Append one detection as a JSON Lines record.
pub fn write_detection<W: Write>(writer: &mut W, detection: &[LandmarkFrame]) -> Result<()> {
    serde_json::to_writer(&mut *writer, detection)?;
    writer.write_all(b"\n")?;
    Ok(())
}
