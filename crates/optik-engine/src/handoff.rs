//! Single-slot hand-off of detections from the capture thread to the control loop.
//!
//! Built on `tokio::sync::watch`: the producer overwrites the slot, the
//! consumer always sees the newest detection and never a backlog. Every
//! published detection carries a sequence number so the consumer can count
//! the ones it never saw.

use std::time::Instant;

use tokio::sync::watch;

use optik_core::types::Detection;

/// A detection stamped by the producer.
#[derive(Debug, Clone)]
pub struct SequencedFrame {
    pub seq: u64,
    pub captured_at: Instant,
    pub hands: Detection,
}

/// Capture-side handle. Usable from plain threads.
#[derive(Debug)]
pub struct FrameProducer {
    tx: watch::Sender<Option<SequencedFrame>>,
    seq: u64,
}

/// Control-loop handle.
#[derive(Debug)]
pub struct FrameConsumer {
    rx: watch::Receiver<Option<SequencedFrame>>,
    last_seq: u64,
    received: u64,
    dropped: u64,
}

/// Create a connected producer/consumer pair.
pub fn frame_slot() -> (FrameProducer, FrameConsumer) {
    let (tx, rx) = watch::channel(None);
    (
        FrameProducer { tx, seq: 0 },
        FrameConsumer {
            rx,
            last_seq: 0,
            received: 0,
            dropped: 0,
        },
    )
}

impl FrameProducer {
    /// Overwrite the slot with a new detection. Returns its sequence number.
    pub fn publish(&mut self, hands: Detection) -> u64 {
        self.seq += 1;
        self.tx.send_replace(Some(SequencedFrame {
            seq: self.seq,
            captured_at: Instant::now(),
            hands,
        }));
        self.seq
    }

    /// Whether the consumer has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub fn published(&self) -> u64 {
        self.seq
    }
}

impl FrameConsumer {
    /// Wait for a detection newer than the last one returned.
    ///
    /// Returns `None` once the producer is dropped and the last detection
    /// has been consumed.
    pub async fn next(&mut self) -> Option<SequencedFrame> {
        loop {
            self.rx.changed().await.ok()?;
            let frame = self.rx.borrow_and_update().clone();
            if let Some(frame) = frame {
                self.account(frame.seq);
                return Some(frame);
            }
        }
    }

    /// Take the newest detection if one arrived since the last call.
    pub fn try_latest(&mut self) -> Option<SequencedFrame> {
        if !self.rx.has_changed().unwrap_or(false) {
            return None;
        }
        let frame = self.rx.borrow_and_update().clone()?;
        self.account(frame.seq);
        Some(frame)
    }

    fn account(&mut self, seq: u64) {
        let skipped = seq.saturating_sub(self.last_seq + 1);
        if skipped > 0 {
            tracing::trace!(skipped, seq, "Frames overwritten before consumption");
        }
        self.dropped += skipped;
        self.received += 1;
        self.last_seq = seq;
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    /// Detections published but never seen by this consumer.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
