//! Gesture classification state machine.
//!
//! Candidate selection is a pure function of the committed state, whether a
//! pinch is in progress and the current [`FeatureVector`]. The classifier
//! commits a candidate only after it has persisted for `min_dwell_frames`
//! consecutive frames; losing the hand commits `Idle` at once.
//!
//! Pinches are counted separately. A pinch held for `drag_hold_frames`
//! commits `Drag`. One released earlier (but after at least
//! `min_dwell_frames`) commits `Click` for exactly one frame, after which
//! the classifier returns to the state that was active before the pinch.

use optik_core::config::GestureConfig;
use optik_core::types::{GestureState, Point2};

use crate::normalizer::FeatureVector;

/// Per-frame outcome of candidate selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Candidate {
    /// Index finger pinched against the thumb. Resolved to Click or Drag by hold time.
    Pinch,
    State(GestureState),
}

/// Decision table, first match wins.
pub fn select_candidate(
    current: GestureState,
    pinch_in_progress: bool,
    features: &FeatureVector,
    config: &GestureConfig,
) -> Candidate {
    let index_threshold = if pinch_in_progress || current == GestureState::Drag {
        config.pinch_release
    } else {
        config.pinch_close
    };
    if features.index_pinch < index_threshold {
        return Candidate::Pinch;
    }

    let middle_threshold = if current == GestureState::EnterKey {
        config.pinch_release
    } else {
        config.pinch_close
    };
    if features.middle_pinch < middle_threshold {
        return Candidate::State(GestureState::EnterKey);
    }

    let f = features;
    let state = match (
        f.index_extended,
        f.middle_extended,
        f.ring_extended,
        f.pinky_extended,
    ) {
        (true, true, false, _) => GestureState::Scroll,
        (true, true, true, false) => GestureState::ScrollUp,
        (true, true, true, true) => GestureState::Dictation,
        (true, false, false, false) => GestureState::Move,
        _ => GestureState::Idle,
    };
    Candidate::State(state)
}

#[derive(Debug, Clone)]
pub struct GestureClassifier {
    config: GestureConfig,
    current: GestureState,
    /// Candidate waiting out its dwell, with its consecutive frame count.
    pending: Option<(GestureState, u32)>,
    pinch_frames: u32,
    /// State to return to after a one-frame Click.
    resume: Option<GestureState>,
    last_point: Option<Point2>,
}

impl GestureClassifier {
    pub fn new(config: &GestureConfig) -> Self {
        Self {
            config: config.clone(),
            current: GestureState::Idle,
            pending: None,
            pinch_frames: 0,
            resume: None,
            last_point: None,
        }
    }

    pub fn state(&self) -> GestureState {
        self.current
    }

    /// Last known control point. Kept while the hand is lost.
    pub fn control_point(&self) -> Option<Point2> {
        self.last_point
    }

    pub fn pinch_in_progress(&self) -> bool {
        self.pinch_frames > 0
    }

    /// Advance one frame and return the committed state.
    pub fn update(&mut self, features: Option<&FeatureVector>) -> GestureState {
        let Some(features) = features else {
            if self.current != GestureState::Idle {
                tracing::debug!(from = %self.current, "Hand lost, forcing idle");
            }
            self.clear_counters();
            self.current = GestureState::Idle;
            return self.current;
        };
        self.last_point = Some(features.control_point);

        if self.current == GestureState::Click {
            let back = self.resume.take().unwrap_or_default();
            self.commit(back);
        }

        match select_candidate(
            self.current,
            self.pinch_in_progress(),
            features,
            &self.config,
        ) {
            Candidate::Pinch => {
                self.pinch_frames = self.pinch_frames.saturating_add(1);
                self.pending = None;
                if self.current != GestureState::Drag
                    && self.pinch_frames >= self.config.drag_hold_frames
                {
                    self.commit(GestureState::Drag);
                }
            }
            Candidate::State(candidate) => {
                let pinched = std::mem::take(&mut self.pinch_frames);
                if pinched > 0 && self.current != GestureState::Drag {
                    if pinched >= self.config.min_dwell_frames {
                        self.resume = Some(self.current);
                        self.commit(GestureState::Click);
                        return self.current;
                    }
                    tracing::trace!(frames = pinched, "Ignoring short pinch");
                }
                self.dwell(candidate);
            }
        }
        self.current
    }

    fn dwell(&mut self, candidate: GestureState) {
        if candidate == self.current {
            self.pending = None;
            return;
        }
        let count = match self.pending {
            Some((state, n)) if state == candidate => n + 1,
            _ => 1,
        };
        if count >= self.config.min_dwell_frames {
            self.commit(candidate);
        } else {
            self.pending = Some((candidate, count));
        }
    }

    fn commit(&mut self, next: GestureState) {
        if next != self.current {
            tracing::debug!(from = %self.current, to = %next, "Gesture transition");
        }
        self.current = next;
        self.pending = None;
    }

    fn clear_counters(&mut self) {
        self.pending = None;
        self.pinch_frames = 0;
        self.resume = None;
    }

    /// Force Idle and clear all counters.
    pub fn reset(&mut self) {
        self.clear_counters();
        self.current = GestureState::Idle;
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GestureConfig {
        GestureConfig::default()
    }

    fn fv(index: bool, middle: bool, ring: bool, pinky: bool) -> FeatureVector {
        FeatureVector {
            index_extended: index,
            middle_extended: middle,
            ring_extended: ring,
            pinky_extended: pinky,
            index_pinch: 0.2,
            middle_pinch: 0.2,
            control_point: Point2::new(0.5, 0.5),
        }
    }

    fn pointing() -> FeatureVector {
        fv(true, false, false, false)
    }

    fn pinch(distance: f64) -> FeatureVector {
        FeatureVector {
            index_pinch: distance,
            ..pointing()
        }
    }

    fn feed(c: &mut GestureClassifier, f: &FeatureVector, frames: u32) -> Vec<GestureState> {
        (0..frames).map(|_| c.update(Some(f))).collect()
    }

    fn moving() -> GestureClassifier {
        let mut c = GestureClassifier::new(&config());
        feed(&mut c, &pointing(), 3);
        assert_eq!(c.state(), GestureState::Move);
        c
    }

    // =========================================================================
    // Decision table
    // =========================================================================

    #[test]
    fn test_candidate_table() {
        let cfg = config();
        let pick = |f: FeatureVector| select_candidate(GestureState::Idle, false, &f, &cfg);

        assert_eq!(pick(fv(true, false, false, false)), Candidate::State(GestureState::Move));
        assert_eq!(pick(fv(true, true, false, false)), Candidate::State(GestureState::Scroll));
        assert_eq!(pick(fv(true, true, false, true)), Candidate::State(GestureState::Scroll));
        assert_eq!(pick(fv(true, true, true, false)), Candidate::State(GestureState::ScrollUp));
        assert_eq!(pick(fv(true, true, true, true)), Candidate::State(GestureState::Dictation));
        assert_eq!(pick(fv(false, false, false, false)), Candidate::State(GestureState::Idle));
        assert_eq!(pick(fv(false, true, true, true)), Candidate::State(GestureState::Idle));
        assert_eq!(pick(fv(true, false, true, false)), Candidate::State(GestureState::Idle));
    }

    #[test]
    fn test_pinch_wins_over_extension() {
        let cfg = config();
        let f = FeatureVector {
            index_pinch: 0.01,
            middle_pinch: 0.01,
            ..fv(true, true, true, true)
        };
        assert_eq!(
            select_candidate(GestureState::Move, false, &f, &cfg),
            Candidate::Pinch
        );
    }

    #[test]
    fn test_enter_key_candidate() {
        let cfg = config();
        let f = FeatureVector {
            middle_pinch: 0.02,
            ..fv(true, false, false, false)
        };
        assert_eq!(
            select_candidate(GestureState::Move, false, &f, &cfg),
            Candidate::State(GestureState::EnterKey)
        );
    }

    #[test]
    fn test_pinch_hysteresis() {
        let cfg = config();
        let between = pinch(0.06);
        assert_eq!(
            select_candidate(GestureState::Move, false, &between, &cfg),
            Candidate::State(GestureState::Move)
        );
        assert_eq!(
            select_candidate(GestureState::Move, true, &between, &cfg),
            Candidate::Pinch
        );
        assert_eq!(
            select_candidate(GestureState::Drag, false, &between, &cfg),
            Candidate::Pinch
        );
    }

    // =========================================================================
    // Dwell
    // =========================================================================

    #[test]
    fn test_dwell_before_commit() {
        let mut c = GestureClassifier::new(&config());
        let states = feed(&mut c, &pointing(), 3);
        assert_eq!(
            states,
            vec![GestureState::Idle, GestureState::Idle, GestureState::Move]
        );
    }

    #[test]
    fn test_flicker_does_not_commit() {
        let mut c = moving();
        let scroll = fv(true, true, false, false);
        for _ in 0..5 {
            c.update(Some(&scroll));
            c.update(Some(&pointing()));
        }
        assert_eq!(c.state(), GestureState::Move);
    }

    #[test]
    fn test_hand_loss_is_immediate() {
        let mut c = moving();
        assert_eq!(c.update(None), GestureState::Idle);
        // Control point survives the loss.
        assert_eq!(c.control_point(), Some(Point2::new(0.5, 0.5)));
    }

    #[test]
    fn test_hand_loss_clears_pending() {
        let mut c = GestureClassifier::new(&config());
        feed(&mut c, &pointing(), 2);
        c.update(None);
        let states = feed(&mut c, &pointing(), 2);
        assert_eq!(states, vec![GestureState::Idle, GestureState::Idle]);
    }

    // =========================================================================
    // Click vs drag
    // =========================================================================

    #[test]
    fn test_short_pinch_clicks_once_then_resumes() {
        let mut c = moving();
        let held = feed(&mut c, &pinch(0.01), 4);
        assert!(held.iter().all(|s| *s == GestureState::Move));

        assert_eq!(c.update(Some(&pointing())), GestureState::Click);
        assert_eq!(c.update(Some(&pointing())), GestureState::Move);
        assert_eq!(c.update(Some(&pointing())), GestureState::Move);
    }

    #[test]
    fn test_noise_pinch_ignored() {
        let mut c = moving();
        feed(&mut c, &pinch(0.01), 2);
        assert_eq!(c.update(Some(&pointing())), GestureState::Move);
    }

    #[test]
    fn test_long_pinch_drags() {
        let mut c = moving();
        let states = feed(&mut c, &pinch(0.01), 10);
        assert_eq!(states[7], GestureState::Move);
        assert_eq!(states[8], GestureState::Drag);
        assert_eq!(states[9], GestureState::Drag);

        // Opening the pinch needs a dwelled candidate to leave Drag, and no click.
        let after = feed(&mut c, &pointing(), 3);
        assert_eq!(
            after,
            vec![GestureState::Drag, GestureState::Drag, GestureState::Move]
        );
    }

    #[test]
    fn test_drag_release_hysteresis() {
        let mut c = moving();
        feed(&mut c, &pinch(0.01), 9);
        assert_eq!(c.state(), GestureState::Drag);

        // Between close and release: still pinched.
        feed(&mut c, &pinch(0.06), 5);
        assert_eq!(c.state(), GestureState::Drag);
        assert!(c.pinch_in_progress());
    }

    #[test]
    fn test_reset() {
        let mut c = moving();
        feed(&mut c, &pinch(0.01), 9);
        c.reset();
        assert_eq!(c.state(), GestureState::Idle);
        assert!(!c.pinch_in_progress());
    }
}
