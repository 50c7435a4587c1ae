//! Translation of gesture transitions into intents.
//!
//! The dispatcher writes into a caller-owned buffer so the per-frame path does
//! not allocate. Button and dictation side effects are guarded by
//! `drag_active` and `dictation_active`, which guarantees a release for every
//! press regardless of how the gesture ended.

use serde::Serialize;

use optik_core::config::DispatchConfig;
use optik_core::types::{CursorPosition, GestureState, Intent, Key, Point2};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
struct ScrollTrack {
    anchor_y: f64,
    /// -1 for Scroll (down), +1 for ScrollUp.
    sign: f64,
    /// Whole lines already emitted from displacement.
    emitted: i32,
    frames: u32,
}

/// Side-effect bookkeeping. Mutated on transition edges; the scroll track
/// advances every frame spent scrolling.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DispatcherState {
    pub drag_active: bool,
    pub dictation_active: bool,
    scroll: Option<ScrollTrack>,
    /// Dispatch frame of the last Enter press.
    last_enter: Option<u64>,
    last_dictation: Option<u64>,
}

impl DispatcherState {
    pub fn scrolling(&self) -> bool {
        self.scroll.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct ActionDispatcher {
    config: DispatchConfig,
    state: DispatcherState,
    frame: u64,
}

impl ActionDispatcher {
    pub fn new(config: &DispatchConfig) -> Self {
        Self {
            config: config.clone(),
            state: DispatcherState::default(),
            frame: 0,
        }
    }

    pub fn state(&self) -> &DispatcherState {
        &self.state
    }

    /// Emit the intents for one frame.
    ///
    /// Exit actions of `previous` come first, then entry actions of
    /// `current`, then the per-frame actions of `current`.
    pub fn dispatch(
        &mut self,
        previous: GestureState,
        current: GestureState,
        cursor: CursorPosition,
        control_point: Option<Point2>,
        out: &mut Vec<Intent>,
    ) {
        self.frame += 1;
        let entered = previous != current;

        // Exits.
        if current != GestureState::Drag && self.state.drag_active {
            out.push(Intent::MouseUp);
            self.state.drag_active = false;
        }
        if current != GestureState::Dictation && self.state.dictation_active {
            out.push(Intent::DictationStop);
            self.state.dictation_active = false;
        }
        if entered {
            self.state.scroll = None;
        }

        // Entries and per-frame actions.
        match current {
            GestureState::Idle => {}
            GestureState::Move => out.push(Intent::move_to(cursor)),
            GestureState::Click => {
                if entered {
                    out.push(Intent::MouseDown);
                    out.push(Intent::MouseUp);
                }
            }
            GestureState::Drag => {
                if !self.state.drag_active {
                    out.push(Intent::MouseDown);
                    self.state.drag_active = true;
                }
                out.push(Intent::move_to(cursor));
            }
            GestureState::Scroll | GestureState::ScrollUp => {
                let sign = if current == GestureState::ScrollUp { 1.0 } else { -1.0 };
                self.scroll(sign, control_point, out);
            }
            GestureState::EnterKey => {
                if entered && self.enter_allowed() {
                    out.push(Intent::KeyPress { key: Key::Enter });
                    self.state.last_enter = Some(self.frame);
                }
            }
            GestureState::Dictation => {
                if !self.state.dictation_active && self.dictation_allowed() {
                    out.push(Intent::DictationStart);
                    self.state.dictation_active = true;
                    self.state.last_dictation = Some(self.frame);
                }
            }
        }
    }

    fn enter_allowed(&self) -> bool {
        self.cooled_down(self.state.last_enter, self.config.enter_cooldown_frames)
    }

    fn dictation_allowed(&self) -> bool {
        self.cooled_down(self.state.last_dictation, self.config.dictation_cooldown_frames)
    }

    fn cooled_down(&self, last: Option<u64>, cooldown: u32) -> bool {
        last.map_or(true, |last| self.frame - last >= u64::from(cooldown))
    }

    fn scroll(&mut self, sign: f64, control_point: Option<Point2>, out: &mut Vec<Intent>) {
        let track = self.state.scroll.get_or_insert(ScrollTrack {
            anchor_y: control_point.map_or(0.0, |p| p.y),
            sign,
            emitted: 0,
            frames: 0,
        });
        let y = control_point.map_or(track.anchor_y, |p| p.y);

        let total = (track.sign * (y - track.anchor_y) * self.config.scroll_gain).trunc() as i32;
        let mut dy = total - track.emitted;
        track.emitted = total;

        if self.config.scroll_step != 0 && track.frames % self.config.scroll_interval_frames == 0 {
            dy += track.sign as i32 * self.config.scroll_step;
        }
        track.frames = track.frames.wrapping_add(1);

        if dy != 0 {
            out.push(Intent::ScrollBy { dy });
        }
    }

    /// Release everything that is held and clear all state.
    pub fn cancel(&mut self, out: &mut Vec<Intent>) {
        if self.state.drag_active {
            out.push(Intent::MouseUp);
        }
        if self.state.dictation_active {
            out.push(Intent::DictationStop);
        }
        self.state = DispatcherState::default();
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use GestureState::*;

    const CURSOR: CursorPosition = CursorPosition { x: 100, y: 200 };

    fn dispatcher() -> ActionDispatcher {
        ActionDispatcher::new(&DispatchConfig::default())
    }

    fn step(
        d: &mut ActionDispatcher,
        previous: GestureState,
        current: GestureState,
        y: f64,
    ) -> Vec<Intent> {
        let mut out = Vec::new();
        d.dispatch(previous, current, CURSOR, Some(Point2::new(0.5, y)), &mut out);
        out
    }

    #[test]
    fn test_move_emits_every_frame() {
        let mut d = dispatcher();
        assert_eq!(step(&mut d, Idle, Move, 0.5), vec![Intent::MoveTo { x: 100, y: 200 }]);
        assert_eq!(step(&mut d, Move, Move, 0.5), vec![Intent::MoveTo { x: 100, y: 200 }]);
        assert!(step(&mut d, Move, Idle, 0.5).is_empty());
    }

    #[test]
    fn test_click_emits_down_up_once() {
        let mut d = dispatcher();
        step(&mut d, Idle, Move, 0.5);
        assert_eq!(step(&mut d, Move, Click, 0.5), vec![Intent::MouseDown, Intent::MouseUp]);
        assert_eq!(step(&mut d, Click, Move, 0.5), vec![Intent::MoveTo { x: 100, y: 200 }]);
        assert!(!d.state().drag_active);
    }

    #[test]
    fn test_drag_down_move_up() {
        let mut d = dispatcher();
        assert_eq!(
            step(&mut d, Move, Drag, 0.5),
            vec![Intent::MouseDown, Intent::MoveTo { x: 100, y: 200 }]
        );
        assert!(d.state().drag_active);
        assert_eq!(step(&mut d, Drag, Drag, 0.5), vec![Intent::MoveTo { x: 100, y: 200 }]);
        assert_eq!(
            step(&mut d, Drag, Move, 0.5),
            vec![Intent::MouseUp, Intent::MoveTo { x: 100, y: 200 }]
        );
        assert!(!d.state().drag_active);
    }

    #[test]
    fn test_drag_released_on_hand_loss() {
        let mut d = dispatcher();
        step(&mut d, Move, Drag, 0.5);
        assert_eq!(step(&mut d, Drag, Idle, 0.5), vec![Intent::MouseUp]);
    }

    // Control-point offsets below are multiples of 1/64 so the line counts are exact.

    #[test]
    fn test_scroll_pulses_and_displacement() {
        let config = DispatchConfig {
            scroll_gain: 64.0,
            scroll_step: 1,
            scroll_interval_frames: 3,
            ..Default::default()
        };
        let mut d = ActionDispatcher::new(&config);

        // Entry frame: pulse only.
        assert_eq!(step(&mut d, Move, Scroll, 0.5), vec![Intent::ScrollBy { dy: -1 }]);
        // 2.5 lines down, 2 whole.
        assert_eq!(step(&mut d, Scroll, Scroll, 0.5390625), vec![Intent::ScrollBy { dy: -2 }]);
        // 3 lines total, 1 new.
        assert_eq!(step(&mut d, Scroll, Scroll, 0.546875), vec![Intent::ScrollBy { dy: -1 }]);
        // Pulse frame, no new displacement.
        assert_eq!(step(&mut d, Scroll, Scroll, 0.546875), vec![Intent::ScrollBy { dy: -1 }]);
        assert!(step(&mut d, Scroll, Scroll, 0.546875).is_empty());
    }

    #[test]
    fn test_scroll_up_inverts_sign() {
        let config = DispatchConfig {
            scroll_gain: 64.0,
            scroll_step: 0,
            ..Default::default()
        };
        let mut d = ActionDispatcher::new(&config);
        assert!(step(&mut d, Move, ScrollUp, 0.5).is_empty());
        assert_eq!(step(&mut d, ScrollUp, ScrollUp, 0.421875), vec![Intent::ScrollBy { dy: -5 }]);
        assert_eq!(step(&mut d, ScrollUp, ScrollUp, 0.65625), vec![Intent::ScrollBy { dy: 15 }]);
    }

    #[test]
    fn test_scroll_anchor_resets_on_reentry() {
        let config = DispatchConfig {
            scroll_gain: 64.0,
            scroll_step: 0,
            ..Default::default()
        };
        let mut d = ActionDispatcher::new(&config);
        step(&mut d, Move, Scroll, 0.5);
        step(&mut d, Scroll, Scroll, 0.625);
        step(&mut d, Scroll, Move, 0.625);
        assert!(!d.state().scrolling());

        assert!(step(&mut d, Move, Scroll, 0.75).is_empty());
        assert_eq!(step(&mut d, Scroll, Scroll, 0.765625), vec![Intent::ScrollBy { dy: -1 }]);
    }

    #[test]
    fn test_enter_once_per_entry() {
        let mut d = dispatcher();
        assert_eq!(step(&mut d, Move, EnterKey, 0.5), vec![Intent::KeyPress { key: Key::Enter }]);
        assert!(step(&mut d, EnterKey, EnterKey, 0.5).is_empty());
        assert!(step(&mut d, EnterKey, Move, 0.5).len() == 1);
        assert_eq!(step(&mut d, Move, EnterKey, 0.5), vec![Intent::KeyPress { key: Key::Enter }]);
    }

    #[test]
    fn test_enter_cooldown() {
        let config = DispatchConfig {
            enter_cooldown_frames: 10,
            ..Default::default()
        };
        let mut d = ActionDispatcher::new(&config);
        assert_eq!(step(&mut d, Idle, EnterKey, 0.5).len(), 1);
        step(&mut d, EnterKey, Idle, 0.5);
        assert!(step(&mut d, Idle, EnterKey, 0.5).is_empty());
        for _ in 0..8 {
            step(&mut d, EnterKey, Idle, 0.5);
        }
        assert_eq!(step(&mut d, Idle, EnterKey, 0.5).len(), 1);
    }

    #[test]
    fn test_dictation_start_stop_guarded() {
        let mut d = dispatcher();
        assert_eq!(step(&mut d, Move, Dictation, 0.5), vec![Intent::DictationStart]);
        assert!(step(&mut d, Dictation, Dictation, 0.5).is_empty());
        assert_eq!(step(&mut d, Dictation, Idle, 0.5), vec![Intent::DictationStop]);
        assert!(step(&mut d, Idle, Idle, 0.5).is_empty());
    }

    #[test]
    fn test_dictation_cooldown() {
        let config = DispatchConfig {
            dictation_cooldown_frames: 6,
            ..Default::default()
        };
        let mut d = ActionDispatcher::new(&config);
        assert_eq!(step(&mut d, Idle, Dictation, 0.5), vec![Intent::DictationStart]);
        assert_eq!(step(&mut d, Dictation, Idle, 0.5), vec![Intent::DictationStop]);

        // Re-entered two frames after the start: held back until the cooldown ends.
        assert!(step(&mut d, Idle, Dictation, 0.5).is_empty());
        assert!(!d.state().dictation_active);
        for _ in 0..3 {
            assert!(step(&mut d, Dictation, Dictation, 0.5).is_empty());
        }
        assert_eq!(step(&mut d, Dictation, Dictation, 0.5), vec![Intent::DictationStart]);
        assert!(d.state().dictation_active);
    }

    #[test]
    fn test_cancel_releases_everything() {
        let mut d = dispatcher();
        step(&mut d, Move, Drag, 0.5);
        let mut out = Vec::new();
        d.cancel(&mut out);
        assert_eq!(out, vec![Intent::MouseUp]);
        assert_eq!(*d.state(), DispatcherState::default());

        step(&mut d, Move, Dictation, 0.5);
        out.clear();
        d.cancel(&mut out);
        assert_eq!(out, vec![Intent::DictationStop]);

        out.clear();
        d.cancel(&mut out);
        assert!(out.is_empty());
    }
}
