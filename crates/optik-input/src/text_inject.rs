//! Typing dictated text into the focused window.
//!
//! Text is first planned into [`Stroke`]s: one per UTF-16 code unit, with
//! line breaks turned into Enter. On Windows the plan is sent in a single
//! `SendInput` batch using `KEYEVENTF_UNICODE`, so the target sees the text
//! regardless of keyboard layout. Elsewhere `inject` returns an input error.

use optik_core::error::Result;

/// One key tap in a typing plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stroke {
    /// A UTF-16 code unit. Astral characters take two.
    Unit(u16),
    Enter,
}

/// Break `text` into key taps. `\r\n` and `\n` both become one Enter; a lone
/// `\r` is dropped.
pub fn plan_strokes(text: &str) -> Vec<Stroke> {
    let mut strokes = Vec::with_capacity(text.len());
    let mut buf = [0u16; 2];
    for ch in text.chars() {
        match ch {
            '\n' => strokes.push(Stroke::Enter),
            '\r' => {}
            _ => strokes.extend(ch.encode_utf16(&mut buf).iter().map(|u| Stroke::Unit(*u))),
        }
    }
    strokes
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TextInjector;

impl TextInjector {
    pub fn new() -> Self {
        Self
    }

    #[cfg(target_os = "windows")]
    pub fn inject(&self, text: &str) -> Result<()> {
        use windows_sys::Win32::UI::Input::KeyboardAndMouse::{
            INPUT, KEYEVENTF_KEYUP, KEYEVENTF_UNICODE, VK_RETURN,
        };

        use crate::native::{keyboard_input, send};

        let strokes = plan_strokes(text);
        if strokes.is_empty() {
            return Ok(());
        }

        let mut inputs: Vec<INPUT> = Vec::with_capacity(strokes.len() * 2);
        for stroke in &strokes {
            match *stroke {
                Stroke::Enter => {
                    inputs.push(keyboard_input(VK_RETURN, 0, 0));
                    inputs.push(keyboard_input(VK_RETURN, 0, KEYEVENTF_KEYUP));
                }
                Stroke::Unit(unit) => {
                    inputs.push(keyboard_input(0, unit, KEYEVENTF_UNICODE));
                    inputs.push(keyboard_input(0, unit, KEYEVENTF_UNICODE | KEYEVENTF_KEYUP));
                }
            }
        }

        send(&inputs)?;
        tracing::info!(strokes = strokes.len(), "Dictated text typed");
        Ok(())
    }

    #[cfg(not(target_os = "windows"))]
    pub fn inject(&self, text: &str) -> Result<()> {
        tracing::warn!(
            strokes = plan_strokes(text).len(),
            "Text injection unavailable on this platform"
        );
        Err(optik_core::error::OptikError::Input(
            "Text injection is only available on Windows".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_ascii() {
        assert_eq!(
            plan_strokes("hi"),
            vec![Stroke::Unit(b'h' as u16), Stroke::Unit(b'i' as u16)]
        );
        assert!(plan_strokes("").is_empty());
    }

    #[test]
    fn test_plan_line_breaks() {
        assert_eq!(
            plan_strokes("a\r\nb\nc\r"),
            vec![
                Stroke::Unit(b'a' as u16),
                Stroke::Enter,
                Stroke::Unit(b'b' as u16),
                Stroke::Enter,
                Stroke::Unit(b'c' as u16),
            ]
        );
    }

    #[test]
    fn test_plan_surrogate_pair() {
        // U+1F44B WAVING HAND SIGN
        assert_eq!(
            plan_strokes("\u{1F44B}"),
            vec![Stroke::Unit(0xD83D), Stroke::Unit(0xDC4B)]
        );
        assert_eq!(plan_strokes("é"), vec![Stroke::Unit(0x00E9)]);
    }

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn test_inject_errors_off_windows() {
        let err = TextInjector::new().inject("hello").unwrap_err();
        assert!(matches!(err, optik_core::error::OptikError::Input(_)));
        assert!(err.to_string().contains("only available on Windows"));
    }
}
