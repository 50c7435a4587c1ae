//! Pointer and keyboard injection via the Windows `SendInput` API.
//!
//! Absolute moves are expressed in the 0..=65535 virtual coordinate space
//! `SendInput` expects, so the injector needs the configured screen size.
//! On other platforms every call returns `OptikError::Input`.

use optik_core::error::{OptikError, Result};
use optik_core::types::Key;

use crate::InputSink;

/// One wheel notch, in `mouseData` units.
pub const WHEEL_DELTA: i32 = 120;

/// Injects events into the OS input queue.
#[derive(Debug, Clone)]
pub struct NativeInput {
    screen_width: u32,
    screen_height: u32,
}

impl NativeInput {
    pub fn new(screen_width: u32, screen_height: u32) -> Self {
        Self {
            screen_width,
            screen_height,
        }
    }

    /// Map a pixel coordinate to the normalized absolute range used by `SendInput`.
    pub fn to_absolute(&self, x: i32, y: i32) -> (i32, i32) {
        let scale = |v: i32, extent: u32| -> i32 {
            let max = extent.saturating_sub(1).max(1) as i64;
            let v = (v as i64).clamp(0, max);
            ((v * 65535) / max) as i32
        };
        (scale(x, self.screen_width), scale(y, self.screen_height))
    }
}

#[cfg(target_os = "windows")]
mod sys {
    use windows_sys::Win32::UI::Input::KeyboardAndMouse::{
        SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, INPUT_MOUSE, KEYBDINPUT, KEYEVENTF_KEYUP,
        MOUSEINPUT, VK_RETURN,
    };

    use optik_core::error::{OptikError, Result};
    use optik_core::types::Key;

    pub fn mouse(dx: i32, dy: i32, data: i32, flags: u32) -> INPUT {
        INPUT {
            r#type: INPUT_MOUSE,
            Anonymous: INPUT_0 {
                mi: MOUSEINPUT {
                    dx,
                    dy,
                    mouseData: data,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        }
    }

    pub fn key(vk: u16, scan: u16, flags: u32) -> INPUT {
        INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: vk,
                    wScan: scan,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        }
    }

    pub fn virtual_key(k: Key) -> u16 {
        match k {
            Key::Enter => VK_RETURN,
        }
    }

    pub fn key_tap(vk: u16) -> [INPUT; 2] {
        [key(vk, 0, 0), key(vk, 0, KEYEVENTF_KEYUP)]
    }

    pub fn send(inputs: &[INPUT]) -> Result<()> {
        if inputs.is_empty() {
            return Ok(());
        }
        let sent = unsafe {
            SendInput(
                inputs.len() as u32,
                inputs.as_ptr(),
                std::mem::size_of::<INPUT>() as i32,
            )
        };
        if sent as usize != inputs.len() {
            return Err(OptikError::Input(format!(
                "SendInput only sent {} of {} events",
                sent,
                inputs.len()
            )));
        }
        Ok(())
    }
}

#[cfg(target_os = "windows")]
pub(crate) use sys::{key as keyboard_input, send};

#[cfg(target_os = "windows")]
impl InputSink for NativeInput {
    fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
        use windows_sys::Win32::UI::Input::KeyboardAndMouse::{
            MOUSEEVENTF_ABSOLUTE, MOUSEEVENTF_MOVE,
        };
        let (ax, ay) = self.to_absolute(x, y);
        sys::send(&[sys::mouse(ax, ay, 0, MOUSEEVENTF_MOVE | MOUSEEVENTF_ABSOLUTE)])
    }

    fn mouse_down(&mut self) -> Result<()> {
        use windows_sys::Win32::UI::Input::KeyboardAndMouse::MOUSEEVENTF_LEFTDOWN;
        sys::send(&[sys::mouse(0, 0, 0, MOUSEEVENTF_LEFTDOWN)])
    }

    fn mouse_up(&mut self) -> Result<()> {
        use windows_sys::Win32::UI::Input::KeyboardAndMouse::MOUSEEVENTF_LEFTUP;
        sys::send(&[sys::mouse(0, 0, 0, MOUSEEVENTF_LEFTUP)])
    }

    fn scroll_by(&mut self, dy: i32) -> Result<()> {
        use windows_sys::Win32::UI::Input::KeyboardAndMouse::MOUSEEVENTF_WHEEL;
        if dy == 0 {
            return Ok(());
        }
        let data = dy.saturating_mul(WHEEL_DELTA);
        sys::send(&[sys::mouse(0, 0, data, MOUSEEVENTF_WHEEL)])
    }

    fn key_press(&mut self, key: Key) -> Result<()> {
        tracing::debug!(key = %key, "Pressing key via SendInput");
        sys::send(&sys::key_tap(sys::virtual_key(key)))
    }

    fn type_text(&mut self, text: &str) -> Result<()> {
        crate::TextInjector::new().inject(text)
    }
}

#[cfg(not(target_os = "windows"))]
fn unavailable(what: &str) -> OptikError {
    tracing::warn!(event = what, "NativeInput: SendInput not available on this platform");
    OptikError::Input("Native input injection is only available on Windows".into())
}

#[cfg(not(target_os = "windows"))]
impl InputSink for NativeInput {
    fn move_to(&mut self, _x: i32, _y: i32) -> Result<()> {
        Err(unavailable("move_to"))
    }

    fn mouse_down(&mut self) -> Result<()> {
        Err(unavailable("mouse_down"))
    }

    fn mouse_up(&mut self) -> Result<()> {
        Err(unavailable("mouse_up"))
    }

    fn scroll_by(&mut self, _dy: i32) -> Result<()> {
        Err(unavailable("scroll_by"))
    }

    fn key_press(&mut self, _key: Key) -> Result<()> {
        Err(unavailable("key_press"))
    }

    fn type_text(&mut self, _text: &str) -> Result<()> {
        Err(unavailable("type_text"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_absolute_corners() {
        let input = NativeInput::new(1920, 1080);
        assert_eq!(input.to_absolute(0, 0), (0, 0));
        assert_eq!(input.to_absolute(1919, 1079), (65535, 65535));
    }

    #[test]
    fn test_to_absolute_clamps_offscreen() {
        let input = NativeInput::new(1920, 1080);
        assert_eq!(input.to_absolute(-50, 5000), (0, 65535));
    }

    #[test]
    fn test_to_absolute_degenerate_screen() {
        let input = NativeInput::new(1, 1);
        assert_eq!(input.to_absolute(0, 0), (0, 0));
    }

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn test_native_input_errors_on_non_windows() {
        let mut input = NativeInput::new(800, 600);
        let err = input.mouse_down().unwrap_err();
        assert!(matches!(err, OptikError::Input(_)));
        assert!(err.to_string().contains("only available on Windows"));
        assert!(input.key_press(Key::Enter).is_err());
    }
}
