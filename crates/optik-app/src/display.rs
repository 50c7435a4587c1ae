//! Primary display queries.

/// Make the process DPI aware and return the primary display size in physical pixels.
#[cfg(target_os = "windows")]
pub fn primary_screen_size() -> Option<(u32, u32)> {
    use windows_sys::Win32::UI::HiDpi::{
        SetProcessDpiAwarenessContext, DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2,
    };
    use windows_sys::Win32::UI::WindowsAndMessaging::{GetSystemMetrics, SM_CXSCREEN, SM_CYSCREEN};

    // Without this, GetSystemMetrics reports scaled (logical) pixels.
    unsafe {
        if SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2) == 0 {
            tracing::debug!("DPI awareness already set for this process");
        }
        let width = GetSystemMetrics(SM_CXSCREEN);
        let height = GetSystemMetrics(SM_CYSCREEN);
        if width <= 0 || height <= 0 {
            return None;
        }
        Some((width as u32, height as u32))
    }
}

#[cfg(not(target_os = "windows"))]
pub fn primary_screen_size() -> Option<(u32, u32)> {
    None
}
