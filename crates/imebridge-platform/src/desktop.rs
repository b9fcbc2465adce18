//! winit glue: find the native handle behind a winit window.

use winit::raw_window_handle::{HasWindowHandle, RawWindowHandle};

/// The Win32 `HWND` of `window`, or `None` on other windowing systems.
pub fn window_hwnd(window: &impl HasWindowHandle) -> Option<isize> {
    let handle = match window.window_handle() {
        Ok(h) => h,
        Err(e) => {
            log::warn!("window has no native handle: {e}");
            return None;
        }
    };
    match handle.as_raw() {
        RawWindowHandle::Win32(h) => Some(h.hwnd.get()),
        other => {
            log::debug!("not a Win32 window: {other:?}");
            None
        }
    }
}

/// Attaches a bridge to a winit window. The bridge's hook runs ahead of
/// winit's window procedure, so winit never sees the IME messages it handles.
#[cfg(windows)]
pub fn attach_window<B>(
    window: &winit::window::Window,
    browser: B,
    origin: crate::SurfaceOrigin,
    config: imebridge_core::BridgeConfig,
) -> anyhow::Result<crate::SharedBridge<B>>
where
    B: imebridge_core::BrowserHost + 'static,
{
    let hwnd = window_hwnd(window).ok_or_else(|| anyhow::anyhow!("window is not a Win32 window"))?;
    crate::attach(hwnd, browser, origin, config)
}
