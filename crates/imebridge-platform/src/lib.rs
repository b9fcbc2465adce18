//! Platform backends for `imebridge-core`.
//!
//! On Windows, [`attach`] subclasses a window, swaps in a dedicated IMM32
//! input context and routes the window's IME messages into an
//! [`ImeBridge`](imebridge_core::ImeBridge). With the `desktop` feature the
//! same can be done starting from a winit window.
//!
//! The routing table in [`registry`] is platform-free and is what the
//! window procedure consults for every message.

pub mod registry;
mod surface;

#[cfg(windows)]
mod win32;

#[cfg(feature = "desktop")]
pub mod desktop;

pub use registry::WM_IMEBRIDGE_WAKE;
pub use surface::SurfaceOrigin;

#[cfg(windows)]
pub use win32::*;
