//! # IME composition bridge
//!
//! An embedded browser surface never sees the host window's native IME
//! messages. `imebridge-core` sits on the host window's message stream,
//! rebuilds the composition the IME is working on, and forwards it to the
//! browser's text-input pipeline. In the other direction it keeps the native
//! composition window parked next to the browser's caret.
//!
//! The crate is platform-free: everything it needs from the outside world is
//! behind three traits in [`host`]:
//!
//! - [`BrowserHost`]: the browser's text-input pipeline.
//! - [`ImeOs`]: input contexts, the system caret, composition window
//!   placement and the composition strings.
//! - [`HostWindow`]: hooking and focus for the window the surface lives in.
//!
//! ## Flow
//!
//! ```text
//! native message -> NativeMessage::classify -> decoder -> CompositionState
//!                -> Positioner -> ImeOs placement calls
//! browser caret  -> CaretMove -> map_to_screen -> CompositionState -> Positioner
//! ```
//!
//! ## Lifecycle
//!
//! ```ignore
//! let mut bridge = ImeBridge::new(browser, os, host, BridgeConfig::default());
//! bridge.setup()?;                       // hook + dedicated input context
//! bridge.focus_gained();                 // session becomes active
//! bridge.handle_message(raw);            // from the window procedure
//! bridge.on_caret_moved(&caret_move);    // from the browser (same thread)
//! bridge.teardown();                     // idempotent; also runs on drop
//! ```
//!
//! Caret moves reported from another thread go through a
//! [`CaretMoveSender`], which blocks until the message thread has applied the
//! update.

pub mod bridge;
pub mod caret;
pub mod composition;
pub mod config;
pub mod decoder;
pub mod error;
pub mod geometry;
pub mod host;
pub mod language;
pub mod message;
pub mod positioner;

pub use bridge::*;
pub use caret::{CaretMove, CaretMoveSender};
pub use composition::*;
pub use config::*;
pub use decoder::{CompositionUpdate, Decoded};
pub use error::*;
pub use geometry::*;
pub use host::*;
pub use language::LanguageProfile;
pub use message::*;
pub use positioner::Positioner;
