//! Native IME window messages as a closed set of variants.

use bitflags::bitflags;

pub const WM_IME_STARTCOMPOSITION: u32 = 0x010D;
pub const WM_IME_ENDCOMPOSITION: u32 = 0x010E;
pub const WM_IME_COMPOSITION: u32 = 0x010F;
pub const WM_IME_SETCONTEXT: u32 = 0x0281;

/// `WM_IME_SETCONTEXT` flag asking the IME to draw its own composition window.
pub const ISC_SHOWUICOMPOSITIONWINDOW: isize = 0x8000_0000u32 as isize;

bitflags! {
    /// What a `WM_IME_COMPOSITION` message says changed (`GCS_*` / `CS_*`).
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct CompositionFlags: u32 {
        const COMP_READ_STR = 0x0001;
        const COMP_READ_ATTR = 0x0002;
        const COMP_READ_CLAUSE = 0x0004;
        const COMP_STR = 0x0008;
        const COMP_ATTR = 0x0010;
        const COMP_CLAUSE = 0x0020;
        const CURSOR_POS = 0x0080;
        const DELTA_START = 0x0100;
        const RESULT_READ_STR = 0x0200;
        const RESULT_READ_CLAUSE = 0x0400;
        const RESULT_STR = 0x0800;
        const RESULT_CLAUSE = 0x1000;
        const INSERT_CHAR = 0x2000;
        const NO_MOVE_CARET = 0x4000;
    }
}

impl CompositionFlags {
    /// Flags live in the low 32 bits of the message's `lParam`.
    pub fn from_lparam(lparam: isize) -> Self {
        Self::from_bits_retain((lparam as i64 & 0xFFFF_FFFF) as u32)
    }
}

/// A message as it arrives from the host window's message stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawMessage {
    pub msg: u32,
    pub wparam: usize,
    pub lparam: isize,
}

impl RawMessage {
    pub fn new(msg: u32, wparam: usize, lparam: isize) -> Self {
        Self {
            msg,
            wparam,
            lparam,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NativeMessage {
    /// The window's IME context was (de)activated.
    SetContext { wparam: usize, lparam: isize },
    StartComposition,
    /// The composition string changed.
    Composition(CompositionFlags),
    EndComposition,
    /// Anything else; left to default processing.
    PassThrough,
}

impl NativeMessage {
    pub fn classify(raw: RawMessage) -> Self {
        match raw.msg {
            WM_IME_SETCONTEXT => NativeMessage::SetContext {
                wparam: raw.wparam,
                lparam: raw.lparam,
            },
            WM_IME_STARTCOMPOSITION => NativeMessage::StartComposition,
            WM_IME_COMPOSITION => {
                NativeMessage::Composition(CompositionFlags::from_lparam(raw.lparam))
            }
            WM_IME_ENDCOMPOSITION => NativeMessage::EndComposition,
            _ => NativeMessage::PassThrough,
        }
    }
}

/// The `lParam` to forward for `WM_IME_SETCONTEXT` once the bridge takes over
/// drawing the composition window.
pub fn strip_composition_window_flag(lparam: isize) -> isize {
    lparam & !ISC_SHOWUICOMPOSITIONWINDOW
}

/// Outcome of offering a message to the bridge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookResult {
    /// Consumed; the window procedure should return this value.
    Handled(isize),
    /// Not ours; continue with the next handler.
    PassThrough,
}

impl HookResult {
    pub fn is_handled(&self) -> bool {
        matches!(self, HookResult::Handled(_))
    }
}
