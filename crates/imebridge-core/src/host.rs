//! Collaborator seams: the browser surface, the native IME, and the host
//! window. The bridge only ever talks to these traits.

use smallvec::SmallVec;

use crate::composition::TextRange;
use crate::error::BridgeError;
use crate::geometry::{ScreenRect, Vec2};
use crate::message::RawMessage;

/// Opaque ARGB underline color: opaque black.
pub const UNDERLINE_COLOR: u32 = 0xFF00_0000;
/// Opaque ARGB background color: fully transparent.
pub const UNDERLINE_BACKGROUND: u32 = 0x0000_0000;

/// Styled sub-range of the composed text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Underline {
    pub range: TextRange,
    pub color: u32,
    pub background_color: u32,
    /// Thick underlines mark the clause the IME is currently converting.
    pub thick: bool,
}

impl Underline {
    pub fn thin(range: TextRange) -> Self {
        Self {
            range,
            color: UNDERLINE_COLOR,
            background_color: UNDERLINE_BACKGROUND,
            thick: false,
        }
    }

    pub fn thick(range: TextRange) -> Self {
        Self {
            thick: true,
            ..Self::thin(range)
        }
    }
}

pub type Underlines = SmallVec<[Underline; 4]>;

/// The embedded browser's text-input pipeline.
pub trait BrowserHost {
    /// `false` once the surface is disposed or has no live browser.
    fn is_available(&self) -> bool;

    fn commit_text(&mut self, text: &str, replacement: TextRange);

    fn set_composition(
        &mut self,
        text: &str,
        underlines: &[Underline],
        replacement: TextRange,
        selection: TextRange,
    );

    /// Ends the active composition. With `keep_selection == false` the
    /// composed text is dropped rather than committed.
    fn finish_composing(&mut self, keep_selection: bool);

    fn send_focus(&mut self, focused: bool);
}

/// Handle to a native input context.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ImeContext(pub isize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlacementStyle {
    /// Anchor the composition window at a point.
    Point,
    /// Anchor the composition window to a rectangle it should avoid covering.
    Rect,
}

/// Placement request for the native composition window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompositionForm {
    pub style: PlacementStyle,
    pub x: i32,
    pub y: i32,
    pub area: ScreenRect,
}

impl CompositionForm {
    pub fn point(rect: ScreenRect) -> Self {
        Self {
            style: PlacementStyle::Point,
            x: rect.x,
            y: rect.y,
            area: rect,
        }
    }

    pub fn rect(rect: ScreenRect) -> Self {
        Self {
            style: PlacementStyle::Rect,
            ..Self::point(rect)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompositionString {
    /// Finalized text (`GCS_RESULTSTR`).
    Result,
    /// In-progress text (`GCS_COMPSTR`).
    Composition,
}

/// Reads the current composition out of the native IME.
pub trait CompositionSource {
    /// `None` when the IME has no such string.
    fn composition_string(&mut self, which: CompositionString) -> Option<String>;
    /// One attribute byte per UTF-16 unit of the composition string.
    fn composition_attributes(&mut self) -> Option<Vec<u8>>;
    /// Clause boundaries as UTF-16 offsets, starting at 0 and ending at the
    /// string length.
    fn composition_clauses(&mut self) -> Option<Vec<u32>>;
    fn composition_cursor(&mut self) -> Option<i32>;
}

/// Native IME and caret calls for one window.
pub trait ImeOs: CompositionSource {
    /// Keyboard layout of the active input language.
    fn keyboard_layout(&self) -> isize;

    /// Context currently associated with the window.
    fn current_context(&mut self) -> ImeContext;
    fn create_context(&mut self) -> Result<ImeContext, BridgeError>;
    fn associate_context(&mut self, ctx: ImeContext);
    fn destroy_context(&mut self, ctx: ImeContext);

    /// Creates a 1x1 system caret owned by the window.
    fn create_caret(&mut self) -> Result<(), BridgeError>;
    fn destroy_caret(&mut self);
    fn set_caret_pos(&mut self, x: i32, y: i32);

    fn set_composition_window(&mut self, form: CompositionForm);

    /// Runs default processing for `msg` and returns its result.
    fn default_proc(&mut self, msg: RawMessage) -> isize;
}

/// Framework-level input method routing for the owner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImeRouting {
    pub enabled: bool,
    /// The framework keeps IME enabled but stops intercepting keystrokes.
    pub suspended: bool,
}

/// The window that hosts the browser surface.
pub trait HostWindow {
    fn install_hook(&mut self);
    fn remove_hook(&mut self);
    fn subscribe_focus(&mut self);
    fn unsubscribe_focus(&mut self);
    fn request_focus(&mut self);
    fn has_focus(&self) -> bool;
    /// Offset of the browser surface inside its top-level window, or `None`
    /// when the surface is not currently parented to one.
    fn surface_origin(&self) -> Option<Vec2>;
    fn scale_factor(&self) -> Option<f32>;
}
