//! Composition state shared by the decoder and the positioner.
//!
//! Offsets are in UTF-16 code units, the unit both the native IME and the
//! browser's text-input pipeline count in.

use crate::geometry::ScreenRect;

/// Half-open range of character offsets, `from..to`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextRange {
    pub from: i32,
    pub to: i32,
}

impl TextRange {
    /// "End of text" marker understood by the browser as "replace at the
    /// current insertion point".
    pub const END: TextRange = TextRange {
        from: i32::MAX,
        to: i32::MAX,
    };

    pub const fn new(from: i32, to: i32) -> Self {
        Self { from, to }
    }

    /// Empty range positioned at `at`.
    pub const fn collapsed(at: i32) -> Self {
        Self { from: at, to: at }
    }

    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }

    pub fn len(&self) -> i32 {
        self.to - self.from
    }
}

/// Current composition range, per-character bounds, and IME cursor.
#[derive(Clone, Debug, Default)]
pub struct CompositionState {
    range: TextRange,
    bounds: Vec<ScreenRect>,
    cursor: Option<i32>,
}

impl CompositionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn bounds(&self) -> &[ScreenRect] {
        &self.bounds
    }

    /// `None` means "unset": lookups fall back to the range start.
    pub fn cursor(&self) -> Option<i32> {
        self.cursor
    }

    pub fn set_range(&mut self, range: TextRange) {
        self.range = range;
    }

    pub fn set_bounds(&mut self, bounds: Vec<ScreenRect>) {
        self.bounds = bounds;
    }

    pub fn set_cursor(&mut self, index: i32) {
        self.cursor = Some(index);
    }

    pub fn reset(&mut self) {
        self.cursor = None;
    }

    /// Index into [`bounds`](Self::bounds) for the character the composition
    /// window should track.
    ///
    /// The absolute cursor (or the range start when unset) is made relative
    /// to the range start. Cursors before the range start clamp to 0. Returns
    /// `None` when the index falls outside the known bounds.
    pub fn target_index(&self) -> Option<usize> {
        let start = self.range.from;
        let location = self.cursor.unwrap_or(start);
        let relative = if location >= start {
            location.saturating_sub(start)
        } else {
            0
        };
        let index = usize::try_from(relative).ok()?;
        (index < self.bounds.len()).then_some(index)
    }

    /// Bounds of the character at [`target_index`](Self::target_index).
    pub fn target_rect(&self) -> Option<ScreenRect> {
        self.target_index().map(|i| self.bounds[i])
    }

    pub fn first_rect(&self) -> Option<ScreenRect> {
        self.bounds.first().copied()
    }
}
