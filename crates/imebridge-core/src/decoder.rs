//! Turns a `WM_IME_COMPOSITION` notification into either committed text or
//! an in-progress composition with underline segments.

use crate::composition::TextRange;
use crate::host::{CompositionSource, CompositionString, Underline, Underlines};
use crate::message::CompositionFlags;

pub const ATTR_INPUT: u8 = 0x00;
pub const ATTR_TARGET_CONVERTED: u8 = 0x01;
pub const ATTR_CONVERTED: u8 = 0x02;
pub const ATTR_TARGET_NOTCONVERTED: u8 = 0x03;
pub const ATTR_INPUT_ERROR: u8 = 0x04;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompositionUpdate {
    pub text: String,
    pub underlines: Underlines,
    /// Where the IME places its cursor inside `text`.
    pub cursor: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decoded {
    Commit(String),
    Composition(CompositionUpdate),
}

/// A final result wins over an in-progress composition carried by the same
/// message. `None` when neither can be read.
pub fn decode(flags: CompositionFlags, src: &mut dyn CompositionSource) -> Option<Decoded> {
    if let Some(text) = read_result(flags, src) {
        return Some(Decoded::Commit(text));
    }
    read_composition(flags, src).map(Decoded::Composition)
}

pub fn read_result(flags: CompositionFlags, src: &mut dyn CompositionSource) -> Option<String> {
    if !flags.contains(CompositionFlags::RESULT_STR) {
        return None;
    }
    src.composition_string(CompositionString::Result)
        .filter(|s| !s.is_empty())
}

pub fn read_composition(
    flags: CompositionFlags,
    src: &mut dyn CompositionSource,
) -> Option<CompositionUpdate> {
    if !flags.contains(CompositionFlags::COMP_STR) {
        return None;
    }
    let text = src
        .composition_string(CompositionString::Composition)
        .filter(|s| !s.is_empty())?;
    let length = utf16_len(&text);

    let target = if flags.contains(CompositionFlags::COMP_ATTR) {
        src.composition_attributes()
            .map(|attrs| target_range(&attrs))
            .unwrap_or(TextRange::collapsed(length))
    } else {
        TextRange::collapsed(length)
    };

    // IMM32 has no non-empty selection inside a composition, so the cursor
    // position doubles as the selection. NO_MOVE_CARET pins it to the start.
    let cursor = if !flags.contains(CompositionFlags::NO_MOVE_CARET)
        && flags.contains(CompositionFlags::CURSOR_POS)
    {
        src.composition_cursor().unwrap_or(0)
    } else {
        0
    };

    let mut underlines = if flags.contains(CompositionFlags::COMP_CLAUSE) {
        src.composition_clauses()
            .map(|clauses| clause_underlines(&clauses, target))
            .unwrap_or_default()
    } else {
        Underlines::new()
    };
    if underlines.is_empty() {
        underlines.push(Underline::thin(TextRange::new(0, length)));
    }

    Some(CompositionUpdate {
        text,
        underlines,
        cursor,
    })
}

fn is_target_attribute(attr: u8) -> bool {
    attr == ATTR_TARGET_CONVERTED || attr == ATTR_TARGET_NOTCONVERTED
}

/// First contiguous run of target attributes. Collapsed at the end when there
/// is none.
pub fn target_range(attrs: &[u8]) -> TextRange {
    let start = attrs
        .iter()
        .position(|&a| is_target_attribute(a))
        .unwrap_or(attrs.len());
    let end = attrs[start..]
        .iter()
        .position(|&a| !is_target_attribute(a))
        .map_or(attrs.len(), |n| start + n);
    TextRange::new(start as i32, end as i32)
}

/// One underline per clause; clauses inside `target` are thick.
pub fn clause_underlines(clauses: &[u32], target: TextRange) -> Underlines {
    clauses
        .windows(2)
        .map(|pair| {
            let range = TextRange::new(pair[0] as i32, pair[1] as i32);
            if range.from >= target.from && range.to <= target.to {
                Underline::thick(range)
            } else {
                Underline::thin(range)
            }
        })
        .collect()
}

pub fn utf16_len(text: &str) -> i32 {
    text.encode_utf16().count() as i32
}
