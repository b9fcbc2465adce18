//! Per-language quirks of the native composition window.

/// Primary language identifiers (low 10 bits of a LANGID).
pub const LANG_CHINESE: u16 = 0x04;
pub const LANG_JAPANESE: u16 = 0x11;
pub const LANG_KOREAN: u16 = 0x12;

/// Extracts the primary language id from a keyboard layout handle.
///
/// The low word of the layout is the LANGID; the primary language is its low
/// 10 bits.
pub fn primary_lang_id(keyboard_layout: isize) -> u16 {
    (keyboard_layout & 0x3ff) as u16
}

/// Placement behaviour derived from the active input language.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LanguageProfile {
    pub lang_id: u16,
    /// The IME reads the system caret position instead of the composition
    /// form, so one has to be created and kept in sync.
    pub system_caret: bool,
    /// The system caret is read at the line baseline of the first composed
    /// character.
    pub baseline_caret: bool,
    /// A point-anchored placement is sent before the rectangle one.
    pub point_anchored: bool,
    /// The rectangle placement is nudged down by the configured margin.
    pub caret_margin: bool,
}

impl LanguageProfile {
    pub fn for_lang(lang_id: u16) -> Self {
        let base = Self {
            lang_id,
            ..Self::default()
        };
        match lang_id {
            LANG_CHINESE => Self {
                system_caret: true,
                point_anchored: true,
                ..base
            },
            LANG_JAPANESE => Self {
                system_caret: true,
                baseline_caret: true,
                ..base
            },
            LANG_KOREAN => Self {
                caret_margin: true,
                ..base
            },
            _ => base,
        }
    }

    pub fn from_keyboard_layout(keyboard_layout: isize) -> Self {
        Self::for_lang(primary_lang_id(keyboard_layout))
    }
}
