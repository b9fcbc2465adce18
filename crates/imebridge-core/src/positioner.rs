//! Keeps the native composition window (and, for IMEs that read it, the
//! system caret) next to the browser's caret.

use crate::composition::CompositionState;
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::host::{CompositionForm, ImeOs};
use crate::language::LanguageProfile;

/// Proof that a system caret is live. Only [`Positioner`] creates one, and it
/// has to be handed back through [`SystemCaret::release`].
#[must_use]
#[derive(Debug)]
pub struct SystemCaret {
    _owned: (),
}

impl SystemCaret {
    fn acquire(os: &mut dyn ImeOs) -> Result<Self, BridgeError> {
        os.create_caret()?;
        Ok(Self { _owned: () })
    }

    fn release(self, os: &mut dyn ImeOs) {
        os.destroy_caret();
    }
}

#[derive(Debug, Default)]
pub struct Positioner {
    profile: LanguageProfile,
    caret: Option<SystemCaret>,
    last_form: Option<CompositionForm>,
}

impl Positioner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn profile(&self) -> LanguageProfile {
        self.profile
    }

    pub fn has_system_caret(&self) -> bool {
        self.caret.is_some()
    }

    /// Last rectangle-anchored placement sent to the IME. Placement never
    /// reads it back.
    pub fn last_form(&self) -> Option<CompositionForm> {
        self.last_form
    }

    /// Picks up the active input language and makes sure a system caret
    /// exists exactly when that language needs one.
    pub fn begin_session(&mut self, os: &mut dyn ImeOs, config: &BridgeConfig) {
        self.profile = LanguageProfile::from_keyboard_layout(os.keyboard_layout());
        let wants_caret = self.profile.system_caret && config.emulate_system_caret;

        if wants_caret {
            if self.caret.is_none() {
                match SystemCaret::acquire(os) {
                    Ok(caret) => {
                        log::debug!("system caret created for lang {:#x}", self.profile.lang_id);
                        self.caret = Some(caret);
                    }
                    Err(e) => log::warn!("could not create system caret: {e}"),
                }
            }
        } else if let Some(caret) = self.caret.take() {
            log::debug!(
                "lang {:#x} needs no system caret, releasing",
                self.profile.lang_id
            );
            caret.release(os);
        }
    }

    /// Drops the system caret, if any.
    pub fn end_session(&mut self, os: &mut dyn ImeOs) {
        if let Some(caret) = self.caret.take() {
            log::debug!("system caret destroyed");
            caret.release(os);
        }
    }

    /// Sends placement calls for the character under the IME cursor.
    /// Returns `false` (and sends nothing) when that character has no known
    /// bounds.
    pub fn reposition(
        &mut self,
        state: &CompositionState,
        os: &mut dyn ImeOs,
        config: &BridgeConfig,
    ) -> bool {
        let Some(mut rect) = state.target_rect() else {
            log::trace!(
                "no bounds for cursor {:?} in {:?} ({} known)",
                state.cursor(),
                state.range(),
                state.bounds().len()
            );
            return false;
        };

        if self.profile.point_anchored {
            os.set_composition_window(CompositionForm::point(rect));
        }

        if self.caret.is_some() {
            let anchor = if self.profile.baseline_caret {
                state.first_rect().map(|first| (first.x, first.bottom()))
            } else {
                Some((rect.x, rect.y))
            };
            if let Some((x, y)) = anchor {
                os.set_caret_pos(x, y);
            }
        }

        if self.profile.caret_margin {
            rect = rect.offset_y(config.caret_margin);
        }

        let form = CompositionForm::rect(rect);
        log::debug!("composition window -> {:?}", form.area);
        os.set_composition_window(form);
        self.last_form = Some(form);
        true
    }
}
