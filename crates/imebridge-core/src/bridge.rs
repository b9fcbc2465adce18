//! The bridge controller: owns the host hook, the IME contexts and the
//! composition session, and turns native messages into browser calls.

use std::sync::Arc;

use crate::caret::{CaretMove, CaretMoveReceiver, CaretMoveSender};
use crate::composition::{CompositionState, TextRange};
use crate::config::BridgeConfig;
use crate::decoder::{self, Decoded};
use crate::error::BridgeError;
use crate::geometry::ScreenTransform;
use crate::host::{BrowserHost, HostWindow, ImeContext, ImeOs, ImeRouting};
use crate::message::{HookResult, NativeMessage, RawMessage, strip_composition_window_flag};
use crate::positioner::Positioner;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Inactive,
    Active,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BridgePhase {
    Detached,
    Attached(SessionState),
}

/// The window's original context and the one the bridge swapped in.
/// Handed back to the OS exactly once, by [`ContextLease::release`].
#[derive(Debug)]
struct ContextLease {
    default: ImeContext,
    dedicated: ImeContext,
}

impl ContextLease {
    fn acquire(os: &mut dyn ImeOs) -> Result<Self, BridgeError> {
        let default = os.current_context();
        let dedicated = os.create_context()?;
        os.associate_context(dedicated);
        Ok(Self { default, dedicated })
    }

    fn release(self, os: &mut dyn ImeOs) {
        os.associate_context(self.default);
        os.destroy_context(self.dedicated);
    }
}

type RoutingCallback = Box<dyn FnMut(ImeRouting)>;

/// Callback-driven surface for the platform's window procedure hook.
pub trait MessageSink {
    fn handle_message(&mut self, msg: RawMessage) -> HookResult;
    fn focus_changed(&mut self, focused: bool);
    /// Applies caret moves queued by other threads.
    fn pump(&mut self);
    /// The host window is being destroyed.
    fn window_destroyed(&mut self);
}

pub struct ImeBridge<B: BrowserHost, O: ImeOs, H: HostWindow> {
    browser: B,
    os: O,
    host: H,
    config: BridgeConfig,
    state: CompositionState,
    positioner: Positioner,
    session: SessionState,
    lease: Option<ContextLease>,
    attached: bool,
    disposed: bool,
    routing: Option<RoutingCallback>,
    inbox: Option<CaretMoveReceiver>,
}

impl<B, O, H> ImeBridge<B, O, H>
where
    B: BrowserHost,
    O: ImeOs,
    H: HostWindow,
{
    pub fn new(browser: B, os: O, host: H, config: BridgeConfig) -> Self {
        Self {
            browser,
            os,
            host,
            config,
            state: CompositionState::new(),
            positioner: Positioner::new(),
            session: SessionState::Inactive,
            lease: None,
            attached: false,
            disposed: false,
            routing: None,
            inbox: None,
        }
    }

    /// Called with the framework-level IME routing whenever focus changes.
    pub fn on_routing_changed(&mut self, f: impl FnMut(ImeRouting) + 'static) {
        self.routing = Some(Box::new(f));
    }

    pub fn phase(&self) -> BridgePhase {
        if self.attached {
            BridgePhase::Attached(self.session)
        } else {
            BridgePhase::Detached
        }
    }

    pub fn is_active(&self) -> bool {
        self.attached && self.session == SessionState::Active
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn composition(&self) -> &CompositionState {
        &self.state
    }

    pub fn positioner(&self) -> &Positioner {
        &self.positioner
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    pub fn browser_mut(&mut self) -> &mut B {
        &mut self.browser
    }

    pub fn os(&self) -> &O {
        &self.os
    }

    pub fn os_mut(&mut self) -> &mut O {
        &mut self.os
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Hooks the host window and takes over its IME context.
    ///
    /// # Errors
    ///
    /// Fails if already attached, already torn down, or if the OS refuses a
    /// new input context (in which case nothing stays installed).
    pub fn setup(&mut self) -> Result<(), BridgeError> {
        if self.disposed {
            return Err(BridgeError::Disposed);
        }
        if self.attached {
            return Err(BridgeError::AlreadyAttached);
        }

        let lease = ContextLease::acquire(&mut self.os)?;
        log::debug!(
            "ime context {:?} replaces {:?}",
            lease.dedicated,
            lease.default
        );
        self.lease = Some(lease);

        self.host.install_hook();
        self.host.subscribe_focus();
        self.attached = true;
        log::info!("ime bridge attached");

        self.host.request_focus();
        Ok(())
    }

    /// Restores the window's own IME context and unhooks. Safe to call more
    /// than once.
    pub fn teardown(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        if self.attached {
            self.host.unsubscribe_focus();
        }
        if let Some(lease) = self.lease.take() {
            lease.release(&mut self.os);
        }
        self.positioner.end_session(&mut self.os);
        if self.attached {
            self.host.remove_hook();
        }
        if let Some(inbox) = self.inbox.take() {
            inbox.close();
        }

        self.attached = false;
        self.session = SessionState::Inactive;
        log::info!("ime bridge detached");
    }

    pub fn focus_gained(&mut self) {
        if !self.attached {
            return;
        }
        self.set_routing(ImeRouting {
            enabled: true,
            suspended: true,
        });
        if self.browser.is_available() {
            self.browser.send_focus(true);
        }
        self.session = SessionState::Active;
        log::info!("ime session active");
    }

    pub fn focus_lost(&mut self) {
        if !self.attached {
            return;
        }
        self.session = SessionState::Inactive;
        // The end-composition message that would normally release the caret
        // is passed through once inactive.
        self.state.reset();
        self.positioner.end_session(&mut self.os);
        self.set_routing(ImeRouting {
            enabled: false,
            suspended: false,
        });
        log::info!("ime session inactive");
    }

    fn set_routing(&mut self, routing: ImeRouting) {
        if let Some(cb) = self.routing.as_mut() {
            cb(routing);
        }
    }

    /// Offers a native message to the bridge.
    pub fn handle_message(&mut self, raw: RawMessage) -> HookResult {
        if self.disposed || !self.is_active() || !self.browser.is_available() {
            return HookResult::PassThrough;
        }

        match NativeMessage::classify(raw) {
            NativeMessage::SetContext { wparam, lparam } => {
                self.on_set_context(raw, wparam, lparam);
                HookResult::Handled(0)
            }
            NativeMessage::StartComposition => {
                log::debug!("start composition");
                self.positioner.begin_session(&mut self.os, &self.config);
                self.move_ime_window();
                self.state.reset();
                HookResult::Handled(0)
            }
            NativeMessage::Composition(flags) => {
                match decoder::decode(flags, &mut self.os) {
                    Some(Decoded::Commit(text)) => {
                        log::debug!("commit {text:?}");
                        self.browser.commit_text(&text, self.config.commit_target);
                    }
                    Some(Decoded::Composition(update)) => {
                        log::debug!(
                            "composition {:?} cursor {} ({} underline(s))",
                            update.text,
                            update.cursor,
                            update.underlines.len()
                        );
                        self.browser.set_composition(
                            &update.text,
                            &update.underlines,
                            self.config.commit_target,
                            TextRange::collapsed(update.cursor),
                        );
                        self.state.set_cursor(update.cursor.saturating_sub(1));
                        self.move_ime_window();
                    }
                    None => log::trace!("nothing to decode for {flags:?}"),
                }
                HookResult::Handled(0)
            }
            NativeMessage::EndComposition => {
                log::debug!("end composition");
                self.browser.finish_composing(false);
                self.state.reset();
                self.positioner.end_session(&mut self.os);
                HookResult::Handled(0)
            }
            NativeMessage::PassThrough => HookResult::PassThrough,
        }
    }

    fn on_set_context(&mut self, raw: RawMessage, wparam: usize, lparam: isize) {
        // The candidate window stays with the IME; only the composition
        // window is drawn by us.
        let forwarded = RawMessage::new(raw.msg, wparam, strip_composition_window_flag(lparam));
        self.os.default_proc(forwarded);

        self.positioner.begin_session(&mut self.os, &self.config);
        self.move_ime_window();
    }

    /// Repositions the composition window if the owner has focus.
    pub fn move_ime_window(&mut self) -> bool {
        if !self.host.has_focus() {
            return false;
        }
        self.positioner
            .reposition(&self.state, &mut self.os, &self.config)
    }

    /// The browser caret moved. Safe to call in any phase; positioning only
    /// happens while the session is active.
    pub fn on_caret_moved(&mut self, update: &CaretMove) {
        let Some(origin) = self.host.surface_origin() else {
            log::trace!("surface has no window, caret move ignored");
            return;
        };
        let scale = update
            .scale_factor
            .or_else(|| self.host.scale_factor())
            .unwrap_or(self.config.fallback_scale_factor);
        let transform = ScreenTransform::new(origin, scale);

        let bounds = update
            .bounds
            .iter()
            .map(|r| transform.apply_to_rect(*r))
            .collect::<Vec<_>>();
        log::trace!("caret range {:?}, bounds {:?}", update.range, bounds);

        self.state.set_range(update.range);
        self.state.set_bounds(bounds);

        if self.is_active() {
            self.move_ime_window();
        }
    }

    /// Sender for caret moves reported from other threads. `wake` must get
    /// the message thread to call [`MessageSink::pump`] soon.
    ///
    /// Must be called on the thread that owns the bridge. After teardown the
    /// sender is already disconnected.
    pub fn caret_sender(&mut self, wake: impl Fn() + Send + Sync + 'static) -> CaretMoveSender {
        if self.disposed {
            let closed = CaretMoveReceiver::new();
            closed.close();
            return closed.sender(Arc::new(wake));
        }
        self.inbox
            .get_or_insert_with(CaretMoveReceiver::new)
            .sender(Arc::new(wake))
    }

    /// Applies every queued caret move and releases their senders.
    pub fn pump_caret_moves(&mut self) {
        let batch = match self.inbox.as_ref() {
            Some(inbox) => inbox.drain(),
            None => return,
        };
        for pending in batch {
            self.on_caret_moved(&pending.update);
            pending.complete();
        }
    }
}

impl<B, O, H> MessageSink for ImeBridge<B, O, H>
where
    B: BrowserHost,
    O: ImeOs,
    H: HostWindow,
{
    fn handle_message(&mut self, msg: RawMessage) -> HookResult {
        ImeBridge::handle_message(self, msg)
    }

    fn focus_changed(&mut self, focused: bool) {
        if focused {
            self.focus_gained();
        } else {
            self.focus_lost();
        }
    }

    fn pump(&mut self) {
        self.pump_caret_moves();
    }

    fn window_destroyed(&mut self) {
        log::debug!("host window destroyed");
        self.teardown();
    }
}

impl<B: BrowserHost, O: ImeOs, H: HostWindow> Drop for ImeBridge<B, O, H> {
    fn drop(&mut self) {
        // The input contexts and the caret must not outlive the bridge.
        if !self.disposed {
            log::debug!("ime bridge dropped while attached, tearing down");
            self.teardown();
        }
    }
}
