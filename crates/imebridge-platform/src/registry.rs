//! Per-thread table of hooked windows.
//!
//! The window procedure hook only gets a window handle, so bridges are
//! looked up here. Entries hold weak references: a dropped bridge simply
//! stops receiving messages.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Weak;

use imebridge_core::{HookResult, MessageSink, RawMessage};

pub const WM_SETFOCUS: u32 = 0x0007;
pub const WM_KILLFOCUS: u32 = 0x0008;
pub const WM_NCDESTROY: u32 = 0x0082;
pub const WM_APP: u32 = 0x8000;
/// Posted to the window to make its bridge apply queued caret moves.
pub const WM_IMEBRIDGE_WAKE: u32 = WM_APP + 0x1B1;

pub type SinkRef = Weak<RefCell<dyn MessageSink>>;

struct Entry {
    sink: SinkRef,
    hooked: bool,
    focus: bool,
}

thread_local! {
    static WINDOWS: RefCell<HashMap<isize, Entry>> = RefCell::new(HashMap::new());
}

/// What the window procedure should do with a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    /// Return this value without further processing.
    Handled(isize),
    /// Hand the message to the next procedure in the chain.
    Forward,
    /// The bridge is busy further up the stack; post the message again.
    Busy,
}

pub fn register(hwnd: isize, sink: SinkRef) {
    WINDOWS.with(|w| {
        w.borrow_mut().insert(
            hwnd,
            Entry {
                sink,
                hooked: false,
                focus: false,
            },
        );
    });
}

pub fn unregister(hwnd: isize) -> bool {
    WINDOWS.with(|w| w.borrow_mut().remove(&hwnd).is_some())
}

pub fn is_registered(hwnd: isize) -> bool {
    WINDOWS.with(|w| w.borrow().contains_key(&hwnd))
}

pub fn set_hooked(hwnd: isize, hooked: bool) {
    WINDOWS.with(|w| {
        if let Some(e) = w.borrow_mut().get_mut(&hwnd) {
            e.hooked = hooked;
        }
    });
}

pub fn set_focus_subscribed(hwnd: isize, focus: bool) {
    WINDOWS.with(|w| {
        if let Some(e) = w.borrow_mut().get_mut(&hwnd) {
            e.focus = focus;
        }
    });
}

/// Decides what happens to `msg` sent to `hwnd`, delivering it to the
/// window's bridge when one is listening. `WM_NCDESTROY` drops the window's
/// entry and tells the bridge, hooked or not.
pub fn route(hwnd: isize, msg: RawMessage) -> Route {
    // The table borrow must end before the sink runs: the sink may
    // (un)hook and touch the table again.
    let Some((sink, hooked, focus)) = WINDOWS.with(|w| {
        w.borrow()
            .get(&hwnd)
            .map(|e| (e.sink.clone(), e.hooked, e.focus))
    }) else {
        return Route::Forward;
    };
    let Some(sink) = sink.upgrade() else {
        return Route::Forward;
    };

    match msg.msg {
        WM_NCDESTROY => {
            unregister(hwnd);
            match sink.try_borrow_mut() {
                Ok(mut s) => s.window_destroyed(),
                Err(_) => log::warn!("{hwnd:#x} destroyed while its bridge was busy"),
            }
            Route::Forward
        }
        WM_IMEBRIDGE_WAKE => match sink.try_borrow_mut() {
            Ok(mut s) => {
                s.pump();
                Route::Handled(0)
            }
            Err(_) => Route::Busy,
        },
        WM_SETFOCUS | WM_KILLFOCUS => {
            if focus {
                match sink.try_borrow_mut() {
                    Ok(mut s) => s.focus_changed(msg.msg == WM_SETFOCUS),
                    Err(_) => log::warn!("focus change for {hwnd:#x} while bridge busy"),
                }
            }
            Route::Forward
        }
        _ if hooked => match sink.try_borrow_mut() {
            Ok(mut s) => match s.handle_message(msg) {
                HookResult::Handled(v) => Route::Handled(v),
                HookResult::PassThrough => Route::Forward,
            },
            Err(_) => {
                log::trace!("re-entrant message {:#06x}, passing through", msg.msg);
                Route::Forward
            }
        },
        _ => Route::Forward,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imebridge_core::WM_IME_STARTCOMPOSITION;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorder {
        messages: Vec<u32>,
        focus: Vec<bool>,
        pumps: usize,
        destroyed: bool,
    }

    impl MessageSink for Recorder {
        fn handle_message(&mut self, msg: RawMessage) -> HookResult {
            self.messages.push(msg.msg);
            if msg.msg == WM_IME_STARTCOMPOSITION {
                HookResult::Handled(0)
            } else {
                HookResult::PassThrough
            }
        }
        fn focus_changed(&mut self, focused: bool) {
            self.focus.push(focused);
        }
        fn pump(&mut self) {
            self.pumps += 1;
        }
        fn window_destroyed(&mut self) {
            self.destroyed = true;
        }
    }

    fn registered(hwnd: isize) -> Rc<RefCell<Recorder>> {
        let rec = Rc::new(RefCell::new(Recorder::default()));
        let sink: Rc<RefCell<dyn MessageSink>> = rec.clone();
        register(hwnd, Rc::downgrade(&sink));
        rec
    }

    fn msg(id: u32) -> RawMessage {
        RawMessage::new(id, 0, 0)
    }

    #[test]
    fn unknown_window_forwards() {
        assert_eq!(route(0x77, msg(WM_IME_STARTCOMPOSITION)), Route::Forward);
    }

    #[test]
    fn messages_reach_sink_only_while_hooked() {
        let rec = registered(0x10);
        assert_eq!(route(0x10, msg(WM_IME_STARTCOMPOSITION)), Route::Forward);

        set_hooked(0x10, true);
        assert_eq!(route(0x10, msg(WM_IME_STARTCOMPOSITION)), Route::Handled(0));
        assert_eq!(route(0x10, msg(0x0100)), Route::Forward);
        assert_eq!(rec.borrow().messages, vec![WM_IME_STARTCOMPOSITION, 0x0100]);

        set_hooked(0x10, false);
        route(0x10, msg(WM_IME_STARTCOMPOSITION));
        assert_eq!(rec.borrow().messages.len(), 2);
        assert!(unregister(0x10));
    }

    #[test]
    fn focus_is_observed_and_forwarded() {
        let rec = registered(0x20);
        assert_eq!(route(0x20, msg(WM_SETFOCUS)), Route::Forward);
        assert!(rec.borrow().focus.is_empty());

        set_focus_subscribed(0x20, true);
        assert_eq!(route(0x20, msg(WM_SETFOCUS)), Route::Forward);
        assert_eq!(route(0x20, msg(WM_KILLFOCUS)), Route::Forward);
        assert_eq!(rec.borrow().focus, vec![true, false]);
        unregister(0x20);
    }

    #[test]
    fn wake_pumps_or_reports_busy() {
        let rec = registered(0x30);
        assert_eq!(route(0x30, msg(WM_IMEBRIDGE_WAKE)), Route::Handled(0));
        assert_eq!(rec.borrow().pumps, 1);

        let _held = rec.borrow_mut();
        assert_eq!(route(0x30, msg(WM_IMEBRIDGE_WAKE)), Route::Busy);
        drop(_held);
        unregister(0x30);
    }

    #[test]
    fn busy_sink_passes_messages_through() {
        let rec = registered(0x40);
        set_hooked(0x40, true);
        let held = rec.borrow_mut();
        assert_eq!(route(0x40, msg(WM_IME_STARTCOMPOSITION)), Route::Forward);
        drop(held);
        assert!(rec.borrow().messages.is_empty());
        unregister(0x40);
    }

    #[test]
    fn dropped_sink_forwards() {
        let rec = registered(0x50);
        set_hooked(0x50, true);
        drop(rec);
        assert!(is_registered(0x50));
        assert_eq!(route(0x50, msg(WM_IME_STARTCOMPOSITION)), Route::Forward);
        unregister(0x50);
    }

    #[test]
    fn destroy_notifies_sink_and_forgets_window() {
        let rec = registered(0x60);
        assert_eq!(route(0x60, msg(WM_NCDESTROY)), Route::Forward);
        assert!(rec.borrow().destroyed);
        assert!(!is_registered(0x60));

        // nothing left to deliver to
        set_hooked(0x60, true);
        assert_eq!(route(0x60, msg(WM_IMEBRIDGE_WAKE)), Route::Forward);
        assert_eq!(rec.borrow().pumps, 0);
    }
}
