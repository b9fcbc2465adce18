//! Synchronous hand-off of browser caret moves onto the message thread.
//!
//! The browser reports caret moves from its own rendering thread. Those
//! updates are queued here and applied by the thread that owns the bridge;
//! the sender blocks until its update has been applied (or dropped).

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use parking_lot::{Condvar, Mutex};

use crate::composition::TextRange;
use crate::error::BridgeError;
use crate::geometry::Rect;

/// The browser's caret moved: new composition range and the browser-local
/// bounds of each character in it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CaretMove {
    pub range: TextRange,
    pub bounds: Vec<Rect>,
    /// Device scale factor known to the browser, if any.
    pub scale_factor: Option<f32>,
}

impl CaretMove {
    pub fn new(range: TextRange, bounds: Vec<Rect>) -> Self {
        Self {
            range,
            bounds,
            scale_factor: None,
        }
    }

    pub fn with_scale_factor(mut self, scale: f32) -> Self {
        self.scale_factor = Some(scale);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AckState {
    Waiting,
    Applied,
    Dropped,
}

struct Ack {
    state: Mutex<AckState>,
    cv: Condvar,
}

impl Ack {
    fn new() -> Self {
        Self {
            state: Mutex::new(AckState::Waiting),
            cv: Condvar::new(),
        }
    }

    fn settle(&self, to: AckState) {
        let mut st = self.state.lock();
        if *st == AckState::Waiting {
            *st = to;
            self.cv.notify_all();
        }
    }

    fn wait(&self) -> Result<(), BridgeError> {
        let mut st = self.state.lock();
        while *st == AckState::Waiting {
            self.cv.wait(&mut st);
        }
        match *st {
            AckState::Applied => Ok(()),
            AckState::Waiting | AckState::Dropped => Err(BridgeError::Disconnected),
        }
    }
}

/// A queued update. Dropping it without [`complete`](Pending::complete)
/// releases the sender with [`BridgeError::Disconnected`].
pub(crate) struct Pending {
    pub(crate) update: CaretMove,
    ack: Arc<Ack>,
}

impl Pending {
    pub(crate) fn complete(self) {
        self.ack.settle(AckState::Applied);
    }
}

impl Drop for Pending {
    fn drop(&mut self) {
        self.ack.settle(AckState::Dropped);
    }
}

#[derive(Default)]
struct InboxState {
    pending: VecDeque<Pending>,
    closed: bool,
}

#[derive(Default)]
struct Inbox {
    state: Mutex<InboxState>,
}

type Wake = Arc<dyn Fn() + Send + Sync>;

/// Cloneable, thread-safe handle for delivering caret moves to a bridge.
#[derive(Clone)]
pub struct CaretMoveSender {
    inbox: Arc<Inbox>,
    wake: Wake,
    ui_thread: ThreadId,
}

impl std::fmt::Debug for CaretMoveSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaretMoveSender")
            .field("ui_thread", &self.ui_thread)
            .finish_non_exhaustive()
    }
}

impl CaretMoveSender {
    /// Queues `update`, wakes the message thread, and blocks until the bridge
    /// has applied it.
    ///
    /// # Errors
    ///
    /// [`BridgeError::OnUiThread`] when called from the message thread itself
    /// (which would deadlock; call the bridge directly there), and
    /// [`BridgeError::Disconnected`] when the bridge is gone or dropped the
    /// update.
    pub fn send(&self, update: CaretMove) -> Result<(), BridgeError> {
        if thread::current().id() == self.ui_thread {
            return Err(BridgeError::OnUiThread);
        }
        let ack = Arc::new(Ack::new());
        {
            let mut inbox = self.inbox.state.lock();
            if inbox.closed {
                return Err(BridgeError::Disconnected);
            }
            inbox.pending.push_back(Pending {
                update,
                ack: ack.clone(),
            });
        }
        (self.wake)();
        ack.wait()
    }
}

/// Message-thread end of the hand-off, owned by the bridge.
pub(crate) struct CaretMoveReceiver {
    inbox: Arc<Inbox>,
    ui_thread: ThreadId,
}

impl CaretMoveReceiver {
    /// Binds the receiver to the calling thread.
    pub(crate) fn new() -> Self {
        Self {
            inbox: Arc::new(Inbox::default()),
            ui_thread: thread::current().id(),
        }
    }

    pub(crate) fn sender(&self, wake: Wake) -> CaretMoveSender {
        CaretMoveSender {
            inbox: self.inbox.clone(),
            wake,
            ui_thread: self.ui_thread,
        }
    }

    pub(crate) fn drain(&self) -> Vec<Pending> {
        self.inbox.state.lock().pending.drain(..).collect()
    }

    /// Refuses further updates and releases anyone still waiting.
    pub(crate) fn close(&self) {
        let dropped: Vec<Pending> = {
            let mut inbox = self.inbox.state.lock();
            inbox.closed = true;
            inbox.pending.drain(..).collect()
        };
        if !dropped.is_empty() {
            log::warn!("dropping {} caret update(s) on close", dropped.len());
        }
    }
}

impl Drop for CaretMoveReceiver {
    fn drop(&mut self) {
        self.close();
    }
}
