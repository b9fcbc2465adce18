//! IMM32 and window-procedure plumbing for a real `HWND`.

use std::cell::RefCell;
use std::ffi::c_void;
use std::rc::Rc;

use anyhow::Context;
use imebridge_core::{
    BridgeConfig, BridgeError, BrowserHost, CaretMoveSender, CompositionForm, CompositionSource,
    CompositionString, HostWindow, ImeBridge, ImeContext, ImeOs, MessageSink, PlacementStyle,
    RawMessage, Vec2,
};
use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, POINT, RECT, WPARAM};
use windows::Win32::Graphics::Gdi::HBITMAP;
use windows::Win32::UI::HiDpi::GetDpiForWindow;
use windows::Win32::UI::Input::Ime::{
    CFS_POINT, CFS_RECT, COMPOSITIONFORM, GCS_COMPATTR, GCS_COMPCLAUSE, GCS_COMPSTR,
    GCS_CURSORPOS, GCS_RESULTSTR, HIMC, IME_COMPOSITION_STRING, ImmAssociateContext,
    ImmCreateContext, ImmDestroyContext, ImmGetCompositionStringW, ImmGetContext,
    ImmReleaseContext, ImmSetCompositionWindow,
};
use windows::Win32::UI::Input::KeyboardAndMouse::{GetFocus, GetKeyboardLayout, SetFocus};
use windows::Win32::UI::Shell::{DefSubclassProc, RemoveWindowSubclass, SetWindowSubclass};
use windows::Win32::UI::WindowsAndMessaging::{
    CreateCaret, DefWindowProcW, DestroyCaret, IsWindow, PostMessageW, SetCaretPos, WM_NCDESTROY,
};

use crate::registry::{self, Route, WM_IMEBRIDGE_WAKE};
use crate::surface::SurfaceOrigin;

const SUBCLASS_ID: usize = 0x1BE;
const DEFAULT_DPI: f32 = 96.0;

fn hwnd(raw: isize) -> HWND {
    HWND(raw as *mut c_void)
}

fn himc(ctx: ImeContext) -> HIMC {
    HIMC(ctx.0 as *mut c_void)
}

/// The window's current input context, released on drop.
struct InputContext {
    hwnd: HWND,
    himc: HIMC,
}

impl InputContext {
    fn get(hwnd: HWND) -> Option<Self> {
        let himc = unsafe { ImmGetContext(hwnd) };
        if himc.0.is_null() {
            None
        } else {
            Some(Self { hwnd, himc })
        }
    }

    /// Byte length of a composition string, or the value itself for
    /// `GCS_CURSORPOS`.
    fn query(&self, index: IME_COMPOSITION_STRING) -> i32 {
        unsafe { ImmGetCompositionStringW(self.himc, index, None, 0) }
    }

    fn read_bytes(&self, index: IME_COMPOSITION_STRING) -> Option<Vec<u8>> {
        let len = self.query(index);
        if len <= 0 {
            return None;
        }
        let mut buf = vec![0u8; len as usize];
        let read = unsafe {
            ImmGetCompositionStringW(
                self.himc,
                index,
                Some(buf.as_mut_ptr().cast()),
                buf.len() as u32,
            )
        };
        if read <= 0 {
            return None;
        }
        buf.truncate(read as usize);
        Some(buf)
    }
}

impl Drop for InputContext {
    fn drop(&mut self) {
        unsafe {
            let _ = ImmReleaseContext(self.hwnd, self.himc);
        }
    }
}

/// IMM32 and caret calls against one window.
#[derive(Debug)]
pub struct Win32Ime {
    hwnd: isize,
}

impl Win32Ime {
    pub fn new(hwnd: isize) -> Self {
        Self { hwnd }
    }

    fn hwnd(&self) -> HWND {
        hwnd(self.hwnd)
    }
}

impl CompositionSource for Win32Ime {
    fn composition_string(&mut self, which: CompositionString) -> Option<String> {
        let index = match which {
            CompositionString::Result => GCS_RESULTSTR,
            CompositionString::Composition => GCS_COMPSTR,
        };
        let bytes = InputContext::get(self.hwnd())?.read_bytes(index)?;
        let units = bytes
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect::<Vec<_>>();
        Some(String::from_utf16_lossy(&units))
    }

    fn composition_attributes(&mut self) -> Option<Vec<u8>> {
        InputContext::get(self.hwnd())?.read_bytes(GCS_COMPATTR)
    }

    fn composition_clauses(&mut self) -> Option<Vec<u32>> {
        let bytes = InputContext::get(self.hwnd())?.read_bytes(GCS_COMPCLAUSE)?;
        Some(
            bytes
                .chunks_exact(4)
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        )
    }

    fn composition_cursor(&mut self) -> Option<i32> {
        let pos = InputContext::get(self.hwnd())?.query(GCS_CURSORPOS);
        (pos >= 0).then_some(pos)
    }
}

impl ImeOs for Win32Ime {
    fn keyboard_layout(&self) -> isize {
        unsafe { GetKeyboardLayout(0) }.0 as isize
    }

    fn current_context(&mut self) -> ImeContext {
        InputContext::get(self.hwnd())
            .map(|c| ImeContext(c.himc.0 as isize))
            .unwrap_or_default()
    }

    fn create_context(&mut self) -> Result<ImeContext, BridgeError> {
        let ctx = unsafe { ImmCreateContext() };
        if ctx.0.is_null() {
            return Err(BridgeError::os("ImmCreateContext returned null"));
        }
        Ok(ImeContext(ctx.0 as isize))
    }

    fn associate_context(&mut self, ctx: ImeContext) {
        unsafe {
            ImmAssociateContext(self.hwnd(), himc(ctx));
        }
    }

    fn destroy_context(&mut self, ctx: ImeContext) {
        if !unsafe { ImmDestroyContext(himc(ctx)) }.as_bool() {
            log::warn!("ImmDestroyContext({:#x}) failed", ctx.0);
        }
    }

    fn create_caret(&mut self) -> Result<(), BridgeError> {
        unsafe { CreateCaret(self.hwnd(), HBITMAP::default(), 1, 1) }
            .map_err(|e| BridgeError::os(format!("CreateCaret: {e}")))
    }

    fn destroy_caret(&mut self) {
        if let Err(e) = unsafe { DestroyCaret() } {
            log::warn!("DestroyCaret: {e}");
        }
    }

    fn set_caret_pos(&mut self, x: i32, y: i32) {
        if let Err(e) = unsafe { SetCaretPos(x, y) } {
            log::debug!("SetCaretPos({x}, {y}): {e}");
        }
    }

    fn set_composition_window(&mut self, form: CompositionForm) {
        let Some(ctx) = InputContext::get(self.hwnd()) else {
            return;
        };
        let native = COMPOSITIONFORM {
            dwStyle: match form.style {
                PlacementStyle::Point => CFS_POINT,
                PlacementStyle::Rect => CFS_RECT,
            },
            ptCurrentPos: POINT {
                x: form.x,
                y: form.y,
            },
            rcArea: RECT {
                left: form.area.x,
                top: form.area.y,
                right: form.area.right(),
                bottom: form.area.bottom(),
            },
        };
        unsafe {
            let _ = ImmSetCompositionWindow(ctx.himc, &native);
        }
    }

    fn default_proc(&mut self, msg: RawMessage) -> isize {
        unsafe {
            DefWindowProcW(
                self.hwnd(),
                msg.msg,
                WPARAM(msg.wparam),
                LPARAM(msg.lparam),
            )
        }
        .0
    }
}

/// The top-level window hosting the browser surface.
#[derive(Debug)]
pub struct Win32Host {
    hwnd: isize,
    origin: SurfaceOrigin,
}

impl Win32Host {
    pub fn new(hwnd: isize, origin: SurfaceOrigin) -> Self {
        Self { hwnd, origin }
    }

    fn hwnd(&self) -> HWND {
        hwnd(self.hwnd)
    }

    /// Wake callback for [`ImeBridge::caret_sender`]: posts
    /// [`WM_IMEBRIDGE_WAKE`] to the window.
    pub fn waker(&self) -> impl Fn() + Send + Sync + use<> {
        let raw = self.hwnd;
        move || post_wake(raw)
    }
}

fn post_wake(raw: isize) {
    if let Err(e) = unsafe { PostMessageW(hwnd(raw), WM_IMEBRIDGE_WAKE, WPARAM(0), LPARAM(0)) } {
        log::warn!("could not wake {raw:#x}: {e}");
    }
}

impl HostWindow for Win32Host {
    fn install_hook(&mut self) {
        let ok = unsafe { SetWindowSubclass(self.hwnd(), Some(subclass_proc), SUBCLASS_ID, 0) };
        if ok.as_bool() {
            registry::set_hooked(self.hwnd, true);
        } else {
            log::error!("SetWindowSubclass failed for {:#x}", self.hwnd);
        }
    }

    fn remove_hook(&mut self) {
        registry::set_hooked(self.hwnd, false);
        unsafe {
            let _ = RemoveWindowSubclass(self.hwnd(), Some(subclass_proc), SUBCLASS_ID);
        }
        registry::unregister(self.hwnd);
    }

    fn subscribe_focus(&mut self) {
        registry::set_focus_subscribed(self.hwnd, true);
    }

    fn unsubscribe_focus(&mut self) {
        registry::set_focus_subscribed(self.hwnd, false);
    }

    fn request_focus(&mut self) {
        if let Err(e) = unsafe { SetFocus(self.hwnd()) } {
            log::debug!("SetFocus: {e}");
        }
    }

    fn has_focus(&self) -> bool {
        unsafe { GetFocus() } == self.hwnd()
    }

    fn surface_origin(&self) -> Option<Vec2> {
        if !unsafe { IsWindow(self.hwnd()) }.as_bool() {
            return None;
        }
        self.origin.get()
    }

    fn scale_factor(&self) -> Option<f32> {
        match unsafe { GetDpiForWindow(self.hwnd()) } {
            0 => None,
            dpi => Some(dpi as f32 / DEFAULT_DPI),
        }
    }
}

unsafe extern "system" fn subclass_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
    _id: usize,
    _data: usize,
) -> LRESULT {
    let raw = hwnd.0 as isize;
    if msg == WM_NCDESTROY {
        // Tears the bridge down, which releases any blocked caret senders.
        registry::route(raw, RawMessage::new(msg, wparam.0, lparam.0));
        unsafe {
            let _ = RemoveWindowSubclass(hwnd, Some(subclass_proc), SUBCLASS_ID);
        }
        return unsafe { DefSubclassProc(hwnd, msg, wparam, lparam) };
    }

    match registry::route(raw, RawMessage::new(msg, wparam.0, lparam.0)) {
        Route::Handled(v) => LRESULT(v),
        Route::Busy => {
            post_wake(raw);
            LRESULT(0)
        }
        Route::Forward => unsafe { DefSubclassProc(hwnd, msg, wparam, lparam) },
    }
}

pub type Win32Bridge<B> = ImeBridge<B, Win32Ime, Win32Host>;
pub type SharedBridge<B> = Rc<RefCell<Win32Bridge<B>>>;

/// Builds a bridge for `hwnd` and attaches it.
///
/// The returned handle owns the bridge; dropping the last clone tears it
/// down.
pub fn attach<B>(
    hwnd: isize,
    browser: B,
    origin: SurfaceOrigin,
    config: BridgeConfig,
) -> anyhow::Result<SharedBridge<B>>
where
    B: BrowserHost + 'static,
{
    let bridge = Rc::new(RefCell::new(ImeBridge::new(
        browser,
        Win32Ime::new(hwnd),
        Win32Host::new(hwnd, origin),
        config,
    )));
    let sink: Rc<RefCell<dyn MessageSink>> = bridge.clone();
    registry::register(hwnd, Rc::downgrade(&sink));

    let mut b = bridge.borrow_mut();
    if let Err(e) = b.setup() {
        registry::unregister(hwnd);
        return Err(e).with_context(|| format!("attaching ime bridge to {hwnd:#x}"));
    }
    // The WM_SETFOCUS from setup's focus request arrived while we held the
    // bridge.
    if b.host().has_focus() {
        b.focus_gained();
    }
    drop(b);

    log::info!("ime bridge attached to {hwnd:#x}");
    Ok(bridge)
}

/// Sender that delivers caret moves from any thread to `bridge`'s window.
pub fn caret_sender<B: BrowserHost>(bridge: &SharedBridge<B>) -> CaretMoveSender {
    let mut b = bridge.borrow_mut();
    let wake = b.host().waker();
    b.caret_sender(wake)
}
