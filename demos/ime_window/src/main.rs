//! Opens a window, attaches the IME bridge to it and logs what a browser
//! surface would receive. Run with `RUST_LOG=debug` to see the traffic.

#[cfg(windows)]
use imebridge_core::{BrowserHost, TextRange, Underline};

/// Stand-in for a browser surface: keeps the committed text and the
/// in-progress composition.
#[cfg(windows)]
#[derive(Default)]
struct LogBrowser {
    committed: String,
    preedit: String,
}

#[cfg(windows)]
impl BrowserHost for LogBrowser {
    fn is_available(&self) -> bool {
        true
    }

    fn commit_text(&mut self, text: &str, replacement: TextRange) {
        self.preedit.clear();
        self.committed.push_str(text);
        log::info!("commit {text:?} at {replacement:?}; text is now {:?}", self.committed);
    }

    fn set_composition(
        &mut self,
        text: &str,
        underlines: &[Underline],
        _replacement: TextRange,
        selection: TextRange,
    ) {
        self.preedit = text.to_string();
        log::info!(
            "composing {text:?}, caret {}, {} clause(s)",
            selection.from,
            underlines.len()
        );
    }

    fn finish_composing(&mut self, keep_selection: bool) {
        log::info!("finish composing (keep selection: {keep_selection})");
        self.preedit.clear();
    }

    fn send_focus(&mut self, focused: bool) {
        log::debug!("browser focus {focused}");
    }
}

#[cfg(windows)]
fn main() -> anyhow::Result<()> {
    use std::thread;
    use std::time::Duration;

    use imebridge_core::{BridgeConfig, CaretMove, Rect, Vec2};
    use imebridge_platform::{SharedBridge, SurfaceOrigin, caret_sender, desktop};
    use winit::application::ApplicationHandler;
    use winit::dpi::PhysicalSize;
    use winit::event::WindowEvent;
    use winit::event_loop::{ActiveEventLoop, EventLoop};
    use winit::window::{Window, WindowAttributes, WindowId};

    /// Browser-local caret bounds of a three character composition.
    fn caret_at(x: f32) -> CaretMove {
        CaretMove::new(
            TextRange::new(0, 3),
            (0..3)
                .map(|i| Rect::new(x + 12.0 * i as f32, 24.0, 12.0, 18.0))
                .collect(),
        )
    }

    struct App {
        window: Option<Window>,
        bridge: Option<SharedBridge<LogBrowser>>,
    }

    impl ApplicationHandler<()> for App {
        fn resumed(&mut self, el: &ActiveEventLoop) {
            if self.window.is_some() {
                return;
            }
            let win = match el.create_window(
                WindowAttributes::default()
                    .with_title("IME bridge")
                    .with_inner_size(PhysicalSize::new(640, 240)),
            ) {
                Ok(w) => w,
                Err(e) => {
                    log::error!("Failed to create window: {e:?}");
                    el.exit();
                    return;
                }
            };

            // Pretend the browser surface is inset by a small margin.
            let origin = SurfaceOrigin::new(Vec2 { x: 16.0, y: 16.0 });
            match desktop::attach_window(&win, LogBrowser::default(), origin, BridgeConfig::default())
            {
                Ok(bridge) => {
                    bridge.borrow_mut().on_routing_changed(|r| {
                        log::debug!("framework ime routing {r:?}");
                    });
                    bridge.borrow_mut().on_caret_moved(&caret_at(8.0));

                    // The renderer thread keeps reporting the caret.
                    let sender = caret_sender(&bridge);
                    thread::spawn(move || {
                        let mut x = 8.0;
                        loop {
                            thread::sleep(Duration::from_millis(500));
                            x = if x > 200.0 { 8.0 } else { x + 24.0 };
                            if let Err(e) = sender.send(caret_at(x)) {
                                log::debug!("caret reporter stopping: {e}");
                                break;
                            }
                        }
                    });
                    self.bridge = Some(bridge);
                }
                Err(e) => {
                    log::error!("Failed to attach ime bridge: {e:?}");
                    el.exit();
                }
            }
            self.window = Some(win);
        }

        fn window_event(&mut self, el: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
            if let WindowEvent::CloseRequested = event {
                log::info!("Window close requested");
                if let Some(bridge) = self.bridge.take() {
                    bridge.borrow_mut().teardown();
                }
                el.exit();
            }
        }
    }

    env_logger::init();
    let event_loop = EventLoop::new()?;
    let mut app = App {
        window: None,
        bridge: None,
    };
    event_loop.run_app(&mut app)?;
    Ok(())
}

#[cfg(not(windows))]
fn main() -> anyhow::Result<()> {
    env_logger::init();
    log::error!("the IME bridge drives IMM32 and only runs on Windows");
    Ok(())
}
