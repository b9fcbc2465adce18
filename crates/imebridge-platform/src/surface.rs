use std::cell::Cell;
use std::rc::Rc;

use imebridge_core::Vec2;

/// Where the browser surface currently sits inside its top-level window.
///
/// Shared between the embedder (which lays the surface out) and the host
/// window adapter (which reports it to the bridge). `None` while the surface
/// is not parented.
#[derive(Clone, Debug, Default)]
pub struct SurfaceOrigin(Rc<Cell<Option<Vec2>>>);

impl SurfaceOrigin {
    pub fn new(at: Vec2) -> Self {
        Self(Rc::new(Cell::new(Some(at))))
    }

    pub fn detached() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Vec2> {
        self.0.get()
    }

    pub fn set(&self, at: Vec2) {
        self.0.set(Some(at));
    }

    pub fn clear(&self) {
        self.0.set(None);
    }
}
