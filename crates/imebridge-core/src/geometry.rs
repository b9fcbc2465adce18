/// A point or offset in browser-local (logical) pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

/// A rectangle in browser-local (logical) pixels, as reported by the browser
/// surface when its caret moves.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }
}

/// A rectangle in window device pixels, the coordinate space the IME expects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ScreenRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl ScreenRect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    /// Same rectangle shifted down by `dy` device pixels.
    pub fn offset_y(self, dy: i32) -> Self {
        Self {
            y: self.y + dy,
            ..self
        }
    }
}

/// Local-to-window transform: translate by the surface origin, then scale by
/// the device scale factor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenTransform {
    pub origin: Vec2,
    pub scale: f32,
}

impl Default for ScreenTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl ScreenTransform {
    pub fn identity() -> Self {
        Self {
            origin: Vec2::default(),
            scale: 1.0,
        }
    }

    pub fn new(origin: Vec2, scale: f32) -> Self {
        Self { origin, scale }
    }

    pub fn apply_to_rect(&self, r: Rect) -> ScreenRect {
        map_to_screen(r, self.origin, self.scale)
    }
}

/// Maps a browser-local rectangle into window device pixels.
///
/// Position is `round((local + origin) * scale)`, size is `round(size * scale)`.
pub fn map_to_screen(local: Rect, origin: Vec2, scale: f32) -> ScreenRect {
    ScreenRect {
        x: ((local.x + origin.x) * scale).round() as i32,
        y: ((local.y + origin.y) * scale).round() as i32,
        w: (local.w * scale).round() as i32,
        h: (local.h * scale).round() as i32,
    }
}
