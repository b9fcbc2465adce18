use crate::composition::TextRange;

/// Tunables for an [`ImeBridge`](crate::ImeBridge).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BridgeConfig {
    /// Device pixels added to Y for languages that want a caret margin.
    pub caret_margin: i32,
    /// Scale factor used when the host cannot report one.
    pub fallback_scale_factor: f32,
    /// Create a system caret for IMEs that read it. Disabling this leaves
    /// those IMEs at whatever position they pick on their own.
    pub emulate_system_caret: bool,
    /// Replacement range sent with commits and compositions.
    pub commit_target: TextRange,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            caret_margin: 1,
            fallback_scale_factor: 1.0,
            emulate_system_caret: true,
            commit_target: TextRange::END,
        }
    }
}

impl BridgeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn caret_margin(mut self, px: i32) -> Self {
        self.caret_margin = px;
        self
    }

    pub fn fallback_scale_factor(mut self, scale: f32) -> Self {
        self.fallback_scale_factor = scale;
        self
    }

    pub fn emulate_system_caret(mut self, on: bool) -> Self {
        self.emulate_system_caret = on;
        self
    }

    pub fn commit_target(mut self, range: TextRange) -> Self {
        self.commit_target = range;
        self
    }
}
