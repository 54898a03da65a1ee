//! Widget handles the core reads and drives. These stand in for the
//! page's DOM elements; hosts own them and repaint from their state.

use crate::connection::StatusUpdate;

/// The URL text input.
#[derive(Debug, Default, Clone)]
pub struct TextField {
    value: String,
}

impl TextField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn clear(&mut self) {
        self.value.clear();
    }
}

/// The volume slider: an integer clamped to a host-defined range.
#[derive(Debug, Clone)]
pub struct Slider {
    value: i64,
    min: i64,
    max: i64,
}

impl Slider {
    pub fn new(min: i64, max: i64) -> Self {
        Self { value: min, min, max }
    }

    pub fn set_value(&mut self, value: i64) {
        self.value = value.clamp(self.min, self.max);
    }

    pub fn value(&self) -> i64 {
        self.value
    }
}

impl Default for Slider {
    fn default() -> Self {
        Self::new(0, 100)
    }
}

/// The remote's control cluster: the URL input, the volume slider and
/// the six action buttons, gated by one enablement flag so they can
/// never desynchronize from each other or from the connection state.
#[derive(Debug, Default, Clone)]
pub struct ControlPanel {
    pub url_input: TextField,
    pub volume: Slider,
    enabled: bool,
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a status update into the panel.
    pub fn apply(&mut self, update: &StatusUpdate) {
        self.enabled = update.connected;
    }

    pub fn controls_enabled(&self) -> bool {
        self.enabled
    }
}
