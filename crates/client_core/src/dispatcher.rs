use std::sync::Arc;

use shared::protocol::{actions, Command};

use crate::{
    connection::ConnectionManager,
    surface::{Slider, TextField},
};

/// Translates user gestures into wire commands and hands them to the
/// manager. Holds no state of its own; a command issued while
/// disconnected is dropped by the manager with a visible status line.
pub struct CommandDispatcher {
    manager: Arc<ConnectionManager>,
}

impl CommandDispatcher {
    pub fn new(manager: Arc<ConnectionManager>) -> Self {
        Self { manager }
    }

    /// A plain action button: previous, play, pause, next, volumeDown,
    /// volumeUp. Actions are an open set, so anything else goes
    /// through unchanged too.
    pub async fn press(&self, action: &str) {
        self.manager.send(&Command::new(action)).await;
    }

    /// The "open URL" gesture. An empty (after trimming) input is
    /// reported without generating wire traffic and left as-is.
    pub async fn open_url(&self, input: &mut TextField) {
        let url = input.value().trim().to_string();
        if url.is_empty() {
            self.manager.report("Please enter a YouTube URL").await;
            return;
        }
        self.manager
            .send(&Command::with_value(actions::OPEN, url))
            .await;
        // Cleared even when the send was rejected for being
        // disconnected; the page has always behaved this way.
        input.clear();
    }

    /// The volume slider settled on a new value.
    pub async fn set_volume(&self, slider: &Slider) {
        self.manager
            .send(&Command::with_value(actions::VOLUME, slider.value().to_string()))
            .await;
    }
}

#[cfg(test)]
#[path = "tests/dispatcher_tests.rs"]
mod tests;
