//! Camera interaction state owned by the playback controller.

use serde::{Deserialize, Serialize};

/// Mouse buttons the camera style reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

/// Held buttons and accumulated zoom while the user drives the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionState {
    left: bool,
    middle: bool,
    right: bool,
    zoom: f64,
}

impl Default for InteractionState {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl InteractionState {
    /// Creates a state with no buttons held at the given zoom level.
    pub fn new(zoom: f64) -> Self {
        Self {
            left: false,
            middle: false,
            right: false,
            zoom,
        }
    }

    /// Current camera zoom level.
    pub fn zoom_level(&self) -> f64 {
        self.zoom
    }

    /// Multiplies the zoom level; non-positive factors are ignored.
    pub fn zoom_by(&mut self, factor: f64) {
        if factor > 0.0 && factor.is_finite() {
            self.zoom *= factor;
        }
    }

    /// Records a button press.
    pub fn button_down(&mut self, button: MouseButton) {
        *self.slot(button) = true;
    }

    /// Records a button release.
    pub fn button_up(&mut self, button: MouseButton) {
        *self.slot(button) = false;
    }

    /// Returns true while `button` is held.
    pub fn is_held(&self, button: MouseButton) -> bool {
        match button {
            MouseButton::Left => self.left,
            MouseButton::Middle => self.middle,
            MouseButton::Right => self.right,
        }
    }

    /// Left button rotates the trackball camera.
    pub fn left_button_held(&self) -> bool {
        self.left
    }

    /// Returns true while any button is held.
    pub fn is_dragging(&self) -> bool {
        self.left || self.middle || self.right
    }

    fn slot(&mut self, button: MouseButton) -> &mut bool {
        match button {
            MouseButton::Left => &mut self.left,
            MouseButton::Middle => &mut self.middle,
            MouseButton::Right => &mut self.right,
        }
    }
}
