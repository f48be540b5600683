//! Frame-coherent mouse motion tracker.
//!
//! The camera turns a fixed angle per motion event in the direction of the
//! event's delta, so besides the summed delta [`MouseState`] keeps the summed
//! per-event signs.

use glam::{IVec2, Vec2};

#[derive(Debug, Clone, Default)]
pub struct MouseState {
    position: Vec2,
    delta: Vec2,
    steps: IVec2,
    cursor_in_window: bool,
}

impl MouseState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a `CursorMoved` event. Only tracks position.
    pub fn on_cursor_moved(&mut self, x: f64, y: f64) {
        self.position = Vec2::new(x as f32, y as f32);
    }

    /// Process a `DeviceEvent::MouseMotion` raw delta.
    pub fn on_raw_motion(&mut self, dx: f64, dy: f64) {
        let d = Vec2::new(dx as f32, dy as f32);
        self.delta += d;
        self.steps += IVec2::new(sign(d.x), sign(d.y));
    }

    pub fn on_cursor_entered(&mut self) {
        self.cursor_in_window = true;
    }

    pub fn on_cursor_left(&mut self) {
        self.cursor_in_window = false;
    }

    /// Last cursor position in physical pixels.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Summed raw motion since the last clear.
    #[must_use]
    pub fn delta(&self) -> Vec2 {
        self.delta
    }

    /// Summed per-event motion signs since the last clear.
    #[must_use]
    pub fn steps(&self) -> IVec2 {
        self.steps
    }

    #[must_use]
    pub fn cursor_in_window(&self) -> bool {
        self.cursor_in_window
    }

    /// Clears accumulated motion. Call once the frame consumed it.
    pub fn clear_transients(&mut self) {
        self.delta = Vec2::ZERO;
        self.steps = IVec2::ZERO;
    }
}

fn sign(v: f32) -> i32 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_motion_accumulates_delta_and_steps() {
        let mut mouse = MouseState::new();
        mouse.on_raw_motion(5.0, -2.0);
        mouse.on_raw_motion(12.0, 0.0);
        mouse.on_raw_motion(-1.0, -3.0);
        assert_eq!(mouse.delta(), Vec2::new(16.0, -5.0));
        assert_eq!(mouse.steps(), IVec2::new(1, -2));
    }

    #[test]
    fn test_clear_transients() {
        let mut mouse = MouseState::new();
        mouse.on_cursor_moved(10.0, 20.0);
        mouse.on_raw_motion(1.0, 1.0);
        mouse.clear_transients();
        assert_eq!(mouse.delta(), Vec2::ZERO);
        assert_eq!(mouse.steps(), IVec2::ZERO);
        assert_eq!(mouse.position(), Vec2::new(10.0, 20.0));
    }

    #[test]
    fn test_cursor_presence() {
        let mut mouse = MouseState::new();
        assert!(!mouse.cursor_in_window());
        mouse.on_cursor_entered();
        assert!(mouse.cursor_in_window());
        mouse.on_cursor_left();
        assert!(!mouse.cursor_in_window());
    }
}
