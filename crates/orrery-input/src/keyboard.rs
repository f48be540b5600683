//! Frame-coherent keyboard state tracker.
//!
//! [`KeyboardState`] accumulates winit key events between two frames. Besides
//! held / just-pressed / just-released queries it counts *activations*: the
//! initial press plus every OS auto-repeat, which is what stepwise camera
//! movement consumes.
//!
//! Physical key codes are used throughout so bindings follow key position, not
//! keyboard layout.

use std::collections::{HashMap, HashSet};
use winit::event::{ElementState, KeyEvent};
use winit::keyboard::PhysicalKey;

/// Minimal description of a key event for processing.
#[derive(Debug, Clone, Copy)]
pub struct RawKeyEvent {
    /// The physical key involved.
    pub key: PhysicalKey,
    /// Whether the key was pressed or released.
    pub state: ElementState,
    /// Whether this is a repeat event.
    pub repeat: bool,
}

/// Tracks per-frame keyboard state using physical (scan-code) keys.
///
/// 1. Forward every [`KeyEvent`] to [`process_event`](Self::process_event).
/// 2. Query with [`is_pressed`](Self::is_pressed), [`just_pressed`](Self::just_pressed),
///    [`just_released`](Self::just_released) or [`activations`](Self::activations).
/// 3. Call [`clear_transients`](Self::clear_transients) after the frame consumed them.
#[derive(Debug, Clone, Default)]
pub struct KeyboardState {
    pressed: HashSet<PhysicalKey>,
    just_pressed: HashSet<PhysicalKey>,
    just_released: HashSet<PhysicalKey>,
    activations: HashMap<PhysicalKey, u32>,
}

impl KeyboardState {
    /// Creates a new `KeyboardState` with no keys pressed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Processes a winit [`KeyEvent`], updating internal state.
    pub fn process_event(&mut self, event: &KeyEvent) {
        self.process_raw(RawKeyEvent {
            key: event.physical_key,
            state: event.state,
            repeat: event.repeat,
        });
    }

    /// Processes a [`RawKeyEvent`] (platform-independent, test-friendly).
    ///
    /// Presses and repeats both count as an activation; only the initial press
    /// marks the key as just pressed.
    pub fn process_raw(&mut self, event: RawKeyEvent) {
        match event.state {
            ElementState::Pressed => {
                *self.activations.entry(event.key).or_insert(0) += 1;
                if event.repeat {
                    return;
                }
                self.pressed.insert(event.key);
                self.just_pressed.insert(event.key);
            }
            ElementState::Released => {
                self.pressed.remove(&event.key);
                self.just_released.insert(event.key);
            }
        }
    }

    /// Returns `true` while the key is held down.
    #[must_use]
    pub fn is_pressed(&self, key: PhysicalKey) -> bool {
        self.pressed.contains(&key)
    }

    /// Returns `true` only during the frame the key transitioned to pressed.
    #[must_use]
    pub fn just_pressed(&self, key: PhysicalKey) -> bool {
        self.just_pressed.contains(&key)
    }

    /// Returns `true` only during the frame the key transitioned to released.
    #[must_use]
    pub fn just_released(&self, key: PhysicalKey) -> bool {
        self.just_released.contains(&key)
    }

    /// Press and repeat events seen for `key` since the last clear.
    #[must_use]
    pub fn activations(&self, key: PhysicalKey) -> u32 {
        self.activations.get(&key).copied().unwrap_or(0)
    }

    /// Clears the per-frame sets and activation counts.
    pub fn clear_transients(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
        self.activations.clear();
    }

    /// Forgets everything, including held keys. Used on focus loss.
    pub fn reset(&mut self) {
        self.pressed.clear();
        self.clear_transients();
    }
}
