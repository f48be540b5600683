//! Input handling: keyboard and mouse state mapped onto viewer actions through
//! configurable key bindings.

pub mod action_map;
pub mod keyboard;
pub mod mouse;

pub use action_map::{Action, ActionState, Conflict, InputBinding, InputMap, parse_key_code};
pub use keyboard::{KeyboardState, RawKeyEvent};
pub use mouse::MouseState;
