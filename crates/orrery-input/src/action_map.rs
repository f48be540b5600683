//! Action mapping: viewer actions bound to physical keys.
//!
//! [`InputMap`] defines which keys trigger which [`Action`]s and is
//! serializable to RON. [`InputMap::resolve`] turns the frame's
//! [`KeyboardState`] into an [`ActionState`].

use crate::keyboard::KeyboardState;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;
use winit::keyboard::{KeyCode, PhysicalKey};

/// Serde helper module for [`KeyCode`] which doesn't implement serde natively.
mod keycode_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use winit::keyboard::KeyCode;

    /// Serialize a [`KeyCode`] as its debug string (e.g., `"KeyW"`).
    pub fn serialize<S: Serializer>(code: &KeyCode, s: S) -> Result<S::Ok, S::Error> {
        format!("{code:?}").serialize(s)
    }

    /// Deserialize a [`KeyCode`] from its debug string.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<KeyCode, D::Error> {
        let name = String::deserialize(d)?;
        super::parse_key_code(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown key: {name}")))
    }
}

/// Parses a key name as printed by `KeyCode`'s `Debug` (e.g. `"KeyW"`, `"Digit7"`).
pub fn parse_key_code(s: &str) -> Option<KeyCode> {
    Some(match s {
        "KeyA" => KeyCode::KeyA,
        "KeyB" => KeyCode::KeyB,
        "KeyC" => KeyCode::KeyC,
        "KeyD" => KeyCode::KeyD,
        "KeyE" => KeyCode::KeyE,
        "KeyF" => KeyCode::KeyF,
        "KeyG" => KeyCode::KeyG,
        "KeyH" => KeyCode::KeyH,
        "KeyI" => KeyCode::KeyI,
        "KeyJ" => KeyCode::KeyJ,
        "KeyK" => KeyCode::KeyK,
        "KeyL" => KeyCode::KeyL,
        "KeyM" => KeyCode::KeyM,
        "KeyN" => KeyCode::KeyN,
        "KeyO" => KeyCode::KeyO,
        "KeyP" => KeyCode::KeyP,
        "KeyQ" => KeyCode::KeyQ,
        "KeyR" => KeyCode::KeyR,
        "KeyS" => KeyCode::KeyS,
        "KeyT" => KeyCode::KeyT,
        "KeyU" => KeyCode::KeyU,
        "KeyV" => KeyCode::KeyV,
        "KeyW" => KeyCode::KeyW,
        "KeyX" => KeyCode::KeyX,
        "KeyY" => KeyCode::KeyY,
        "KeyZ" => KeyCode::KeyZ,
        "Digit0" => KeyCode::Digit0,
        "Digit1" => KeyCode::Digit1,
        "Digit2" => KeyCode::Digit2,
        "Digit3" => KeyCode::Digit3,
        "Digit4" => KeyCode::Digit4,
        "Digit5" => KeyCode::Digit5,
        "Digit6" => KeyCode::Digit6,
        "Digit7" => KeyCode::Digit7,
        "Digit8" => KeyCode::Digit8,
        "Digit9" => KeyCode::Digit9,
        "Space" => KeyCode::Space,
        "Enter" => KeyCode::Enter,
        "Escape" => KeyCode::Escape,
        "Tab" => KeyCode::Tab,
        "ShiftLeft" => KeyCode::ShiftLeft,
        "ShiftRight" => KeyCode::ShiftRight,
        "ControlLeft" => KeyCode::ControlLeft,
        "ControlRight" => KeyCode::ControlRight,
        "ArrowUp" => KeyCode::ArrowUp,
        "ArrowDown" => KeyCode::ArrowDown,
        "ArrowLeft" => KeyCode::ArrowLeft,
        "ArrowRight" => KeyCode::ArrowRight,
        "F1" => KeyCode::F1,
        "F2" => KeyCode::F2,
        "F3" => KeyCode::F3,
        "F4" => KeyCode::F4,
        "F5" => KeyCode::F5,
        _ => return None,
    })
}

/// Viewer actions that can be bound to keys.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// Move the camera forward along its view axis.
    ZoomIn,
    /// Move the camera backward along its view axis.
    ZoomOut,
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    ToggleGrayscale,
    ToggleMirrorHorizontal,
    ToggleMirrorVertical,
    ToggleBlur,
    /// Switch planets to standard lit shading.
    ShadingStandard,
    /// Switch planets to cel shading.
    ShadingCel,
    ToggleOrbits,
    TogglePause,
    PrintSceneGraph,
    Quit,
}

impl Action {
    pub const ALL: [Action; 16] = [
        Action::ZoomIn,
        Action::ZoomOut,
        Action::MoveLeft,
        Action::MoveRight,
        Action::MoveUp,
        Action::MoveDown,
        Action::ToggleGrayscale,
        Action::ToggleMirrorHorizontal,
        Action::ToggleMirrorVertical,
        Action::ToggleBlur,
        Action::ShadingStandard,
        Action::ShadingCel,
        Action::ToggleOrbits,
        Action::TogglePause,
        Action::PrintSceneGraph,
        Action::Quit,
    ];

    /// Looks an action up by its variant name (e.g. `"ToggleBlur"`).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|action| format!("{action:?}") == name)
    }

    /// Whether OS key-repeat retriggers this action.
    pub fn repeats(self) -> bool {
        matches!(
            self,
            Action::ZoomIn
                | Action::ZoomOut
                | Action::MoveLeft
                | Action::MoveRight
                | Action::MoveUp
                | Action::MoveDown
        )
    }
}

/// A physical input source that can be bound to an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputBinding {
    /// A keyboard key (physical scan code).
    Key(#[serde(with = "keycode_serde")] KeyCode),
}

impl InputBinding {
    fn physical_key(self) -> PhysicalKey {
        match self {
            InputBinding::Key(code) => PhysicalKey::Code(code),
        }
    }
}

/// Two actions sharing one binding.
#[derive(Debug, Clone, PartialEq)]
pub struct Conflict {
    pub binding: InputBinding,
    pub actions: Vec<Action>,
}

/// Maps [`Action`]s to lists of [`InputBinding`]s. Any binding triggers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputMap {
    /// The binding table.
    pub bindings: HashMap<Action, Vec<InputBinding>>,
}

impl Default for InputMap {
    fn default() -> Self {
        Self::default_viewer()
    }
}

impl InputMap {
    /// Create an empty input map with no bindings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Default viewer bindings.
    ///
    /// I/O zoom, WASD pans, 7/8/9/0 toggle grayscale, horizontal mirror,
    /// vertical mirror and blur, 1/2 pick standard or cel shading.
    #[must_use]
    pub fn default_viewer() -> Self {
        let defaults = [
            (Action::ZoomIn, KeyCode::KeyI),
            (Action::ZoomOut, KeyCode::KeyO),
            (Action::MoveLeft, KeyCode::KeyA),
            (Action::MoveRight, KeyCode::KeyD),
            (Action::MoveUp, KeyCode::KeyW),
            (Action::MoveDown, KeyCode::KeyS),
            (Action::ToggleGrayscale, KeyCode::Digit7),
            (Action::ToggleMirrorHorizontal, KeyCode::Digit8),
            (Action::ToggleMirrorVertical, KeyCode::Digit9),
            (Action::ToggleBlur, KeyCode::Digit0),
            (Action::ShadingStandard, KeyCode::Digit1),
            (Action::ShadingCel, KeyCode::Digit2),
            (Action::ToggleOrbits, KeyCode::KeyR),
            (Action::TogglePause, KeyCode::KeyP),
            (Action::PrintSceneGraph, KeyCode::KeyG),
            (Action::Quit, KeyCode::Escape),
        ];
        let bindings = defaults
            .into_iter()
            .map(|(action, key)| (action, vec![InputBinding::Key(key)]))
            .collect();
        Self { bindings }
    }

    /// Default bindings with config overrides (action name -> key name) applied.
    ///
    /// Unknown action or key names are logged and skipped.
    #[must_use]
    pub fn with_overrides(overrides: &HashMap<String, String>) -> Self {
        let mut map = Self::default_viewer();
        for (action_name, key_name) in overrides {
            let Some(action) = Action::from_name(action_name) else {
                warn!("Ignoring binding for unknown action '{action_name}'");
                continue;
            };
            let Some(code) = parse_key_code(key_name) else {
                warn!("Ignoring binding {action_name} -> unknown key '{key_name}'");
                continue;
            };
            map.set_bindings(action, vec![InputBinding::Key(code)]);
        }
        for conflict in map.detect_conflicts() {
            warn!(
                "Key {:?} is bound to several actions: {:?}",
                conflict.binding, conflict.actions
            );
        }
        map
    }

    /// Set the bindings for an action, replacing any existing ones.
    pub fn set_bindings(&mut self, action: Action, bindings: Vec<InputBinding>) {
        self.bindings.insert(action, bindings);
    }

    /// Get the bindings for an action.
    #[must_use]
    pub fn get_bindings(&self, action: &Action) -> &[InputBinding] {
        self.bindings.get(action).map_or(&[], |v| v.as_slice())
    }

    /// Bindings shared by more than one action, sorted for stable output.
    #[must_use]
    pub fn detect_conflicts(&self) -> Vec<Conflict> {
        let mut by_binding: HashMap<InputBinding, Vec<Action>> = HashMap::new();
        for (action, bindings) in &self.bindings {
            for binding in bindings {
                by_binding.entry(*binding).or_default().push(*action);
            }
        }
        let mut conflicts: Vec<Conflict> = by_binding
            .into_iter()
            .filter(|(_, actions)| actions.len() > 1)
            .map(|(binding, mut actions)| {
                actions.sort_by_key(|a| format!("{a:?}"));
                Conflict { binding, actions }
            })
            .collect();
        conflicts.sort_by_key(|c| format!("{:?}", c.binding));
        conflicts
    }

    /// How often each action fired this frame.
    ///
    /// Repeating actions count every press and auto-repeat; the others count
    /// once per fresh press.
    #[must_use]
    pub fn resolve(&self, keyboard: &KeyboardState) -> ActionState {
        let mut counts = HashMap::new();
        for (action, bindings) in &self.bindings {
            let n: u32 = bindings
                .iter()
                .map(|b| {
                    let key = b.physical_key();
                    if action.repeats() {
                        keyboard.activations(key)
                    } else {
                        u32::from(keyboard.just_pressed(key))
                    }
                })
                .sum();
            if n > 0 {
                counts.insert(*action, n);
            }
        }
        ActionState { counts }
    }

    /// Serialize to RON string.
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }

    /// Deserialize from RON string.
    pub fn from_ron(s: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(s)
    }
}

/// Actions fired during one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionState {
    counts: HashMap<Action, u32>,
}

impl ActionState {
    /// Times `action` fired this frame.
    #[must_use]
    pub fn count(&self, action: Action) -> u32 {
        self.counts.get(&action).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn fired(&self, action: Action) -> bool {
        self.count(action) > 0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::RawKeyEvent;
    use winit::event::ElementState;

    fn press(kb: &mut KeyboardState, code: KeyCode, repeat: bool) {
        kb.process_raw(RawKeyEvent {
            key: PhysicalKey::Code(code),
            state: ElementState::Pressed,
            repeat,
        });
    }

    #[test]
    fn test_default_bindings_have_no_conflicts() {
        assert!(InputMap::default().detect_conflicts().is_empty());
        for action in Action::ALL {
            assert!(!InputMap::default().get_bindings(&action).is_empty(), "{action:?}");
        }
    }

    #[test]
    fn test_post_process_keys() {
        let map = InputMap::default();
        assert_eq!(
            map.get_bindings(&Action::ToggleGrayscale),
            &[InputBinding::Key(KeyCode::Digit7)]
        );
        assert_eq!(
            map.get_bindings(&Action::ToggleBlur),
            &[InputBinding::Key(KeyCode::Digit0)]
        );
    }

    #[test]
    fn test_repeat_counts_for_movement_only() {
        let map = InputMap::default();
        let mut kb = KeyboardState::new();
        press(&mut kb, KeyCode::KeyI, false);
        press(&mut kb, KeyCode::KeyI, true);
        press(&mut kb, KeyCode::KeyI, true);
        press(&mut kb, KeyCode::Digit7, false);
        press(&mut kb, KeyCode::Digit7, true);
        let state = map.resolve(&kb);
        assert_eq!(state.count(Action::ZoomIn), 3);
        assert_eq!(state.count(Action::ToggleGrayscale), 1);
        assert!(!state.fired(Action::ZoomOut));
    }

    #[test]
    fn test_nothing_pressed_resolves_empty() {
        assert!(InputMap::default().resolve(&KeyboardState::new()).is_empty());
    }

    #[test]
    fn test_overrides_replace_defaults() {
        let overrides = HashMap::from([
            ("ToggleBlur".to_string(), "KeyB".to_string()),
            ("NoSuchAction".to_string(), "KeyC".to_string()),
            ("Quit".to_string(), "NoSuchKey".to_string()),
        ]);
        let map = InputMap::with_overrides(&overrides);
        assert_eq!(
            map.get_bindings(&Action::ToggleBlur),
            &[InputBinding::Key(KeyCode::KeyB)]
        );
        assert_eq!(
            map.get_bindings(&Action::Quit),
            &[InputBinding::Key(KeyCode::Escape)]
        );
    }

    #[test]
    fn test_conflict_detection_flags_duplicates() {
        let mut map = InputMap::default();
        map.set_bindings(Action::ToggleBlur, vec![InputBinding::Key(KeyCode::KeyI)]);
        let conflicts = map.detect_conflicts();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].actions, vec![Action::ToggleBlur, Action::ZoomIn]);
    }

    #[test]
    fn test_ron_roundtrip() {
        let map = InputMap::default();
        let ron = map.to_ron().unwrap();
        assert!(ron.contains("\"KeyI\""));
        assert_eq!(InputMap::from_ron(&ron).unwrap(), map);
    }

    #[test]
    fn test_unknown_key_in_ron_is_an_error() {
        assert!(InputMap::from_ron("(bindings: {ZoomIn: [Key(\"Bogus\")]})").is_err());
    }

    #[test]
    fn test_action_from_name() {
        assert_eq!(Action::from_name("ShadingCel"), Some(Action::ShadingCel));
        assert_eq!(Action::from_name("shadingcel"), None);
    }
}
