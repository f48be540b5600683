//! Maps resolved actions and mouse motion onto the camera and the pending
//! render settings.

use glam::{IVec2, Vec3};
use orrery_config::{CameraConfig, InputConfig};
use orrery_input::{Action, ActionState};
use orrery_render::{Camera, RenderConfig, ShadingMode};

/// Step sizes for camera movement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlSettings {
    /// Distance per key activation.
    pub move_step: f32,
    /// Radians per mouse motion event.
    pub rotate_step: f32,
    pub invert_y: bool,
}

impl ControlSettings {
    pub fn from_config(camera: &CameraConfig, input: &InputConfig) -> Self {
        Self {
            move_step: camera.move_step,
            rotate_step: camera.rotate_step * input.mouse_sensitivity,
            invert_y: input.invert_y,
        }
    }
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default(), &InputConfig::default())
    }
}

/// Requests that reach beyond the camera and render settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlOutcome {
    pub quit: bool,
    pub toggle_pause: bool,
    pub print_graph: bool,
}

/// Applies one frame of input.
///
/// Each movement activation moves the camera one step along its own axes.
/// The pan keys move the camera frame against the key's direction, so the
/// scene appears to slide the way the key points.
/// Each mouse motion event turns it `rotate_step` about its local Y
/// (horizontal motion) or local X (vertical motion).
pub fn apply(
    actions: &ActionState,
    mouse_steps: IVec2,
    settings: &ControlSettings,
    camera: &mut Camera,
    pending: &mut RenderConfig,
) -> ControlOutcome {
    let step = settings.move_step;
    let moves = [
        (Action::ZoomIn, Vec3::NEG_Z),
        (Action::ZoomOut, Vec3::Z),
        (Action::MoveLeft, Vec3::X),
        (Action::MoveRight, Vec3::NEG_X),
        (Action::MoveUp, Vec3::NEG_Y),
        (Action::MoveDown, Vec3::Y),
    ];
    for (action, direction) in moves {
        let n = actions.count(action);
        if n > 0 {
            camera.translate_local(direction * step * n as f32);
        }
    }

    if mouse_steps.x != 0 {
        camera.rotate_local(Vec3::Y, mouse_steps.x as f32 * settings.rotate_step);
    }
    if mouse_steps.y != 0 {
        let sign = if settings.invert_y { -1.0 } else { 1.0 };
        camera.rotate_local(Vec3::X, sign * mouse_steps.y as f32 * settings.rotate_step);
    }

    let post = &mut pending.post;
    if actions.fired(Action::ToggleGrayscale) {
        post.grayscale = !post.grayscale;
    }
    if actions.fired(Action::ToggleMirrorHorizontal) {
        post.mirror_horizontal = !post.mirror_horizontal;
    }
    if actions.fired(Action::ToggleMirrorVertical) {
        post.mirror_vertical = !post.mirror_vertical;
    }
    if actions.fired(Action::ToggleBlur) {
        post.blur = !post.blur;
    }
    if actions.fired(Action::ShadingStandard) {
        pending.shading = ShadingMode::Standard;
    }
    if actions.fired(Action::ShadingCel) {
        pending.shading = ShadingMode::Cel;
    }
    if actions.fired(Action::ToggleOrbits) {
        pending.orbit_rings = !pending.orbit_rings;
    }

    ControlOutcome {
        quit: actions.fired(Action::Quit),
        toggle_pause: actions.fired(Action::TogglePause),
        print_graph: actions.fired(Action::PrintSceneGraph),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orrery_input::{InputMap, KeyboardState, RawKeyEvent};
    use winit::event::ElementState;
    use winit::keyboard::{KeyCode, PhysicalKey};

    fn press(keys: &[KeyCode]) -> ActionState {
        let mut keyboard = KeyboardState::new();
        for &key in keys {
            keyboard.process_raw(RawKeyEvent {
                key: PhysicalKey::Code(key),
                state: ElementState::Pressed,
                repeat: false,
            });
        }
        InputMap::default_viewer().resolve(&keyboard)
    }

    fn run(keys: &[KeyCode], mouse: IVec2) -> (Camera, RenderConfig, ControlOutcome) {
        let mut camera = Camera::looking_at_origin(20.0);
        let mut pending = RenderConfig::default();
        let outcome = apply(
            &press(keys),
            mouse,
            &ControlSettings::default(),
            &mut camera,
            &mut pending,
        );
        (camera, pending, outcome)
    }

    #[test]
    fn test_zoom_in_moves_toward_origin() {
        let (camera, _, _) = run(&[KeyCode::KeyI], IVec2::ZERO);
        assert!((camera.position.z - 19.7).abs() < 1e-5);
    }

    #[test]
    fn test_zoom_out_moves_away() {
        let (camera, _, _) = run(&[KeyCode::KeyO], IVec2::ZERO);
        assert!((camera.position.z - 20.3).abs() < 1e-5);
    }

    #[test]
    fn test_pan_keys_move_along_local_axes() {
        let (camera, _, _) = run(&[KeyCode::KeyD, KeyCode::KeyW], IVec2::ZERO);
        assert!((camera.position.x + 0.3).abs() < 1e-5);
        assert!((camera.position.y + 0.3).abs() < 1e-5);

        let (camera, _, _) = run(&[KeyCode::KeyA, KeyCode::KeyS], IVec2::ZERO);
        assert!((camera.position.x - 0.3).abs() < 1e-5);
        assert!((camera.position.y - 0.3).abs() < 1e-5);
    }

    #[test]
    fn test_mouse_step_rotates_fixed_angle() {
        let (camera, _, _) = run(&[], IVec2::new(1, 0));
        let angle = camera.forward().angle_between(Vec3::NEG_Z);
        assert!((angle - 0.005).abs() < 1e-4, "angle {angle}");
        assert_eq!(camera.position, Vec3::new(0.0, 0.0, 20.0));
    }

    #[test]
    fn test_mouse_rotation_direction() {
        // Positive x turns about +Y: forward swings toward -X.
        let (camera, _, _) = run(&[], IVec2::new(1, 0));
        assert!(camera.forward().x < 0.0);
        // Positive y turns about +X: forward tips toward +Y.
        let (camera, _, _) = run(&[], IVec2::new(0, 1));
        assert!(camera.forward().y > 0.0);
    }

    #[test]
    fn test_post_toggles() {
        let (_, pending, _) = run(
            &[KeyCode::Digit7, KeyCode::Digit8, KeyCode::Digit9, KeyCode::Digit0],
            IVec2::ZERO,
        );
        assert!(pending.post.grayscale);
        assert!(pending.post.mirror_horizontal);
        assert!(pending.post.mirror_vertical);
        assert!(pending.post.blur);
    }

    #[test]
    fn test_shading_keys_select_mode() {
        let (_, pending, _) = run(&[KeyCode::Digit2], IVec2::ZERO);
        assert_eq!(pending.shading, ShadingMode::Cel);

        let mut camera = Camera::default();
        let mut pending = RenderConfig {
            shading: ShadingMode::Cel,
            ..Default::default()
        };
        apply(
            &press(&[KeyCode::Digit1]),
            IVec2::ZERO,
            &ControlSettings::default(),
            &mut camera,
            &mut pending,
        );
        assert_eq!(pending.shading, ShadingMode::Standard);
    }

    #[test]
    fn test_outcome_flags() {
        let (_, _, outcome) = run(&[KeyCode::KeyP, KeyCode::KeyG, KeyCode::Escape], IVec2::ZERO);
        assert_eq!(
            outcome,
            ControlOutcome {
                quit: true,
                toggle_pause: true,
                print_graph: true,
            }
        );
        let (_, _, idle) = run(&[], IVec2::ZERO);
        assert_eq!(idle, ControlOutcome::default());
    }

    #[test]
    fn test_orbit_toggle() {
        let (_, pending, _) = run(&[KeyCode::KeyR], IVec2::ZERO);
        assert!(!pending.orbit_rings);
    }
}
