//! Viewer camera: a movable frame plus a reverse-Z perspective projection.
//!
//! Movement and rotation are applied in the camera's own frame, so "zoom in"
//! always moves along the current view direction.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};

/// Per-frame camera data shared by every pipeline (bind group 0).
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniform {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub view_proj: [[f32; 4]; 4],
    /// Inverse of projection * rotation-only view, for skybox ray directions.
    pub sky_inv_view_proj: [[f32; 4]; 4],
    /// World-space camera position, w unused.
    pub position: [f32; 4],
}

static_assertions::assert_eq_size!(CameraUniform, [u8; 272]);

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    /// Rotation as a unit quaternion.
    pub rotation: Quat,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Width / height.
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// A camera at `(0, 0, distance)` looking down -Z at the origin.
    pub fn looking_at_origin(distance: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, distance),
            ..Self::default()
        }
    }

    /// Camera-to-world transform.
    pub fn transform(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position)
    }

    /// World-to-camera transform.
    pub fn view_matrix(&self) -> Mat4 {
        self.transform().inverse()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        projection_for_aspect(self.fov_y, self.aspect_ratio, self.near, self.far)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Inverse view-projection with the translation stripped, so the sky stays
    /// at infinity.
    pub fn sky_inverse_view_projection(&self) -> Mat4 {
        let rotation_only = Mat4::from_quat(self.rotation).inverse();
        (self.projection_matrix() * rotation_only).inverse()
    }

    /// The forward direction vector (-Z in camera space).
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Moves by `offset` expressed in camera space.
    pub fn translate_local(&mut self, offset: Vec3) {
        self.position += self.rotation * offset;
    }

    /// Rotates by `angle` radians about `axis` expressed in camera space.
    pub fn rotate_local(&mut self, axis: Vec3, angle: f32) {
        self.rotation = (self.rotation * Quat::from_axis_angle(axis, angle)).normalize();
    }

    /// Recomputes the aspect ratio from a viewport size. Zero sizes are ignored.
    pub fn set_aspect_ratio(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.aspect_ratio = width / height;
        }
    }

    pub fn to_uniform(&self) -> CameraUniform {
        CameraUniform {
            view: self.view_matrix().to_cols_array_2d(),
            projection: self.projection_matrix().to_cols_array_2d(),
            view_proj: self.view_projection_matrix().to_cols_array_2d(),
            sky_inv_view_proj: self.sky_inverse_view_projection().to_cols_array_2d(),
            position: self.position.extend(1.0).to_array(),
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            fov_y: 60f32.to_radians(),
            aspect_ratio: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Reverse-Z perspective projection: near maps to depth 1, far to 0.
pub fn projection_for_aspect(fov_y: f32, aspect_ratio: f32, near: f32, far: f32) -> Mat4 {
    Mat4::perspective_rh(fov_y, aspect_ratio, far, near)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_identity_camera_looks_down_neg_z() {
        let forward = Camera::default().forward();
        assert!(forward.abs_diff_eq(Vec3::NEG_Z, 1e-6));
    }

    #[test]
    fn test_resize_projection_ignores_position() {
        let mut near_cam = Camera::looking_at_origin(20.0);
        let mut far_cam = Camera::looking_at_origin(500.0);
        far_cam.rotate_local(Vec3::Y, 0.7);
        near_cam.set_aspect_ratio(1920.0, 1080.0);
        far_cam.set_aspect_ratio(1920.0, 1080.0);
        assert_eq!(near_cam.projection_matrix(), far_cam.projection_matrix());
        assert_eq!(
            near_cam.projection_matrix(),
            projection_for_aspect(near_cam.fov_y, 16.0 / 9.0, 0.1, 1000.0)
        );
    }

    #[test]
    fn test_zero_size_resize_is_ignored() {
        let mut camera = Camera::default();
        camera.set_aspect_ratio(800.0, 0.0);
        assert!((camera.aspect_ratio - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_reverse_z_depth_range() {
        let proj = projection_for_aspect(1.0, 1.0, 0.1, 100.0);
        let near = proj * Vec4::new(0.0, 0.0, -0.1, 1.0);
        let far = proj * Vec4::new(0.0, 0.0, -100.0, 1.0);
        assert!((near.z / near.w - 1.0).abs() < 1e-4);
        assert!((far.z / far.w).abs() < 1e-4);
    }

    #[test]
    fn test_translate_local_follows_rotation() {
        let mut camera = Camera::looking_at_origin(20.0);
        camera.translate_local(Vec3::new(0.0, 0.0, -0.3));
        assert!(camera.position.abs_diff_eq(Vec3::new(0.0, 0.0, 19.7), 1e-5));

        camera.rotate_local(Vec3::Y, FRAC_PI_2);
        camera.translate_local(Vec3::new(0.0, 0.0, -1.0));
        // Facing -X after a quarter turn to the left.
        assert!(camera.position.abs_diff_eq(Vec3::new(-1.0, 0.0, 19.7), 1e-5));
    }

    #[test]
    fn test_view_matrix_inverse_is_camera_transform() {
        let camera = Camera {
            position: Vec3::new(10.0, 20.0, 30.0),
            rotation: Quat::from_rotation_y(FRAC_PI_2),
            ..Camera::default()
        };
        let reconstructed = camera.view_matrix().inverse().col(3).truncate();
        assert!((reconstructed - camera.position).length() < 1e-4);
    }

    #[test]
    fn test_sky_matrix_ignores_translation() {
        let a = Camera::looking_at_origin(20.0);
        let b = Camera::looking_at_origin(-300.0);
        assert!(
            a.sky_inverse_view_projection()
                .abs_diff_eq(b.sky_inverse_view_projection(), 1e-5)
        );
    }

    #[test]
    fn test_up_right_forward_orthonormal_after_rotation() {
        let mut camera = Camera::default();
        camera.rotate_local(Vec3::Y, 0.4);
        camera.rotate_local(Vec3::X, -0.2);
        let (f, u, r) = (camera.forward(), camera.up(), camera.right());
        for v in [f, u, r] {
            assert!((v.length() - 1.0).abs() < 1e-5);
        }
        assert!(f.dot(u).abs() < 1e-5);
        assert!(f.dot(r).abs() < 1e-5);
        assert!(u.dot(r).abs() < 1e-5);
    }

    #[test]
    fn test_uniform_carries_position() {
        let uniform = Camera::looking_at_origin(20.0).to_uniform();
        assert_eq!(uniform.position, [0.0, 0.0, 20.0, 1.0]);
    }
}
