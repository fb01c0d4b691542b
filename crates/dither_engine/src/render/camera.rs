//! # Camera
//!
//! Perspective camera described by position, target and up vector, plus the
//! [`CameraSnapshot`] the renderer compares between frames to derive the
//! camera-changed flag.
//!
//! ## Coordinate System
//! Right-handed, Y-up, looking down -Z in view space. Projection follows the
//! OpenGL clip-space convention (depth in -1..1).

use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};

/// Perspective camera
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,

    /// Point the camera is looking at in world space
    pub target: Vec3,

    /// Up vector for camera orientation
    pub up: Vec3,

    /// Vertical field of view in radians
    pub fov: f32,

    /// Aspect ratio (width / height)
    pub aspect: f32,

    /// Distance to the near clipping plane
    pub near: f32,

    /// Distance to the far clipping plane
    pub far: f32,
}

/// Matrices and position of a camera at one point in time
///
/// Two snapshots compare equal when neither the transform nor the
/// projection changed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSnapshot {
    /// World to view
    pub view: Mat4,
    /// View to clip
    pub projection: Mat4,
    /// `projection * view`
    pub view_projection: Mat4,
    /// World-space position
    pub position: Vec3,
}

impl Camera {
    /// Create a perspective camera looking at the origin
    ///
    /// # Arguments
    /// * `position` - Camera position in world space
    /// * `fov_degrees` - Vertical field of view in degrees
    /// * `aspect` - Viewport width / height
    /// * `near` - Near plane distance (must be > 0)
    /// * `far` - Far plane distance (must be > near)
    pub fn perspective(position: Vec3, fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            target: Vec3::zeros(),
            up: Vec3::new(0.0, 1.0, 0.0),
            fov: utils::deg_to_rad(fov_degrees),
            aspect,
            near,
            far,
        }
    }

    /// Move the camera, keeping target and orientation
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        log::trace!("Camera position updated to: {:?}", position);
    }

    /// Point the camera at `target` with the given up vector
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        self.target = target;
        self.up = up;
        log::trace!("Camera look_at updated - target: {:?}, up: {:?}", target, up);
    }

    /// Replace the perspective parameters
    pub fn set_perspective_projection(&mut self, fov_degrees: f32, aspect: f32, near: f32, far: f32) {
        self.fov = utils::deg_to_rad(fov_degrees);
        self.aspect = aspect;
        self.near = near;
        self.far = far;
    }

    /// World to view matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.position, self.target, self.up)
    }

    /// View to clip matrix
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective(self.fov, self.aspect, self.near, self.far)
    }

    /// Combined `projection * view`
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// World-space position recovered from the view matrix
    pub fn extract_translation(&self) -> Vec3 {
        self.view_matrix()
            .try_inverse()
            .map_or(self.position, |inverse| inverse.extract_translation())
    }

    /// Distance from the camera to a world-space point
    pub fn distance_to(&self, point: Vec3) -> f32 {
        (self.position - point).norm()
    }

    /// Capture the current matrices
    pub fn snapshot(&self) -> CameraSnapshot {
        let view = self.view_matrix();
        let projection = self.projection_matrix();
        CameraSnapshot {
            view,
            projection,
            view_projection: projection * view,
            position: self.extract_translation(),
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(Vec3::new(0.0, 3.0, 3.0), 45.0, 1.0, 0.1, 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_extract_translation_matches_position() {
        let camera = Camera::perspective(Vec3::new(-1.0, 1.0, 1.0), 60.0, 1.0, 0.1, 100.0);
        assert_relative_eq!(camera.extract_translation(), Vec3::new(-1.0, 1.0, 1.0), epsilon = 1e-5);
    }

    #[test]
    fn test_target_projects_to_screen_center() {
        let camera = Camera::perspective(Vec3::new(-1.0, 1.0, 1.0), 60.0, 1.0, 0.1, 100.0);
        let clip = camera.view_projection_matrix() * crate::foundation::math::Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(clip.x / clip.w, 0.0, epsilon = 1e-5);
        assert_relative_eq!(clip.y / clip.w, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_snapshot_detects_movement() {
        let mut camera = Camera::default();
        let before = camera.snapshot();
        assert_eq!(before, camera.snapshot());

        camera.set_position(Vec3::new(0.0, 3.0, 4.0));
        assert_ne!(before, camera.snapshot());
    }

    #[test]
    fn test_distance_to() {
        let camera = Camera::perspective(Vec3::new(0.0, 0.0, 3.0), 45.0, 1.0, 0.1, 10.0);
        assert_relative_eq!(camera.distance_to(Vec3::zeros()), 3.0);
    }
}
