//! Scripted camera flight

use dither_engine::foundation::math::{utils, Vec3};
use dither_engine::render::Camera;

/// Moves a camera along a closed path of waypoints, always facing `target`
#[derive(Debug, Clone)]
pub struct FlybyController {
    waypoints: Vec<Vec3>,
    target: Vec3,
    frames_per_segment: u32,
    frame: u32,
}

impl FlybyController {
    /// Create a controller; the path loops back to the first waypoint
    pub fn new(waypoints: Vec<Vec3>, target: Vec3, frames_per_segment: u32) -> Self {
        Self {
            waypoints,
            target,
            frames_per_segment: frames_per_segment.max(1),
            frame: 0,
        }
    }

    /// Start far from the flag, sweep in close, and pull back out
    pub fn demo_path(start: Vec3, target: Vec3) -> Self {
        Self::new(
            vec![
                start,
                Vec3::new(-4.0, 2.0, 4.0),
                Vec3::new(1.5, 1.0, 3.0),
                Vec3::new(0.5, 0.5, 0.8),
            ],
            target,
            30,
        )
    }

    /// Position on the path at the current frame
    pub fn position(&self) -> Vec3 {
        match self.waypoints.len() {
            0 => self.target,
            1 => self.waypoints[0],
            len => {
                let segment = (self.frame / self.frames_per_segment) as usize % len;
                let t = (self.frame % self.frames_per_segment) as f32 / self.frames_per_segment as f32;
                let from = self.waypoints[segment];
                let to = self.waypoints[(segment + 1) % len];
                Vec3::new(
                    utils::lerp(from.x, to.x, t),
                    utils::lerp(from.y, to.y, t),
                    utils::lerp(from.z, to.z, t),
                )
            }
        }
    }

    /// Place `camera` for this frame and advance
    pub fn update(&mut self, camera: &mut Camera) {
        camera.set_position(self.position());
        camera.look_at(self.target, Vec3::new(0.0, 1.0, 0.0));
        self.frame = self.frame.wrapping_add(1);
    }
}
