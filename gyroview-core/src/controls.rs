//! Orbit-style camera controls.
//!
//! Pointer drags rotate the camera around its target on a sphere, wheel steps
//! dolly it in and out. Input only accumulates pending motion; nothing touches
//! the camera until [`OrbitControls::update`] runs from the draw loop. With
//! damping enabled the pending motion decays over several frames instead of
//! being consumed at once.

use std::f32::consts::{PI, TAU};

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::projection::Camera;

/// Keeps the polar angle away from the poles, where `look_at` degenerates
const POLAR_EPSILON: f32 = 1e-4;
/// Pending motion below this is treated as settled
const SETTLE_EPSILON: f32 = 1e-6;

/// Orbit control tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitConfig {
    pub rotate_speed: f32,
    /// Scale applied per wheel step
    pub zoom_scale: f32,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            rotate_speed: 1.0,
            zoom_scale: 0.95,
            enable_damping: false,
            damping_factor: 0.05,
            min_distance: 0.0,
            max_distance: f32::MAX,
        }
    }
}

/// Spherical coordinates relative to the orbit target, y up
#[derive(Debug, Clone, Copy, PartialEq)]
struct Spherical {
    radius: f32,
    /// Polar angle from +y
    phi: f32,
    /// Azimuth around +y, measured from +z
    theta: f32,
}

impl Spherical {
    fn from_offset(offset: &Vector3<f32>) -> Self {
        let radius = offset.norm();
        if radius == 0.0 {
            return Self { radius, phi: 0.0, theta: 0.0 };
        }
        Self {
            radius,
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
            theta: offset.x.atan2(offset.z),
        }
    }

    fn to_offset(self) -> Vector3<f32> {
        let sin_phi = self.phi.sin();
        Vector3::new(
            self.radius * sin_phi * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * sin_phi * self.theta.cos(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragState {
    Idle,
    Rotating,
}

/// Orbit camera controller bound to pointer input
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Point3<f32>,
    config: OrbitConfig,
    state: DragState,
    last_pointer: (f32, f32),
    /// Surface height in logical units, used to scale drag distance to angle
    surface_height: f32,
    pending_theta: f32,
    pending_phi: f32,
    pending_scale: f32,
}

impl OrbitControls {
    pub fn new(config: OrbitConfig, surface_height: u32) -> Self {
        Self {
            target: Point3::origin(),
            config,
            state: DragState::Idle,
            last_pointer: (0.0, 0.0),
            surface_height: surface_height.max(1) as f32,
            pending_theta: 0.0,
            pending_phi: 0.0,
            pending_scale: 1.0,
        }
    }

    pub fn config(&self) -> &OrbitConfig {
        &self.config
    }

    pub fn set_surface_height(&mut self, height: u32) {
        self.surface_height = height.max(1) as f32;
    }

    pub fn is_dragging(&self) -> bool {
        self.state == DragState::Rotating
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.state = DragState::Rotating;
        self.last_pointer = (x, y);
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        if self.state != DragState::Rotating {
            return;
        }
        let (dx, dy) = (x - self.last_pointer.0, y - self.last_pointer.1);
        self.last_pointer = (x, y);

        // A drag across the full surface height is one full turn
        let per_pixel = TAU * self.config.rotate_speed / self.surface_height;
        self.rotate_left(dx * per_pixel);
        self.rotate_up(dy * per_pixel);
    }

    pub fn pointer_up(&mut self) {
        self.state = DragState::Idle;
    }

    /// Orbit horizontally by `angle` radians
    pub fn rotate_left(&mut self, angle: f32) {
        self.pending_theta -= angle;
    }

    /// Orbit vertically by `angle` radians
    pub fn rotate_up(&mut self, angle: f32) {
        self.pending_phi -= angle;
    }

    /// Wheel input: positive `steps` zoom out, negative zoom in
    pub fn wheel(&mut self, steps: f32) {
        if steps == 0.0 {
            return;
        }
        let scale = self.config.zoom_scale.powf(steps.abs());
        if steps > 0.0 {
            self.pending_scale /= scale;
        } else {
            self.pending_scale *= scale;
        }
    }

    /// Apply pending motion to the camera. Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        let offset = camera.position - self.target;
        let mut spherical = Spherical::from_offset(&offset);

        let (d_theta, d_phi) = if self.config.enable_damping {
            (
                self.pending_theta * self.config.damping_factor,
                self.pending_phi * self.config.damping_factor,
            )
        } else {
            (self.pending_theta, self.pending_phi)
        };

        spherical.theta += d_theta;
        spherical.phi = (spherical.phi + d_phi).clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        // Inverted limits resolve to max_distance
        spherical.radius = (spherical.radius * self.pending_scale)
            .max(self.config.min_distance)
            .min(self.config.max_distance);

        let moved = d_theta.abs() > SETTLE_EPSILON
            || d_phi.abs() > SETTLE_EPSILON
            || (self.pending_scale - 1.0).abs() > SETTLE_EPSILON;

        if moved {
            camera.position = self.target + spherical.to_offset();
        }

        if self.config.enable_damping {
            let keep = 1.0 - self.config.damping_factor;
            self.pending_theta *= keep;
            self.pending_phi *= keep;
            if self.pending_theta.abs() < SETTLE_EPSILON {
                self.pending_theta = 0.0;
            }
            if self.pending_phi.abs() < SETTLE_EPSILON {
                self.pending_phi = 0.0;
            }
        } else {
            self.pending_theta = 0.0;
            self.pending_phi = 0.0;
        }
        self.pending_scale = 1.0;

        camera.target = self.target;
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_at(x: f32, y: f32, z: f32) -> Camera {
        let mut camera = Camera::default();
        camera.position = Point3::new(x, y, z);
        camera
    }

    #[test]
    fn test_update_without_input_keeps_camera() {
        let mut camera = camera_at(0.0, 2.0, 5.0);
        let mut controls = OrbitControls::new(OrbitConfig::default(), 600);
        assert!(!controls.update(&mut camera));
        assert!((camera.position - Point3::new(0.0, 2.0, 5.0)).norm() < 1e-6);
    }

    #[test]
    fn test_drag_orbits_at_constant_distance() {
        let mut camera = camera_at(0.0, 2.0, 5.0);
        let radius = camera.position.coords.norm();
        let mut controls = OrbitControls::new(OrbitConfig::default(), 600);

        controls.pointer_down(100.0, 100.0);
        controls.pointer_move(250.0, 130.0);
        controls.pointer_up();
        assert!(controls.update(&mut camera));

        assert!((camera.position.coords.norm() - radius).abs() < 1e-4);
        assert!(camera.position.x.abs() > 0.1);
    }

    #[test]
    fn test_move_without_press_is_ignored() {
        let mut camera = camera_at(0.0, 2.0, 5.0);
        let mut controls = OrbitControls::new(OrbitConfig::default(), 600);
        controls.pointer_move(300.0, 300.0);
        assert!(!controls.update(&mut camera));
    }

    #[test]
    fn test_polar_angle_is_clamped() {
        let mut camera = camera_at(0.0, 2.0, 5.0);
        let mut controls = OrbitControls::new(OrbitConfig::default(), 600);
        controls.rotate_up(10.0);
        controls.update(&mut camera);
        assert!(camera.position.y > 0.0);
        assert!(camera.position.coords.xz().norm() > 0.0);
    }

    #[test]
    fn test_wheel_zooms_within_limits() {
        let mut camera = camera_at(0.0, 0.0, 5.0);
        let config = OrbitConfig { min_distance: 4.0, ..OrbitConfig::default() };
        let mut controls = OrbitControls::new(config, 600);

        controls.wheel(-100.0);
        controls.update(&mut camera);
        assert!((camera.position.coords.norm() - 4.0).abs() < 1e-4);

        controls.wheel(1.0);
        controls.update(&mut camera);
        assert!((camera.position.coords.norm() - 4.0 / 0.95).abs() < 1e-3);
    }

    #[test]
    fn test_inverted_limits_do_not_panic() {
        let mut camera = camera_at(0.0, 0.0, 5.0);
        let config = OrbitConfig { min_distance: 10.0, max_distance: 1.0, ..OrbitConfig::default() };
        let mut controls = OrbitControls::new(config, 600);

        controls.wheel(1.0);
        controls.update(&mut camera);
        assert!((camera.position.coords.norm() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_damping_spreads_motion_over_frames() {
        let mut camera = camera_at(0.0, 0.0, 5.0);
        let config = OrbitConfig { enable_damping: true, ..OrbitConfig::default() };
        let mut controls = OrbitControls::new(config, 600);

        controls.rotate_left(-1.0);
        controls.update(&mut camera);
        let first = camera.position.x;
        controls.update(&mut camera);
        let second = camera.position.x;

        assert!(first > 0.0);
        assert!(second > first);
        // One frame of damping moves by factor * pending
        assert!((first - 5.0 * 0.05f32.sin()).abs() < 1e-3);
    }
}
