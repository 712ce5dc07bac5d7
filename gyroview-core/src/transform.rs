//! 3D transformation matrices and rotation state

use nalgebra::{Matrix4, Vector3};
use serde::{Deserialize, Serialize};

/// Wrap an angle in degrees into `[0, 360)`
pub fn wrap_degrees(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid rounds tiny negative inputs up to exactly 360.0
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Rotation state around three axes, in degrees, each kept in `[0, 360)`.
///
/// Angles advance as `(angle + delta) mod 360`; radians only appear when the
/// rotation matrix is built.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RotationState {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl RotationState {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: wrap_degrees(x),
            y: wrap_degrees(y),
            z: wrap_degrees(z),
        }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Rotate by delta amounts (in degrees)
    pub fn rotate(&mut self, dx: f64, dy: f64, dz: f64) {
        self.x = wrap_degrees(self.x + dx);
        self.y = wrap_degrees(self.y + dy);
        self.z = wrap_degrees(self.z + dz);
    }

    pub fn apply(&mut self, delta: &AngularDelta) {
        self.rotate(delta.x as f64, delta.y as f64, delta.z as f64);
    }

    pub fn sample(&self) -> OrientationSample {
        OrientationSample {
            x: narrow(self.x),
            y: narrow(self.y),
            z: narrow(self.z),
        }
    }

    /// Euler angles in radians
    pub fn radians(&self) -> Vector3<f32> {
        Vector3::new(
            self.x.to_radians() as f32,
            self.y.to_radians() as f32,
            self.z.to_radians() as f32,
        )
    }
}

/// f64 degrees to f32, keeping the result below 360
fn narrow(degrees: f64) -> f32 {
    let narrowed = degrees as f32;
    if narrowed >= 360.0 {
        0.0
    } else {
        narrowed
    }
}

/// Per-frame rotation increment, in degrees per axis
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AngularDelta {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl AngularDelta {
    pub const fn degrees(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Orientation of the tracked mesh in degrees, each axis in `[0, 360)`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OrientationSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl OrientationSample {
    pub fn in_range(&self) -> bool {
        [self.x, self.y, self.z]
            .iter()
            .all(|a| (0.0..360.0).contains(a))
    }
}

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    /// Create a rotation matrix from a rotation state
    pub fn rotation_matrix(rotation: &RotationState) -> Matrix4<f32> {
        let angles = rotation.radians();
        let rx = Matrix4::new_rotation(Vector3::new(angles.x, 0.0, 0.0));
        let ry = Matrix4::new_rotation(Vector3::new(0.0, angles.y, 0.0));
        let rz = Matrix4::new_rotation(Vector3::new(0.0, 0.0, angles.z));

        // XYZ Euler order: X applied first
        rz * ry * rx
    }

    /// Create a translation matrix
    pub fn translation_matrix(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    /// Create a uniform scale matrix
    pub fn scale_matrix(scale: f32) -> Matrix4<f32> {
        Matrix4::new_scaling(scale)
    }

    /// Model matrix: scale, then rotate, then translate
    pub fn model_matrix(
        position: &Vector3<f32>,
        rotation: &RotationState,
        scale: f32,
    ) -> Matrix4<f32> {
        Self::translation_matrix(position.x, position.y, position.z)
            * Self::rotation_matrix(rotation)
            * Self::scale_matrix(scale)
    }
}
