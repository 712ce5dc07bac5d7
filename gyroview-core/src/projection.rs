//! Camera and projection utilities

use nalgebra::{Matrix4, Point3, Vector3, Vector4};

use crate::viewport::ViewportSize;

/// Clip-space `w` below which a point counts as behind the camera
const MIN_CLIP_W: f32 = 1e-6;

/// A point projected into surface coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
    /// Normalised device depth, `-1` at the near plane and `1` at the far plane
    pub depth: f32,
}

/// Perspective camera
///
/// The projection matrix is cached and only recomputed by
/// [`Camera::update_projection`], so aspect or field-of-view changes take effect
/// once they are explicitly applied.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    /// Vertical field of view, radians
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    projection: Matrix4<f32>,
}

impl Camera {
    pub fn new(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            position: Point3::new(0.0, 0.0, 5.0),
            target: Point3::origin(),
            up: Vector3::y(),
            fov: fov_degrees.to_radians(),
            aspect,
            near,
            far,
            projection: Matrix4::identity(),
        };
        camera.update_projection();
        camera
    }

    /// Camera whose aspect ratio matches `size`
    pub fn for_size(fov_degrees: f32, size: ViewportSize, near: f32, far: f32) -> Self {
        Self::new(fov_degrees, size.aspect().unwrap_or(1.0), near, far)
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Projection matrix as of the last [`Camera::update_projection`]
    pub fn projection_matrix(&self) -> &Matrix4<f32> {
        &self.projection
    }

    /// Recompute the cached projection from fov, aspect and clip planes
    pub fn update_projection(&mut self) {
        self.projection = Matrix4::new_perspective(self.aspect, self.fov, self.near, self.far);
    }

    /// Combined projection * view matrix
    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection * self.view_matrix()
    }

    /// Project a world-space point through `view_projection` to surface coordinates.
    ///
    /// Returns `None` for points on the viewer's side of the near plane. Points
    /// outside the frustum sides are still returned; the surface clips them.
    pub fn project(
        view_projection: &Matrix4<f32>,
        point: &Point3<f32>,
        size: ViewportSize,
    ) -> Option<ScreenPoint> {
        let clip: Vector4<f32> = view_projection * point.to_homogeneous();
        if clip.z + clip.w < 0.0 {
            return None;
        }
        to_screen(&clip, size)
    }

    /// Project a segment, clipping it against the near plane.
    ///
    /// Returns `None` only when the whole segment lies on the viewer's side of
    /// the near plane.
    pub fn project_segment(
        view_projection: &Matrix4<f32>,
        from: &Point3<f32>,
        to: &Point3<f32>,
        size: ViewportSize,
    ) -> Option<(ScreenPoint, ScreenPoint)> {
        let mut a: Vector4<f32> = view_projection * from.to_homogeneous();
        let mut b: Vector4<f32> = view_projection * to.to_homogeneous();

        // Signed distance to the near plane in clip space (z >= -w is visible)
        let da = a.z + a.w;
        let db = b.z + b.w;
        if da < 0.0 && db < 0.0 {
            return None;
        }
        if da < 0.0 {
            a = a + (b - a) * (da / (da - db));
        } else if db < 0.0 {
            b = b + (a - b) * (db / (db - da));
        }

        Some((to_screen(&a, size)?, to_screen(&b, size)?))
    }
}

fn to_screen(clip: &Vector4<f32>, size: ViewportSize) -> Option<ScreenPoint> {
    if clip.w < MIN_CLIP_W {
        return None;
    }
    Some(ScreenPoint {
        x: (clip.x / clip.w + 1.0) * 0.5 * size.width as f32,
        y: (1.0 - clip.y / clip.w) * 0.5 * size.height as f32,
        depth: clip.z / clip.w,
    })
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(75.0, 800.0 / 600.0, 0.1, 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_creation() {
        let camera = Camera::for_size(75.0, ViewportSize::new(800, 600), 0.1, 1000.0);
        assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-6);
        assert!((camera.fov - 75f32.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn test_view_matrix() {
        let camera = Camera::default();
        let view = camera.view_matrix();
        assert!(view.norm() > 0.0);
    }

    #[test]
    fn test_projection_is_cached_until_updated() {
        let mut camera = Camera::default();
        let before = *camera.projection_matrix();
        camera.aspect = 2.0;
        assert_eq!(*camera.projection_matrix(), before);
        camera.update_projection();
        assert_ne!(*camera.projection_matrix(), before);
    }

    #[test]
    fn test_target_projects_to_center() {
        let mut camera = Camera::default();
        camera.position = Point3::new(0.0, 2.0, 5.0);
        let size = ViewportSize::new(800, 600);
        let p = Camera::project(&camera.view_projection(), &Point3::origin(), size).unwrap();
        assert!((p.x - 400.0).abs() < 1e-3);
        assert!((p.y - 300.0).abs() < 1e-3);
        assert!(p.depth > -1.0 && p.depth < 1.0);
    }

    #[test]
    fn test_point_behind_camera_is_rejected() {
        let camera = Camera::default();
        let size = ViewportSize::new(800, 600);
        let behind = Point3::new(0.0, 0.0, 10.0);
        assert!(Camera::project(&camera.view_projection(), &behind, size).is_none());
    }

    #[test]
    fn test_segment_crossing_near_plane_is_clipped() {
        let camera = Camera::default();
        let size = ViewportSize::new(800, 600);
        let (from, to) = Camera::project_segment(
            &camera.view_projection(),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 10.0),
            size,
        )
        .unwrap();
        assert!(from.depth > -1.0 && from.depth < 1.0);
        assert!((to.depth + 1.0).abs() < 1e-3);
    }
}
