//! Scene projection into a drawable frame

use nalgebra::{Matrix4, Point3};

use crate::geometry::Rgb;
use crate::projection::{Camera, ScreenPoint};
use crate::scene::{Material, Scene};
use crate::viewport::ViewportSize;

/// Light that reaches faces turned away from the directional light
const AMBIENT: f32 = 0.2;

/// A projected primitive in surface coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Line {
        from: ScreenPoint,
        to: ScreenPoint,
        color: Rgb,
    },
    Triangle {
        points: [ScreenPoint; 3],
        color: Rgb,
    },
}

impl Primitive {
    /// Mean normalised depth, used for back-to-front ordering
    pub fn depth(&self) -> f32 {
        match self {
            Primitive::Line { from, to, .. } => (from.depth + to.depth) / 2.0,
            Primitive::Triangle { points, .. } => {
                points.iter().map(|p| p.depth).sum::<f32>() / 3.0
            }
        }
    }
}

/// One frame's worth of primitives, sorted far to near
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub size: ViewportSize,
    pub clear_color: Rgb,
    pub primitives: Vec<Primitive>,
}

impl Frame {
    pub fn build(scene: &Scene, camera: &Camera, size: ViewportSize, clear_color: Rgb) -> Self {
        let view_projection = camera.view_projection();
        let mut primitives = Vec::new();

        for segment in &scene.decorations {
            if let Some(line) = project_line(&view_projection, &segment.from, &segment.to, segment.color, size) {
                primitives.push(line);
            }
        }

        for object in &scene.objects {
            let Some(mesh) = scene.mesh_for(object) else {
                continue;
            };
            let model = object.model_matrix();
            let mvp = view_projection * model;

            match object.material {
                Material::Wireframe(color) => {
                    for (a, b) in mesh.edges() {
                        if let Some(line) = project_line(&mvp, &a, &b, color, size) {
                            primitives.push(line);
                        }
                    }
                }
                Material::Flat(base) => {
                    let light_dir = scene.light.direction();
                    let light_color = scene.light.color.luminance();
                    for triangle in &mesh.triangles {
                        // Model matrices scale uniformly, so normals transform as vectors
                        let normal = model.transform_vector(&triangle.calculate_normal());
                        let Some(normal) = normal.try_normalize(1e-12) else {
                            continue;
                        };
                        let anchor = model.transform_point(&triangle.vertices[0].position);
                        // Back-face culling
                        if normal.dot(&(camera.position - anchor)) <= 0.0 {
                            continue;
                        }

                        let diffuse = normal.dot(&light_dir).max(0.0) * scene.light.intensity * light_color;
                        let color = base.shade(AMBIENT + (1.0 - AMBIENT) * diffuse);

                        let projected = project_triangle(&mvp, triangle.vertices.map(|v| v.position), size);
                        if let Some(points) = projected {
                            primitives.push(Primitive::Triangle { points, color });
                        }
                    }
                }
            }
        }

        primitives.sort_by(|a, b| b.depth().total_cmp(&a.depth()));

        Self {
            size,
            clear_color,
            primitives,
        }
    }
}

fn project_line(
    mvp: &Matrix4<f32>,
    from: &Point3<f32>,
    to: &Point3<f32>,
    color: Rgb,
    size: ViewportSize,
) -> Option<Primitive> {
    let (from, to) = Camera::project_segment(mvp, from, to, size)?;
    Some(Primitive::Line { from, to, color })
}

fn project_triangle(mvp: &Matrix4<f32>, corners: [Point3<f32>; 3], size: ViewportSize) -> Option<[ScreenPoint; 3]> {
    Some([
        Camera::project(mvp, &corners[0], size)?,
        Camera::project(mvp, &corners[1], size)?,
        Camera::project(mvp, &corners[2], size)?,
    ])
}
