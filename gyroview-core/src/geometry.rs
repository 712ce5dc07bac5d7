//! Geometry primitives for 3D rendering

use nalgebra::{Point3, Vector3};

/// 24-bit RGB colour, stored as `0xRRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u32);

impl Rgb {
    pub const WHITE: Rgb = Rgb(0xffffff);
    pub const RED: Rgb = Rgb(0xff0000);
    pub const GREEN: Rgb = Rgb(0x00ff00);
    pub const BLUE: Rgb = Rgb(0x0000ff);

    pub fn channels(self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xff) as u8,
            ((self.0 >> 8) & 0xff) as u8,
            (self.0 & 0xff) as u8,
        )
    }

    /// Scale every channel by `factor`, clamped to `[0, 1]`
    pub fn shade(self, factor: f32) -> Rgb {
        let factor = factor.clamp(0.0, 1.0);
        let (r, g, b) = self.channels();
        let scale = |c: u8| ((c as f32 * factor).round() as u32).min(255);
        Rgb((scale(r) << 16) | (scale(g) << 8) | scale(b))
    }

    /// Relative luminance in `[0, 1]`
    pub fn luminance(self) -> f32 {
        let (r, g, b) = self.channels();
        (0.2126 * r as f32 + 0.7152 * g as f32 + 0.0722 * b as f32) / 255.0
    }
}

/// A 3D vertex with position and normal
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
}

impl Vertex {
    pub fn new(x: f32, y: f32, z: f32, nx: f32, ny: f32, nz: f32) -> Self {
        Self {
            position: Point3::new(x, y, z),
            normal: Vector3::new(nx, ny, nz),
        }
    }
}

/// A triangle face defined by three vertices
#[derive(Debug, Clone)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Face normal from the winding order; zero for degenerate faces
    pub fn calculate_normal(&self) -> Vector3<f32> {
        let v0 = self.vertices[0].position;
        let v1 = self.vertices[1].position;
        let v2 = self.vertices[2].position;

        let normal = (v1 - v0).cross(&(v2 - v0));
        normal.try_normalize(1e-12).unwrap_or_else(Vector3::zeros)
    }
}

/// A 3D mesh composed of triangles
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Unique triangle edges, as drawn by a wireframe material
    pub fn edges(&self) -> Vec<(Point3<f32>, Point3<f32>)> {
        let key = |p: &Point3<f32>| (p.x.to_bits(), p.y.to_bits(), p.z.to_bits());
        let mut seen = std::collections::HashSet::new();
        let mut edges = Vec::new();

        for triangle in &self.triangles {
            for i in 0..3 {
                let a = triangle.vertices[i].position;
                let b = triangle.vertices[(i + 1) % 3].position;
                let (ka, kb) = (key(&a), key(&b));
                let edge = if ka <= kb { (ka, kb) } else { (kb, ka) };
                if seen.insert(edge) {
                    edges.push((a, b));
                }
            }
        }

        edges
    }

    /// Axis-aligned cube centred on the origin
    pub fn cube(size: f32) -> Self {
        let h = size / 2.0;
        // (normal, four corners counter-clockwise seen from outside)
        let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
            ([0.0, 0.0, 1.0], [[-h, -h, h], [h, -h, h], [h, h, h], [-h, h, h]]),
            ([0.0, 0.0, -1.0], [[h, -h, -h], [-h, -h, -h], [-h, h, -h], [h, h, -h]]),
            ([0.0, 1.0, 0.0], [[-h, h, h], [h, h, h], [h, h, -h], [-h, h, -h]]),
            ([0.0, -1.0, 0.0], [[-h, -h, -h], [h, -h, -h], [h, -h, h], [-h, -h, h]]),
            ([1.0, 0.0, 0.0], [[h, -h, h], [h, -h, -h], [h, h, -h], [h, h, h]]),
            ([-1.0, 0.0, 0.0], [[-h, -h, -h], [-h, -h, h], [-h, h, h], [-h, h, -h]]),
        ];

        let mut mesh = Self::with_capacity(12);
        for ([nx, ny, nz], corners) in faces {
            let v = |c: [f32; 3]| Vertex::new(c[0], c[1], c[2], nx, ny, nz);
            mesh.add_triangle(Triangle::new(v(corners[0]), v(corners[1]), v(corners[2])));
            mesh.add_triangle(Triangle::new(v(corners[0]), v(corners[2]), v(corners[3])));
        }
        mesh
    }
}

/// A coloured line segment in world space
#[derive(Debug, Clone, Copy)]
pub struct Segment {
    pub from: Point3<f32>,
    pub to: Point3<f32>,
    pub color: Rgb,
}

/// Ground grid on the XZ plane, `size` units wide, split into `divisions` cells
pub fn grid(size: f32, divisions: u32) -> Vec<Segment> {
    const CENTER: Rgb = Rgb(0x444444);
    const LINE: Rgb = Rgb(0x888888);

    let divisions = divisions.max(1);
    let half = size / 2.0;
    let step = size / divisions as f32;
    let center = divisions / 2;

    let mut lines = Vec::with_capacity((divisions as usize + 1) * 2);
    for i in 0..=divisions {
        let k = -half + i as f32 * step;
        let color = if divisions % 2 == 0 && i == center { CENTER } else { LINE };
        lines.push(Segment {
            from: Point3::new(-half, 0.0, k),
            to: Point3::new(half, 0.0, k),
            color,
        });
        lines.push(Segment {
            from: Point3::new(k, 0.0, -half),
            to: Point3::new(k, 0.0, half),
            color,
        });
    }
    lines
}

/// Axis indicator: X red, Y green, Z blue
pub fn axes(length: f32) -> Vec<Segment> {
    let origin = Point3::origin();
    vec![
        Segment { from: origin, to: Point3::new(length, 0.0, 0.0), color: Rgb::RED },
        Segment { from: origin, to: Point3::new(0.0, length, 0.0), color: Rgb::GREEN },
        Segment { from: origin, to: Point3::new(0.0, 0.0, length), color: Rgb::BLUE },
    ]
}
