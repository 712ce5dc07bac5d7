//! ASCII rasterizer for terminal rendering

use crossterm::{
    cursor,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    QueueableCommand,
};
use std::io::Write;
use gyroview_core::{Frame, Primitive, RenderSurface, Rgb, ScreenPoint, SurfaceError, ViewportSize};

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Terminal cells are roughly twice as tall as they are wide; logical units
/// are square, so one cell covers this many logical rows.
pub const CELL_ASPECT: u32 = 2;

/// Renders projected frames as characters, one logical column per cell
pub struct AsciiSurface<W: Write> {
    writer: W,
    logical: ViewportSize,
    pixel_ratio: f64,
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
    color_buffer: Vec<Rgb>,
    background: Rgb,
}

impl<W: Write> AsciiSurface<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            logical: ViewportSize::default(),
            pixel_ratio: 1.0,
            width: 0,
            height: 0,
            depth_buffer: Vec::new(),
            char_buffer: Vec::new(),
            color_buffer: Vec::new(),
            background: Rgb(0),
        }
    }

    /// Grid size in character cells
    pub fn cells(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<char> {
        if x < self.width && y < self.height {
            Some(self.char_buffer[y * self.width + x])
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
        self.color_buffer.fill(Rgb::WHITE);
    }

    pub fn rasterize(&mut self, frame: &Frame) {
        self.clear();
        self.background = frame.clear_color;

        for primitive in &frame.primitives {
            match primitive {
                Primitive::Line { from, to, color } => self.rasterize_line(from, to, *color),
                Primitive::Triangle { points, color } => {
                    let luminance = color.luminance();
                    let char_index = (luminance * (LUMINOSITY_RAMP.len() - 1) as f32) as usize;
                    // Keep even the darkest faces visible
                    let char_index = char_index.clamp(1, LUMINOSITY_RAMP.len() - 1);
                    self.rasterize_triangle(points, LUMINOSITY_RAMP[char_index], *color);
                }
            }
        }
    }

    /// Map logical coordinates to cell space
    fn to_cell(&self, p: &ScreenPoint) -> (f32, f32, f32) {
        (p.x, p.y / CELL_ASPECT as f32, p.depth)
    }

    fn plot(&mut self, x: i32, y: i32, depth: f32, character: char, color: Rgb) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let idx = y as usize * self.width + x as usize;
        if depth <= self.depth_buffer[idx] {
            self.depth_buffer[idx] = depth;
            self.char_buffer[idx] = character;
            self.color_buffer[idx] = color;
        }
    }

    fn rasterize_line(&mut self, from: &ScreenPoint, to: &ScreenPoint, color: Rgb) {
        let (x0, y0, d0) = self.to_cell(from);
        let (x1, y1, d1) = self.to_cell(to);
        let (dx, dy) = (x1 - x0, y1 - y0);

        let character = if dx.abs() > 2.0 * dy.abs() {
            '-'
        } else if dy.abs() > 2.0 * dx.abs() {
            '|'
        } else if (dx > 0.0) == (dy > 0.0) {
            '\\'
        } else {
            '/'
        };

        // Bound the walk to the visible area so far-off endpoints stay cheap
        let limit = (self.width + self.height) as f32 * 4.0;
        let steps = dx.abs().max(dy.abs()).ceil().min(limit).max(1.0) as usize;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let x = x0 + dx * t;
            let y = y0 + dy * t;
            let depth = d0 + (d1 - d0) * t;
            self.plot(x.floor() as i32, y.floor() as i32, depth, character, color);
        }
    }

    fn rasterize_triangle(&mut self, points: &[ScreenPoint; 3], character: char, color: Rgb) {
        let v0 = self.to_cell(&points[0]);
        let v1 = self.to_cell(&points[1]);
        let v2 = self.to_cell(&points[2]);

        // Bounding box
        let min_x = v0.0.min(v1.0).min(v2.0).floor() as i32;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i32;
        let min_y = v0.1.min(v1.1).min(v2.1).floor() as i32;
        let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                if let Some((w0, w1, w2)) = barycentric(
                    (v0.0, v0.1),
                    (v1.0, v1.1),
                    (v2.0, v2.1),
                    (px, py),
                ) {
                    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                        let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                        self.plot(x, y, depth, character, color);
                    }
                }
            }
        }
    }

    /// Write the character grid to the terminal, starting at the top-left cell
    pub fn present(&mut self) -> std::io::Result<()> {
        let (br, bg, bb) = self.background.channels();
        self.writer.queue(cursor::MoveTo(0, 0))?;
        self.writer.queue(SetBackgroundColor(Color::Rgb { r: br, g: bg, b: bb }))?;

        for y in 0..self.height {
            self.writer.queue(cursor::MoveTo(0, y as u16))?;
            for x in 0..self.width {
                let idx = y * self.width + x;
                let (r, g, b) = self.color_buffer[idx].channels();
                self.writer.queue(SetForegroundColor(Color::Rgb { r, g, b }))?;
                self.writer.queue(Print(self.char_buffer[idx]))?;
            }
        }
        self.writer.queue(ResetColor)?;
        self.writer.flush()
    }

    /// Ratio requested by the viewport; cells have no sub-pixel resolution
    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }
}

impl<W: Write> RenderSurface for AsciiSurface<W> {
    fn size(&self) -> ViewportSize {
        self.logical
    }

    fn device_pixel_ratio(&self) -> f64 {
        1.0
    }

    fn set_pixel_ratio(&mut self, ratio: f64) {
        self.pixel_ratio = ratio;
    }

    fn resize(&mut self, size: ViewportSize) -> Result<(), SurfaceError> {
        self.logical = size;
        self.width = size.width as usize;
        self.height = size.height.div_ceil(CELL_ASPECT) as usize;

        let cells = self.width * self.height;
        self.depth_buffer = vec![f32::INFINITY; cells];
        self.char_buffer = vec![' '; cells];
        self.color_buffer = vec![Rgb::WHITE; cells];
        Ok(())
    }

    fn draw(&mut self, frame: &Frame) -> Result<(), SurfaceError> {
        self.rasterize(frame);
        self.present().map_err(|e| SurfaceError(e.to_string()))
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: f32, y: f32, depth: f32) -> ScreenPoint {
        ScreenPoint { x, y, depth }
    }

    fn surface(width: u32, height: u32) -> AsciiSurface<Vec<u8>> {
        let mut surface = AsciiSurface::new(Vec::new());
        surface.resize(ViewportSize::new(width, height)).unwrap();
        surface
    }

    fn frame(size: ViewportSize, primitives: Vec<Primitive>) -> Frame {
        Frame { size, clear_color: Rgb(0x87ceeb), primitives }
    }

    #[test]
    fn test_resize_halves_rows() {
        let surface = surface(80, 47);
        assert_eq!(surface.cells(), (80, 24));
        assert_eq!(surface.size(), ViewportSize::new(80, 47));
    }

    #[test]
    fn test_horizontal_line() {
        let mut s = surface(20, 20);
        let size = s.size();
        s.rasterize(&frame(
            size,
            vec![Primitive::Line { from: point(2.0, 8.0, 0.0), to: point(12.0, 8.0, 0.0), color: Rgb::RED }],
        ));
        assert_eq!(s.cell(2, 4), Some('-'));
        assert_eq!(s.cell(12, 4), Some('-'));
        assert_eq!(s.cell(13, 4), Some(' '));
    }

    #[test]
    fn test_nearer_primitive_wins() {
        let mut s = surface(20, 20);
        let size = s.size();
        let tri = |depth: f32, color: Rgb| Primitive::Triangle {
            points: [point(0.0, 0.0, depth), point(20.0, 0.0, depth), point(0.0, 20.0, depth)],
            color,
        };
        s.rasterize(&frame(size, vec![tri(0.5, Rgb(0x202020)), tri(0.2, Rgb::WHITE)]));
        assert_eq!(s.cell(1, 1), Some('@'));
    }

    #[test]
    fn test_draw_writes_output() {
        let mut s = surface(4, 4);
        let size = s.size();
        s.draw(&frame(size, Vec::new())).unwrap();
        assert!(!s.writer().is_empty());
    }
}
