//! Canvas 2D render surface

use gyroview_core::{Frame, Primitive, RenderSurface, Rgb, SurfaceError, ViewportSize};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

/// CSS hex colour for a packed RGB value
pub fn css_color(color: Rgb) -> String {
    format!("#{:06x}", color.0 & 0x00ff_ffff)
}

/// Backing store size in physical pixels
pub fn backing_size(size: ViewportSize, ratio: f64) -> (u32, u32) {
    (
        (size.width as f64 * ratio).round() as u32,
        (size.height as f64 * ratio).round() as u32,
    )
}

pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
    size: ViewportSize,
    pixel_ratio: f64,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let context = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self {
            canvas,
            context,
            size: ViewportSize::default(),
            pixel_ratio: 1.0,
        })
    }
}

fn js_error(context: &str, err: JsValue) -> SurfaceError {
    SurfaceError(format!("{context}: {err:?}"))
}

impl RenderSurface for CanvasSurface {
    fn size(&self) -> ViewportSize {
        self.size
    }

    fn device_pixel_ratio(&self) -> f64 {
        web_sys::window().map_or(1.0, |w| w.device_pixel_ratio())
    }

    fn set_pixel_ratio(&mut self, ratio: f64) {
        self.pixel_ratio = ratio;
    }

    fn resize(&mut self, size: ViewportSize) -> Result<(), SurfaceError> {
        let (width, height) = backing_size(size, self.pixel_ratio);
        self.canvas.set_width(width);
        self.canvas.set_height(height);

        let style = self.canvas.style();
        style
            .set_property("width", &format!("{}px", size.width))
            .map_err(|e| js_error("canvas width", e))?;
        style
            .set_property("height", &format!("{}px", size.height))
            .map_err(|e| js_error("canvas height", e))?;

        // Resizing the backing store resets the transform
        let ratio = self.pixel_ratio;
        self.context
            .set_transform(ratio, 0.0, 0.0, ratio, 0.0, 0.0)
            .map_err(|e| js_error("set_transform", e))?;

        self.size = size;
        Ok(())
    }

    fn draw(&mut self, frame: &Frame) -> Result<(), SurfaceError> {
        let ctx = &self.context;
        ctx.set_fill_style_str(&css_color(frame.clear_color));
        ctx.fill_rect(0.0, 0.0, frame.size.width as f64, frame.size.height as f64);
        ctx.set_line_width(1.0);

        for primitive in &frame.primitives {
            match primitive {
                Primitive::Line { from, to, color } => {
                    ctx.begin_path();
                    ctx.move_to(from.x as f64, from.y as f64);
                    ctx.line_to(to.x as f64, to.y as f64);
                    ctx.set_stroke_style_str(&css_color(*color));
                    ctx.stroke();
                }
                Primitive::Triangle { points, color } => {
                    let [a, b, c] = points;
                    let fill = css_color(*color);
                    ctx.begin_path();
                    ctx.move_to(a.x as f64, a.y as f64);
                    ctx.line_to(b.x as f64, b.y as f64);
                    ctx.line_to(c.x as f64, c.y as f64);
                    ctx.close_path();
                    ctx.set_fill_style_str(&fill);
                    ctx.fill();
                    // Hairline seams between adjacent faces
                    ctx.set_stroke_style_str(&fill);
                    ctx.stroke();
                }
            }
        }
        Ok(())
    }
}
