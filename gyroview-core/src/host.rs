//! Seams between the viewport controller and the environment it runs in.
//!
//! A host supplies three things: a container to measure, a surface to draw on,
//! and the scheduling signals (next display refresh, container resized). The
//! browser host backs these with a `<div>`, a `<canvas>`,
//! `requestAnimationFrame` and `window` resize events; the terminal host with
//! the terminal window and a fixed-cadence loop.

use std::fmt;

use crate::error::{HostError, SurfaceError};
use crate::render::Frame;
use crate::viewport::ViewportSize;

/// Element whose measured box sizes the viewport
pub trait Container {
    fn measure(&self) -> ViewportSize;
}

/// Drawing target owned exclusively by the controller
pub trait RenderSurface {
    /// Logical size, equal to the last size passed to [`RenderSurface::resize`]
    fn size(&self) -> ViewportSize;

    /// Physical pixels per logical unit reported by the device
    fn device_pixel_ratio(&self) -> f64;

    fn set_pixel_ratio(&mut self, ratio: f64);

    fn resize(&mut self, size: ViewportSize) -> Result<(), SurfaceError>;

    fn draw(&mut self, frame: &Frame) -> Result<(), SurfaceError>;
}

/// Display refresh and resize signals
pub trait FrameHost {
    /// Identifies one outstanding refresh request
    type FrameHandle: Copy + fmt::Debug;
    /// Identifies the attached resize listener
    type ListenerHandle: fmt::Debug;

    /// Ask for exactly one callback on the next display refresh
    fn request_frame(&mut self) -> Result<Self::FrameHandle, HostError>;

    fn cancel_frame(&mut self, handle: Self::FrameHandle);

    fn attach_resize(&mut self) -> Result<Self::ListenerHandle, HostError>;

    /// Detach the listener previously returned by [`FrameHost::attach_resize`]
    fn detach_resize(&mut self, listener: Self::ListenerHandle);
}
