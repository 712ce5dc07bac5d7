//! The viewport controller.
//!
//! Owns the container, render surface, camera, orbit controls and scene, and
//! runs the frame/resize lifecycle:
//!
//! ```text
//! Uninitialized --initialize--> Running --teardown--> TornDown
//!                                  |                     ^
//!                             frame error                |
//!                                  v                     |
//!                               Faulted ----teardown-----+
//! ```
//!
//! Each host callback maps to one method: the display refresh calls
//! [`ViewportController::on_frame`], the resize signal calls
//! [`ViewportController::on_resize`]. Everything runs on one thread, so a
//! resize always completes before the next frame draws.

use nalgebra::Point3;

use crate::config::ViewportConfig;
use crate::controls::OrbitControls;
use crate::error::{Result, ViewportError};
use crate::frame_loop::FrameTask;
use crate::geometry::Rgb;
use crate::host::{Container, FrameHost, RenderSurface};
use crate::projection::Camera;
use crate::render::Frame;
use crate::scene::Scene;
use crate::status::{OrientationFeed, SubscriptionId};
use crate::transform::OrientationSample;

/// Width/height of the viewport in logical units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl ViewportSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `width / height`, or `None` for an empty box
    pub fn aspect(&self) -> Option<f32> {
        if self.is_empty() {
            None
        } else {
            Some(self.width as f32 / self.height as f32)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Lifecycle phase of a viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Running,
    /// A frame failed; the loop is stopped but listeners are still attached
    Faulted,
    TornDown,
}

/// What a display refresh callback did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Rendered,
    /// Callback arrived while not running, or for a request that was cancelled
    Skipped,
}

pub struct ViewportController<C, S, H: FrameHost> {
    container: C,
    surface: S,
    host: H,
    config: ViewportConfig,
    scene: Scene,
    camera: Camera,
    controls: OrbitControls,
    size: ViewportSize,
    phase: Phase,
    frame_task: FrameTask<H::FrameHandle>,
    resize_listener: Option<H::ListenerHandle>,
    orientation: OrientationFeed,
    frames_rendered: u64,
}

impl<C, S, H> ViewportController<C, S, H>
where
    C: Container,
    S: RenderSurface,
    H: FrameHost,
{
    pub fn new(container: C, surface: S, host: H, scene: Scene, config: ViewportConfig) -> Self {
        let camera = Camera::new(config.fov_degrees, 1.0, config.near, config.far);
        let controls = OrbitControls::new(config.controls, 1);
        Self {
            container,
            surface,
            host,
            config,
            scene,
            camera,
            controls,
            size: ViewportSize::default(),
            phase: Phase::Uninitialized,
            frame_task: FrameTask::new(),
            resize_listener: None,
            orientation: OrientationFeed::new(),
            frames_rendered: 0,
        }
    }

    /// Size the surface to the container, build the camera and controls,
    /// attach the resize listener and schedule the first frame.
    ///
    /// Refuses to start while the scene still waits on its model; the phase
    /// stays `Uninitialized` so the call can be retried once the asset resolves.
    pub fn initialize(&mut self) -> Result<()> {
        self.expect_phase("initialize", &[Phase::Uninitialized])?;

        if let Some(reason) = self.scene.not_ready_reason() {
            log::warn!("viewport not started: {reason}");
            return Err(ViewportError::SceneNotReady(reason));
        }

        let size = self.container.measure();
        let ratio = self
            .config
            .pixel_ratio
            .unwrap_or_else(|| self.surface.device_pixel_ratio());
        self.surface.set_pixel_ratio(ratio);
        self.surface.resize(size)?;
        self.size = size;

        self.camera = Camera::for_size(self.config.fov_degrees, size, self.config.near, self.config.far);
        self.camera.position = Point3::from(self.config.camera_position);
        self.controls = OrbitControls::new(self.config.controls, size.height);
        self.controls.update(&mut self.camera);

        let listener = self.host.attach_resize()?;
        if let Err(e) = self.frame_task.schedule(&mut self.host) {
            self.host.detach_resize(listener);
            return Err(e.into());
        }
        self.resize_listener = Some(listener);
        self.phase = Phase::Running;

        log::info!(
            "viewport running at {}x{} (pixel ratio {ratio})",
            size.width,
            size.height
        );
        Ok(())
    }

    /// One iteration of the draw loop, called on each display refresh.
    ///
    /// A failing frame moves the viewport to `Faulted` and the error is
    /// returned; no further frame is requested.
    pub fn on_frame(&mut self) -> Result<FrameOutcome> {
        let expected = self.frame_task.fire();
        if self.phase != Phase::Running || !expected {
            return Ok(FrameOutcome::Skipped);
        }

        if let Err(e) = self.draw() {
            self.fault(&e);
            return Err(e);
        }

        if let Err(e) = self.frame_task.schedule(&mut self.host) {
            let e = ViewportError::from(e);
            self.fault(&e);
            return Err(e);
        }

        Ok(FrameOutcome::Rendered)
    }

    fn draw(&mut self) -> Result<()> {
        self.scene.advance();
        self.controls.update(&mut self.camera);

        let frame = Frame::build(&self.scene, &self.camera, self.size, Rgb(self.config.clear_color));
        self.surface.draw(&frame)?;
        self.frames_rendered += 1;

        self.orientation.publish(self.scene.orientation());
        Ok(())
    }

    fn fault(&mut self, error: &ViewportError) {
        log::error!("frame failed, stopping draw loop: {error}");
        self.frame_task.cancel(&mut self.host);
        self.phase = Phase::Faulted;
    }

    /// Re-measure the container and resynchronise surface and projection.
    ///
    /// Idempotent. Outside `Running`/`Faulted` this is a no-op, since no
    /// listener is attached then.
    pub fn on_resize(&mut self) -> Result<()> {
        if !matches!(self.phase, Phase::Running | Phase::Faulted) {
            log::debug!("resize ignored while {:?}", self.phase);
            return Ok(());
        }

        let size = self.container.measure();
        self.surface.resize(size)?;
        self.size = size;

        // An empty box keeps the previous aspect rather than dividing by zero
        if let Some(aspect) = size.aspect() {
            self.camera.aspect = aspect;
        }
        self.camera.update_projection();
        self.controls.set_surface_height(size.height);

        log::debug!("viewport resized to {}x{}", size.width, size.height);
        Ok(())
    }

    /// Cancel the pending frame and detach the resize listener
    pub fn teardown(&mut self) -> Result<()> {
        self.expect_phase("tear down", &[Phase::Running, Phase::Faulted])?;

        self.frame_task.cancel(&mut self.host);
        if let Some(listener) = self.resize_listener.take() {
            self.host.detach_resize(listener);
        }
        self.phase = Phase::TornDown;

        log::info!("viewport torn down after {} frames", self.frames_rendered);
        Ok(())
    }

    fn expect_phase(&self, operation: &'static str, allowed: &[Phase]) -> Result<()> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(ViewportError::InvalidPhase {
                operation,
                phase: self.phase,
            })
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn size(&self) -> ViewportSize {
        self.size
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn controls_mut(&mut self) -> &mut OrbitControls {
        &mut self.controls
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Latest published orientation of the tracked mesh
    pub fn orientation(&self) -> Option<OrientationSample> {
        self.orientation.latest()
    }

    pub fn published_samples(&self) -> u64 {
        self.orientation.published()
    }

    pub fn subscribe_orientation(
        &mut self,
        subscriber: impl FnMut(&OrientationSample) + 'static,
    ) -> SubscriptionId {
        self.orientation.subscribe(subscriber)
    }

    pub fn unsubscribe_orientation(&mut self, id: SubscriptionId) -> bool {
        self.orientation.unsubscribe(id)
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Whether a frame request is outstanding
    pub fn frame_pending(&self) -> bool {
        self.frame_task.is_pending()
    }
}
