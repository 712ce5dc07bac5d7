use std::cell::{Cell, RefCell};
use std::rc::Rc;

use nalgebra::Point3;

use gyroview_core::status::{status_line, stopped_line};
use gyroview_core::{
    AssetSource, AssetState, Container, Frame, FrameHost, FrameOutcome, HostError, Mesh, Phase,
    RenderSurface, Scene, SceneVariant, SurfaceError, ViewportConfig, ViewportController,
    ViewportError, ViewportSize,
};

#[derive(Clone)]
struct SharedBox(Rc<Cell<ViewportSize>>);

impl Container for SharedBox {
    fn measure(&self) -> ViewportSize {
        self.0.get()
    }
}

#[derive(Default)]
struct RecordingSurface {
    size: ViewportSize,
    ratio: f64,
    draws: u32,
    fail_draws: Rc<Cell<bool>>,
}

impl RenderSurface for RecordingSurface {
    fn size(&self) -> ViewportSize {
        self.size
    }

    fn device_pixel_ratio(&self) -> f64 {
        2.0
    }

    fn set_pixel_ratio(&mut self, ratio: f64) {
        self.ratio = ratio;
    }

    fn resize(&mut self, size: ViewportSize) -> Result<(), SurfaceError> {
        self.size = size;
        Ok(())
    }

    fn draw(&mut self, frame: &Frame) -> Result<(), SurfaceError> {
        if self.fail_draws.get() {
            return Err(SurfaceError("context lost".into()));
        }
        assert_eq!(frame.size, self.size);
        self.draws += 1;
        Ok(())
    }
}

#[derive(Default)]
struct RecordingHost {
    next_id: u32,
    outstanding: Option<u32>,
    requests: u32,
    cancelled: Vec<u32>,
    attached: Vec<u32>,
    detached: Vec<u32>,
}

impl FrameHost for RecordingHost {
    type FrameHandle = u32;
    type ListenerHandle = u32;

    fn request_frame(&mut self) -> Result<u32, HostError> {
        assert!(self.outstanding.is_none(), "more than one frame request outstanding");
        self.next_id += 1;
        self.requests += 1;
        self.outstanding = Some(self.next_id);
        Ok(self.next_id)
    }

    fn cancel_frame(&mut self, handle: u32) {
        if self.outstanding == Some(handle) {
            self.outstanding = None;
        }
        self.cancelled.push(handle);
    }

    fn attach_resize(&mut self) -> Result<u32, HostError> {
        self.next_id += 1;
        self.attached.push(self.next_id);
        Ok(self.next_id)
    }

    fn detach_resize(&mut self, listener: u32) {
        self.detached.push(listener);
    }
}

type TestViewport = ViewportController<SharedBox, RecordingSurface, RecordingHost>;

struct Harness {
    viewport: TestViewport,
    container: Rc<Cell<ViewportSize>>,
    fail_draws: Rc<Cell<bool>>,
}

impl Harness {
    fn new(config: ViewportConfig, asset: AssetState, width: u32, height: u32) -> Self {
        let container = Rc::new(Cell::new(ViewportSize::new(width, height)));
        let surface = RecordingSurface::default();
        let fail_draws = Rc::clone(&surface.fail_draws);
        let scene = Scene::build(&config.scene, asset);
        let viewport = ViewportController::new(
            SharedBox(Rc::clone(&container)),
            surface,
            RecordingHost::default(),
            scene,
            config,
        );
        Self {
            viewport,
            container,
            fail_draws,
        }
    }

    fn cube(width: u32, height: u32) -> Self {
        Self::new(ViewportConfig::default(), AssetState::Pending, width, height)
    }

    /// Simulate one display refresh, delivering the outstanding request
    fn refresh(&mut self) -> Result<FrameOutcome, ViewportError> {
        self.viewport.host_mut().outstanding.take();
        self.viewport.on_frame()
    }

    fn set_container(&self, width: u32, height: u32) {
        self.container.set(ViewportSize::new(width, height));
    }
}

fn model_config(variant: SceneVariant) -> ViewportConfig {
    let mut config = ViewportConfig::default();
    config.scene.variant = variant;
    config.scene.model = Some(AssetSource::Path("monkey.stl".into()));
    config
}

#[test]
fn initialize_sizes_surface_and_camera() {
    let mut h = Harness::cube(800, 600);
    h.viewport.initialize().unwrap();

    assert_eq!(h.viewport.phase(), Phase::Running);
    assert_eq!(h.viewport.surface().size(), ViewportSize::new(800, 600));
    assert_eq!(h.viewport.surface().ratio, 2.0);
    let camera = h.viewport.camera();
    assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-6);
    assert!((camera.fov - 75f32.to_radians()).abs() < 1e-6);
    assert_eq!(camera.near, 0.1);
    assert_eq!(camera.far, 1000.0);
    assert!((camera.position - Point3::new(0.0, 2.0, 5.0)).norm() < 1e-5);
    assert!(h.viewport.frame_pending());
    assert_eq!(h.viewport.host().attached.len(), 1);
}

#[test]
fn one_tick_publishes_one_degree() {
    let mut h = Harness::cube(800, 600);
    let texts = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&texts);
    h.viewport
        .subscribe_orientation(move |s| sink.borrow_mut().push(status_line(s)));

    h.viewport.initialize().unwrap();
    assert_eq!(h.refresh().unwrap(), FrameOutcome::Rendered);

    assert_eq!(*texts.borrow(), vec!["Rotation (x:1.00, y:0.00, z:0.00)".to_string()]);
    assert_eq!(h.viewport.surface().draws, 1);
    assert_eq!(h.viewport.frames_rendered(), 1);
    assert!(h.viewport.frame_pending());
}

#[test]
fn model_variant_tracks_model_deltas() {
    let asset = AssetState::Ready(Rc::new(Mesh::cube(1.0)));
    let mut h = Harness::new(model_config(SceneVariant::Model), asset, 800, 600);
    h.viewport.initialize().unwrap();
    h.refresh().unwrap();

    let sample = h.viewport.orientation().unwrap();
    assert_eq!(sample.to_string(), "(x:2.00, y:1.00, z:0.00)");
}

#[test]
fn full_turn_of_cube_reads_zero() {
    let mut h = Harness::cube(800, 600);
    h.viewport.initialize().unwrap();
    for _ in 0..360 {
        h.refresh().unwrap();
    }
    let sample = h.viewport.orientation().unwrap();
    assert_eq!(status_line(&sample), "Rotation (x:0.00, y:0.00, z:0.00)");
}

#[test]
fn orientation_follows_modular_law_over_many_frames() {
    let asset = AssetState::Ready(Rc::new(Mesh::cube(1.0)));
    let mut h = Harness::new(model_config(SceneVariant::Forest), asset, 640, 480);
    let texts = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&texts);
    h.viewport.subscribe_orientation(move |s| {
        assert!(s.in_range());
        sink.borrow_mut().push(s.to_string());
    });

    h.viewport.initialize().unwrap();
    for _ in 0..1000 {
        h.refresh().unwrap();
    }
    assert_eq!(h.viewport.published_samples(), 1000);

    for (i, text) in texts.borrow().iter().enumerate() {
        let n = i as u32 + 1;
        let expected = format!("(x:{}.00, y:{}.00, z:0.00)", (2 * n) % 360, n % 360);
        assert_eq!(*text, expected);
    }
}

#[test]
fn resize_matches_container_and_aspect() {
    let mut h = Harness::cube(800, 600);
    h.viewport.initialize().unwrap();

    for (w, h_px) in [(1, 1), (400, 300), (1920, 1080), (333, 777)] {
        h.set_container(w, h_px);
        h.viewport.on_resize().unwrap();
        assert_eq!(h.viewport.surface().size(), ViewportSize::new(w, h_px));
        assert_eq!(h.viewport.size(), ViewportSize::new(w, h_px));
        assert!((h.viewport.camera().aspect - w as f32 / h_px as f32).abs() < 1e-6);
    }
}

#[test]
fn resize_is_idempotent() {
    let mut h = Harness::cube(800, 600);
    h.viewport.initialize().unwrap();
    h.set_container(1024, 768);

    h.viewport.on_resize().unwrap();
    let size = h.viewport.surface().size();
    let projection = *h.viewport.camera().projection_matrix();

    h.viewport.on_resize().unwrap();
    assert_eq!(h.viewport.surface().size(), size);
    assert_eq!(*h.viewport.camera().projection_matrix(), projection);
}

#[test]
fn resize_mid_run_applies_before_next_frame() {
    let mut h = Harness::cube(800, 600);
    h.viewport.initialize().unwrap();
    h.refresh().unwrap();

    h.set_container(400, 300);
    h.viewport.on_resize().unwrap();
    h.refresh().unwrap();

    assert!((h.viewport.camera().aspect - 400.0 / 300.0).abs() < 1e-6);
    assert_eq!(h.viewport.surface().draws, 2);
}

#[test]
fn teardown_stops_draws_and_publications() {
    let mut h = Harness::cube(800, 600);
    h.viewport.initialize().unwrap();
    h.refresh().unwrap();
    h.refresh().unwrap();

    h.viewport.teardown().unwrap();
    assert_eq!(h.viewport.phase(), Phase::TornDown);
    assert!(!h.viewport.frame_pending());
    assert!(h.viewport.host().outstanding.is_none());
    assert_eq!(h.viewport.host().cancelled.len(), 1);

    let (draws, published, requests) = (
        h.viewport.surface().draws,
        h.viewport.published_samples(),
        h.viewport.host().requests,
    );
    for _ in 0..50 {
        assert_eq!(h.refresh().unwrap(), FrameOutcome::Skipped);
    }
    assert_eq!(h.viewport.surface().draws, draws);
    assert_eq!(h.viewport.published_samples(), published);
    assert_eq!(h.viewport.host().requests, requests);
}

#[test]
fn teardown_detaches_the_attached_listener_once() {
    let mut h = Harness::cube(800, 600);
    h.viewport.initialize().unwrap();
    h.viewport.teardown().unwrap();

    assert_eq!(h.viewport.host().detached, h.viewport.host().attached);

    let err = h.viewport.teardown().unwrap_err();
    assert!(matches!(err, ViewportError::InvalidPhase { phase: Phase::TornDown, .. }));
    assert_eq!(h.viewport.host().detached.len(), 1);
}

#[test]
fn lifecycle_has_no_back_transitions() {
    let mut h = Harness::cube(800, 600);
    assert!(h.viewport.teardown().is_err());

    h.viewport.initialize().unwrap();
    assert!(matches!(
        h.viewport.initialize(),
        Err(ViewportError::InvalidPhase { phase: Phase::Running, .. })
    ));

    h.viewport.teardown().unwrap();
    assert!(h.viewport.initialize().is_err());
    // Resize after teardown is a harmless no-op
    h.set_container(10, 10);
    h.viewport.on_resize().unwrap();
    assert_eq!(h.viewport.surface().size(), ViewportSize::new(800, 600));
}

#[test]
fn pending_asset_blocks_initialize() {
    let mut h = Harness::new(model_config(SceneVariant::Model), AssetState::Pending, 800, 600);
    assert!(matches!(h.viewport.initialize(), Err(ViewportError::SceneNotReady(_))));
    assert_eq!(h.viewport.phase(), Phase::Uninitialized);
    assert_eq!(h.viewport.host().requests, 0);
    assert!(h.viewport.host().attached.is_empty());

    h.viewport
        .scene_mut()
        .resolve_asset(AssetState::Ready(Rc::new(Mesh::cube(1.0))));
    h.viewport.initialize().unwrap();
    assert_eq!(h.viewport.phase(), Phase::Running);
}

#[test]
fn failed_asset_reports_reason() {
    let source = AssetSource::Url("assets/monkey.stl".into());
    let asset = AssetState::failed(&source, "404 Not Found");
    let mut h = Harness::new(model_config(SceneVariant::Model), asset, 800, 600);

    let err = h.viewport.initialize().unwrap_err();
    assert!(err.to_string().contains("404 Not Found"));
}

#[test]
fn frame_error_stops_rescheduling() {
    let mut h = Harness::cube(800, 600);
    h.viewport.initialize().unwrap();
    h.refresh().unwrap();

    h.fail_draws.set(true);
    let err = h.refresh().unwrap_err();
    assert!(matches!(err, ViewportError::Surface(_)));
    assert_eq!(stopped_line(&err), format!("Rendering stopped: {err}"));
    assert_eq!(h.viewport.phase(), Phase::Faulted);
    assert!(!h.viewport.frame_pending());
    assert!(h.viewport.host().outstanding.is_none());

    h.fail_draws.set(false);
    assert_eq!(h.refresh().unwrap(), FrameOutcome::Skipped);
    assert_eq!(h.viewport.surface().draws, 1);
    assert_eq!(h.viewport.frames_rendered(), 1);

    h.viewport.teardown().unwrap();
    assert_eq!(h.viewport.host().detached.len(), 1);
}

#[test]
fn config_pixel_ratio_overrides_device() {
    let mut config = ViewportConfig::default();
    config.pixel_ratio = Some(1.0);
    let mut h = Harness::new(config, AssetState::Pending, 800, 600);
    h.viewport.initialize().unwrap();
    assert_eq!(h.viewport.surface().ratio, 1.0);
}
