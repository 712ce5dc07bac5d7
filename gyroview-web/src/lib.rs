//! Gyroview Web - browser host for the gyroview viewport
//!
//! Draws the scene on a `<canvas>` 2D context, sized to a container element,
//! and writes the tracked orientation into a status element.
//!
//! ```js
//! import init, { mount } from "./gyroview_web.js";
//! await init();
//! const viewport = await mount("viewport", "scene", "status", null);
//! // later
//! viewport.teardown();
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo_net::http::Request;
use gyroview_core::{
    status, AssetSource, AssetState, Phase, Scene, ViewportConfig, ViewportController,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, HtmlCanvasElement, PointerEvent, WheelEvent};

pub mod host;
pub mod surface;

pub use host::{BrowserHost, ElementContainer};
pub use surface::CanvasSurface;

type WebController = ViewportController<ElementContainer, CanvasSurface, BrowserHost>;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        // Another logger is already installed
        return;
    }
    log::info!("gyroview web runtime initialized");
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn element_by_id(document: &Document, id: &str) -> Result<Element, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("no element with id '{id}'")))
}

/// Fetch and parse the model; failures become `AssetState::Failed`
async fn fetch_model(source: &AssetSource) -> AssetState {
    log::info!("fetching model {source}");
    let response = match Request::get(source.name()).send().await {
        Ok(response) => response,
        Err(e) => return AssetState::failed(source, e),
    };
    if !response.ok() {
        return AssetState::failed(source, format!("HTTP {}", response.status()));
    }
    match response.binary().await {
        Ok(bytes) => AssetState::from_bytes(source, &bytes),
        Err(e) => AssetState::failed(source, e),
    }
}

/// Pointer and wheel listeners driving the orbit controls
struct PointerListeners {
    canvas: HtmlCanvasElement,
    listeners: Vec<(&'static str, Closure<dyn FnMut(Event)>)>,
}

impl PointerListeners {
    fn attach(canvas: HtmlCanvasElement, viewport: &Rc<RefCell<WebController>>) -> Result<Self, JsValue> {
        let mut this = Self { canvas, listeners: Vec::new() };

        this.listen("pointerdown", viewport, |vp, event| {
            if let Some(e) = event.dyn_ref::<PointerEvent>() {
                vp.controls_mut().pointer_down(e.offset_x() as f32, e.offset_y() as f32);
            }
        })?;
        this.listen("pointermove", viewport, |vp, event| {
            if let Some(e) = event.dyn_ref::<PointerEvent>() {
                vp.controls_mut().pointer_move(e.offset_x() as f32, e.offset_y() as f32);
            }
        })?;
        this.listen("pointerup", viewport, |vp, _| vp.controls_mut().pointer_up())?;
        this.listen("pointerleave", viewport, |vp, _| vp.controls_mut().pointer_up())?;
        this.listen("wheel", viewport, |vp, event| {
            if let Some(e) = event.dyn_ref::<WheelEvent>() {
                e.prevent_default();
                if e.delta_y() != 0.0 {
                    vp.controls_mut().wheel(e.delta_y().signum() as f32);
                }
            }
        })?;

        Ok(this)
    }

    fn listen(
        &mut self,
        kind: &'static str,
        viewport: &Rc<RefCell<WebController>>,
        mut handler: impl FnMut(&mut WebController, &Event) + 'static,
    ) -> Result<(), JsValue> {
        let weak = Rc::downgrade(viewport);
        let callback = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            with_viewport(&weak, |vp| handler(vp, &event));
        });
        self.canvas
            .add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())?;
        self.listeners.push((kind, callback));
        Ok(())
    }

    fn detach(&mut self) {
        for (kind, callback) in self.listeners.drain(..) {
            if let Err(e) = self
                .canvas
                .remove_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())
            {
                log::warn!("removeEventListener({kind}): {e:?}");
            }
        }
    }
}

/// Run `f` against the viewport if it is still alive and not already borrowed
fn with_viewport(weak: &Weak<RefCell<WebController>>, f: impl FnOnce(&mut WebController)) {
    let Some(viewport) = weak.upgrade() else {
        return;
    };
    let Ok(mut viewport) = viewport.try_borrow_mut() else {
        log::warn!("viewport busy, event dropped");
        return;
    };
    f(&mut viewport);
}

/// A mounted viewport. Call `teardown` before discarding it.
#[wasm_bindgen]
pub struct WebViewport {
    inner: Rc<RefCell<WebController>>,
    pointer: PointerListeners,
}

#[wasm_bindgen]
impl WebViewport {
    /// Stop the draw loop and detach every listener
    pub fn teardown(&mut self) -> Result<(), JsValue> {
        self.pointer.detach();
        self.inner.borrow_mut().teardown().map_err(to_js)
    }

    /// Re-measure the container, for layout changes that fire no window resize
    pub fn resize(&self) -> Result<(), JsValue> {
        self.inner.borrow_mut().on_resize().map_err(to_js)
    }

    /// Latest `[x, y, z]` orientation in degrees
    pub fn orientation(&self) -> Option<Vec<f64>> {
        self.inner
            .borrow()
            .orientation()
            .map(|s| vec![s.x as f64, s.y as f64, s.z as f64])
    }

    /// Frames drawn since mount
    pub fn frames_rendered(&self) -> f64 {
        self.inner.borrow().frames_rendered() as f64
    }

    pub fn phase(&self) -> String {
        format!("{:?}", self.inner.borrow().phase())
    }
}

impl Drop for PointerListeners {
    fn drop(&mut self) {
        self.detach();
    }
}

impl Drop for WebViewport {
    fn drop(&mut self) {
        // The frame callback dies with the controller; stop it from firing
        if let Ok(mut viewport) = self.inner.try_borrow_mut() {
            if matches!(viewport.phase(), Phase::Running | Phase::Faulted) {
                if let Err(e) = viewport.teardown() {
                    log::warn!("teardown on drop: {e}");
                }
            }
        }
    }
}

/// Mount a viewport into the page.
///
/// `config_json` is an optional JSON viewport configuration. Scenes with a
/// model fetch it first; if that fails the status element shows why and the
/// returned promise rejects.
#[wasm_bindgen]
pub async fn mount(
    container_id: String,
    canvas_id: String,
    status_id: String,
    config_json: Option<String>,
) -> Result<WebViewport, JsValue> {
    let config = match config_json {
        Some(json) => ViewportConfig::from_json(&json).map_err(to_js)?,
        None => ViewportConfig::default(),
    };

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window.document().ok_or_else(|| JsValue::from_str("no document"))?;
    let container = element_by_id(&document, &container_id)?;
    let canvas: HtmlCanvasElement = element_by_id(&document, &canvas_id)?.dyn_into()?;
    let status_el = element_by_id(&document, &status_id)?;

    let asset = match &config.scene.model {
        Some(source) if config.scene.variant.needs_model() => {
            status_el.set_text_content(Some("Loading model..."));
            fetch_model(source).await
        }
        _ => AssetState::Pending,
    };

    let scene = Scene::build(&config.scene, asset);
    if let Some(reason) = scene.not_ready_reason() {
        let line = status::not_ready_line(&reason);
        status_el.set_text_content(Some(&line));
        return Err(JsValue::from_str(&line));
    }

    let controller = ViewportController::new(
        ElementContainer::new(container),
        CanvasSurface::new(canvas.clone())?,
        BrowserHost::new(window),
        scene,
        config,
    );
    let inner = Rc::new(RefCell::new(controller));

    let weak = Rc::downgrade(&inner);
    let fault_el = status_el.clone();
    let on_frame = Closure::<dyn FnMut(f64)>::new(move |_ts: f64| {
        with_viewport(&weak, |vp| {
            if let Err(e) = vp.on_frame() {
                log::error!("draw loop stopped: {e}");
                fault_el.set_text_content(Some(&status::stopped_line(e)));
            }
        });
    });
    let weak = Rc::downgrade(&inner);
    let on_resize = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
        with_viewport(&weak, |vp| {
            if let Err(e) = vp.on_resize() {
                log::error!("resize failed: {e}");
            }
        });
    });

    {
        let mut vp = inner.borrow_mut();
        vp.host_mut().bind(on_frame, on_resize);
        vp.subscribe_orientation(move |sample| {
            status_el.set_text_content(Some(&status::status_line(sample)));
        });
        vp.initialize().map_err(to_js)?;
    }

    let pointer = match PointerListeners::attach(canvas, &inner) {
        Ok(pointer) => pointer,
        Err(e) => {
            if let Err(teardown) = inner.borrow_mut().teardown() {
                log::warn!("teardown after failed mount: {teardown}");
            }
            return Err(e);
        }
    };
    Ok(WebViewport { inner, pointer })
}
