//! Browser container and frame host

use gyroview_core::{Container, FrameHost, HostError, ViewportSize};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{Element, Event, Window};

/// Element whose client box sizes the viewport
pub struct ElementContainer {
    element: Element,
}

impl ElementContainer {
    pub fn new(element: Element) -> Self {
        Self { element }
    }
}

impl Container for ElementContainer {
    fn measure(&self) -> ViewportSize {
        ViewportSize::new(
            self.element.client_width().max(0) as u32,
            self.element.client_height().max(0) as u32,
        )
    }
}

/// The function registered with `addEventListener`, kept so the very same
/// object can be passed to `removeEventListener`
#[derive(Debug)]
pub struct ResizeListener(js_sys::Function);

/// `requestAnimationFrame` and `window` resize events.
///
/// The callbacks are bound after the viewport exists, since they hold a weak
/// reference back to it.
pub struct BrowserHost {
    window: Window,
    frame_callback: Option<Closure<dyn FnMut(f64)>>,
    resize_callback: Option<Closure<dyn FnMut(Event)>>,
}

impl BrowserHost {
    pub fn new(window: Window) -> Self {
        Self {
            window,
            frame_callback: None,
            resize_callback: None,
        }
    }

    pub fn bind(&mut self, on_frame: Closure<dyn FnMut(f64)>, on_resize: Closure<dyn FnMut(Event)>) {
        self.frame_callback = Some(on_frame);
        self.resize_callback = Some(on_resize);
    }
}

impl FrameHost for BrowserHost {
    type FrameHandle = i32;
    type ListenerHandle = ResizeListener;

    fn request_frame(&mut self) -> Result<i32, HostError> {
        let callback = self
            .frame_callback
            .as_ref()
            .ok_or_else(|| HostError("frame callback not bound".into()))?;
        self.window
            .request_animation_frame(callback.as_ref().unchecked_ref())
            .map_err(|e| HostError(format!("requestAnimationFrame: {e:?}")))
    }

    fn cancel_frame(&mut self, handle: i32) {
        if let Err(e) = self.window.cancel_animation_frame(handle) {
            log::warn!("cancelAnimationFrame({handle}): {e:?}");
        }
    }

    fn attach_resize(&mut self) -> Result<ResizeListener, HostError> {
        let callback = self
            .resize_callback
            .as_ref()
            .ok_or_else(|| HostError("resize callback not bound".into()))?;
        let function: js_sys::Function = callback.as_ref().unchecked_ref::<js_sys::Function>().clone();
        self.window
            .add_event_listener_with_callback("resize", &function)
            .map_err(|e| HostError(format!("addEventListener(resize): {e:?}")))?;
        Ok(ResizeListener(function))
    }

    fn detach_resize(&mut self, listener: ResizeListener) {
        if let Err(e) = self.window.remove_event_listener_with_callback("resize", &listener.0) {
            log::warn!("removeEventListener(resize): {e:?}");
        }
    }
}
