use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{Event, HtmlElement, ResizeObserver, Window};

use clusterterm_terminal::types::SessionError;
use clusterterm_terminal::{HostSurface, ResizeSignal, SignalRegistration};

use crate::utils::describe;

/// The page element hosting a terminal. Window `resize` events and a
/// `ResizeObserver` on the element both report to `on_change`.
pub struct DomSurface {
    container: HtmlElement,
    on_change: Rc<dyn Fn()>,
}

impl DomSurface {
    pub fn new(container: HtmlElement, on_change: Rc<dyn Fn()>) -> Self {
        Self {
            container,
            on_change,
        }
    }

    fn observe_window(&self) -> Result<Box<dyn SignalRegistration>, SessionError> {
        let window = web_sys::window()
            .ok_or_else(|| SessionError::Surface("No window object".to_string()))?;
        let on_change = self.on_change.clone();
        let listener = Closure::<dyn FnMut(Event)>::new(move |_| on_change());
        window
            .add_event_listener_with_callback("resize", listener.as_ref().unchecked_ref())
            .map_err(|e| SessionError::Surface(describe(&e)))?;
        Ok(Box::new(WindowListener {
            window,
            listener: Some(listener),
        }))
    }

    fn observe_container(&self) -> Result<Box<dyn SignalRegistration>, SessionError> {
        if !self.container.is_connected() {
            return Err(SessionError::Surface(
                "terminal container is not attached to the document".to_string(),
            ));
        }
        let on_change = self.on_change.clone();
        let callback =
            Closure::<dyn FnMut(js_sys::Array, ResizeObserver)>::new(move |_, _| on_change());
        let observer = ResizeObserver::new(callback.as_ref().unchecked_ref())
            .map_err(|e| SessionError::Surface(describe(&e)))?;
        observer.observe(&self.container);
        Ok(Box::new(ContainerObserver {
            observer,
            callback: Some(callback),
        }))
    }
}

impl HostSurface for DomSurface {
    fn observe(
        &mut self,
        signal: ResizeSignal,
    ) -> Result<Box<dyn SignalRegistration>, SessionError> {
        match signal {
            ResizeSignal::Window => self.observe_window(),
            ResizeSignal::Container => self.observe_container(),
        }
    }
}

/// The window `resize` listener, removed through the same closure reference
struct WindowListener {
    window: Window,
    listener: Option<Closure<dyn FnMut(Event)>>,
}

impl SignalRegistration for WindowListener {
    fn detach(&mut self) {
        if let Some(listener) = self.listener.take() {
            let _ = self
                .window
                .remove_event_listener_with_callback("resize", listener.as_ref().unchecked_ref());
        }
    }
}

/// The observer instance attached to the container, disconnected on detach
struct ContainerObserver {
    observer: ResizeObserver,
    callback: Option<Closure<dyn FnMut(js_sys::Array, ResizeObserver)>>,
}

impl SignalRegistration for ContainerObserver {
    fn detach(&mut self) {
        if self.callback.take().is_some() {
            self.observer.disconnect();
        }
    }
}
