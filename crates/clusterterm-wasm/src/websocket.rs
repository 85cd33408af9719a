use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{BinaryType, CloseEvent, Event, MessageEvent, WebSocket};

use clusterterm_terminal::types::ConnectionError;
use clusterterm_terminal::{Connector, Transport, TransportEvent};

use crate::utils::describe;

/// Receives the callbacks of one socket
pub type EventSink = Rc<dyn Fn(TransportEvent)>;

/// Opens browser WebSockets reporting into `sink`
pub struct BrowserConnector {
    sink: EventSink,
}

impl BrowserConnector {
    pub fn new(sink: EventSink) -> Self {
        Self { sink }
    }
}

impl Connector for BrowserConnector {
    fn open(&mut self, url: &str) -> Result<Box<dyn Transport>, ConnectionError> {
        log::info!("Connecting to WebSocket: {}", url);
        let ws = WebSocket::new(url)
            .map_err(|e| ConnectionError::Transport(format!("Failed to connect: {}", describe(&e))))?;
        ws.set_binary_type(BinaryType::Arraybuffer);
        Ok(Box::new(BrowserTransport::attach(ws, self.sink.clone())))
    }
}

/// A `web_sys::WebSocket` with its handlers.
///
/// The closures live exactly as long as the transport; they are unhooked
/// from the socket before it is closed or dropped, so a released transport
/// never reports again.
pub struct BrowserTransport {
    ws: WebSocket,
    handlers: Option<Handlers>,
}

struct Handlers {
    _on_open: Closure<dyn FnMut(Event)>,
    _on_message: Closure<dyn FnMut(MessageEvent)>,
    _on_error: Closure<dyn FnMut(Event)>,
    _on_close: Closure<dyn FnMut(CloseEvent)>,
}

impl BrowserTransport {
    fn attach(ws: WebSocket, sink: EventSink) -> Self {
        let on_open = {
            let sink = sink.clone();
            Closure::<dyn FnMut(Event)>::new(move |_| sink(TransportEvent::Opened))
        };
        let on_message = {
            let sink = sink.clone();
            Closure::<dyn FnMut(MessageEvent)>::new(move |e: MessageEvent| {
                let data = e.data();
                let text = match data.as_string() {
                    Some(text) => text,
                    None => String::from_utf8_lossy(&js_sys::Uint8Array::new(&data).to_vec())
                        .into_owned(),
                };
                sink(TransportEvent::Message(text));
            })
        };
        // Browsers follow every error with a close event carrying the code,
        // which is what the session reports.
        let on_error = Closure::<dyn FnMut(Event)>::new(move |e: Event| {
            log::warn!("WebSocket error: {}", e.type_());
        });
        let on_close = Closure::<dyn FnMut(CloseEvent)>::new(move |e: CloseEvent| {
            sink(TransportEvent::Closed {
                code: e.code(),
                reason: e.reason(),
            })
        });

        ws.set_onopen(Some(on_open.as_ref().unchecked_ref()));
        ws.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
        ws.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        ws.set_onclose(Some(on_close.as_ref().unchecked_ref()));

        Self {
            ws,
            handlers: Some(Handlers {
                _on_open: on_open,
                _on_message: on_message,
                _on_error: on_error,
                _on_close: on_close,
            }),
        }
    }

    fn unhook(&mut self) {
        if self.handlers.take().is_some() {
            self.ws.set_onopen(None);
            self.ws.set_onmessage(None);
            self.ws.set_onerror(None);
            self.ws.set_onclose(None);
        }
    }
}

impl Transport for BrowserTransport {
    fn send_text(&mut self, frame: &str) -> Result<(), ConnectionError> {
        self.ws
            .send_with_str(frame)
            .map_err(|e| ConnectionError::Transport(format!("Failed to send: {}", describe(&e))))
    }

    fn close(&mut self, code: u16, reason: &str) {
        self.unhook();
        if let Err(e) = self.ws.close_with_code_and_reason(code, reason) {
            log::debug!("Failed to close WebSocket: {}", describe(&e));
        }
    }
}

impl Drop for BrowserTransport {
    fn drop(&mut self) {
        if self.handlers.is_some() {
            self.unhook();
            let _ = self.ws.close();
        }
    }
}
