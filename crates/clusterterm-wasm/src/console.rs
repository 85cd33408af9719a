use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use gloo_timers::callback::Timeout;
use log::{debug, info, warn};
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

use clusterterm_terminal::types::{SessionError, Target, TargetKind};
use clusterterm_terminal::{
    ConnectionState, SessionBridge, SessionRegistry, TerminalEndpoint, TransportEvent,
    DEFAULT_RESIZE_DEBOUNCE_MS,
};

use crate::dom;
use crate::surface::DomSurface;
use crate::utils::{js_error, page_base_url};
use crate::websocket::BrowserConnector;
use crate::xterm::XtermEmulator;

type SessionKey = (TargetKind, String);

/// Page-side state of one session
struct Slot {
    container: HtmlElement,
    flush: Option<Timeout>,
}

struct Shell {
    registry: SessionRegistry,
    endpoint: TerminalEndpoint,
    slots: HashMap<SessionKey, Slot>,
    debounce_ms: u32,
}

impl Shell {
    fn reflect(&self, target: &Target) {
        let (Some(slot), Some(bridge)) = (self.slots.get(&target.key()), self.registry.get(target))
        else {
            return;
        };
        let error = bridge.connection_error().map(|e| e.to_string());
        dom::reflect_state(&slot.container, state_name(bridge.state()), error.as_deref());
    }

    /// Release finished sessions along with their page state
    fn prune(&mut self) {
        let released = self.registry.prune();
        for slot in forget_slots(&mut self.slots, &released) {
            dom::clear_state(&slot.container);
        }
    }

    fn close(&mut self, target: &Target) -> bool {
        let closed = self.registry.close(target);
        if let Some(slot) = self.slots.remove(&target.key()) {
            dom::clear_state(&slot.container);
        }
        closed
    }
}

/// Routes DOM and socket callbacks of one session back into the shell.
/// Holds the shell weakly so pending callbacks never keep it alive.
#[derive(Clone)]
struct Dispatcher {
    shell: Weak<RefCell<Shell>>,
    target: Target,
}

impl Dispatcher {
    fn with_session(&self, f: impl FnOnce(&mut Shell)) {
        let Some(shell) = self.shell.upgrade() else {
            return;
        };
        let Ok(mut shell) = shell.try_borrow_mut() else {
            warn!("Console busy, dropping event for {}", self.target);
            return;
        };
        f(&mut shell);
    }

    fn transport(&self, event: TransportEvent) {
        self.with_session(|shell| {
            if let Some(bridge) = shell.registry.get_mut(&self.target) {
                bridge.handle_transport(event);
            }
            shell.reflect(&self.target);
        });
    }

    fn input(&self, data: String) {
        self.with_session(|shell| {
            if let Some(bridge) = shell.registry.get_mut(&self.target) {
                bridge.handle_input(&data);
            }
        });
    }

    fn geometry(&self) {
        self.with_session(|shell| {
            let schedule = shell
                .registry
                .get_mut(&self.target)
                .is_some_and(SessionBridge::notice_geometry_change);
            if !schedule {
                return;
            }
            let dispatcher = self.clone();
            let timeout = Timeout::new(shell.debounce_ms, move || dispatcher.flush());
            if let Some(slot) = shell.slots.get_mut(&self.target.key()) {
                slot.flush = Some(timeout);
            }
        });
    }

    fn flush(&self) {
        self.with_session(|shell| {
            if let Some(slot) = shell.slots.get_mut(&self.target.key()) {
                slot.flush = None;
            }
            if let Some(bridge) = shell.registry.get_mut(&self.target) {
                if let Some(size) = bridge.flush_resize() {
                    debug!("Resized {} to {}", self.target, size);
                }
            }
        });
    }
}

/// Remove the slots of released sessions and hand them back
fn forget_slots<S>(slots: &mut HashMap<SessionKey, S>, released: &[Target]) -> Vec<S> {
    released
        .iter()
        .filter_map(|target| slots.remove(&target.key()))
        .collect()
}

fn state_name(state: ConnectionState) -> &'static str {
    match state {
        ConnectionState::Idle => "idle",
        ConnectionState::Connecting => "connecting",
        ConnectionState::Open => "open",
        ConnectionState::Closed => "closed",
        ConnectionState::Failed => "failed",
    }
}

fn parse_target(kind: &str, id: &str) -> Result<Target, JsValue> {
    let kind: TargetKind = kind.parse().map_err(js_error)?;
    Target::new(kind, id).map_err(js_error)
}

/// Terminal sessions of one page
#[wasm_bindgen]
pub struct TerminalConsole {
    shell: Rc<RefCell<Shell>>,
}

#[wasm_bindgen]
impl TerminalConsole {
    /// `base_url` defaults to the API of the serving host
    #[wasm_bindgen(constructor)]
    pub fn new(base_url: Option<String>) -> Result<TerminalConsole, JsValue> {
        let base = match base_url {
            Some(base) => base,
            None => page_base_url()?,
        };
        let endpoint = TerminalEndpoint::from_base_url(&base).map_err(js_error)?;
        info!("Terminal console for {}", endpoint.http_base());
        Ok(Self {
            shell: Rc::new(RefCell::new(Shell {
                registry: SessionRegistry::default(),
                endpoint,
                slots: HashMap::new(),
                debounce_ms: DEFAULT_RESIZE_DEBOUNCE_MS as u32,
            })),
        })
    }

    /// Delay between the last geometry change and the resize it produces
    #[wasm_bindgen(js_name = setResizeDebounce)]
    pub fn set_resize_debounce(&self, millis: u32) -> Result<(), JsValue> {
        self.shell.try_borrow_mut().map_err(js_error)?.debounce_ms = millis;
        Ok(())
    }

    /// Open a shell for `kind`/`id` in the element with id `container_id`
    pub fn open(
        &self,
        container_id: &str,
        kind: &str,
        id: &str,
        name: Option<String>,
    ) -> Result<(), JsValue> {
        let mut target = parse_target(kind, id)?;
        if let Some(name) = name {
            target = target.with_name(name);
        }
        let container = dom::get_html_element_by_id(&crate::document()?, container_id)?;

        let mut shell = self.shell.try_borrow_mut().map_err(js_error)?;
        // Checked before mounting so a live session's container is untouched
        if let Some(existing) = shell.registry.get(&target) {
            if !existing.is_finished() {
                return Err(js_error(SessionError::TargetBusy(target.label())));
            }
            shell.close(&target);
        }

        let dispatcher = Dispatcher {
            shell: Rc::downgrade(&self.shell),
            target: target.clone(),
        };
        let emulator = {
            let dispatcher = dispatcher.clone();
            XtermEmulator::open(&container, move |data| dispatcher.input(data))?
        };
        let mut surface = DomSurface::new(container.clone(), {
            let dispatcher = dispatcher.clone();
            Rc::new(move || dispatcher.geometry())
        });
        let mut connector = BrowserConnector::new(Rc::new(move |event| dispatcher.transport(event)));

        // Pruned here rather than inside the registry so the slots of
        // released sessions go with them
        if shell.registry.is_full() {
            shell.prune();
        }
        let endpoint = shell.endpoint.clone();
        shell
            .registry
            .open(
                target.clone(),
                endpoint,
                &mut connector,
                Box::new(emulator),
                &mut surface,
            )
            .map_err(js_error)?;
        shell.slots.insert(
            target.key(),
            Slot {
                container,
                flush: None,
            },
        );
        shell.reflect(&target);
        Ok(())
    }

    /// Release a session. Returns false when none was open.
    pub fn close(&self, kind: &str, id: &str) -> Result<bool, JsValue> {
        let target = parse_target(kind, id)?;
        Ok(self.shell.try_borrow_mut().map_err(js_error)?.close(&target))
    }

    #[wasm_bindgen(js_name = closeAll)]
    pub fn close_all(&self) -> Result<(), JsValue> {
        let mut shell = self.shell.try_borrow_mut().map_err(js_error)?;
        shell.registry.close_all();
        for (_, slot) in shell.slots.drain() {
            dom::clear_state(&slot.container);
        }
        Ok(())
    }

    /// `connecting`, `open`, `closed` or `failed`; undefined when unknown
    pub fn state(&self, kind: &str, id: &str) -> Result<Option<String>, JsValue> {
        let target = parse_target(kind, id)?;
        let shell = self.shell.try_borrow().map_err(js_error)?;
        Ok(shell
            .registry
            .get(&target)
            .map(|bridge| state_name(bridge.state()).to_string()))
    }

    /// Reason the connection failed, for the inline error surface
    pub fn error(&self, kind: &str, id: &str) -> Result<Option<String>, JsValue> {
        let target = parse_target(kind, id)?;
        let shell = self.shell.try_borrow().map_err(js_error)?;
        Ok(shell
            .registry
            .get(&target)
            .and_then(|bridge| bridge.connection_error())
            .map(|e| e.to_string()))
    }

    #[wasm_bindgen(js_name = remoteError)]
    pub fn remote_error(&self, kind: &str, id: &str) -> Result<Option<String>, JsValue> {
        let target = parse_target(kind, id)?;
        let shell = self.shell.try_borrow().map_err(js_error)?;
        Ok(shell
            .registry
            .get(&target)
            .and_then(|bridge| bridge.remote_error())
            .map(str::to_string))
    }

    #[wasm_bindgen(js_name = sessionCount)]
    pub fn session_count(&self) -> Result<usize, JsValue> {
        Ok(self.shell.try_borrow().map_err(js_error)?.registry.len())
    }
}
