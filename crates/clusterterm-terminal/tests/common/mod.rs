#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use clusterterm_terminal::types::{ConnectionError, Dimensions, SessionError, Target, TargetKind};
use clusterterm_terminal::{
    Connector, HostSurface, ResizeSignal, Scheme, SessionBridge, SignalRegistration,
    TerminalEmulator, TerminalEndpoint, Transport,
};

/// Common fakes for session testing
pub type Shared<T> = Rc<RefCell<T>>;

/// Everything that crossed the fake socket
#[derive(Debug, Default)]
pub struct Wire {
    pub opened_urls: Vec<String>,
    pub sent: Vec<String>,
    pub closes: Vec<(u16, String)>,
}

impl Wire {
    pub fn sent_json(&self) -> Vec<serde_json::Value> {
        self.sent
            .iter()
            .map(|f| serde_json::from_str(f).expect("sent frame is JSON"))
            .collect()
    }

    pub fn sent_of_type(&self, kind: &str) -> Vec<serde_json::Value> {
        self.sent_json()
            .into_iter()
            .filter(|v| v["type"] == kind)
            .collect()
    }
}

pub struct FakeTransport {
    wire: Shared<Wire>,
}

impl Transport for FakeTransport {
    fn send_text(&mut self, frame: &str) -> Result<(), ConnectionError> {
        self.wire.borrow_mut().sent.push(frame.to_string());
        Ok(())
    }

    fn close(&mut self, code: u16, reason: &str) {
        self.wire.borrow_mut().closes.push((code, reason.to_string()));
    }
}

pub struct FakeConnector {
    pub wire: Shared<Wire>,
    pub refuse_with: Option<ConnectionError>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self {
            wire: Rc::new(RefCell::new(Wire::default())),
            refuse_with: None,
        }
    }

    pub fn refusing(message: &str) -> Self {
        Self {
            refuse_with: Some(ConnectionError::Transport(message.to_string())),
            ..Self::new()
        }
    }
}

impl Connector for FakeConnector {
    fn open(&mut self, url: &str) -> Result<Box<dyn Transport>, ConnectionError> {
        self.wire.borrow_mut().opened_urls.push(url.to_string());
        if let Some(err) = self.refuse_with.clone() {
            return Err(err);
        }
        Ok(Box::new(FakeTransport {
            wire: self.wire.clone(),
        }))
    }
}

/// What the fake emulator was asked to do
#[derive(Debug)]
pub struct Screen {
    pub written: Vec<String>,
    pub disposed: usize,
    pub size: Dimensions,
    pub surface: Option<Dimensions>,
}

impl Screen {
    pub fn text(&self) -> String {
        self.written.concat()
    }
}

pub struct FakeEmulator {
    screen: Shared<Screen>,
}

impl FakeEmulator {
    pub fn new(surface: Option<Dimensions>) -> (Box<dyn TerminalEmulator>, Shared<Screen>) {
        let screen = Rc::new(RefCell::new(Screen {
            written: Vec::new(),
            disposed: 0,
            size: Dimensions::default(),
            surface,
        }));
        (Box::new(FakeEmulator { screen: screen.clone() }), screen)
    }
}

impl TerminalEmulator for FakeEmulator {
    fn write(&mut self, data: &str) {
        self.screen.borrow_mut().written.push(data.to_string());
    }

    fn size(&self) -> Dimensions {
        self.screen.borrow().size
    }

    fn fit(&mut self) -> Option<Dimensions> {
        let mut screen = self.screen.borrow_mut();
        if let Some(surface) = screen.surface {
            screen.size = surface;
        }
        screen.surface
    }

    fn dispose(&mut self) {
        self.screen.borrow_mut().disposed += 1;
    }
}

/// Registrations handed out and taken back by the fake surface
#[derive(Debug, Default)]
pub struct Listeners {
    pub attached: Vec<ResizeSignal>,
    pub detached: Vec<ResizeSignal>,
    pub unavailable: Option<ResizeSignal>,
}

impl Listeners {
    pub fn live(&self) -> usize {
        self.attached.len() - self.detached.len()
    }
}

pub struct FakeSurface {
    pub listeners: Shared<Listeners>,
}

impl FakeSurface {
    pub fn new() -> Self {
        Self {
            listeners: Rc::new(RefCell::new(Listeners::default())),
        }
    }

    pub fn without(signal: ResizeSignal) -> Self {
        let surface = Self::new();
        surface.listeners.borrow_mut().unavailable = Some(signal);
        surface
    }
}

struct FakeRegistration {
    signal: ResizeSignal,
    listeners: Shared<Listeners>,
}

impl SignalRegistration for FakeRegistration {
    fn detach(&mut self) {
        self.listeners.borrow_mut().detached.push(self.signal);
    }
}

impl HostSurface for FakeSurface {
    fn observe(&mut self, signal: ResizeSignal) -> Result<Box<dyn SignalRegistration>, SessionError> {
        if self.listeners.borrow().unavailable == Some(signal) {
            return Err(SessionError::Surface(format!("{:?} not attached", signal)));
        }
        self.listeners.borrow_mut().attached.push(signal);
        Ok(Box::new(FakeRegistration {
            signal,
            listeners: self.listeners.clone(),
        }))
    }
}

pub fn dims(rows: u16, cols: u16) -> Dimensions {
    Dimensions::new(rows, cols).unwrap()
}

pub fn endpoint() -> TerminalEndpoint {
    TerminalEndpoint::new(Scheme::Wss, "cluster.example.com", "api/v1").unwrap()
}

pub fn task(id: &str) -> Target {
    Target::new(TargetKind::Task, id).unwrap()
}

/// A session plus handles on all its fakes
pub struct Harness {
    pub bridge: SessionBridge,
    pub wire: Shared<Wire>,
    pub screen: Shared<Screen>,
    pub listeners: Shared<Listeners>,
}

impl Harness {
    pub fn open(target: Target, surface: Option<Dimensions>) -> Self {
        let mut connector = FakeConnector::new();
        let mut host = FakeSurface::new();
        let (emulator, screen) = FakeEmulator::new(surface);
        let bridge = SessionBridge::open(target, endpoint(), &mut connector, emulator, &mut host)
            .expect("session opens");
        Self {
            bridge,
            wire: connector.wire,
            screen,
            listeners: host.listeners,
        }
    }

    pub fn set_surface(&self, surface: Dimensions) {
        self.screen.borrow_mut().surface = Some(surface);
    }
}
