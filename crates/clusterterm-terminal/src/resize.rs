use log::debug;

use clusterterm_types::{Dimensions, SessionError};

/// Geometry signals a session listens to. A session may live in a resizable
/// panel, so the container is observed separately from the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeSignal {
    Window,
    Container,
}

/// A live listener registration. Detaching must remove exactly the listener
/// that was registered.
pub trait SignalRegistration {
    fn detach(&mut self);
}

/// The element (or terminal) hosting the emulator
pub trait HostSurface {
    fn observe(&mut self, signal: ResizeSignal) -> Result<Box<dyn SignalRegistration>, SessionError>;
}

/// Size of the hosting surface in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelSize {
    pub width: f64,
    pub height: f64,
}

/// Size of one character cell in pixels at the current font
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellMetrics {
    pub width: f64,
    pub height: f64,
}

/// Best-fit cell grid for a surface. None when the surface is collapsed or
/// hidden, or the metrics are unusable.
pub fn fit_to_surface(surface: PixelSize, cell: CellMetrics) -> Option<Dimensions> {
    if !(cell.width > 0.0 && cell.height > 0.0) {
        return None;
    }
    let cols = (surface.width / cell.width).floor();
    let rows = (surface.height / cell.height).floor();
    if !(cols >= 1.0 && rows >= 1.0) {
        return None;
    }
    Dimensions::new(rows.min(u16::MAX as f64) as u16, cols.min(u16::MAX as f64) as u16).ok()
}

/// Collapses geometry changes into resize notifications.
///
/// Holds the registrations it attached for its whole lifetime and detaches
/// those same handles on teardown.
pub struct ResizeController {
    registrations: Vec<(ResizeSignal, Box<dyn SignalRegistration>)>,
    last_reported: Option<Dimensions>,
    pending: bool,
    detached: bool,
}

impl ResizeController {
    /// Observe the window and container signals of `surface`.
    ///
    /// When the second registration fails the first is detached before
    /// returning, so a failed attach leaves no listener behind.
    pub fn attach(surface: &mut dyn HostSurface) -> Result<Self, SessionError> {
        let mut controller = Self {
            registrations: Vec::with_capacity(2),
            last_reported: None,
            pending: false,
            detached: false,
        };
        for signal in [ResizeSignal::Window, ResizeSignal::Container] {
            match surface.observe(signal) {
                Ok(registration) => controller.registrations.push((signal, registration)),
                Err(e) => {
                    controller.detach();
                    return Err(e);
                }
            }
        }
        Ok(controller)
    }

    /// Record a geometry change. Returns true when this is the first change
    /// of the current tick, i.e. the host must schedule a flush.
    pub fn notice(&mut self) -> bool {
        if self.detached {
            return false;
        }
        let first = !self.pending;
        self.pending = true;
        first
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// End of an observation tick. Emits the fitted size only if it differs
    /// from the last one reported.
    pub fn flush(&mut self, fitted: Option<Dimensions>) -> Option<Dimensions> {
        if self.detached || !self.pending {
            return None;
        }
        self.pending = false;
        let dimensions = fitted?;
        if self.last_reported == Some(dimensions) {
            debug!("Fitted size unchanged at {}", dimensions);
            return None;
        }
        self.last_reported = Some(dimensions);
        Some(dimensions)
    }

    /// Emit unconditionally, used to size the remote pty once it is reachable
    pub fn force(&mut self, fitted: Option<Dimensions>) -> Option<Dimensions> {
        if self.detached {
            return None;
        }
        self.pending = false;
        let dimensions = fitted?;
        self.last_reported = Some(dimensions);
        Some(dimensions)
    }

    /// Forget the current tick without reporting it
    pub fn discard_pending(&mut self) {
        self.pending = false;
    }

    pub fn last_reported(&self) -> Option<Dimensions> {
        self.last_reported
    }

    pub fn is_attached(&self) -> bool {
        !self.detached
    }

    /// Detach the retained registrations. Idempotent.
    pub fn detach(&mut self) {
        if self.detached {
            return;
        }
        self.detached = true;
        self.pending = false;
        for (signal, mut registration) in self.registrations.drain(..) {
            registration.detach();
            debug!("Detached {:?} resize listener", signal);
        }
    }
}

impl Drop for ResizeController {
    fn drop(&mut self) {
        self.detach();
    }
}
