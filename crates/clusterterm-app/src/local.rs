//! The local console side of an interactive session: stdout as the emulator,
//! crossterm keyboard and resize events as input and geometry signals.

use std::io::{self, Stdout, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use log::{debug, warn};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use clusterterm_terminal::types::{Dimensions, SessionError};
use clusterterm_terminal::{HostSurface, ResizeSignal, SignalRegistration, TerminalEmulator};

use crate::transport::LoopEvent;

const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Raw mode for as long as the guard lives
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            warn!("Failed to restore terminal mode: {}", e);
        }
    }
}

/// The user's terminal. Remote output goes straight to stdout; the local
/// terminal does the rendering.
pub struct LocalTerminal {
    stdout: Stdout,
    raw_mode: Option<RawModeGuard>,
}

impl LocalTerminal {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            stdout: io::stdout(),
            raw_mode: Some(RawModeGuard::enable()?),
        })
    }

    fn measure() -> Option<Dimensions> {
        let (cols, rows) = crossterm::terminal::size().ok()?;
        Dimensions::new(rows, cols).ok()
    }
}

impl TerminalEmulator for LocalTerminal {
    fn write(&mut self, data: &str) {
        if let Err(e) = self
            .stdout
            .write_all(data.as_bytes())
            .and_then(|_| self.stdout.flush())
        {
            debug!("Dropping output, stdout unavailable: {}", e);
        }
    }

    fn size(&self) -> Dimensions {
        Self::measure().unwrap_or_default()
    }

    // The local terminal already matches its window; fitting is measuring
    fn fit(&mut self) -> Option<Dimensions> {
        Self::measure()
    }

    fn dispose(&mut self) {
        let _ = self.stdout.flush();
        self.raw_mode = None;
    }
}

/// Geometry source for the local console. The window signal is the
/// terminal's own resize event; a tty has no separate container.
#[derive(Debug, Default)]
pub struct ConsoleSurface {
    window: Arc<AtomicBool>,
}

impl ConsoleSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag read by the input forwarder; set while the window signal is observed
    pub fn window_flag(&self) -> Arc<AtomicBool> {
        self.window.clone()
    }
}

impl HostSurface for ConsoleSurface {
    fn observe(
        &mut self,
        signal: ResizeSignal,
    ) -> Result<Box<dyn SignalRegistration>, SessionError> {
        match signal {
            ResizeSignal::Window => {
                if self.window.swap(true, Ordering::SeqCst) {
                    return Err(SessionError::Surface(
                        "window resize already observed".to_string(),
                    ));
                }
                Ok(Box::new(FlagRegistration(self.window.clone())))
            }
            ResizeSignal::Container => Ok(Box::new(NoopRegistration)),
        }
    }
}

struct FlagRegistration(Arc<AtomicBool>);

impl SignalRegistration for FlagRegistration {
    fn detach(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Registration for a signal the host never emits
pub struct NoopRegistration;

impl SignalRegistration for NoopRegistration {
    fn detach(&mut self) {}
}

/// Reads crossterm events on a blocking thread and forwards them to the
/// session loop.
pub struct InputForwarder {
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl InputForwarder {
    pub fn spawn(
        events: UnboundedSender<LoopEvent>,
        detach_key: u8,
        window: Arc<AtomicBool>,
    ) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let handle = tokio::task::spawn_blocking(move || {
            while flag.load(Ordering::SeqCst) {
                match event::poll(INPUT_POLL_INTERVAL) {
                    Ok(true) => {}
                    Ok(false) => continue,
                    Err(e) => {
                        warn!("Keyboard input unavailable: {}", e);
                        break;
                    }
                }
                let forwarded = match event::read() {
                    Ok(event) => translate(event, detach_key, window.load(Ordering::SeqCst)),
                    Err(e) => {
                        warn!("Keyboard input unavailable: {}", e);
                        break;
                    }
                };
                let Some(forwarded) = forwarded else {
                    continue;
                };
                let detach = forwarded == LoopEvent::Detach;
                if events.send(forwarded).is_err() || detach {
                    break;
                }
            }
        });
        Self { running, handle }
    }

    /// Stop reading and wait for the reader thread
    pub async fn stop(self) {
        self.running.store(false, Ordering::SeqCst);
        if let Err(e) = self.handle.await {
            debug!("Input forwarder ended abnormally: {}", e);
        }
    }
}

/// Map one crossterm event to a loop event
fn translate(event: Event, detach_key: u8, window_observed: bool) -> Option<LoopEvent> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => {
            if control_byte(&key) == Some(detach_key) {
                return Some(LoopEvent::Detach);
            }
            key_to_input(&key).map(LoopEvent::Input)
        }
        Event::Paste(text) => Some(LoopEvent::Input(text)),
        Event::Resize(_, _) if window_observed => Some(LoopEvent::Geometry),
        _ => None,
    }
}

fn control_byte(key: &KeyEvent) -> Option<u8> {
    if !key.modifiers.contains(KeyModifiers::CONTROL) {
        return None;
    }
    match key.code {
        KeyCode::Char(c) if c.is_ascii() => Some((c.to_ascii_lowercase() as u8) & 0x1f),
        _ => None,
    }
}

/// Bytes a terminal would send for a key press
fn key_to_input(key: &KeyEvent) -> Option<String> {
    if let Some(byte) = control_byte(key) {
        return Some((byte as char).to_string());
    }
    let seq = match key.code {
        KeyCode::Char(c) if key.modifiers.contains(KeyModifiers::ALT) => format!("\x1b{}", c),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "\r".to_string(),
        KeyCode::Backspace => "\x7f".to_string(),
        KeyCode::Tab => "\t".to_string(),
        KeyCode::BackTab => "\x1b[Z".to_string(),
        KeyCode::Esc => "\x1b".to_string(),
        KeyCode::Up => "\x1b[A".to_string(),
        KeyCode::Down => "\x1b[B".to_string(),
        KeyCode::Right => "\x1b[C".to_string(),
        KeyCode::Left => "\x1b[D".to_string(),
        KeyCode::Home => "\x1b[H".to_string(),
        KeyCode::End => "\x1b[F".to_string(),
        KeyCode::PageUp => "\x1b[5~".to_string(),
        KeyCode::PageDown => "\x1b[6~".to_string(),
        KeyCode::Delete => "\x1b[3~".to_string(),
        KeyCode::Insert => "\x1b[2~".to_string(),
        KeyCode::F(n @ 1..=4) => format!("\x1bO{}", (b'P' + n - 1) as char),
        KeyCode::F(n @ 5) => format!("\x1b[{}~", n + 10),
        KeyCode::F(n @ 6..=10) => format!("\x1b[{}~", n + 11),
        KeyCode::F(n @ 11..=12) => format!("\x1b[{}~", n + 12),
        _ => return None,
    };
    Some(seq)
}
