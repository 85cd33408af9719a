use vt100::Parser;

use clusterterm_types::Dimensions;

use super::DEFAULT_SCROLLBACK_LINES;

/// The on-screen terminal a session renders into.
///
/// Typed input is not pulled through this trait: hosts forward each chunk
/// of the emulator's input stream to `SessionBridge::handle_input`.
pub trait TerminalEmulator {
    /// Render raw output bytes
    fn write(&mut self, data: &str);

    /// Current grid size
    fn size(&self) -> Dimensions;

    /// Recompute the best fit for the hosting surface and apply it.
    /// Returns None when the surface cannot be measured.
    fn fit(&mut self) -> Option<Dimensions>;

    /// Release the emulator and anything it registered
    fn dispose(&mut self);
}

/// Headless emulator backed by a VT100 parser
pub struct ScreenEmulator {
    parser: Parser,
    surface: Dimensions,
    disposed: bool,
}

impl ScreenEmulator {
    /// Create a screen whose hosting surface fits `surface` cells
    pub fn new(surface: Dimensions) -> Self {
        Self {
            parser: Parser::new(surface.rows(), surface.cols(), DEFAULT_SCROLLBACK_LINES),
            surface,
            disposed: false,
        }
    }

    /// Change the geometry the next `fit` settles on
    pub fn set_surface(&mut self, surface: Dimensions) {
        self.surface = surface;
    }

    /// Visible screen as plain text
    pub fn contents(&self) -> String {
        self.parser.screen().contents()
    }

    /// Visible screen including ANSI formatting
    pub fn contents_formatted(&self) -> String {
        String::from_utf8_lossy(&self.parser.screen().contents_formatted()).to_string()
    }

    /// Cursor position (row, col)
    pub fn cursor_position(&self) -> (u16, u16) {
        self.parser.screen().cursor_position()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl TerminalEmulator for ScreenEmulator {
    fn write(&mut self, data: &str) {
        if !self.disposed {
            self.parser.process(data.as_bytes());
        }
    }

    fn size(&self) -> Dimensions {
        let (rows, cols) = self.parser.screen().size();
        Dimensions::new(rows, cols).unwrap_or(self.surface)
    }

    fn fit(&mut self) -> Option<Dimensions> {
        if self.disposed {
            return None;
        }
        if self.size() != self.surface {
            self.parser.set_size(self.surface.rows(), self.surface.cols());
        }
        Some(self.surface)
    }

    fn dispose(&mut self) {
        self.disposed = true;
    }
}
