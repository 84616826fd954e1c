//! Terminal screen capability consumed by the application core.
//!
//! A [`Screen`] is shared between the event-loop thread, which blocks in
//! [`Screen::poll_event`], and any other thread that draws or stops the
//! application. Every method therefore takes `&self`.

mod buffer;
mod simulation;
mod terminal;

pub use buffer::{Cell, CellBuffer, CellChange};
pub use simulation::SimulationScreen;
pub use terminal::CrosstermScreen;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::error::Result;
use crate::geometry::Size;
use crate::width::char_width;

/// Input delivered by a screen to the event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Key(KeyEvent),
    Resize(Size),
}

pub trait Screen: Send + Sync {
    /// Acquire the terminal and switch it into cell-addressable mode.
    fn init(&self) -> Result<()>;

    /// Block until the next event. `None` once the screen has been finalized.
    fn poll_event(&self) -> Option<Event>;

    fn size(&self) -> Size;

    /// Blank the back buffer and force the next `show` to repaint every cell.
    fn clear(&self);

    /// Flush buffered cell changes to the device.
    fn show(&self) -> Result<()>;

    fn hide_cursor(&self);

    fn show_cursor(&self, x: u16, y: u16);

    fn set_content(&self, x: u16, y: u16, ch: char);

    /// Write `text` starting at `(x, y)`, clipped to the screen width.
    /// Returns the number of cells consumed.
    fn print(&self, x: u16, y: u16, text: &str) -> u16 {
        let width = self.size().width;
        let mut col = x;
        for ch in text.chars() {
            let cells = char_width(ch);
            if cells == 0 {
                continue;
            }
            if col.saturating_add(cells) > width {
                break;
            }
            self.set_content(col, y, ch);
            col += cells;
        }
        col - x
    }

    /// Release the terminal and restore its prior mode. Idempotent.
    fn fini(&self);
}

/// The key combination that stops the application unless configured otherwise.
pub fn ctrl_c() -> KeyEvent {
    KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)
}

/// Compare two key events by code and modifiers only, ignoring kind and state.
pub fn same_key(a: &KeyEvent, b: &KeyEvent) -> bool {
    a.code == b.code && a.modifiers == b.modifiers
}
