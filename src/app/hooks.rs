use std::sync::Arc;

use crossterm::event::KeyEvent;

use crate::screen::Screen;

/// Outcome of a before-draw hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawFlow {
    /// Draw the root and run the after-draw hook.
    Continue,
    /// The hook drew everything itself; only flush the screen.
    Handled,
}

/// Sees every key before the focus target. Returning `None` swallows the key.
pub type InputCapture = Arc<dyn Fn(KeyEvent) -> Option<KeyEvent> + Send + Sync>;

pub type BeforeDrawHook = Arc<dyn Fn(&dyn Screen) -> DrawFlow + Send + Sync>;

pub type AfterDrawHook = Arc<dyn Fn(&dyn Screen) + Send + Sync>;
