use std::sync::Arc;

use super::hooks::{AfterDrawHook, BeforeDrawHook, InputCapture};
use crate::element::SharedElement;
use crate::screen::Screen;

/// Everything guarded by the application lock.
#[derive(Default)]
pub(super) struct AppState {
    pub(super) screen: Option<Arc<dyn Screen>>,
    pub(super) focus: Option<SharedElement>,
    pub(super) root: Option<SharedElement>,
    pub(super) root_fullscreen: bool,
    pub(super) input_capture: Option<InputCapture>,
    pub(super) before_draw: Option<BeforeDrawHook>,
    pub(super) after_draw: Option<AfterDrawHook>,
}

/// Copy of the draw inputs taken under the read lock.
pub(super) struct DrawSnapshot {
    pub(super) screen: Option<Arc<dyn Screen>>,
    pub(super) root: Option<SharedElement>,
    pub(super) root_fullscreen: bool,
    pub(super) before_draw: Option<BeforeDrawHook>,
    pub(super) after_draw: Option<AfterDrawHook>,
}

/// Inputs for dispatching one key event.
pub(super) struct KeySnapshot {
    pub(super) focus: Option<SharedElement>,
    pub(super) input_capture: Option<InputCapture>,
}

impl AppState {
    pub(super) fn draw_snapshot(&self) -> DrawSnapshot {
        DrawSnapshot {
            screen: self.screen.clone(),
            root: self.root.clone(),
            root_fullscreen: self.root_fullscreen,
            before_draw: self.before_draw.clone(),
            after_draw: self.after_draw.clone(),
        }
    }

    pub(super) fn key_snapshot(&self) -> KeySnapshot {
        KeySnapshot {
            focus: self.focus.clone(),
            input_capture: self.input_capture.clone(),
        }
    }
}
