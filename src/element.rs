//! Capability contract for anything placed in the UI tree.
//!
//! Elements are shared between the event loop and embedding threads as
//! [`SharedElement`], so every method takes `&self`; widgets keep their
//! mutable state behind their own locks.

use std::sync::Arc;

use crossterm::event::KeyEvent;

use crate::app::Application;
use crate::geometry::Rect;
use crate::screen::Screen;

pub type SharedElement = Arc<dyn Element>;

/// Key handler returned by [`Element::input_handler`]. It is invoked at most
/// once per key event and may move focus through the delegate.
pub type InputHandler<'a> = Box<dyn FnOnce(KeyEvent, FocusDelegate<'_>) + 'a>;

pub trait Element: Send + Sync {
    /// Render into `screen` within the element's current rect.
    fn draw(&self, screen: &dyn Screen);

    fn set_rect(&self, rect: Rect);

    fn rect(&self) -> Rect;

    /// Elements that do not consume keys return `None`; the loop then
    /// skips both dispatch and the follow-up redraw.
    fn input_handler(&self) -> Option<InputHandler<'_>> {
        None
    }

    /// Called after this element became the focus target. Containers may
    /// hand focus on to a child through `delegate`.
    fn focus(&self, _delegate: FocusDelegate<'_>) {}

    fn blur(&self) {}
}

/// Permission to move keyboard focus, valid for a single dispatch.
///
/// Handed by value to [`Element::focus`] and to input handlers. The borrow
/// keeps it from outliving the call it was passed into.
#[derive(Clone, Copy)]
pub struct FocusDelegate<'a> {
    app: &'a Application,
}

impl<'a> FocusDelegate<'a> {
    pub(crate) fn new(app: &'a Application) -> Self {
        Self { app }
    }

    pub fn set_focus(&self, target: SharedElement) {
        self.app.set_focus(target);
    }

    /// Current focus target, as seen by the application.
    pub fn current(&self) -> Option<SharedElement> {
        self.app.get_focus()
    }
}

/// Identity comparison for shared elements, ignoring vtable differences.
pub fn same_element(a: &SharedElement, b: &SharedElement) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Blank(Mutex<Rect>);

    impl Element for Blank {
        fn draw(&self, _screen: &dyn Screen) {}

        fn set_rect(&self, rect: Rect) {
            *self.0.lock().unwrap() = rect;
        }

        fn rect(&self) -> Rect {
            *self.0.lock().unwrap()
        }
    }

    #[test]
    fn defaults_do_not_consume_keys() {
        let blank = Blank(Mutex::new(Rect::default()));
        assert!(blank.input_handler().is_none());
    }

    #[test]
    fn identity_follows_allocation() {
        let a: SharedElement = Arc::new(Blank(Mutex::new(Rect::default())));
        let b: SharedElement = Arc::new(Blank(Mutex::new(Rect::default())));
        let a2 = Arc::clone(&a);
        assert!(same_element(&a, &a2));
        assert!(!same_element(&a, &b));
    }
}
