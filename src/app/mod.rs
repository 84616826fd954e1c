//! Application core: owns the screen, the root element and the focus target,
//! and drives the event loop and draw cycle.
//!
//! All state sits behind one reader/writer lock. The lock is only held to
//! read or swap fields; user callbacks (hooks, element notifications, key
//! handlers) always run after it has been released, so they are free to call
//! back into the application.

mod config;
mod event_loop;
mod hooks;
mod state;

pub use config::AppConfig;
pub use hooks::{AfterDrawHook, BeforeDrawHook, DrawFlow, InputCapture};

use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use serde_json::json;

use crossterm::event::KeyEvent;

use crate::element::{Element, FocusDelegate, SharedElement};
use crate::geometry::{Rect, Size};
use crate::logging::{LogLevel, event_with_fields, json_kv};
use crate::metrics::AppMetrics;
use crate::screen::Screen;

use state::AppState;

pub struct Application {
    state: RwLock<AppState>,
    config: AppConfig,
    started_at: Mutex<Option<Instant>>,
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

impl Application {
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self {
            state: RwLock::new(AppState::default()),
            config,
            started_at: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Install a function that sees every key before the focus target does.
    /// It may substitute the key or swallow it by returning `None`; a
    /// swallowed interrupt key does not stop the application.
    pub fn set_input_capture<F>(&self, capture: F) -> &Self
    where
        F: Fn(KeyEvent) -> Option<KeyEvent> + Send + Sync + 'static,
    {
        self.write_state().input_capture = Some(Arc::new(capture));
        self
    }

    pub fn clear_input_capture(&self) -> &Self {
        self.write_state().input_capture = None;
        self
    }

    /// Install a function invoked before the root is drawn. Returning
    /// [`DrawFlow::Handled`] skips the root and the after-draw hook; the
    /// screen is still flushed. The screen is not cleared beforehand.
    pub fn set_before_draw<F>(&self, hook: F) -> &Self
    where
        F: Fn(&dyn Screen) -> DrawFlow + Send + Sync + 'static,
    {
        self.write_state().before_draw = Some(Arc::new(hook));
        self
    }

    pub fn clear_before_draw(&self) -> &Self {
        self.write_state().before_draw = None;
        self
    }

    pub fn set_after_draw<F>(&self, hook: F) -> &Self
    where
        F: Fn(&dyn Screen) + Send + Sync + 'static,
    {
        self.write_state().after_draw = Some(Arc::new(hook));
        self
    }

    pub fn clear_after_draw(&self) -> &Self {
        self.write_state().after_draw = None;
        self
    }

    /// Release the screen, causing `run` to return. Safe to call from any
    /// thread, from inside a key handler, and more than once.
    pub fn stop(&self) {
        let Some(screen) = self.write_state().screen.take() else {
            return;
        };
        screen.fini();

        let uptime = self
            .started_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .map(|start| start.elapsed())
            .unwrap_or_default();
        self.log(
            LogLevel::Info,
            "app_stopped",
            [json_kv("uptime_ms", json!(uptime.as_millis() as u64))],
        );
        if let (Some(logger), Some(metrics)) = (&self.config.logger, &self.config.metrics) {
            let snapshot = metrics
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .snapshot(uptime);
            let target = format!("{}.metrics", self.config.log_target);
            let _ = logger.log_event(snapshot.to_log_event(&target));
        }
    }

    /// Redraw the root element and flush the screen. Does nothing until both
    /// a screen and a root are present.
    pub fn draw(&self) -> &Self {
        let snapshot = self.read_state().draw_snapshot();
        let (Some(screen), Some(root)) = (snapshot.screen, snapshot.root) else {
            return self;
        };

        if snapshot.root_fullscreen {
            root.set_rect(Rect::from_size(screen.size()));
        }

        if let Some(before) = &snapshot.before_draw {
            if before(screen.as_ref()) == DrawFlow::Handled {
                self.flush(screen.as_ref(), true);
                return self;
            }
        }

        root.draw(screen.as_ref());

        if let Some(after) = &snapshot.after_draw {
            after(screen.as_ref());
        }

        self.flush(screen.as_ref(), false);
        self
    }

    /// Replace the root element and focus it. With `fullscreen`, every draw
    /// stretches the root over the whole screen.
    pub fn set_root(&self, root: SharedElement, fullscreen: bool) -> &Self {
        {
            let mut state = self.write_state();
            state.root = Some(Arc::clone(&root));
            state.root_fullscreen = fullscreen;
            if let Some(screen) = &state.screen {
                screen.clear();
            }
        }
        self.log(
            LogLevel::Debug,
            "root_changed",
            [json_kv("fullscreen", json!(fullscreen))],
        );

        self.set_focus(root)
    }

    pub fn root(&self) -> Option<SharedElement> {
        self.read_state().root.clone()
    }

    /// Stretch `element` over the current screen. No-op while not running.
    pub fn resize_to_full_screen(&self, element: &dyn Element) -> &Self {
        if let Some(size) = self.screen_size() {
            element.set_rect(Rect::from_size(size));
        }
        self
    }

    /// Move keyboard focus to `target`. The previous target is blurred before
    /// `target` is told it gained focus. The cursor is hidden on every
    /// transfer; elements that want it show it again from `focus`.
    pub fn set_focus(&self, target: SharedElement) -> &Self {
        let previous = {
            let mut state = self.write_state();
            let previous = state.focus.replace(Arc::clone(&target));
            if let Some(screen) = &state.screen {
                screen.hide_cursor();
            }
            previous
        };

        if let Some(previous) = previous {
            previous.blur();
        }
        self.record_metric(AppMetrics::record_focus_change);
        self.log(LogLevel::Trace, "focus_changed", std::iter::empty());

        target.focus(FocusDelegate::new(self));
        self
    }

    pub fn get_focus(&self) -> Option<SharedElement> {
        self.read_state().focus.clone()
    }

    pub fn is_running(&self) -> bool {
        self.read_state().screen.is_some()
    }

    pub fn screen_size(&self) -> Option<Size> {
        self.read_state().screen.as_ref().map(|screen| screen.size())
    }

    fn flush(&self, screen: &dyn Screen, vetoed: bool) {
        if let Err(err) = screen.show() {
            self.log(
                LogLevel::Warn,
                "show_failed",
                [json_kv("error", json!(err.to_string()))],
            );
        }
        if vetoed {
            self.log(LogLevel::Trace, "draw_vetoed", std::iter::empty());
        }
        self.record_metric(|metrics| metrics.record_draw(vetoed));
    }

    fn current_screen(&self) -> Option<Arc<dyn Screen>> {
        self.read_state().screen.clone()
    }

    // No callback ever runs under the lock, so a poisoned lock still holds
    // consistent state.
    fn read_state(&self) -> RwLockReadGuard<'_, AppState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, AppState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn log<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        if let Some(logger) = self.config.logger.as_ref() {
            if !logger.enabled(level) {
                return;
            }
            let event = event_with_fields(level, &self.config.log_target, message, fields);
            let _ = logger.log_event(event);
        }
    }

    fn record_metric(&self, record: impl FnOnce(&mut AppMetrics)) {
        if let Some(metrics) = self.config.metrics.as_ref() {
            let mut guard = metrics.lock().unwrap_or_else(PoisonError::into_inner);
            record(&mut *guard);
        }
    }
}
