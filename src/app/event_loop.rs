use std::sync::{Arc, PoisonError};
use std::time::Instant;

use crossterm::event::KeyEvent;
use serde_json::json;

use super::Application;
use crate::element::FocusDelegate;
use crate::error::{AppError, Result};
use crate::geometry::Size;
use crate::logging::{LogLevel, json_kv};
use crate::metrics::AppMetrics;
use crate::screen::{CrosstermScreen, Event, Screen, same_key};

/// Releases the screen when `run` unwinds or returns, so the terminal is
/// never left in raw mode.
struct RunGuard<'a> {
    app: &'a Application,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.app
                .log(LogLevel::Error, "run_panicked", std::iter::empty());
        }
        self.app.stop();
    }
}

impl Application {
    /// Take over the controlling terminal and process events until
    /// [`stop`](Self::stop) is called. Blocks the calling thread.
    pub fn run(&self) -> Result<()> {
        self.run_with(Arc::new(CrosstermScreen::new(self.config.poll_interval)))
    }

    /// Same as [`run`](Self::run) against a caller-provided screen.
    pub fn run_with(&self, screen: Arc<dyn Screen>) -> Result<()> {
        self.start(screen)?;
        let _guard = RunGuard { app: self };

        self.draw();

        loop {
            let Some(screen) = self.current_screen() else {
                break;
            };
            // Blocks until input arrives or the screen is finalized.
            let Some(event) = screen.poll_event() else {
                break;
            };
            self.record_metric(AppMetrics::record_event);

            match event {
                Event::Key(key) => self.dispatch_key(key),
                Event::Resize(size) => self.handle_resize(screen.as_ref(), size),
            }
        }

        Ok(())
    }

    fn start(&self, screen: Arc<dyn Screen>) -> Result<()> {
        {
            let mut state = self.write_state();
            if state.screen.is_some() {
                return Err(AppError::ScreenInit(
                    "application already owns a screen".into(),
                ));
            }
            if let Err(err) = screen.init() {
                drop(state);
                self.log(
                    LogLevel::Error,
                    "screen_init_failed",
                    [json_kv("error", json!(err.to_string()))],
                );
                return Err(err);
            }
            state.screen = Some(Arc::clone(&screen));
        }

        *self
            .started_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
        let size = screen.size();
        self.log(
            LogLevel::Info,
            "app_started",
            [
                json_kv("width", json!(size.width)),
                json_kv("height", json!(size.height)),
            ],
        );
        Ok(())
    }

    fn dispatch_key(&self, key: KeyEvent) {
        let snapshot = self.read_state().key_snapshot();

        let key = match &snapshot.input_capture {
            Some(capture) => match capture(key) {
                Some(key) => key,
                None => {
                    self.record_metric(AppMetrics::record_key_suppressed);
                    self.log(LogLevel::Trace, "key_suppressed", std::iter::empty());
                    return;
                }
            },
            None => key,
        };

        if self.is_interrupt(&key) {
            self.log(LogLevel::Info, "interrupt_received", std::iter::empty());
            self.stop();
            return;
        }

        let Some(focus) = snapshot.focus else {
            return;
        };
        let Some(handler) = focus.input_handler() else {
            return;
        };
        handler(key, FocusDelegate::new(self));
        self.record_metric(AppMetrics::record_key_dispatched);
        self.draw();
    }

    fn handle_resize(&self, screen: &dyn Screen, size: Size) {
        screen.clear();
        self.record_metric(AppMetrics::record_resize);
        self.log(
            LogLevel::Debug,
            "resized",
            [
                json_kv("width", json!(size.width)),
                json_kv("height", json!(size.height)),
            ],
        );
        self.draw();
    }

    fn is_interrupt(&self, key: &KeyEvent) -> bool {
        self.config
            .interrupt_key
            .as_ref()
            .is_some_and(|interrupt| same_key(interrupt, key))
    }
}
