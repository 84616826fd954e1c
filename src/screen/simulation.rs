use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crossterm::event::KeyEvent;

use super::{CellBuffer, Event, Screen};
use crate::error::{AppError, Result};
use crate::geometry::Size;

enum Feed {
    Event(Event),
    Finalized,
}

/// Headless screen driven by injected events.
///
/// `poll_event` blocks on an internal channel, so a loop running against a
/// simulation behaves like one waiting on a real terminal. Counters record
/// every buffer operation for inspection.
pub struct SimulationScreen {
    buffer: Mutex<CellBuffer>,
    cursor: Mutex<Option<(u16, u16)>>,
    tx: Mutex<Sender<Feed>>,
    rx: Mutex<Receiver<Feed>>,
    init_failure: Option<String>,
    initialised: AtomicBool,
    finalized: AtomicBool,
    clears: AtomicUsize,
    shows: AtomicUsize,
    cursor_hides: AtomicUsize,
    finis: AtomicUsize,
}

impl SimulationScreen {
    pub fn new(size: Size) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            buffer: Mutex::new(CellBuffer::new(size)),
            cursor: Mutex::new(None),
            tx: Mutex::new(tx),
            rx: Mutex::new(rx),
            init_failure: None,
            initialised: AtomicBool::new(false),
            finalized: AtomicBool::new(false),
            clears: AtomicUsize::new(0),
            shows: AtomicUsize::new(0),
            cursor_hides: AtomicUsize::new(0),
            finis: AtomicUsize::new(0),
        }
    }

    /// Make `init` fail with a `ScreenInit` error carrying `reason`.
    pub fn with_init_failure(mut self, reason: impl Into<String>) -> Self {
        self.init_failure = Some(reason.into());
        self
    }

    pub fn inject(&self, event: Event) {
        let _ = self.sender().send(Feed::Event(event));
    }

    pub fn inject_key(&self, key: KeyEvent) {
        self.inject(Event::Key(key));
    }

    pub fn inject_resize(&self, size: Size) {
        self.inject(Event::Resize(size));
    }

    pub fn is_initialised(&self) -> bool {
        self.initialised.load(Ordering::SeqCst)
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized.load(Ordering::SeqCst)
    }

    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }

    pub fn shows(&self) -> usize {
        self.shows.load(Ordering::SeqCst)
    }

    pub fn cursor_hides(&self) -> usize {
        self.cursor_hides.load(Ordering::SeqCst)
    }

    /// Number of `fini` calls that actually released the screen.
    pub fn finis(&self) -> usize {
        self.finis.load(Ordering::SeqCst)
    }

    pub fn cursor(&self) -> Option<(u16, u16)> {
        *self.cursor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn contents(&self) -> Vec<String> {
        self.buffer().contents()
    }

    fn buffer(&self) -> MutexGuard<'_, CellBuffer> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sender(&self) -> MutexGuard<'_, Sender<Feed>> {
        self.tx.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Screen for SimulationScreen {
    fn init(&self) -> Result<()> {
        if let Some(reason) = &self.init_failure {
            return Err(AppError::ScreenInit(reason.clone()));
        }
        if self.initialised.swap(true, Ordering::SeqCst) {
            return Err(AppError::ScreenInit("screen already initialised".into()));
        }
        Ok(())
    }

    fn poll_event(&self) -> Option<Event> {
        if self.is_finalized() {
            return None;
        }
        let rx = self.rx.lock().unwrap_or_else(PoisonError::into_inner);
        match rx.recv() {
            Ok(Feed::Event(Event::Resize(size))) => {
                self.buffer().resize(size);
                Some(Event::Resize(size))
            }
            Ok(Feed::Event(event)) if !self.is_finalized() => Some(event),
            Ok(_) | Err(_) => None,
        }
    }

    fn size(&self) -> Size {
        self.buffer().size()
    }

    fn clear(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.buffer().clear();
    }

    fn show(&self) -> Result<()> {
        self.shows.fetch_add(1, Ordering::SeqCst);
        self.buffer().flush();
        Ok(())
    }

    fn hide_cursor(&self) {
        self.cursor_hides.fetch_add(1, Ordering::SeqCst);
        *self.cursor.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn show_cursor(&self, x: u16, y: u16) {
        *self.cursor.lock().unwrap_or_else(PoisonError::into_inner) = Some((x, y));
    }

    fn set_content(&self, x: u16, y: u16, ch: char) {
        self.buffer().set(x, y, ch);
    }

    fn fini(&self) {
        if self.finalized.swap(true, Ordering::SeqCst) {
            return;
        }
        self.finis.fetch_add(1, Ordering::SeqCst);
        // Wake a poller blocked on the channel.
        let _ = self.sender().send(Feed::Finalized);
    }
}
