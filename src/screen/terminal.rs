use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event as CrosstermEvent, KeyEventKind};
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};

use super::{CellBuffer, CellChange, Event, Screen};
use crate::error::{AppError, Result};
use crate::geometry::Size;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

type Output = Box<dyn Write + Send>;

/// Screen backed by the process's controlling terminal through crossterm.
///
/// `poll_event` waits in slices of `poll_interval` so a `fini` issued from
/// another thread is observed within one interval. Frame output and terminal
/// restore share the `output` lock: once `fini` has restored the terminal,
/// no later `show` writes to it.
pub struct CrosstermScreen {
    buffer: Mutex<CellBuffer>,
    cursor: Mutex<Option<(u16, u16)>>,
    output: Mutex<Output>,
    poll_interval: Duration,
    active: AtomicBool,
}

impl CrosstermScreen {
    pub fn new(poll_interval: Duration) -> Self {
        Self::with_output(poll_interval, Box::new(io::stdout()))
    }

    /// Send escape sequences to `output` instead of stdout. Raw mode and
    /// input polling still apply to the controlling terminal.
    pub fn with_output(poll_interval: Duration, output: Box<dyn Write + Send>) -> Self {
        Self {
            buffer: Mutex::new(CellBuffer::new(Size::default())),
            cursor: Mutex::new(None),
            output: Mutex::new(output),
            poll_interval,
            active: AtomicBool::new(false),
        }
    }

    fn buffer(&self) -> MutexGuard<'_, CellBuffer> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn output(&self) -> MutexGuard<'_, Output> {
        self.output.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enter(out: &mut impl Write) -> Result<()> {
        terminal::enable_raw_mode().map_err(AppError::screen_init)?;
        if let Err(err) = execute!(out, EnterAlternateScreen, Hide, Clear(ClearType::All)) {
            terminal::disable_raw_mode().ok();
            return Err(AppError::screen_init(err));
        }
        Ok(())
    }

    fn restore(out: &mut impl Write) -> io::Result<()> {
        // Best-effort: attempt every step even if an earlier one fails.
        let mut first_err: Option<io::Error> = None;
        if let Err(err) = execute!(out, Show, LeaveAlternateScreen) {
            first_err.get_or_insert(err);
        }
        if let Err(err) = terminal::disable_raw_mode() {
            first_err.get_or_insert(err);
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn write_frame(
        out: &mut impl Write,
        changes: &[CellChange],
        cursor: Option<(u16, u16)>,
    ) -> Result<()> {
        Self::queue_frame(out, changes, cursor).map_err(|err| AppError::Terminal(err.to_string()))
    }

    fn queue_frame(
        out: &mut impl Write,
        changes: &[CellChange],
        cursor: Option<(u16, u16)>,
    ) -> io::Result<()> {
        queue!(out, Hide)?;
        for change in changes {
            queue!(out, MoveTo(change.x, change.y), Print(change.cell.ch))?;
        }
        if let Some((x, y)) = cursor {
            queue!(out, MoveTo(x, y), Show)?;
        }
        out.flush()
    }

    fn translate(&self, event: CrosstermEvent) -> Option<Event> {
        match event {
            CrosstermEvent::Key(key) if key.kind != KeyEventKind::Release => Some(Event::Key(key)),
            CrosstermEvent::Resize(width, height) => {
                let size = Size::new(width, height);
                self.buffer().resize(size);
                Some(Event::Resize(size))
            }
            _ => None,
        }
    }
}

impl Default for CrosstermScreen {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl Screen for CrosstermScreen {
    fn init(&self) -> Result<()> {
        let mut out = self.output();
        if self.active.load(Ordering::SeqCst) {
            return Err(AppError::ScreenInit("terminal already initialised".into()));
        }
        let (width, height) = terminal::size().map_err(AppError::screen_init)?;
        Self::enter(&mut *out)?;
        self.buffer().resize(Size::new(width, height));
        self.buffer().clear();
        *self.cursor.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.active.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn poll_event(&self) -> Option<Event> {
        loop {
            if !self.active.load(Ordering::SeqCst) {
                return None;
            }
            match event::poll(self.poll_interval) {
                Ok(true) => match event::read() {
                    Ok(raw) => {
                        if let Some(event) = self.translate(raw) {
                            return Some(event);
                        }
                    }
                    Err(_) => return None,
                },
                Ok(false) => {}
                Err(_) => return None,
            }
        }
    }

    fn size(&self) -> Size {
        self.buffer().size()
    }

    fn clear(&self) {
        self.buffer().clear();
    }

    fn show(&self) -> Result<()> {
        let mut out = self.output();
        if !self.active.load(Ordering::SeqCst) {
            return Ok(());
        }
        let changes = self.buffer().flush();
        let cursor = *self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
        Self::write_frame(&mut *out, &changes, cursor)
    }

    fn hide_cursor(&self) {
        *self.cursor.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn show_cursor(&self, x: u16, y: u16) {
        *self.cursor.lock().unwrap_or_else(PoisonError::into_inner) = Some((x, y));
    }

    fn set_content(&self, x: u16, y: u16, ch: char) {
        self.buffer().set(x, y, ch);
    }

    fn fini(&self) {
        let mut out = self.output();
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        let _ = Self::restore(&mut *out);
    }
}

impl Drop for CrosstermScreen {
    fn drop(&mut self) {
        self.fini();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::Cell;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::sync::Arc;
    use std::thread;

    /// Writer that appends into a buffer shared with the test.
    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Capture {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
        }
    }

    /// Screen that believes it owns a terminal and writes into `capture`.
    fn active_screen(capture: &Capture, size: Size) -> CrosstermScreen {
        let screen = CrosstermScreen::with_output(DEFAULT_POLL_INTERVAL, Box::new(capture.clone()));
        screen.buffer().resize(size);
        screen.active.store(true, Ordering::SeqCst);
        screen
    }

    #[test]
    fn uninitialised_screen_is_inert() {
        let capture = Capture::default();
        let screen = CrosstermScreen::with_output(DEFAULT_POLL_INTERVAL, Box::new(capture.clone()));
        assert_eq!(screen.size(), Size::default());
        assert!(screen.poll_event().is_none());
        assert!(screen.show().is_ok());
        screen.fini();
        assert!(capture.text().is_empty());
    }

    #[test]
    fn release_events_are_dropped() {
        let screen = CrosstermScreen::default();
        let mut key = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
        key.kind = KeyEventKind::Release;
        assert!(screen.translate(CrosstermEvent::Key(key)).is_none());
        key.kind = KeyEventKind::Press;
        assert_eq!(
            screen.translate(CrosstermEvent::Key(key)),
            Some(Event::Key(key))
        );
    }

    #[test]
    fn resize_updates_buffer_size() {
        let screen = CrosstermScreen::default();
        let event = screen.translate(CrosstermEvent::Resize(100, 40));
        assert_eq!(event, Some(Event::Resize(Size::new(100, 40))));
        assert_eq!(screen.size(), Size::new(100, 40));
    }

    #[test]
    fn show_writes_changed_cells_and_cursor() {
        let capture = Capture::default();
        let screen = active_screen(&capture, Size::new(4, 1));
        screen.buffer().flush();
        screen.set_content(2, 0, 'x');
        screen.show_cursor(3, 0);

        screen.show().unwrap();

        assert_eq!(capture.text(), "\x1b[?25l\x1b[1;3Hx\x1b[1;4H\x1b[?25h");
    }

    #[test]
    fn flush_failure_is_a_terminal_error() {
        let changes = [CellChange {
            x: 0,
            y: 0,
            cell: Cell::BLANK,
        }];
        let err = CrosstermScreen::write_frame(&mut Broken, &changes, None).unwrap_err();
        assert!(matches!(err, AppError::Terminal(ref msg) if msg.contains("pipe closed")));
    }

    #[test]
    fn show_after_fini_writes_nothing() {
        let capture = Capture::default();
        let screen = active_screen(&capture, Size::new(4, 1));
        screen.fini();
        let restored = capture.text();
        assert!(restored.ends_with("\x1b[?25h\x1b[?1049l"));

        screen.set_content(0, 0, 'x');
        screen.show().unwrap();
        assert_eq!(capture.text(), restored);
    }

    #[test]
    fn concurrent_fini_is_never_followed_by_output() {
        let capture = Capture::default();
        let screen = Arc::new(active_screen(&capture, Size::new(8, 2)));
        let drawer = {
            let screen = Arc::clone(&screen);
            thread::spawn(move || {
                for i in 0..500u32 {
                    let ch = char::from(b'a' + (i % 26) as u8);
                    screen.set_content((i % 8) as u16, 0, ch);
                    screen.show().unwrap();
                }
            })
        };
        thread::sleep(Duration::from_millis(1));
        screen.fini();
        drawer.join().unwrap();

        assert!(capture.text().ends_with("\x1b[?25h\x1b[?1049l"));
    }
}
