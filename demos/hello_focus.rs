//! Two text fields inside a form. Tab moves focus between the fields,
//! typed characters go to the focused field, Ctrl-C quits.
//!
//! Run with `cargo run --example hello_focus`. Set `ROOM_APP_LOG` to a file
//! path to capture the application's lifecycle log.

use std::sync::{Arc, Mutex, Weak};

use crossterm::event::{KeyCode, KeyEvent};
use room_app::{
    AppConfig, Application, DrawFlow, Element, FileSink, FocusDelegate, InputHandler, Logger,
    Rect, Screen, SharedElement, display_width,
};

struct Field {
    label: &'static str,
    rect: Mutex<Rect>,
    text: Mutex<String>,
    focused: Mutex<bool>,
    label_column: Mutex<u16>,
    // Weak so that fields linked in a ring can still be dropped.
    next: Mutex<Option<Weak<dyn Element>>>,
}

impl Field {
    fn new(label: &'static str) -> Arc<Self> {
        Arc::new(Self {
            label,
            rect: Mutex::new(Rect::default()),
            text: Mutex::new(String::new()),
            focused: Mutex::new(false),
            label_column: Mutex::new(0),
            next: Mutex::new(None),
        })
    }

    fn link(&self, next: &Arc<Field>) {
        let next: Weak<dyn Element> = Arc::<Field>::downgrade(next);
        *self.next.lock().unwrap() = Some(next);
    }

    fn label_width(&self) -> u16 {
        display_width(self.label) as u16
    }
}

impl Element for Field {
    fn draw(&self, screen: &dyn Screen) {
        let rect = self.rect();
        let text = self.text.lock().unwrap().clone();
        let marker = if *self.focused.lock().unwrap() { '>' } else { ' ' };
        screen.set_content(rect.x, rect.y, marker);
        // Right-align labels on the widest one.
        let column = *self.label_column.lock().unwrap();
        let label_x = rect.x + 2 + column.saturating_sub(self.label_width());
        let text_x = rect.x + 2 + column + 2;
        screen.print(label_x, rect.y, self.label);
        screen.print(rect.x + 2 + column, rect.y, ":");
        let used = screen.print(text_x, rect.y, &text);
        if *self.focused.lock().unwrap() {
            screen.show_cursor(text_x + used, rect.y);
        }
    }

    fn set_rect(&self, rect: Rect) {
        *self.rect.lock().unwrap() = rect;
    }

    fn rect(&self) -> Rect {
        *self.rect.lock().unwrap()
    }

    fn input_handler(&self) -> Option<InputHandler<'_>> {
        Some(Box::new(move |key: KeyEvent, delegate: FocusDelegate<'_>| {
            match key.code {
                KeyCode::Char(ch) => self.text.lock().unwrap().push(ch),
                KeyCode::Backspace => {
                    self.text.lock().unwrap().pop();
                }
                KeyCode::Tab => {
                    let next = self.next.lock().unwrap().as_ref().and_then(Weak::upgrade);
                    if let Some(next) = next {
                        delegate.set_focus(next);
                    }
                }
                _ => {}
            }
        }))
    }

    fn focus(&self, _delegate: FocusDelegate<'_>) {
        *self.focused.lock().unwrap() = true;
    }

    fn blur(&self) {
        *self.focused.lock().unwrap() = false;
    }
}

/// Lays out its fields top to bottom and hands focus to the first one.
struct Form {
    rect: Mutex<Rect>,
    fields: Vec<Arc<Field>>,
}

impl Form {
    fn new(fields: Vec<Arc<Field>>) -> Arc<Self> {
        let column = fields.iter().map(|field| field.label_width()).max().unwrap_or(0);
        for field in &fields {
            *field.label_column.lock().unwrap() = column;
        }
        Arc::new(Self {
            rect: Mutex::new(Rect::default()),
            fields,
        })
    }
}

impl Element for Form {
    fn draw(&self, screen: &dyn Screen) {
        let rect = self.rect();
        for (row, field) in self.fields.iter().enumerate() {
            field.set_rect(Rect::new(rect.x, rect.y + 2 + row as u16, rect.width, 1));
            field.draw(screen);
        }
    }

    fn set_rect(&self, rect: Rect) {
        *self.rect.lock().unwrap() = rect;
    }

    fn rect(&self) -> Rect {
        *self.rect.lock().unwrap()
    }

    fn focus(&self, delegate: FocusDelegate<'_>) {
        if let Some(first) = self.fields.first() {
            delegate.set_focus(Arc::clone(first) as SharedElement);
        }
    }
}

fn main() -> room_app::Result<()> {
    let mut config = AppConfig::default();
    if let Ok(path) = std::env::var("ROOM_APP_LOG") {
        if let Ok(sink) = FileSink::new(path, 1 << 20) {
            config = config.with_logger(Logger::new(sink));
            config.enable_metrics();
        }
    }

    let name = Field::new("name");
    let email = Field::new("email");
    name.link(&email);
    email.link(&name);

    let form = Form::new(vec![name, email]);

    let app = Application::with_config(config);
    app.set_before_draw(|screen| {
        screen.clear();
        screen.print(0, 0, "Tab switches fields, Ctrl-C quits");
        DrawFlow::Continue
    });
    app.set_root(form, true);
    app.run()
}
