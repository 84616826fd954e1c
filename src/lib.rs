//! Application core for a terminal UI toolkit.
//!
//! [`Application`] owns the terminal [`Screen`] while running, tracks the
//! root [`Element`] and the element holding keyboard focus, and drives the
//! input loop and draw cycle. Screens and elements are capability traits;
//! concrete widgets live outside this crate.

pub mod app;
pub mod element;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod metrics;
pub mod screen;
pub mod width;

pub use app::{AfterDrawHook, AppConfig, Application, BeforeDrawHook, DrawFlow, InputCapture};
pub use element::{Element, FocusDelegate, InputHandler, SharedElement, same_element};
pub use error::{AppError, Result};
pub use geometry::{Rect, Size};
pub use logging::{
    FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink,
};
pub use metrics::{AppMetrics, MetricSnapshot};
pub use screen::{
    Cell, CellBuffer, CellChange, CrosstermScreen, Event, Screen, SimulationScreen, ctrl_c,
    same_key,
};
pub use width::display_width;
