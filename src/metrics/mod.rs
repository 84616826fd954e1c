use crate::logging::{LogEvent, LogFields, LogLevel};
use serde_json::json;
use std::time::Duration;

/// Counters collected by the application loop and draw pipeline.
#[derive(Debug, Default, Clone)]
pub struct AppMetrics {
    events: u64,
    keys_dispatched: u64,
    keys_suppressed: u64,
    draws: u64,
    draws_vetoed: u64,
    resizes: u64,
    focus_changes: u64,
}

impl AppMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_event(&mut self) {
        self.events = self.events.saturating_add(1);
    }

    pub fn record_key_dispatched(&mut self) {
        self.keys_dispatched = self.keys_dispatched.saturating_add(1);
    }

    pub fn record_key_suppressed(&mut self) {
        self.keys_suppressed = self.keys_suppressed.saturating_add(1);
    }

    pub fn record_draw(&mut self, vetoed: bool) {
        self.draws = self.draws.saturating_add(1);
        if vetoed {
            self.draws_vetoed = self.draws_vetoed.saturating_add(1);
        }
    }

    pub fn record_resize(&mut self) {
        self.resizes = self.resizes.saturating_add(1);
    }

    pub fn record_focus_change(&mut self) {
        self.focus_changes = self.focus_changes.saturating_add(1);
    }

    pub fn snapshot(&self, uptime: Duration) -> MetricSnapshot {
        MetricSnapshot {
            uptime_ms: uptime.as_millis() as u64,
            events: self.events,
            keys_dispatched: self.keys_dispatched,
            keys_suppressed: self.keys_suppressed,
            draws: self.draws,
            draws_vetoed: self.draws_vetoed,
            resizes: self.resizes,
            focus_changes: self.focus_changes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSnapshot {
    pub uptime_ms: u64,
    pub events: u64,
    pub keys_dispatched: u64,
    pub keys_suppressed: u64,
    pub draws: u64,
    pub draws_vetoed: u64,
    pub resizes: u64,
    pub focus_changes: u64,
}

impl MetricSnapshot {
    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "app_metrics", self.as_fields())
    }

    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("uptime_ms".to_string(), json!(self.uptime_ms));
        map.insert("events".to_string(), json!(self.events));
        map.insert("keys_dispatched".to_string(), json!(self.keys_dispatched));
        map.insert("keys_suppressed".to_string(), json!(self.keys_suppressed));
        map.insert("draws".to_string(), json!(self.draws));
        map.insert("draws_vetoed".to_string(), json!(self.draws_vetoed));
        map.insert("resizes".to_string(), json!(self.resizes));
        map.insert("focus_changes".to_string(), json!(self.focus_changes));
        map
    }
}
