use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossterm::event::KeyEvent;

use crate::logging::Logger;
use crate::metrics::AppMetrics;
use crate::screen::ctrl_c;

/// Configuration knobs for the application core.
#[derive(Clone)]
pub struct AppConfig {
    /// Optional structured logger used for lifecycle records.
    pub logger: Option<Logger>,
    /// Counters updated by the loop and draw pipeline.
    pub metrics: Option<Arc<Mutex<AppMetrics>>>,
    /// Target field used on every record the application emits.
    pub log_target: String,
    /// How often the terminal backend re-checks for shutdown while waiting for input.
    pub poll_interval: Duration,
    /// Key that stops the application. `None` leaves every key to the focus target.
    pub interrupt_key: Option<KeyEvent>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logger: None,
            metrics: None,
            log_target: "room::app".to_string(),
            poll_interval: Duration::from_millis(50),
            interrupt_key: Some(ctrl_c()),
        }
    }
}

impl AppConfig {
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_interrupt_key(mut self, key: Option<KeyEvent>) -> Self {
        self.interrupt_key = key;
        self
    }

    /// Enable metrics collection if it has not already been configured.
    pub fn enable_metrics(&mut self) {
        if self.metrics.is_none() {
            self.metrics = Some(Arc::new(Mutex::new(AppMetrics::new())));
        }
    }

    pub fn disable_metrics(&mut self) {
        self.metrics = None;
    }

    pub fn metrics_handle(&self) -> Option<Arc<Mutex<AppMetrics>>> {
        self.metrics.as_ref().map(Arc::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::same_key;

    #[test]
    fn defaults_stop_on_ctrl_c() {
        let config = AppConfig::default();
        assert!(same_key(&config.interrupt_key.unwrap(), &ctrl_c()));
        assert!(config.metrics.is_none());
        assert_eq!(config.log_target, "room::app");
    }

    #[test]
    fn enable_metrics_is_sticky() {
        let mut config = AppConfig::default();
        config.enable_metrics();
        let first = config.metrics_handle().unwrap();
        config.enable_metrics();
        assert!(Arc::ptr_eq(&first, &config.metrics_handle().unwrap()));
        config.disable_metrics();
        assert!(config.metrics_handle().is_none());
    }
}
