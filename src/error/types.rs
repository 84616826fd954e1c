use thiserror::Error;

/// Unified result type for the application core.
pub type Result<T> = std::result::Result<T, AppError>;

/// Errors surfaced by the application core and its screen backends.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("screen initialisation failed: {0}")]
    ScreenInit(String),
    #[error("terminal backend error: {0}")]
    Terminal(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn screen_init(err: impl std::fmt::Display) -> Self {
        Self::ScreenInit(err.to_string())
    }

    pub fn is_screen_init(&self) -> bool {
        matches!(self, Self::ScreenInit(_))
    }
}
