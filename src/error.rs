//! Application-level error type.
//!
//! `AppError` covers failures the process cannot recover from: invalid
//! configuration, unreadable inputs, broken artifacts. Recoverable model
//! failures (a candidate that fails to fit or score) are represented by the
//! narrow enums in `hmm` and handled locally by the selection layer; they
//! never become `AppError`s.
//!
//! Exit code conventions:
//! - 2: invalid configuration or input
//! - 3: insufficient data
//! - 4: internal/model error (I/O on artifacts, malformed cache, ...)

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    /// Invalid configuration or input (exit code 2).
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(2, message)
    }

    /// Insufficient data to proceed (exit code 3).
    pub fn data(message: impl Into<String>) -> Self {
        Self::new(3, message)
    }

    /// Internal failure: artifact I/O, serialization, invariant breakage (exit code 4).
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(4, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
