use thiserror::Error;

/// Fail-fast errors for lifecycle and configuration misuse.
///
/// Failures inside individual pipeline elements are deliberately not part of
/// this enum: an updater or renderer that errors during its step is caught,
/// logged and isolated so the rest of the frame keeps running.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine was operated outside its allowed lifecycle state
    /// (e.g. `start()` after `destroy()`).
    #[error("invalid engine state: {0}")]
    InvalidState(String),

    /// Malformed input at a configuration surface; no partial mutation
    /// has taken place.
    #[error("configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
