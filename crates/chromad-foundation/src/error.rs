use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Shutdown requested")]
    ShutdownRequested,

    #[error("Fatal error, cannot recover: {0}")]
    Fatal(String),
}

impl AppError {
    /// Whether the pipeline must stop. Everything else is local to one frame
    /// and the loop continues with the next one.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AppError::Config(_) | AppError::Fatal(_) | AppError::ShutdownRequested
        )
    }
}

/// Errors from the byte transport seam.
///
/// A read that times out with no data is NOT an error; sources report that
/// as `Ok(0)` so the caller can loop and check its shutdown flag.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Byte source disconnected")]
    Disconnected,

    #[error("I/O error on byte source: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration problems are detected at startup and fail fast; none of
/// these can occur mid-stream.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("Frame length {got} is below the minimum of {min} samples")]
    FrameTooShort { min: usize, got: usize },

    #[error("Reference {kind} array has {got} entries, feature vector needs {expected}")]
    ScalerLengthMismatch {
        kind: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Label table has {got} entries for {expected} classes")]
    LabelCountMismatch { expected: usize, got: usize },

    #[error("Engine input length {engine} does not match feature vector length {expected}")]
    EngineInputMismatch { expected: usize, engine: usize },

    #[error("Engine output length {engine} does not match class count {expected}")]
    EngineOutputMismatch { expected: usize, engine: usize },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
