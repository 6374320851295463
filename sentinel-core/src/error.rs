//! Error types for the Sentinel pipeline

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Malformed input from the inference provider; dropped with a warning,
    /// never fatal.
    #[error("Data quality error: {0}")]
    DataQuality(String),

    /// A notification sink could not deliver an alert; logged, never
    /// propagated to the decision loop.
    #[error("Sink error: {0}")]
    Sink(String),

    /// Model file missing, corrupt, or failed to load. Fatal to the
    /// affected stream.
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// Inference did not complete within the configured budget; the frame
    /// is skipped.
    #[error("Inference timed out after {elapsed_ms}ms")]
    InferenceTimeout { elapsed_ms: u64 },

    /// Video device or stream failure; retried with backoff at the capture
    /// boundary.
    #[error("Device error: {0}")]
    Device(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Device("camera 0 failed to open".to_string());
        assert!(err.to_string().contains("Device error"));
        assert!(err.to_string().contains("camera 0"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io_err.into();
        match err {
            Error::Io(_) => {}
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_timeout_carries_elapsed() {
        let err = Error::InferenceTimeout { elapsed_ms: 1000 };
        assert!(err.to_string().contains("1000ms"));
    }
}
