//! Error types for pima-explorer

use thiserror::Error;

/// Result type alias for pima-explorer operations
pub type Result<T> = std::result::Result<T, PimaError>;

/// Main error type for the analysis pipeline
#[derive(Error, Debug)]
pub enum PimaError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Clustering error: {0}")]
    ClusteringError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Plot error: {0}")]
    PlotError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },
}

impl PimaError {
    pub(crate) fn invalid_parameter(
        name: &str,
        value: impl ToString,
        reason: &str,
    ) -> Self {
        PimaError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<polars::error::PolarsError> for PimaError {
    fn from(err: polars::error::PolarsError) -> Self {
        PimaError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for PimaError {
    fn from(err: serde_json::Error) -> Self {
        PimaError::SerializationError(err.to_string())
    }
}

impl From<regex::Error> for PimaError {
    fn from(err: regex::Error) -> Self {
        PimaError::ConfigError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for PimaError {
    fn from(err: ndarray::ShapeError) -> Self {
        PimaError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PimaError::DataError("test error".to_string());
        assert_eq!(err.to_string(), "Data error: test error");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PimaError = io_err.into();
        assert!(matches!(err, PimaError::IoError(_)));
    }

    #[test]
    fn test_invalid_parameter_display() {
        let err = PimaError::invalid_parameter("m", 1.0, "fuzziness must be > 1");
        assert_eq!(err.to_string(), "Invalid parameter: m = 1, fuzziness must be > 1");
    }
}
