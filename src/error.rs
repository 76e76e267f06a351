//! Error types for the analytics pipeline.

use thiserror::Error;

/// Result type alias used across the crate.
pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Everything that can go wrong while generating, analysing or modelling
/// student data.
///
/// All variants are deterministic precondition or I/O failures; none of
/// them are worth retrying.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// A caller-supplied parameter is out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A statistic that needs at least one record was asked of none.
    #[error("cannot compute {operation} on an empty dataset")]
    EmptyDataset { operation: &'static str },

    /// The risk predictor was used before `train`.
    #[error("risk predictor must be trained first")]
    NotTrained,

    /// Fitting the classifier failed.
    #[error("model error: {0}")]
    Model(String),

    /// Drawing a chart image failed.
    #[error("render error: {0}")]
    Render(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

impl AnalyticsError {
    /// Create a new invalid argument error.
    #[must_use]
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument(reason.into())
    }

    /// Create a new empty dataset error for the named operation.
    #[must_use]
    pub fn empty(operation: &'static str) -> Self {
        Self::EmptyDataset { operation }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AnalyticsError::invalid("n_students must be positive");
        assert_eq!(err.to_string(), "invalid argument: n_students must be positive");

        let err = AnalyticsError::empty("summary statistics");
        assert_eq!(
            err.to_string(),
            "cannot compute summary statistics on an empty dataset"
        );
    }
}
