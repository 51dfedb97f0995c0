//! Custom error types for the chart recommendation engine.
//!
//! This module provides the error hierarchy using `thiserror`. Errors fall
//! into two groups:
//!
//! - **Fatal construction errors** (`MissingEntity`, `MixedTypes`,
//!   `NonNumericMeasure`): the dataset does not match its claimed schema and
//!   cannot be visualized. These propagate out of [`crate::generate_charts`].
//! - **Engine failures** (`EngineFailure` and anything else returned by a
//!   [`crate::charts::ChartBuilder`]): caught by the generator, logged, and
//!   treated as "no charts from this engine".
//!
//! Errors are serializable so they can be forwarded to a frontend for display.

use crate::types::ChartType;
use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for chart generation.
#[derive(Error, Debug)]
pub enum ChartError {
    /// A dataset column could not be matched to any schema entity.
    #[error("Column '{column}' does not match any measure, level or property in cube '{cube}'")]
    MissingEntity { column: String, cube: String },

    /// A column mixes primitive types across rows.
    #[error("Column '{column}' mixes value types: expected {expected}, found {found}")]
    MixedTypes {
        column: String,
        expected: String,
        found: String,
    },

    /// A measure column holds a non-numeric value.
    #[error("Measure column '{column}' holds a non-numeric value: {value}")]
    NonNumericMeasure { column: String, value: String },

    /// A chart engine could not process the datagroup.
    #[error("Chart engine '{chart_type}' failed: {reason}")]
    EngineFailure {
        chart_type: ChartType,
        reason: String,
    },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ChartError>,
    },
}

impl ChartError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ChartError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get error code for frontend handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingEntity { .. } => "MISSING_ENTITY",
            Self::MixedTypes { .. } => "MIXED_TYPES",
            Self::NonNumericMeasure { .. } => "NON_NUMERIC_MEASURE",
            Self::EngineFailure { .. } => "ENGINE_FAILURE",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error means the dataset itself cannot be visualized.
    ///
    /// Fatal errors should not be retried: the dataset is structurally
    /// incompatible with its schema.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::MissingEntity { .. }
            | Self::MixedTypes { .. }
            | Self::NonNumericMeasure { .. } => true,
            Self::WithContext { source, .. } => source.is_fatal(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for ChartError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ChartError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for chart engine operations.
pub type Result<T> = std::result::Result<T, ChartError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        let error = ChartError::MissingEntity {
            column: "Foo".to_string(),
            cube: "sales".to_string(),
        };
        assert_eq!(error.error_code(), "MISSING_ENTITY");
        assert_eq!(
            ChartError::InvalidConfig("x".to_string()).error_code(),
            "INVALID_CONFIG"
        );
    }

    #[test]
    fn test_is_fatal() {
        let mixed = ChartError::MixedTypes {
            column: "Year".to_string(),
            expected: "number".to_string(),
            found: "string".to_string(),
        };
        assert!(mixed.is_fatal());

        let engine = ChartError::EngineFailure {
            chart_type: ChartType::Treemap,
            reason: "boom".to_string(),
        };
        assert!(!engine.is_fatal());
    }

    #[test]
    fn test_error_serialization() {
        let error = ChartError::NonNumericMeasure {
            column: "Sales".to_string(),
            value: "\"abc\"".to_string(),
        };
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("NON_NUMERIC_MEASURE"));
        assert!(json.contains("Sales"));
    }

    #[test]
    fn test_with_context() {
        let error = ChartError::MissingEntity {
            column: "Foo".to_string(),
            cube: "sales".to_string(),
        }
        .with_context("While classifying dataset 0");
        assert!(error.to_string().contains("While classifying dataset 0"));
        assert_eq!(error.error_code(), "MISSING_ENTITY");
        assert!(error.is_fatal());
    }
}
