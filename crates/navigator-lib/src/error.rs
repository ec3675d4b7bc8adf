use std::path::PathBuf;

use thiserror::Error;

/// Convenient result alias for the navigator library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// A numeric or categorical input field failed validation.
    #[error("invalid {field}: {message}")]
    InvalidInput { field: String, message: String },

    /// An intensity denominator (energy or distance) was not positive, or was
    /// too small for the ratio to stay finite.
    #[error("intensity is undefined: {denominator} denominator {value} gives no finite ratio")]
    DegenerateDivision {
        denominator: &'static str,
        value: f64,
    },

    /// The injected CO2 predictor failed or produced an unusable value.
    #[error("CO2 predictor failed: {message}")]
    Predictor { message: String },

    /// Target derivation was attempted without any vessel with a defined intensity.
    #[error("cannot derive a regulatory target from an empty fleet")]
    EmptyFleet,

    /// Raised by the strict grouping policy when one vessel reports several ship types.
    #[error("vessel {ship_id} has inconsistent ship types: '{first}' and '{conflicting}'")]
    InconsistentShipType {
        ship_id: String,
        first: String,
        conflicting: String,
    },

    /// Raised when a voyage CSV is structurally unusable (e.g. missing columns).
    #[error("invalid voyage data: {message}")]
    VoyageData { message: String },

    /// Raised when an expected artifact file is not present.
    #[error("artifact not found at {path}")]
    ArtifactNotFound { path: PathBuf },

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for CSV reader/writer errors.
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// Wrapper for JSON (de)serialization errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build an [`Error::InvalidInput`] for the named field.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Stable snake_case label for logs, metrics, and problem responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidInput { .. } => "input_error",
            Error::DegenerateDivision { .. } => "degenerate_division",
            Error::Predictor { .. } => "upstream_predictor",
            Error::EmptyFleet => "empty_fleet",
            Error::InconsistentShipType { .. } => "inconsistent_ship_type",
            Error::VoyageData { .. } => "voyage_data",
            Error::ArtifactNotFound { .. } => "artifact_not_found",
            Error::Io(_) => "io",
            Error::Csv(_) => "csv",
            Error::Json(_) => "json",
        }
    }
}

/// Reject NaN/infinite values and negative values for a named field.
pub(crate) fn ensure_non_negative(field: &str, value: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(Error::invalid(field, format!("must be finite, got {value}")));
    }
    if value < 0.0 {
        return Err(Error::invalid(
            field,
            format!("must be non-negative, got {value}"),
        ));
    }
    Ok(value)
}

/// Reject empty (or whitespace-only) categorical fields.
pub(crate) fn ensure_not_blank(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::invalid(field, "must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_distinguishable() {
        assert_eq!(Error::EmptyFleet.kind(), "empty_fleet");
        assert_eq!(
            Error::Predictor {
                message: "boom".into()
            }
            .kind(),
            "upstream_predictor"
        );
        assert_eq!(
            Error::DegenerateDivision {
                denominator: "energy",
                value: 0.0
            }
            .kind(),
            "degenerate_division"
        );
    }

    #[test]
    fn non_negative_rejects_nan_and_negative() {
        assert!(ensure_non_negative("distance", f64::NAN).is_err());
        assert!(ensure_non_negative("distance", f64::INFINITY).is_err());
        assert!(ensure_non_negative("distance", -1.0).is_err());
        assert_eq!(ensure_non_negative("distance", 0.0).unwrap(), 0.0);
    }

    #[test]
    fn invalid_input_message_names_field() {
        let err = Error::invalid("fuel_type", "must not be empty");
        assert_eq!(err.to_string(), "invalid fuel_type: must not be empty");
    }
}
