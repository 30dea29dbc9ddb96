use axum::{http::StatusCode, response::Json};
use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use tracing::{error, warn};

use crate::error::ApiError;
use crate::models::responses::{empty_data, Envelope};

pub type Formatted<T> = (StatusCode, Json<Envelope<T>>);

pub fn ok<T: Serialize>(message: impl Into<String>, data: T) -> Formatted<T> {
    (
        StatusCode::OK,
        Json(Envelope {
            success: true,
            message: message.into(),
            data,
        }),
    )
}

pub fn fail(message: impl Into<String>, data: JsonValue, status: StatusCode) -> Formatted<JsonValue> {
    (
        status,
        Json(Envelope {
            success: false,
            message: message.into(),
            data,
        }),
    )
}

/// Maps an [`ApiError`] onto its envelope. Missing parameters use the configured
/// status so deployments can opt out of the historical 200.
pub fn from_error(err: &ApiError, missing_parameter_status: StatusCode) -> Formatted<JsonValue> {
    match err {
        ApiError::Validation { message, errors } => {
            warn!("Rejected request: {:?}", errors.errors);
            fail(
                message.as_str(),
                json!({ "errors": errors.errors }),
                StatusCode::UNPROCESSABLE_ENTITY,
            )
        }
        ApiError::MissingParameter(message) => {
            warn!("Rejected request: {}", message);
            fail(message.as_str(), empty_data(), missing_parameter_status)
        }
        ApiError::Store(source) => {
            error!("Store query failed: {}", source);
            fail(err.to_string(), empty_data(), StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldErrors;
    use crate::models::query::Field;
    use crate::models::storage::StorageError;

    #[test]
    fn ok_wraps_data() {
        let (status, Json(envelope)) = ok("Data retrieved successfully", vec![1, 2, 3]);
        assert_eq!(status, StatusCode::OK);
        assert!(envelope.success);
        assert_eq!(envelope.message, "Data retrieved successfully");
        assert_eq!(envelope.data, vec![1, 2, 3]);
    }

    #[test]
    fn validation_errors_use_422_with_field_detail() {
        let mut errors = FieldErrors::new();
        errors.add("paginate", "The paginate field must be at least 1.");
        let err = ApiError::validation("Validation error", errors);

        let (status, Json(envelope)) = from_error(&err, StatusCode::OK);
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(!envelope.success);
        assert_eq!(
            envelope.data["errors"]["paginate"][0],
            "The paginate field must be at least 1."
        );
    }

    #[test]
    fn missing_parameter_uses_configured_status() {
        let err = ApiError::MissingParameter("Year parameter is required".to_string());

        let (status, Json(envelope)) = from_error(&err, StatusCode::OK);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(envelope.data, empty_data());

        let (status, _) = from_error(&err, StatusCode::BAD_REQUEST);
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn store_errors_hide_details() {
        let err = ApiError::from(StorageError::InvalidPredicate {
            field: Field::Year,
            reason: "'abc' is not an integer".to_string(),
        });

        let (status, Json(envelope)) = from_error(&err, StatusCode::OK);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(envelope.message, "Failed to retrieve books");
    }
}
