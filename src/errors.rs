// src/errors.rs
// DOCUMENTATION: Custom error types and HTTP responses
// PURPOSE: Centralized error handling for entire application

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Application-specific error types
/// DOCUMENTATION: One variant per failure kind the service can surface
/// Each variant maps to an HTTP status code and a stable machine-readable code
#[derive(Error, Debug)]
pub enum PlacesError {
    #[error("Place not found with id: {0}")]
    NotFound(String),

    #[error("No user found for owner id: {0}")]
    OwnerNotFound(Uuid),

    #[error("Forbidden access")]
    Forbidden,

    #[error("Rating must be an integer between 1 and 5, got {0}")]
    InvalidRating(i32),

    #[error("Could not resolve address: {0}")]
    GeocodingFailure(String),

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Storage error: {0}")]
    StorageFailure(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Convert PlacesError to HTTP response
/// DOCUMENTATION: Maps error types to HTTP status codes and JSON responses
impl ResponseError for PlacesError {
    fn error_response(&self) -> HttpResponse {
        let (status, error_code) = match self {
            PlacesError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            PlacesError::OwnerNotFound(_) => (StatusCode::NOT_FOUND, "OWNER_NOT_FOUND"),
            PlacesError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            PlacesError::InvalidRating(_) => (StatusCode::BAD_REQUEST, "INVALID_RATING"),
            PlacesError::GeocodingFailure(_) => (StatusCode::BAD_GATEWAY, "GEOCODING_FAILURE"),
            PlacesError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            PlacesError::StorageFailure(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_FAILURE")
            }
            PlacesError::ValidationError(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        };

        let body = json!({
            "error": {
                "code": error_code,
                "message": self.to_string(),
                "timestamp": chrono::Utc::now().to_rfc3339()
            }
        });

        HttpResponse::build(status).json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            PlacesError::NotFound(_) => StatusCode::NOT_FOUND,
            PlacesError::OwnerNotFound(_) => StatusCode::NOT_FOUND,
            PlacesError::Forbidden => StatusCode::FORBIDDEN,
            PlacesError::InvalidRating(_) => StatusCode::BAD_REQUEST,
            PlacesError::GeocodingFailure(_) => StatusCode::BAD_GATEWAY,
            PlacesError::Unauthorized => StatusCode::UNAUTHORIZED,
            PlacesError::StorageFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PlacesError::ValidationError(_) => StatusCode::BAD_REQUEST,
        }
    }
}
