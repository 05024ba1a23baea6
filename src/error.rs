use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::fmt;

use crate::models::ErrorResponse;

/// Application error types
#[derive(Debug)]
pub enum AppError {
    /// Invalid request data
    ValidationError(String),
    /// Internal server error
    InternalError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (error_code, message) = match self {
            AppError::ValidationError(msg) => ("validation_error", msg.clone()),
            AppError::InternalError(msg) => ("internal_error", msg.clone()),
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: error_code.to_string(),
            message,
        })
    }
}

/// Validation functions
pub fn validate_field_size(count: usize) -> Result<(), AppError> {
    if count < 2 {
        return Err(AppError::ValidationError(format!(
            "At least 2 horses required, got {}",
            count
        )));
    }
    Ok(())
}

pub fn validate_program_numbers(programs: &[u8]) -> Result<(), AppError> {
    let mut seen = std::collections::HashSet::new();
    for &program in programs {
        if program == 0 {
            return Err(AppError::ValidationError(
                "Program numbers start at 1".to_string(),
            ));
        }
        if !seen.insert(program) {
            return Err(AppError::ValidationError(format!(
                "Duplicate program number {}",
                program
            )));
        }
    }
    Ok(())
}

pub fn validate_bankroll(bankroll: f64) -> Result<(), AppError> {
    if !bankroll.is_finite() || bankroll < 0.0 {
        return Err(AppError::ValidationError(format!(
            "Bankroll must be non-negative, got {}",
            bankroll
        )));
    }
    Ok(())
}

pub fn validate_min_overlay(min_overlay: f64) -> Result<(), AppError> {
    if !min_overlay.is_finite() {
        return Err(AppError::ValidationError(format!(
            "Overlay threshold must be finite, got {}",
            min_overlay
        )));
    }
    Ok(())
}
