// ishop/src/errors.rs

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use shopflow::FlowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  // Random or sequential code generation gave up after its retry budget.
  #[error("Identifier space exhausted for prefix '{prefix}' after {attempts} attempts")]
  IdSpaceExhausted { prefix: &'static str, attempts: u32 },

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Upload Error: {0}")]
  Upload(String),

  #[error("Workflow Error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<std::io::Error> for AppError {
  fn from(err: std::io::Error) -> Self {
    AppError::Upload(err.to_string())
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::IdSpaceExhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
      AppError::Config(_)
      | AppError::Sqlx(_)
      | AppError::Upload(_)
      | AppError::Workflow { .. }
      | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    // Client errors carry their message verbatim; server errors are logged
    // in full and answered generically.
    let message = match self {
      AppError::Validation(m) | AppError::Auth(m) | AppError::Forbidden(m) | AppError::NotFound(m) => m.clone(),
      AppError::IdSpaceExhausted { .. } => "Could not allocate an identifier, please retry".to_string(),
      AppError::Sqlx(_) => "Database operation failed".to_string(),
      AppError::Upload(_) => "Image upload failed".to_string(),
      AppError::Workflow { source } => {
        tracing::error!(flow_error = ?source, "Workflow error details");
        "Workflow processing error".to_string()
      }
      AppError::Config(_) | AppError::Internal(_) => "Server error".to_string(),
    };

    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with server error");
    } else {
      tracing::warn!(application_error = %self, "Responding with client error");
    }
    HttpResponse::build(status).json(json!({ "message": message }))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
