use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")] Database(#[from] sea_orm::DbErr),

    #[error("Record not found")]
    NotFound,

    #[error("Duplicate key: {0}")] KeyConflict(String),

    #[error("Invalid input: {0}")] InvalidInput(String),

    #[error("Oracle error: {0}")] Oracle(String),

    #[error("Notify error: {0}")] Notify(String),

    #[error("Configuration error: {0}")] Config(String),

    #[error("Internal error: {0}")] Internal(String),
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(serde::Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AppError {
    pub fn to_error_response(&self) -> ErrorResponse {
        // Server-side failures keep their detail out of the response body;
        // the full error is logged where it happens.
        let (code, message, field) = match self {
            AppError::Database(_) => ("DATABASE_ERROR", "Internal server error".to_string(), None),
            AppError::NotFound => ("NOT_FOUND", "Record not found".to_string(), None),
            AppError::KeyConflict(field) =>
                (
                    "DUPLICATE_ENTRY",
                    format!("An active record with this {} already exists", field),
                    Some(field.clone()),
                ),
            AppError::InvalidInput(msg) => ("INVALID_INPUT", msg.clone(), None),
            AppError::Oracle(_) => ("ORACLE_ERROR", "Internal server error".to_string(), None),
            AppError::Notify(_) => ("NOTIFY_ERROR", "Internal server error".to_string(), None),
            AppError::Config(_) => ("CONFIG_ERROR", "Internal server error".to_string(), None),
            AppError::Internal(_) => ("INTERNAL_ERROR", "Internal server error".to_string(), None),
        };

        ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                field,
            },
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::NotFound => axum::http::StatusCode::NOT_FOUND,
            AppError::KeyConflict(_) => axum::http::StatusCode::CONFLICT,
            AppError::InvalidInput(_) => axum::http::StatusCode::BAD_REQUEST,
            _ => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == axum::http::StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }

        let response = self.to_error_response();
        (status, axum::Json(response)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
