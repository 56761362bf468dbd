use crate::db::errors::DbError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

/// Why a request was rejected before it reached the store. The key is returned to clients as
/// `errorKey`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// A create request carried an identifier
    IdExists,
    /// An update request carried no identifier
    IdNull,
    /// The body identifier differs from the path identifier
    IdInvalid,
    /// The identifier to update does not exist
    IdNotFound,
    /// A field failed validation
    Invalid,
}

impl RejectReason {
    pub fn key(&self) -> &'static str {
        match self {
            RejectReason::IdExists => "idexists",
            RejectReason::IdNull => "idnull",
            RejectReason::IdInvalid => "idinvalid",
            RejectReason::IdNotFound => "idnotfound",
            RejectReason::Invalid => "invalid",
        }
    }
}

#[derive(ThisError, Debug)]
pub enum Error {
    /// Invalid request data or business rule violation
    #[error("{message}")]
    BadRequest { message: String },

    /// A request rejected for a reason tied to one entity kind (e.g. a create with an id)
    #[error("{message}")]
    Rejected {
        message: String,
        entity: &'static str,
        reason: RejectReason,
    },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn rejected(entity: &'static str, reason: RejectReason, message: impl Into<String>) -> Self {
        Error::Rejected {
            message: message.into(),
            entity,
            reason,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::Rejected { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::StaleUpdate { .. } => StatusCode::CONFLICT,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::NotNullViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::InvalidColumn { .. } => StatusCode::BAD_REQUEST,
                DbError::ColumnMismatch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::BadRequest { message } => message.clone(),
            Error::Rejected { message, .. } => message.clone(),
            Error::NotFound { resource, id } => {
                format!("{resource} with ID {id} not found")
            }
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::StaleUpdate { .. } => db_err.to_string(),
                DbError::UniqueViolation { .. } => "Resource already exists".to_string(),
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::NotNullViolation { .. } => "A required field is missing".to_string(),
                DbError::InvalidColumn { column, .. } => format!("Unknown field '{column}'"),
                DbError::ColumnMismatch { .. } | DbError::Other(_) => "Database error occurred".to_string(),
            },
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_) | DbError::ColumnMismatch { .. }) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::BadRequest { .. } | Error::Rejected { .. } | Error::NotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();

        match &self {
            // Rejections carry the entity and reason so clients can show a specific message
            Error::Rejected { message, entity, reason } => {
                let body = json!({
                    "message": message,
                    "entityName": entity,
                    "errorKey": reason.key(),
                });
                (status, Json(body)).into_response()
            }
            _ => {
                let user_message = self.user_message();
                (status, user_message).into_response()
            }
        }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
