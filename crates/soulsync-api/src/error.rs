use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use soulsync_db::DbError;

use crate::auth::AuthError;
use crate::views;

#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or malformed form field. Handlers normally render these back
    /// onto the form themselves.
    #[error("{0}")]
    Validation(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Not signed in")]
    Unauthorized,

    #[error("Not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DbError> for AppError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::ConstraintViolation(msg) => AppError::ConstraintViolation(msg),
            other => AppError::Storage(other.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => AppError::InvalidCredentials,
            AuthError::Validation(msg) => AppError::Validation(msg),
            AuthError::Db(db) => db.into(),
            AuthError::Token(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl AppError {
    /// Message safe to show on a form, if this error belongs there.
    pub fn form_message(&self) -> Option<String> {
        match self {
            AppError::Validation(msg) => Some(msg.clone()),
            AppError::InvalidCredentials => Some("Invalid credentials".to_string()),
            AppError::ConstraintViolation(_) => {
                Some("That conflicts with existing data.".to_string())
            }
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Unauthorized => Redirect::to("/login").into_response(),
            AppError::NotFound => {
                (StatusCode::NOT_FOUND, views::not_found()).into_response()
            }
            AppError::Validation(_)
            | AppError::InvalidCredentials
            | AppError::ConstraintViolation(_) => {
                warn!("Unhandled form error: {}", self);
                let message = self.form_message().unwrap_or_default();
                (StatusCode::BAD_REQUEST, views::error_page(&message)).into_response()
            }
            AppError::Storage(_) | AppError::Internal(_) => {
                error!("{}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    views::error_page("Something went wrong. Please try again."),
                )
                    .into_response()
            }
        }
    }
}
