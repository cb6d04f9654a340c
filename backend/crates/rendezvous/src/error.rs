//! Rendezvous Error Types
//!
//! Domain failures of the code registry and pairing engine. They convert
//! into `kernel::error::AppError` at the HTTP edge.

use crate::domain::value_objects::IdentityError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Rendezvous-specific result type alias
pub type RendezvousResult<T> = Result<T, RendezvousError>;

/// Rendezvous-specific error variants
///
/// Expiry is never reported on its own: an expired code is simply
/// [`RendezvousError::NotFound`].
#[derive(Debug, Error)]
pub enum RendezvousError {
    /// Code or pairing absent, consumed, cancelled or expired
    #[error("Code or pairing not found")]
    NotFound,

    /// Identity already registered
    #[error("Identity already exists")]
    AlreadyExists,

    /// Directed pairing references an identity nobody registered
    #[error("Participant not registered: {0}")]
    ParticipantUnknown(String),

    /// Directed pairing where sender and receiver are the same identity
    #[error("Sender and receiver must differ")]
    SelfRequest,

    /// Identity failed validation
    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    /// Code already maps to a live entry. Retried by code issuance, never
    /// returned to callers.
    #[error("Code already in use")]
    DuplicateCode,

    /// Every generation attempt collided
    #[error("No free code after {attempts} attempts")]
    CodeSpaceExhausted { attempts: u32 },

    /// Rejected configuration (startup only)
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RendezvousError {
    /// Get the ErrorKind for this error
    ///
    /// Database errors are refined further by the kernel conversion when the
    /// error is turned into an `AppError`.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RendezvousError::NotFound => ErrorKind::NotFound,
            RendezvousError::AlreadyExists => ErrorKind::Conflict,
            RendezvousError::ParticipantUnknown(_) | RendezvousError::SelfRequest => {
                ErrorKind::UnprocessableEntity
            }
            RendezvousError::InvalidIdentity(_) => ErrorKind::BadRequest,
            RendezvousError::CodeSpaceExhausted { .. } => ErrorKind::ServiceUnavailable,
            RendezvousError::DuplicateCode
            | RendezvousError::Configuration(_)
            | RendezvousError::Database(_)
            | RendezvousError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            RendezvousError::Database(e) => {
                tracing::error!(error = %e, "Rendezvous database error");
            }
            RendezvousError::Internal(msg) | RendezvousError::Configuration(msg) => {
                tracing::error!(message = %msg, "Rendezvous internal error");
            }
            RendezvousError::DuplicateCode => {
                tracing::error!("Duplicate code escaped the issuance loop");
            }
            RendezvousError::CodeSpaceExhausted { attempts } => {
                tracing::warn!(attempts = attempts, "Code space exhausted");
            }
            _ => {
                tracing::debug!(error = %self, "Rendezvous error");
            }
        }
    }
}

impl From<IdentityError> for RendezvousError {
    fn from(err: IdentityError) -> Self {
        RendezvousError::InvalidIdentity(err.to_string())
    }
}

impl From<RendezvousError> for AppError {
    fn from(err: RendezvousError) -> Self {
        match err {
            RendezvousError::Database(e) => AppError::from(e),
            RendezvousError::ParticipantUnknown(_) => AppError::new(err.kind(), err.to_string())
                .with_action("Register both identities before pairing"),
            RendezvousError::NotFound => {
                AppError::new(err.kind(), err.to_string()).with_action("Request a new code")
            }
            other => AppError::new(other.kind(), other.to_string()),
        }
    }
}

impl IntoResponse for RendezvousError {
    fn into_response(self) -> Response {
        self.log();
        AppError::from(self).into_response()
    }
}
