//! Error Kind
//!
//! Outward classification of a failure. Each kind maps to exactly one
//! HTTP status so the gateway never has to guess.

use serde::Serialize;

/// Classification of an [`AppError`](super::app_error::AppError)
///
/// ## Examples
/// ```rust
/// use kernel::error::kind::ErrorKind;
///
/// assert_eq!(ErrorKind::NotFound.status_code(), 404);
/// assert_eq!(ErrorKind::Conflict.as_str(), "Conflict");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorKind {
    /// 400 - malformed input (bad identity, bad JSON)
    BadRequest,
    /// 404 - code or pairing absent, consumed, or expired
    NotFound,
    /// 409 - identity already registered, duplicate key
    Conflict,
    /// 422 - well-formed but refers to something unusable (unknown participant)
    UnprocessableEntity,
    /// 500 - bug or storage failure
    InternalServerError,
    /// 503 - storage unreachable or code space temporarily exhausted
    ServiceUnavailable,
}

impl ErrorKind {
    /// HTTP status code for this kind
    #[inline]
    pub const fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::UnprocessableEntity => 422,
            ErrorKind::InternalServerError => 500,
            ErrorKind::ServiceUnavailable => 503,
        }
    }

    /// Reason phrase used as the problem `title`
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "Bad Request",
            ErrorKind::NotFound => "Not Found",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::UnprocessableEntity => "Unprocessable Entity",
            ErrorKind::InternalServerError => "Internal Server Error",
            ErrorKind::ServiceUnavailable => "Service Unavailable",
        }
    }

    /// 5xx kinds; these are the ones worth an `error!` log line
    #[inline]
    pub const fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }

    #[inline]
    pub const fn is_client_error(&self) -> bool {
        let code = self.status_code();
        code >= 400 && code < 500
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ErrorKind::BadRequest.status_code(), 400);
        assert_eq!(ErrorKind::NotFound.status_code(), 404);
        assert_eq!(ErrorKind::Conflict.status_code(), 409);
        assert_eq!(ErrorKind::UnprocessableEntity.status_code(), 422);
        assert_eq!(ErrorKind::InternalServerError.status_code(), 500);
        assert_eq!(ErrorKind::ServiceUnavailable.status_code(), 503);
    }

    #[test]
    fn test_client_server_split() {
        assert!(ErrorKind::NotFound.is_client_error());
        assert!(!ErrorKind::NotFound.is_server_error());
        assert!(ErrorKind::ServiceUnavailable.is_server_error());
        assert!(!ErrorKind::InternalServerError.is_client_error());
    }

    #[test]
    fn test_serialized_name() {
        let json = serde_json::to_string(&ErrorKind::UnprocessableEntity).unwrap();
        assert_eq!(json, r#""UNPROCESSABLE_ENTITY""#);
    }
}
