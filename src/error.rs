use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced to API callers or propagated out of the stores.
///
/// Malformed timestamps are deliberately absent: hour extraction recovers
/// locally (`Option`-returning parsers) and never aborts a scoring pass.
#[derive(Debug, Error)]
pub enum SentinelError {
    #[error("no baseline profile for this site/username")]
    ProfileNotFound { site: String, username: String },

    #[error("Account is locked due to suspicious activity")]
    AccountLocked,

    #[error("User not found")]
    SessionNotFound { username: String },

    #[error("profile storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("profile serialization error: {0}")]
    Persist(#[from] serde_json::Error),

    /// Geo-IP or forwarding failure. Always best-effort: logged by the
    /// enrichment layer and swallowed, never returned to an API caller.
    #[error("external lookup failed: {0}")]
    ExternalLookup(#[from] reqwest::Error),
}

impl actix_web::ResponseError for SentinelError {
    fn status_code(&self) -> StatusCode {
        match self {
            SentinelError::ProfileNotFound { .. } => StatusCode::NOT_FOUND,
            SentinelError::SessionNotFound { .. } => StatusCode::NOT_FOUND,
            SentinelError::AccountLocked => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "detail": self.to_string() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::ResponseError;

    #[test]
    fn status_codes_match_the_taxonomy() {
        let err = SentinelError::ProfileNotFound {
            site: "portal".into(),
            username: "alice".into(),
        };
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(SentinelError::AccountLocked.status_code(), StatusCode::FORBIDDEN);
        let err = SentinelError::SessionNotFound { username: "bob".into() };
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
