//! Caller role extractor
//!
//! Authentication happens upstream; by the time a request reaches this
//! service the auth layer has already set the caller's role header. Guests
//! submit requests and follow the queue, operators move requests through
//! their lifecycle.

use crate::error::QueueError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::warn;

/// Header carrying the pre-validated caller role
pub const ROLE_HEADER: &str = "x-karaoke-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Guest,
    Operator,
}

/// Role of the current caller; absent or unknown header means guest
#[derive(Debug, Clone, Copy)]
pub struct Caller {
    pub role: Role,
}

impl Caller {
    pub fn require_operator(&self) -> Result<(), QueueError> {
        match self.role {
            Role::Operator => Ok(()),
            Role::Guest => Err(QueueError::Forbidden(
                "Operator role required".to_string(),
            )),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = QueueError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let role = match parts.headers.get(ROLE_HEADER).map(|v| v.to_str()) {
            Some(Ok(value)) if value.trim().eq_ignore_ascii_case("operator") => Role::Operator,
            Some(Ok(_)) | None => Role::Guest,
            Some(Err(_)) => {
                warn!(uri = %parts.uri, "Unreadable role header");
                Role::Guest
            }
        };
        Ok(Caller { role })
    }
}
