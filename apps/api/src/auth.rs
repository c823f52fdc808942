//! Caller identity.
//!
//! Authentication itself is delegated to the external identity provider;
//! the edge verifies the token and forwards the subject and role claim as
//! headers. The core only trusts that claim and gates pipeline actions on
//! it. Every operation takes an explicit `Session` — there is no ambient
//! current-user state.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use uuid::Uuid;

use crate::errors::AppError;

const ACTOR_ID_HEADER: &str = "x-actor-id";
const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// Role claim embedded in the identity provider's token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Applicant,
    Recruiter,
}

impl Role {
    fn parse(s: &str) -> Option<Role> {
        match s {
            "applicant" => Some(Role::Applicant),
            "recruiter" => Some(Role::Recruiter),
            _ => None,
        }
    }
}

/// Verified caller identity, passed explicitly into core operations.
#[derive(Debug, Clone, Copy)]
pub struct Session {
    pub actor_id: Uuid,
    pub role: Role,
}

impl Session {
    /// Pipeline actions (scoring passes, transitions, interview management)
    /// are recruiter-only.
    pub fn require_recruiter(&self) -> Result<(), AppError> {
        match self.role {
            Role::Recruiter => Ok(()),
            Role::Applicant => Err(AppError::Forbidden),
        }
    }

    /// Submission is done by the applicant themselves; the session's actor
    /// id becomes the applicant id.
    pub fn require_applicant(&self) -> Result<(), AppError> {
        match self.role {
            Role::Applicant => Ok(()),
            Role::Recruiter => Err(AppError::Forbidden),
        }
    }

    fn from_headers(headers: &HeaderMap) -> Result<Session, AppError> {
        let actor_id = headers
            .get(ACTOR_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or(AppError::Unauthorized)?;
        let role = headers
            .get(ACTOR_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(Role::parse)
            .ok_or(AppError::Unauthorized)?;
        Ok(Session { actor_id, role })
    }
}

#[async_trait::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Session {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Session::from_headers(&parts.headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(id: &str, role: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(ACTOR_ID_HEADER, HeaderValue::from_str(id).unwrap());
        h.insert(ACTOR_ROLE_HEADER, HeaderValue::from_str(role).unwrap());
        h
    }

    #[test]
    fn test_recruiter_session_parses() {
        let id = Uuid::new_v4();
        let session = Session::from_headers(&headers(&id.to_string(), "recruiter")).unwrap();
        assert_eq!(session.actor_id, id);
        assert_eq!(session.role, Role::Recruiter);
        assert!(session.require_recruiter().is_ok());
    }

    #[test]
    fn test_applicant_cannot_drive_pipeline() {
        let id = Uuid::new_v4().to_string();
        let session = Session::from_headers(&headers(&id, "applicant")).unwrap();
        assert!(matches!(
            session.require_recruiter(),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn test_unknown_role_rejected() {
        let id = Uuid::new_v4().to_string();
        let result = Session::from_headers(&headers(&id, "admin"));
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_missing_headers_rejected() {
        let result = Session::from_headers(&HeaderMap::new());
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }
}
