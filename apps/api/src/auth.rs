//! Bearer-session authentication.
//!
//! Every route except `/health` needs an `OrgContext`. The extractor asks the
//! configured [`Authorizer`] to turn request headers into one.
//!
//! ```text
//! Authorization: Bearer <token>
//!        │
//!        ▼
//! sessions.token ──► expired? ──► active_organization_id ──► OrgContext
//! ```

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use chrono::Utc;
use tracing::{debug, warn};

use tally_db::{Database, DbError};

use crate::error::ApiError;
use crate::AppState;

/// Who is calling, and on behalf of which organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgContext {
    pub organization_id: String,
    pub user_id: String,
    pub session_id: String,
}

/// Why a request was not authorized.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingHeader,

    #[error("Authorization header must be 'Bearer <token>'")]
    MalformedToken,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Session expired")]
    SessionExpired,

    #[error("Session has no active organization")]
    NoActiveOrganization,

    #[error(transparent)]
    Database(#[from] DbError),
}

/// Resolves request headers into an [`OrgContext`].
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn authorize(&self, headers: &HeaderMap) -> Result<OrgContext, AuthError>;
}

/// Pulls the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::MalformedToken)?;

    let (scheme, token) = value.split_once(' ').ok_or(AuthError::MalformedToken)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::MalformedToken);
    }
    Ok(token)
}

/// Looks bearer tokens up in the `sessions` table.
#[derive(Debug, Clone)]
pub struct SessionAuthorizer {
    db: Database,
}

impl SessionAuthorizer {
    pub fn new(db: Database) -> Self {
        SessionAuthorizer { db }
    }
}

#[async_trait]
impl Authorizer for SessionAuthorizer {
    async fn authorize(&self, headers: &HeaderMap) -> Result<OrgContext, AuthError> {
        let token = bearer_token(headers)?;

        let session = self
            .db
            .sessions()
            .find_by_token(token)
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        if session.is_expired_at(Utc::now()) {
            return Err(AuthError::SessionExpired);
        }

        let organization_id = session
            .active_organization_id
            .ok_or(AuthError::NoActiveOrganization)?;

        debug!(user_id = %session.user_id, %organization_id, "Session authorized");

        Ok(OrgContext {
            organization_id,
            user_id: session.user_id,
            session_id: session.id,
        })
    }
}

impl FromRequestParts<AppState> for OrgContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(ctx) = parts.extensions.get::<OrgContext>() {
            return Ok(ctx.clone());
        }

        match state.authorizer.authorize(&parts.headers).await {
            Ok(ctx) => {
                parts.extensions.insert(ctx.clone());
                Ok(ctx)
            }
            Err(err) => {
                if !matches!(err, AuthError::Database(_)) {
                    warn!(error = %err, uri = %parts.uri, "Rejected request");
                }
                Err(err.into())
            }
        }
    }
}
