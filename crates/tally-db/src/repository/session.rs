//! # Session Repository
//!
//! Bearer-token sessions. The API resolves `Authorization: Bearer <token>` to
//! a session row and takes the caller's organization from
//! `active_organization_id`.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;

/// A stored login session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Session {
    pub id: String,
    #[serde(skip_serializing)]
    pub token: String,
    pub user_id: String,
    pub active_organization_id: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SessionRepository { pool }
    }

    /// Opens a session valid for `ttl` with a random token.
    pub async fn create(
        &self,
        user_id: &str,
        active_organization_id: Option<&str>,
        ttl: Duration,
    ) -> DbResult<Session> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            token: format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple()),
            user_id: user_id.to_string(),
            active_organization_id: active_organization_id.map(str::to_string),
            expires_at: now + ttl,
            created_at: now,
        };

        sqlx::query(
            "INSERT INTO sessions (\
                id, token, user_id, active_organization_id, expires_at, created_at\
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&session.id)
        .bind(&session.token)
        .bind(&session.user_id)
        .bind(&session.active_organization_id)
        .bind(session.expires_at)
        .bind(session.created_at)
        .execute(&self.pool)
        .await?;

        debug!(session_id = %session.id, user_id = %session.user_id, "Session created");
        Ok(session)
    }

    /// Looks a session up by token, expired or not.
    pub async fn find_by_token(&self, token: &str) -> DbResult<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT id, token, user_id, active_organization_id, expires_at, created_at \
             FROM sessions WHERE token = ?1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Deletes sessions that expired before `now`. Returns how many went.
    pub async fn delete_expired(&self, now: DateTime<Utc>) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
