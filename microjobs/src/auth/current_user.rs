//! Extractors for the caller's identity.
//!
//! [`CurrentUser`] is read from an `Authorization: Bearer <jwt>` header. The token is
//! verified with [`session::verify_session_token`] and the user is then looked up, so a
//! deleted account or a changed user type takes effect without waiting for the token to
//! expire.

use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::session,
    db::handlers::Users,
    errors::{Error, Result},
};
use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{instrument, trace};

/// Bearer token from the `Authorization` header, if there is one
pub(crate) fn bearer_token(parts: &Parts) -> Option<Result<&str>> {
    let header = parts.headers.get(axum::http::header::AUTHORIZATION)?;
    let value = match header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid authorization header: {e}"),
            }));
        }
    };
    value.strip_prefix("Bearer ").map(|token| Ok(token.trim()))
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let Some(token) = bearer_token(parts).transpose()? else {
            trace!("No bearer token in request");
            return Err(Error::Unauthenticated { message: None });
        };

        let claims = session::verify_session_token(token, &state.config)?;

        let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let user = Users::new(&mut conn).get_by_id(claims.id).await?.ok_or_else(|| {
            trace!(user_id = %claims.id, "Session token for unknown user");
            Error::Unauthenticated { message: None }
        })?;

        Ok(CurrentUser {
            id: user.id,
            email: user.email,
            user_type: user.user_type,
        })
    }
}

/// Caller authenticated with the shared cron secret
#[derive(Debug, Clone, Copy)]
pub struct CronCaller;

impl FromRequestParts<AppState> for CronCaller {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let Some(expected) = state.config.cron_secret.as_deref().filter(|s| !s.is_empty()) else {
            return Err(Error::Unauthenticated {
                message: Some("Cron endpoint is not configured".to_string()),
            });
        };

        match bearer_token(parts).transpose()? {
            Some(token) if token == expected => Ok(CronCaller),
            _ => Err(Error::Unauthenticated { message: None }),
        }
    }
}
