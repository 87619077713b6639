use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::warn;

use super::{
    dto::PublicUser,
    jwt::{JwtKeys, VerificationError},
    repo::UserRepo,
};
use crate::{
    error::{ApiError, StoreError},
    state::AppState,
};

/// Why a request could not be tied to a user.
#[derive(Debug, thiserror::Error)]
pub enum AuthFailure {
    #[error("missing token")]
    MissingToken,
    #[error("invalid authorization scheme")]
    InvalidScheme,
    #[error(transparent)]
    Token(#[from] VerificationError),
    #[error("user not found")]
    UserNotFound,
    /// The credential store could not be reached; not the caller's fault.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AuthFailure> for ApiError {
    fn from(f: AuthFailure) -> Self {
        match f {
            AuthFailure::MissingToken => ApiError::Unauthenticated("missing token".into()),
            AuthFailure::Store(e) => e.into(),
            // bad tokens and vanished users look the same from outside
            _ => ApiError::Unauthenticated("invalid or expired token".into()),
        }
    }
}

/// Resolves the bearer token in `headers` to a user.
///
/// Header and token checks run first and are pure; the store is read exactly once,
/// and only for a token that verified.
pub async fn authorize(
    headers: &HeaderMap,
    keys: &JwtKeys,
    users: &dyn UserRepo,
) -> Result<PublicUser, AuthFailure> {
    let auth = headers
        .get(AUTHORIZATION)
        .ok_or(AuthFailure::MissingToken)?
        .to_str()
        .map_err(|_| AuthFailure::InvalidScheme)?;

    let token = auth
        .strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
        .ok_or(AuthFailure::InvalidScheme)?;

    let claims = keys.verify(token.trim())?;

    let user = users
        .find_by_id(claims.sub)
        .await?
        .ok_or(AuthFailure::UserNotFound)?;

    Ok(user.into())
}

/// The authenticated caller. Every protected handler takes this as an argument,
/// so the handler body only runs once the caller is known.
#[derive(Debug, Clone)]
pub struct AuthUser(pub PublicUser);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match authorize(&parts.headers, &state.keys, state.users.as_ref()).await {
            Ok(user) => Ok(AuthUser(user)),
            Err(AuthFailure::Store(e)) => Err(e.into()),
            Err(failure) => {
                warn!(reason = %failure, uri = %parts.uri, "request not authorized");
                Err(failure.into())
            }
        }
    }
}
