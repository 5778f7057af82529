use std::{marker::PhantomData, sync::Arc};

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::warn;
use uuid::Uuid;

use crate::{
    auth::{claims::Role, jwt::JwtKeys},
    error::AppError,
};

/// Authenticated caller. Extracting it verifies the bearer token and caches the
/// result in the request extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub role: Role,
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::MissingCredentials)?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::MissingCredentials)
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
    Arc<JwtKeys>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(principal) = parts.extensions.get::<Principal>() {
            return Ok(*principal);
        }

        let token = bearer_token(&parts.headers)?;
        let keys = Arc::<JwtKeys>::from_ref(state);
        let identity = keys.verify(token).map_err(|e| {
            warn!(reason = %e, "bearer token rejected");
            AppError::Unauthenticated(e)
        })?;

        let principal = Principal {
            user_id: identity.user_id,
            role: identity.role,
        };
        parts.extensions.insert(principal);
        Ok(principal)
    }
}

/// Set of roles a route accepts. Membership is exact; there is no role ordering.
pub trait RoleSet: Send + Sync + 'static {
    const ALLOWED: &'static [Role];
}

/// Any signed-in account.
pub struct AnyRole;

impl RoleSet for AnyRole {
    const ALLOWED: &'static [Role] = &[Role::User, Role::Admin];
}

/// Administrators only.
pub struct AdminOnly;

impl RoleSet for AdminOnly {
    const ALLOWED: &'static [Role] = &[Role::Admin];
}

pub fn authorize(principal: &Principal, allowed: &[Role]) -> Result<(), AppError> {
    if allowed.contains(&principal.role) {
        Ok(())
    } else {
        warn!(user_id = %principal.user_id, role = ?principal.role, "role not permitted");
        Err(AppError::Forbidden)
    }
}

/// A `Principal` whose role is in `R::ALLOWED`; 401 without a valid token, 403 otherwise.
pub struct Authorized<R: RoleSet>(pub Principal, pub PhantomData<fn() -> R>);

#[async_trait]
impl<S, R> FromRequestParts<S> for Authorized<R>
where
    S: Send + Sync,
    R: RoleSet,
    Arc<JwtKeys>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let principal = Principal::from_request_parts(parts, state).await?;
        authorize(&principal, R::ALLOWED)?;
        Ok(Authorized(principal, PhantomData))
    }
}
