use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use fortress::{AccessClaims, Fortress, Permission, RepositoryProvider, Role};

use crate::{
    error::ApiError,
    types::{AUTH_COOKIE, VerifiedUser},
};

/// Hook the embedding application implements to check credentials and
/// look up roles. The routes in this crate never see password hashes or
/// the user store.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Check a credential pair. `Ok(None)` means the credentials are
    /// wrong; which of email or password was wrong must not be
    /// distinguishable to the caller.
    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<VerifiedUser>, ApiError>;

    /// Current role of a subject, for permission checks on protected
    /// routes. `None` when the subject no longer exists.
    async fn role_of(&self, subject: &str) -> Option<Role>;
}

pub struct AuthState<R: RepositoryProvider> {
    pub fortress: Arc<Fortress<R>>,
    pub verifier: Arc<dyn CredentialVerifier>,
}

impl<R: RepositoryProvider> Clone for AuthState<R> {
    fn clone(&self) -> Self {
        Self {
            fortress: self.fortress.clone(),
            verifier: self.verifier.clone(),
        }
    }
}

/// Attaches verified access-token claims to the request when a valid
/// token is present. Never rejects; handlers decide what anonymous
/// requests may do.
pub async fn auth_middleware<R>(
    State(state): State<AuthState<R>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response
where
    R: RepositoryProvider,
{
    request.extensions_mut().insert(None::<AccessClaims>);

    // Bearer header first, then the auth cookie
    let token = if let Some(token) = extract_bearer_token(&request) {
        Some(token)
    } else {
        jar.get(AUTH_COOKIE).map(|cookie| cookie.value().to_string())
    };

    if let Some(token) = token {
        match state.fortress.verify_access_token(&token) {
            Ok(claims) => {
                request.extensions_mut().insert(claims.clone());
                request.extensions_mut().insert(Some(claims));
            }
            Err(e) => {
                tracing::debug!("Invalid access token: {:?}", e);
            }
        }
    }

    next.run(request).await
}

fn extract_bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(|token| token.to_string())
}

/// Rejects requests that do not carry a valid access token.
pub async fn require_auth<R>(
    State(state): State<AuthState<R>>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Result<Response, ApiError>
where
    R: RepositoryProvider,
{
    let token = if let Some(token) = extract_bearer_token(&request) {
        token
    } else {
        jar.get(AUTH_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .ok_or(ApiError::Unauthorized)?
    };

    state
        .fortress
        .verify_access_token(&token)
        .map_err(|_| ApiError::Unauthorized)?;

    Ok(next.run(request).await)
}

/// Resolve the caller's role and check it grants `permission`.
pub async fn authorize<R>(
    state: &AuthState<R>,
    claims: &AccessClaims,
    permission: Permission,
) -> Result<Role, ApiError>
where
    R: RepositoryProvider,
{
    let role = state
        .verifier
        .role_of(&claims.sub)
        .await
        .ok_or(ApiError::Forbidden)?;

    if !role.has_permission(permission) {
        tracing::debug!(
            subject = %claims.sub,
            role = %role,
            permission = ?permission,
            "Permission denied"
        );
        return Err(ApiError::Forbidden);
    }

    Ok(role)
}
