use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{AppendHeaders, IntoResponse},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, SameSite};

use fortress::{EventFilter, Fortress, Permission, RepositoryProvider, TokenPair, validation};

use crate::{
    error::{ApiError, Result},
    extractors::{AuthClaims, OptionalAuthClaims, RefreshTokenFromCookie},
    middleware::{AuthState, CredentialVerifier, auth_middleware, authorize},
    types::*,
};

pub fn create_router<R>(
    fortress: Arc<Fortress<R>>,
    verifier: Arc<dyn CredentialVerifier>,
    cookie_config: CookieConfig,
) -> Router
where
    R: RepositoryProvider + 'static,
{
    let state = AuthState { fortress, verifier };

    Router::new()
        .route("/health", get(health_handler))
        .route("/csrf-token", get(csrf_token_handler))
        .route("/login", post(login_handler))
        .route("/refresh", post(refresh_handler))
        .route("/logout", post(logout_handler))
        .route("/unlock", post(unlock_handler))
        .route("/events", get(events_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::<R>,
        ))
        .with_state(state)
        .layer(axum::Extension(cookie_config))
}

async fn health_handler<R>(State(state): State<AuthState<R>>) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    state
        .fortress
        .health_check()
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

async fn csrf_token_handler<R>(
    State(state): State<AuthState<R>>,
    axum::Extension(cookie_config): axum::Extension<CookieConfig>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let issued = state.fortress.issue_csrf_token().await?;

    // Readable by scripts: the client echoes the token back with its
    // HMAC signature on mutating requests.
    let cookie = build_cookie(
        CSRF_COOKIE,
        issued.token.clone(),
        "/",
        false,
        cookie_config.csrf_max_age_seconds,
        &cookie_config,
    );

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(CsrfTokenResponse {
            token: issued.token,
            secret: issued.secret,
            expires_at: issued.expires_at,
        }),
    ))
}

async fn login_handler<R>(
    State(state): State<AuthState<R>>,
    axum::Extension(cookie_config): axum::Extension<CookieConfig>,
    connection_info: ConnectionInfo,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    // Reject malformed addresses before they reach the rate-limit and
    // lockout bookkeeping.
    validation::validate_email(payload.email.trim())
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    state
        .fortress
        .guard_login(&payload.email, connection_info.ip.as_deref())
        .await?;

    let user = state
        .verifier
        .verify_credentials(&payload.email, &payload.password)
        .await?;

    let Some(user) = user else {
        let status = state
            .fortress
            .record_login_failure(&payload.email, connection_info.ip.as_deref())
            .await?;

        if status.is_locked {
            return Err(ApiError::AccountLocked {
                retry_after_seconds: status.retry_after_seconds().unwrap_or(0),
            });
        }
        return Err(ApiError::InvalidCredentials {
            remaining_attempts: Some(status.remaining_attempts),
        });
    };

    state.fortress.record_login_success(&payload.email).await?;
    let pair = state.fortress.issue_tokens(&user.subject).await?;

    let cookies = token_cookies(&pair, &cookie_config);
    let expires_in = pair.expires_in;

    Ok((
        StatusCode::OK,
        cookies,
        Json(AuthResponse {
            user,
            access_token: pair.access_token,
            expires_in,
        }),
    ))
}

async fn refresh_handler<R>(
    State(state): State<AuthState<R>>,
    axum::Extension(cookie_config): axum::Extension<CookieConfig>,
    RefreshTokenFromCookie(cookie_token): RefreshTokenFromCookie,
    payload: Option<Json<RefreshRequest>>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let token = cookie_token
        .or_else(|| payload.and_then(|Json(body)| body.refresh_token))
        .ok_or(ApiError::Unauthorized)?;

    let pair = state.fortress.rotate_tokens(&token).await?;

    let cookies = token_cookies(&pair, &cookie_config);
    let expires_in = pair.expires_in;

    Ok((
        StatusCode::OK,
        cookies,
        Json(TokenResponse {
            access_token: pair.access_token,
            expires_in,
        }),
    ))
}

async fn logout_handler<R>(
    State(state): State<AuthState<R>>,
    axum::Extension(cookie_config): axum::Extension<CookieConfig>,
    OptionalAuthClaims(claims): OptionalAuthClaims,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    if let Some(claims) = claims {
        // Best effort: the cookies are cleared regardless.
        let _ = state.fortress.revoke_tokens(&claims.sub).await;
    }

    Ok((
        removal_cookies(&cookie_config),
        Json(MessageResponse {
            message: "Successfully logged out".to_string(),
        }),
    ))
}

async fn unlock_handler<R>(
    State(state): State<AuthState<R>>,
    AuthClaims(claims): AuthClaims,
    Json(payload): Json<UnlockRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    authorize(&state, &claims, Permission::UsersManage).await?;

    validation::validate_email(payload.email.trim())
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let was_locked = state.fortress.unlock_account(&payload.email).await?;

    Ok(Json(UnlockResponse {
        email: payload.email.trim().to_lowercase(),
        was_locked,
    }))
}

async fn events_handler<R>(
    State(state): State<AuthState<R>>,
    AuthClaims(claims): AuthClaims,
    Query(query): Query<EventsQuery>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    authorize(&state, &claims, Permission::AuditRead).await?;

    let mut filter = EventFilter::default();
    if let Some(kind) = query.kind {
        filter = filter.kind(kind);
    }
    if let Some(severity) = query.severity {
        filter = filter.severity(severity);
    }
    if let Some(limit) = query.limit {
        filter = filter.limit(limit);
    }

    let events = state.fortress.security_events(filter).await;

    Ok(Json(EventsResponse { events }))
}

// Both cookies carry the same header name, so they must be appended;
// inserting would leave only the last one in the response.
fn token_cookies(
    pair: &TokenPair,
    config: &CookieConfig,
) -> AppendHeaders<[(header::HeaderName, String); 2]> {
    AppendHeaders([
        (
            header::SET_COOKIE,
            build_cookie(
                AUTH_COOKIE,
                pair.access_token.clone(),
                "/",
                true,
                config.auth_max_age_seconds,
                config,
            ),
        ),
        (
            header::SET_COOKIE,
            build_cookie(
                REFRESH_COOKIE,
                pair.refresh_token.clone(),
                REFRESH_COOKIE_PATH,
                true,
                config.refresh_max_age_seconds,
                config,
            ),
        ),
    ])
}

// Expired cookies clear client state even when the request carried no
// Cookie header; the attributes must match the originals for browsers
// to drop them.
fn removal_cookies(config: &CookieConfig) -> AppendHeaders<[(header::HeaderName, String); 3]> {
    AppendHeaders([
        (
            header::SET_COOKIE,
            build_cookie(AUTH_COOKIE, String::new(), "/", true, 0, config),
        ),
        (
            header::SET_COOKIE,
            build_cookie(
                REFRESH_COOKIE,
                String::new(),
                REFRESH_COOKIE_PATH,
                true,
                0,
                config,
            ),
        ),
        (
            header::SET_COOKIE,
            build_cookie(CSRF_COOKIE, String::new(), "/", false, 0, config),
        ),
    ])
}

fn build_cookie(
    name: &'static str,
    value: String,
    path: &'static str,
    http_only: bool,
    max_age_seconds: i64,
    config: &CookieConfig,
) -> String {
    let same_site = match config.same_site {
        CookieSameSite::Strict => SameSite::Strict,
        CookieSameSite::Lax => SameSite::Lax,
        CookieSameSite::None => SameSite::None,
    };

    Cookie::build((name, value))
        .path(path)
        .http_only(http_only)
        .secure(config.secure)
        .same_site(same_site)
        .max_age(time::Duration::seconds(max_age_seconds))
        .build()
        .to_string()
}
