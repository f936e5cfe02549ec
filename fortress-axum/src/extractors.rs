use std::net::SocketAddr;

use axum::{
    Extension, RequestPartsExt,
    extract::{ConnectInfo, FromRequestParts},
    http::{StatusCode, request::Parts},
};
use axum_extra::{TypedHeader, extract::CookieJar, headers::UserAgent};

use fortress::AccessClaims;

use crate::{
    error::ApiError,
    types::{AUTH_COOKIE, ConnectionInfo, REFRESH_COOKIE},
};

impl<S> FromRequestParts<S> for ConnectionInfo
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_agent = parts
            .extract::<Option<TypedHeader<UserAgent>>>()
            .await
            .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid user agent header"))?
            .map(|ua| ua.to_string());

        let ip = parts
            .extract::<ConnectInfo<SocketAddr>>()
            .await
            .ok()
            .map(|addr| addr.ip().to_string());

        Ok(ConnectionInfo { ip, user_agent })
    }
}

/// The verified access-token claims of the requester. Rejects with 401
/// when the auth middleware did not attach claims.
pub struct AuthClaims(pub AccessClaims);

impl<S> FromRequestParts<S> for AuthClaims
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Extension(claims): Extension<AccessClaims> = parts
            .extract()
            .await
            .map_err(|_| ApiError::Unauthorized)?;

        Ok(AuthClaims(claims))
    }
}

pub struct OptionalAuthClaims(pub Option<AccessClaims>);

impl<S> FromRequestParts<S> for OptionalAuthClaims
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts.extensions.get::<AccessClaims>().cloned();

        Ok(OptionalAuthClaims(claims))
    }
}

/// The raw access token, from the `Authorization: Bearer` header or the
/// auth cookie, in that order.
pub struct AccessTokenFromRequest(pub Option<String>);

impl<S> FromRequestParts<S> for AccessTokenFromRequest
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(token) = parts
            .headers
            .get("Authorization")
            .and_then(|header| header.to_str().ok())
            .and_then(|header| header.strip_prefix("Bearer "))
        {
            return Ok(AccessTokenFromRequest(Some(token.to_string())));
        }

        let jar = parts
            .extract::<CookieJar>()
            .await
            .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid cookie header"))?;

        let token = jar.get(AUTH_COOKIE).map(|cookie| cookie.value().to_string());

        Ok(AccessTokenFromRequest(token))
    }
}

pub struct RefreshTokenFromCookie(pub Option<String>);

impl<S> FromRequestParts<S> for RefreshTokenFromCookie
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let jar = parts
            .extract::<CookieJar>()
            .await
            .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid cookie header"))?;

        let token = jar
            .get(REFRESH_COOKIE)
            .map(|cookie| cookie.value().to_string());

        Ok(RefreshTokenFromCookie(token))
    }
}
