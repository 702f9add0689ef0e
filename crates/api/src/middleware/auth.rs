//! Identity extractors for Axum handlers.
//!
//! A request is identified, in order, by an `api_key` query parameter, an
//! `Authorization: Bearer <jwt>` header, or a `session=<jwt>` cookie.
//! Credentials that do not resolve to a user leave the request anonymous.

use axum::extract::{FromRequestParts, Query};
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use crowd_core::error::CoreError;
use crowd_db::models::user::User;
use crowd_db::repositories::UserRepo;
use serde::Deserialize;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Deserialize)]
struct ApiKeyParam {
    api_key: Option<String>,
}

/// The requesting user, if any.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(key) = api_key(parts) {
            let user = UserRepo::find_by_api_key(&state.pool, &key).await?;
            if user.is_none() {
                tracing::debug!("Unknown api_key, treating request as anonymous");
            }
            return Ok(MaybeUser(user));
        }

        let token = bearer_token(&parts.headers)
            .map(str::to_string)
            .or_else(|| session_cookie(&parts.headers));
        let Some(token) = token else {
            return Ok(MaybeUser(None));
        };

        let Ok(claims) = validate_token(&token, &state.config.jwt) else {
            tracing::debug!("Invalid or expired session token, treating request as anonymous");
            return Ok(MaybeUser(None));
        };

        let user = UserRepo::find_by_id(&state.pool, claims.sub).await?;
        Ok(MaybeUser(user))
    }
}

/// An authenticated user on the JSON API. Rejects anonymous requests with 401.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let MaybeUser(user) = MaybeUser::from_request_parts(parts, state).await?;
        user.map(AuthUser).ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Authentication required".into()))
        })
    }
}

/// An authenticated user on the web interface. Anonymous requests are
/// redirected to the sign-in page.
#[derive(Debug, Clone)]
pub struct WebUser(pub User);

impl FromRequestParts<AppState> for WebUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let MaybeUser(user) = MaybeUser::from_request_parts(parts, state).await?;
        user.map(WebUser).ok_or(AppError::SignInRequired)
    }
}

// ---------------------------------------------------------------------------
// Credential sources
// ---------------------------------------------------------------------------

fn api_key(parts: &Parts) -> Option<String> {
    Query::<ApiKeyParam>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(param)| param.api_key)
        .filter(|key| !key.is_empty())
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get(COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .find_map(|cookie| {
            let (name, value) = cookie.trim().split_once('=')?;
            (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request};

    fn parts(uri: &str, headers: &[(&'static str, &'static str)]) -> Parts {
        let mut builder = Request::builder().uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn api_key_from_query() {
        let p = parts("/api/app/1?foo=bar&api_key=abc", &[]);
        assert_eq!(api_key(&p).as_deref(), Some("abc"));
        assert_eq!(api_key(&parts("/api/app/1", &[])), None);
        assert_eq!(api_key(&parts("/api/app/1?api_key=", &[])), None);
    }

    #[test]
    fn bearer_prefix_is_required() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer tok"));
        assert_eq!(bearer_token(&headers), Some("tok"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic tok"));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn session_cookie_among_others() {
        let p = parts("/", &[("cookie", "theme=dark; session=tok123; lang=en")]);
        assert_eq!(session_cookie(&p.headers).as_deref(), Some("tok123"));

        let p = parts("/", &[("cookie", "sessionx=nope")]);
        assert_eq!(session_cookie(&p.headers), None);
    }
}
