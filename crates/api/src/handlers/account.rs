//! Sign-in for browser sessions.

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::Html;
use axum::{Form, Json};
use crowd_core::error::CoreError;
use crowd_db::models::user::User;
use crowd_db::repositories::UserRepo;
use serde::{Deserialize, Serialize};

use crate::auth::jwt::generate_access_token;
use crate::auth::password::verify_password;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::SESSION_COOKIE;
use crate::response::DataResponse;
use crate::state::AppState;

const SIGN_IN_PAGE: &str = r#"<!doctype html>
<title>Sign in</title>
<form method="post" action="/account/signin">
  <label>Name <input name="name" autocomplete="username"></label>
  <label>Password <input name="password" type="password" autocomplete="current-password"></label>
  <button type="submit">Sign in</button>
</form>
"#;

#[derive(Debug, Deserialize)]
pub struct SignInForm {
    pub name: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: User,
}

/// GET /account/signin
pub async fn sign_in_page() -> Html<&'static str> {
    Html(SIGN_IN_PAGE)
}

/// POST /account/signin
///
/// Verifies the password and sets the `session` cookie. The token is also
/// returned so API clients can send it as a Bearer header.
pub async fn sign_in(
    State(state): State<AppState>,
    Form(input): Form<SignInForm>,
) -> AppResult<(HeaderMap, Json<DataResponse<SignInResponse>>)> {
    let invalid = || AppError::Core(CoreError::Unauthorized("Invalid name or password".into()));

    let user = UserRepo::find_by_name(&state.pool, &input.name)
        .await?
        .ok_or_else(invalid)?;
    let Some(hash) = user.passwd_hash.as_deref() else {
        return Err(invalid());
    };

    let valid = verify_password(&input.password, hash)
        .map_err(|e| AppError::InternalError(format!("Password verification failed: {e}")))?;
    if !valid {
        tracing::info!(user_id = user.id, "Failed sign-in attempt");
        return Err(invalid());
    }

    let jwt = &state.config.jwt;
    let token = generate_access_token(user.id, jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation failed: {e}")))?;

    let mut headers = HeaderMap::new();
    let cookie = session_cookie(&token, jwt.expiry_secs());
    headers.insert(
        SET_COOKIE,
        HeaderValue::from_str(&cookie)
            .map_err(|e| AppError::InternalError(format!("Invalid cookie value: {e}")))?,
    );

    tracing::info!(user_id = user.id, "User signed in");

    Ok((
        headers,
        Json(DataResponse {
            data: SignInResponse {
                access_token: token,
                token_type: "Bearer",
                expires_in: jwt.expiry_secs(),
                user,
            },
        }),
    ))
}

fn session_cookie(token: &str, max_age: i64) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; Max-Age={max_age}; HttpOnly; SameSite=Lax")
}
