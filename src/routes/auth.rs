use axum::extract::State;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use crate::auth::extractor::SESSION_COOKIE;
use crate::auth::jwt::{Claims, SESSION_HOURS, encode_token};
use crate::auth::password;
use crate::error::AppError;
use crate::rate_limit::LoginRateLimiter;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct AdminLoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AdminLoginResponse {
    pub success: bool,
    pub token: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

pub(crate) fn session_cookie(token: &str) -> CookieJar {
    let cookie = Cookie::build((SESSION_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(SESSION_HOURS))
        .build();

    CookieJar::new().add(cookie)
}

fn clear_session_cookie() -> CookieJar {
    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build();
    CookieJar::new().add(cookie)
}

pub(crate) fn rate_limited() -> AppError {
    AppError::RateLimited("Too many login attempts. Please try again later.".to_string())
}

pub async fn admin_login(
    State(state): State<SharedState>,
    Json(req): Json<AdminLoginRequest>,
) -> Result<(CookieJar, Json<AdminLoginResponse>), AppError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    let limiter_key = LoginRateLimiter::key("admin", &req.email);
    if state.login_limiter.check(&limiter_key).is_err() {
        return Err(rate_limited());
    }

    let email_ok = req.email.trim().eq_ignore_ascii_case(&state.config.admin_email);
    let password_ok = password::verify(&req.password, &state.config.admin_password_hash)
        .map_err(AppError::Internal)?;

    if !(email_ok && password_ok) {
        state.login_limiter.record_failure(&limiter_key);
        tracing::info!("Rejected admin login");
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    state.login_limiter.clear(&limiter_key);

    let claims = Claims::admin(&state.config.admin_email);
    let token = encode_token(&claims, &state.config.jwt_secret).map_err(AppError::Internal)?;

    tracing::info!("Admin signed in");
    Ok((session_cookie(&token), Json(AdminLoginResponse {
        success: true,
        token,
    })))
}

pub async fn logout() -> (CookieJar, Json<MessageResponse>) {
    (clear_session_cookie(), Json(MessageResponse {
        success: true,
        message: "Logged out successfully".to_string(),
    }))
}
