use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;

use crate::auth::jwt::{self, Claims, Scope};
use crate::error::AppError;
use crate::state::SharedState;

pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub subject: String,
    pub tenant_id: Option<String>,
    pub role: String,
    pub scope: Scope,
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.scope == Scope::Admin {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin access required".to_string()))
        }
    }

    /// The organization this workspace session belongs to.
    pub fn require_workspace(&self) -> Result<&str, AppError> {
        match (&self.scope, &self.tenant_id) {
            (Scope::Workspace, Some(tenant_id)) => Ok(tenant_id),
            _ => Err(AppError::Forbidden(
                "Workspace session required".to_string(),
            )),
        }
    }

    pub fn require_workspace_admin(&self) -> Result<&str, AppError> {
        let tenant_id = self.require_workspace()?;
        if self.role == "admin" {
            Ok(tenant_id)
        } else {
            Err(AppError::Forbidden(
                "Workspace admin access required".to_string(),
            ))
        }
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        AuthUser {
            subject: claims.sub,
            tenant_id: claims.tid,
            role: claims.role,
            scope: claims.scope,
        }
    }
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        // Bearer token wins over the cookie
        if let Some(auth_header) = parts.headers.get("authorization") {
            let auth_str = auth_header
                .to_str()
                .map_err(|_| AppError::Unauthorized("Invalid authorization header".to_string()))?;

            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                let claims = jwt::decode_token(token, &state.config.jwt_secret)
                    .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;
                return Ok(claims.into());
            }
        }

        let jar = CookieJar::from_headers(&parts.headers);
        if let Some(cookie) = jar.get(SESSION_COOKIE) {
            let claims = jwt::decode_token(cookie.value(), &state.config.jwt_secret)
                .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;
            return Ok(claims.into());
        }

        Err(AppError::Unauthorized(
            "Missing authentication token".to_string(),
        ))
    }
}
