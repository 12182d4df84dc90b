use axum::extract::State;
use axum::Json;
use axum_extra::extract::CookieJar;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::extractor::AuthUser;
use crate::auth::jwt::{Claims, encode_token};
use crate::auth::password;
use crate::auth::resolver::AuthError;
use crate::error::AppError;
use crate::models::{Member, MemberView, SessionUser};
use crate::rate_limit::LoginRateLimiter;
use crate::routes::auth::{rate_limited, session_cookie};
use crate::state::SharedState;
use crate::stores::bounded;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceLoginRequest {
    #[serde(alias = "accountId", alias = "tenant_id", alias = "account_id")]
    pub tenant_id: String,
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct WorkspaceLoginResponse {
    pub success: bool,
    pub user: SessionUser,
    pub token: String,
}

#[derive(Deserialize)]
pub struct AddMemberRequest {
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<WorkspaceLoginRequest>,
) -> Result<(CookieJar, Json<WorkspaceLoginResponse>), AppError> {
    let limiter_key = LoginRateLimiter::key(&req.tenant_id, &req.email);
    if state.login_limiter.check(&limiter_key).is_err() {
        return Err(rate_limited());
    }

    let session = match state
        .resolver
        .authenticate(&req.tenant_id, &req.email, &req.password)
        .await
    {
        Ok(session) => session,
        Err(e) => {
            if e == AuthError::InvalidCredentials {
                state.login_limiter.record_failure(&limiter_key);
            }
            return Err(e.into());
        }
    };

    state.login_limiter.clear(&limiter_key);
    tracing::info!(
        tenant = %session.user.account_id,
        source = %session.source,
        "Workspace login"
    );

    let claims = Claims::workspace(&session.user);
    let token = encode_token(&claims, &state.config.jwt_secret).map_err(AppError::Internal)?;

    Ok((session_cookie(&token), Json(WorkspaceLoginResponse {
        success: session.success,
        user: session.user,
        token,
    })))
}

pub async fn me(auth: AuthUser) -> Result<Json<serde_json::Value>, AppError> {
    let tenant_id = auth.require_workspace()?;
    Ok(Json(serde_json::json!({
        "success": true,
        "accountId": tenant_id,
        "email": auth.subject,
        "role": auth.role,
    })))
}

pub async fn list_members(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<MemberView>>, AppError> {
    let tenant_id = auth.require_workspace()?;
    let members =
        bounded(state.config.store_timeout, state.members.list_members(tenant_id)).await?;
    Ok(Json(members.into_iter().map(MemberView::from).collect()))
}

pub async fn add_member(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<AddMemberRequest>,
) -> Result<Json<MemberView>, AppError> {
    let tenant_id = auth.require_workspace_admin()?;

    let email = req.email.trim();
    if email.is_empty() {
        return Err(AppError::BadRequest("Email is required".to_string()));
    }
    password::check_length(&req.password).map_err(AppError::BadRequest)?;

    let role = req.role.as_deref().unwrap_or("member");
    if role != "member" && role != "admin" {
        return Err(AppError::BadRequest(format!("Unknown role: {role}")));
    }

    let member = Member {
        account_id: tenant_id.to_string(),
        email: email.to_string(),
        password_hash: password::hash(&req.password).map_err(AppError::Internal)?,
        role: role.to_string(),
        created_at: Utc::now(),
    };

    bounded(state.config.store_timeout, state.members.add_member(&member)).await?;

    tracing::info!(
        tenant = tenant_id,
        store = %state.members.kind(),
        "Workspace member added"
    );
    Ok(Json(member.into()))
}
