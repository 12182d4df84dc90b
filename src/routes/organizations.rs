use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::auth::extractor::AuthUser;
use crate::directory::{NewOrganization, OrganizationPatch};
use crate::error::AppError;
use crate::models::OrganizationView;
use crate::state::SharedState;

#[derive(Serialize)]
pub struct SignupResponse {
    pub success: bool,
    pub organization: OrganizationView,
}

/// Public self-service signup. Starts a trial license.
pub async fn signup(
    State(state): State<SharedState>,
    Json(mut req): Json<NewOrganization>,
) -> Result<Json<SignupResponse>, AppError> {
    // Plans are assigned by an admin, never chosen at signup
    req.plan = None;
    let org = state.directory.create(req).await?;
    Ok(Json(SignupResponse {
        success: true,
        organization: org.into(),
    }))
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<OrganizationView>>, AppError> {
    auth.require_admin()?;
    let orgs = state.directory.list().await?;
    Ok(Json(orgs.into_iter().map(OrganizationView::from).collect()))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<NewOrganization>,
) -> Result<Json<OrganizationView>, AppError> {
    auth.require_admin()?;
    let org = state.directory.create(req).await?;
    Ok(Json(org.into()))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<OrganizationView>, AppError> {
    auth.require_admin()?;
    let org = state.directory.get(&id).await?;
    Ok(Json(org.into()))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(patch): Json<OrganizationPatch>,
) -> Result<Json<OrganizationView>, AppError> {
    auth.require_admin()?;
    let org = state.directory.update(&id, patch).await?;
    Ok(Json(org.into()))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_admin()?;
    state.directory.delete(&id).await?;
    Ok(Json(serde_json::json!({ "success": true, "message": "Deleted" })))
}
