use std::sync::LazyLock;

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use regex::Regex;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::models::Lead;
use crate::state::SharedState;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));

const MAX_MESSAGE_LEN: usize = 5000;

#[derive(Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub message: String,
    pub source: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub async fn submit(
    State(state): State<SharedState>,
    Json(req): Json<ContactRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let name = req.name.trim();
    let email = req.email.trim();
    let message = req.message.trim();

    if name.is_empty() || email.is_empty() || message.is_empty() {
        return Err(AppError::BadRequest(
            "Name, email and message are required".to_string(),
        ));
    }
    if !EMAIL.is_match(email) {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }
    if message.chars().count() > MAX_MESSAGE_LEN {
        return Err(AppError::BadRequest(format!(
            "Message must be at most {MAX_MESSAGE_LEN} characters"
        )));
    }

    let lead = Lead {
        id: Uuid::now_v7(),
        name: name.to_string(),
        email: email.to_string(),
        company: non_blank(req.company),
        phone: non_blank(req.phone),
        message: message.to_string(),
        source: non_blank(req.source),
        created_at: Utc::now(),
    };
    let id = lead.id;

    state
        .leads
        .update(|leads| {
            leads.push(lead);
            Ok::<_, AppError>(())
        })
        .await?;

    tracing::info!(lead = %id, "Contact form lead recorded");
    Ok(Json(serde_json::json!({ "success": true, "id": id })))
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<Lead>>, AppError> {
    auth.require_admin()?;
    let mut leads = state.leads.load().await?;
    leads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(leads))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_admin()?;

    state
        .leads
        .update(|leads| {
            let before = leads.len();
            leads.retain(|l| l.id != id);
            if leads.len() == before {
                return Err(AppError::NotFound("Lead not found".to_string()));
            }
            Ok(())
        })
        .await?;

    Ok(Json(serde_json::json!({ "success": true, "message": "Deleted" })))
}
