use std::sync::LazyLock;

use axum::extract::{Path, State};
use axum::Json;
use regex::Regex;

use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::models::SiteContent;
use crate::state::SharedState;

static SECTION_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_-]{0,63}$").expect("valid regex"));

fn check_section(section: &str) -> Result<(), AppError> {
    if SECTION_NAME.is_match(section) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("Invalid section name: {section}")))
    }
}

pub async fn get_all(State(state): State<SharedState>) -> Result<Json<SiteContent>, AppError> {
    Ok(Json(state.content.load().await?))
}

pub async fn get_section(
    State(state): State<SharedState>,
    Path(section): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_section(&section)?;
    let mut content = state.content.load().await?;
    content
        .remove(&section)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No content for section '{section}'")))
}

pub async fn update_section(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(section): Path<String>,
    Json(value): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_admin()?;
    check_section(&section)?;

    state
        .content
        .update(|content| {
            content.insert(section.clone(), value.clone());
            Ok::<_, AppError>(())
        })
        .await?;

    tracing::info!(section = %section, "Site content updated");
    Ok(Json(value))
}
