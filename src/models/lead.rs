use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub message: String,
    pub source: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Editable site sections (`pricing`, `products`, ...) keyed by name.
pub type SiteContent = BTreeMap<String, serde_json::Value>;
