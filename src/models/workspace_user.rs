use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A login-capable account scoped to one organization.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct WorkspaceUser {
    pub account_id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub organization_name: String,
    pub role: String,
    pub plan: String,
}

/// Member row as stored by a tenant database or the local store.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Member {
    pub account_id: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberView {
    pub account_id: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<Member> for MemberView {
    fn from(m: Member) -> Self {
        MemberView {
            account_id: m.account_id,
            email: m.email,
            role: m.role,
            created_at: m.created_at,
        }
    }
}
