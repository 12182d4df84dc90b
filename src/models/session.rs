use serde::Serialize;

use crate::models::WorkspaceUser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Primary,
    Tenant,
    Local,
}

impl std::fmt::Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreKind::Primary => f.write_str("primary"),
            StoreKind::Tenant => f.write_str("tenant"),
            StoreKind::Local => f.write_str("local"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Matched,
    NotFound,
    Unavailable,
    TimedOut,
}

impl AttemptOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, AttemptOutcome::Unavailable | AttemptOutcome::TimedOut)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreAttempt {
    pub store: StoreKind,
    pub outcome: AttemptOutcome,
}

/// User projection handed back to callers. Never carries a password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub account_id: String,
    pub email: String,
    pub organization_name: String,
    pub role: String,
    pub plan: String,
}

impl From<WorkspaceUser> for SessionUser {
    fn from(user: WorkspaceUser) -> Self {
        SessionUser {
            account_id: user.account_id,
            email: user.email,
            organization_name: user.organization_name,
            role: user.role,
            plan: user.plan,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionResult {
    pub success: bool,
    pub user: SessionUser,
    pub source: StoreKind,
    /// Every store consulted, in order. Operator-facing only.
    pub attempted: Vec<StoreAttempt>,
}
