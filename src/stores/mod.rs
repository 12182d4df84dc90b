//! Interchangeable places organization credentials may live.
//!
//! Every backend implements [`CredentialStore`]. Backends that can also hold
//! organization documents implement [`OrganizationStore`], and those that
//! hold additional workspace members implement [`MemberStore`].

pub mod local;
pub mod primary;
pub mod tenant;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::auth::password;
use crate::document::DocumentError;
use crate::models::{LicenseStatus, Member, Organization, StoreKind, WorkspaceUser};

pub use local::LocalStore;
pub use primary::PgStore;
pub use tenant::TenantStore;

#[derive(Debug)]
pub enum StoreError {
    Database(sqlx::Error),
    Migration(sqlx::migrate::MigrateError),
    Document(DocumentError),
    InvalidTenant(String),
    Conflict(String),
    NotFound(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Database(err) => write!(f, "Database error: {err}"),
            StoreError::Migration(err) => write!(f, "Migration error: {err}"),
            StoreError::Document(err) => write!(f, "Document error: {err}"),
            StoreError::InvalidTenant(id) => write!(f, "Invalid tenant identifier: {id}"),
            StoreError::Conflict(msg) => write!(f, "Conflict: {msg}"),
            StoreError::NotFound(msg) => write!(f, "Not Found: {msg}"),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                tracing::debug!("Unique violation: {}", db_err.message());
                StoreError::Conflict("record already exists".to_string())
            }
            _ => StoreError::Database(err),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::Migration(err)
    }
}

impl From<DocumentError> for StoreError {
    fn from(err: DocumentError) -> Self {
        StoreError::Document(err)
    }
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    fn kind(&self) -> StoreKind;

    async fn find_organization(&self, id: &str) -> Result<Option<Organization>, StoreError>;

    /// Returns the user only when both email and password match.
    async fn find_workspace_user(
        &self,
        tenant_id: &str,
        email: &str,
        password: &str,
    ) -> Result<Option<WorkspaceUser>, StoreError>;

    async fn list_all(&self) -> Result<Vec<Organization>, StoreError>;

    async fn update_license(&self, id: &str, status: LicenseStatus) -> Result<(), StoreError>;
}

#[async_trait]
pub trait OrganizationStore: CredentialStore {
    /// Fails with [`StoreError::Conflict`] when the id is taken.
    async fn create_organization(&self, org: &Organization) -> Result<(), StoreError>;

    /// Replaces the stored document. [`StoreError::NotFound`] if absent.
    async fn save_organization(&self, org: &Organization) -> Result<(), StoreError>;

    async fn delete_organization(&self, id: &str) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait MemberStore: Send + Sync {
    fn kind(&self) -> StoreKind;

    async fn add_member(&self, member: &Member) -> Result<(), StoreError>;

    async fn list_members(&self, tenant_id: &str) -> Result<Vec<Member>, StoreError>;
}

/// Why a bounded store call produced no answer.
#[derive(Debug)]
pub enum CallFailure {
    Store(StoreError),
    TimedOut,
}

impl std::fmt::Display for CallFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallFailure::Store(err) => write!(f, "{err}"),
            CallFailure::TimedOut => f.write_str("timed out"),
        }
    }
}

/// Runs one store call under a deadline so a stuck backend cannot stall
/// the caller.
pub async fn bounded<T>(
    timeout: Duration,
    call: impl Future<Output = Result<T, StoreError>>,
) -> Result<T, CallFailure> {
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(CallFailure::Store(err)),
        Err(_) => Err(CallFailure::TimedOut),
    }
}

/// Case-insensitive email comparison plus Argon2 verification.
pub(crate) fn credentials_match(
    stored_email: &str,
    stored_hash: &str,
    email: &str,
    candidate: &str,
) -> bool {
    if !stored_email.eq_ignore_ascii_case(email) {
        return false;
    }
    match password::verify(candidate, stored_hash) {
        Ok(valid) => valid,
        Err(e) => {
            tracing::warn!("Stored password hash for {stored_email} is unusable: {e}");
            false
        }
    }
}

/// Applies license auto-expiry to a freshly read organization and writes
/// the new status back to the store it came from. Write-back failures are
/// logged; the caller still sees the expired status.
pub async fn expire_if_due<S: CredentialStore + ?Sized>(
    store: &S,
    org: &mut Organization,
    timeout: Duration,
) {
    if !org.expire_if_due(chrono::Utc::now()) {
        return;
    }

    tracing::info!(
        organization = %org.id,
        store = %store.kind(),
        "License expired, updating status"
    );

    if let Err(e) = bounded(timeout, store.update_license(&org.id, LicenseStatus::Expired)).await {
        tracing::warn!(
            organization = %org.id,
            store = %store.kind(),
            "Failed to persist expired license: {e}"
        );
    }
}
