use async_trait::async_trait;
use sqlx::PgPool;

use crate::db;
use crate::models::{LicenseStatus, Organization, StoreKind, WorkspaceUser};
use crate::stores::{CredentialStore, OrganizationStore, StoreError, credentials_match};

/// The main organizations database.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations/primary").run(&self.pool).await?;
        Ok(())
    }
}

/// The organization admin is the workspace account the primary store knows about.
pub(crate) fn admin_account(org: &Organization) -> WorkspaceUser {
    WorkspaceUser {
        account_id: org.id.clone(),
        email: org.admin_email.clone(),
        password_hash: org.admin_password_hash.clone(),
        organization_name: org.name.clone(),
        role: "admin".to_string(),
        plan: org.plan.clone(),
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Primary
    }

    async fn find_organization(&self, id: &str) -> Result<Option<Organization>, StoreError> {
        Ok(db::organizations::find_by_id(&self.pool, id).await?)
    }

    async fn find_workspace_user(
        &self,
        tenant_id: &str,
        email: &str,
        password: &str,
    ) -> Result<Option<WorkspaceUser>, StoreError> {
        let Some(org) = db::organizations::find_by_id(&self.pool, tenant_id).await? else {
            return Ok(None);
        };

        if credentials_match(&org.admin_email, &org.admin_password_hash, email, password) {
            Ok(Some(admin_account(&org)))
        } else {
            Ok(None)
        }
    }

    async fn list_all(&self) -> Result<Vec<Organization>, StoreError> {
        Ok(db::organizations::list(&self.pool).await?)
    }

    async fn update_license(&self, id: &str, status: LicenseStatus) -> Result<(), StoreError> {
        Ok(db::organizations::update_license(&self.pool, id, status).await?)
    }
}

#[async_trait]
impl OrganizationStore for PgStore {
    async fn create_organization(&self, org: &Organization) -> Result<(), StoreError> {
        db::organizations::create(&self.pool, org).await?;
        Ok(())
    }

    async fn save_organization(&self, org: &Organization) -> Result<(), StoreError> {
        db::organizations::update(&self.pool, org)
            .await?
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("organization {}", org.id)))
    }

    async fn delete_organization(&self, id: &str) -> Result<bool, StoreError> {
        Ok(db::organizations::delete(&self.pool, id).await?)
    }
}
