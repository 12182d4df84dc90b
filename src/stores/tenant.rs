use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::db;
use crate::models::organization::is_valid_organization_id;
use crate::models::{LicenseStatus, Member, Organization, StoreKind, WorkspaceUser};
use crate::stores::{CredentialStore, MemberStore, StoreError, credentials_match};

const TENANT_PLACEHOLDER: &str = "{tenant}";

/// One Postgres database per organization, addressed through a URL template
/// such as `postgres://app:secret@db/org_{tenant}`.
///
/// Pools are opened lazily. A pool is only cached once its database has
/// answered with the tenant's profile, so unknown ids never accumulate.
pub struct TenantStore {
    url_template: String,
    acquire_timeout: Duration,
    pools: DashMap<String, PgPool>,
}

impl TenantStore {
    pub fn new(url_template: impl Into<String>, acquire_timeout: Duration) -> Self {
        Self {
            url_template: url_template.into(),
            acquire_timeout,
            pools: DashMap::new(),
        }
    }

    pub fn database_url(&self, tenant_id: &str) -> Result<String, StoreError> {
        if !is_valid_organization_id(tenant_id) {
            return Err(StoreError::InvalidTenant(tenant_id.to_string()));
        }
        Ok(self.url_template.replace(TENANT_PLACEHOLDER, tenant_id))
    }

    /// Number of tenant pools currently cached.
    pub fn attached(&self) -> usize {
        self.pools.len()
    }

    fn pool_for(&self, tenant_id: &str) -> Result<PgPool, StoreError> {
        if let Some(pool) = self.pools.get(tenant_id) {
            return Ok(pool.clone());
        }

        let url = self.database_url(tenant_id)?;
        Ok(PgPoolOptions::new()
            .max_connections(3)
            .acquire_timeout(self.acquire_timeout)
            .connect_lazy(&url)?)
    }

    fn remember(&self, tenant_id: &str, pool: &PgPool) {
        if !self.pools.contains_key(tenant_id) {
            tracing::debug!(tenant = tenant_id, "Attached tenant database pool");
            self.pools.insert(tenant_id.to_string(), pool.clone());
        }
    }

    /// Profile lookup that caches the pool when the tenant exists.
    async fn profile(
        &self,
        tenant_id: &str,
    ) -> Result<Option<(PgPool, Organization)>, StoreError> {
        let pool = self.pool_for(tenant_id)?;
        match db::tenant::find_profile(&pool, tenant_id).await {
            Ok(Some(org)) => {
                self.remember(tenant_id, &pool);
                Ok(Some((pool, org)))
            }
            Ok(None) => Ok(None),
            Err(e) if is_unprovisioned(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Brings the tenant database schema up to date and mirrors the
    /// organization profile into it.
    pub async fn provision(&self, org: &Organization) -> Result<(), StoreError> {
        let pool = self.pool_for(&org.id)?;
        sqlx::migrate!("./migrations/tenant").run(&pool).await?;
        db::tenant::upsert_profile(&pool, org).await?;
        self.remember(&org.id, &pool);
        tracing::info!(tenant = %org.id, "Tenant database provisioned");
        Ok(())
    }

    /// Removes the tenant's profile and, through the cascade, its members.
    /// A database that was never provisioned counts as already clean.
    pub async fn deprovision(&self, tenant_id: &str) -> Result<bool, StoreError> {
        let pool = self.pool_for(tenant_id)?;
        let removed = match db::tenant::delete_profile(&pool, tenant_id).await {
            Ok(removed) => removed,
            Err(e) if is_unprovisioned(&e) => false,
            Err(e) => return Err(e.into()),
        };
        self.pools.remove(tenant_id);
        if removed {
            tracing::info!(tenant = tenant_id, "Tenant database deprovisioned");
        }
        Ok(removed)
    }
}

/// Missing database (3D000) or missing schema (42P01).
fn is_unprovisioned(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            matches!(db_err.code().as_deref(), Some("3D000") | Some("42P01"))
        }
        _ => false,
    }
}

#[async_trait]
impl CredentialStore for TenantStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Tenant
    }

    async fn find_organization(&self, id: &str) -> Result<Option<Organization>, StoreError> {
        Ok(self.profile(id).await?.map(|(_, org)| org))
    }

    async fn find_workspace_user(
        &self,
        tenant_id: &str,
        email: &str,
        password: &str,
    ) -> Result<Option<WorkspaceUser>, StoreError> {
        let Some((pool, _)) = self.profile(tenant_id).await? else {
            return Ok(None);
        };
        let candidates = db::tenant::find_users_by_email(&pool, tenant_id, email).await?;

        Ok(candidates
            .into_iter()
            .find(|u| credentials_match(&u.email, &u.password_hash, email, password)))
    }

    /// Profiles of the tenants this process has attached so far.
    async fn list_all(&self) -> Result<Vec<Organization>, StoreError> {
        let attached: Vec<(String, PgPool)> = self
            .pools
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        let mut orgs = Vec::with_capacity(attached.len());
        for (tenant_id, pool) in attached {
            if let Some(org) = db::tenant::find_profile(&pool, &tenant_id).await? {
                orgs.push(org);
            }
        }
        Ok(orgs)
    }

    async fn update_license(&self, id: &str, status: LicenseStatus) -> Result<(), StoreError> {
        let pool = self.pool_for(id)?;
        Ok(db::tenant::update_license(&pool, id, status).await?)
    }
}

#[async_trait]
impl MemberStore for TenantStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Tenant
    }

    async fn add_member(&self, member: &Member) -> Result<(), StoreError> {
        let Some((pool, _)) = self.profile(&member.account_id).await? else {
            return Err(StoreError::NotFound(format!(
                "organization {}",
                member.account_id
            )));
        };
        match db::tenant::insert_member(&pool, member).await.map_err(StoreError::from) {
            Err(StoreError::Conflict(_)) => {
                Err(StoreError::Conflict(format!("member {}", member.email)))
            }
            other => other,
        }
    }

    async fn list_members(&self, tenant_id: &str) -> Result<Vec<Member>, StoreError> {
        let Some((pool, _)) = self.profile(tenant_id).await? else {
            return Ok(Vec::new());
        };
        Ok(db::tenant::list_members(&pool, tenant_id).await?)
    }
}
