//! Organization CRUD over the writable stores, in priority order.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Deserialize;

use crate::auth::password;
use crate::error::AppError;
use crate::models::organization::is_valid_organization_id;
use crate::models::{LicenseStatus, Organization};
use crate::stores::{CallFailure, OrganizationStore, StoreError, TenantStore, bounded, expire_if_due};

pub const DEFAULT_PLAN: &str = "trial";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrganization {
    pub id: Option<String>,
    pub name: String,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub admin_email: String,
    pub admin_password: String,
    pub plan: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationPatch {
    pub name: Option<String>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub plan: Option<String>,
    pub license_status: Option<LicenseStatus>,
    pub license_expiry: Option<DateTime<Utc>>,
}

pub struct Directory {
    stores: Vec<Arc<dyn OrganizationStore>>,
    tenants: Option<Arc<TenantStore>>,
    timeout: Duration,
    trial_days: i64,
}

impl Directory {
    pub fn new(
        stores: Vec<Arc<dyn OrganizationStore>>,
        tenants: Option<Arc<TenantStore>>,
        timeout: Duration,
        trial_days: i64,
    ) -> Self {
        Self {
            stores,
            tenants,
            timeout,
            trial_days,
        }
    }

    pub async fn create(&self, req: NewOrganization) -> Result<Organization, AppError> {
        let name = req.name.trim();
        let admin_email = req.admin_email.trim();
        if name.is_empty() || admin_email.is_empty() {
            return Err(AppError::BadRequest(
                "Organization name and admin email are required".to_string(),
            ));
        }
        password::check_length(&req.admin_password).map_err(AppError::BadRequest)?;

        let id = match req.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_lowercase(),
            _ => slugify(name),
        };
        if !is_valid_organization_id(&id) {
            return Err(AppError::BadRequest(format!("Invalid account ID: {id}")));
        }

        match self.locate(&id).await {
            Ok(_) => {
                return Err(AppError::Conflict(
                    "An organization with this ID already exists".to_string(),
                ));
            }
            Err(AppError::NotFound(_)) | Err(AppError::Unavailable(_)) => {}
            Err(e) => return Err(e),
        }

        let now = Utc::now();
        let org = Organization {
            id,
            name: name.to_string(),
            contact_name: req.contact_name,
            contact_email: req.contact_email,
            phone: req.phone,
            website: req.website,
            admin_email: admin_email.to_string(),
            admin_password_hash: password::hash(&req.admin_password)
                .map_err(AppError::Internal)?,
            plan: req.plan.unwrap_or_else(|| DEFAULT_PLAN.to_string()),
            license_status: LicenseStatus::Active,
            license_expiry: Some(now + ChronoDuration::days(self.trial_days)),
            created_at: now,
            updated_at: now,
        };

        for store in &self.stores {
            match bounded(self.timeout, store.create_organization(&org)).await {
                Ok(()) => {
                    tracing::info!(organization = %org.id, store = %store.kind(), "Organization created");
                    self.mirror_to_tenant(&org).await;
                    return Ok(org);
                }
                Err(CallFailure::Store(StoreError::Conflict(_))) => {
                    return Err(AppError::Conflict(
                        "An organization with this ID already exists".to_string(),
                    ));
                }
                Err(e) => {
                    tracing::warn!(store = %store.kind(), "Create failed, trying next store: {e}");
                }
            }
        }

        Err(AppError::Unavailable(
            "no organization store accepted the write".to_string(),
        ))
    }

    pub async fn get(&self, id: &str) -> Result<Organization, AppError> {
        self.locate(id).await.map(|(_, org)| org)
    }

    /// Every organization, the first store to report an id winning.
    pub async fn list(&self) -> Result<Vec<Organization>, AppError> {
        let mut seen = HashSet::new();
        let mut orgs = Vec::new();
        let mut any_answered = false;

        for store in &self.stores {
            match bounded(self.timeout, store.list_all()).await {
                Ok(batch) => {
                    any_answered = true;
                    for mut org in batch {
                        if seen.insert(org.id.clone()) {
                            expire_if_due(store.as_ref(), &mut org, self.timeout).await;
                            orgs.push(org);
                        }
                    }
                }
                Err(e) => tracing::warn!(store = %store.kind(), "List failed: {e}"),
            }
        }

        if !any_answered && !self.stores.is_empty() {
            return Err(AppError::Unavailable(
                "no organization store could be listed".to_string(),
            ));
        }

        orgs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orgs)
    }

    pub async fn update(&self, id: &str, patch: OrganizationPatch) -> Result<Organization, AppError> {
        let (store, mut org) = self.locate(id).await?;

        if let Some(name) = patch.name {
            if name.trim().is_empty() {
                return Err(AppError::BadRequest("Name cannot be empty".to_string()));
            }
            org.name = name.trim().to_string();
        }
        if let Some(email) = patch.admin_email {
            if email.trim().is_empty() {
                return Err(AppError::BadRequest("Admin email cannot be empty".to_string()));
            }
            org.admin_email = email.trim().to_string();
        }
        if let Some(pw) = patch.admin_password {
            password::check_length(&pw).map_err(AppError::BadRequest)?;
            org.admin_password_hash = password::hash(&pw).map_err(AppError::Internal)?;
        }
        if patch.contact_name.is_some() {
            org.contact_name = patch.contact_name;
        }
        if patch.contact_email.is_some() {
            org.contact_email = patch.contact_email;
        }
        if patch.phone.is_some() {
            org.phone = patch.phone;
        }
        if patch.website.is_some() {
            org.website = patch.website;
        }
        if let Some(plan) = patch.plan {
            org.plan = plan;
        }
        if let Some(expiry) = patch.license_expiry {
            org.license_expiry = Some(expiry);
        }
        if let Some(status) = patch.license_status {
            org.license_status = status;
        }
        let now = Utc::now();
        // An active license with a past expiry would flip straight back to expired
        if patch.license_status == Some(LicenseStatus::Active)
            && org.license_expiry.is_some_and(|expiry| expiry <= now)
        {
            return Err(AppError::BadRequest(
                "Reactivating a license requires a future licenseExpiry".to_string(),
            ));
        }
        org.updated_at = now;

        bounded(self.timeout, store.save_organization(&org)).await?;

        tracing::info!(organization = %org.id, store = %store.kind(), "Organization updated");
        self.mirror_to_tenant(&org).await;
        Ok(org)
    }

    /// Removes the organization from every writable store holding it.
    ///
    /// The tenant database is cleared first: it can still serve logins, so a
    /// delete that cannot reach it fails and leaves every store untouched.
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        let mut deleted = false;
        let mut any_answered = false;

        if let Some(tenants) = &self.tenants {
            match bounded(self.timeout, tenants.deprovision(id)).await {
                Ok(removed) => deleted |= removed,
                Err(CallFailure::Store(StoreError::InvalidTenant(_))) => {}
                Err(e) => {
                    tracing::error!(organization = id, "Tenant database not cleared: {e}");
                    return Err(AppError::Unavailable(
                        "tenant database could not be cleared".to_string(),
                    ));
                }
            }
        }

        for store in &self.stores {
            match bounded(self.timeout, store.delete_organization(id)).await {
                Ok(removed) => {
                    any_answered = true;
                    deleted |= removed;
                }
                Err(e) => tracing::warn!(store = %store.kind(), "Delete failed: {e}"),
            }
        }

        match (deleted, any_answered) {
            (true, _) => {
                tracing::info!(organization = id, "Organization deleted");
                Ok(())
            }
            (false, true) => Err(AppError::NotFound("Organization not found".to_string())),
            (false, false) => Err(AppError::Unavailable(
                "no organization store could be reached".to_string(),
            )),
        }
    }

    async fn locate(
        &self,
        id: &str,
    ) -> Result<(Arc<dyn OrganizationStore>, Organization), AppError> {
        let mut any_answered = false;

        for store in &self.stores {
            match bounded(self.timeout, store.find_organization(id)).await {
                Ok(Some(mut org)) => {
                    expire_if_due(store.as_ref(), &mut org, self.timeout).await;
                    return Ok((store.clone(), org));
                }
                Ok(None) => any_answered = true,
                Err(e) => tracing::warn!(store = %store.kind(), "Lookup failed: {e}"),
            }
        }

        if any_answered || self.stores.is_empty() {
            Err(AppError::NotFound("Organization not found".to_string()))
        } else {
            Err(AppError::Unavailable(
                "no organization store could be reached".to_string(),
            ))
        }
    }

    /// Keeps the per-tenant database profile in step. Best effort.
    async fn mirror_to_tenant(&self, org: &Organization) {
        let Some(tenants) = &self.tenants else {
            return;
        };
        if let Err(e) = bounded(self.timeout, tenants.provision(org)).await {
            tracing::warn!(organization = %org.id, "Tenant database not updated: {e}");
        }
    }
}

pub fn slugify(s: &str) -> String {
    let slug = s
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>();

    let mut collapsed = String::with_capacity(slug.len());
    for c in slug.chars() {
        if c == '-' && collapsed.ends_with('-') {
            continue;
        }
        collapsed.push(c);
    }
    let trimmed: String = collapsed.trim_matches('-').chars().take(63).collect();
    trimmed.trim_end_matches('-').to_string()
}
