use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::document::JsonDocument;
use crate::models::{LicenseStatus, Member, Organization, StoreKind, WorkspaceUser};
use crate::stores::primary::admin_account;
use crate::stores::{CredentialStore, MemberStore, OrganizationStore, StoreError, credentials_match};

pub const LOCAL_STORE_FILE: &str = "local_store.json";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalData {
    pub organizations: Vec<Organization>,
    pub members: Vec<Member>,
}

/// File-backed fallback store. Used when no database is configured or the
/// databases cannot be reached.
pub struct LocalStore {
    doc: JsonDocument<LocalData>,
}

impl LocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            doc: JsonDocument::new(path),
        }
    }

    pub fn in_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self::new(data_dir.into().join(LOCAL_STORE_FILE))
    }

    pub async fn snapshot(&self) -> Result<LocalData, StoreError> {
        Ok(self.doc.load().await?)
    }
}

#[async_trait]
impl CredentialStore for LocalStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Local
    }

    async fn find_organization(&self, id: &str) -> Result<Option<Organization>, StoreError> {
        let data = self.doc.load().await?;
        Ok(data.organizations.into_iter().find(|o| o.id == id))
    }

    async fn find_workspace_user(
        &self,
        tenant_id: &str,
        email: &str,
        password: &str,
    ) -> Result<Option<WorkspaceUser>, StoreError> {
        let data = self.doc.load().await?;
        let Some(org) = data.organizations.iter().find(|o| o.id == tenant_id) else {
            return Ok(None);
        };

        if credentials_match(&org.admin_email, &org.admin_password_hash, email, password) {
            return Ok(Some(admin_account(org)));
        }

        let member = data.members.iter().find(|m| {
            m.account_id == tenant_id
                && credentials_match(&m.email, &m.password_hash, email, password)
        });

        Ok(member.map(|m| WorkspaceUser {
            account_id: org.id.clone(),
            email: m.email.clone(),
            password_hash: m.password_hash.clone(),
            organization_name: org.name.clone(),
            role: m.role.clone(),
            plan: org.plan.clone(),
        }))
    }

    async fn list_all(&self) -> Result<Vec<Organization>, StoreError> {
        Ok(self.doc.load().await?.organizations)
    }

    async fn update_license(&self, id: &str, status: LicenseStatus) -> Result<(), StoreError> {
        self.doc
            .update(|data| {
                let org = data
                    .organizations
                    .iter_mut()
                    .find(|o| o.id == id)
                    .ok_or_else(|| StoreError::NotFound(format!("organization {id}")))?;
                org.license_status = status;
                org.updated_at = Utc::now();
                Ok(())
            })
            .await
    }
}

#[async_trait]
impl OrganizationStore for LocalStore {
    async fn create_organization(&self, org: &Organization) -> Result<(), StoreError> {
        self.doc
            .update(|data| {
                if data.organizations.iter().any(|o| o.id == org.id) {
                    return Err(StoreError::Conflict(format!("organization {}", org.id)));
                }
                data.organizations.push(org.clone());
                Ok(())
            })
            .await
    }

    async fn save_organization(&self, org: &Organization) -> Result<(), StoreError> {
        self.doc
            .update(|data| {
                let slot = data
                    .organizations
                    .iter_mut()
                    .find(|o| o.id == org.id)
                    .ok_or_else(|| StoreError::NotFound(format!("organization {}", org.id)))?;
                *slot = org.clone();
                Ok(())
            })
            .await
    }

    async fn delete_organization(&self, id: &str) -> Result<bool, StoreError> {
        self.doc
            .update(|data| {
                let before = data.organizations.len();
                data.organizations.retain(|o| o.id != id);
                data.members.retain(|m| m.account_id != id);
                Ok(data.organizations.len() != before)
            })
            .await
    }
}

#[async_trait]
impl MemberStore for LocalStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Local
    }

    async fn add_member(&self, member: &Member) -> Result<(), StoreError> {
        self.doc
            .update(|data| {
                if !data.organizations.iter().any(|o| o.id == member.account_id) {
                    return Err(StoreError::NotFound(format!(
                        "organization {}",
                        member.account_id
                    )));
                }
                let taken = data.members.iter().any(|m| {
                    m.account_id == member.account_id && m.email.eq_ignore_ascii_case(&member.email)
                });
                if taken {
                    return Err(StoreError::Conflict(format!("member {}", member.email)));
                }
                data.members.push(member.clone());
                Ok(())
            })
            .await
    }

    async fn list_members(&self, tenant_id: &str) -> Result<Vec<Member>, StoreError> {
        let mut members: Vec<Member> = self
            .doc
            .load()
            .await?
            .members
            .into_iter()
            .filter(|m| m.account_id == tenant_id)
            .collect();
        members.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(members)
    }
}
