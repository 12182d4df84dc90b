use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

static ORGANIZATION_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9_-]{0,62}$").expect("valid regex"));

/// Identifiers end up in database URLs and file records, so they are
/// restricted to lowercase alphanumerics, `-` and `_`.
pub fn is_valid_organization_id(id: &str) -> bool {
    ORGANIZATION_ID.is_match(id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseStatus {
    Active,
    Suspended,
    Paused,
    Expired,
}

impl LicenseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseStatus::Active => "active",
            LicenseStatus::Suspended => "suspended",
            LicenseStatus::Paused => "paused",
            LicenseStatus::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(LicenseStatus::Active),
            "suspended" => Some(LicenseStatus::Suspended),
            "paused" => Some(LicenseStatus::Paused),
            "expired" => Some(LicenseStatus::Expired),
            _ => None,
        }
    }
}

impl std::fmt::Display for LicenseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for LicenseStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        LicenseStatus::parse(&value).ok_or_else(|| format!("unknown license status '{value}'"))
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub admin_email: String,
    pub admin_password_hash: String,
    pub plan: String,
    #[sqlx(try_from = "String")]
    pub license_status: LicenseStatus,
    pub license_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    pub fn is_licensed(&self) -> bool {
        self.license_status == LicenseStatus::Active
    }

    /// Flips an active license to `expired` once its expiry has passed.
    /// Returns `true` when the record changed and needs writing back.
    pub fn expire_if_due(&mut self, now: DateTime<Utc>) -> bool {
        match self.license_expiry {
            Some(expiry) if self.license_status == LicenseStatus::Active && expiry < now => {
                self.license_status = LicenseStatus::Expired;
                self.updated_at = now;
                true
            }
            _ => false,
        }
    }
}

/// Organization as returned over HTTP, without the admin password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationView {
    pub id: String,
    pub name: String,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub admin_email: String,
    pub plan: String,
    pub license_status: LicenseStatus,
    pub license_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Organization> for OrganizationView {
    fn from(org: Organization) -> Self {
        OrganizationView {
            id: org.id,
            name: org.name,
            contact_name: org.contact_name,
            contact_email: org.contact_email,
            phone: org.phone,
            website: org.website,
            admin_email: org.admin_email,
            plan: org.plan,
            license_status: org.license_status,
            license_expiry: org.license_expiry,
            created_at: org.created_at,
            updated_at: org.updated_at,
        }
    }
}
