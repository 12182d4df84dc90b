//! Queries against a single organization's own database.

use sqlx::PgPool;

use crate::models::{LicenseStatus, Member, Organization, WorkspaceUser};

pub async fn upsert_profile(pool: &PgPool, org: &Organization) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO organization_profile
            (id, name, contact_name, contact_email, phone, website, admin_email,
             admin_password_hash, plan, license_status, license_expiry, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
         ON CONFLICT (id) DO UPDATE SET
            name = EXCLUDED.name, contact_name = EXCLUDED.contact_name,
            contact_email = EXCLUDED.contact_email, phone = EXCLUDED.phone,
            website = EXCLUDED.website, admin_email = EXCLUDED.admin_email,
            admin_password_hash = EXCLUDED.admin_password_hash, plan = EXCLUDED.plan,
            license_status = EXCLUDED.license_status, license_expiry = EXCLUDED.license_expiry,
            updated_at = EXCLUDED.updated_at",
    )
    .bind(&org.id)
    .bind(&org.name)
    .bind(&org.contact_name)
    .bind(&org.contact_email)
    .bind(&org.phone)
    .bind(&org.website)
    .bind(&org.admin_email)
    .bind(&org.admin_password_hash)
    .bind(&org.plan)
    .bind(org.license_status.as_str())
    .bind(org.license_expiry)
    .bind(org.created_at)
    .bind(org.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_profile(pool: &PgPool, id: &str) -> Result<Option<Organization>, sqlx::Error> {
    sqlx::query_as::<_, Organization>("SELECT * FROM organization_profile WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn delete_profile(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM organization_profile WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn update_license(
    pool: &PgPool,
    id: &str,
    status: LicenseStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE organization_profile SET license_status = $2, updated_at = now() WHERE id = $1",
    )
    .bind(id)
    .bind(status.as_str())
    .execute(pool)
    .await?;
    Ok(())
}

/// Members matching `email`, joined with the profile for name and plan.
/// The organization admin is included via the profile row.
pub async fn find_users_by_email(
    pool: &PgPool,
    tenant_id: &str,
    email: &str,
) -> Result<Vec<WorkspaceUser>, sqlx::Error> {
    sqlx::query_as::<_, WorkspaceUser>(
        "SELECT p.id AS account_id, u.email, u.password_hash,
                p.name AS organization_name, u.role, p.plan
           FROM workspace_users u
           JOIN organization_profile p ON p.id = u.account_id
          WHERE u.account_id = $1 AND lower(u.email) = lower($2)
         UNION ALL
         SELECT p.id, p.admin_email, p.admin_password_hash, p.name, 'admin', p.plan
           FROM organization_profile p
          WHERE p.id = $1 AND lower(p.admin_email) = lower($2)",
    )
    .bind(tenant_id)
    .bind(email)
    .fetch_all(pool)
    .await
}

pub async fn insert_member(pool: &PgPool, member: &Member) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO workspace_users (account_id, email, password_hash, role, created_at)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(&member.account_id)
    .bind(&member.email)
    .bind(&member.password_hash)
    .bind(&member.role)
    .bind(member.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn list_members(pool: &PgPool, tenant_id: &str) -> Result<Vec<Member>, sqlx::Error> {
    sqlx::query_as::<_, Member>(
        "SELECT account_id, email, password_hash, role, created_at
           FROM workspace_users WHERE account_id = $1 ORDER BY created_at DESC",
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await
}
