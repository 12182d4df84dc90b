use sqlx::PgPool;

use crate::models::{LicenseStatus, Organization};

pub async fn create(pool: &PgPool, org: &Organization) -> Result<Organization, sqlx::Error> {
    sqlx::query_as::<_, Organization>(
        "INSERT INTO organizations
            (id, name, contact_name, contact_email, phone, website, admin_email,
             admin_password_hash, plan, license_status, license_expiry, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) RETURNING *",
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
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Organization>, sqlx::Error> {
    sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list(pool: &PgPool) -> Result<Vec<Organization>, sqlx::Error> {
    sqlx::query_as::<_, Organization>("SELECT * FROM organizations ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
}

pub async fn update(pool: &PgPool, org: &Organization) -> Result<Option<Organization>, sqlx::Error> {
    sqlx::query_as::<_, Organization>(
        "UPDATE organizations SET
            name = $2, contact_name = $3, contact_email = $4, phone = $5, website = $6,
            admin_email = $7, admin_password_hash = $8, plan = $9, license_status = $10,
            license_expiry = $11, updated_at = now()
         WHERE id = $1 RETURNING *",
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
    .fetch_optional(pool)
    .await
}

pub async fn update_license(
    pool: &PgPool,
    id: &str,
    status: LicenseStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE organizations SET license_status = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(status.as_str())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM organizations WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
