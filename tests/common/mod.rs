#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use frontdesk::auth::password;
use frontdesk::config::Config;
use frontdesk::models::{LicenseStatus, Member, Organization, StoreKind, WorkspaceUser};
use frontdesk::state::{SharedState, Stores};
use frontdesk::stores::{CredentialStore, LocalStore, MemberStore, StoreError};

pub const ADMIN_EMAIL: &str = "admin@frontdesk.test";
pub const ADMIN_PASSWORD: &str = "admin-password";

pub fn test_config(data_dir: &std::path::Path) -> Config {
    Config {
        database_url: None,
        tenant_database_url: None,
        jwt_secret: "test-jwt-secret-that-is-long-enough".to_string(),
        admin_email: ADMIN_EMAIL.to_string(),
        admin_password_hash: password::hash(ADMIN_PASSWORD).unwrap(),
        data_dir: data_dir.to_path_buf(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        store_timeout: Duration::from_secs(30),
        trial_days: 14,
        max_body_size: 1_048_576,
        log_level: "warn".to_string(),
    }
}

/// An in-process app backed only by the local file store.
pub struct TestApp {
    pub router: Router,
    pub state: SharedState,
    pub dir: TempDir,
}

impl TestApp {
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> (Value, StatusCode) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap_or(json!(null));
        (body, status)
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> (Value, StatusCode) {
        self.request(Method::GET, path, token, None).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: &Value) -> (Value, StatusCode) {
        self.request(Method::POST, path, token, Some(body)).await
    }

    pub async fn put(&self, path: &str, token: Option<&str>, body: &Value) -> (Value, StatusCode) {
        self.request(Method::PUT, path, token, Some(body)).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> (Value, StatusCode) {
        self.request(Method::DELETE, path, token, None).await
    }

    pub async fn admin_token(&self) -> String {
        let (body, status) = self
            .post(
                "/api/admin/login",
                None,
                &json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "admin login failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// Public signup; returns the organization JSON.
    pub async fn signup(&self, id: &str, admin_email: &str, admin_password: &str) -> Value {
        let (body, status) = self
            .post(
                "/api/signup",
                None,
                &json!({
                    "id": id,
                    "name": format!("{id} Inc"),
                    "adminEmail": admin_email,
                    "adminPassword": admin_password,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "signup failed: {body}");
        body["organization"].clone()
    }

    pub async fn workspace_login(
        &self,
        tenant_id: &str,
        email: &str,
        password: &str,
    ) -> (Value, StatusCode) {
        self.post(
            "/api/workspace/login",
            None,
            &json!({ "tenantId": tenant_id, "email": email, "password": password }),
        )
        .await
    }
}

pub fn spawn_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let stores = Stores::local_only(LocalStore::in_dir(dir.path()));
    let state = frontdesk::build_state(config, stores);
    let router = frontdesk::build_app(state.clone());
    TestApp { router, state, dir }
}

// ── Stub credential store ───────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Behavior {
    /// Every credential lookup matches.
    Match,
    /// Reachable, but holds no matching user.
    NoMatch,
    /// Every call errors, as an unreachable database would.
    Fail,
    /// Every call never completes.
    Hang,
}

pub struct StubStore {
    pub kind: StoreKind,
    pub behavior: Behavior,
    pub organization: Mutex<Option<Organization>>,
    pub user_calls: AtomicUsize,
    pub license_updates: Mutex<Vec<LicenseStatus>>,
}

impl StubStore {
    pub fn new(kind: StoreKind, behavior: Behavior) -> Arc<Self> {
        Self::with_org(kind, behavior, Some(organization("acme", LicenseStatus::Active, None)))
    }

    pub fn with_org(kind: StoreKind, behavior: Behavior, org: Option<Organization>) -> Arc<Self> {
        Arc::new(Self {
            kind,
            behavior,
            organization: Mutex::new(org),
            user_calls: AtomicUsize::new(0),
            license_updates: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.user_calls.load(Ordering::SeqCst)
    }

    async fn gate(&self) -> Result<(), StoreError> {
        match self.behavior {
            Behavior::Fail => Err(StoreError::Database(sqlx::Error::PoolTimedOut)),
            Behavior::Hang => std::future::pending().await,
            Behavior::Match | Behavior::NoMatch => Ok(()),
        }
    }
}

#[async_trait]
impl CredentialStore for StubStore {
    fn kind(&self) -> StoreKind {
        self.kind
    }

    async fn find_organization(&self, id: &str) -> Result<Option<Organization>, StoreError> {
        self.gate().await?;
        let org = self.organization.lock().unwrap().clone();
        Ok(org.filter(|o| o.id == id))
    }

    async fn find_workspace_user(
        &self,
        tenant_id: &str,
        email: &str,
        _password: &str,
    ) -> Result<Option<WorkspaceUser>, StoreError> {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        self.gate().await?;
        if self.behavior == Behavior::NoMatch {
            return Ok(None);
        }
        Ok(Some(WorkspaceUser {
            account_id: tenant_id.to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$stub".to_string(),
            organization_name: format!("{} via {}", tenant_id, self.kind),
            role: "admin".to_string(),
            plan: "pro".to_string(),
        }))
    }

    async fn list_all(&self) -> Result<Vec<Organization>, StoreError> {
        self.gate().await?;
        Ok(self.organization.lock().unwrap().clone().into_iter().collect())
    }

    async fn update_license(&self, id: &str, status: LicenseStatus) -> Result<(), StoreError> {
        self.gate().await?;
        self.license_updates.lock().unwrap().push(status);
        if let Some(org) = self.organization.lock().unwrap().as_mut() {
            if org.id == id {
                org.license_status = status;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl MemberStore for StubStore {
    fn kind(&self) -> StoreKind {
        self.kind
    }

    async fn add_member(&self, _member: &Member) -> Result<(), StoreError> {
        self.gate().await
    }

    async fn list_members(&self, _tenant_id: &str) -> Result<Vec<Member>, StoreError> {
        self.gate().await?;
        Ok(Vec::new())
    }
}

pub fn organization(
    id: &str,
    status: LicenseStatus,
    expiry: Option<DateTime<Utc>>,
) -> Organization {
    let now = Utc::now();
    Organization {
        id: id.to_string(),
        name: format!("{id} Inc"),
        contact_name: None,
        contact_email: None,
        phone: None,
        website: None,
        admin_email: format!("owner@{id}.test"),
        admin_password_hash: "$argon2id$unused".to_string(),
        plan: "pro".to_string(),
        license_status: status,
        license_expiry: expiry,
        created_at: now,
        updated_at: now,
    }
}
