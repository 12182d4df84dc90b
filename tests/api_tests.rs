mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use common::{Behavior, StubStore};
use frontdesk::auth::jwt::{Claims, encode_token};
use frontdesk::error::AppError;
use frontdesk::models::{SessionUser, StoreKind};
use frontdesk::state::{AppState, Stores};
use frontdesk::stores::{LocalStore, StoreError};

// ── Health ──────────────────────────────────────────────────────

#[tokio::test]
async fn health_returns_ok() {
    let app = common::spawn_app();

    let req = axum::http::Request::builder()
        .uri("/health")
        .body(axum::body::Body::empty())
        .unwrap();
    let resp = tower::ServiceExt::oneshot(app.router.clone(), req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"ok");
}

// ── Admin auth ──────────────────────────────────────────────────

#[tokio::test]
async fn admin_login_valid_credentials() {
    let app = common::spawn_app();

    let (body, status) = app
        .post(
            "/api/admin/login",
            None,
            &json!({ "email": "ADMIN@frontdesk.test", "password": common::ADMIN_PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["token"].is_string());
}

#[tokio::test]
async fn admin_login_invalid_credentials() {
    let app = common::spawn_app();

    let (body, status) = app
        .post(
            "/api/admin/login",
            None,
            &json!({ "email": common::ADMIN_EMAIL, "password": "wrong-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn admin_routes_require_admin_session() {
    let app = common::spawn_app();

    let (_, status) = app.get("/api/admin/organizations", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, status) = app.get("/api/admin/organizations", Some("not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    app.signup("acme", "owner@acme.test", "owner-password").await;
    let (body, _) = app
        .workspace_login("acme", "owner@acme.test", "owner-password")
        .await;
    let workspace_token = body["token"].as_str().unwrap();

    let (_, status) = app
        .get("/api/admin/organizations", Some(workspace_token))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// ── Workspace login ─────────────────────────────────────────────

#[tokio::test]
async fn signup_then_workspace_login() {
    let app = common::spawn_app();
    let org = app.signup("acme", "owner@acme.test", "owner-password").await;
    assert_eq!(org["licenseStatus"], "active");
    assert!(org.get("adminPasswordHash").is_none());

    let (body, status) = app
        .workspace_login("acme", "owner@acme.test", "owner-password")
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["accountId"], "acme");
    assert_eq!(body["user"]["role"], "admin");
    assert!(body.get("attempted").is_none());
    assert!(!body.to_string().to_lowercase().contains("password"));

    let token = body["token"].as_str().unwrap();
    let (me, status) = app.get("/api/workspace/me", Some(token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["accountId"], "acme");
    assert_eq!(me["email"], "owner@acme.test");
}

#[tokio::test]
async fn workspace_login_accepts_account_id_alias() {
    let app = common::spawn_app();
    app.signup("acme", "owner@acme.test", "owner-password").await;

    let (_, status) = app
        .post(
            "/api/workspace/login",
            None,
            &json!({ "accountId": "acme", "email": "owner@acme.test", "password": "owner-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn workspace_login_wrong_password_is_uniform_401() {
    let app = common::spawn_app();
    app.signup("acme", "owner@acme.test", "owner-password").await;

    let (wrong_pw, status) = app
        .workspace_login("acme", "owner@acme.test", "wrong-password")
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (unknown, status2) = app
        .workspace_login("nobody", "owner@acme.test", "owner-password")
        .await;
    assert_eq!(status2, StatusCode::UNAUTHORIZED);

    assert_eq!(wrong_pw, unknown);
    assert_eq!(wrong_pw["success"], false);
    assert_eq!(wrong_pw["error"], "Invalid credentials");
}

#[tokio::test]
async fn workspace_login_blank_fields_is_400() {
    let app = common::spawn_app();

    let (_, status) = app.workspace_login("", "owner@acme.test", "pw").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn suspended_organization_gets_403() {
    let app = common::spawn_app();
    app.signup("acme", "owner@acme.test", "owner-password").await;
    let admin = app.admin_token().await;

    let (body, status) = app
        .put(
            "/api/admin/organizations/acme",
            Some(&admin),
            &json!({ "licenseStatus": "suspended" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (body, status) = app
        .workspace_login("acme", "owner@acme.test", "owner-password")
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("suspended"));

    // Wrong password on a suspended org is still a plain 401
    let (_, status) = app
        .workspace_login("acme", "owner@acme.test", "wrong-password")
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn repeated_failures_are_rate_limited() {
    let app = common::spawn_app();
    app.signup("acme", "owner@acme.test", "owner-password").await;

    for _ in 0..5 {
        let (_, status) = app
            .workspace_login("acme", "owner@acme.test", "wrong-password")
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (_, status) = app
        .workspace_login("acme", "owner@acme.test", "owner-password")
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

// ── Workspace members ───────────────────────────────────────────

#[tokio::test]
async fn workspace_admin_adds_member_who_can_sign_in() {
    let app = common::spawn_app();
    app.signup("acme", "owner@acme.test", "owner-password").await;
    let (body, _) = app
        .workspace_login("acme", "owner@acme.test", "owner-password")
        .await;
    let owner_token = body["token"].as_str().unwrap().to_string();

    let (member, status) = app
        .post(
            "/api/workspace/members",
            Some(&owner_token),
            &json!({ "email": "member@acme.test", "password": "member-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{member}");
    assert_eq!(member["role"], "member");
    assert!(member.get("passwordHash").is_none());

    let (list, _) = app.get("/api/workspace/members", Some(&owner_token)).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (body, status) = app
        .workspace_login("acme", "member@acme.test", "member-password")
        .await;
    assert_eq!(status, StatusCode::OK);
    let member_token = body["token"].as_str().unwrap();

    // Members cannot add members
    let (_, status) = app
        .post(
            "/api/workspace/members",
            Some(member_token),
            &json!({ "email": "x@acme.test", "password": "another-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// ── Organizations CRUD ──────────────────────────────────────────

#[tokio::test]
async fn organizations_crud() {
    let app = common::spawn_app();
    let admin = app.admin_token().await;

    // Create
    let (org, status) = app
        .post(
            "/api/admin/organizations",
            Some(&admin),
            &json!({
                "name": "Globex Corporation",
                "adminEmail": "hank@globex.test",
                "adminPassword": "globex-password",
                "plan": "enterprise",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{org}");
    assert_eq!(org["id"], "globex-corporation");
    assert_eq!(org["plan"], "enterprise");

    // Duplicate
    let (_, status) = app
        .post(
            "/api/admin/organizations",
            Some(&admin),
            &json!({
                "name": "Globex Corporation",
                "adminEmail": "hank@globex.test",
                "adminPassword": "globex-password",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // List
    let (list, status) = app.get("/api/admin/organizations", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    // Update
    let (updated, status) = app
        .put(
            "/api/admin/organizations/globex-corporation",
            Some(&admin),
            &json!({ "phone": "+1 555 0100" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["phone"], "+1 555 0100");

    // Get
    let (fetched, status) = app
        .get("/api/admin/organizations/globex-corporation", Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["phone"], "+1 555 0100");

    // Delete
    let (_, status) = app
        .delete("/api/admin/organizations/globex-corporation", Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, status) = app
        .get("/api/admin/organizations/globex-corporation", Some(&admin))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn signup_ignores_requested_plan() {
    let app = common::spawn_app();

    let (body, status) = app
        .post(
            "/api/signup",
            None,
            &json!({
                "id": "initech",
                "name": "Initech",
                "adminEmail": "bill@initech.test",
                "adminPassword": "initech-password",
                "plan": "enterprise",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["organization"]["plan"], "trial");
}

// ── Site content ────────────────────────────────────────────────

#[tokio::test]
async fn content_sections_are_public_read_admin_write() {
    let app = common::spawn_app();
    let admin = app.admin_token().await;
    let pricing = json!({ "tiers": [{ "name": "Starter", "price": 29 }] });

    let (_, status) = app.put("/api/admin/content/pricing", None, &pricing).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, status) = app.get("/api/content/pricing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (saved, status) = app
        .put("/api/admin/content/pricing", Some(&admin), &pricing)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved, pricing);

    let (section, status) = app.get("/api/content/pricing", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(section, pricing);

    let (all, _) = app.get("/api/content", None).await;
    assert_eq!(all["pricing"], pricing);

    let (_, status) = app
        .put("/api/admin/content/Bad%20Name", Some(&admin), &pricing)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ── Contact & leads ─────────────────────────────────────────────

#[tokio::test]
async fn contact_form_records_leads() {
    let app = common::spawn_app();
    let admin = app.admin_token().await;

    let (body, status) = app
        .post(
            "/api/contact",
            None,
            &json!({
                "name": "Pat Prospect",
                "email": "pat@example.com",
                "company": "  ",
                "message": "Tell me about bundles",
                "source": "bundles",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let lead_id = body["id"].as_str().unwrap().to_string();

    let (leads, status) = app.get("/api/admin/leads", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    let leads = leads.as_array().unwrap();
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0]["email"], "pat@example.com");
    assert!(leads[0]["company"].is_null());

    let (_, status) = app
        .delete(&format!("/api/admin/leads/{lead_id}"), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, status) = app
        .delete(&format!("/api/admin/leads/{lead_id}"), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn contact_form_validates_input() {
    let app = common::spawn_app();

    let (_, status) = app
        .post(
            "/api/contact",
            None,
            &json!({ "name": "Pat", "email": "not-an-email", "message": "hi" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, status) = app
        .post(
            "/api/contact",
            None,
            &json!({ "name": "", "email": "pat@example.com", "message": "hi" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn leads_require_admin() {
    let app = common::spawn_app();

    let (_, status) = app.get("/api/admin/leads", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ── Logout ──────────────────────────────────────────────────────

#[tokio::test]
async fn logout_clears_session_cookie() {
    let app = common::spawn_app();

    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/api/auth/logout")
        .body(axum::body::Body::empty())
        .unwrap();
    let resp = tower::ServiceExt::oneshot(app.router.clone(), req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp
        .headers()
        .get("set-cookie")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("session="));
    assert!(cookie.contains("Max-Age=0"));
}

// ── Backend resilience ──────────────────────────────────────────

#[tokio::test]
async fn unreachable_primary_falls_back_to_local_store() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = common::test_config(dir.path());
    config.database_url = Some("postgres://frontdesk@127.0.0.1:1/frontdesk".to_string());
    config.store_timeout = Duration::from_secs(5);

    let stores = frontdesk::connect_stores(&config).await.unwrap();
    assert!(stores.primary.is_some());

    let state = frontdesk::build_state(config, stores);
    let app = common::TestApp {
        router: frontdesk::build_app(state.clone()),
        state,
        dir,
    };

    app.signup("acme", "owner@acme.test", "owner-password").await;
    let (body, status) = app
        .workspace_login("acme", "owner@acme.test", "owner-password")
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["user"]["accountId"], "acme");
}

#[tokio::test]
async fn hanging_member_store_is_abandoned() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = common::test_config(dir.path());
    config.store_timeout = Duration::from_millis(100);
    let secret = config.jwt_secret.clone();

    let mut state = AppState::new(config, Stores::local_only(LocalStore::in_dir(dir.path())));
    state.members = StubStore::new(StoreKind::Tenant, Behavior::Hang);
    let state = Arc::new(state);
    let app = common::TestApp {
        router: frontdesk::build_app(state.clone()),
        state,
        dir,
    };

    let owner = SessionUser {
        account_id: "acme".to_string(),
        email: "owner@acme.test".to_string(),
        organization_name: "Acme".to_string(),
        role: "admin".to_string(),
        plan: "trial".to_string(),
    };
    let token = encode_token(&Claims::workspace(&owner), &secret).unwrap();

    let (body, status) = tokio::time::timeout(
        Duration::from_secs(5),
        app.get("/api/workspace/members", Some(&token)),
    )
    .await
    .expect("listing members should not hang");
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);

    let (_, status) = tokio::time::timeout(
        Duration::from_secs(5),
        app.post(
            "/api/workspace/members",
            Some(&token),
            &json!({ "email": "member@acme.test", "password": "member-password" }),
        ),
    )
    .await
    .expect("adding a member should not hang");
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn backend_error_text_is_never_returned() {
    for err in [
        AppError::from(sqlx::Error::Protocol("relation secret_table is broken".to_string())),
        AppError::from(StoreError::Database(sqlx::Error::PoolTimedOut)),
    ] {
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Internal server error");
    }
}
