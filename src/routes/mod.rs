pub mod auth;
pub mod content;
pub mod leads;
pub mod organizations;
pub mod workspace;

use axum::routing::{get, post, put};
use axum::Router;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Admin auth
        .route("/api/admin/login", post(auth::admin_login))
        .route("/api/auth/logout", post(auth::logout))
        // Workspace
        .route("/api/workspace/login", post(workspace::login))
        .route("/api/workspace/me", get(workspace::me))
        .route(
            "/api/workspace/members",
            get(workspace::list_members).post(workspace::add_member),
        )
        // Organizations
        .route("/api/signup", post(organizations::signup))
        .route(
            "/api/admin/organizations",
            get(organizations::list).post(organizations::create),
        )
        .route(
            "/api/admin/organizations/{id}",
            get(organizations::get)
                .put(organizations::update)
                .delete(organizations::delete),
        )
        // Site content
        .route("/api/content", get(content::get_all))
        .route("/api/content/{section}", get(content::get_section))
        .route("/api/admin/content/{section}", put(content::update_section))
        // Leads
        .route("/api/contact", post(leads::submit))
        .route("/api/admin/leads", get(leads::list))
        .route(
            "/api/admin/leads/{id}",
            axum::routing::delete(leads::delete),
        )
}
